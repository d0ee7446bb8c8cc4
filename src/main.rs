//! Salvage - Command-line tool for recovering game assets from HAR captures

use std::process::ExitCode;

use spritesalvage::cli;

fn main() -> ExitCode {
    env_logger::init();
    cli::run()
}
