//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod atlases;
mod decompose;
mod extract;
mod inspect;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{load_config, merge_cli_overrides, CliOverrides, SalvageConfig};
use crate::progress::{ConsoleProgress, JsonProgress, ProgressReporter};
use crate::report::BatchReport;

pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Salvage - Recover game assets from HTTP archives and cut sprite atlases
#[derive(Parser)]
#[command(name = "salvage")]
#[command(about = "Recover game assets from HTTP archives and cut sprite atlases into sprites")]
#[command(version)]
pub struct Cli {
    /// Config file (default: salvage.toml in this or a parent directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit JSON lines instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    /// Also report skipped units
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract images, audio, fonts and JSON from a HAR capture
    Extract {
        /// HAR file to read
        archive: PathBuf,

        /// Content store directory (default: paths.assets)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the sprite atlases described by a manifest or raw capture text
    Atlases {
        /// Manifest JSON, or any text file with --raw
        input: PathBuf,

        /// Scan the file as raw text instead of parsing it as a manifest
        #[arg(long)]
        raw: bool,

        /// Only list sprites with this role (bg, symbol, frame, ...)
        #[arg(long, value_name = "KEYWORD")]
        role: Option<String>,

        /// Only list the game-symbol atlas
        #[arg(long)]
        symbols: bool,

        /// Symbol sprites an atlas must exceed to be the symbol atlas
        #[arg(long, value_name = "N")]
        threshold: Option<usize>,
    },

    /// List texture identifiers referenced as res/<hash>.png in raw text
    Textures {
        /// Text file to scan (typically the HAR capture itself)
        input: PathBuf,
    },

    /// Cut every sprite of the atlases found in a manifest or raw text
    Decompose {
        /// Manifest JSON, or any text file with --raw
        input: PathBuf,

        /// Scan the file as raw text instead of parsing it as a manifest
        #[arg(long)]
        raw: bool,

        /// Content store holding the textures (default: paths.assets)
        #[arg(long)]
        assets: Option<PathBuf>,

        /// Sprite output directory (default: paths.sprites)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only cut the game-symbol atlas
        #[arg(long)]
        symbols_only: bool,

        /// Symbol sprites an atlas must exceed to be the symbol atlas
        #[arg(long, value_name = "N")]
        threshold: Option<usize>,

        /// Only cut sprites with this role
        #[arg(long, value_name = "KEYWORD")]
        role: Option<String>,

        /// Texture to cut sprites from when no texture list names them
        #[arg(long, value_name = "REF")]
        texture: Option<String>,

        /// Worker threads (0 = one per core)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Cut explicitly listed sprites ([[sprites]] in salvage.toml or a jobs file)
    Crop {
        /// TOML file with [[sprites]] entries (default: the config file's)
        #[arg(long, value_name = "FILE")]
        jobs_file: Option<PathBuf>,

        /// Content store holding the textures (default: paths.assets)
        #[arg(long)]
        assets: Option<PathBuf>,

        /// Sprite output directory (default: paths.sprites)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Worker threads (0 = one per core)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Show pixel dimensions of textures in the content store
    Inspect {
        /// Entry names or texture identifiers (default: every image entry)
        names: Vec<String>,

        /// Content store to look in (default: paths.assets)
        #[arg(long)]
        assets: Option<PathBuf>,
    },
}

/// Options shared by every subcommand.
pub(crate) struct GlobalArgs<'a> {
    pub config: Option<&'a Path>,
    pub json: bool,
    pub verbose: bool,
}

impl GlobalArgs<'_> {
    /// Load configuration and apply overrides, printing any error.
    pub fn settings(&self, overrides: &CliOverrides) -> Result<SalvageConfig, ExitCode> {
        match load_config(self.config) {
            Ok(mut config) => {
                merge_cli_overrides(&mut config, overrides);
                Ok(config)
            }
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                Err(ExitCode::from(EXIT_ERROR))
            }
        }
    }

    /// Progress reporter matching the output mode.
    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        if self.json {
            Box::new(JsonProgress::new())
        } else {
            Box::new(ConsoleProgress::new().with_verbose(self.verbose))
        }
    }
}

/// Exit code for a finished batch: any failed unit is an error.
pub(crate) fn batch_exit(report: &BatchReport, noun: &str, json: bool) -> ExitCode {
    if !json {
        println!("{}", report.summary(noun));
    }
    if report.is_success() {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs { config: cli.config.as_deref(), json: cli.json, verbose: cli.verbose };

    match cli.command {
        Commands::Extract { archive, output } => {
            extract::run_extract(&global, &archive, output.as_deref())
        }
        Commands::Atlases { input, raw, role, symbols, threshold } => atlases::run_atlases(
            &global,
            &atlases::AtlasesArgs { input: &input, raw, role: role.as_deref(), symbols, threshold },
        ),
        Commands::Textures { input } => atlases::run_textures(&global, &input),
        Commands::Decompose {
            input,
            raw,
            assets,
            output,
            symbols_only,
            threshold,
            role,
            texture,
            jobs,
        } => {
            decompose::run_decompose(
                &global,
                &decompose::DecomposeArgs {
                    input: &input,
                    raw,
                    assets: assets.as_deref(),
                    output: output.as_deref(),
                    symbols_only,
                    threshold,
                    role: role.as_deref(),
                    texture: texture.as_deref(),
                    jobs,
                },
            )
        }
        Commands::Crop { jobs_file, assets, output, jobs } => decompose::run_crop(
            &global,
            jobs_file.as_deref(),
            assets.as_deref(),
            output.as_deref(),
            jobs,
        ),
        Commands::Inspect { names, assets } => {
            inspect::run_inspect(&global, &names, assets.as_deref())
        }
    }
}

/// Print an error that stops a command and pick its exit code. An input that
/// cannot be read at all counts as a bad argument.
pub(crate) fn fail(err: &crate::error::SalvageError) -> ExitCode {
    eprintln!("Error: {}", err);
    match err {
        crate::error::SalvageError::Io { .. } => ExitCode::from(EXIT_INVALID_ARGS),
        _ => ExitCode::from(EXIT_ERROR),
    }
}

/// Parse a `--role` value, printing the valid choices on error.
pub(crate) fn parse_role(keyword: &str) -> Result<crate::classify::Role, ExitCode> {
    crate::classify::Role::from_keyword(keyword).ok_or_else(|| {
        let known: Vec<&str> = crate::classify::Role::PRIORITY.iter().map(|r| r.keyword()).collect();
        eprintln!("Error: Unknown role '{}'. Available roles: {}", keyword, known.join(", "));
        ExitCode::from(EXIT_INVALID_ARGS)
    })
}
