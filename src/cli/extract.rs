//! Extract command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::archive::Archive;
use crate::config::CliOverrides;
use crate::extract::AssetExtractor;
use crate::store::ContentStore;

use super::{batch_exit, fail, GlobalArgs};

/// Run the extract command
pub fn run_extract(global: &GlobalArgs, archive: &Path, output: Option<&Path>) -> ExitCode {
    let overrides = CliOverrides { assets: output.map(Path::to_path_buf), ..Default::default() };
    let config = match global.settings(&overrides) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let archive = match Archive::load(archive) {
        Ok(archive) => archive,
        Err(e) => return fail(&e),
    };
    log::info!("{} archive entries", archive.records().len());

    let mut store = match ContentStore::open(&config.paths.assets) {
        Ok(store) => store,
        Err(e) => return fail(&e),
    };

    let reporter = global.reporter();
    let report = AssetExtractor::new()
        .with_filter(config.extract_filter())
        .with_reporter(reporter.as_ref())
        .extract(archive.records(), &mut store);

    if !global.json {
        println!(
            "{} entries were not assets; store: {}",
            report.ignored,
            store.root().display()
        );
    }
    batch_exit(&report, "assets", global.json)
}
