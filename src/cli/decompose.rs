//! Decompose and crop command implementations

use std::collections::HashSet;
use std::path::Path;
use std::process::ExitCode;

use crate::config::{load_jobs_file, CliOverrides, SalvageConfig, SpriteJobConfig};
use crate::decompose::{DecompositionEngine, SpriteJob};
use crate::progress::ProgressEvent;
use crate::store::{ContentStore, TextureBinding};

use super::atlases::{load_index, select_atlases};
use super::{batch_exit, fail, parse_role, GlobalArgs, EXIT_ERROR};

/// Arguments of the decompose command
pub struct DecomposeArgs<'a> {
    pub input: &'a Path,
    pub raw: bool,
    pub assets: Option<&'a Path>,
    pub output: Option<&'a Path>,
    pub symbols_only: bool,
    pub threshold: Option<usize>,
    pub role: Option<&'a str>,
    pub texture: Option<&'a str>,
    pub jobs: Option<usize>,
}

/// Run the decompose command
pub fn run_decompose(global: &GlobalArgs, args: &DecomposeArgs) -> ExitCode {
    let overrides = CliOverrides {
        assets: args.assets.map(Path::to_path_buf),
        sprites: args.output.map(Path::to_path_buf),
        symbol_threshold: args.threshold,
        jobs: args.jobs,
    };
    let config = match global.settings(&overrides) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let role = match args.role.map(parse_role).transpose() {
        Ok(role) => role,
        Err(code) => return code,
    };

    let index = match load_index(args.input, args.raw, config.atlas.symbol_threshold) {
        Ok(index) => index,
        Err(e) => return fail(&e),
    };
    if args.symbols_only && index.symbol_atlas().is_none() {
        eprintln!("Error: No atlas has more than {} symbol sprites", config.atlas.symbol_threshold);
        return ExitCode::from(EXIT_ERROR);
    }

    let store = match ContentStore::open(&config.paths.assets) {
        Ok(store) => store,
        Err(e) => return fail(&e),
    };
    let reporter = global.reporter();
    let classifier = config.classifier();

    let mut jobs = Vec::new();
    let mut names = HashSet::new();
    for atlas in select_atlases(&index, args.symbols_only, role, &classifier) {
        let mut atlas_jobs =
            qualify_repeated_names(SpriteJob::from_atlas(&atlas), &atlas.texture_id, &mut names);
        match store.bind_texture(&atlas.texture_id) {
            TextureBinding::Exact { entry } | TextureBinding::Partial { entry, .. } => {
                log::info!("texture {} -> {} ({} sprites)", atlas.texture_id, entry, atlas.len());
                for job in &mut atlas_jobs {
                    job.texture = entry.clone();
                }
            }
            TextureBinding::Unresolved => {
                reporter.report(ProgressEvent::Warning {
                    unit_id: Some(atlas.texture_id.clone()),
                    message: format!("texture not in {}", store.root().display()),
                });
            }
        }
        jobs.extend(atlas_jobs);
    }

    let unbound: Vec<_> = index
        .unbound()
        .filter(|rect| role.map_or(true, |r| classifier.classify(&rect.name).role() == Some(r)))
        .collect();
    if !args.symbols_only && !unbound.is_empty() {
        match args.texture {
            Some(texture) => jobs.extend(
                unbound
                    .into_iter()
                    .map(|rect| SpriteJob::new(rect.name.clone(), texture, rect.clone())),
            ),
            None => reporter.report(ProgressEvent::Warning {
                unit_id: None,
                message: format!(
                    "{} sprites have no texture; pass --texture to cut them",
                    unbound.len()
                ),
            }),
        }
    }

    if jobs.is_empty() {
        eprintln!("Error: No sprites to cut");
        return ExitCode::from(EXIT_ERROR);
    }

    let report = DecompositionEngine::new()
        .with_jobs(config.decompose.jobs)
        .with_reporter(reporter.as_ref())
        .run(&jobs, &store, &config.paths.sprites);
    batch_exit(&report.batch, "sprites", global.json)
}

/// Give sprites whose name an earlier atlas already used the output name
/// `{texture_id}_{name}`, so atlases sharing sprite names do not collide.
fn qualify_repeated_names(
    jobs: Vec<SpriteJob>,
    texture_id: &str,
    names: &mut HashSet<String>,
) -> Vec<SpriteJob> {
    jobs.into_iter()
        .map(|mut job| {
            if !names.insert(job.output_name.clone()) {
                let qualified = format!("{}_{}", texture_id, job.output_name);
                log::info!("{} repeats across atlases, saving as {}", job.output_name, qualified);
                names.insert(qualified.clone());
                job.output_name = qualified;
            }
            job
        })
        .collect()
}

/// Run the crop command
pub fn run_crop(
    global: &GlobalArgs,
    jobs_file: Option<&Path>,
    assets: Option<&Path>,
    output: Option<&Path>,
    jobs: Option<usize>,
) -> ExitCode {
    let overrides = CliOverrides {
        assets: assets.map(Path::to_path_buf),
        sprites: output.map(Path::to_path_buf),
        jobs,
        ..Default::default()
    };
    let config = match global.settings(&overrides) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let sprite_jobs = match crop_jobs(&config, jobs_file) {
        Ok(jobs) => jobs,
        Err(code) => return code,
    };
    if sprite_jobs.is_empty() {
        eprintln!("Error: No [[sprites]] entries to crop");
        return ExitCode::from(EXIT_ERROR);
    }

    let store = match ContentStore::open(&config.paths.assets) {
        Ok(store) => store,
        Err(e) => return fail(&e),
    };
    let reporter = global.reporter();
    let report = DecompositionEngine::new()
        .with_jobs(config.decompose.jobs)
        .with_reporter(reporter.as_ref())
        .run(&sprite_jobs, &store, &config.paths.sprites);

    if !global.json {
        for sprite in &report.sprites {
            println!("{} {}x{} -> {}", sprite.output_name, sprite.width, sprite.height, sprite.path.display());
        }
    }
    batch_exit(&report.batch, "sprites", global.json)
}

fn crop_jobs(config: &SalvageConfig, jobs_file: Option<&Path>) -> Result<Vec<SpriteJob>, ExitCode> {
    match jobs_file {
        Some(path) => match load_jobs_file(path) {
            Ok(entries) => Ok(entries.iter().filter_map(SpriteJobConfig::to_job).collect()),
            Err(e) => {
                eprintln!("Error loading {}: {}", path.display(), e);
                Err(ExitCode::from(EXIT_ERROR))
            }
        },
        None => Ok(config.sprite_jobs()),
    }
}
