//! Atlas listing and texture reference commands

use std::path::Path;
use std::process::ExitCode;

use crate::archive::read_lossy;
use crate::atlas::manifest::{load_manifest, ManifestOptions};
use crate::atlas::raw::{scan_raw, scan_texture_refs};
use crate::atlas::{Atlas, AtlasIndex};
use crate::classify::{Classifier, Role};
use crate::config::CliOverrides;
use crate::error::Result;

use super::{fail, parse_role, GlobalArgs, EXIT_ERROR, EXIT_SUCCESS};

/// Build the atlas index for a manifest, or for any text file when `raw`.
///
/// The symbol atlas is selected on both paths.
pub(crate) fn load_index(input: &Path, raw: bool, symbol_threshold: usize) -> Result<AtlasIndex> {
    if !raw {
        return load_manifest(input, ManifestOptions { symbol_threshold });
    }
    let text = read_lossy(input)?;
    let scan = scan_raw(&text);
    log::info!(
        "raw scan: {} sprites, {} texture lists",
        scan.sprites.len(),
        scan.mappings.len()
    );
    let symbol_atlas = scan.symbol_atlas(symbol_threshold).map(str::to_string);
    let mut index = scan.into_index();
    index.set_symbol_atlas(symbol_atlas);
    Ok(index)
}

/// Atlases to work on after `--symbols` / `--role` selection.
pub(crate) fn select_atlases(
    index: &AtlasIndex,
    symbols_only: bool,
    role: Option<Role>,
    classifier: &Classifier,
) -> Vec<Atlas> {
    let chosen: Vec<&Atlas> = if symbols_only {
        index.symbol_atlas_entry().into_iter().collect()
    } else {
        index.atlases().collect()
    };
    chosen
        .into_iter()
        .map(|atlas| match role {
            Some(role) => atlas.with_role(classifier, role),
            None => atlas.clone(),
        })
        .filter(|atlas| !atlas.is_empty())
        .collect()
}

/// Arguments of the atlases command
#[derive(Clone, Copy)]
pub struct AtlasesArgs<'a> {
    pub input: &'a Path,
    pub raw: bool,
    pub role: Option<&'a str>,
    pub symbols: bool,
    pub threshold: Option<usize>,
}

/// Run the atlases command
pub fn run_atlases(global: &GlobalArgs, args: &AtlasesArgs) -> ExitCode {
    let AtlasesArgs { input, raw, role, symbols, threshold } = *args;
    let overrides = CliOverrides { symbol_threshold: threshold, ..Default::default() };
    let config = match global.settings(&overrides) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let role = match role.map(parse_role).transpose() {
        Ok(role) => role,
        Err(code) => return code,
    };

    let index = match load_index(input, raw, config.atlas.symbol_threshold) {
        Ok(index) => index,
        Err(e) => return fail(&e),
    };
    if symbols && index.symbol_atlas().is_none() {
        eprintln!("Error: No atlas has more than {} symbol sprites", config.atlas.symbol_threshold);
        return ExitCode::from(EXIT_ERROR);
    }

    let classifier = config.classifier();
    let atlases = select_atlases(&index, symbols, role, &classifier);

    if global.json {
        let value = serde_json::json!({
            "symbol_atlas": index.symbol_atlas(),
            "atlases": atlases,
            "unbound": index.unbound().collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
        return ExitCode::from(EXIT_SUCCESS);
    }

    for atlas in &atlases {
        let marker = if index.symbol_atlas() == Some(atlas.texture_id.as_str()) {
            " [symbols]"
        } else {
            ""
        };
        println!(
            "{} ({} sprites, {} symbols){}",
            atlas.texture_id,
            atlas.len(),
            atlas.symbol_count(),
            marker
        );
        for rect in atlas.sprites.values() {
            let tag = classifier.classify(&rect.name).role().map(|r| r.keyword()).unwrap_or("-");
            println!(
                "  {:<32} {:>5},{:<5} {:>5}x{:<5} {}",
                rect.name, rect.x, rect.y, rect.width, rect.height, tag
            );
        }
    }
    let unbound = index.unbound().count();
    if unbound > 0 && !symbols && role.is_none() {
        println!("{} sprites without a texture:", unbound);
        for rect in index.unbound() {
            println!("  {:<32} {:>5},{:<5} {:>5}x{:<5}", rect.name, rect.x, rect.y, rect.width, rect.height);
        }
    }
    ExitCode::from(EXIT_SUCCESS)
}

/// Run the textures command
pub fn run_textures(global: &GlobalArgs, input: &Path) -> ExitCode {
    let text = match read_lossy(input) {
        Ok(text) => text,
        Err(e) => return fail(&e),
    };
    let refs = scan_texture_refs(&text);

    if global.json {
        println!("{}", serde_json::json!({ "textures": refs }));
    } else {
        for id in &refs {
            println!("{}", id);
        }
        eprintln!("{} textures referenced", refs.len());
    }
    ExitCode::from(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::SpriteRect;

    fn index() -> AtlasIndex {
        let mut index = AtlasIndex::new();
        let mut ui = Atlas::new("ui");
        ui.insert(SpriteRect::new("s_bg", 0, 0, 10, 10).unwrap());
        ui.insert(SpriteRect::new("s_fire_00", 0, 0, 10, 10).unwrap());
        let mut symbols = Atlas::new("sym");
        for name in ["s_A", "s_K", "s_Q", "s_J", "s_H1", "s_H2"] {
            symbols.insert(SpriteRect::new(name, 0, 0, 1, 1).unwrap());
        }
        index.add(ui);
        index.add(symbols);
        index.set_symbol_atlas(Some("sym".to_string()));
        index
    }

    #[test]
    fn test_select_all() {
        let atlases = select_atlases(&index(), false, None, &Classifier::default());
        assert_eq!(atlases.len(), 2);
    }

    #[test]
    fn test_select_symbols_only() {
        let atlases = select_atlases(&index(), true, None, &Classifier::default());
        assert_eq!(atlases.len(), 1);
        assert_eq!(atlases[0].texture_id, "sym");
    }

    #[test]
    fn test_select_role_drops_empty_atlases() {
        let atlases = select_atlases(&index(), false, Some(Role::Fire), &Classifier::default());
        assert_eq!(atlases.len(), 1);
        assert_eq!(atlases[0].names().collect::<Vec<_>>(), vec!["s_fire_00"]);
    }
}
