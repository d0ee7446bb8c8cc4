//! Inspect command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::config::CliOverrides;
use crate::decompose::texture_dimensions;
use crate::store::ContentStore;

use super::{fail, GlobalArgs, EXIT_ERROR, EXIT_SUCCESS};

const IMAGE_EXTENSIONS: [&str; 5] = [".png", ".jpg", ".jpeg", ".webp", ".gif"];

fn is_image_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Run the inspect command
pub fn run_inspect(global: &GlobalArgs, names: &[String], assets: Option<&Path>) -> ExitCode {
    let overrides = CliOverrides { assets: assets.map(Path::to_path_buf), ..Default::default() };
    let config = match global.settings(&overrides) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let store = match ContentStore::open(&config.paths.assets) {
        Ok(store) => store,
        Err(e) => return fail(&e),
    };

    let references: Vec<String> = if names.is_empty() {
        store.names().filter(|n| is_image_name(n)).map(str::to_string).collect()
    } else {
        names.to_vec()
    };

    let mut missing = 0usize;
    for reference in &references {
        let binding = store.resolve_reference(reference);
        let result = match binding.entry() {
            Some(entry) => texture_dimensions(&store, entry).map(|dims| (entry.to_string(), dims)),
            None => Err(crate::error::SalvageError::MissingResource(format!(
                "'{}' not found in {}",
                reference,
                store.root().display()
            ))),
        };
        match result {
            Ok((entry, (width, height))) => {
                if global.json {
                    println!(
                        "{}",
                        serde_json::json!({
                            "reference": reference,
                            "entry": entry,
                            "width": width,
                            "height": height,
                        })
                    );
                } else {
                    println!("{:<48} {}x{}", entry, width, height);
                }
            }
            Err(e) => {
                missing += 1;
                eprintln!("{}: {}", reference, e);
            }
        }
    }

    if missing > 0 {
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image_name() {
        assert!(is_image_name("tex.png"));
        assert!(is_image_name("BG.JPG"));
        assert!(!is_image_name("game.json"));
        assert!(!is_image_name("theme.mp3"));
    }
}
