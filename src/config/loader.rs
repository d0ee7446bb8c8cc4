//! Configuration loading and discovery for `salvage.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::{validate_sprite_jobs, SalvageConfig, SpriteJobConfig};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file name searched for in the working directory and its parents.
pub const CONFIG_FILE_NAME: &str = "salvage.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override the content store directory
    pub assets: Option<PathBuf>,
    /// Override the sprite store directory
    pub sprites: Option<PathBuf>,
    /// Override the symbol atlas threshold
    pub symbol_threshold: Option<usize>,
    /// Number of parallel jobs
    pub jobs: Option<usize>,
}

/// Find salvage.toml by walking up from the current working directory.
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find salvage.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a salvage.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns the
/// default configuration.
///
/// Relative paths in the file are resolved against the file's directory.
pub fn load_config(path: Option<&Path>) -> Result<SalvageConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => {
            log::debug!("loading config from {}", p.display());
            let mut config = load_config_file(&p)?;
            if let Some(root) = project_root(&p) {
                config.paths.assets = resolve_path(root, &config.paths.assets);
                config.paths.sprites = resolve_path(root, &config.paths.sprites);
            }
            Ok(config)
        }
        None => Ok(default_config()),
    }
}

/// Load configuration from a specific file path.
fn load_config_file(path: &Path) -> Result<SalvageConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: SalvageConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// Configuration used when no salvage.toml is found.
pub fn default_config() -> SalvageConfig {
    SalvageConfig::default()
}

#[derive(Debug, Deserialize)]
struct JobsFile {
    #[serde(default)]
    sprites: Vec<SpriteJobConfig>,
}

/// Load a standalone file of `[[sprites]]` crop jobs.
pub fn load_jobs_file(path: &Path) -> Result<Vec<SpriteJobConfig>, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let file: JobsFile = toml::from_str(&contents)?;

    let errors = validate_sprite_jobs("sprites", &file.sprites);
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }
    Ok(file.sprites)
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut SalvageConfig, overrides: &CliOverrides) {
    if let Some(ref assets) = overrides.assets {
        config.paths.assets = assets.clone();
    }
    if let Some(ref sprites) = overrides.sprites {
        config.paths.sprites = sprites.clone();
    }
    if let Some(threshold) = overrides.symbol_threshold {
        config.atlas.symbol_threshold = threshold;
    }
    if let Some(jobs) = overrides.jobs {
        config.decompose.jobs = jobs;
    }
}

/// Get the project root directory from a config file path.
pub fn project_root(config_path: &Path) -> Option<&Path> {
    config_path.parent()
}

/// Resolve a path relative to the project root.
///
/// If the path is absolute, returns it unchanged.
/// If relative, joins it with the project root.
pub fn resolve_path(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILE_NAME);
        fs::write(&path, contents).expect("should write config file");
        path
    }

    #[test]
    fn test_find_config_in_current_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), "");

        let found = find_config_from(temp.path().to_path_buf());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_in_parent_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), "");

        let subdir = temp.path().join("captures").join("day1");
        fs::create_dir_all(&subdir).expect("should create subdirectories");

        let found = find_config_from(subdir);
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_not_found() {
        let temp = TempDir::new().expect("should create temp dir");
        let found = find_config_from(temp.path().to_path_buf());
        assert_eq!(found, None);
    }

    #[test]
    fn test_load_config_resolves_relative_paths() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(
            temp.path(),
            r#"
[paths]
assets = "assets"
sprites = "/abs/sprites"

[atlas]
symbol_threshold = 2
"#,
        );

        let config = load_config(Some(&config_path)).expect("should load valid config");
        assert_eq!(config.paths.assets, temp.path().join("assets"));
        assert_eq!(config.paths.sprites, PathBuf::from("/abs/sprites"));
        assert_eq!(config.atlas.symbol_threshold, 2);
    }

    #[test]
    fn test_load_config_missing_file_errors() {
        let temp = TempDir::new().expect("should create temp dir");
        let result = load_config(Some(&temp.path().join("nonexistent.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), "this is not valid toml {{{");

        let result = load_config(Some(&config_path));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_validation_error() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), "[atlas]\nkeywords = []\n");

        let result = load_config(Some(&config_path));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_jobs_file() {
        let temp = TempDir::new().expect("should create temp dir");
        let path = temp.path().join("jobs.toml");
        fs::write(
            &path,
            r#"
[[sprites]]
name = "symbol_K"
texture = "abcd.png"
x = 10
y = 20
w = 30
h = 40
"#,
        )
        .expect("should write jobs file");

        let jobs = load_jobs_file(&path).expect("should load jobs");
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].to_job().map(|j| j.rect.height), Some(40));

        fs::write(&path, "[[sprites]]\nname = \"a\"\ntexture = \"t\"\nx = 0\ny = 0\nw = 0\nh = 1\n")
            .expect("should write jobs file");
        assert!(matches!(load_jobs_file(&path), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_merge_cli_overrides() {
        let mut config = default_config();
        let overrides = CliOverrides {
            assets: Some(PathBuf::from("cache")),
            jobs: Some(2),
            ..Default::default()
        };

        merge_cli_overrides(&mut config, &overrides);
        assert_eq!(config.paths.assets, PathBuf::from("cache"));
        assert_eq!(config.paths.sprites, PathBuf::from("rebuild/sprites"));
        assert_eq!(config.decompose.jobs, 2);
        assert_eq!(config.atlas.symbol_threshold, 5);
    }

    #[test]
    fn test_merge_threshold_override() {
        let mut config = default_config();
        let overrides = CliOverrides { symbol_threshold: Some(2), ..Default::default() };
        merge_cli_overrides(&mut config, &overrides);
        assert_eq!(config.atlas.symbol_threshold, 2);
        assert_eq!(config.decompose.jobs, 0);
    }

    #[test]
    fn test_resolve_path_absolute() {
        let root = Path::new("/project");
        let absolute = Path::new("/other/path");
        assert_eq!(resolve_path(root, absolute), PathBuf::from("/other/path"));
    }

    #[test]
    fn test_resolve_path_relative() {
        let root = Path::new("/project");
        assert_eq!(resolve_path(root, Path::new("rebuild")), PathBuf::from("/project/rebuild"));
    }
}
