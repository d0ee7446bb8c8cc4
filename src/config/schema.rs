//! Configuration schema types for `salvage.toml`
//!
//! Defines the structure and validation rules for a salvage project.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::atlas::{SpriteRect, DEFAULT_SYMBOL_THRESHOLD};
use crate::classify::{Classifier, Role};
use crate::decompose::SpriteJob;
use crate::extract::ExtractFilter;

/// Output directories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Content store for recovered files
    #[serde(default = "default_assets")]
    pub assets: PathBuf,
    /// Sprite store for cut sprites
    #[serde(default = "default_sprites")]
    pub sprites: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self { assets: default_assets(), sprites: default_sprites() }
    }
}

fn default_assets() -> PathBuf {
    PathBuf::from("rebuild/assets")
}

fn default_sprites() -> PathBuf {
    PathBuf::from("rebuild/sprites")
}

/// Which archive entries count as assets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Substrings of the MIME type that mark an asset
    #[serde(default = "default_mime_kinds")]
    pub mime_kinds: Vec<String>,
    /// URL path suffixes that mark an asset regardless of MIME type
    #[serde(default = "default_suffixes")]
    pub suffixes: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self { mime_kinds: default_mime_kinds(), suffixes: default_suffixes() }
    }
}

fn default_mime_kinds() -> Vec<String> {
    ExtractFilter::default().mime_kinds
}

fn default_suffixes() -> Vec<String> {
    ExtractFilter::default().suffixes
}

/// Atlas resolution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtlasConfig {
    /// An atlas needs more symbol-named sprites than this to be the symbol atlas
    #[serde(default = "default_symbol_threshold")]
    pub symbol_threshold: usize,
    /// Role keywords in priority order
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self { symbol_threshold: default_symbol_threshold(), keywords: default_keywords() }
    }
}

fn default_symbol_threshold() -> usize {
    DEFAULT_SYMBOL_THRESHOLD
}

fn default_keywords() -> Vec<String> {
    Role::PRIORITY.iter().map(|r| r.keyword().to_string()).collect()
}

/// Sprite cutting settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecomposeConfig {
    /// Worker threads, 0 for one per core
    #[serde(default)]
    pub jobs: usize,
}

/// One explicit crop job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteJobConfig {
    /// Output sprite name
    pub name: String,
    /// Stored texture file name or texture identifier
    pub texture: String,
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

impl SpriteJobConfig {
    /// Convert into an engine job; `None` when the rectangle is invalid.
    pub fn to_job(&self) -> Option<SpriteJob> {
        let rect = SpriteRect::new(self.name.clone(), self.x, self.y, self.w, self.h)?;
        Some(SpriteJob::new(self.name.clone(), self.texture.clone(), rect))
    }
}

/// Complete salvage.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalvageConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub atlas: AtlasConfig,
    #[serde(default)]
    pub decompose: DecomposeConfig,
    /// Explicit crop jobs
    #[serde(default)]
    pub sprites: Vec<SpriteJobConfig>,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "sprites[2].w")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "salvage.toml: '{}' {}", self.field, self.message)
    }
}

impl ConfigValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

/// Validate a list of crop jobs, naming fields under `section`.
pub fn validate_sprite_jobs(section: &str, jobs: &[SpriteJobConfig]) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    for (i, job) in jobs.iter().enumerate() {
        let field = |name: &str| format!("{}[{}].{}", section, i, name);
        if job.name.trim().is_empty() {
            errors.push(ConfigValidationError::new(field("name"), "must be a non-empty string"));
        }
        if job.texture.trim().is_empty() {
            errors.push(ConfigValidationError::new(field("texture"), "must be a non-empty string"));
        }
        if job.x < 0 || job.y < 0 {
            errors.push(ConfigValidationError::new(field("x"), "origin must not be negative"));
        }
        if job.w <= 0 {
            errors.push(ConfigValidationError::new(field("w"), "must be a positive integer"));
        }
        if job.h <= 0 {
            errors.push(ConfigValidationError::new(field("h"), "must be a positive integer"));
        }
    }
    errors
}

impl SalvageConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.paths.assets.as_os_str().is_empty() {
            errors.push(ConfigValidationError::new("paths.assets", "must be a non-empty path"));
        }
        if self.paths.sprites.as_os_str().is_empty() {
            errors.push(ConfigValidationError::new("paths.sprites", "must be a non-empty path"));
        }

        if self.extract.mime_kinds.is_empty() && self.extract.suffixes.is_empty() {
            errors.push(ConfigValidationError::new(
                "extract",
                "needs at least one MIME kind or suffix",
            ));
        }

        if self.atlas.keywords.is_empty() {
            errors.push(ConfigValidationError::new("atlas.keywords", "must list at least one role"));
        }
        for keyword in &self.atlas.keywords {
            if Role::from_keyword(keyword).is_none() {
                errors.push(ConfigValidationError::new(
                    "atlas.keywords",
                    format!("unknown role '{}'", keyword),
                ));
            }
        }

        errors.extend(validate_sprite_jobs("sprites", &self.sprites));
        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Classifier using the configured keyword order. Unknown keywords are
    /// ignored here; `validate` reports them.
    pub fn classifier(&self) -> Classifier {
        Classifier::with_order(self.atlas.keywords.iter().filter_map(|k| Role::from_keyword(k)))
    }

    pub fn extract_filter(&self) -> ExtractFilter {
        ExtractFilter {
            mime_kinds: self.extract.mime_kinds.clone(),
            suffixes: self.extract.suffixes.clone(),
        }
    }

    /// Configured crop jobs that have a usable rectangle.
    pub fn sprite_jobs(&self) -> Vec<SpriteJob> {
        self.sprites.iter().filter_map(SpriteJobConfig::to_job).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_parse() {
        let config: SalvageConfig = toml::from_str("").unwrap();
        assert_eq!(config, SalvageConfig::default());
        assert_eq!(config.paths.assets, PathBuf::from("rebuild/assets"));
        assert_eq!(config.paths.sprites, PathBuf::from("rebuild/sprites"));
        assert_eq!(config.atlas.symbol_threshold, 5);
        assert_eq!(config.classifier(), Classifier::default());
        assert!(config.is_valid());
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[paths]
assets = "out/assets"
sprites = "out/sprites"

[extract]
mime_kinds = ["image"]
suffixes = [".json", ".atlas"]

[atlas]
symbol_threshold = 3
keywords = ["symbol", "bg"]

[decompose]
jobs = 4

[[sprites]]
name = "symbol_A"
texture = "20d7ad009ff2a804684180e437657b33.png"
x = 1680
y = 770
w = 273
h = 264

[[sprites]]
name = "bg"
texture = "bg.png"
x = 0
y = 0
w = 1777
h = 999
"#;
        let config: SalvageConfig = toml::from_str(toml).unwrap();
        assert!(config.is_valid(), "{:?}", config.validate());
        assert_eq!(config.paths.assets, PathBuf::from("out/assets"));
        assert_eq!(config.extract_filter().suffixes, vec![".json", ".atlas"]);
        assert_eq!(config.atlas.symbol_threshold, 3);
        assert_eq!(config.classifier().order(), &[Role::Symbol, Role::Bg]);
        assert_eq!(config.decompose.jobs, 4);

        let jobs = config.sprite_jobs();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].output_name, "symbol_A");
        assert_eq!(jobs[0].rect.width, 273);
        assert_eq!(jobs[1].texture, "bg.png");
    }

    #[test]
    fn test_validation_bad_sprite_job() {
        let toml = r#"
[[sprites]]
name = ""
texture = "t.png"
x = -1
y = 0
w = 0
h = 10
"#;
        let config: SalvageConfig = toml::from_str(toml).unwrap();
        let errors = config.validate();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["sprites[0].name", "sprites[0].x", "sprites[0].w"]);
        assert!(config.sprite_jobs().is_empty());
    }

    #[test]
    fn test_validation_unknown_keyword() {
        let toml = r#"
[atlas]
keywords = ["bg", "button"]
"#;
        let config: SalvageConfig = toml::from_str(toml).unwrap();
        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].field == "atlas.keywords" && errors[0].message.contains("button"));
        assert_eq!(config.classifier().order(), &[Role::Bg]);
    }

    #[test]
    fn test_validation_error_display() {
        let error = ConfigValidationError::new("paths.assets", "must be a non-empty path");
        assert_eq!(error.to_string(), "salvage.toml: 'paths.assets' must be a non-empty path");
    }
}
