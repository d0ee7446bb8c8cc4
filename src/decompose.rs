//! Sprite decomposition: cutting named sprites out of texture sheets
//!
//! Each job names an output sprite, a texture reference (a stored file name
//! or a bare texture identifier) and a rectangle. Rectangles are clamped to
//! the texture, never rejected for overflowing it. Jobs are independent; a
//! missing texture or a failed write affects only its own sprite.
//!
//! Textures are decoded once and shared between jobs. Cropping and encoding
//! run on a rayon pool; results are collected back in job order so reports
//! and progress output do not depend on scheduling.

use image::DynamicImage;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::atlas::{Atlas, SpriteRect};
use crate::error::{Result, SalvageError};
use crate::output::{save_png, sprite_output_path};
use crate::progress::{NullProgress, ProgressEvent, ProgressReporter};
use crate::report::{BatchReport, UnitResult};
use crate::store::ContentStore;

/// Output image format for sprites.
pub const SPRITE_EXTENSION: &str = "png";

/// One sprite to cut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpriteJob {
    /// Output name, without extension
    pub output_name: String,
    /// Stored file name or texture identifier
    pub texture: String,
    /// Region to cut; its `name` is the sprite's name in the atlas
    pub rect: SpriteRect,
}

impl SpriteJob {
    pub fn new(output_name: impl Into<String>, texture: impl Into<String>, rect: SpriteRect) -> Self {
        Self { output_name: output_name.into(), texture: texture.into(), rect }
    }

    /// One job per sprite of an atlas, named after the sprite.
    pub fn from_atlas(atlas: &Atlas) -> Vec<SpriteJob> {
        atlas
            .sprites
            .values()
            .map(|rect| SpriteJob::new(rect.name.clone(), atlas.texture_id.clone(), rect.clone()))
            .collect()
    }
}

/// A sprite written to the sprite store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpriteAsset {
    pub output_name: String,
    /// Content-store entry the pixels came from
    pub texture_entry: String,
    /// Rectangle as requested
    pub rect: SpriteRect,
    pub path: PathBuf,
    /// Actual output size after clamping
    pub width: u32,
    pub height: u32,
}

/// Pixel region actually cut from a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Clamp a rectangle to a `texture_width` x `texture_height` texture.
///
/// The far corner is `min(x + width, texture_width)`,
/// `min(y + height, texture_height)`; the origin is clamped the same way.
/// Returns `None` when nothing of the rectangle lies on the texture.
pub fn clamp_rect(rect: &SpriteRect, texture_width: u32, texture_height: u32) -> Option<CropRegion> {
    let x = rect.x.min(texture_width);
    let y = rect.y.min(texture_height);
    let x2 = rect.x.saturating_add(rect.width).min(texture_width);
    let y2 = rect.y.saturating_add(rect.height).min(texture_height);
    let (width, height) = (x2 - x, y2 - y);
    if width == 0 || height == 0 {
        return None;
    }
    Some(CropRegion { x, y, width, height })
}

/// Cut a clamped region out of a texture.
pub fn crop_sprite(texture: &DynamicImage, rect: &SpriteRect) -> Result<DynamicImage> {
    let region = clamp_rect(rect, texture.width(), texture.height()).ok_or_else(|| {
        SalvageError::InvalidSprite(format!(
            "rectangle {}x{} at ({}, {}) lies outside the {}x{} texture",
            rect.width,
            rect.height,
            rect.x,
            rect.y,
            texture.width(),
            texture.height()
        ))
    })?;
    Ok(texture.crop_imm(region.x, region.y, region.width, region.height))
}

/// Outcome of a decomposition batch.
#[derive(Debug, Clone, Default)]
pub struct DecompositionReport {
    /// Per-sprite results in job order
    pub batch: BatchReport,
    /// Successfully written sprites in job order
    pub sprites: Vec<SpriteAsset>,
}

type LoadedTexture = std::result::Result<(String, Arc<DynamicImage>), String>;

/// Cuts sprites out of content-store textures into a sprite directory.
pub struct DecompositionEngine<'a> {
    /// Worker threads; 0 uses rayon's global pool
    jobs: usize,
    reporter: &'a dyn ProgressReporter,
}

impl Default for DecompositionEngine<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> DecompositionEngine<'a> {
    pub fn new() -> Self {
        Self { jobs: 0, reporter: &NullProgress }
    }

    /// Set the number of worker threads (0 = rayon default).
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_reporter(mut self, reporter: &'a dyn ProgressReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Cut every sprite of an atlas.
    pub fn run_atlas(&self, atlas: &Atlas, store: &ContentStore, out_dir: &Path) -> DecompositionReport {
        self.run(&SpriteJob::from_atlas(atlas), store, out_dir)
    }

    /// Run a list of jobs.
    ///
    /// A job whose output name repeats an earlier job's is failed rather than
    /// allowed to overwrite it.
    pub fn run(&self, jobs: &[SpriteJob], store: &ContentStore, out_dir: &Path) -> DecompositionReport {
        let start = Instant::now();
        self.reporter
            .report(ProgressEvent::BatchStarted { stage: "decompose".to_string(), total: jobs.len() });

        let pool = self.pool();
        let textures = match &pool {
            Some(pool) => pool.install(|| load_textures(jobs, store)),
            None => load_textures(jobs, store),
        };

        let mut seen = HashSet::new();
        let duplicate: Vec<bool> =
            jobs.iter().map(|job| !seen.insert(job.output_name.as_str())).collect();

        let process = |(job, is_duplicate): (&SpriteJob, bool)| -> (UnitResult, Option<SpriteAsset>) {
            if is_duplicate {
                return (UnitResult::failed(&job.output_name, "duplicate output name"), None);
            }
            let texture = textures.get(job.texture.as_str()).cloned().unwrap_or_else(|| {
                Err(format!("texture '{}' not found in content store", job.texture))
            });
            match texture.and_then(|(entry, image)| {
                cut_and_save(job, &entry, &image, out_dir).map_err(|e| e.to_string())
            }) {
                Ok(asset) => {
                    let result = UnitResult::success(&job.output_name, asset.path.clone())
                        .with_detail(format!("{}x{} from {}", asset.width, asset.height, asset.texture_entry));
                    (result, Some(asset))
                }
                Err(reason) => {
                    log::warn!("{}: {}", job.output_name, reason);
                    (UnitResult::failed(&job.output_name, reason), None)
                }
            }
        };

        let inputs: Vec<(&SpriteJob, bool)> = jobs.iter().zip(duplicate).collect();
        let outcomes: Vec<(UnitResult, Option<SpriteAsset>)> = match &pool {
            Some(pool) => pool.install(|| inputs.into_par_iter().map(process).collect()),
            None => inputs.into_par_iter().map(process).collect(),
        };

        let mut report = DecompositionReport::default();
        for (result, asset) in outcomes {
            self.reporter.report(ProgressEvent::unit(&result));
            report.batch.add_result(result);
            report.sprites.extend(asset);
        }
        report.batch.total_duration = start.elapsed();
        self.reporter.report(ProgressEvent::finished("decompose", &report.batch));
        report
    }

    fn pool(&self) -> Option<rayon::ThreadPool> {
        if self.jobs == 0 {
            return None;
        }
        match rayon::ThreadPoolBuilder::new().num_threads(self.jobs).build() {
            Ok(pool) => Some(pool),
            Err(e) => {
                log::warn!("could not start {} workers, using the global pool: {}", self.jobs, e);
                None
            }
        }
    }
}

/// Resolve and decode every distinct texture reference once, on the current
/// rayon pool.
fn load_textures(jobs: &[SpriteJob], store: &ContentStore) -> HashMap<String, LoadedTexture> {
    let mut references: Vec<&str> = jobs.iter().map(|j| j.texture.as_str()).collect();
    references.sort_unstable();
    references.dedup();

    let mut entries: HashMap<String, String> = HashMap::new();
    let mut loaded: HashMap<String, LoadedTexture> = HashMap::new();
    for reference in references {
        match store.resolve_reference(reference).entry() {
            Some(entry) => {
                log::debug!("texture {} -> {}", reference, entry);
                entries.insert(reference.to_string(), entry.to_string());
            }
            None => {
                let reason = SalvageError::MissingResource(format!(
                    "texture '{}' not found in {}",
                    reference,
                    store.root().display()
                ));
                loaded.insert(reference.to_string(), Err(reason.to_string()));
            }
        }
    }

    let mut distinct: Vec<&String> = entries.values().collect();
    distinct.sort_unstable();
    distinct.dedup();
    let decoded: HashMap<&String, LoadedTexture> = distinct
        .into_par_iter()
        .map(|entry| {
            let image = decode_texture(store, entry)
                .map(|image| (entry.clone(), Arc::new(image)))
                .map_err(|e| format!("{}: {}", entry, e));
            (entry, image)
        })
        .collect();

    for (reference, entry) in &entries {
        if let Some(texture) = decoded.get(entry) {
            loaded.insert(reference.clone(), texture.clone());
        }
    }
    loaded
}

fn decode_texture(store: &ContentStore, entry: &str) -> Result<DynamicImage> {
    let bytes = store.read(entry)?;
    Ok(image::load_from_memory(&bytes)?)
}

fn cut_and_save(job: &SpriteJob, entry: &str, texture: &DynamicImage, out_dir: &Path) -> Result<SpriteAsset> {
    let path = sprite_output_path(out_dir, &job.output_name, SPRITE_EXTENSION)?;
    let sprite = crop_sprite(texture, &job.rect)?;
    save_png(&sprite, &path)?;
    Ok(SpriteAsset {
        output_name: job.output_name.clone(),
        texture_entry: entry.to_string(),
        rect: job.rect.clone(),
        path,
        width: sprite.width(),
        height: sprite.height(),
    })
}

/// Pixel dimensions of a stored texture.
pub fn texture_dimensions(store: &ContentStore, entry: &str) -> Result<(u32, u32)> {
    let bytes = store.read(entry)?;
    let reader = image::io::Reader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| SalvageError::io(format!("read {}", entry), e))?;
    Ok(reader.into_dimensions()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn rect(x: i64, y: i64, w: i64, h: i64) -> SpriteRect {
        SpriteRect::new("s", x, y, w, h).unwrap()
    }

    #[test]
    fn test_clamp_inside() {
        let region = clamp_rect(&rect(10, 20, 30, 40), 100, 100).unwrap();
        assert_eq!(region, CropRegion { x: 10, y: 20, width: 30, height: 40 });
    }

    #[test]
    fn test_clamp_oversized_to_texture() {
        let region = clamp_rect(&rect(0, 0, 9999, 9999), 100, 100).unwrap();
        assert_eq!((region.width, region.height), (100, 100));
    }

    #[test]
    fn test_clamp_partial_overflow() {
        let region = clamp_rect(&rect(90, 95, 50, 50), 100, 100).unwrap();
        assert_eq!((region.width, region.height), (10, 5));
    }

    #[test]
    fn test_clamp_outside_is_none() {
        assert_eq!(clamp_rect(&rect(100, 0, 5, 5), 100, 100), None);
        assert_eq!(clamp_rect(&rect(0, 250, 5, 5), 100, 100), None);
    }

    #[test]
    fn test_clamp_saturates() {
        let r = SpriteRect { name: "s".into(), x: u32::MAX - 1, y: 0, width: u32::MAX, height: 1 };
        assert_eq!(clamp_rect(&r, 100, 100), None);
    }

    #[test]
    fn test_crop_takes_requested_pixels() {
        let mut texture = RgbaImage::new(4, 4);
        texture.put_pixel(2, 1, Rgba([255, 0, 0, 255]));
        let sprite = crop_sprite(&DynamicImage::ImageRgba8(texture), &rect(2, 1, 2, 2)).unwrap();
        assert_eq!((sprite.width(), sprite.height()), (2, 2));
        assert_eq!(sprite.to_rgba8().get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_crop_outside_fails() {
        let texture = DynamicImage::ImageRgba8(RgbaImage::new(4, 4));
        let err = crop_sprite(&texture, &rect(4, 4, 2, 2)).unwrap_err();
        assert_eq!(err.kind(), "invalid_sprite");
    }

    #[test]
    fn test_jobs_from_atlas() {
        let mut atlas = Atlas::new("abcd");
        atlas.insert(SpriteRect::new("s_bg", 0, 0, 10, 10).unwrap());
        atlas.insert(SpriteRect::new("s_title", 0, 10, 10, 5).unwrap());
        let jobs = SpriteJob::from_atlas(&atlas);
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[1].output_name, "s_title");
        assert_eq!(jobs[1].texture, "abcd");
    }
}
