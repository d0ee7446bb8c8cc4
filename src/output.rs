//! PNG encoding and all-or-nothing file output

use image::{DynamicImage, ImageOutputFormat};
use std::ffi::OsStr;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::error::{Result, SalvageError};

/// Suffix of in-flight temporary files. Content stores ignore these.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Encode an image to PNG bytes in memory.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .map_err(|e| SalvageError::Decode(format!("PNG encoding failed: {}", e)))?;
    Ok(bytes)
}

/// Write bytes to `path` without ever leaving a truncated file behind.
///
/// The data goes to a hidden sibling first and is renamed into place once
/// fully written. On failure the sibling is removed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .map_err(|e| SalvageError::io(format!("create {}", parent.display()), e))?;
        }
    }

    let partial = partial_path(path);
    let written = fs::write(&partial, bytes).and_then(|_| fs::rename(&partial, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&partial);
        return Err(SalvageError::io(format!("write {}", path.display()), e));
    }
    Ok(())
}

/// Encode and save an image as PNG.
///
/// Encoding happens before anything touches the disk, so an encoding failure
/// never produces a file.
pub fn save_png(image: &DynamicImage, path: &Path) -> Result<()> {
    let bytes = encode_png(image)?;
    write_atomic(path, &bytes)
}

/// Whether a directory entry name is an in-flight temporary file.
pub fn is_partial_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(PARTIAL_SUFFIX)
}

fn partial_path(path: &Path) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    path.with_file_name(format!(".{}{}", name, PARTIAL_SUFFIX))
}

/// Whether `name` is a single plain path component, so joining it onto a
/// directory stays inside that directory.
pub fn is_flat_name(name: &str) -> bool {
    !name.contains(['/', '\\']) && Path::new(name).file_name() == Some(OsStr::new(name))
}

/// Output path for a sprite: `dir/{name}.{extension}`.
///
/// Names that would leave `dir` or create subdirectories are rejected.
pub fn sprite_output_path(dir: &Path, name: &str, extension: &str) -> Result<PathBuf> {
    if !is_flat_name(name) {
        return Err(SalvageError::InvalidSprite(format!(
            "output name '{}' is not a plain file name",
            name
        )));
    }
    Ok(dir.join(format!("{}.{}", name, extension)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_creates_parent_and_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/blob.bin");
        write_atomic(&path, b"hello").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"hello");
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn test_write_atomic_failure_leaves_nothing() {
        let temp = TempDir::new().unwrap();
        // A directory in the way makes the rename fail
        let path = temp.path().join("blocked");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("inner"), b"x").unwrap();
        assert!(write_atomic(&path, b"data").is_err());
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn test_save_png_round_trips_dimensions() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sprite.png");
        let image = DynamicImage::ImageRgba8(RgbaImage::new(3, 5));
        save_png(&image, &path).unwrap();
        let loaded = image::open(&path).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (3, 5));
    }

    #[test]
    fn test_partial_names() {
        assert!(is_partial_name(".tex.png.part"));
        assert!(!is_partial_name("tex.png"));
        assert!(!is_partial_name("tex.part"));
    }

    #[test]
    fn test_sprite_output_path() {
        assert_eq!(
            sprite_output_path(Path::new("out"), "symbol_A", "png").unwrap(),
            PathBuf::from("out/symbol_A.png")
        );
    }

    #[test]
    fn test_sprite_output_path_rejects_nested_names() {
        for name in ["../escaped", "ui/btn", "..", ".", "", "a\\b", "/abs"] {
            let err = sprite_output_path(Path::new("out"), name, "png").unwrap_err();
            assert_eq!(err.kind(), "invalid_sprite", "accepted {:?}", name);
        }
        assert!(is_flat_name("s_symbol03_win_00"));
        assert!(is_flat_name(".hidden"));
    }
}
