//! Error types shared by the extraction and decomposition pipelines.
//!
//! Document-level errors abort a run. Everything else is scoped to a single
//! unit (one archive entry, one sprite) and is reported without stopping the
//! batch.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while salvaging assets.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SalvageError {
    /// The top-level input document could not be parsed
    #[error("Failed to parse {}: {message}", .document.display())]
    DocumentParse { document: PathBuf, message: String },
    /// A payload or raster could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
    /// A referenced texture or file does not exist
    #[error("Missing resource: {0}")]
    MissingResource(String),
    /// A sprite cannot be cut as requested (rectangle off the texture,
    /// output name that is not a plain file name)
    #[error("Invalid sprite: {0}")]
    InvalidSprite(String),
    /// Reading or writing a file failed
    #[error("IO error ({context}): {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl SalvageError {
    /// Wrap an IO error with the path or operation it happened on.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        SalvageError::Io { context: context.into(), source }
    }

    /// Whether the error aborts the whole run rather than a single unit.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SalvageError::DocumentParse { .. })
    }

    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            SalvageError::DocumentParse { .. } => "document_parse",
            SalvageError::Decode(_) => "decode",
            SalvageError::MissingResource(_) => "missing_resource",
            SalvageError::InvalidSprite(_) => "invalid_sprite",
            SalvageError::Io { .. } => "io",
        }
    }
}

impl From<image::ImageError> for SalvageError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::IoError(io) => SalvageError::io("image", io),
            other => SalvageError::Decode(other.to_string()),
        }
    }
}

impl From<base64::DecodeError> for SalvageError {
    fn from(e: base64::DecodeError) -> Self {
        SalvageError::Decode(format!("invalid base64: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, SalvageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_document_errors_are_fatal() {
        let parse = SalvageError::DocumentParse {
            document: PathBuf::from("capture.har"),
            message: "expected value".to_string(),
        };
        assert!(parse.is_fatal());
        assert!(!SalvageError::Decode("bad".to_string()).is_fatal());
        assert!(!SalvageError::MissingResource("tex.png".to_string()).is_fatal());
        let sprite = SalvageError::InvalidSprite("../up".to_string());
        assert!(!sprite.is_fatal());
        assert_eq!(sprite.kind(), "invalid_sprite");
        let io = SalvageError::io("write", std::io::Error::other("disk full"));
        assert!(!io.is_fatal());
        assert_eq!(io.kind(), "io");
    }

    #[test]
    fn test_display_includes_document() {
        let err = SalvageError::DocumentParse {
            document: PathBuf::from("capture.har"),
            message: "EOF".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to parse capture.har: EOF");
    }
}
