//! HTTP Archive (HAR) model
//!
//! Only the handful of fields the salvage pipeline reads are modeled. Every
//! field is optional on the wire so that captures from different browsers
//! load without complaint; a missing request URL is the only thing that
//! makes an entry unusable.

use serde::Deserialize;
use std::path::Path;

use crate::error::{Result, SalvageError};

/// How a response payload is stored in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentEncoding {
    /// Payload is literal text
    #[default]
    Identity,
    /// Payload is base64 encoded binary
    Base64,
}

impl ContentEncoding {
    /// Interpret the HAR `encoding` marker. Anything other than `base64` is
    /// treated as literal text.
    pub fn from_marker(marker: Option<&str>) -> Self {
        match marker.map(str::trim) {
            Some(m) if m.eq_ignore_ascii_case("base64") => ContentEncoding::Base64,
            _ => ContentEncoding::Identity,
        }
    }
}

/// Typed view over one logged request/response pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    /// Full request URL, as logged
    pub request_url: String,
    /// Response MIME type (may be empty)
    pub mime_type: String,
    /// Storage encoding of the payload
    pub encoding: ContentEncoding,
    /// Response payload text (base64 text when `encoding` is `Base64`)
    pub payload: String,
}

impl TransactionRecord {
    /// Whether the record carries any payload at all.
    pub fn has_payload(&self) -> bool {
        !self.payload.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct HarDocument {
    #[serde(default)]
    log: HarLog,
}

#[derive(Debug, Default, Deserialize)]
struct HarLog {
    #[serde(default)]
    entries: Vec<HarEntry>,
}

#[derive(Debug, Deserialize)]
struct HarEntry {
    #[serde(default)]
    request: HarRequest,
    #[serde(default)]
    response: HarResponse,
}

#[derive(Debug, Default, Deserialize)]
struct HarRequest {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HarResponse {
    #[serde(default)]
    content: HarContent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HarContent {
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

impl HarEntry {
    fn into_record(self) -> Option<TransactionRecord> {
        let request_url = self.request.url.filter(|u| !u.is_empty())?;
        let content = self.response.content;
        Some(TransactionRecord {
            request_url,
            mime_type: content.mime_type.unwrap_or_default(),
            encoding: ContentEncoding::from_marker(content.encoding.as_deref()),
            payload: content.text.unwrap_or_default(),
        })
    }
}

/// A loaded archive: the ordered transaction records plus the raw document
/// text, which the raw atlas scanner searches directly.
#[derive(Debug, Clone)]
pub struct Archive {
    records: Vec<TransactionRecord>,
    raw: String,
}

impl Archive {
    /// Parse an archive from its JSON text.
    ///
    /// `origin` is only used to label a parse failure.
    pub fn parse(raw: String, origin: &Path) -> Result<Self> {
        let document: HarDocument =
            serde_json::from_str(&raw).map_err(|e| SalvageError::DocumentParse {
                document: origin.to_path_buf(),
                message: e.to_string(),
            })?;
        let total = document.log.entries.len();
        let records: Vec<TransactionRecord> =
            document.log.entries.into_iter().filter_map(HarEntry::into_record).collect();
        if records.len() < total {
            log::warn!("{}: {} entries without a request URL", origin.display(), total - records.len());
        }
        Ok(Self { records, raw })
    }

    /// Load and parse an archive file.
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected; captures
    /// regularly contain stray bytes in text bodies.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = read_lossy(path)?;
        Self::parse(raw, path)
    }

    /// Records in capture order.
    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    /// The unparsed document text.
    pub fn raw_text(&self) -> &str {
        &self.raw
    }
}

/// Read a file as text, replacing invalid UTF-8.
pub fn read_lossy(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .map_err(|e| SalvageError::io(format!("read {}", path.display()), e))?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}
