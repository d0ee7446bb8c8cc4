//! Asset extraction from archive records into a content store
//!
//! Records are filtered by MIME type or URL suffix, their payloads decoded,
//! and the result written under a name taken from the request URL. Names
//! never collide: a name already present in the store gets the running
//! save counter prepended.

use base64::Engine;
use percent_encoding::percent_decode_str;
use std::time::Instant;

use crate::archive::{ContentEncoding, TransactionRecord};
use crate::error::Result;
use crate::progress::{NullProgress, ProgressEvent, ProgressReporter};
use crate::report::{BatchReport, UnitResult};
use crate::store::ContentStore;

/// Which records count as assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractFilter {
    /// Substrings of the response MIME type that mark an asset
    pub mime_kinds: Vec<String>,
    /// URL path suffixes that mark an asset regardless of MIME type
    pub suffixes: Vec<String>,
}

impl Default for ExtractFilter {
    fn default() -> Self {
        Self {
            mime_kinds: vec!["image".to_string(), "audio".to_string(), "font".to_string()],
            suffixes: vec![".json".to_string()],
        }
    }
}

impl ExtractFilter {
    /// Whether a record is an asset worth extracting.
    pub fn accepts(&self, record: &TransactionRecord) -> bool {
        let mime = record.mime_type.to_ascii_lowercase();
        if self.mime_kinds.iter().any(|kind| mime.contains(kind.as_str())) {
            return true;
        }
        let path = raw_url_path(&record.request_url);
        self.suffixes.iter().any(|suffix| path.ends_with(suffix.as_str()))
    }
}

/// The path component of a URL, still percent-encoded.
///
/// Absolute URLs go through the `url` parser; anything it rejects is treated
/// as a bare path with query and fragment stripped.
fn raw_url_path(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => {
            let end = url.find(['?', '#']).unwrap_or(url.len());
            url[..end].to_string()
        }
    }
}

/// File name for a request URL: the last segment of the percent-decoded
/// path. `None` when the path has no usable final segment.
pub fn logical_name(url: &str) -> Option<String> {
    let raw = raw_url_path(url);
    let decoded = percent_decode_str(&raw).decode_utf8_lossy();
    let segment = decoded.rsplit('/').next().unwrap_or("");
    match segment {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

/// Decode a record's payload to the bytes that go on disk.
pub fn decode_payload(record: &TransactionRecord) -> Result<Vec<u8>> {
    match record.encoding {
        ContentEncoding::Base64 => {
            let compact: String =
                record.payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            Ok(base64::engine::general_purpose::STANDARD.decode(compact)?)
        }
        ContentEncoding::Identity => Ok(record.payload.as_bytes().to_vec()),
    }
}

/// Extracts assets from archive records into a content store.
pub struct AssetExtractor<'a> {
    filter: ExtractFilter,
    reporter: &'a dyn ProgressReporter,
}

impl Default for AssetExtractor<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> AssetExtractor<'a> {
    pub fn new() -> Self {
        Self { filter: ExtractFilter::default(), reporter: &NullProgress }
    }

    pub fn with_filter(mut self, filter: ExtractFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_reporter(mut self, reporter: &'a dyn ProgressReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Extract every qualifying record, in order, into `store`.
    ///
    /// Never stops early: each record succeeds, is skipped (empty payload)
    /// or fails (bad base64, write error) on its own.
    pub fn extract(&self, records: &[TransactionRecord], store: &mut ContentStore) -> BatchReport {
        let start = Instant::now();
        let accepted: Vec<&TransactionRecord> =
            records.iter().filter(|r| self.filter.accepts(r)).collect();

        let mut report = BatchReport::new();
        report.ignored = records.len() - accepted.len();
        self.reporter
            .report(ProgressEvent::BatchStarted { stage: "extract".to_string(), total: accepted.len() });

        let mut saved = 0usize;
        for record in accepted {
            let result = self.extract_record(record, saved, store);
            if result.is_success() {
                saved += 1;
            }
            self.reporter.report(ProgressEvent::unit(&result));
            report.add_result(result);
        }

        let report = report.with_duration(start.elapsed());
        self.reporter.report(ProgressEvent::finished("extract", &report));
        report
    }

    /// Process one accepted record. `saved` is the number of assets saved
    /// before this one; it seeds synthesized names and collision prefixes.
    fn extract_record(
        &self,
        record: &TransactionRecord,
        saved: usize,
        store: &mut ContentStore,
    ) -> UnitResult {
        let base_name = logical_name(&record.request_url).unwrap_or_else(|| format!("asset_{}", saved));

        if !record.has_payload() {
            log::debug!("{}: empty payload, skipping", record.request_url);
            return UnitResult::skipped(base_name, "empty payload");
        }

        let bytes = match decode_payload(record) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("{}: {}", base_name, e);
                return UnitResult::failed(base_name, e.to_string());
            }
        };

        let name = store.unique_name(&base_name, saved);
        if name != base_name {
            log::info!("{} already stored, saving as {}", base_name, name);
        }

        match store.write(&name, &bytes) {
            Ok(path) => UnitResult::success(name, path).with_detail(record.mime_type.clone()),
            Err(e) => {
                log::warn!("{}: {}", name, e);
                UnitResult::failed(name, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, mime: &str, payload: &str, encoding: ContentEncoding) -> TransactionRecord {
        TransactionRecord {
            request_url: url.to_string(),
            mime_type: mime.to_string(),
            encoding,
            payload: payload.to_string(),
        }
    }

    #[test]
    fn test_filter_by_mime_kind() {
        let filter = ExtractFilter::default();
        let png = record("https://x/a.png", "image/png", "", ContentEncoding::Identity);
        let ogg = record("https://x/a.ogg", "audio/ogg", "", ContentEncoding::Identity);
        let woff = record("https://x/a.woff", "font/woff2", "", ContentEncoding::Identity);
        let html = record("https://x/index.html", "text/html", "", ContentEncoding::Identity);
        assert!(filter.accepts(&png));
        assert!(filter.accepts(&ogg));
        assert!(filter.accepts(&woff));
        assert!(!filter.accepts(&html));
    }

    #[test]
    fn test_filter_by_json_path_ignores_query() {
        let filter = ExtractFilter::default();
        let json = record("https://x/game.json?v=3", "text/plain", "", ContentEncoding::Identity);
        let not_json = record("https://x/api?f=a.json", "text/plain", "", ContentEncoding::Identity);
        assert!(filter.accepts(&json));
        assert!(!filter.accepts(&not_json));
    }

    #[test]
    fn test_logical_name_decodes_percent_escapes() {
        assert_eq!(logical_name("https://cdn.x/res/abcd.png").as_deref(), Some("abcd.png"));
        assert_eq!(logical_name("https://cdn.x/res/my%20file.png?v=1").as_deref(), Some("my file.png"));
        assert_eq!(logical_name("/relative/path/data.json#frag").as_deref(), Some("data.json"));
    }

    #[test]
    fn test_logical_name_missing_segment() {
        assert_eq!(logical_name("https://cdn.x/"), None);
        assert_eq!(logical_name("https://cdn.x"), None);
        assert_eq!(logical_name("https://cdn.x/dir/"), None);
    }

    #[test]
    fn test_decode_base64_ignores_line_breaks() {
        let rec = record("u", "image/png", "aGVs\nbG8=", ContentEncoding::Base64);
        assert_eq!(decode_payload(&rec).unwrap(), b"hello");
    }

    #[test]
    fn test_decode_invalid_base64() {
        let rec = record("u", "image/png", "not base64!!", ContentEncoding::Base64);
        let err = decode_payload(&rec).unwrap_err();
        assert_eq!(err.kind(), "decode");
    }

    #[test]
    fn test_decode_identity_is_utf8() {
        let rec = record("u", "application/json", "{\"é\":1}", ContentEncoding::Identity);
        assert_eq!(decode_payload(&rec).unwrap(), "{\"é\":1}".as_bytes());
    }
}
