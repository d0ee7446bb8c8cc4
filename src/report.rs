//! Batch result types.
//!
//! Every salvage operation works unit by unit (one archive entry, one
//! sprite). A unit either succeeds, is skipped, or fails; none of these stop
//! the batch. These types collect the outcomes.

use std::path::PathBuf;
use std::time::Duration;

/// Outcome of a single unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStatus {
    /// Unit produced its output
    Success,
    /// Unit was deliberately not processed
    Skipped(String),
    /// Unit failed with error
    Failed(String),
}

impl UnitStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, UnitStatus::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, UnitStatus::Failed(_))
    }
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitStatus::Success => write!(f, "success"),
            UnitStatus::Skipped(reason) => write!(f, "skipped: {}", reason),
            UnitStatus::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// Result of processing one unit.
#[derive(Debug, Clone)]
pub struct UnitResult {
    /// Unit name (asset file name, sprite name)
    pub unit_id: String,
    /// Outcome
    pub status: UnitStatus,
    /// Files written
    pub outputs: Vec<PathBuf>,
    /// Extra human-readable information (MIME type, final dimensions)
    pub detail: Option<String>,
}

impl UnitResult {
    /// Create a successful result.
    pub fn success(unit_id: impl Into<String>, output: PathBuf) -> Self {
        Self {
            unit_id: unit_id.into(),
            status: UnitStatus::Success,
            outputs: vec![output],
            detail: None,
        }
    }

    /// Create a skipped result.
    pub fn skipped(unit_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            status: UnitStatus::Skipped(reason.into()),
            outputs: vec![],
            detail: None,
        }
    }

    /// Create a failed result.
    pub fn failed(unit_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            status: UnitStatus::Failed(error.into()),
            outputs: vec![],
            detail: None,
        }
    }

    /// Attach detail text.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Results of a whole batch.
#[derive(Debug, Default, Clone)]
pub struct BatchReport {
    /// Per-unit results, in processing order
    pub units: Vec<UnitResult>,
    /// Inputs that did not qualify as units at all (e.g. HTML responses)
    pub ignored: usize,
    /// Wall time of the batch
    pub total_duration: Duration,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit result.
    pub fn add_result(&mut self, result: UnitResult) {
        self.units.push(result);
    }

    /// Set the total duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.total_duration = duration;
        self
    }

    pub fn success_count(&self) -> usize {
        self.units.iter().filter(|r| r.status.is_success()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.units.iter().filter(|r| matches!(r.status, UnitStatus::Skipped(_))).count()
    }

    pub fn failed_count(&self) -> usize {
        self.units.iter().filter(|r| r.status.is_failure()).count()
    }

    /// No unit failed.
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    /// All files written, in processing order.
    pub fn all_outputs(&self) -> Vec<&PathBuf> {
        self.units.iter().flat_map(|r| r.outputs.iter()).collect()
    }

    /// Failed unit results.
    pub fn failures(&self) -> Vec<&UnitResult> {
        self.units.iter().filter(|r| r.status.is_failure()).collect()
    }

    /// Look up a unit by name.
    pub fn unit(&self, unit_id: &str) -> Option<&UnitResult> {
        self.units.iter().find(|r| r.unit_id == unit_id)
    }

    /// Format a summary of the batch.
    pub fn summary(&self, noun: &str) -> String {
        let mut lines = Vec::new();

        let success = self.success_count();
        let skipped = self.skipped_count();
        let failed = self.failed_count();

        if failed > 0 {
            lines.push(format!(
                "Saved {} {}, {} skipped, {} failed",
                success, noun, skipped, failed
            ));
            for unit in self.failures().iter().take(10) {
                lines.push(format!("  - {}: {}", unit.unit_id, unit.status));
            }
            if failed > 10 {
                lines.push(format!("  ... and {} more", failed - 10));
            }
        } else {
            lines.push(format!(
                "Saved {} {}, {} skipped in {:?}",
                success, noun, skipped, self.total_duration
            ));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_status_display() {
        assert_eq!(UnitStatus::Success.to_string(), "success");
        assert_eq!(UnitStatus::Skipped("empty".to_string()).to_string(), "skipped: empty");
        assert_eq!(UnitStatus::Failed("boom".to_string()).to_string(), "failed: boom");
    }

    #[test]
    fn test_batch_counts() {
        let mut report = BatchReport::new();
        report.add_result(UnitResult::success("a.png", PathBuf::from("out/a.png")));
        report.add_result(UnitResult::skipped("b.png", "empty payload"));
        report.add_result(UnitResult::failed("c.png", "invalid base64"));

        assert_eq!(report.success_count(), 1);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert!(!report.is_success());
        assert_eq!(report.all_outputs(), vec![&PathBuf::from("out/a.png")]);
        assert_eq!(report.unit("c.png").map(|u| u.is_success()), Some(false));
    }

    #[test]
    fn test_summary_lists_failures() {
        let mut report = BatchReport::new();
        report.add_result(UnitResult::failed("tex.png", "missing texture"));
        let summary = report.summary("sprites");
        assert!(summary.contains("Saved 0 sprites, 0 skipped, 1 failed"));
        assert!(summary.contains("tex.png: failed: missing texture"));
    }

    #[test]
    fn test_summary_success() {
        let mut report = BatchReport::new();
        report.add_result(UnitResult::success("a", PathBuf::from("a")).with_detail("2x2"));
        assert!(report.is_success());
        assert!(report.summary("assets").starts_with("Saved 1 assets, 0 skipped"));
    }
}
