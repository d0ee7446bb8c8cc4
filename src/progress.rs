//! Progress reporting for batch operations.
//!
//! Reporters receive one event per processed unit plus start/finish events
//! for the batch. Console output is colored when stderr is a terminal;
//! the JSON reporter emits one object per line for tooling.
//!
//! # Example
//!
//! ```ignore
//! use spritesalvage::progress::{ConsoleProgress, ProgressEvent, ProgressReporter};
//!
//! let reporter = ConsoleProgress::new();
//! reporter.report(ProgressEvent::BatchStarted { stage: "extract".into(), total: 12 });
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::report::{BatchReport, UnitResult, UnitStatus};

/// Events that can be reported during a batch.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A batch started
    BatchStarted {
        /// Pipeline stage ("extract", "decompose")
        stage: String,
        /// Number of units that will be processed
        total: usize,
    },
    /// A unit finished
    UnitCompleted {
        unit_id: String,
        status: UnitStatus,
        detail: Option<String>,
    },
    /// A batch finished
    BatchCompleted {
        stage: String,
        succeeded: usize,
        skipped: usize,
        failed: usize,
        duration_ms: u64,
    },
    /// Something worth telling the operator that is not tied to a unit outcome
    Warning { unit_id: Option<String>, message: String },
}

impl ProgressEvent {
    /// Build a completion event from a unit result.
    pub fn unit(result: &UnitResult) -> Self {
        ProgressEvent::UnitCompleted {
            unit_id: result.unit_id.clone(),
            status: result.status.clone(),
            detail: result.detail.clone(),
        }
    }

    /// Build a batch completion event from a report.
    pub fn finished(stage: &str, report: &BatchReport) -> Self {
        ProgressEvent::BatchCompleted {
            stage: stage.to_string(),
            succeeded: report.success_count(),
            skipped: report.skipped_count(),
            failed: report.failed_count(),
            duration_ms: report.total_duration.as_millis() as u64,
        }
    }
}

/// Trait for progress reporters.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event.
    fn report(&self, event: ProgressEvent);
}

/// A progress reporter that discards all events.
#[derive(Debug, Default)]
pub struct NullProgress;

impl NullProgress {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for NullProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Console progress reporter with optional colors.
pub struct ConsoleProgress {
    use_colors: bool,
    /// Also print skipped units
    verbose: bool,
    current: AtomicUsize,
    total: AtomicUsize,
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleProgress")
            .field("use_colors", &self.use_colors)
            .field("verbose", &self.verbose)
            .field("current", &self.current)
            .field("total", &self.total)
            .finish()
    }
}

impl ConsoleProgress {
    /// Create a reporter writing to stderr.
    pub fn new() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stderr),
            verbose: false,
            current: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            output: Mutex::new(Box::new(std::io::stderr())),
        }
    }

    /// Create a reporter that writes to a custom output, without colors.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self {
            use_colors: false,
            verbose: false,
            current: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            output: Mutex::new(Box::new(output)),
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.color(text, "\x1b[32m")
    }

    fn yellow(&self, text: &str) -> String {
        self.color(text, "\x1b[33m")
    }

    fn red(&self, text: &str) -> String {
        self.color(text, "\x1b[31m")
    }

    fn cyan(&self, text: &str) -> String {
        self.color(text, "\x1b[36m")
    }

    fn writeln(&self, line: &str) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", line);
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::BatchStarted { stage, total } => {
                self.total.store(total, Ordering::SeqCst);
                self.current.store(0, Ordering::SeqCst);
                self.writeln(&format!(
                    "{} {} unit{}...",
                    self.cyan(&format!("[{}]", stage)),
                    total,
                    if total == 1 { "" } else { "s" }
                ));
            }
            ProgressEvent::UnitCompleted { unit_id, status, detail } => {
                let current = self.current.fetch_add(1, Ordering::SeqCst) + 1;
                let total = self.total.load(Ordering::SeqCst);

                let status_str = match &status {
                    UnitStatus::Success => self.green("ok"),
                    UnitStatus::Skipped(_) if !self.verbose => return,
                    UnitStatus::Skipped(_) => self.yellow("skipped"),
                    UnitStatus::Failed(_) => self.red("FAILED"),
                };
                let detail = detail.map(|d| format!(" ({})", d)).unwrap_or_default();
                self.writeln(&format!("  [{}/{}] {} {}{}", current, total, status_str, unit_id, detail));

                match status {
                    UnitStatus::Failed(err) => self.writeln(&format!("        {}", self.red(&err))),
                    UnitStatus::Skipped(reason) => {
                        self.writeln(&format!("        {}", self.yellow(&reason)))
                    }
                    UnitStatus::Success => {}
                }
            }
            ProgressEvent::BatchCompleted { stage, succeeded, skipped, failed, duration_ms } => {
                let tag = if failed == 0 { self.green("[done]") } else { self.red("[error]") };
                self.writeln(&format!(
                    "{} {}: {} succeeded, {} skipped, {} failed in {}",
                    tag,
                    stage,
                    succeeded,
                    skipped,
                    failed,
                    format_duration(duration_ms)
                ));
            }
            ProgressEvent::Warning { unit_id, message } => {
                let prefix = unit_id.map(|id| format!("{}: ", id)).unwrap_or_default();
                self.writeln(&format!("{} {}{}", self.yellow("[warn]"), prefix, message));
            }
        }
    }
}

/// JSON-lines progress reporter for machine-readable output.
pub struct JsonProgress {
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for JsonProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonProgress").finish()
    }
}

impl JsonProgress {
    /// Create a JSON progress reporter writing to stderr.
    pub fn new() -> Self {
        Self { output: Mutex::new(Box::new(std::io::stderr())) }
    }

    /// Create a JSON progress reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self { output: Mutex::new(Box::new(output)) }
    }

    fn write_json(&self, value: serde_json::Value) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", value);
        }
    }
}

impl Default for JsonProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        use serde_json::json;

        let value = match event {
            ProgressEvent::BatchStarted { stage, total } => {
                json!({ "event": "batch_started", "stage": stage, "total": total })
            }
            ProgressEvent::UnitCompleted { unit_id, status, detail } => {
                let mut value = json!({ "event": "unit_completed", "unit_id": unit_id });
                match status {
                    UnitStatus::Success => value["status"] = json!("success"),
                    UnitStatus::Skipped(reason) => {
                        value["status"] = json!("skipped");
                        value["reason"] = json!(reason);
                    }
                    UnitStatus::Failed(err) => {
                        value["status"] = json!("failed");
                        value["error"] = json!(err);
                    }
                }
                if let Some(detail) = detail {
                    value["detail"] = json!(detail);
                }
                value
            }
            ProgressEvent::BatchCompleted { stage, succeeded, skipped, failed, duration_ms } => {
                json!({
                    "event": "batch_completed",
                    "stage": stage,
                    "succeeded": succeeded,
                    "skipped": skipped,
                    "failed": failed,
                    "duration_ms": duration_ms,
                })
            }
            ProgressEvent::Warning { unit_id, message } => {
                json!({ "event": "warning", "unit_id": unit_id, "message": message })
            }
        };
        self.write_json(value);
    }
}

/// Format a duration in milliseconds for display.
fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else {
        format!("{:.2}s", ms as f64 / 1000.0)
    }
}
