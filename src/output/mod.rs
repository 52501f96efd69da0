//! Output formatters for scan results

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::types::{Issue, ScanResult};

/// Output formatter trait
pub trait OutputFormatter: Send + Sync {
    /// Format the results of one or more scans
    fn format(&self, results: &[ScanResult]) -> String;

    /// Format a single issue
    fn format_issue(&self, issue: &Issue) -> String;
}
