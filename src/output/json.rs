//! JSON output formatter
//!
//! A single result is written as one object in the scan result wire format;
//! several results are written as an array of such objects.

use super::OutputFormatter;
use crate::types::{Issue, ScanResult};
use serde::Serialize;

/// JSON formatter for machine-readable output
#[derive(Default)]
pub struct JsonFormatter {
    /// Pretty print with indentation
    pub pretty: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable pretty printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> String {
        if self.pretty {
            serde_json::to_string_pretty(value).unwrap_or_default()
        } else {
            serde_json::to_string(value).unwrap_or_default()
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, results: &[ScanResult]) -> String {
        match results {
            [single] => self.to_json(single),
            _ => self.to_json(results),
        }
    }

    fn format_issue(&self, issue: &Issue) -> String {
        self.to_json(issue)
    }
}
