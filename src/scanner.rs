//! Scan orchestration
//!
//! Runs the check battery against a [`Page`] in a fixed order, turns findings
//! into issues, and assembles the [`ScanResult`]. A check that fails is logged
//! and listed in `incomplete`; it never aborts the scan.

use crate::checks::{self, Check};
use crate::config::Config;
use crate::error::ScanError;
use crate::issue::IssueBuilder;
use crate::page::Page;
use crate::types::{ScanResult, Summary};
use log::{debug, info, warn};
use std::path::Path;
use std::time::Instant;

/// Scan orchestrator
pub struct Scanner {
    checks: Vec<Check>,
    config: Config,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    /// Scanner running the full battery with default configuration
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Scanner honoring `rules.disabled` and the report filters of `config`
    pub fn with_config(config: Config) -> Self {
        let checks = checks::battery()
            .into_iter()
            .filter(|check| !config.is_disabled(check.id))
            .collect();
        Self { checks, config }
    }

    /// Scanner running an explicit list of checks
    pub fn with_checks(checks: Vec<Check>) -> Self {
        Self {
            checks,
            config: Config::default(),
        }
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every check against `page`
    pub fn scan(&self, page: &Page) -> ScanResult {
        let start = Instant::now();
        let mut builder = IssueBuilder::new();
        let mut issues = Vec::new();
        let mut incomplete = Vec::new();

        for check in &self.checks {
            let check_start = Instant::now();
            match (check.run)(page) {
                Ok(findings) => {
                    debug!(
                        "{}: {} finding(s) in {:?}",
                        check.id,
                        findings.len(),
                        check_start.elapsed()
                    );
                    for finding in findings {
                        let issue = builder.build(finding);
                        if self.config.reports(&issue) {
                            issues.push(issue);
                        }
                    }
                }
                Err(e) => {
                    warn!("Check '{}' did not complete: {}", check.id, e);
                    incomplete.push(check.id.to_string());
                }
            }
        }

        let summary = Summary::from_issues(&issues);
        let duration = start.elapsed().as_secs_f64() * 1000.0;
        info!(
            "Scanned {} in {:.1}ms: {} issue(s), {} incomplete check(s)",
            page.url(),
            duration,
            summary.total,
            incomplete.len()
        );

        ScanResult {
            url: page.url().to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            duration,
            issues,
            incomplete,
            summary,
        }
    }

    /// Parse and scan an HTML string
    pub fn scan_source(&self, html: &str) -> ScanResult {
        self.scan(&Page::parse(html))
    }

    /// Read, parse and scan an HTML file
    pub fn scan_file(&self, path: &Path) -> Result<ScanResult, ScanError> {
        let page = Page::from_file(path)?;
        Ok(self.scan(&page))
    }
}

/// Scan `page` with the full battery and default configuration
pub fn scan(page: &Page) -> ScanResult {
    Scanner::new().scan(page)
}
