//! Findings and per-scan issue construction

use crate::rules::RuleId;
use crate::types::{ElementInfo, Issue};

/// What a check reports, before the scan assigns it an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub rule: RuleId,
    pub message: String,
    pub element: Option<ElementInfo>,
    /// Overrides the rule's default fix text
    pub fix: Option<String>,
}

impl Finding {
    pub fn new(rule: RuleId, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
            element: None,
            fix: None,
        }
    }

    /// Bind the finding to an element
    pub fn at(mut self, element: ElementInfo) -> Self {
        self.element = Some(element);
        self
    }

    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.fix = Some(fix.into());
        self
    }
}

/// Turns findings into issues with ids unique within one scan
///
/// Create one builder per scan; ids come from a counter that is never reset.
#[derive(Debug, Default)]
pub struct IssueBuilder {
    issued: usize,
}

impl IssueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of issues built so far
    pub fn issued(&self) -> usize {
        self.issued
    }

    pub fn build(&mut self, finding: Finding) -> Issue {
        self.issued += 1;
        let meta = finding.rule.meta();

        let mut issue = Issue::new(
            format!("{}-{}", meta.id, self.issued),
            meta.id,
            meta.severity,
            meta.category,
            finding.message,
        )
        .with_help_url(meta.help_url)
        .with_fix(finding.fix.unwrap_or_else(|| meta.fix.to_string()));

        if let Some(element) = finding.element.filter(|e| !e.selector.is_empty()) {
            issue = issue.with_element(element);
        }
        issue
    }
}
