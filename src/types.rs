//! Core types for scan results

use serde::{Deserialize, Serialize};

/// Impact of an issue on users of the page
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Stylistic or best-practice deviation
    #[default]
    Minor,
    /// Usability issue
    Moderate,
    /// Significant barrier
    Serious,
    /// Blocks core functionality
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::Serious,
        Severity::Moderate,
        Severity::Minor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Serious => "serious",
            Severity::Moderate => "moderate",
            Severity::Minor => "minor",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "serious" => Ok(Severity::Serious),
            "moderate" => Ok(Severity::Moderate),
            "minor" => Ok(Severity::Minor),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// Topical grouping of an issue, used for reporting only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Images,
    Interactive,
    Forms,
    Color,
    Document,
    Structure,
    Aria,
    Technical,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Images,
        Category::Interactive,
        Category::Forms,
        Category::Color,
        Category::Document,
        Category::Structure,
        Category::Aria,
        Category::Technical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Images => "images",
            Category::Interactive => "interactive",
            Category::Forms => "forms",
            Category::Color => "color",
            Category::Document => "document",
            Category::Structure => "structure",
            Category::Aria => "aria",
            Category::Technical => "technical",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// The DOM node an issue is bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementInfo {
    /// Selector that re-locates the element in the scanned document
    pub selector: String,
    /// Truncated outer HTML of the element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

/// One detected defect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Unique within one scan result only
    pub id: String,
    /// Stable identifier of the originating rule
    pub rule_id: String,
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_url: Option<String>,
    /// Suggested fix, advisory only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
}

impl Issue {
    pub fn new(
        id: impl Into<String>,
        rule_id: impl Into<String>,
        severity: Severity,
        category: Category,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            rule_id: rule_id.into(),
            severity,
            category,
            message: message.into(),
            element: None,
            help_url: None,
            fix: None,
        }
    }

    pub fn with_element(mut self, element: ElementInfo) -> Self {
        self.element = Some(element);
        self
    }

    pub fn with_help_url(mut self, url: impl Into<String>) -> Self {
        self.help_url = Some(url.into());
        self
    }

    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.fix = Some(fix.into());
        self
    }
}

/// Issue counts for every severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub serious: usize,
    pub moderate: usize,
    pub minor: usize,
}

impl SeverityCounts {
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::Serious => self.serious,
            Severity::Moderate => self.moderate,
            Severity::Minor => self.minor,
        }
    }

    fn increment(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::Serious => self.serious += 1,
            Severity::Moderate => self.moderate += 1,
            Severity::Minor => self.minor += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.serious + self.moderate + self.minor
    }
}

/// Issue counts for every category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub images: usize,
    pub interactive: usize,
    pub forms: usize,
    pub color: usize,
    pub document: usize,
    pub structure: usize,
    pub aria: usize,
    pub technical: usize,
}

impl CategoryCounts {
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Images => self.images,
            Category::Interactive => self.interactive,
            Category::Forms => self.forms,
            Category::Color => self.color,
            Category::Document => self.document,
            Category::Structure => self.structure,
            Category::Aria => self.aria,
            Category::Technical => self.technical,
        }
    }

    fn increment(&mut self, category: Category) {
        match category {
            Category::Images => self.images += 1,
            Category::Interactive => self.interactive += 1,
            Category::Forms => self.forms += 1,
            Category::Color => self.color += 1,
            Category::Document => self.document += 1,
            Category::Structure => self.structure += 1,
            Category::Aria => self.aria += 1,
            Category::Technical => self.technical += 1,
        }
    }

    pub fn total(&self) -> usize {
        Category::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

/// Aggregated counts derived from a result's issues
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    pub by_severity: SeverityCounts,
    pub by_category: CategoryCounts,
}

impl Summary {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let mut summary = Summary {
            total: issues.len(),
            ..Default::default()
        };
        for issue in issues {
            summary.by_severity.increment(issue.severity);
            summary.by_category.increment(issue.category);
        }
        summary
    }
}

/// Output envelope of one scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Document location at scan time
    pub url: String,
    /// Wall-clock completion time, epoch milliseconds
    pub timestamp: i64,
    /// Elapsed milliseconds, from a monotonic clock
    pub duration: f64,
    /// Issues in check-execution order
    pub issues: Vec<Issue>,
    /// Ids of checks that failed to complete
    pub incomplete: Vec<String>,
    pub summary: Summary,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.summary.by_severity.get(severity)
    }

    pub fn count_by_category(&self, category: Category) -> usize {
        self.summary.by_category.get(category)
    }

    /// Rule ids present in this result, in first-seen order
    pub fn rule_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for issue in &self.issues {
            if !ids.contains(&issue.rule_id.as_str()) {
                ids.push(&issue.rule_id);
            }
        }
        ids
    }

    pub fn has_rule(&self, rule_id: &str) -> bool {
        self.issues.iter().any(|i| i.rule_id == rule_id)
    }
}
