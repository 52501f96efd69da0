//! DOM best practices scanner
//!
//! Audits an HTML document for document, structure, interactive, form and
//! technical defects, and reports each finding with a fixed severity and
//! category.
//!
//! # Example
//!
//! ```
//! use dom_audit::{Page, Scanner, Severity};
//!
//! let page = Page::parse(r#"<html><body><div id="a"></div><div id="a"></div></body></html>"#)
//!     .with_url("https://example.com/");
//! let result = Scanner::new().scan(&page);
//!
//! assert!(result.has_rule("missing-doctype"));
//! assert!(result.has_rule("duplicate-id"));
//! assert_eq!(result.summary.total, result.issues.len());
//! println!("{} serious issues", result.count_by_severity(Severity::Serious));
//! ```

pub mod checks;
pub mod config;
pub mod error;
pub mod issue;
pub mod output;
pub mod page;
pub mod rules;
pub mod scanner;
pub mod selector;
pub mod types;

pub use config::{ColorMode, Config, ConfigError, OutputFormat};
pub use error::{CheckError, ScanError};
pub use issue::{Finding, IssueBuilder};
pub use page::{ImageMetrics, Page, WindowSnapshot};
pub use rules::{RuleId, RuleMeta};
pub use scanner::{scan, Scanner};
pub use selector::SelectorGenerator;
pub use types::{Category, ElementInfo, Issue, ScanResult, Severity, Summary};
