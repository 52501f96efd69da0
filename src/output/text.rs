//! Human-readable text output formatter

use super::OutputFormatter;
use crate::types::{Category, Issue, ScanResult, Severity};
use colored::*;

/// Text formatter with optional color support
pub struct TextFormatter {
    /// Enable colored output
    pub colored: bool,

    /// Show fix suggestions
    pub show_fixes: bool,

    /// Show HTML snippets of bound elements
    pub show_html: bool,

    /// Show statistics
    pub show_stats: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            colored: true,
            show_fixes: true,
            show_html: false,
            show_stats: true,
        }
    }
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable colors
    pub fn without_color(mut self) -> Self {
        self.colored = false;
        self
    }

    /// Include element HTML snippets
    pub fn with_html(mut self) -> Self {
        self.show_html = true;
        self
    }

    fn severity_str(&self, severity: Severity) -> ColoredString {
        let s = format!("{:<8}", severity);
        if !self.colored {
            return s.normal();
        }
        match severity {
            Severity::Critical => s.red().bold(),
            Severity::Serious => s.red(),
            Severity::Moderate => s.yellow(),
            Severity::Minor => s.blue(),
        }
    }

    fn paint(&self, s: &str, style: impl Fn(&str) -> ColoredString) -> String {
        if self.colored {
            style(s).to_string()
        } else {
            s.to_string()
        }
    }

    fn format_result(&self, result: &ScanResult) -> String {
        let mut output = String::new();

        output.push_str(&self.paint(&result.url, |s| s.underline()));
        output.push('\n');

        if result.issues.is_empty() {
            output.push_str("  No issues found\n");
        }
        for issue in &result.issues {
            output.push_str(&self.format_issue(issue));
        }

        if !result.incomplete.is_empty() {
            let line = format!("  Incomplete checks: {}", result.incomplete.join(", "));
            output.push_str(&self.paint(&line, |s| s.yellow()));
            output.push('\n');
        }

        if self.show_stats {
            output.push_str(&format!("  {}\n", self.format_counts(result)));
        }

        output
    }

    fn format_counts(&self, result: &ScanResult) -> String {
        let total = result.summary.total;
        let mut line = format!("{} {}", total, if total == 1 { "issue" } else { "issues" });

        let by_severity: Vec<String> = Severity::ALL
            .iter()
            .filter(|s| result.count_by_severity(**s) > 0)
            .map(|s| format!("{} {}", result.count_by_severity(*s), s))
            .collect();
        if !by_severity.is_empty() {
            line.push_str(&format!(" ({})", by_severity.join(", ")));
        }

        let by_category: Vec<String> = Category::ALL
            .iter()
            .filter(|c| result.count_by_category(**c) > 0)
            .map(|c| format!("{}: {}", c, result.count_by_category(*c)))
            .collect();
        if !by_category.is_empty() {
            line.push_str(&format!(" [{}]", by_category.join(", ")));
        }

        line
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, results: &[ScanResult]) -> String {
        let mut output = String::new();

        for result in results {
            output.push_str(&self.format_result(result));
            output.push('\n');
        }

        if self.show_stats {
            let issues: usize = results.iter().map(|r| r.summary.total).sum();
            let duration: f64 = results.iter().map(|r| r.duration).sum();
            output.push_str(&format!(
                "{} {} scanned, {} {} found in {:.1}ms\n",
                results.len(),
                if results.len() == 1 { "page" } else { "pages" },
                issues,
                if issues == 1 { "issue" } else { "issues" },
                duration
            ));
        }

        output
    }

    fn format_issue(&self, issue: &Issue) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "  {} {} {}\n",
            self.severity_str(issue.severity),
            self.paint(&format!("[{}]", issue.rule_id), |s| s.cyan()),
            issue.message
        ));

        if let Some(element) = &issue.element {
            output.push_str(&format!("      at {}\n", element.selector));
            if self.show_html {
                if let Some(html) = &element.html {
                    output.push_str(&format!("      {}\n", self.paint(html, |s| s.dimmed())));
                }
            }
        }

        if self.show_fixes {
            if let Some(fix) = &issue.fix {
                output.push_str(&format!("      {} {}\n", self.paint("fix:", |s| s.green()), fix));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;

    #[test]
    fn test_plain_output() {
        let result = Scanner::new().scan_source(
            r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"></head><body><a href="/"></a></body></html>"#,
        );
        let output = TextFormatter::new().without_color().format(&[result]);

        assert!(output.starts_with("about:blank\n"));
        assert!(output.contains("serious  [empty-link]"));
        assert!(output.contains("at html > body > a"));
        assert!(output.contains("fix:"));
        assert!(output.contains("1 issue (1 serious) [interactive: 1]"));
        assert!(output.contains("1 page scanned, 1 issue found"));
        assert!(!output.contains('\u{1b}'));
    }

    #[test]
    fn test_clean_page() {
        let result = Scanner::new().scan_source(
            r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"></head><body><p>ok</p></body></html>"#,
        );
        let output = TextFormatter::new().without_color().format(&[result]);

        assert!(output.contains("No issues found"));
        assert!(output.contains("0 issues"));
    }

    #[test]
    fn test_html_snippet_optional() {
        let result = Scanner::new().scan_source("<html><body><font>x</font></body></html>");
        let plain = TextFormatter::new().without_color();
        assert!(!plain.format(std::slice::from_ref(&result)).contains("<font>x</font>"));

        let with_html = TextFormatter::new().without_color().with_html();
        assert!(with_html.format(&[result]).contains("<font>x</font>"));
    }
}
