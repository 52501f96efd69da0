//! Configuration for scans and reports
//!
//! Reads configuration from `.domauditrc.yaml`, `.domauditrc.yml` or
//! `.domauditrc.json` in the working directory, or from an explicit path.
//! Command-line flags are merged on top with [`Config::merge_cli`].

use crate::checks;
use crate::rules::RuleId;
use crate::types::{Category, Issue, Severity};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file names searched by [`Config::load_default`], in order
pub const CONFIG_FILE_NAMES: &[&str] = &[".domauditrc.yaml", ".domauditrc.yml", ".domauditrc.json"];

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Rule selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Check ids (skip the check) or rule ids (drop its issues)
    pub disabled: Vec<String>,
}

/// Report filters, applied before the summary is computed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Lowest severity kept in the report
    pub min_severity: Severity,

    /// Categories kept in the report (empty = all)
    pub categories: Vec<Category>,
}

/// Output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    pub format: OutputFormat,

    /// Color mode
    pub color: ColorMode,

    /// Pretty-print JSON output
    pub pretty: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Color mode options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rule selection
    pub rules: RulesConfig,

    /// Report filters
    pub report: ReportConfig,

    /// Output settings
    pub output: OutputConfig,
}

impl Config {
    /// Create default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: Self = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "Unknown config file format: {}",
                    ext
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Load the first config file found in `dir`, or the defaults
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        match Self::find_in_dir(dir) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from the working directory
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_from_dir(Path::new("."))
    }

    fn find_in_dir(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Reject disabled entries that name neither a check nor a rule
    pub fn validate(&self) -> Result<(), ConfigError> {
        let battery = checks::battery();
        let unknown: Vec<&str> = self
            .rules
            .disabled
            .iter()
            .map(String::as_str)
            .filter(|id| {
                !battery.iter().any(|check| check.id == *id) && id.parse::<RuleId>().is_err()
            })
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(format!(
                "Unknown check or rule in rules.disabled: {}",
                unknown.join(", ")
            )))
        }
    }

    /// Merge CLI arguments into configuration
    pub fn merge_cli(
        &mut self,
        format: Option<OutputFormat>,
        pretty: Option<bool>,
        color: Option<ColorMode>,
        min_severity: Option<Severity>,
        categories: Option<Vec<Category>>,
        disabled: Option<Vec<String>>,
    ) {
        if let Some(f) = format {
            self.output.format = f;
        }
        if let Some(p) = pretty {
            self.output.pretty = p;
        }
        if let Some(c) = color {
            self.output.color = c;
        }
        if let Some(s) = min_severity {
            self.report.min_severity = s;
        }
        if let Some(c) = categories {
            self.report.categories = c;
        }
        if let Some(d) = disabled {
            self.rules.disabled.extend(d);
        }
    }

    /// Whether a check or rule id is disabled
    pub fn is_disabled(&self, id: &str) -> bool {
        self.rules.disabled.iter().any(|d| d == id)
    }

    /// Whether an issue passes the report filters
    pub fn reports(&self, issue: &Issue) -> bool {
        issue.severity >= self.report.min_severity
            && (self.report.categories.is_empty()
                || self.report.categories.contains(&issue.category))
            && !self.is_disabled(&issue.rule_id)
    }
}
