//! Rule check battery
//!
//! Each check is a plain function of a [`Page`] returning findings. Checks
//! never mutate the document and treat absent structure as "nothing found".

pub mod document;
pub mod forms;
pub mod interactive;
pub mod libraries;
pub mod script;
pub mod structure;
pub mod technical;

use crate::error::CheckError;
use crate::issue::Finding;
use crate::page::Page;
use crate::rules::RuleId;

/// Outcome of running one check
pub type CheckResult = Result<Vec<Finding>, CheckError>;

/// A registered rule check
#[derive(Clone, Copy)]
pub struct Check {
    /// Identifier recorded in `incomplete` when the check fails
    pub id: &'static str,
    /// Rules this check can report
    pub rules: &'static [RuleId],
    pub run: fn(&Page) -> CheckResult,
}

impl Check {
    pub fn reports(&self, rule: RuleId) -> bool {
        self.rules.contains(&rule)
    }
}

/// The full battery, in execution order
pub fn battery() -> Vec<Check> {
    vec![
        Check {
            id: "doctype",
            rules: &[RuleId::MissingDoctype, RuleId::InvalidDoctype],
            run: document::check_doctype,
        },
        Check {
            id: "charset",
            rules: &[RuleId::MissingCharset],
            run: document::check_charset,
        },
        Check {
            id: "lang",
            rules: &[RuleId::MissingLang],
            run: document::check_lang,
        },
        Check {
            id: "meta-refresh",
            rules: &[RuleId::MetaRefresh],
            run: document::check_meta_refresh,
        },
        Check {
            id: "deprecated-elements",
            rules: &[RuleId::DeprecatedElement],
            run: structure::check_deprecated_elements,
        },
        Check {
            id: "broken-images",
            rules: &[RuleId::BrokenImage],
            run: structure::check_broken_images,
        },
        Check {
            id: "duplicate-ids",
            rules: &[RuleId::DuplicateId],
            run: structure::check_duplicate_ids,
        },
        Check {
            id: "unsized-images",
            rules: &[RuleId::UnsizedImages],
            run: structure::check_unsized_images,
        },
        Check {
            id: "image-aspect-ratio",
            rules: &[RuleId::ImageAspectRatio],
            run: structure::check_image_aspect_ratio,
        },
        Check {
            id: "empty-links",
            rules: &[RuleId::EmptyLink],
            run: interactive::check_empty_links,
        },
        Check {
            id: "javascript-links",
            rules: &[RuleId::JavascriptLink],
            run: interactive::check_javascript_links,
        },
        Check {
            id: "unsafe-target-blank",
            rules: &[RuleId::UnsafeTargetBlank],
            run: interactive::check_unsafe_target_blank,
        },
        Check {
            id: "password-paste",
            rules: &[RuleId::PasswordPastePrevented],
            run: forms::check_password_paste,
        },
        Check {
            id: "error-handlers",
            rules: &[RuleId::ExcessiveErrorHandlers],
            run: technical::check_error_handlers,
        },
        Check {
            id: "passive-listeners",
            rules: &[RuleId::NonPassiveListeners],
            run: technical::check_passive_listeners,
        },
        Check {
            id: "geolocation-on-load",
            rules: &[RuleId::GeolocationOnLoad],
            run: technical::check_geolocation_on_load,
        },
        Check {
            id: "notification-on-load",
            rules: &[RuleId::NotificationOnLoad],
            run: technical::check_notification_on_load,
        },
        Check {
            id: "document-write",
            rules: &[RuleId::DocumentWrite],
            run: technical::check_document_write,
        },
        Check {
            id: "mixed-content",
            rules: &[RuleId::MixedContent],
            run: technical::check_mixed_content,
        },
        Check {
            id: "vulnerable-libraries",
            rules: &[RuleId::VulnerableLibrary],
            run: libraries::check_vulnerable_libraries,
        },
    ]
}

/// Parse an inline `style` attribute into lowercase property/value pairs
pub(crate) fn style_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim().to_string();
            (!property.is_empty()).then_some((property, value))
        })
        .collect()
}

/// Whether an attribute is present with a non-blank value
pub(crate) fn has_value(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_battery_ids_unique() {
        let checks = battery();
        let ids: HashSet<&str> = checks.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), checks.len());
    }

    #[test]
    fn test_every_rule_owned_by_one_check() {
        let checks = battery();
        for rule in RuleId::ALL {
            let owners = checks.iter().filter(|c| c.reports(rule)).count();
            assert_eq!(owners, 1, "rule {} owned by {} checks", rule, owners);
        }
    }

    #[test]
    fn test_checks_survive_minimal_documents() {
        let inputs = ["", "<html>", "<p>", "<!DOCTYPE>", "<<<>>>", "<svg><a/></svg>"];
        for input in inputs {
            let page = Page::parse(input);
            for check in battery() {
                assert!((check.run)(&page).is_ok(), "{} failed on {:?}", check.id, input);
            }
        }
    }

    #[test]
    fn test_style_declarations() {
        let decls = style_declarations("Width: 10px; height:auto ;; max-width: 100%");
        assert_eq!(
            decls,
            vec![
                ("width".to_string(), "10px".to_string()),
                ("height".to_string(), "auto".to_string()),
                ("max-width".to_string(), "100%".to_string()),
            ]
        );
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "image", "images"), "1 image");
        assert_eq!(plural(3, "image", "images"), "3 images");
    }
}
