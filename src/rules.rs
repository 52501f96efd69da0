//! Rule taxonomy
//!
//! Severity and category are fixed per rule. They live in this table rather
//! than in the checks so the taxonomy can be audited on its own.

use crate::types::{Category, Severity};
use serde::{Deserialize, Serialize};

/// Identifier of a rule, stable across scans and versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    MissingDoctype,
    InvalidDoctype,
    MissingCharset,
    MissingLang,
    MetaRefresh,
    DeprecatedElement,
    BrokenImage,
    DuplicateId,
    UnsizedImages,
    ImageAspectRatio,
    EmptyLink,
    JavascriptLink,
    UnsafeTargetBlank,
    PasswordPastePrevented,
    ExcessiveErrorHandlers,
    NonPassiveListeners,
    GeolocationOnLoad,
    NotificationOnLoad,
    DocumentWrite,
    MixedContent,
    VulnerableLibrary,
}

/// Static metadata of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMeta {
    pub id: &'static str,
    pub title: &'static str,
    pub severity: Severity,
    pub category: Category,
    pub help_url: &'static str,
    pub fix: &'static str,
}

impl RuleId {
    pub const ALL: [RuleId; 21] = [
        RuleId::MissingDoctype,
        RuleId::InvalidDoctype,
        RuleId::MissingCharset,
        RuleId::MissingLang,
        RuleId::MetaRefresh,
        RuleId::DeprecatedElement,
        RuleId::BrokenImage,
        RuleId::DuplicateId,
        RuleId::UnsizedImages,
        RuleId::ImageAspectRatio,
        RuleId::EmptyLink,
        RuleId::JavascriptLink,
        RuleId::UnsafeTargetBlank,
        RuleId::PasswordPastePrevented,
        RuleId::ExcessiveErrorHandlers,
        RuleId::NonPassiveListeners,
        RuleId::GeolocationOnLoad,
        RuleId::NotificationOnLoad,
        RuleId::DocumentWrite,
        RuleId::MixedContent,
        RuleId::VulnerableLibrary,
    ];

    pub fn as_str(&self) -> &'static str {
        self.meta().id
    }

    pub fn severity(&self) -> Severity {
        self.meta().severity
    }

    pub fn category(&self) -> Category {
        self.meta().category
    }

    pub fn meta(&self) -> RuleMeta {
        use Category::*;
        use Severity::*;

        let (id, title, severity, category, help_url, fix) = match self {
            RuleId::MissingDoctype => (
                "missing-doctype",
                "Missing DOCTYPE",
                Moderate,
                Document,
                "https://developer.mozilla.org/en-US/docs/Glossary/Doctype",
                "Add <!DOCTYPE html> as the first line of the document",
            ),
            RuleId::InvalidDoctype => (
                "invalid-doctype",
                "Legacy or invalid DOCTYPE",
                Moderate,
                Document,
                "https://developer.mozilla.org/en-US/docs/Glossary/Doctype",
                "Replace the doctype with <!DOCTYPE html>",
            ),
            RuleId::MissingCharset => (
                "missing-charset",
                "Missing character encoding",
                Moderate,
                Document,
                "https://developer.mozilla.org/en-US/docs/Web/HTML/Element/meta#charset",
                "Add <meta charset=\"UTF-8\"> to the <head>",
            ),
            RuleId::MissingLang => (
                "missing-lang",
                "Missing document language",
                Serious,
                Document,
                "https://developer.mozilla.org/en-US/docs/Web/HTML/Global_attributes/lang",
                "Add a lang attribute to <html>, e.g. <html lang=\"en\">",
            ),
            RuleId::MetaRefresh => (
                "meta-refresh",
                "Meta refresh",
                Serious,
                Document,
                "https://www.w3.org/WAI/WCAG21/Techniques/failures/F41",
                "Remove the meta refresh and redirect on the server instead",
            ),
            RuleId::DeprecatedElement => (
                "deprecated-element",
                "Deprecated element",
                Moderate,
                Structure,
                "https://developer.mozilla.org/en-US/docs/Web/HTML/Element#obsolete_and_deprecated_elements",
                "Replace the element with semantic HTML and CSS",
            ),
            RuleId::BrokenImage => (
                "broken-image",
                "Image without source",
                Serious,
                Images,
                "https://developer.mozilla.org/en-US/docs/Web/HTML/Element/img#src",
                "Give the image a valid src or remove it",
            ),
            RuleId::DuplicateId => (
                "duplicate-id",
                "Duplicate id",
                Serious,
                Structure,
                "https://developer.mozilla.org/en-US/docs/Web/HTML/Global_attributes/id",
                "Make every id value unique within the document",
            ),
            RuleId::UnsizedImages => (
                "unsized-images",
                "Images without explicit dimensions",
                Minor,
                Images,
                "https://web.dev/articles/optimize-cls#images-without-dimensions",
                "Set width and height on images to reserve layout space",
            ),
            RuleId::ImageAspectRatio => (
                "image-aspect-ratio",
                "Distorted image aspect ratio",
                Minor,
                Images,
                "https://developer.chrome.com/docs/lighthouse/best-practices/image-aspect-ratio",
                "Display the image at its natural aspect ratio or use object-fit",
            ),
            RuleId::EmptyLink => (
                "empty-link",
                "Link without accessible name",
                Serious,
                Interactive,
                "https://www.w3.org/WAI/WCAG21/Understanding/link-purpose-in-context",
                "Add link text or an aria-label",
            ),
            RuleId::JavascriptLink => (
                "javascript-link",
                "javascript: URL in link",
                Minor,
                Interactive,
                "https://developer.mozilla.org/en-US/docs/Web/URI/Schemes/javascript",
                "Use a <button> with an event listener instead",
            ),
            RuleId::UnsafeTargetBlank => (
                "unsafe-target-blank",
                "target=_blank without noopener",
                Minor,
                Interactive,
                "https://developer.mozilla.org/en-US/docs/Web/HTML/Attributes/rel/noopener",
                "Add rel=\"noopener\" to links opening a new window",
            ),
            RuleId::PasswordPastePrevented => (
                "password-paste-prevented",
                "Password paste prevented",
                Serious,
                Forms,
                "https://developer.chrome.com/docs/lighthouse/best-practices/paste-preventing-inputs",
                "Allow pasting so users can use password managers",
            ),
            RuleId::ExcessiveErrorHandlers => (
                "excessive-error-handlers",
                "Excessive inline error handlers",
                Minor,
                Technical,
                "https://developer.mozilla.org/en-US/docs/Web/API/HTMLElement/error_event",
                "Handle load errors with a single delegated listener",
            ),
            RuleId::NonPassiveListeners => (
                "non-passive-listeners",
                "Scroll-blocking event listeners",
                Minor,
                Technical,
                "https://developer.chrome.com/docs/lighthouse/best-practices/uses-passive-event-listeners",
                "Register scroll and touch listeners with { passive: true }",
            ),
            RuleId::GeolocationOnLoad => (
                "geolocation-on-load",
                "Geolocation requested on load",
                Moderate,
                Technical,
                "https://developer.chrome.com/docs/lighthouse/best-practices/geolocation-on-start",
                "Request the position in response to a user gesture",
            ),
            RuleId::NotificationOnLoad => (
                "notification-on-load",
                "Notification permission requested on load",
                Moderate,
                Technical,
                "https://developer.chrome.com/docs/lighthouse/best-practices/notification-on-start",
                "Request notification permission in response to a user gesture",
            ),
            RuleId::DocumentWrite => (
                "document-write",
                "document.write usage",
                Moderate,
                Technical,
                "https://developer.chrome.com/docs/lighthouse/best-practices/no-document-write",
                "Insert content with DOM APIs instead of document.write",
            ),
            RuleId::MixedContent => (
                "mixed-content",
                "Insecure resource on secure page",
                Serious,
                Technical,
                "https://developer.mozilla.org/en-US/docs/Web/Security/Mixed_content",
                "Load the resource over https",
            ),
            RuleId::VulnerableLibrary => (
                "vulnerable-library",
                "Library with known vulnerabilities",
                Serious,
                Technical,
                "https://developer.chrome.com/docs/lighthouse/best-practices/vulnerabilities",
                "Upgrade the library to a patched version",
            ),
        };

        RuleMeta {
            id,
            title,
            severity,
            category,
            help_url,
            fix,
        }
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for RuleId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleId::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("Unknown rule: {}", s))
    }
}
