//! Selector generation for reported elements
//!
//! Produces a CSS selector path that re-locates an element in the same
//! document snapshot. The nearest ancestor (or the element itself) carrying a
//! document-unique id anchors the path; every other step is the tag name,
//! qualified with `:nth-of-type()` when same-tag siblings exist.

use crate::types::ElementInfo;
use scraper::{ElementRef, Html};
use std::collections::HashMap;

/// Maximum characters of outer HTML kept in an [`ElementInfo`]
pub const MAX_SNIPPET_LEN: usize = 200;

/// Selector generator bound to one document
#[derive(Debug, Clone, Default)]
pub struct SelectorGenerator {
    id_counts: HashMap<String, usize>,
}

impl SelectorGenerator {
    pub fn new(document: &Html) -> Self {
        let mut id_counts: HashMap<String, usize> = HashMap::new();
        for node in document.tree.root().descendants() {
            if let Some(id) = node.value().as_element().and_then(|e| e.attr("id")) {
                if !id.is_empty() {
                    *id_counts.entry(id.to_string()).or_default() += 1;
                }
            }
        }
        Self { id_counts }
    }

    fn is_unique_id(&self, id: &str) -> bool {
        !id.is_empty() && self.id_counts.get(id) == Some(&1)
    }

    /// Build the selector path for an element
    pub fn selector_for(&self, element: ElementRef<'_>) -> String {
        let mut steps: Vec<String> = Vec::new();
        let mut current = Some(element);

        while let Some(el) = current {
            let name = el.value().name();

            if let Some(id) = el.value().attr("id") {
                if self.is_unique_id(id) {
                    steps.push(id_step(name, id));
                    break;
                }
            }

            steps.push(type_step(el, name));
            current = el.parent().and_then(ElementRef::wrap);
        }

        steps.reverse();
        steps.join(" > ")
    }

    /// Selector plus a truncated HTML snippet
    pub fn element_info(&self, element: ElementRef<'_>) -> ElementInfo {
        ElementInfo {
            selector: self.selector_for(element),
            html: Some(truncate(&element.html(), MAX_SNIPPET_LEN)),
        }
    }
}

fn id_step(name: &str, id: &str) -> String {
    if is_css_identifier(id) {
        format!("#{}", id)
    } else {
        let escaped = id.replace('\\', "\\\\").replace('"', "\\\"");
        format!("{}[id=\"{}\"]", name, escaped)
    }
}

fn type_step(el: ElementRef<'_>, name: &str) -> String {
    let is_same_tag = |e: Option<ElementRef<'_>>| e.is_some_and(|e| e.value().name() == name);

    let preceding = el
        .prev_siblings()
        .filter(|n| is_same_tag(ElementRef::wrap(*n)))
        .count();
    let has_following = el.next_siblings().any(|n| is_same_tag(ElementRef::wrap(n)));

    if preceding == 0 && !has_following {
        name.to_string()
    } else {
        format!("{}:nth-of-type({})", name, preceding + 1)
    }
}

/// Whether `s` can be written as a bare CSS identifier
fn is_css_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    let starts_ok = first.is_ascii_alphabetic()
        || first == '_'
        || (first == '-' && s[1..].starts_with(|c: char| c.is_ascii_alphabetic() || c == '_'));

    starts_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
