//! The document handle a scan runs against
//!
//! A [`Page`] bundles everything the checks may read: the parsed DOM, the
//! document location, a snapshot of runtime state a static parse cannot see
//! (library globals, image metrics), and the text of external scripts.

use crate::error::ScanError;
use crate::selector::SelectorGenerator;
use crate::types::ElementInfo;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;

/// Rendered and intrinsic size of an image, as measured by the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageMetrics {
    pub rendered_width: f64,
    pub rendered_height: f64,
    pub natural_width: f64,
    pub natural_height: f64,
}

/// Runtime state captured from the live page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSnapshot {
    /// Library globals and their reported versions (e.g. `jQuery` -> `1.12.4`)
    pub globals: BTreeMap<String, String>,
    /// Image metrics keyed by element selector or by `src`
    pub images: BTreeMap<String, ImageMetrics>,
}

impl WindowSnapshot {
    pub fn from_json(json: &str) -> Result<Self, ScanError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ScanError> {
        let json = std::fs::read_to_string(path).map_err(|source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

/// Text of a same-origin external script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalScript {
    pub src: String,
    pub text: String,
}

/// Where a script's text came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOrigin {
    Inline,
    External(String),
}

/// One entry of the script corpus
#[derive(Debug, Clone)]
pub struct ScriptSource<'a> {
    pub origin: ScriptOrigin,
    pub text: Cow<'a, str>,
    /// The `<script>` element, when one is known
    pub element: Option<ElementRef<'a>>,
}

/// A parsed document plus the host-provided context around it
pub struct Page {
    url: String,
    document: Html,
    selectors: SelectorGenerator,
    window: WindowSnapshot,
    external_scripts: Vec<ExternalScript>,
}

impl Page {
    /// Parse a document; malformed markup yields a best-effort tree
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let selectors = SelectorGenerator::new(&document);
        Self {
            url: "about:blank".to_string(),
            document,
            selectors,
            window: WindowSnapshot::default(),
            external_scripts: Vec::new(),
        }
    }

    /// Parse raw document bytes; invalid UTF-8 sequences become U+FFFD
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::parse(&String::from_utf8_lossy(bytes))
    }

    /// Read and parse a document from disk, using a `file://` URL
    pub fn from_file(path: &Path) -> Result<Self, ScanError> {
        let bytes = std::fs::read(path).map_err(|source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Ok(Self::from_bytes(&bytes).with_url(format!("file://{}", absolute.display())))
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_window(mut self, window: WindowSnapshot) -> Self {
        self.window = window;
        self
    }

    pub fn with_external_script(mut self, src: impl Into<String>, text: impl Into<String>) -> Self {
        self.external_scripts.push(ExternalScript {
            src: src.into(),
            text: text.into(),
        });
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    pub fn window(&self) -> &WindowSnapshot {
        &self.window
    }

    pub fn is_secure(&self) -> bool {
        self.url
            .get(..6)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https:"))
    }

    /// All elements matching a CSS selector, in document order
    pub fn select(&self, css: &str) -> Result<Vec<ElementRef<'_>>, crate::error::CheckError> {
        let selector = Selector::parse(css).map_err(|e| crate::error::CheckError::Selector {
            selector: css.to_string(),
            reason: e.to_string(),
        })?;
        Ok(self.document.select(&selector).collect())
    }

    /// Every element of the document, in document order
    pub fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.document
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
    }

    pub fn selector_for(&self, element: ElementRef<'_>) -> String {
        self.selectors.selector_for(element)
    }

    pub fn element_info(&self, element: ElementRef<'_>) -> ElementInfo {
        self.selectors.element_info(element)
    }

    /// Metrics for an image, looked up by selector first and `src` second
    pub fn image_metrics(&self, image: ElementRef<'_>) -> Option<&ImageMetrics> {
        if self.window.images.is_empty() {
            return None;
        }
        self.window
            .images
            .get(&self.selector_for(image))
            .or_else(|| {
                image
                    .value()
                    .attr("src")
                    .and_then(|src| self.window.images.get(src))
            })
    }

    /// Inline JavaScript blocks followed by external script text
    pub fn scripts(&self) -> Vec<ScriptSource<'_>> {
        let mut sources = Vec::new();
        let script_elements: Vec<ElementRef<'_>> = self
            .elements()
            .filter(|e| e.value().name() == "script")
            .collect();

        for el in &script_elements {
            let has_src = el.value().attr("src").is_some_and(|s| !s.trim().is_empty());
            if has_src || !is_javascript_type(el.value().attr("type")) {
                continue;
            }
            sources.push(ScriptSource {
                origin: ScriptOrigin::Inline,
                text: Cow::Owned(el.text().collect()),
                element: Some(*el),
            });
        }

        for ext in &self.external_scripts {
            let element = script_elements.iter().copied().find(|el| {
                el.value()
                    .attr("src")
                    .is_some_and(|src| src_matches(src.trim(), &ext.src))
            });
            sources.push(ScriptSource {
                origin: ScriptOrigin::External(ext.src.clone()),
                text: Cow::Borrowed(&ext.text),
                element,
            });
        }

        sources
    }
}

fn src_matches(attr: &str, src: &str) -> bool {
    !src.is_empty() && (attr == src || attr.ends_with(&format!("/{}", src.trim_start_matches('/'))))
}

/// Whether a `<script type>` value denotes JavaScript
fn is_javascript_type(ty: Option<&str>) -> bool {
    let ty = match ty {
        Some(t) => t.trim().to_ascii_lowercase(),
        None => return true,
    };
    let essence = ty.split(';').next().unwrap_or("").trim();
    matches!(
        essence,
        "" | "module"
            | "text/javascript"
            | "application/javascript"
            | "application/x-javascript"
            | "text/ecmascript"
            | "application/ecmascript"
            | "text/jscript"
            | "text/livescript"
    )
}
