//! Known-vulnerable JavaScript library detection
//!
//! Libraries are detected from three places, in priority order: globals
//! reported by the window snapshot, `<script src>` URLs carrying a version,
//! and license banners at the top of script text. Each library is reported at
//! most once per page.
//!
//! Globals shared by several libraries (`$` for jQuery, Zepto and Cash, `_`
//! for Lodash and Underscore) are not used to identify a library.

use super::CheckResult;
use crate::error::CheckError;
use crate::issue::Finding;
use crate::page::Page;
use crate::rules::RuleId;
use regex::Regex;
use scraper::ElementRef;
use std::fmt;
use std::sync::LazyLock;

/// A `major.minor.patch` version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Lenient parse: missing components are 0, non-numeric suffixes are ignored
    ///
    /// `"3.4.1-rc.2"` is 3.4.1, `"1.12"` is 1.12.0, `"v2"` is 2.0.0. Returns
    /// `None` when the string does not start with a number.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().trim_start_matches(['v', 'V']);
        let mut parts = [0u32; 3];

        for (i, component) in s.split('.').take(3).enumerate() {
            let digits_end = component
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(component.len());
            let digits = &component[..digits_end];
            if digits.is_empty() {
                if i == 0 {
                    return None;
                }
                break;
            }
            parts[i] = digits.parse().ok()?;
            if digits_end < component.len() {
                break;
            }
        }

        Some(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Half-open range `[from, fixed)` of affected versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VulnerableRange {
    pub from: Version,
    /// First release carrying the fix
    pub fixed: Version,
}

impl VulnerableRange {
    const fn below(fixed: Version) -> Self {
        Self {
            from: Version::new(0, 0, 0),
            fixed,
        }
    }

    pub fn contains(&self, version: Version) -> bool {
        self.from <= version && version < self.fixed
    }
}

/// A library with known vulnerable releases
#[derive(Debug)]
pub struct KnownLibrary {
    pub name: &'static str,
    /// Global names the snapshot may report the library under
    globals: &'static [&'static str],
    /// Regex alternation matching the library's file or package name
    file_token: &'static str,
    /// Regex capturing the version from a license banner
    banner: &'static str,
    pub vulnerable: &'static [VulnerableRange],
}

impl KnownLibrary {
    /// The range containing `version`, if it is vulnerable
    pub fn vulnerable_range(&self, version: Version) -> Option<&VulnerableRange> {
        self.vulnerable.iter().find(|range| range.contains(version))
    }
}

pub static KNOWN_LIBRARIES: &[KnownLibrary] = &[
    KnownLibrary {
        name: "jQuery",
        globals: &["jQuery"],
        file_token: "jquery",
        banner: r"(?i)\bjQuery\s+v?(\d+(?:\.\d+)+)",
        vulnerable: &[VulnerableRange::below(Version::new(3, 5, 0))],
    },
    KnownLibrary {
        name: "jQuery UI",
        globals: &["jQuery.ui", "jQueryUI", "jquery-ui"],
        file_token: "jquery-ui|jqueryui",
        banner: r"(?i)\bjQuery\s+UI\s*-\s*v?(\d+(?:\.\d+)+)",
        vulnerable: &[VulnerableRange::below(Version::new(1, 13, 0))],
    },
    KnownLibrary {
        name: "AngularJS",
        globals: &["angular", "AngularJS"],
        file_token: r"angular|angularjs|angular\.js",
        banner: r"(?i)\bAngularJS\s+v?(\d+(?:\.\d+)+)",
        vulnerable: &[VulnerableRange::below(Version::new(1, 8, 0))],
    },
    KnownLibrary {
        name: "Lodash",
        globals: &["lodash"],
        file_token: r"lodash|lodash\.js",
        banner: r"(?i)\blodash\s+v?(\d+\.\d+\.\d+)",
        vulnerable: &[VulnerableRange::below(Version::new(4, 17, 21))],
    },
    KnownLibrary {
        name: "Bootstrap",
        globals: &["bootstrap", "Bootstrap"],
        file_token: r"bootstrap|twitter-bootstrap",
        banner: r"(?i)\bBootstrap\s+v(\d+(?:\.\d+)+)",
        vulnerable: &[
            VulnerableRange::below(Version::new(3, 4, 1)),
            VulnerableRange {
                from: Version::new(4, 0, 0),
                fixed: Version::new(4, 3, 1),
            },
        ],
    },
    KnownLibrary {
        name: "Moment",
        globals: &["moment"],
        file_token: r"moment|moment\.js",
        banner: r"(?i)\bmoment(?:\.js)?\s*(?://!\s*)?version\s*:\s*(\d+(?:\.\d+)+)",
        vulnerable: &[VulnerableRange::below(Version::new(2, 29, 4))],
    },
    KnownLibrary {
        name: "Handlebars",
        globals: &["Handlebars"],
        file_token: r"handlebars|handlebars\.js",
        banner: r"(?i)\bhandlebars\s+v(\d+(?:\.\d+)+)",
        vulnerable: &[VulnerableRange::below(Version::new(4, 7, 7))],
    },
];

/// How a library was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    Global,
    ScriptUrl,
    Banner,
}

impl DetectionSource {
    fn describe(self) -> &'static str {
        match self {
            DetectionSource::Global => "page global",
            DetectionSource::ScriptUrl => "script URL",
            DetectionSource::Banner => "script banner",
        }
    }
}

/// A library found on the page
#[derive(Debug, Clone)]
pub struct Detection<'a> {
    pub library: &'static KnownLibrary,
    pub version: String,
    pub source: DetectionSource,
    pub element: Option<ElementRef<'a>>,
}

/// Compiled URL and banner patterns for every known library
static MATCHERS: LazyLock<Vec<Matcher>> = LazyLock::new(|| {
    KNOWN_LIBRARIES
        .iter()
        .map(Matcher::compile)
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
});

struct Matcher {
    library: &'static KnownLibrary,
    file_patterns: [Regex; 2],
    banner: Regex,
}

impl Matcher {
    fn compile(library: &'static KnownLibrary) -> Result<Self, regex::Error> {
        let token = library.file_token;
        let version = r"v?(\d+(?:\.\d+)+)";
        Ok(Self {
            library,
            file_patterns: [
                // jquery-1.12.4.min.js, lodash@4.17.15
                Regex::new(&format!(r"(?:^|[/_])(?:{})[-.@]{}", token, version))?,
                // cdnjs style: /ajax/libs/jquery/1.12.4/jquery.min.js
                Regex::new(&format!(r"/(?:{})/{}/", token, version))?,
            ],
            banner: Regex::new(library.banner)?,
        })
    }

    fn version_in_url(&self, url: &str) -> Option<String> {
        let url = url.to_ascii_lowercase();
        self.file_patterns
            .iter()
            .find_map(|p| p.captures(&url))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    fn version_in_banner(&self, text: &str) -> Option<String> {
        self.banner
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// Every known library on the page, one detection per library
pub fn detect_libraries(page: &Page) -> Result<Vec<Detection<'_>>, CheckError> {
    let matchers: &[Matcher] = &MATCHERS;
    let mut found: Vec<Detection<'_>> = Vec::new();

    for (global, version) in &page.window().globals {
        for m in matchers {
            if m.library.globals.iter().any(|g| g.eq_ignore_ascii_case(global)) {
                record(&mut found, m.library, version, DetectionSource::Global, None);
            }
        }
    }

    for script in page.select("script[src]")? {
        let src = script.value().attr("src").unwrap_or("");
        for m in matchers {
            if let Some(version) = m.version_in_url(src) {
                record(&mut found, m.library, &version, DetectionSource::ScriptUrl, Some(script));
            }
        }
    }

    for script in page.scripts() {
        for m in matchers {
            if let Some(version) = m.version_in_banner(&script.text) {
                record(&mut found, m.library, &version, DetectionSource::Banner, script.element);
            }
        }
    }

    Ok(found)
}

fn record<'a>(
    found: &mut Vec<Detection<'a>>,
    library: &'static KnownLibrary,
    version: &str,
    source: DetectionSource,
    element: Option<ElementRef<'a>>,
) {
    match found.iter_mut().find(|d| d.library.name == library.name) {
        Some(existing) => {
            if existing.element.is_none() {
                existing.element = element;
            }
        }
        None => found.push(Detection {
            library,
            version: version.trim().to_string(),
            source,
            element,
        }),
    }
}

pub fn check_vulnerable_libraries(page: &Page) -> CheckResult {
    let mut findings = Vec::new();

    for detection in detect_libraries(page)? {
        let version = match Version::parse(&detection.version) {
            Some(v) => v,
            None => {
                log::debug!(
                    "Ignoring unparseable {} version '{}'",
                    detection.library.name,
                    detection.version
                );
                continue;
            }
        };
        let range = match detection.library.vulnerable_range(version) {
            Some(r) => r,
            None => continue,
        };

        let finding = Finding::new(
            RuleId::VulnerableLibrary,
            format!(
                "{} {} has known vulnerabilities, fixed in {} (detected by {})",
                detection.library.name,
                detection.version,
                range.fixed,
                detection.source.describe()
            ),
        )
        .with_fix(format!(
            "Upgrade {} to {} or later",
            detection.library.name, range.fixed
        ));

        findings.push(match detection.element {
            Some(el) => finding.at(page.element_info(el)),
            None => finding,
        });
    }

    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::WindowSnapshot;

    fn library(name: &str) -> &'static KnownLibrary {
        KNOWN_LIBRARIES.iter().find(|l| l.name == name).unwrap()
    }

    fn with_globals(html: &str, globals: &[(&str, &str)]) -> Page {
        let mut window = WindowSnapshot::default();
        for (name, version) in globals {
            window.globals.insert(name.to_string(), version.to_string());
        }
        Page::parse(html).with_window(window)
    }

    #[test]
    fn test_version_parse() {
        assert_eq!(Version::parse("3.5.0"), Some(Version::new(3, 5, 0)));
        assert_eq!(Version::parse("1.12"), Some(Version::new(1, 12, 0)));
        assert_eq!(Version::parse("v2"), Some(Version::new(2, 0, 0)));
        assert_eq!(Version::parse("3.4.1-rc.2"), Some(Version::new(3, 4, 1)));
        assert_eq!(Version::parse("1.8.0-beta"), Some(Version::new(1, 8, 0)));
        assert_eq!(Version::parse("4.17.21.1"), Some(Version::new(4, 17, 21)));
        assert_eq!(Version::parse("2.x"), Some(Version::new(2, 0, 0)));
        assert_eq!(Version::parse("latest"), None);
        assert_eq!(Version::parse(""), None);
    }

    #[test]
    fn test_version_order() {
        assert!(Version::new(1, 12, 4) < Version::new(3, 5, 0));
        assert!(Version::new(3, 10, 0) > Version::new(3, 9, 9));
        assert_eq!(Version::new(4, 3, 1).to_string(), "4.3.1");
    }

    #[test]
    fn test_bootstrap_ranges() {
        let bootstrap = library("Bootstrap");
        assert!(bootstrap.vulnerable_range(Version::new(3, 3, 7)).is_some());
        assert!(bootstrap.vulnerable_range(Version::new(3, 4, 1)).is_none());
        assert!(bootstrap.vulnerable_range(Version::new(4, 1, 0)).is_some());
        assert!(bootstrap.vulnerable_range(Version::new(4, 3, 1)).is_none());
        assert!(bootstrap.vulnerable_range(Version::new(5, 0, 0)).is_none());
    }

    #[test]
    fn test_vulnerable_global() {
        let page = with_globals("<p>x</p>", &[("jQuery", "1.12.4")]);
        let findings = check_vulnerable_libraries(&page).unwrap();

        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("jQuery 1.12.4"));
        assert!(findings[0].message.contains("3.5.0"));
        assert!(findings[0].element.is_none());
    }

    #[test]
    fn test_patched_library_not_flagged() {
        let page = with_globals("", &[("jQuery", "3.7.1"), ("moment", "2.29.4")]);
        assert!(check_vulnerable_libraries(&page).unwrap().is_empty());
    }

    #[test]
    fn test_no_library_no_issue() {
        let page = Page::parse("<script>console.log('hi')</script>");
        assert!(check_vulnerable_libraries(&page).unwrap().is_empty());
    }

    #[test]
    fn test_unparseable_version_ignored() {
        let page = with_globals("", &[("angular", "unknown")]);
        assert!(check_vulnerable_libraries(&page).unwrap().is_empty());
    }

    #[test]
    fn test_detect_from_script_url() {
        let page = Page::parse(
            r#"<script src="https://code.jquery.com/jquery-1.12.4.min.js"></script>
               <script src="https://cdnjs.cloudflare.com/ajax/libs/lodash.js/4.17.15/lodash.min.js"></script>
               <script src="/vendor/jquery-ui-1.12.1/jquery-ui.min.js"></script>
               <script src="https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/js/bootstrap.min.js"></script>"#,
        );
        let detections = detect_libraries(&page).unwrap();
        let names: Vec<(&str, &str)> = detections
            .iter()
            .map(|d| (d.library.name, d.version.as_str()))
            .collect();

        assert_eq!(
            names,
            vec![
                ("jQuery", "1.12.4"),
                ("Lodash", "4.17.15"),
                ("jQuery UI", "1.12.1"),
                ("Bootstrap", "5.3.0"),
            ]
        );
        assert!(detections.iter().all(|d| d.element.is_some()));

        let findings = check_vulnerable_libraries(&page).unwrap();
        assert_eq!(findings.len(), 3);
    }

    #[test]
    fn test_detect_from_banner() {
        let page = Page::parse(
            "<script>/*! jQuery v2.2.4 | (c) jQuery Foundation | jquery.org/license */\n!function(){}();</script>\
             <script>/*! jQuery UI - v1.12.1 - 2016-09-14 */</script>",
        );
        let detections = detect_libraries(&page).unwrap();

        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].library.name, "jQuery");
        assert_eq!(detections[0].version, "2.2.4");
        assert_eq!(detections[0].source, DetectionSource::Banner);
        assert_eq!(detections[1].library.name, "jQuery UI");
    }

    #[test]
    fn test_shared_globals_not_attributed() {
        let page = with_globals("<p>x</p>", &[("_", "1.13.6"), ("$", "3.3.1")]);

        assert!(detect_libraries(&page).unwrap().is_empty());
        assert!(check_vulnerable_libraries(&page).unwrap().is_empty());
    }

    #[test]
    fn test_lodash_global_still_detected() {
        let page = with_globals("", &[("lodash", "4.17.15")]);
        let findings = check_vulnerable_libraries(&page).unwrap();

        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("Lodash 4.17.15"));
    }

    #[test]
    fn test_one_issue_per_library() {
        let page = with_globals(
            r#"<script src="/js/jquery-1.11.0.min.js"></script>"#,
            &[("jQuery", "1.11.0")],
        );
        let detections = detect_libraries(&page).unwrap();

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].source, DetectionSource::Global);
        assert!(detections[0].element.is_some());
        assert_eq!(check_vulnerable_libraries(&page).unwrap().len(), 1);
    }
}
