//! Technical checks: inline handlers, listeners, permission prompts, legacy APIs, mixed content

use super::script::ScriptText;
use super::{plural, CheckResult};
use crate::issue::Finding;
use crate::page::{Page, ScriptOrigin, ScriptSource};
use crate::rules::RuleId;
use regex::Regex;
use scraper::ElementRef;
use std::sync::LazyLock;

/// Inline `onerror` handlers tolerated before the page is flagged
const MAX_ERROR_HANDLERS: usize = 5;

/// Scroll-blocking listeners tolerated before the page is flagged
const MAX_NON_PASSIVE_LISTENERS: usize = 2;

const SCROLL_HANDLER_ATTRIBUTES: &[&str] = &["onscroll", "onwheel", "ontouchmove"];

static GEOLOCATION_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bnavigator\s*\.\s*geolocation\s*\.\s*(getCurrentPosition|watchPosition)\s*\(")
        .unwrap()
});

static NOTIFICATION_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bNotification\s*\.\s*requestPermission\s*\(").unwrap());

static DOCUMENT_WRITE_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bdocument\s*\.\s*write(ln)?\s*\(").unwrap());

/// Elements whose `src` loads a subresource
const SUBRESOURCE_TAGS: &[&str] = &["img", "script", "iframe", "audio", "video", "source", "embed"];

pub fn check_error_handlers(page: &Page) -> CheckResult {
    let handlers: Vec<ElementRef<'_>> = page
        .elements()
        .filter(|el| el.value().attr("onerror").is_some())
        .collect();

    if handlers.len() <= MAX_ERROR_HANDLERS {
        return Ok(Vec::new());
    }

    Ok(vec![Finding::new(
        RuleId::ExcessiveErrorHandlers,
        format!(
            "{} found; move error handling into script",
            plural(handlers.len(), "inline onerror handler", "inline onerror handlers")
        ),
    )
    .at(page.element_info(handlers[0]))])
}

pub fn check_passive_listeners(page: &Page) -> CheckResult {
    let mut first_offender: Option<ElementRef<'_>> = None;
    let mut total = 0;

    for el in page.elements() {
        let inline = SCROLL_HANDLER_ATTRIBUTES
            .iter()
            .filter(|attr| el.value().attr(attr).is_some())
            .count();
        if inline > 0 {
            first_offender.get_or_insert(el);
            total += inline;
        }
    }

    for script in page.scripts() {
        let registrations = ScriptText::new(&script.text).scroll_blocking_registrations();
        if registrations > 0 {
            if let Some(el) = script.element {
                first_offender.get_or_insert(el);
            }
            total += registrations;
        }
    }

    if total <= MAX_NON_PASSIVE_LISTENERS {
        return Ok(Vec::new());
    }

    let finding = Finding::new(
        RuleId::NonPassiveListeners,
        format!(
            "{} can delay scrolling",
            plural(
                total,
                "scroll, wheel or touch listener is not passive and",
                "scroll, wheel or touch listeners are not passive and"
            )
        ),
    );
    Ok(vec![match first_offender {
        Some(el) => finding.at(page.element_info(el)),
        None => finding,
    }])
}

pub fn check_geolocation_on_load(page: &Page) -> CheckResult {
    calls_on_load(
        page,
        &GEOLOCATION_CALL,
        RuleId::GeolocationOnLoad,
        "requests the user's location on page load",
    )
}

pub fn check_notification_on_load(page: &Page) -> CheckResult {
    calls_on_load(
        page,
        &NOTIFICATION_CALL,
        RuleId::NotificationOnLoad,
        "requests notification permission on page load",
    )
}

/// One finding per script that calls `pattern` outside a user-event listener
fn calls_on_load(page: &Page, pattern: &Regex, rule: RuleId, what: &str) -> CheckResult {
    let mut findings = Vec::new();

    for script in page.scripts() {
        let text = ScriptText::new(&script.text);
        let calls = text.calls_on_load(pattern);
        if let Some(&first) = calls.first() {
            findings.push(script_finding(
                page,
                &script,
                rule,
                format!("{} {} (line {})", describe(&script), what, text.line_of(first)),
            ));
        }
    }

    Ok(findings)
}

pub fn check_document_write(page: &Page) -> CheckResult {
    let mut findings = Vec::new();

    for script in page.scripts() {
        let text = ScriptText::new(&script.text);
        let calls = text.call_sites(&DOCUMENT_WRITE_CALL);
        if let Some(&first) = calls.first() {
            findings.push(script_finding(
                page,
                &script,
                RuleId::DocumentWrite,
                format!(
                    "{} calls document.write ({}, first on line {})",
                    describe(&script),
                    plural(calls.len(), "call", "calls"),
                    text.line_of(first)
                ),
            ));
        }
    }

    Ok(findings)
}

fn describe(script: &ScriptSource<'_>) -> String {
    match &script.origin {
        ScriptOrigin::Inline => "Inline script".to_string(),
        ScriptOrigin::External(src) => format!("Script {}", src),
    }
}

fn script_finding(page: &Page, script: &ScriptSource<'_>, rule: RuleId, message: String) -> Finding {
    let finding = Finding::new(rule, message);
    match script.element {
        Some(el) => finding.at(page.element_info(el)),
        None => finding,
    }
}

pub fn check_mixed_content(page: &Page) -> CheckResult {
    if !page.is_secure() {
        return Ok(Vec::new());
    }

    let mut findings = Vec::new();
    for el in page.elements() {
        let name = el.value().name();
        let url = if SUBRESOURCE_TAGS.contains(&name) {
            el.value().attr("src")
        } else if name == "link" {
            el.value().attr("href")
        } else {
            None
        };

        if let Some(url) = url.map(str::trim).filter(|u| is_insecure(u)) {
            findings.push(
                Finding::new(
                    RuleId::MixedContent,
                    format!("<{}> loads {} over insecure HTTP on an HTTPS page", name, url),
                )
                .at(page.element_info(el)),
            );
        }
    }

    Ok(findings)
}

fn is_insecure(url: &str) -> bool {
    url.get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("http:"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_script(script: &str) -> Page {
        Page::parse(&format!("<html><body><script>{}</script></body></html>", script))
    }

    #[test]
    fn test_error_handler_threshold() {
        let two = Page::parse(&"<img src=\"a.png\" onerror=\"fix(this)\">".repeat(2));
        assert!(check_error_handlers(&two).unwrap().is_empty());

        let five = Page::parse(&"<img src=\"a.png\" onerror=\"fix(this)\">".repeat(5));
        assert!(check_error_handlers(&five).unwrap().is_empty());

        let six = Page::parse(&"<img src=\"a.png\" onerror=\"fix(this)\">".repeat(6));
        let findings = check_error_handlers(&six).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("6 inline onerror handlers"));
        assert_eq!(
            findings[0].element.as_ref().unwrap().selector,
            "html > body > img:nth-of-type(1)"
        );
    }

    #[test]
    fn test_inline_scroll_handlers_aggregate() {
        let two = Page::parse(r#"<div onscroll="a()"></div><div onwheel="b()"></div>"#);
        assert!(check_passive_listeners(&two).unwrap().is_empty());

        let three = Page::parse(
            r#"<div onscroll="a()"></div><div onwheel="b()"></div><div ontouchmove="c()"></div>"#,
        );
        let findings = check_passive_listeners(&three).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("3 scroll"));
    }

    #[test]
    fn test_script_registrations_count_toward_threshold() {
        let page = Page::parse(
            r#"<div onscroll="a()"></div>
               <script>
                 window.addEventListener('wheel', w);
                 window.addEventListener('touchstart', t);
                 window.addEventListener('touchmove', m, { passive: true });
               </script>"#,
        );
        let findings = check_passive_listeners(&page).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("3 scroll"));
    }

    #[test]
    fn test_geolocation_on_load() {
        let page = page_with_script("navigator.geolocation.getCurrentPosition(function (p) {});");
        let findings = check_geolocation_on_load(&page).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("Inline script"));
        assert!(findings[0].element.is_some());
    }

    #[test]
    fn test_geolocation_after_regex_literal() {
        let page = page_with_script("var re = /'/; navigator.geolocation.getCurrentPosition(f);");
        assert_eq!(check_geolocation_on_load(&page).unwrap().len(), 1);
    }

    #[test]
    fn test_geolocation_in_click_listener() {
        let page = page_with_script(
            "document.getElementById('locate').addEventListener('click', function () {\n\
               navigator.geolocation.getCurrentPosition(show);\n\
             });",
        );
        assert!(check_geolocation_on_load(&page).unwrap().is_empty());
    }

    #[test]
    fn test_one_finding_per_script() {
        let page = Page::parse(
            "<script>navigator.geolocation.getCurrentPosition(a); navigator.geolocation.watchPosition(b);</script>\
             <script>navigator.geolocation.watchPosition(c);</script>",
        );
        assert_eq!(check_geolocation_on_load(&page).unwrap().len(), 2);
    }

    #[test]
    fn test_notification_on_load_external_script() {
        let page = Page::parse(r#"<script src="/js/push.js"></script>"#)
            .with_external_script("push.js", "\n\nNotification.requestPermission().then(subscribe);");
        let findings = check_notification_on_load(&page).unwrap();

        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("Script push.js"));
        assert!(findings[0].message.contains("line 3"));
        assert!(findings[0].element.is_some());
    }

    #[test]
    fn test_notification_in_listener() {
        let page = page_with_script(
            "btn.addEventListener('click', () => Notification.requestPermission());",
        );
        assert!(check_notification_on_load(&page).unwrap().is_empty());
    }

    #[test]
    fn test_non_javascript_scripts_ignored() {
        let page = Page::parse(
            r#"<script type="text/template">navigator.geolocation.getCurrentPosition(x)</script>"#,
        );
        assert!(check_geolocation_on_load(&page).unwrap().is_empty());
    }

    #[test]
    fn test_document_write() {
        let page = page_with_script("document.write('<p>a</p>');\ndocument.writeln('b');");
        let findings = check_document_write(&page).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("2 calls"));

        let clean = page_with_script("// document.write('x')\nel.textContent = 'document.write(';");
        assert!(check_document_write(&clean).unwrap().is_empty());
    }

    #[test]
    fn test_mixed_content_on_https() {
        let source = r#"<link rel="stylesheet" href="http://cdn.example.com/a.css">
                        <img src="http://example.com/a.png">
                        <img src="https://example.com/b.png">
                        <script src="HTTP://example.com/c.js"></script>
                        <a href="http://example.com">link</a>"#;

        let secure = Page::parse(source).with_url("https://example.com/");
        assert_eq!(check_mixed_content(&secure).unwrap().len(), 3);

        let insecure = Page::parse(source).with_url("http://example.com/");
        assert!(check_mixed_content(&insecure).unwrap().is_empty());
    }
}
