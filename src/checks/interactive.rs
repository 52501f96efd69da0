//! Link checks

use super::{has_value, CheckResult};
use crate::issue::Finding;
use crate::page::Page;
use crate::rules::RuleId;
use scraper::ElementRef;

pub fn check_empty_links(page: &Page) -> CheckResult {
    Ok(page
        .select("a")?
        .into_iter()
        .filter(|a| is_empty_link(*a))
        .map(|a| {
            Finding::new(
                RuleId::EmptyLink,
                "Link has no text, aria-label or image for assistive technology to announce",
            )
            .at(page.element_info(a))
        })
        .collect())
}

fn is_empty_link(link: ElementRef<'_>) -> bool {
    let has_text = link.text().any(|t| !t.trim().is_empty());
    let has_label = has_value(link.value().attr("aria-label"));
    let has_image = link
        .descendants()
        .filter_map(ElementRef::wrap)
        .any(|e| e.value().name() == "img");

    !(has_text || has_label || has_image)
}

pub fn check_javascript_links(page: &Page) -> CheckResult {
    Ok(page
        .select("a[href]")?
        .into_iter()
        .filter(|a| a.value().attr("href").is_some_and(is_javascript_url))
        .map(|a| {
            Finding::new(
                RuleId::JavascriptLink,
                "Link uses a javascript: URL instead of a real destination",
            )
            .at(page.element_info(a))
        })
        .collect())
}

fn is_javascript_url(href: &str) -> bool {
    href.trim_start()
        .get(..11)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("javascript:"))
}

pub fn check_unsafe_target_blank(page: &Page) -> CheckResult {
    let mut findings = Vec::new();

    for a in page.select("a[target]")? {
        let el = a.value();
        let opens_new_window = el
            .attr("target")
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("_blank"));
        let is_external = el.attr("href").is_some_and(is_absolute_url);
        if !opens_new_window || !is_external {
            continue;
        }

        let protected = el.attr("rel").is_some_and(|rel| {
            rel.split_ascii_whitespace().any(|token| {
                token.eq_ignore_ascii_case("noopener") || token.eq_ignore_ascii_case("noreferrer")
            })
        });
        if !protected {
            findings.push(
                Finding::new(
                    RuleId::UnsafeTargetBlank,
                    "Link opens an external page in a new window without rel=\"noopener\"",
                )
                .at(page.element_info(a)),
            );
        }
    }

    Ok(findings)
}

fn is_absolute_url(href: &str) -> bool {
    let href = href.trim_start().to_ascii_lowercase();
    href.starts_with("http://") || href.starts_with("https://") || href.starts_with("//")
}
