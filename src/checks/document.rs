//! Document-level checks: doctype, character encoding, language, meta refresh
//!
//! These report page-level issues and never bind an element.

use super::{has_value, CheckResult};
use crate::issue::Finding;
use crate::page::Page;
use crate::rules::RuleId;

/// System identifier HTML5 accepts for generators that cannot emit `<!DOCTYPE html>`
const LEGACY_COMPAT: &str = "about:legacy-compat";

pub fn check_doctype(page: &Page) -> CheckResult {
    let doctype = page
        .document()
        .tree
        .root()
        .children()
        .find_map(|node| node.value().as_doctype());

    let doctype = match doctype {
        Some(d) => d,
        None => {
            return Ok(vec![Finding::new(
                RuleId::MissingDoctype,
                "Document has no DOCTYPE declaration and renders in quirks mode",
            )])
        }
    };

    let name = doctype.name().trim();
    if !name.eq_ignore_ascii_case("html") {
        let shown = if name.is_empty() { "(empty)" } else { name };
        return Ok(vec![Finding::new(
            RuleId::InvalidDoctype,
            format!("DOCTYPE name '{}' is not 'html'", shown),
        )]);
    }

    if !doctype.public_id().trim().is_empty() {
        return Ok(vec![Finding::new(
            RuleId::InvalidDoctype,
            format!(
                "Legacy DOCTYPE with public identifier '{}'",
                doctype.public_id().trim()
            ),
        )]);
    }

    let system_id = doctype.system_id().trim();
    if !system_id.is_empty() && !system_id.eq_ignore_ascii_case(LEGACY_COMPAT) {
        return Ok(vec![Finding::new(
            RuleId::InvalidDoctype,
            format!("Legacy DOCTYPE with system identifier '{}'", system_id),
        )]);
    }

    Ok(Vec::new())
}

pub fn check_charset(page: &Page) -> CheckResult {
    let declared = page.select("meta")?.iter().any(|meta| {
        let meta = meta.value();
        let charset_attr = has_value(meta.attr("charset"));
        let content_type = meta
            .attr("http-equiv")
            .is_some_and(|h| h.trim().eq_ignore_ascii_case("content-type"))
            && meta
                .attr("content")
                .is_some_and(|c| c.to_ascii_lowercase().contains("charset="));
        charset_attr || content_type
    });

    if declared {
        Ok(Vec::new())
    } else {
        Ok(vec![Finding::new(
            RuleId::MissingCharset,
            "Document does not declare a character encoding",
        )])
    }
}

pub fn check_lang(page: &Page) -> CheckResult {
    let root = page.document().root_element();
    if root.value().name() != "html" {
        return Ok(Vec::new());
    }

    let message = match root.value().attr("lang") {
        Some(lang) if !lang.trim().is_empty() => return Ok(Vec::new()),
        Some(_) => "The <html> element has an empty lang attribute",
        None => "The <html> element has no lang attribute",
    };
    Ok(vec![Finding::new(RuleId::MissingLang, message)])
}

pub fn check_meta_refresh(page: &Page) -> CheckResult {
    let refresh = page.select("meta")?.into_iter().find(|meta| {
        meta.value()
            .attr("http-equiv")
            .is_some_and(|h| h.trim().eq_ignore_ascii_case("refresh"))
    });

    Ok(refresh
        .map(|meta| {
            let content = meta.value().attr("content").unwrap_or("").trim();
            Finding::new(
                RuleId::MetaRefresh,
                format!(
                    "Page refreshes or redirects automatically (content=\"{}\")",
                    content
                ),
            )
        })
        .into_iter()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(findings: &[Finding]) -> Vec<RuleId> {
        findings.iter().map(|f| f.rule).collect()
    }

    #[test]
    fn test_missing_doctype() {
        let page = Page::parse("<html><head></head><body></body></html>");
        let findings = check_doctype(&page).unwrap();
        assert_eq!(rules(&findings), vec![RuleId::MissingDoctype]);
        assert!(findings[0].element.is_none());
    }

    #[test]
    fn test_html5_doctype_accepted() {
        for source in [
            "<!DOCTYPE html><html></html>",
            "<!doctype HTML><html></html>",
            "<!DOCTYPE html SYSTEM \"about:legacy-compat\"><html></html>",
        ] {
            assert!(check_doctype(&Page::parse(source)).unwrap().is_empty(), "{}", source);
        }
    }

    #[test]
    fn test_legacy_doctype_flagged() {
        let page = Page::parse(
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd"><html></html>"#,
        );
        assert_eq!(rules(&check_doctype(&page).unwrap()), vec![RuleId::InvalidDoctype]);
    }

    #[test]
    fn test_non_html_doctype_flagged() {
        let page = Page::parse("<!DOCTYPE svg><html></html>");
        let findings = check_doctype(&page).unwrap();
        assert_eq!(rules(&findings), vec![RuleId::InvalidDoctype]);
        assert!(findings[0].message.contains("svg"));
    }

    #[test]
    fn test_charset_meta() {
        let page = Page::parse(r#"<head><meta charset="UTF-8"></head>"#);
        assert!(check_charset(&page).unwrap().is_empty());
    }

    #[test]
    fn test_charset_http_equiv() {
        let page = Page::parse(
            r#"<head><meta http-equiv="Content-Type" content="text/html; Charset=utf-8"></head>"#,
        );
        assert!(check_charset(&page).unwrap().is_empty());
    }

    #[test]
    fn test_charset_http_equiv_without_charset() {
        let page =
            Page::parse(r#"<head><meta http-equiv="content-type" content="text/html"></head>"#);
        assert_eq!(rules(&check_charset(&page).unwrap()), vec![RuleId::MissingCharset]);
    }

    #[test]
    fn test_missing_charset() {
        let page = Page::parse("<head><title>x</title></head>");
        assert_eq!(rules(&check_charset(&page).unwrap()), vec![RuleId::MissingCharset]);
    }

    #[test]
    fn test_lang_present() {
        let page = Page::parse(r#"<html lang="en"></html>"#);
        assert!(check_lang(&page).unwrap().is_empty());
    }

    #[test]
    fn test_lang_missing_or_blank() {
        for source in ["<html></html>", r#"<html lang=""></html>"#, r#"<html lang="   "></html>"#] {
            let findings = check_lang(&Page::parse(source)).unwrap();
            assert_eq!(rules(&findings), vec![RuleId::MissingLang], "{}", source);
        }
    }

    #[test]
    fn test_meta_refresh_any_delay() {
        for content in ["0; url=/next", "300", ""] {
            let page = Page::parse(&format!(
                r#"<head><meta http-equiv="Refresh" content="{}"></head>"#,
                content
            ));
            let findings = check_meta_refresh(&page).unwrap();
            assert_eq!(rules(&findings), vec![RuleId::MetaRefresh]);
            assert!(findings[0].element.is_none());
        }
    }

    #[test]
    fn test_no_meta_refresh() {
        let page = Page::parse(r#"<head><meta name="viewport" content="width=device-width"></head>"#);
        assert!(check_meta_refresh(&page).unwrap().is_empty());
    }
}
