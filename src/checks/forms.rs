//! Form checks

use super::CheckResult;
use crate::issue::Finding;
use crate::page::Page;
use crate::rules::RuleId;

pub fn check_password_paste(page: &Page) -> CheckResult {
    Ok(page
        .select("input")?
        .into_iter()
        .filter(|input| {
            input
                .value()
                .attr("type")
                .is_some_and(|t| t.trim().eq_ignore_ascii_case("password"))
        })
        .filter(|input| input.value().attr("onpaste").is_some_and(blocks_paste))
        .map(|input| {
            Finding::new(
                RuleId::PasswordPastePrevented,
                "Password field blocks pasting, which breaks password managers",
            )
            .at(page.element_info(input))
        })
        .collect())
}

/// Whether an inline handler cancels the event
fn blocks_paste(handler: &str) -> bool {
    let compact: String = handler
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    compact.contains("returnfalse") || compact.contains("preventdefault")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paste_blocked() {
        let page = Page::parse(
            r#"<input type="password" onpaste="return false">
               <input type="PASSWORD" onpaste="event.preventDefault();">
               <input type="password" onpaste="return   false;">"#,
        );
        let findings = check_password_paste(&page).unwrap();
        assert_eq!(findings.len(), 3);
        assert!(findings.iter().all(|f| f.element.is_some()));
    }

    #[test]
    fn test_autocomplete_only_not_flagged() {
        let page = Page::parse(
            r#"<input type="password" autocomplete="current-password">
               <input type="password" onpaste="trackPaste()">
               <input type="text" onpaste="return false">"#,
        );
        assert!(check_password_paste(&page).unwrap().is_empty());
    }
}
