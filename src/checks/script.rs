//! Script text heuristics
//!
//! Scripts are never executed. Calls are located by pattern in a masked copy
//! of the source where comments, string contents and regex literal bodies are
//! blanked, so that commented-out code and parentheses inside literals are
//! ignored while byte offsets still line up with the original text.
//!
//! Whether a call runs "on load" is decided by nesting alone: a call counts as
//! user-initiated when it sits inside the argument list of an
//! `addEventListener(` call for a non-lifecycle event. There is no control
//! flow analysis, so a listener callback defined elsewhere and passed by name
//! does not exempt the calls in its body.

use regex::Regex;
use std::sync::LazyLock;

/// Events that fire during page load and therefore do not imply a user gesture
const LIFECYCLE_EVENTS: &[&str] = &["load", "domcontentloaded", "readystatechange", "pageshow"];

/// Events whose listeners can block scrolling unless registered as passive
const SCROLL_BLOCKING_EVENTS: &[&str] = &["scroll", "wheel", "mousewheel", "touchstart", "touchmove"];

/// Keywords after which a `/` starts a regex literal rather than a division
const REGEX_PREFIX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

static LISTENER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\baddEventListener\s*\(").unwrap());

static PASSIVE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bpassive\s*:\s*(true|!0)\b").unwrap());

/// Blank comments, string/template literal contents and regex literal bodies, keeping byte offsets
pub fn mask(source: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        LineComment,
        BlockComment,
        Literal(char),
        RegexLiteral { in_class: bool },
    }

    let mut out = String::with_capacity(source.len());
    let mut state = State::Code;
    let mut chars = source.chars().peekable();

    let blank = |out: &mut String, c: char| {
        if c == '\n' {
            out.push('\n');
        } else {
            out.extend(std::iter::repeat(' ').take(c.len_utf8()));
        }
    };

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::BlockComment;
                }
                '/' if regex_may_start(&out) => {
                    out.push(c);
                    state = State::RegexLiteral { in_class: false };
                }
                '\'' | '"' | '`' => {
                    out.push(c);
                    state = State::Literal(c);
                }
                _ => out.push(c),
            },
            State::LineComment => {
                if c == '\n' {
                    out.push('\n');
                    state = State::Code;
                } else {
                    blank(&mut out, c);
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("  ");
                    state = State::Code;
                } else {
                    blank(&mut out, c);
                }
            }
            State::Literal(quote) => {
                if c == '\\' {
                    blank(&mut out, c);
                    if let Some(escaped) = chars.next() {
                        blank(&mut out, escaped);
                    }
                } else if c == quote {
                    out.push(c);
                    state = State::Code;
                } else if c == '\n' && quote != '`' {
                    // unterminated string literal
                    out.push('\n');
                    state = State::Code;
                } else {
                    blank(&mut out, c);
                }
            }
            State::RegexLiteral { in_class } => match c {
                '\\' => {
                    blank(&mut out, c);
                    if let Some(escaped) = chars.next() {
                        blank(&mut out, escaped);
                    }
                }
                '\n' => {
                    out.push('\n');
                    state = State::Code;
                }
                '/' if !in_class => {
                    out.push(c);
                    state = State::Code;
                }
                '[' => {
                    blank(&mut out, c);
                    state = State::RegexLiteral { in_class: true };
                }
                ']' => {
                    blank(&mut out, c);
                    state = State::RegexLiteral { in_class: false };
                }
                _ => blank(&mut out, c),
            },
        }
    }

    out
}

/// Whether a `/` following the masked code `before` opens a regex literal
fn regex_may_start(before: &str) -> bool {
    let code = before.trim_end();
    let last = match code.chars().last() {
        Some(c) => c,
        None => return true,
    };

    let is_word = |c: char| c.is_alphanumeric() || c == '_' || c == '$';
    if is_word(last) {
        let word_start = code
            .char_indices()
            .rev()
            .take_while(|(_, c)| is_word(*c))
            .last()
            .map_or(code.len(), |(i, _)| i);
        return REGEX_PREFIX_KEYWORDS.contains(&&code[word_start..]);
    }

    !matches!(last, ')' | ']' | '}' | '\'' | '"' | '`')
}

/// A script prepared for pattern searches
pub struct ScriptText<'a> {
    original: &'a str,
    masked: String,
    listeners: Vec<Listener>,
}

/// One `addEventListener(` call site
#[derive(Debug, Clone, PartialEq)]
struct Listener {
    /// Byte offset of the opening paren
    open: usize,
    /// Byte offset of the matching close paren, if the call is closed
    close: Option<usize>,
    /// Lowercased event name when the first argument is a string literal
    event: Option<String>,
}

impl<'a> ScriptText<'a> {
    pub fn new(original: &'a str) -> Self {
        let masked = mask(original);

        let listeners = LISTENER_PATTERN
            .find_iter(&masked)
            .map(|m| {
                let open = m.end() - 1;
                Listener {
                    open,
                    close: matching_paren(&masked, open),
                    event: first_string_argument(original, open + 1),
                }
            })
            .collect();

        Self {
            original,
            masked,
            listeners,
        }
    }

    /// Start offsets of every match of `pattern` outside comments and literals
    pub fn call_sites(&self, pattern: &Regex) -> Vec<usize> {
        pattern.find_iter(&self.masked).map(|m| m.start()).collect()
    }

    /// Call sites of `pattern` that run on page load
    pub fn calls_on_load(&self, pattern: &Regex) -> Vec<usize> {
        self.call_sites(pattern)
            .into_iter()
            .filter(|offset| !self.in_event_listener(*offset))
            .collect()
    }

    /// Whether `offset` lies inside the arguments of a non-lifecycle listener registration
    pub fn in_event_listener(&self, offset: usize) -> bool {
        self.listeners.iter().any(|listener| {
            let encloses = listener.open < offset && listener.close.map_or(true, |close| offset < close);
            let user_event = listener
                .event
                .as_deref()
                .map_or(true, |event| !LIFECYCLE_EVENTS.contains(&event));
            encloses && user_event
        })
    }

    /// Count of scroll-blocking listener registrations without `passive: true`
    pub fn scroll_blocking_registrations(&self) -> usize {
        self.listeners
            .iter()
            .filter(|l| {
                l.event
                    .as_deref()
                    .is_some_and(|event| SCROLL_BLOCKING_EVENTS.contains(&event))
            })
            .filter(|l| {
                let end = l.close.unwrap_or(self.masked.len());
                !PASSIVE_PATTERN.is_match(&self.masked[l.open..end])
            })
            .count()
    }

    /// Line number (1-based) of a byte offset
    pub fn line_of(&self, offset: usize) -> usize {
        let end = offset.min(self.original.len());
        self.original.as_bytes()[..end]
            .iter()
            .filter(|b| **b == b'\n')
            .count()
            + 1
    }
}

/// Offset of the paren closing the one at `open`
fn matching_paren(masked: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in masked.bytes().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Read a leading string literal argument starting at `from`
fn first_string_argument(original: &str, from: usize) -> Option<String> {
    let rest = original.get(from..)?.trim_start();
    let quote = rest.chars().next().filter(|c| matches!(c, '\'' | '"' | '`'))?;
    let body = &rest[1..];
    let end = body.find(quote)?;
    Some(body[..end].trim().to_ascii_lowercase())
}
