//! Markup sanitization for user-supplied fields.
//!
//! Two modes: strip everything (plain-text fields) or keep an allow-list
//! of formatting tags (rich-text fields). Hostile inputs are reported
//! separately so the caller can reject instead of cleaning.

use std::sync::OnceLock;

use regex::Regex;

static SCRIPT_BLOCK_REGEX: OnceLock<Regex> = OnceLock::new();
static HOSTILE_TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static EVENT_HANDLER_REGEX: OnceLock<Regex> = OnceLock::new();
static DANGEROUS_SCHEME_REGEX: OnceLock<Regex> = OnceLock::new();
static ANY_TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static HREF_REGEX: OnceLock<Regex> = OnceLock::new();

/// Tags kept in rich-text fields. Everything else is stripped.
const ALLOWED_TAGS: &[&str] = &[
    "a", "b", "blockquote", "br", "code", "em", "i", "li", "ol", "p", "pre", "strong", "u", "ul",
];

fn script_block_regex() -> &'static Regex {
    SCRIPT_BLOCK_REGEX.get_or_init(|| {
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("static regex")
    })
}

fn hostile_tag_regex() -> &'static Regex {
    HOSTILE_TAG_REGEX.get_or_init(|| {
        Regex::new(r"(?i)<\s*(script|iframe|object|embed|form|meta|link)\b").expect("static regex")
    })
}

fn event_handler_regex() -> &'static Regex {
    EVENT_HANDLER_REGEX.get_or_init(|| {
        Regex::new(r#"(?i)\bon[a-z]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#).expect("static regex")
    })
}

fn dangerous_scheme_regex() -> &'static Regex {
    DANGEROUS_SCHEME_REGEX.get_or_init(|| {
        Regex::new(r"(?i)(?:javascript|vbscript)\s*:|data\s*:\s*text/html").expect("static regex")
    })
}

fn any_tag_regex() -> &'static Regex {
    ANY_TAG_REGEX
        .get_or_init(|| Regex::new(r"(?s)</?\s*([a-zA-Z][a-zA-Z0-9]*)\b[^>]*/?>").expect("static regex"))
}

fn href_regex() -> &'static Regex {
    HREF_REGEX.get_or_init(|| {
        Regex::new(r#"(?i)\bhref\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#).expect("static regex")
    })
}

/// Check whether the input matches a known dangerous pattern.
///
/// Returns the category of the first pattern hit. A hostile input is
/// rejected outright by the coordinator rather than cleaned, since the
/// author was plainly not writing forum content.
pub fn hostile_pattern(text: &str) -> Option<&'static str> {
    if hostile_tag_regex().is_match(text) {
        return Some("hostile_tag");
    }
    if event_handler_regex().is_match(text) {
        return Some("event_handler");
    }
    if dangerous_scheme_regex().is_match(text) {
        return Some("dangerous_scheme");
    }
    None
}

/// Remove all markup, leaving plain text. Script bodies are dropped
/// entirely, not just their tags.
pub fn strip_all(text: &str) -> String {
    let without_scripts = script_block_regex().replace_all(text, "");
    any_tag_regex().replace_all(&without_scripts, "").into_owned()
}

/// Keep allow-listed formatting tags, strip everything else. Surviving
/// anchor tags keep only a safe `href`; all other attributes are dropped.
pub fn sanitize_rich(text: &str) -> String {
    let without_scripts = script_block_regex().replace_all(text, "");

    any_tag_regex()
        .replace_all(&without_scripts, |caps: &regex::Captures<'_>| {
            let raw = &caps[0];
            let name = caps[1].to_lowercase();
            if !ALLOWED_TAGS.contains(&name.as_str()) {
                return String::new();
            }
            let closing = raw.trim_start_matches('<').trim_start().starts_with('/');
            if closing {
                return format!("</{}>", name);
            }
            if name == "a" {
                if let Some(href) = safe_href(raw) {
                    return format!(r#"<a href="{}">"#, href);
                }
            }
            format!("<{}>", name)
        })
        .into_owned()
}

/// Extract the href value from an anchor tag if its scheme is safe.
fn safe_href(tag: &str) -> Option<String> {
    let caps = href_regex().captures(tag)?;
    let value = caps[1].trim_matches(|c| c == '"' || c == '\'').to_string();
    if dangerous_scheme_regex().is_match(&value) {
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_tag_is_hostile() {
        assert_eq!(
            hostile_pattern(r#"hello <script>alert(1)</script>"#),
            Some("hostile_tag")
        );
        assert_eq!(hostile_pattern("<IFRAME src=x>"), Some("hostile_tag"));
    }

    #[test]
    fn event_handler_is_hostile() {
        assert_eq!(
            hostile_pattern(r#"<img src=x onerror=alert(1)>"#),
            Some("event_handler")
        );
    }

    #[test]
    fn dangerous_schemes_are_hostile() {
        assert_eq!(
            hostile_pattern(r#"<a href="javascript:alert(1)">x</a>"#),
            Some("dangerous_scheme")
        );
        assert_eq!(
            hostile_pattern("click data:text/html;base64,xxx"),
            Some("dangerous_scheme")
        );
    }

    #[test]
    fn plain_text_is_not_hostile() {
        assert_eq!(hostile_pattern("just a normal <b>post</b> title"), None);
    }

    #[test]
    fn strip_all_removes_every_tag() {
        assert_eq!(strip_all("<b>bold</b> and <i>italic</i>"), "bold and italic");
        assert_eq!(strip_all("no markup here"), "no markup here");
    }

    #[test]
    fn strip_all_drops_script_bodies() {
        assert_eq!(
            strip_all("before<script>alert(1)</script>after"),
            "beforeafter"
        );
    }

    #[test]
    fn rich_mode_keeps_allowed_tags() {
        assert_eq!(
            sanitize_rich("<p>hello <strong>world</strong></p>"),
            "<p>hello <strong>world</strong></p>"
        );
    }

    #[test]
    fn rich_mode_strips_unknown_tags_and_attributes() {
        assert_eq!(sanitize_rich(r#"<div class="x">text</div>"#), "text");
        assert_eq!(sanitize_rich(r#"<p style="color:red">text</p>"#), "<p>text</p>");
    }

    #[test]
    fn rich_mode_keeps_safe_links_only() {
        assert_eq!(
            sanitize_rich(r#"<a href="https://example.com" target="_blank">x</a>"#),
            r#"<a href="https://example.com">x</a>"#
        );
        assert_eq!(
            sanitize_rich(r#"<a href="javascript:alert(1)">x</a>"#),
            "<a>x</a>"
        );
    }
}
