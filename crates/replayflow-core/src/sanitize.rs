use once_cell::sync::Lazy;
use regex::Regex;

static XPATH_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r#"id\("([^"]+)"\)"#).unwrap());

/// Normalize a recorded selector for embedding in generated source text.
///
/// The recorder sometimes emits the XPath id-lookup form `id("foo")`; that is
/// rewritten to the CSS form `#foo`, dropping any trailing path the recorder
/// appended. Everything else passes through with embedded quotes escaped.
/// Selector syntax is not validated here.
pub fn sanitize_selector(selector: &str) -> String {
    if selector.is_empty() {
        return String::new();
    }

    if selector.starts_with("id(")
        && let Some(caps) = XPATH_ID.captures(selector)
    {
        return format!("#{}", &caps[1]);
    }

    escape_js_single_quoted(selector)
}

/// Escape a value for embedding in a single-quoted JavaScript string literal.
pub fn escape_js_single_quoted(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xpath_id_lookup_becomes_css_id() {
        assert_eq!(sanitize_selector("id(\"foo\")"), "#foo");
        assert_eq!(sanitize_selector("id(\"chat-textarea\")"), "#chat-textarea");
    }

    #[test]
    fn css_selector_passes_through() {
        assert_eq!(sanitize_selector("#kw"), "#kw");
        assert_eq!(
            sanitize_selector("p._paragraph_1g9za_2.cu-line-clamp-1"),
            "p._paragraph_1g9za_2.cu-line-clamp-1"
        );
    }

    #[test]
    fn embedded_quotes_are_escaped() {
        assert_eq!(sanitize_selector("a[title='x']"), "a[title=\\'x\\']");
        assert_eq!(escape_js_single_quoted("it's"), "it\\'s");
        assert_eq!(escape_js_single_quoted("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn empty_selector_stays_empty() {
        assert_eq!(sanitize_selector(""), "");
    }

    #[test]
    fn xpath_id_with_trailing_path_collapses_to_css_id() {
        assert_eq!(sanitize_selector("id(\"a\")/div"), "#a");
    }

    #[test]
    fn id_lookup_not_at_start_passes_through() {
        assert_eq!(sanitize_selector("div > id(\"a\")"), "div > id(\"a\")");
    }

    #[test]
    fn newlines_are_escaped_for_string_literals() {
        assert_eq!(escape_js_single_quoted("a\nb"), "a\\nb");
        assert_eq!(escape_js_single_quoted("a\r\nb"), "a\\r\\nb");
    }
}
