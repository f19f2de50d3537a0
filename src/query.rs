//! Query normalization: raw query strings into ordered, case-folded segments.

use std::sync::OnceLock;

use regex::Regex;

static HIDDEN_CHAR_RE: OnceLock<Regex> = OnceLock::new();

fn hidden_char_re() -> &'static Regex {
    // \p{C}: non-printable/format control characters that paste in from chat
    // clients and rich-text editors
    HIDDEN_CHAR_RE.get_or_init(|| Regex::new(r"\p{C}").unwrap())
}

/// A normalized query: the folded text plus its dot-separated segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Query {
    /// The normalized query text (lower case, `#` folded to `.`)
    pub text: String,
    /// The ordered dot-separated segments of `text`
    pub segments: Vec<String>,
}

impl Query {
    /// Normalize a raw query string.
    ///
    /// In order: fold the `#` member separator to `.`, strip hidden control
    /// characters, strip a single trailing `.`, case-fold, split on `.`.
    /// Original-case names are preserved in results via the records, never
    /// via the query string.
    pub fn parse(raw: &str) -> Self {
        let text = raw.replace('#', ".");
        let text = hidden_char_re().replace_all(&text, "");
        let text = text.strip_suffix('.').unwrap_or(&text).to_lowercase();

        let segments = text.split('.').map(str::to_string).collect();
        Self { text, segments }
    }
}

/// Everything after the first occurrence of `needle` in `text`, or `None`
/// when `needle` does not occur. Matches are case-folded through the query's
/// own normalization, so callers pass already-folded text.
pub(crate) fn after_first(text: &str, needle: &str) -> Option<String> {
    if needle.is_empty() {
        return None;
    }
    text.find(needle)
        .map(|idx| text[idx + needle.len()..].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_member_separator() {
        let q = Query::parse("String#indexOf");
        assert_eq!(q.text, "string.indexof");
        assert_eq!(q.segments, vec!["string", "indexof"]);
    }

    #[test]
    fn test_strip_hidden_characters() {
        // Zero-width space and a BOM, typical chat-client paste artifacts
        let q = Query::parse("Str\u{200b}ing.len\u{feff}gth");
        assert_eq!(q.text, "string.length");
    }

    #[test]
    fn test_strip_single_trailing_dot() {
        assert_eq!(Query::parse("String.").text, "string");
        // Only one trailing dot is stripped
        assert_eq!(Query::parse("String..").text, "string.");
    }

    #[test]
    fn test_case_fold() {
        let q = Query::parse("Outer.Inner.FIELD");
        assert_eq!(q.segments, vec!["outer", "inner", "field"]);
    }

    #[test]
    fn test_after_first() {
        assert_eq!(
            after_first("outer.inner.field", "outer.inner"),
            Some(".field".to_string())
        );
        assert_eq!(after_first("outer.inner", "outer.inner"), Some(String::new()));
        assert_eq!(after_first("outer.inner", "absent"), None);
        assert_eq!(after_first("outer", ""), None);
    }
}
