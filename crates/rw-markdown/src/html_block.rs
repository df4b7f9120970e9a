//! Protection of literal block-level HTML.
//!
//! A block element that opens at the start of a line is swapped for a
//! placeholder key, up to its balanced closing tag. The key is surrounded by
//! blank lines so paragraph assembly sees it as a segment of its own.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::escape::EscapeTable;
use crate::placeholder::PlaceholderStore;

/// Tag names treated as block-level HTML.
pub const BLOCK_TAGS: &[&str] = &[
    "p",
    "div",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "blockquote",
    "pre",
    "table",
    "dl",
    "ol",
    "ul",
    "script",
    "noscript",
    "form",
    "fieldset",
    "iframe",
    "math",
    "ins",
    "del",
];

/// Opening block tag at the start of a line. The name must end at a tag boundary.
static OPEN_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?im)^[ \t]*<({})(?:[ \t\n/>]|$)",
        BLOCK_TAGS.join("|")
    ))
    .unwrap()
});

/// Replace literal block HTML with blank-line-delimited placeholder keys.
///
/// Idempotent: keys contain no tags, so running this again changes nothing
/// that was already protected.
pub(crate) fn protect_html_blocks(
    text: &str,
    store: &mut PlaceholderStore,
    escapes: &EscapeTable,
) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();
    // Start of the last closing tag per tag name.
    let mut last_close: HashMap<&str, Option<usize>> = HashMap::new();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut pos = 0;

    while let Some(caps) = OPEN_TAG_RE.captures_at(text, pos) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let tag = &lower[name.start()..name.end()];
        let last = *last_close
            .entry(tag)
            .or_insert_with(|| lower.rfind(&format!("</{tag}>")));

        let Some(close_end) = find_balanced_close(&lower, name.end(), tag, last) else {
            pos = name.end();
            continue;
        };

        let tag_start = name.start() - 1;
        let fragment = escapes.restore_backslash_escapes(&text[tag_start..close_end]);
        tracing::trace!(tag, len = fragment.len(), "Protecting block HTML");
        let key = store.insert(fragment.into_owned());

        let region_start = copied.max(
            whole.start() - trailing_whitespace_len(&text[copied..whole.start()]),
        );
        let region_end = close_end + leading_whitespace_len(&text[close_end..]);

        out.push_str(&text[copied..region_start]);
        out.push_str("\n\n");
        out.push_str(&key);
        out.push_str("\n\n");
        copied = region_end;
        pos = region_end;

        if pos >= text.len() {
            break;
        }
    }

    out.push_str(&text[copied..]);
    out
}

/// Find the end of the closing tag that balances an element opened before `from`.
///
/// Nested elements with the same name are counted. Returns `None` when the
/// element is never closed. `last_close` is the start of the last closing tag
/// in `lower`; nothing can balance once the scan is past it.
fn find_balanced_close(
    lower: &str,
    from: usize,
    tag: &str,
    last_close: Option<usize>,
) -> Option<usize> {
    if last_close.is_none_or(|last| last < from) {
        return None;
    }

    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut depth = 1usize;
    let mut pos = from;

    while depth > 0 {
        let close_at = pos + lower[pos..].find(&close)?;
        match lower[pos..close_at].find(&open) {
            Some(offset) => {
                pos += offset + open.len();
                if is_tag_boundary(lower, pos) {
                    depth += 1;
                }
            }
            None => {
                depth -= 1;
                pos = close_at + close.len();
            }
        }
    }

    Some(pos)
}

fn is_tag_boundary(text: &str, pos: usize) -> bool {
    text.as_bytes()
        .get(pos)
        .is_none_or(|b| matches!(b, b' ' | b'\t' | b'\n' | b'/' | b'>'))
}

fn is_html_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n')
}

fn trailing_whitespace_len(text: &str) -> usize {
    text.len() - text.trim_end_matches(is_html_whitespace).len()
}

fn leading_whitespace_len(text: &str) -> usize {
    text.len() - text.trim_start_matches(is_html_whitespace).len()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn protect(text: &str) -> (String, PlaceholderStore) {
        let mut store = PlaceholderStore::new();
        let out = protect_html_blocks(text, &mut store, EscapeTable::global());
        (out, store)
    }

    #[test]
    fn test_protects_block() {
        let (out, store) = protect("para\n\n<div>\n*a*\n</div>\n\nafter");
        let key = PlaceholderStore::key_for("<div>\n*a*\n</div>");
        assert_eq!(out, format!("para\n\n{key}\n\nafter"));
        assert_eq!(store.get(&key), Some("<div>\n*a*\n</div>"));
    }

    #[test]
    fn test_case_insensitive_tags() {
        let (out, store) = protect("<DIV>x</Div>");
        assert_eq!(store.len(), 1);
        assert!(!out.contains("DIV"));
    }

    #[test]
    fn test_balanced_nesting() {
        let (out, store) = protect("<div><div>a</div>\n</div>\ntail");
        let key = PlaceholderStore::key_for("<div><div>a</div>\n</div>");
        assert_eq!(out, format!("\n\n{key}\n\ntail"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_separate_blocks_stay_separate() {
        let (out, store) = protect("<ul><li>a</li></ul>\n\nmiddle\n\n<ul><li>b</li></ul>");
        assert_eq!(store.len(), 2);
        assert!(out.contains("middle"));
    }

    #[test]
    fn test_unclosed_block_untouched() {
        let (out, store) = protect("<div>never closed");
        assert_eq!(out, "<div>never closed");
        assert!(store.is_empty());
    }

    #[test]
    fn test_inline_position_untouched() {
        let (out, store) = protect("text <del>x</del> more");
        assert_eq!(out, "text <del>x</del> more");
        assert!(store.is_empty());
    }

    #[test]
    fn test_prefix_tag_names_not_confused() {
        let (out, store) = protect("<pre>code</pre>");
        assert_eq!(store.get(&PlaceholderStore::key_for("<pre>code</pre>")), Some("<pre>code</pre>"));
        assert!(!out.contains("<pre>"));

        let (out, store) = protect("<param>x</param>");
        assert!(store.is_empty());
        assert_eq!(out, "<param>x</param>");
    }

    #[test]
    fn test_idempotent() {
        let (once, mut store) = protect("<table><tr><td>1</td></tr></table>");
        let twice = protect_html_blocks(&once, &mut store, EscapeTable::global());
        assert_eq!(once, twice);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_restores_backslash_escapes() {
        let escapes = EscapeTable::global();
        let encoded = escapes.encode_backslash_escapes(r"<p>\*x\*</p>");
        let mut store = PlaceholderStore::new();
        protect_html_blocks(&encoded, &mut store, escapes);
        assert_eq!(
            store.get(&PlaceholderStore::key_for(r"<p>\*x\*</p>")),
            Some(r"<p>\*x\*</p>")
        );
    }

    #[test]
    fn test_indented_open_tag() {
        let (_, store) = protect("  <div>x</div>");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_many_unclosed_blocks() {
        let text = "<div>\n".repeat(8000);
        let (out, store) = protect(&text);
        assert_eq!(out, text);
        assert!(store.is_empty());
    }

    #[test]
    fn test_later_block_closes_after_unclosed_one() {
        let (out, store) = protect("<div>\n<div>x</div>");
        let key = PlaceholderStore::key_for("<div>x</div>");
        assert_eq!(out, format!("<div>\n\n{key}\n\n"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_find_balanced_close_stops_past_last_close() {
        let lower = "<p>a</p> <p>b";
        assert_eq!(find_balanced_close(lower, 2, "p", Some(4)), Some(8));
        assert_eq!(find_balanced_close(lower, 11, "p", Some(4)), None);
        assert_eq!(find_balanced_close(lower, 2, "p", None), None);
    }

    #[test]
    fn test_block_tags_constant() {
        assert!(BLOCK_TAGS.contains(&"blockquote"));
        assert!(BLOCK_TAGS.contains(&"h6"));
        assert_eq!(BLOCK_TAGS.len(), 22);
    }
}
