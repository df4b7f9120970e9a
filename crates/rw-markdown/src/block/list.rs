//! Ordered and unordered lists.
//!
//! A list runs from its first marker line until a blank line followed by
//! content that is neither indented nor another list item. Items containing a
//! blank line are loose and get full block processing; tight items only get
//! inline processing, after any nested lists inside them are rendered.

use super::BlockTransformer;
use crate::markdown::MarkdownError;
use crate::util::{BLANK_RUN_RE, collapse_blank_lines, leading_blanks, outdent};

/// A list marker with the blanks that follow it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ListMarker {
    ordered: bool,
    /// Bytes taken by the marker and its trailing blanks.
    len: usize,
}

impl BlockTransformer<'_> {
    /// Render every list in `text` into the placeholder store.
    ///
    /// Outside a list, a list may only start at the beginning of the text or
    /// after a blank line.
    pub(super) fn replace_lists(
        &mut self,
        text: &str,
        in_list: bool,
        depth: usize,
    ) -> Result<String, MarkdownError> {
        let mut out = String::with_capacity(text.len());
        let mut copied = 0;
        let mut line_start = 0;

        while line_start < text.len() {
            let start = can_start_list(text, line_start, in_list)
                .then(|| list_start(&text[line_start..]))
                .flatten();

            if let Some((marker, content_start)) = start {
                self.check_depth(depth)?;
                let end = find_list_end(text, line_start + content_start);
                let html = self.render_list(&text[line_start..end], marker.ordered, depth)?;
                out.push_str(&text[copied..line_start]);
                out.push_str(&html);
                copied = end;
                line_start = end;
                continue;
            }

            line_start = match text[line_start..].find('\n') {
                Some(offset) => line_start + offset + 1,
                None => text.len(),
            };
        }

        out.push_str(&text[copied..]);
        Ok(out)
    }

    fn render_list(
        &mut self,
        list: &str,
        ordered: bool,
        depth: usize,
    ) -> Result<String, MarkdownError> {
        let mut body = BLANK_RUN_RE.replace_all(list, "\n\n\n").into_owned();
        if body.ends_with("\n\n") {
            body.truncate(body.trim_end_matches('\n').len());
            body.push('\n');
        }

        let mut items = String::new();
        let mut pos = 0;
        while pos < body.len() {
            let Some(item) = next_item(&body, pos) else {
                // Stray text between items is kept as is.
                let c = body[pos..].chars().next().map_or(1, char::len_utf8);
                items.push_str(&body[pos..pos + c]);
                pos += c;
                continue;
            };

            let content = outdent(&body[item.content.0..item.content.1]);
            let rendered = if item.loose {
                self.transform(&content, true, depth + 1)?
            } else {
                let nested = self.replace_lists(&content, true, depth + 1)?;
                let text = self.inline.transform(&collapse_blank_lines(&nested));
                self.store.expand(&text)
            };

            items.push_str("<li>");
            items.push_str(&rendered);
            items.push_str("</li>\n");
            pos = item.content.1;
        }

        let tag = if ordered { "ol" } else { "ul" };
        Ok(self.shield(&format!("<{tag}>\n{items}</{tag}>")))
    }
}

/// One list item inside a list body.
struct Item {
    /// Byte range of the item content, after the marker.
    content: (usize, usize),
    loose: bool,
}

/// Match a list item starting at `pos`.
///
/// A newline right at `pos` means a blank line preceded the item, which makes
/// it loose.
fn next_item(body: &str, pos: usize) -> Option<Item> {
    let mut start = pos;
    let blank_before = body[start..].starts_with('\n');
    if blank_before {
        start += 1;
    }
    if start > 0 && !body[..start].ends_with('\n') {
        return None;
    }

    let indent = leading_blanks(&body[start..]);
    let marker = list_marker(&body[start + indent..])?;
    let content_start = start + indent + marker.len;
    if content_start >= body.len() {
        return None;
    }

    let end = find_item_end(body, content_start, &body[start..start + indent]);
    let loose = blank_before || body[content_start..end].contains("\n\n");
    Some(Item {
        content: (content_start, end),
        loose,
    })
}

/// End of an item's content, keeping at most two of its trailing newlines.
///
/// The item ends at the first newline run followed by the end of the body or
/// by another marker at the same indentation.
fn find_item_end(body: &str, content_start: usize, indent: &str) -> usize {
    let first_len = body[content_start..].chars().next().map_or(0, char::len_utf8);
    let mut pos = content_start + first_len;

    while let Some(offset) = body[pos..].find('\n') {
        let newline = pos + offset;
        let run = newline_run(body, newline);
        let next = newline + run;
        let rest = &body[next..];
        if rest.is_empty()
            || rest
                .strip_prefix(indent)
                .is_some_and(|line| list_marker(line).is_some())
        {
            return newline + run.min(2);
        }
        pos = next;
    }

    body.len()
}

/// Whether a list may begin at `line_start`.
fn can_start_list(text: &str, line_start: usize, in_list: bool) -> bool {
    in_list
        || line_start == 0
        || (line_start == 1 && text.starts_with('\n'))
        || text[..line_start].ends_with("\n\n")
}

/// Parse the first line of a list: up to three spaces, a marker, blanks, and
/// at least one character of content. Returns the marker and the content
/// offset.
fn list_start(line: &str) -> Option<(ListMarker, usize)> {
    let spaces = line.bytes().take_while(|&b| b == b' ').count();
    if spaces > 3 {
        return None;
    }
    let marker = list_marker(&line[spaces..])?;
    let content_start = spaces + marker.len;
    (content_start < line.len()).then_some((marker, content_start))
}

/// `*`, `+`, `-` or `N.` followed by at least one space or tab.
fn list_marker(line: &str) -> Option<ListMarker> {
    let bytes = line.as_bytes();
    let (ordered, marker_len) = match bytes.first()? {
        b'*' | b'+' | b'-' => (false, 1),
        b'0'..=b'9' => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            if bytes.get(digits) != Some(&b'.') {
                return None;
            }
            (true, digits + 1)
        }
        _ => return None,
    };

    let blanks = leading_blanks(&line[marker_len..]);
    (blanks > 0).then_some(ListMarker {
        ordered,
        len: marker_len + blanks,
    })
}

/// End of the list whose first item content starts at `content_start`.
///
/// The list stops after a run of two or more newlines followed by text that
/// is neither whitespace nor a list marker, or just before a single trailing
/// newline at the end of the text.
fn find_list_end(text: &str, content_start: usize) -> usize {
    let first_len = text[content_start..].chars().next().map_or(0, char::len_utf8);
    let mut pos = content_start + first_len;

    while let Some(offset) = text[pos..].find('\n') {
        let newline = pos + offset;
        let run = newline_run(text, newline);
        let next = newline + run;
        if next == text.len() {
            return text.len() - 1;
        }
        if run >= 2 {
            let starts_block = text[next..].chars().next().is_some_and(|c| !c.is_whitespace());
            if starts_block && list_marker(&text[next..]).is_none() {
                return next;
            }
        }
        pos = next;
    }

    text.len()
}

fn newline_run(text: &str, from: usize) -> usize {
    text.as_bytes()[from..]
        .iter()
        .take_while(|&&b| b == b'\n')
        .count()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::MarkdownConfig;
    use crate::escape::EscapeTable;
    use crate::placeholder::PlaceholderStore;
    use crate::reference::ReferenceTable;

    fn render(text: &str) -> Result<String, MarkdownError> {
        render_with(text, &MarkdownConfig::default())
    }

    fn render_with(text: &str, config: &MarkdownConfig) -> Result<String, MarkdownError> {
        let references = ReferenceTable::new();
        let mut store = PlaceholderStore::new();
        let mut blocks = BlockTransformer::new(config, &references, &mut store);
        let encoded = EscapeTable::global().encode_backslash_escapes(text);
        blocks.transform(&encoded, false, 0)
    }

    #[test]
    fn test_tight_unordered_list() {
        assert_eq!(
            render("* a\n* b").unwrap(),
            "<ul>\n<li>a</li>\n<li>b</li>\n</ul>"
        );
    }

    #[test]
    fn test_ordered_list() {
        assert_eq!(
            render("3. three\n1. one\n").unwrap(),
            "<ol>\n<li>three</li>\n<li>one</li>\n</ol>"
        );
    }

    #[test]
    fn test_first_marker_decides_type() {
        assert_eq!(
            render("- a\n1. b").unwrap(),
            "<ul>\n<li>a</li>\n<li>b</li>\n</ul>"
        );
    }

    #[test]
    fn test_loose_list() {
        assert_eq!(
            render("* a\n\n* b").unwrap(),
            "<ul>\n<li><p>a</p></li>\n<li><p>b</p></li>\n</ul>"
        );
    }

    #[test]
    fn test_nested_tight_list() {
        assert_eq!(
            render("* a\n    * b\n* c").unwrap(),
            "<ul>\n<li>a\n<ul>\n<li>b</li>\n</ul></li>\n<li>c</li>\n</ul>"
        );
    }

    #[test]
    fn test_list_then_paragraph() {
        assert_eq!(
            render("+ item\n\nafter").unwrap(),
            "<ul>\n<li>item</li>\n</ul>\n\n<p>after</p>"
        );
    }

    #[test]
    fn test_list_needs_blank_line_after_paragraph() {
        assert_eq!(render("para\n* not a list").unwrap(), "<p>para\n* not a list</p>");
        assert_eq!(
            render("para\n\n* a list").unwrap(),
            "<p>para</p>\n\n<ul>\n<li>a list</li>\n</ul>"
        );
    }

    #[test]
    fn test_item_content_is_inline_transformed() {
        assert_eq!(
            render("* *em* and `code`").unwrap(),
            "<ul>\n<li><em>em</em> and <code>code</code></li>\n</ul>"
        );
    }

    #[test]
    fn test_emphasis_is_not_a_marker() {
        assert_eq!(render("*not* a list").unwrap(), "<p><em>not</em> a list</p>");
    }

    #[test]
    fn test_nested_list_depth_limit() {
        let config = MarkdownConfig::new().with_max_nesting_depth(1);
        assert!(render_with("* a\n    * b", &config).is_ok());
        assert_eq!(
            render_with("* a\n    * b\n        * c", &config),
            Err(MarkdownError::NestingTooDeep { limit: 1 })
        );
    }

    #[test]
    fn test_list_marker() {
        assert_eq!(
            list_marker("12. x"),
            Some(ListMarker {
                ordered: true,
                len: 4
            })
        );
        assert_eq!(
            list_marker("-\tx"),
            Some(ListMarker {
                ordered: false,
                len: 2
            })
        );
        assert_eq!(list_marker("-x"), None);
        assert_eq!(list_marker("1) x"), None);
    }

    #[test]
    fn test_find_list_end() {
        let text = "* a\n* b\n\n  more\n\nafter";
        assert_eq!(&text[..find_list_end(text, 2)], "* a\n* b\n\n  more\n\n");
        assert_eq!(find_list_end("* a\n", 2), 3);
    }
}
