//! Backtick code spans.

use crate::escape::EscapeTable;

/// Replace backtick-delimited spans with `<code>` elements.
///
/// The closing delimiter is the next run of exactly as many backticks as the
/// opening one. An opening run without a match is copied literally.
pub(super) fn replace_code_spans(text: &str, escapes: &EscapeTable) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut pos = 0;

    while let Some(offset) = text[pos..].find('`') {
        let open = pos + offset;
        let run = backtick_run(bytes, open);
        let content_start = open + run;

        let Some(close) = find_closing_run(bytes, content_start, run) else {
            pos = content_start;
            continue;
        };

        let content = text[content_start..close].trim_matches([' ', '\t']);
        out.push_str(&text[copied..open]);
        out.push_str("<code>");
        out.push_str(&escapes.protect(&escapes.restore_backslash_escapes(content)));
        out.push_str("</code>");

        pos = close + run;
        copied = pos;
    }

    out.push_str(&text[copied..]);
    out
}

fn backtick_run(bytes: &[u8], start: usize) -> usize {
    bytes[start..].iter().take_while(|&&b| b == b'`').count()
}

/// Start of the next run of exactly `len` backticks, leaving at least one
/// byte of content after `from`.
fn find_closing_run(bytes: &[u8], from: usize, len: usize) -> Option<usize> {
    let mut pos = from + 1;
    while pos < bytes.len() {
        if bytes[pos] == b'`' {
            let run = backtick_run(bytes, pos);
            if run == len {
                return Some(pos);
            }
            pos += run;
        } else {
            pos += 1;
        }
    }
    None
}
