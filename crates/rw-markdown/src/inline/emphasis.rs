//! Strong and plain emphasis.
//!
//! Both need a non-whitespace character directly inside each delimiter, so
//! `a * b * c` stays literal.

const STRONG_DELIMITERS: &[&str] = &["**", "__"];
const EM_DELIMITERS: &[&str] = &["*", "_"];

/// Replace `**x**` and `__x__` with `<strong>`.
///
/// A run of `*` or `_` right before the closing delimiter belongs to the
/// content, so `***x***` becomes `<strong>*x*</strong>` and then, after the
/// plain emphasis pass, `<strong><em>x</em></strong>`.
pub(super) fn replace_strong(text: &str) -> String {
    replace_delimited(text, STRONG_DELIMITERS, "strong", true)
}

/// Replace `*x*` and `_x_` with `<em>`.
pub(super) fn replace_em(text: &str) -> String {
    replace_delimited(text, EM_DELIMITERS, "em", false)
}

fn replace_delimited(text: &str, delimiters: &[&str], tag: &str, absorb_trailing: bool) -> String {
    // Close candidates do not depend on the opener.
    let closes: Vec<(&str, Vec<usize>)> = delimiters
        .iter()
        .map(|&delimiter| (delimiter, close_offsets(text, delimiter)))
        .collect();

    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut pos = 0;

    while let Some(c) = text[pos..].chars().next() {
        let rest = &text[pos..];
        let found = closes.iter().find_map(|(delimiter, offsets)| {
            if !rest.starts_with(delimiter) {
                return None;
            }
            find_close(text, pos + delimiter.len(), offsets, absorb_trailing)
                .map(|close| (delimiter.len(), close))
        });

        match found {
            Some((len, close)) => {
                out.push_str(&text[copied..pos]);
                out.push('<');
                out.push_str(tag);
                out.push('>');
                out.push_str(&text[pos + len..close]);
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
                pos = close + len;
                copied = pos;
            }
            None => pos += c.len_utf8(),
        }
    }

    out.push_str(&text[copied..]);
    out
}

/// Sorted offsets where `delimiter` starts right after a non-whitespace
/// character. Overlapping occurrences are all listed.
fn close_offsets(text: &str, delimiter: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    (1..bytes.len())
        .filter(|&i| bytes[i..].starts_with(delimiter.as_bytes()))
        .filter(|&i| ends_in_non_whitespace(&text[..i]))
        .collect()
}

/// Offset of the delimiter closing content that starts at `start`.
///
/// Content is the shortest non-empty run (newlines included) that ends in a
/// non-whitespace character and is followed by the delimiter. With
/// `absorb_trailing`, a `*`/`_` run reaching the first close is taken into the
/// content up to the last close inside that run.
fn find_close(text: &str, start: usize, closes: &[usize], absorb_trailing: bool) -> Option<usize> {
    let first = text[start..].chars().next()?;
    if first.is_whitespace() {
        return None;
    }

    let min_end = start + first.len_utf8();
    let idx = closes.partition_point(|&close| close < min_end);
    let first_close = *closes.get(idx)?;
    if !absorb_trailing {
        return Some(first_close);
    }

    let run_start = min_end.max(first_close - trailing_marker_run(&text[..first_close]));
    let run_end = run_start + leading_marker_run(&text[run_start..]);
    closes[idx..]
        .iter()
        .take_while(|&&close| close <= run_end)
        .last()
        .copied()
}

fn is_marker(b: u8) -> bool {
    b == b'*' || b == b'_'
}

fn leading_marker_run(text: &str) -> usize {
    text.bytes().take_while(|&b| is_marker(b)).count()
}

fn trailing_marker_run(text: &str) -> usize {
    text.bytes().rev().take_while(|&b| is_marker(b)).count()
}

fn ends_in_non_whitespace(text: &str) -> bool {
    text.chars().next_back().is_some_and(|c| !c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn render(text: &str) -> String {
        replace_em(&replace_strong(text))
    }

    #[test]
    fn test_strong() {
        assert_eq!(render("a **b** c"), "a <strong>b</strong> c");
        assert_eq!(render("__b__"), "<strong>b</strong>");
    }

    #[test]
    fn test_em() {
        assert_eq!(render("a *b* c"), "a <em>b</em> c");
        assert_eq!(render("_b_"), "<em>b</em>");
    }

    #[test]
    fn test_strong_before_em() {
        assert_eq!(render("***x***"), "<strong><em>x</em></strong>");
    }

    #[test]
    fn test_needs_non_whitespace_inside() {
        assert_eq!(render("a * b * c"), "a * b * c");
        assert_eq!(render("*a *"), "*a *");
        assert_eq!(render("_ a_"), "_ a_");
    }

    #[test]
    fn test_unmatched_is_literal() {
        assert_eq!(render("2 * 3"), "2 * 3");
        assert_eq!(render("**open"), "**open");
    }

    #[test]
    fn test_shortest_match() {
        assert_eq!(render("*a* and *b*"), "<em>a</em> and <em>b</em>");
    }

    #[test]
    fn test_spans_newlines() {
        assert_eq!(render("*a\nb*"), "<em>a\nb</em>");
    }

    #[test]
    fn test_mixed_delimiters_do_not_pair() {
        assert_eq!(render("*a_"), "*a_");
    }

    #[test]
    fn test_multibyte_content() {
        assert_eq!(render("*héllo* wörld"), "<em>héllo</em> wörld");
    }

    #[test]
    fn test_marker_run_inside_strong() {
        assert_eq!(render("**a_**"), "<strong>a_</strong>");
        assert_eq!(render("**a** **b**"), "<strong>a</strong> <strong>b</strong>");
        assert_eq!(render("**x***"), "<strong>x*</strong>");
    }

    #[test]
    fn test_many_unmatched_openers() {
        let text = "a *b _c ".repeat(20_000);
        assert_eq!(render(&text), text);
    }

    #[test]
    fn test_close_far_from_opener() {
        let body = "x *y ".repeat(20_000);
        let text = format!("*{body}z*");
        assert_eq!(render(&text), format!("<em>{body}z</em>"));
    }

    #[test]
    fn test_close_offsets() {
        assert_eq!(close_offsets("a**b***", "**"), vec![1, 4, 5]);
        assert_eq!(close_offsets("* a *", "*"), Vec::<usize>::new());
    }
}
