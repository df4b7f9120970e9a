//! Shared helpers for the rewriting passes.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use sha2::{Digest, Sha256};

/// One level of leading indentation: a tab or up to four spaces.
static OUTDENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^(?:\t| {1,4})").unwrap());

/// Two or more consecutive newlines.
pub(crate) static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());

/// Lowercase hex SHA-256 digest of `content`.
#[must_use]
pub(crate) fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Remove one level of indentation from every line.
#[must_use]
pub(crate) fn outdent(text: &str) -> String {
    OUTDENT_RE.replace_all(text, "").into_owned()
}

/// Squash blank-line runs to a single newline and trim surrounding newlines.
#[must_use]
pub(crate) fn collapse_blank_lines(text: &str) -> String {
    BLANK_RUN_RE
        .replace_all(text, "\n")
        .trim_matches('\n')
        .to_owned()
}

/// Split text on blank-line boundaries.
pub(crate) fn split_blank_lines(text: &str) -> impl Iterator<Item = &str> {
    BLANK_RUN_RE.split(text)
}

/// Like [`Regex::replace_all`], but the replacement callback may fail.
///
/// The first error aborts the rewrite and is returned as-is.
pub(crate) fn try_replace_all<E>(
    re: &Regex,
    text: &str,
    mut replace: impl FnMut(&Captures<'_>) -> Result<String, E>,
) -> Result<String, E> {
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;

    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&text[copied..whole.start()]);
        out.push_str(&replace(&caps)?);
        copied = whole.end();
    }

    out.push_str(&text[copied..]);
    Ok(out)
}

/// Length in bytes of the leading run of spaces and tabs.
#[must_use]
pub(crate) fn leading_blanks(text: &str) -> usize {
    text.bytes().take_while(|&b| b == b' ' || b == b'\t').count()
}
