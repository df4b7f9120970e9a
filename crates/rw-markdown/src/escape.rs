//! Escape codec for markup-significant characters.
//!
//! Each character in [`ESCAPABLE_CHARS`] maps to an opaque token built from a
//! SHA-256 digest and wrapped in private-use sentinels. Tokens are inert to every
//! syntax-recognizing pass and are decoded back to literal characters once, at
//! the end of inline processing.
//!
//! Token format: `U+E000 'e' <16 hex digits> U+E001`. Placeholder keys share the
//! sentinels but use the tag letter `h`, so the two namespaces never overlap.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::util::sha256_hex;

/// Opening sentinel shared by escape tokens and placeholder keys.
pub(crate) const SENTINEL_OPEN: char = '\u{E000}';

/// Closing sentinel shared by escape tokens and placeholder keys.
pub(crate) const SENTINEL_CLOSE: char = '\u{E001}';

/// Characters that may be backslash-escaped in markup.
pub const ESCAPABLE_CHARS: &[char] = &[
    '*', '_', '{', '}', '[', ']', '\\', '`', '#', '+', '-', '.', '!',
];

/// Number of digest hex digits kept in an escape token.
const TOKEN_DIGEST_LEN: usize = 16;

/// Backslash followed by an escapable character.
static BACKSLASH_ESCAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\([*_{}\[\]\\`#+\-.!])").unwrap());

/// Characters tokenized by [`EscapeTable::shield`].
static SHIELD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[*\\_{}\[\]]").unwrap());

/// Any escape token.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        "{SENTINEL_OPEN}e[0-9a-f]{{{TOKEN_DIGEST_LEN}}}{SENTINEL_CLOSE}"
    ))
    .unwrap()
});

static GLOBAL: LazyLock<EscapeTable> = LazyLock::new(EscapeTable::new);

/// Bijection between [`ESCAPABLE_CHARS`] and their tokens.
///
/// The table holds no document state, so one instance serves every parse.
/// Use [`EscapeTable::global`] rather than building a new one per call.
#[derive(Debug)]
pub struct EscapeTable {
    tokens: HashMap<char, String>,
    chars: HashMap<String, char>,
}

impl EscapeTable {
    /// Build the table by digesting every escapable character.
    #[must_use]
    pub fn new() -> Self {
        let mut tokens = HashMap::with_capacity(ESCAPABLE_CHARS.len());
        let mut chars = HashMap::with_capacity(ESCAPABLE_CHARS.len());

        for &c in ESCAPABLE_CHARS {
            let digest = sha256_hex(c.encode_utf8(&mut [0; 4]));
            let token = format!(
                "{SENTINEL_OPEN}e{}{SENTINEL_CLOSE}",
                &digest[..TOKEN_DIGEST_LEN]
            );
            tokens.insert(c, token.clone());
            let previous = chars.insert(token, c);
            debug_assert!(previous.is_none(), "escape token collision for {c:?}");
        }

        Self { tokens, chars }
    }

    /// Shared table, built on first use.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Token for `c`, or `None` when `c` is not escapable.
    #[must_use]
    pub fn encode(&self, c: char) -> Option<&str> {
        self.tokens.get(&c).map(String::as_str)
    }

    /// Character behind `token`, or `None` for an unknown token.
    #[must_use]
    pub fn decode_token(&self, token: &str) -> Option<char> {
        self.chars.get(token).copied()
    }

    /// Replace `\c` sequences with the token for `c`.
    #[must_use]
    pub fn encode_backslash_escapes(&self, text: &str) -> String {
        BACKSLASH_ESCAPE_RE
            .replace_all(text, |caps: &Captures<'_>| self.token_for(&caps[1]))
            .into_owned()
    }

    /// Turn tokens back into their backslash-escaped source form (`\c`).
    ///
    /// Used where text must be reproduced verbatim, such as code and raw HTML.
    #[must_use]
    pub(crate) fn restore_backslash_escapes<'t>(&self, text: &'t str) -> Cow<'t, str> {
        TOKEN_RE.replace_all(text, |caps: &Captures<'_>| match self.decode_token(&caps[0]) {
            Some(c) => format!("\\{c}"),
            None => caps[0].to_owned(),
        })
    }

    /// Tokenize the characters that inline syntax reacts to (`* \ _ { } [ ]`).
    #[must_use]
    pub fn shield(&self, text: &str) -> String {
        SHIELD_RE
            .replace_all(text, |caps: &Captures<'_>| self.token_for(&caps[0]))
            .into_owned()
    }

    /// Make text HTML-safe and inert to later passes.
    ///
    /// Ampersands and angle brackets are entity-encoded, then the inline
    /// syntax characters are tokenized.
    #[must_use]
    pub fn protect(&self, text: &str) -> String {
        self.shield(&escape_html(text))
    }

    /// Replace every token with its literal character.
    #[must_use]
    pub fn decode<'t>(&self, text: &'t str) -> Cow<'t, str> {
        if !text.contains(SENTINEL_OPEN) {
            return Cow::Borrowed(text);
        }
        TOKEN_RE.replace_all(text, |caps: &Captures<'_>| match self.decode_token(&caps[0]) {
            Some(c) => c.to_string(),
            None => caps[0].to_owned(),
        })
    }

    fn token_for(&self, matched: &str) -> String {
        matched
            .chars()
            .next()
            .and_then(|c| self.encode(c))
            .map_or_else(|| matched.to_owned(), str::to_owned)
    }
}

impl Default for EscapeTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode `&`, `<` and `>` as HTML entities.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Encode `&`, `<`, `>` and `"` for use inside a double-quoted attribute.
#[must_use]
pub fn escape_attribute(text: &str) -> String {
    escape_html(text).replace('"', "&quot;")
}

/// Replace sentinel characters in user input with numeric character references.
///
/// After this, no input text can spell out a token or placeholder key.
#[must_use]
pub(crate) fn neutralize_sentinels(text: &str) -> Cow<'_, str> {
    if !text.contains([SENTINEL_OPEN, SENTINEL_CLOSE]) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.replace(SENTINEL_OPEN, "&#xE000;")
            .replace(SENTINEL_CLOSE, "&#xE001;"),
    )
}
