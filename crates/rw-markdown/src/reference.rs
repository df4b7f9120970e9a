//! Link and image reference definitions.
//!
//! A definition is a line of the form `[label]: url "optional title"`. The
//! title may also be wrapped in single quotes or parentheses, and may sit on
//! the following line.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::escape::{EscapeTable, escape_attribute};

/// A reference definition line.
static DEFINITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^[ \t]{0,3}\[([^\]\n]+)\]:[ \t]*<?(\S+?)>?(?:(?:[ \t]+|[ \t]*\n[ \t]*)("[^\n]+"|\([^\n]+\)|'[^\n]+'))?[ \t]*$"#,
    )
    .unwrap()
});

/// Target of a reference-style link or image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reference {
    /// Link target, already entity-encoded for use in an attribute.
    pub url: String,
    /// Optional title, as written (without its quotes).
    pub title: Option<String>,
}

/// Case-insensitive table of reference definitions.
///
/// When a label is defined more than once, the first definition in
/// document order wins.
#[derive(Clone, Debug, Default)]
pub struct ReferenceTable {
    entries: HashMap<String, Reference>,
}

impl ReferenceTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect definitions from `document` and remove their lines.
    ///
    /// Returns the remaining text together with the populated table.
    #[must_use]
    pub fn extract(document: &str) -> (String, Self) {
        let mut table = Self::new();
        let definitions: Vec<_> = DEFINITION_RE.captures_iter(document).collect();

        for caps in &definitions {
            let title = caps
                .get(3)
                .map(|m| strip_delimiters(m.as_str()).to_owned());
            table.insert(
                &caps[1],
                Reference {
                    url: escape_attribute(&caps[2]),
                    title,
                },
            );
        }

        // Delete back to front so earlier offsets stay valid.
        let mut text = document.to_owned();
        for caps in definitions.iter().rev() {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let end = if text[whole.end()..].starts_with('\n') {
                whole.end() + 1
            } else {
                whole.end()
            };
            text.replace_range(whole.start()..end, "");
        }

        (text, table)
    }

    /// Add a definition unless the label is already taken.
    ///
    /// Returns `true` when the definition was stored.
    pub fn insert(&mut self, label: &str, reference: Reference) -> bool {
        let key = normalize_label(label);
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, reference);
        true
    }

    /// Look up a label, ignoring case.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&Reference> {
        self.entries.get(&normalize_label(label))
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lowercase a label. Escape tokens are turned back into their source form so
/// `[a\*b]` in a link matches the definition `[a\*b]:`.
fn normalize_label(label: &str) -> String {
    EscapeTable::global()
        .restore_backslash_escapes(label)
        .to_lowercase()
}

/// Drop the first and last character (the title quotes or parentheses).
fn strip_delimiters(title: &str) -> &str {
    let mut chars = title.chars();
    chars.next();
    chars.next_back();
    chars.as_str()
}
