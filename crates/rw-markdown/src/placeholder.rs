//! Placeholder store for finished HTML fragments.
//!
//! Fragments are swapped out of the working text for an opaque key so later
//! passes cannot re-interpret them. Keys are content digests:
//! `U+E000 'h' <64 hex sha256> U+E001`.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::escape::{SENTINEL_CLOSE, SENTINEL_OPEN};
use crate::util::sha256_hex;

/// Any placeholder key.
static KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("{SENTINEL_OPEN}h[0-9a-f]{{64}}{SENTINEL_CLOSE}")).unwrap()
});

/// Table mapping placeholder keys to verbatim HTML fragments.
///
/// Scoped to a single parse: the driver creates an empty store per call.
#[derive(Debug, Default)]
pub struct PlaceholderStore {
    entries: HashMap<String, String>,
}

impl PlaceholderStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the key a fragment is stored under.
    #[must_use]
    pub fn key_for(fragment: &str) -> String {
        format!("{SENTINEL_OPEN}h{}{SENTINEL_CLOSE}", sha256_hex(fragment))
    }

    /// Store a fragment and return its key.
    ///
    /// Inserting the same fragment twice yields the same key.
    pub fn insert(&mut self, fragment: impl Into<String>) -> String {
        let fragment = fragment.into();
        let key = Self::key_for(&fragment);
        match self.entries.entry(key.clone()) {
            Entry::Occupied(existing) => {
                debug_assert_eq!(existing.get(), &fragment, "placeholder key collision");
            }
            Entry::Vacant(slot) => {
                slot.insert(fragment);
            }
        }
        key
    }

    /// Fragment stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Whether `key` names a stored fragment.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Replace every known key in `text` with its fragment.
    ///
    /// Expansion repeats until no known key remains, so fragments that embed
    /// other keys are resolved too. Unknown keys are left untouched.
    #[must_use]
    pub fn expand(&self, text: &str) -> String {
        let mut expanded = text.to_owned();
        while KEY_RE.is_match(&expanded) {
            let next = KEY_RE
                .replace_all(&expanded, |caps: &Captures<'_>| {
                    self.get(&caps[0]).unwrap_or(&caps[0]).to_owned()
                })
                .into_owned();
            if next == expanded {
                break;
            }
            expanded = next;
        }
        expanded
    }

    /// Number of stored fragments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
