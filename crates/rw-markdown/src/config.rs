//! Engine configuration.

/// Default maximum recursion depth for nested blocks.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 32;

/// Default suffix for void elements (`<hr />`, `<br />`, `<img ... />`).
pub const DEFAULT_EMPTY_ELEMENT_SUFFIX: &str = " />";

/// Configuration for [`Markdown`](crate::Markdown).
///
/// With the `serde` feature enabled this can be embedded in a host
/// application's configuration file; missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct MarkdownConfig {
    /// Maximum depth of nested quotes and list items.
    ///
    /// The document itself is depth 0. Default: 32
    pub max_nesting_depth: usize,
    /// Suffix closing void elements.
    ///
    /// Default: `" />"`
    pub empty_element_suffix: String,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            empty_element_suffix: DEFAULT_EMPTY_ELEMENT_SUFFIX.to_owned(),
        }
    }

    /// Set the maximum nesting depth.
    #[must_use]
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Set the void element suffix, e.g. `">"` for HTML5 output.
    #[must_use]
    pub fn with_empty_element_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.empty_element_suffix = suffix.into();
        self
    }
}
