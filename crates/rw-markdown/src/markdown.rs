//! Pipeline driver.
//!
//! A parse runs these steps in order:
//!
//! 1. normalize line endings and neutralize sentinel characters
//! 2. protect literal block HTML
//! 3. extract reference definitions
//! 4. encode backslash escapes
//! 5. block transformation, which assembles the final HTML
//!
//! The placeholder store lives for one call. The reference table is replaced
//! at the start of every parse, so an engine can be reused across documents.

use crate::block::BlockTransformer;
use crate::config::MarkdownConfig;
use crate::escape::{EscapeTable, neutralize_sentinels};
use crate::html_block::protect_html_blocks;
use crate::inline::InlineTransformer;
use crate::placeholder::PlaceholderStore;
use crate::reference::ReferenceTable;

/// Error returned when a document cannot be converted.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MarkdownError {
    /// Quotes or list items are nested deeper than the configured limit.
    #[error("Nesting too deep: exceeded limit of {limit} levels")]
    NestingTooDeep {
        /// Configured maximum nesting depth.
        limit: usize,
    },
}

/// Reusable markdown engine.
///
/// # Example
///
/// ```
/// use rw_markdown::{Markdown, MarkdownConfig};
///
/// let mut md = Markdown::with_config(MarkdownConfig::new().with_empty_element_suffix(">"));
/// assert_eq!(md.parse("---").unwrap(), "<hr>");
/// ```
#[derive(Debug, Default)]
pub struct Markdown {
    config: MarkdownConfig,
    references: ReferenceTable,
}

impl Markdown {
    /// Create an engine with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with the given configuration.
    #[must_use]
    pub fn with_config(config: MarkdownConfig) -> Self {
        Self {
            config,
            references: ReferenceTable::new(),
        }
    }

    /// Convert a document to HTML.
    ///
    /// # Errors
    ///
    /// Returns [`MarkdownError::NestingTooDeep`] if quotes or list items nest
    /// deeper than [`MarkdownConfig::max_nesting_depth`].
    pub fn parse(&mut self, document: &str) -> Result<String, MarkdownError> {
        let document = normalize(document);
        tracing::debug!(input_len = document.len(), "Parsing markdown");

        let escapes = EscapeTable::global();
        let mut store = PlaceholderStore::new();
        let text = protect_html_blocks(&document, &mut store, escapes);
        let text = self.load_references(&text);
        let text = escapes.encode_backslash_escapes(&text);

        let html = BlockTransformer::new(&self.config, &self.references, &mut store)
            .transform(&text, false, 0)?;

        tracing::debug!(
            output_len = html.len(),
            placeholders = store.len(),
            "Parsed markdown"
        );
        Ok(html)
    }

    /// Replace the reference table with the definitions in `document`.
    ///
    /// Returns the document without its definition lines. Call this before
    /// [`Markdown::transform_inline`] when fragments should resolve
    /// reference-style links against a document.
    pub fn extract_references(&mut self, document: &str) -> String {
        self.load_references(&normalize(document))
    }

    /// Transform inline syntax only, using the current reference table.
    #[must_use]
    pub fn transform_inline(&self, text: &str) -> String {
        let text = EscapeTable::global().encode_backslash_escapes(&normalize(text));
        InlineTransformer::new(&self.references, &self.config.empty_element_suffix)
            .transform(&text)
    }

    /// Reference table of the most recent document.
    #[must_use]
    pub fn references(&self) -> &ReferenceTable {
        &self.references
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &MarkdownConfig {
        &self.config
    }

    fn load_references(&mut self, text: &str) -> String {
        let (text, references) = ReferenceTable::extract(text);
        tracing::debug!(count = references.len(), "Extracted reference definitions");
        self.references = references;
        text
    }
}

/// Convert a document to HTML with the default configuration.
///
/// # Errors
///
/// Returns [`MarkdownError::NestingTooDeep`] for pathologically nested input.
pub fn parse(document: &str) -> Result<String, MarkdownError> {
    Markdown::new().parse(document)
}

/// Transform inline syntax in a fragment, without reference definitions.
#[must_use]
pub fn transform_inline(text: &str) -> String {
    Markdown::new().transform_inline(text)
}

/// Unify line endings to `\n` and neutralize sentinel characters.
fn normalize(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    neutralize_sentinels(&text).into_owned()
}
