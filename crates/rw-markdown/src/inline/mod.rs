//! Inline transformation.
//!
//! Runs over the text of one block. Passes are ordered; each assumes earlier
//! ones already consumed their syntax:
//!
//! 1. code spans
//! 2. anchors and autolinks
//! 3. images
//! 4. strong, then plain emphasis
//! 5. hard line breaks
//! 6. escape tokens decoded back to literal characters

mod code_span;
mod emphasis;
mod link;

use std::sync::LazyLock;

use regex::{NoExpand, Regex};

use crate::escape::EscapeTable;
use crate::reference::ReferenceTable;

/// Two or more spaces at the end of a line.
static HARD_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}\n").unwrap());

/// Inline pass bound to one document's reference table.
pub(crate) struct InlineTransformer<'a> {
    references: &'a ReferenceTable,
    escapes: &'static EscapeTable,
    empty_element_suffix: &'a str,
}

impl<'a> InlineTransformer<'a> {
    pub(crate) fn new(references: &'a ReferenceTable, empty_element_suffix: &'a str) -> Self {
        Self {
            references,
            escapes: EscapeTable::global(),
            empty_element_suffix,
        }
    }

    /// Transform inline syntax in `text`.
    ///
    /// Backslash escapes must already be encoded. The result holds no escape
    /// tokens but may still hold placeholder keys passed in with `text`.
    pub(crate) fn transform(&self, text: &str) -> String {
        let text = code_span::replace_code_spans(text, self.escapes);
        let text = self.replace_anchors(&text);
        let text = self.replace_images(&text);
        let text = emphasis::replace_strong(&text);
        let text = emphasis::replace_em(&text);

        let line_break = format!("<br{}\n", self.empty_element_suffix);
        let text = HARD_BREAK_RE.replace_all(&text, NoExpand(&line_break));

        self.escapes.decode(&text).into_owned()
    }
}
