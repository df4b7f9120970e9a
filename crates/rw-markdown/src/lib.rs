//! Markdown to HTML compiler built on multi-pass string rewriting.
//!
//! A document goes through an ordered series of textual rewrites rather than
//! a parse tree. Finished HTML fragments are swapped out for content-hash
//! placeholder keys so later passes cannot re-interpret them, and
//! backslash-escaped characters travel through the pipeline as opaque tokens
//! until the inline pass decodes them.
//!
//! # Architecture
//!
//! - [`EscapeTable`]: bijection between escapable characters and tokens
//! - [`PlaceholderStore`]: per-parse table of protected fragments
//! - [`ReferenceTable`]: link and image reference definitions
//! - block pass: headings, rules, lists, code blocks, quotes, paragraphs
//! - inline pass: code spans, links, images, emphasis, hard breaks
//! - [`Markdown`]: the driver tying them together
//!
//! # Example
//!
//! ```
//! let html = rw_markdown::parse("# Hello\n\n**Bold** text").unwrap();
//! assert_eq!(html, "<h1>Hello</h1>\n\n<p><strong>Bold</strong> text</p>");
//! ```

mod block;
mod config;
mod escape;
mod html_block;
mod inline;
mod markdown;
mod placeholder;
mod reference;
mod util;

pub use config::{DEFAULT_EMPTY_ELEMENT_SUFFIX, DEFAULT_MAX_NESTING_DEPTH, MarkdownConfig};
pub use escape::{ESCAPABLE_CHARS, EscapeTable, escape_attribute, escape_html};
pub use html_block::BLOCK_TAGS;
pub use markdown::{Markdown, MarkdownError, parse, transform_inline};
pub use placeholder::PlaceholderStore;
pub use reference::{Reference, ReferenceTable};
