//! Block transformation.
//!
//! Recognizes block constructs in a fixed order: headings, horizontal rules,
//! lists, code blocks, block quotes. Each rendered block goes straight into
//! the placeholder store and is replaced by a blank-line-delimited key, so
//! later passes and paragraph assembly never look inside it. Quotes and loose
//! list items recurse into [`BlockTransformer::transform`] with an explicit
//! depth that is checked against the configured limit.

mod list;

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::config::MarkdownConfig;
use crate::escape::EscapeTable;
use crate::html_block::protect_html_blocks;
use crate::inline::InlineTransformer;
use crate::markdown::MarkdownError;
use crate::placeholder::PlaceholderStore;
use crate::reference::ReferenceTable;
use crate::util::{outdent, split_blank_lines, try_replace_all};

/// Underlined heading: `=` for level 1, `-` for level 2.
static SETEXT_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(.+)[ \t]*\n(=+|-+)[ \t]*(?:\n+|\z)").unwrap());

/// `#` heading with optional closing hashes.
static ATX_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,6})[ \t]*(.+?)[ \t]*#*(?:\n+|\z)").unwrap());

static HORIZONTAL_RULE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^ {0,3}(?:(?:\*[ \t]*){3,}|(?:-[ \t]*){3,}|(?:_[ \t]*){3,})$").unwrap()
});

/// Indented lines at the start of the text or after a blank line.
static CODE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\n\n|\A\n?)((?:(?: {4}|\t).*(?:\n+|\z))+)").unwrap()
});

/// Run of `>` lines, with lazy continuation lines and trailing blank lines.
static BLOCK_QUOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:^[ \t]*>[ \t]?.+(?:\n|\z)(?:.+(?:\n|\z))*\n*)+").unwrap()
});

/// The `>` prefix of one quoted line.
static QUOTE_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*>(?:[ \t]*$|[ \t]?)").unwrap());

/// Recursive block pass over one document.
///
/// Borrows the document's placeholder store for the duration of the parse.
pub(crate) struct BlockTransformer<'a> {
    config: &'a MarkdownConfig,
    escapes: &'static EscapeTable,
    inline: InlineTransformer<'a>,
    store: &'a mut PlaceholderStore,
}

impl<'a> BlockTransformer<'a> {
    pub(crate) fn new(
        config: &'a MarkdownConfig,
        references: &'a ReferenceTable,
        store: &'a mut PlaceholderStore,
    ) -> Self {
        Self {
            config,
            escapes: EscapeTable::global(),
            inline: InlineTransformer::new(references, &config.empty_element_suffix),
            store,
        }
    }

    /// Transform block constructs in `text` and assemble paragraphs.
    ///
    /// `in_list` lets lists start on any line instead of only after a blank
    /// line. The returned HTML contains no placeholder keys.
    pub(crate) fn transform(
        &mut self,
        text: &str,
        in_list: bool,
        depth: usize,
    ) -> Result<String, MarkdownError> {
        self.check_depth(depth)?;

        let text = self.replace_headings(text);
        let text = self.replace_horizontal_rules(&text);
        let text = self.replace_lists(&text, in_list, depth)?;
        let text = self.replace_code_blocks(&text);
        let text = self.replace_block_quotes(&text, depth)?;
        let text = protect_html_blocks(&text, self.store, self.escapes);

        Ok(self.paragraphify(&text))
    }

    fn check_depth(&self, depth: usize) -> Result<(), MarkdownError> {
        let limit = self.config.max_nesting_depth;
        if depth > limit {
            tracing::warn!(depth, limit, "Nesting limit exceeded");
            return Err(MarkdownError::NestingTooDeep { limit });
        }
        Ok(())
    }

    /// Store a finished block and return its key on a paragraph of its own.
    fn shield(&mut self, html: &str) -> String {
        let key = self.store.insert(self.escapes.decode(html));
        format!("\n\n{key}\n\n")
    }

    fn replace_headings(&mut self, text: &str) -> String {
        let text = SETEXT_HEADING_RE
            .replace_all(text, |caps: &Captures<'_>| {
                let level = if caps[2].starts_with('=') { 1 } else { 2 };
                self.heading(level, caps[1].trim_end())
            })
            .into_owned();

        ATX_HEADING_RE
            .replace_all(&text, |caps: &Captures<'_>| self.heading(caps[1].len(), &caps[2]))
            .into_owned()
    }

    fn heading(&mut self, level: usize, text: &str) -> String {
        let content = self.inline.transform(text);
        self.shield(&format!("<h{level}>{content}</h{level}>"))
    }

    fn replace_horizontal_rules(&mut self, text: &str) -> String {
        let rule = format!("<hr{}", self.config.empty_element_suffix);
        HORIZONTAL_RULE_RE
            .replace_all(text, |_: &Captures<'_>| self.shield(&rule))
            .into_owned()
    }

    fn replace_code_blocks(&mut self, text: &str) -> String {
        CODE_BLOCK_RE
            .replace_all(text, |caps: &Captures<'_>| {
                let code = outdent(&caps[1]);
                let code = self
                    .escapes
                    .protect(&self.escapes.restore_backslash_escapes(&code));
                self.shield(&format!("<pre><code>{}\n</code></pre>", code.trim_end()))
            })
            .into_owned()
    }

    fn replace_block_quotes(&mut self, text: &str, depth: usize) -> Result<String, MarkdownError> {
        try_replace_all(&BLOCK_QUOTE_RE, text, |caps| {
            let quote = QUOTE_PREFIX_RE.replace_all(&caps[0], "");
            let inner = self.transform(&quote, false, depth + 1)?;
            Ok(self.shield(&format!("<blockquote>\n{inner}\n</blockquote>")))
        })
    }

    /// Split on blank lines: keys expand to their fragment, everything else
    /// becomes an inline-transformed paragraph. Blank segments are dropped.
    fn paragraphify(&self, text: &str) -> String {
        split_blank_lines(text.trim_matches('\n'))
            .filter(|part| !part.trim().is_empty())
            .map(|part| {
                if self.store.contains(part.trim()) {
                    self.store.expand(part.trim())
                } else {
                    let content = self.store.expand(&self.inline.transform(part));
                    format!("<p>{content}</p>")
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn render(text: &str) -> Result<String, MarkdownError> {
        render_with(text, &MarkdownConfig::default())
    }

    fn render_with(text: &str, config: &MarkdownConfig) -> Result<String, MarkdownError> {
        let references = ReferenceTable::new();
        let mut store = PlaceholderStore::new();
        let mut blocks = BlockTransformer::new(config, &references, &mut store);
        let encoded = EscapeTable::global().encode_backslash_escapes(text);
        blocks.transform(&encoded, false, 0)
    }

    #[test]
    fn test_atx_headings() {
        assert_eq!(render("# One").unwrap(), "<h1>One</h1>");
        assert_eq!(render("###### Six ###").unwrap(), "<h6>Six</h6>");
        assert_eq!(render("##Tight").unwrap(), "<h2>Tight</h2>");
    }

    #[test]
    fn test_setext_headings() {
        assert_eq!(render("Title\n=====").unwrap(), "<h1>Title</h1>");
        assert_eq!(render("Sub  \n---\t\n\nText").unwrap(), "<h2>Sub</h2>\n\n<p>Text</p>");
    }

    #[test]
    fn test_heading_text_is_inline_transformed() {
        assert_eq!(render("# *Hi*").unwrap(), "<h1><em>Hi</em></h1>");
    }

    #[test]
    fn test_horizontal_rules() {
        assert_eq!(render("***").unwrap(), "<hr />");
        assert_eq!(render("a\n\n- - -\n\nb").unwrap(), "<p>a</p>\n\n<hr />\n\n<p>b</p>");
        assert_eq!(render("   ___").unwrap(), "<hr />");
    }

    #[test]
    fn test_custom_empty_element_suffix() {
        let config = MarkdownConfig::new().with_empty_element_suffix(">");
        assert_eq!(render_with("---", &config).unwrap(), "<hr>");
    }

    #[test]
    fn test_code_block() {
        assert_eq!(
            render("para\n\n    let x = *y* < 1;\n    \\*z\n\nafter").unwrap(),
            "<p>para</p>\n\n<pre><code>let x = *y* &lt; 1;\n\\*z\n</code></pre>\n\n<p>after</p>"
        );
    }

    #[test]
    fn test_code_block_with_tab_and_blank_line() {
        assert_eq!(
            render("\tone\n\n\ttwo\n").unwrap(),
            "<pre><code>one\n\ntwo\n</code></pre>"
        );
    }

    #[test]
    fn test_block_quote() {
        assert_eq!(
            render("> quoted").unwrap(),
            "<blockquote>\n<p>quoted</p>\n</blockquote>"
        );
    }

    #[test]
    fn test_block_quote_lazy_continuation() {
        assert_eq!(
            render("> a\nb").unwrap(),
            "<blockquote>\n<p>a\nb</p>\n</blockquote>"
        );
    }

    #[test]
    fn test_nested_block_quote_with_heading() {
        assert_eq!(
            render("> # T\n> > inner").unwrap(),
            "<blockquote>\n<h1>T</h1>\n\n<blockquote>\n<p>inner</p>\n</blockquote>\n</blockquote>"
        );
    }

    #[test]
    fn test_paragraphs() {
        assert_eq!(
            render("one\ntwo\n\n\nthree").unwrap(),
            "<p>one\ntwo</p>\n\n<p>three</p>"
        );
    }

    #[test]
    fn test_blank_input_has_no_paragraphs() {
        assert_eq!(render("").unwrap(), "");
        assert_eq!(render("\n\n  \n").unwrap(), "");
    }

    #[test]
    fn test_html_exposed_in_quote_is_protected() {
        assert_eq!(
            render("> <div>*x*</div>").unwrap(),
            "<blockquote>\n<div>*x*</div>\n</blockquote>"
        );
    }

    #[test]
    fn test_depth_limit() {
        let config = MarkdownConfig::new().with_max_nesting_depth(2);
        assert!(render_with("> > ok", &config).is_ok());
        assert_eq!(
            render_with("> > > deep", &config),
            Err(MarkdownError::NestingTooDeep { limit: 2 })
        );
    }
}
