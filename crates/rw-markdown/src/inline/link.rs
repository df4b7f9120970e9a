//! Anchors, images and autolinks.
//!
//! Link text may hold one level of nested brackets so an image can sit inside
//! an anchor: `[![alt](a.png)](/page)`. Generated attributes are
//! entity-encoded and shielded, which keeps emphasis from reaching into them.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::InlineTransformer;
use crate::escape::{escape_attribute, escape_html};
use crate::reference::Reference;

/// `[text][label]`, with an optional space or line break between the pairs.
static ANCHOR_REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[((?:[^\[\]]|\[[^\[\]]*\])*)\] ?(?:\n *)?\[([^\[\]]*)\]").unwrap()
});

/// `[text](url "title")`.
static ANCHOR_INLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\[((?:[^\[\]]|\[[^\[\]]*\])*)\]\([ \t]*<?(\S+?)>?[ \t]*(?:(?:"(.*?)"|'(.*?)')[ \t]*)?\)"#,
    )
    .unwrap()
});

/// `[label]` on its own.
static ANCHOR_SHORTCUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]+)\]").unwrap());

/// `<scheme:...>` for the supported schemes.
static AUTOLINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<((?:https?|ftp|mailto):[^'">\s]+)>"#).unwrap()
});

static IMAGE_REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[((?:[^\[\]]|\[[^\[\]]*\])*)\] ?(?:\n *)?\[([^\[\]]*)\]").unwrap()
});

static IMAGE_INLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"!\[((?:[^\[\]]|\[[^\[\]]*\])*)\]\([ \t]*<?(\S+?)>?[ \t]*(?:(?:"(.*?)"|'(.*?)')[ \t]*)?\)"#,
    )
    .unwrap()
});

static IMAGE_SHORTCUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\[\]]+)\]").unwrap());

impl InlineTransformer<'_> {
    /// Replace reference, inline and shortcut anchors, then autolinks.
    pub(super) fn replace_anchors(&self, text: &str) -> String {
        let text = replace_links(text, &ANCHOR_REFERENCE_RE, true, |caps| {
            let label = non_empty(&caps[2]).unwrap_or(&caps[1]);
            let reference = self.references.get(label)?;
            Some(self.reference_anchor(&caps[1], reference))
        });

        let text = replace_links(&text, &ANCHOR_INLINE_RE, true, |caps| {
            let url = self.escapes.shield(&escape_attribute(&caps[2]));
            Some(self.anchor(&caps[1], &url, inline_title(caps)))
        });

        let text = replace_links(&text, &ANCHOR_SHORTCUT_RE, true, |caps| {
            if !is_standalone_bracket(&text, caps, true) {
                return None;
            }
            let reference = self.references.get(&caps[1])?;
            Some(self.reference_anchor(&caps[1], reference))
        });

        AUTOLINK_RE
            .replace_all(&text, |caps: &Captures<'_>| {
                let href = self.escapes.shield(&escape_attribute(&caps[1]));
                let label = self.escapes.shield(&escape_html(&caps[1]));
                format!(r#"<a href="{href}">{label}</a>"#)
            })
            .into_owned()
    }

    /// Replace reference, inline and shortcut images.
    pub(super) fn replace_images(&self, text: &str) -> String {
        let text = replace_links(text, &IMAGE_REFERENCE_RE, false, |caps| {
            let label = non_empty(&caps[2]).unwrap_or(&caps[1]);
            let reference = self.references.get(label)?;
            Some(self.reference_image(&caps[1], reference))
        });

        let text = replace_links(&text, &IMAGE_INLINE_RE, false, |caps| {
            let src = self.escapes.shield(&escape_attribute(&caps[2]));
            Some(self.image(&caps[1], &src, inline_title(caps)))
        });

        replace_links(&text, &IMAGE_SHORTCUT_RE, false, |caps| {
            if !is_standalone_bracket(&text, caps, false) {
                return None;
            }
            let reference = self.references.get(&caps[1])?;
            Some(self.reference_image(&caps[1], reference))
        })
    }

    fn reference_anchor(&self, text: &str, reference: &Reference) -> String {
        let href = self.escapes.shield(&reference.url);
        self.anchor(text, &href, reference.title.as_deref())
    }

    fn anchor(&self, text: &str, href: &str, title: Option<&str>) -> String {
        format!(r#"<a href="{href}"{}>{text}</a>"#, self.title_attribute(title))
    }

    fn reference_image(&self, alt: &str, reference: &Reference) -> String {
        let src = self.escapes.shield(&reference.url);
        self.image(alt, &src, reference.title.as_deref())
    }

    fn image(&self, alt: &str, src: &str, title: Option<&str>) -> String {
        format!(
            r#"<img src="{src}" alt="{}"{}{}"#,
            self.escapes.shield(&escape_attribute(alt)),
            self.title_attribute(title),
            self.empty_element_suffix
        )
    }

    fn title_attribute(&self, title: Option<&str>) -> String {
        match title {
            Some(title) if !title.is_empty() => {
                format!(r#" title="{}""#, self.escapes.shield(&escape_attribute(title)))
            }
            _ => String::new(),
        }
    }
}

/// Rewrite every match of `re` that `render` accepts.
///
/// Rejected matches stay literal and scanning resumes one byte later, so a
/// bracket nested inside a rejected match still gets its turn. With
/// `skip_after_bang`, matches preceded by `!` are left for the image pass.
fn replace_links(
    text: &str,
    re: &Regex,
    skip_after_bang: bool,
    mut render: impl FnMut(&Captures<'_>) -> Option<String>,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut pos = 0;

    while let Some(caps) = re.captures_at(text, pos) {
        let Some(whole) = caps.get(0) else {
            break;
        };
        let rendered = if skip_after_bang && text[..whole.start()].ends_with('!') {
            None
        } else {
            render(&caps)
        };

        match rendered {
            Some(html) => {
                out.push_str(&text[copied..whole.start()]);
                out.push_str(&html);
                copied = whole.end();
                pos = whole.end();
            }
            // Matches open with an ASCII `[` or `!`.
            None => pos = whole.start() + 1,
        }
    }

    out.push_str(&text[copied..]);
    out
}

/// Whether a shortcut match stands alone: not directly after `]` (or `!` for
/// anchors) and not directly before `[` or `(`.
fn is_standalone_bracket(text: &str, caps: &Captures<'_>, anchor: bool) -> bool {
    let Some(whole) = caps.get(0) else {
        return false;
    };
    let before = text[..whole.start()].chars().next_back();
    let after = text[whole.end()..].chars().next();

    let bad_before = match before {
        Some(']') => true,
        Some('!') => anchor,
        _ => false,
    };
    !bad_before && !matches!(after, Some('[' | '('))
}

fn inline_title<'t>(caps: &Captures<'t>) -> Option<&'t str> {
    caps.get(3).or_else(|| caps.get(4)).map(|m| m.as_str())
}

fn non_empty(text: &str) -> Option<&str> {
    (!text.is_empty()).then_some(text)
}
