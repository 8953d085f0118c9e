//! Width-aware rendering of review threads into styled lines.
//!
//! Output is toolkit-neutral: a [`StyledLine`] is a list of text runs tagged
//! with a semantic [`TextStyle`]. The TUI maps those to ratatui styles and the
//! plain listing maps them to ANSI escapes.

pub mod cache;
pub mod markdown;
pub mod reflow;

use thiserror::Error;
use tracing::debug;
use unicode_width::UnicodeWidthStr;

use crate::github::Thread;

pub use cache::RenderCache;
pub use markdown::{MarkdownRenderer, MarkdownTheme, RendererPool};
pub use reflow::{wrap_plain_text, wrap_text};

/// Indent applied to comment bodies.
pub const BODY_INDENT: &str = "  ";

/// Shown in place of thread content when nothing matches the filter.
pub const NO_THREADS_MESSAGE: &str = "no review threads found";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("wrap width {0} is too narrow")]
    InvalidWidth(usize),
    #[error("unknown markdown theme {0:?}")]
    UnknownTheme(String),
    #[error("markdown nesting deeper than {0} levels")]
    NestingTooDeep(usize),
}

/// Semantic style of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextStyle {
    #[default]
    Plain,
    Heading,
    Strong,
    Emphasis,
    Strikethrough,
    InlineCode,
    CodeBlock,
    Link,
    Quote,
    ListMarker,
    Rule,
    TableBorder,
    Author,
    Dim,
    Bullet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub style: TextStyle,
}

impl StyledSpan {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, TextStyle::Plain)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledLine {
    pub spans: Vec<StyledSpan>,
}

impl StyledLine {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            spans: vec![StyledSpan::plain(text)],
        }
    }

    pub fn from_spans(spans: Vec<StyledSpan>) -> Self {
        Self { spans }
    }

    /// Concatenated text without styling.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    #[cfg(test)]
    pub fn width(&self) -> usize {
        self.spans.iter().map(|s| s.text.width()).sum()
    }

    pub fn is_blank(&self) -> bool {
        self.spans.iter().all(|s| s.text.trim().is_empty())
    }
}

/// Prefix every rendered line with `indent`.
///
/// Trailing blank lines are dropped; an empty result becomes a single indented blank line.
pub fn indent_rendered(mut lines: Vec<StyledLine>, indent: &str) -> Vec<StyledLine> {
    while lines.last().is_some_and(StyledLine::is_blank) {
        lines.pop();
    }
    if lines.is_empty() {
        return vec![StyledLine::plain(indent)];
    }
    lines
        .into_iter()
        .map(|mut line| {
            if !indent.is_empty() {
                line.spans.insert(0, StyledSpan::plain(indent));
            }
            line
        })
        .collect()
}

/// Render a comment body, preferring markdown and falling back to reflowed plain text.
///
/// `renderer` is `None` when markdown is disabled or could not be built for this width.
pub fn format_comment_body(
    body: &str,
    indent: &str,
    width: usize,
    renderer: Option<&MarkdownRenderer>,
) -> Vec<StyledLine> {
    if let Some(renderer) = renderer {
        match renderer.render(body) {
            Ok(lines) => return indent_rendered(lines, indent),
            Err(e) => debug!(%e, "markdown render failed, using plain text"),
        }
    }
    wrap_plain_text(body, indent, width)
        .into_iter()
        .map(StyledLine::plain)
        .collect()
}

/// Body content of one thread as shown in the browser.
pub fn render_thread(
    thread: &Thread,
    width: usize,
    renderer: Option<&MarkdownRenderer>,
) -> Vec<StyledLine> {
    let comments = thread.comments();
    let mut lines = Vec::new();
    for (i, comment) in comments.iter().enumerate() {
        lines.push(StyledLine::from_spans(vec![
            StyledSpan::new("•", TextStyle::Bullet),
            StyledSpan::plain(" "),
            StyledSpan::new(comment.author_name(), TextStyle::Author),
            StyledSpan::plain(" — "),
            StyledSpan::new(comment.created_at.as_str(), TextStyle::Dim),
        ]));
        if let Some(url) = comment.permalink() {
            lines.push(StyledLine::from_spans(vec![
                StyledSpan::plain("  "),
                StyledSpan::new(url, TextStyle::Dim),
            ]));
        }
        lines.push(StyledLine::blank());
        lines.extend(format_comment_body(&comment.body, BODY_INDENT, width, renderer));
        if i + 1 < comments.len() {
            lines.push(StyledLine::blank());
        }
    }
    lines
}
