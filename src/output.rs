//! Non-interactive listing: plain text (ANSI styled on a terminal) or JSON.

use anyhow::Result;
use crossterm::style::{Attribute, Color, ContentStyle};
use std::io::Write;

use crate::github::Thread;
use crate::render::{
    format_comment_body, MarkdownRenderer, StyledLine, TextStyle, BODY_INDENT,
    NO_THREADS_MESSAGE,
};

const SEPARATOR_WIDTH: usize = 40;

/// Wraps text in ANSI escapes when enabled
#[derive(Debug, Clone, Copy)]
pub struct Styler {
    enabled: bool,
}

impl Styler {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn paint(&self, text: &str, style: ContentStyle) -> String {
        if self.enabled {
            style.apply(text).to_string()
        } else {
            text.to_owned()
        }
    }

    fn styled_line(&self, line: &StyledLine) -> String {
        line.spans
            .iter()
            .map(|span| self.paint(&span.text, content_style(span.style)))
            .collect()
    }
}

fn fg(color: Color) -> ContentStyle {
    ContentStyle {
        foreground_color: Some(color),
        ..ContentStyle::default()
    }
}

fn attr(attribute: Attribute) -> ContentStyle {
    ContentStyle {
        attributes: attribute.into(),
        ..ContentStyle::default()
    }
}

fn content_style(style: TextStyle) -> ContentStyle {
    match style {
        TextStyle::Plain => ContentStyle::default(),
        TextStyle::Heading => ContentStyle {
            attributes: Attribute::Bold.into(),
            ..fg(Color::Cyan)
        },
        TextStyle::Strong => attr(Attribute::Bold),
        TextStyle::Emphasis => attr(Attribute::Italic),
        TextStyle::Strikethrough => attr(Attribute::CrossedOut),
        TextStyle::InlineCode => fg(Color::Yellow),
        TextStyle::CodeBlock => fg(Color::Green),
        TextStyle::Link => ContentStyle {
            attributes: Attribute::Underlined.into(),
            ..fg(Color::Blue)
        },
        TextStyle::Quote | TextStyle::Rule | TextStyle::TableBorder => fg(Color::DarkGrey),
        TextStyle::ListMarker => fg(Color::Cyan),
        TextStyle::Author => fg(Color::Blue),
        TextStyle::Dim | TextStyle::Bullet => attr(Attribute::Dim),
    }
}

/// Plain listing of `threads`, bodies wrapped at `width`.
///
/// `renderer` is only used for styled output; callers pass `None` otherwise.
pub fn write_threads<W: Write>(
    out: &mut W,
    threads: &[&Thread],
    width: usize,
    renderer: Option<&MarkdownRenderer>,
    styler: Styler,
) -> Result<()> {
    if threads.is_empty() {
        writeln!(out, "{}", NO_THREADS_MESSAGE)?;
        return Ok(());
    }

    let label = ContentStyle {
        attributes: Attribute::Bold.into(),
        ..fg(Color::Cyan)
    };
    for thread in threads {
        let status_color = if thread.is_resolved {
            Color::Green
        } else {
            Color::Red
        };
        let locator = thread
            .locator()
            .map(|l| format!(" [{}]", l))
            .unwrap_or_default();
        writeln!(
            out,
            "{} {} {}{}\n",
            styler.paint("Thread", label),
            styler.paint(&thread.id, fg(Color::Cyan)),
            styler.paint(thread.status_label(), fg(status_color)),
            locator
        )?;

        for comment in thread.comments() {
            writeln!(
                out,
                "  {} {} — {}",
                styler.paint("•", attr(Attribute::Dim)),
                styler.paint(comment.author_name(), fg(Color::Blue)),
                styler.paint(&comment.created_at, attr(Attribute::Dim))
            )?;
            if let Some(url) = comment.permalink() {
                writeln!(out, "    {}", styler.paint(url, attr(Attribute::Dim)))?;
            }
            writeln!(out)?;
            for line in format_comment_body(&comment.body, BODY_INDENT, width, renderer) {
                writeln!(out, "{}", styler.styled_line(&line))?;
            }
        }
        writeln!(out)?;
        writeln!(
            out,
            "    {}",
            styler.paint(&"-".repeat(SEPARATOR_WIDTH), attr(Attribute::Dim))
        )?;
        writeln!(out)?;
    }
    Ok(())
}

/// Pretty JSON array using the GraphQL field names.
pub fn write_json<W: Write>(out: &mut W, threads: &[&Thread]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, threads)?;
    writeln!(out)?;
    Ok(())
}
