//! Markdown rendering for comment bodies.
//!
//! Parses with pulldown-cmark and lays the events out as word-wrapped
//! [`StyledLine`]s. Block quotes, lists, code blocks, tables and rules get
//! terminal-friendly prefixes; inline markup becomes a [`TextStyle`].

use std::collections::HashMap;
use std::str::FromStr;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use tracing::{debug, warn};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::{RenderError, StyledLine, StyledSpan, TextStyle};

/// Narrowest wrap width a renderer accepts.
pub const MIN_WRAP_WIDTH: usize = 10;
/// Widest wrap width a renderer accepts.
pub const MAX_WRAP_WIDTH: usize = 1000;
/// Maximum depth of nested block quotes and lists.
pub const MAX_NESTING: usize = 16;
/// Renderers are built for at least this many columns.
pub const MIN_RENDER_WIDTH: usize = 20;
/// Columns kept free for the body indent.
pub const RESERVED_MARGIN: usize = 2;

const RULE_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkdownTheme {
    #[default]
    Dark,
    Light,
    /// Layout only, every span is plain
    Plain,
}

impl FromStr for MarkdownTheme {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dark" => Ok(MarkdownTheme::Dark),
            "light" => Ok(MarkdownTheme::Light),
            "plain" => Ok(MarkdownTheme::Plain),
            _ => Err(RenderError::UnknownTheme(s.to_string())),
        }
    }
}

/// Renders markdown at a fixed wrap width.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    wrap_width: usize,
    theme: MarkdownTheme,
}

impl MarkdownRenderer {
    pub fn new(wrap_width: usize, theme: MarkdownTheme) -> Result<Self, RenderError> {
        if !(MIN_WRAP_WIDTH..=MAX_WRAP_WIDTH).contains(&wrap_width) {
            return Err(RenderError::InvalidWidth(wrap_width));
        }
        Ok(Self { wrap_width, theme })
    }

    pub fn wrap_width(&self) -> usize {
        self.wrap_width
    }

    pub fn render(&self, body: &str) -> Result<Vec<StyledLine>, RenderError> {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_FOOTNOTES;
        let mut writer = Writer::new(self.wrap_width);
        for event in Parser::new_ext(body, options) {
            writer.handle(event)?;
        }
        let mut lines = writer.finish();
        if self.theme == MarkdownTheme::Plain {
            for span in lines.iter_mut().flat_map(|l| l.spans.iter_mut()) {
                span.style = TextStyle::Plain;
            }
        }
        Ok(lines)
    }
}

/// Renderers keyed by width, built on first use.
///
/// A width whose renderer fails to build is not remembered, so the next
/// request for that width tries again.
#[derive(Debug)]
pub struct RendererPool {
    theme: String,
    renderers: HashMap<usize, MarkdownRenderer>,
    failures: usize,
}

impl RendererPool {
    pub fn new(theme: impl Into<String>) -> Self {
        Self {
            theme: theme.into(),
            renderers: HashMap::new(),
            failures: 0,
        }
    }

    pub fn renderer_for_width(&mut self, width: usize) -> Option<&MarkdownRenderer> {
        let width = width.max(MIN_RENDER_WIDTH);
        if !self.renderers.contains_key(&width) {
            let built = self
                .theme
                .parse::<MarkdownTheme>()
                .and_then(|theme| MarkdownRenderer::new(width - RESERVED_MARGIN, theme));
            match built {
                Ok(renderer) => {
                    debug!(width, "built markdown renderer");
                    self.renderers.insert(width, renderer);
                }
                Err(e) => {
                    self.failures += 1;
                    warn!(width, %e, "markdown renderer unavailable");
                    return None;
                }
            }
        }
        self.renderers.get(&width)
    }

    /// Number of widths with a live renderer.
    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }

    /// Construction attempts that failed so far.
    pub fn failures(&self) -> usize {
        self.failures
    }
}

enum Container {
    Quote,
    Item { marker: String, marker_pending: bool },
}

struct OpenLink {
    url: String,
    text: String,
}

#[derive(Default)]
struct TableState {
    rows: Vec<Vec<Vec<StyledSpan>>>,
    header_rows: usize,
    row: Vec<Vec<StyledSpan>>,
    cell: Vec<StyledSpan>,
}

/// Accumulates parser events into lines.
struct Writer {
    width: usize,
    lines: Vec<StyledLine>,
    inline: Vec<StyledSpan>,
    styles: Vec<TextStyle>,
    containers: Vec<Container>,
    lists: Vec<Option<u64>>,
    links: Vec<OpenLink>,
    code_block: Option<String>,
    html_block: Option<String>,
    table: Option<TableState>,
    needs_gap: bool,
}

impl Writer {
    fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
            inline: Vec::new(),
            styles: Vec::new(),
            containers: Vec::new(),
            lists: Vec::new(),
            links: Vec::new(),
            code_block: None,
            html_block: None,
            table: None,
            needs_gap: false,
        }
    }

    fn finish(mut self) -> Vec<StyledLine> {
        self.flush_inline();
        self.lines
    }

    fn handle(&mut self, event: Event<'_>) -> Result<(), RenderError> {
        match event {
            Event::Start(tag) => self.start(tag)?,
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if let Some(code) = self.code_block.as_mut() {
                    code.push_str(&text);
                } else if let Some(html) = self.html_block.as_mut() {
                    html.push_str(&text);
                } else {
                    self.push_text(&text, self.current_style());
                }
            }
            Event::Code(code) => self.push_text(&code, TextStyle::InlineCode),
            Event::InlineMath(math) | Event::DisplayMath(math) => {
                self.push_text(&math, TextStyle::InlineCode)
            }
            Event::Html(html) => match self.html_block.as_mut() {
                Some(block) => block.push_str(&html),
                None => self.push_text(&html, TextStyle::Dim),
            },
            Event::InlineHtml(html) => self.push_text(&html, TextStyle::Dim),
            Event::FootnoteReference(name) => {
                self.push_text(&format!("[^{}]", name), TextStyle::Link)
            }
            Event::SoftBreak => self.push_text(" ", self.current_style()),
            Event::HardBreak => self.flush_inline(),
            Event::Rule => {
                self.start_block();
                let (first, _) = self.prefixes();
                let avail = self.width.saturating_sub(spans_width(&first)).max(1);
                self.emit_verbatim_spans(vec![StyledSpan::new(
                    "─".repeat(avail.min(RULE_WIDTH)),
                    TextStyle::Rule,
                )]);
                self.needs_gap = true;
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.push_text(marker, TextStyle::ListMarker);
            }
        }
        Ok(())
    }

    fn start(&mut self, tag: Tag<'_>) -> Result<(), RenderError> {
        match tag {
            Tag::Paragraph => self.start_block(),
            Tag::Heading { level, .. } => {
                self.start_block();
                let marks = "#".repeat(level as usize);
                self.inline
                    .push(StyledSpan::new(format!("{} ", marks), TextStyle::Heading));
                self.styles.push(TextStyle::Heading);
            }
            Tag::BlockQuote(_) => {
                self.check_depth()?;
                self.start_block();
                self.containers.push(Container::Quote);
            }
            Tag::CodeBlock(_) => {
                self.start_block();
                self.code_block = Some(String::new());
            }
            Tag::HtmlBlock => {
                self.start_block();
                self.html_block = Some(String::new());
            }
            Tag::List(start) => {
                self.check_depth()?;
                let nested = self
                    .containers
                    .iter()
                    .any(|c| matches!(c, Container::Item { .. }));
                if nested {
                    self.flush_inline();
                } else {
                    self.start_block();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush_inline();
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}. ", n);
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.containers.push(Container::Item {
                    marker,
                    marker_pending: true,
                });
            }
            Tag::Emphasis => self.styles.push(TextStyle::Emphasis),
            Tag::Strong => self.styles.push(TextStyle::Strong),
            Tag::Strikethrough => self.styles.push(TextStyle::Strikethrough),
            Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. } => {
                self.links.push(OpenLink {
                    url: dest_url.to_string(),
                    text: String::new(),
                });
                self.styles.push(TextStyle::Link);
            }
            Tag::Table(_) => {
                self.start_block();
                self.table = Some(TableState::default());
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.end_block(),
            TagEnd::Heading(_) => {
                self.styles.pop();
                self.end_block();
            }
            TagEnd::BlockQuote(_) => {
                self.flush_inline();
                self.containers.pop();
                self.needs_gap = true;
            }
            TagEnd::CodeBlock => {
                let code = self.code_block.take().unwrap_or_default();
                for line in code.trim_end_matches('\n').split('\n') {
                    self.emit_verbatim_spans(vec![StyledSpan::new(line, TextStyle::CodeBlock)]);
                }
                self.needs_gap = true;
            }
            TagEnd::HtmlBlock => {
                let html = self.html_block.take().unwrap_or_default();
                for line in html.trim_end_matches('\n').split('\n') {
                    self.emit_verbatim_spans(vec![StyledSpan::new(
                        line.trim_end(),
                        TextStyle::Dim,
                    )]);
                }
                self.needs_gap = true;
            }
            TagEnd::List(_) => {
                self.flush_inline();
                self.lists.pop();
                self.needs_gap = true;
            }
            TagEnd::Item => {
                self.flush_inline();
                let unmarked = matches!(
                    self.containers.last(),
                    Some(Container::Item {
                        marker_pending: true,
                        ..
                    })
                );
                if unmarked {
                    // empty item still shows its marker
                    self.emit_wrapped(Vec::new());
                }
                self.containers.pop();
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.styles.pop();
            }
            TagEnd::Link | TagEnd::Image => {
                self.styles.pop();
                if let Some(link) = self.links.pop() {
                    let url = link.url.trim();
                    if !url.is_empty() && !url.starts_with('#') && url != link.text.trim() {
                        self.push_text(&format!(" ({})", url), TextStyle::Dim);
                    }
                }
            }
            TagEnd::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    let cell = std::mem::take(&mut table.cell);
                    table.row.push(cell);
                }
            }
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                    table.header_rows = table.rows.len();
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.emit_table(table);
                }
                self.needs_gap = true;
            }
            _ => {}
        }
    }

    fn check_depth(&self) -> Result<(), RenderError> {
        if self.containers.len() + self.lists.len() >= MAX_NESTING {
            return Err(RenderError::NestingTooDeep(MAX_NESTING));
        }
        Ok(())
    }

    fn current_style(&self) -> TextStyle {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_text(&mut self, text: &str, style: TextStyle) {
        for link in self.links.iter_mut() {
            link.text.push_str(text);
        }
        let target = match self.table.as_mut() {
            Some(table) => &mut table.cell,
            None => &mut self.inline,
        };
        push_span(target, text, style);
    }

    fn start_block(&mut self) {
        self.flush_inline();
        if self.needs_gap && !self.lines.is_empty() {
            let (_, rest) = self.prefixes();
            self.lines.push(StyledLine::from_spans(rest));
        }
        self.needs_gap = false;
    }

    fn end_block(&mut self) {
        self.flush_inline();
        self.needs_gap = true;
    }

    fn flush_inline(&mut self) {
        if self.inline.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.inline);
        if spans.iter().all(|s| s.text.trim().is_empty()) {
            return;
        }
        self.emit_wrapped(spans);
    }

    /// Prefix for the next line, and for the lines after it.
    fn prefixes(&self) -> (Vec<StyledSpan>, Vec<StyledSpan>) {
        let mut first = Vec::new();
        let mut rest = Vec::new();
        for container in &self.containers {
            match container {
                Container::Quote => {
                    first.push(StyledSpan::new("│ ", TextStyle::Quote));
                    rest.push(StyledSpan::new("│ ", TextStyle::Quote));
                }
                Container::Item {
                    marker,
                    marker_pending,
                } => {
                    let pad = " ".repeat(marker.width());
                    if *marker_pending {
                        first.push(StyledSpan::new(marker.as_str(), TextStyle::ListMarker));
                    } else {
                        first.push(StyledSpan::plain(pad.as_str()));
                    }
                    rest.push(StyledSpan::plain(pad));
                }
            }
        }
        (first, rest)
    }

    fn consume_markers(&mut self) {
        for container in self.containers.iter_mut() {
            if let Container::Item { marker_pending, .. } = container {
                *marker_pending = false;
            }
        }
    }

    fn emit_wrapped(&mut self, spans: Vec<StyledSpan>) {
        let (first, rest) = self.prefixes();
        let wrapped = wrap_spans(&spans, &first, &rest, self.width);
        self.lines.extend(wrapped);
        self.consume_markers();
    }

    fn emit_verbatim_spans(&mut self, spans: Vec<StyledSpan>) {
        let (mut line, _) = self.prefixes();
        line.extend(spans);
        self.lines.push(StyledLine::from_spans(line));
        self.consume_markers();
    }

    fn emit_table(&mut self, table: TableState) {
        let columns = table.rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return;
        }
        let mut widths = vec![0usize; columns];
        for row in &table.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(spans_width(cell));
            }
        }

        for (row_index, row) in table.rows.iter().enumerate() {
            let mut spans = Vec::new();
            for (i, width) in widths.iter().enumerate() {
                let cell = row.get(i).map(Vec::as_slice).unwrap_or(&[]);
                let style_override = (row_index < table.header_rows).then_some(TextStyle::Strong);
                for span in cell {
                    spans.push(StyledSpan::new(
                        span.text.as_str(),
                        style_override.unwrap_or(span.style),
                    ));
                }
                let pad = width.saturating_sub(spans_width(cell));
                if i + 1 < columns {
                    spans.push(StyledSpan::plain(" ".repeat(pad)));
                    spans.push(StyledSpan::new(" │ ", TextStyle::TableBorder));
                }
            }
            self.emit_verbatim_spans(spans);

            if row_index + 1 == table.header_rows {
                let separator = widths
                    .iter()
                    .map(|w| "─".repeat(*w))
                    .collect::<Vec<_>>()
                    .join("─┼─");
                self.emit_verbatim_spans(vec![StyledSpan::new(separator, TextStyle::TableBorder)]);
            }
        }
    }
}

fn spans_width(spans: &[StyledSpan]) -> usize {
    spans.iter().map(|s| s.text.width()).sum()
}

/// Append text, merging with the previous span when the style matches.
fn push_span(spans: &mut Vec<StyledSpan>, text: &str, style: TextStyle) {
    if text.is_empty() {
        return;
    }
    match spans.last_mut() {
        Some(last) if last.style == style => last.text.push_str(text),
        _ => spans.push(StyledSpan::new(text, style)),
    }
}

struct Word {
    spans: Vec<StyledSpan>,
    width: usize,
    space_before: bool,
}

/// Split styled text at whitespace. A word may span several styles (`**a**b`).
fn split_words(spans: &[StyledSpan]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current: Option<Word> = None;
    let mut pending_space = false;

    for span in spans {
        for ch in span.text.chars() {
            if ch.is_whitespace() {
                if let Some(word) = current.take() {
                    words.push(word);
                }
                pending_space = true;
                continue;
            }
            let word = current.get_or_insert_with(|| Word {
                spans: Vec::new(),
                width: 0,
                space_before: std::mem::take(&mut pending_space),
            });
            let mut buf = [0u8; 4];
            push_span(&mut word.spans, ch.encode_utf8(&mut buf), span.style);
            word.width += ch.width().unwrap_or(0);
        }
    }
    if let Some(word) = current {
        words.push(word);
    }
    words
}

/// Greedy wrap of styled text with separate prefixes for the first and following lines.
///
/// Always returns at least one line. Words wider than the line are not broken.
fn wrap_spans(
    spans: &[StyledSpan],
    first_prefix: &[StyledSpan],
    rest_prefix: &[StyledSpan],
    width: usize,
) -> Vec<StyledLine> {
    let first_avail = width.saturating_sub(spans_width(first_prefix)).max(1);
    let rest_avail = width.saturating_sub(spans_width(rest_prefix)).max(1);

    let mut lines: Vec<StyledLine> = Vec::new();
    let mut current: Vec<StyledSpan> = Vec::new();
    let mut current_width = 0usize;

    let finish_line = |lines: &mut Vec<StyledLine>, content: Vec<StyledSpan>| {
        let prefix = if lines.is_empty() {
            first_prefix
        } else {
            rest_prefix
        };
        let mut line = prefix.to_vec();
        line.extend(content);
        lines.push(StyledLine::from_spans(line));
    };

    for word in split_words(spans) {
        let avail = if lines.is_empty() {
            first_avail
        } else {
            rest_avail
        };
        let gap = usize::from(word.space_before && !current.is_empty());
        if !current.is_empty() && current_width + gap + word.width > avail {
            finish_line(&mut lines, std::mem::take(&mut current));
            current_width = 0;
        } else if gap == 1 {
            // the space inherits the style only when both neighbours share it
            let space_style = match (current.last(), word.spans.first()) {
                (Some(prev), Some(next)) if prev.style == next.style => prev.style,
                _ => TextStyle::Plain,
            };
            push_span(&mut current, " ", space_style);
            current_width += 1;
        }
        for span in word.spans {
            push_span(&mut current, &span.text, span.style);
        }
        current_width += word.width;
    }
    if !current.is_empty() || lines.is_empty() {
        finish_line(&mut lines, current);
    }
    lines
}
