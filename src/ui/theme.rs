use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use crate::render::{StyledLine, TextStyle};

/// TextStyle を ratatui の Style に変換。`color` が false なら装飾なし
pub fn style_for(style: TextStyle, color: bool) -> Style {
    if !color {
        return Style::default();
    }
    let base = Style::default();
    match style {
        TextStyle::Plain => base,
        TextStyle::Heading => base.fg(Color::Cyan).add_modifier(Modifier::BOLD),
        TextStyle::Strong => base.add_modifier(Modifier::BOLD),
        TextStyle::Emphasis => base.add_modifier(Modifier::ITALIC),
        TextStyle::Strikethrough => base.add_modifier(Modifier::CROSSED_OUT),
        TextStyle::InlineCode => base.fg(Color::Yellow),
        TextStyle::CodeBlock => base.fg(Color::Green),
        TextStyle::Link => base.fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
        TextStyle::Quote => base.fg(Color::DarkGray),
        TextStyle::ListMarker => base.fg(Color::Cyan),
        TextStyle::Rule | TextStyle::TableBorder => base.fg(Color::DarkGray),
        TextStyle::Author => base.fg(Color::Blue),
        TextStyle::Dim | TextStyle::Bullet => base.add_modifier(Modifier::DIM),
    }
}

pub fn to_line(line: &StyledLine, color: bool) -> Line<'static> {
    Line::from(
        line.spans
            .iter()
            .map(|span| Span::styled(span.text.clone(), style_for(span.style, color)))
            .collect::<Vec<_>>(),
    )
}

pub fn status_style(resolved: bool, color: bool) -> Style {
    match (color, resolved) {
        (false, _) => Style::default(),
        (true, true) => Style::default().fg(Color::Green),
        (true, false) => Style::default().fg(Color::Red),
    }
}
