pub mod theme;

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use std::io::{self, Stdout};
use std::panic;

use crate::app::{App, FOOTER_HEIGHT, FOOTER_TEXT, HEADER_HEIGHT};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

pub fn setup_terminal() -> Result<Tui> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

pub fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// パニック時も端末を元に戻してからメッセージを出す
pub fn install_panic_hook() {
    let original = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original(info);
    }));
}

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT), // Header
            Constraint::Min(1),                // Thread body
            Constraint::Length(FOOTER_HEIGHT), // Footer
        ])
        .split(frame.area());

    render_header(frame, chunks[0], app);
    render_body(frame, chunks[1], app);
    render_footer(frame, chunks[2], app);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let color = app.color();
    let [summary, status] = app.header_lines();
    let summary_style = if color {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let status_style = theme::status_style(
        app.current_thread().is_some_and(|t| t.is_resolved),
        color && app.current_thread().is_some(),
    );
    let header = Paragraph::new(vec![
        Line::from(Span::styled(summary, summary_style)),
        Line::from(Span::styled(status, status_style)),
    ]);
    frame.render_widget(header, area);
}

fn render_body(frame: &mut Frame, area: Rect, app: &App) {
    let color = app.color();
    let lines: Vec<Line> = app
        .content()
        .get(app.viewport.visible_range())
        .unwrap_or_default()
        .iter()
        .map(|line| theme::to_line(line, color))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let style = if app.color() {
        Style::default().add_modifier(Modifier::DIM)
    } else {
        Style::default()
    };
    frame.render_widget(Paragraph::new(Span::styled(FOOTER_TEXT, style)), area);
}
