use anyhow::Result;
use crossterm::event::{self, Event};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::filter::FilterMode;
use crate::github::{RepoRef, Thread};
use crate::render::{RenderCache, RendererPool, StyledLine};
use crate::{term, ui};

mod content;
mod input;
mod navigation;
mod store;
mod viewport;

pub use input::{action_for_key, Action, BrowserEvent};
pub use navigation::Cursor;
pub use store::ThreadStore;
pub use viewport::{ScrollAction, Viewport};

/// ヘッダー行数（リポジトリ行 + スレッド行）
pub const HEADER_HEIGHT: u16 = 2;
/// フッター行数（キー操作の凡例）
pub const FOOTER_HEIGHT: u16 = 1;
/// 端末幅が取れないときの描画幅
pub const DEFAULT_WIDTH: usize = 120;

pub const FOOTER_TEXT: &str = "j/k next/prev  g/G first/last  f filter  up/down scroll  q quit";

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// How thread bodies are rendered
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Use the markdown renderer (falls back to plain reflow when off)
    pub markdown: bool,
    pub color: bool,
    pub theme: String,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            markdown: true,
            color: true,
            theme: "dark".to_owned(),
        }
    }
}

/// Interactive review thread browser.
pub struct App {
    pub repo: RepoRef,
    pub pr_number: u32,
    store: ThreadStore,
    cursor: Cursor,
    pub viewport: Viewport,
    /// 本文の描画幅（端末の列数）
    width: usize,
    cache: RenderCache<Vec<StyledLine>>,
    renderers: RendererPool,
    markdown: bool,
    color: bool,
    content: Vec<StyledLine>,
    pub should_quit: bool,
}

impl App {
    /// `size` is the terminal size in columns and rows.
    pub fn new(
        repo: RepoRef,
        pr_number: u32,
        threads: Vec<Thread>,
        mode: FilterMode,
        options: BrowserOptions,
        size: (u16, u16),
    ) -> Self {
        let store = ThreadStore::new(threads, mode);
        let cursor = Cursor::for_len(store.visible_len());
        let mut app = Self {
            repo,
            pr_number,
            store,
            cursor,
            viewport: Viewport::new(1),
            width: DEFAULT_WIDTH,
            cache: RenderCache::new(),
            renderers: RendererPool::new(options.theme),
            markdown: options.markdown,
            color: options.color,
            content: Vec::new(),
            should_quit: false,
        };
        app.resize(size.0, size.1);
        app.refresh_content();
        app
    }

    /// イベントを1つ処理する。再描画が必要なら true
    pub fn handle(&mut self, event: BrowserEvent) -> bool {
        match event {
            BrowserEvent::Resize(columns, rows) => {
                self.resize(columns, rows);
                self.refresh_content();
                true
            }
            BrowserEvent::Key(key) => match action_for_key(&key) {
                Some(action) => self.apply(action),
                None => false,
            },
        }
    }

    pub fn apply(&mut self, action: Action) -> bool {
        let len = self.store.visible_len();
        let moved = match action {
            Action::Quit => {
                self.should_quit = true;
                return false;
            }
            Action::Scroll(scroll) => return self.viewport.apply(scroll),
            Action::CycleFilter => {
                self.cycle_filter();
                return true;
            }
            Action::Next => self.cursor.next(len),
            Action::Prev => self.cursor.prev(),
            Action::First => self.cursor.first(),
            Action::Last => self.cursor.last(len),
        };
        if moved {
            self.thread_changed();
        }
        moved
    }

    fn cycle_filter(&mut self) {
        let mode = self.store.mode().next();
        let visible = self.store.set_mode(mode);
        self.cursor.filter_changed(visible);
        info!(%mode, visible, "filter changed");
        self.thread_changed();
    }

    fn thread_changed(&mut self) {
        self.viewport.goto_top();
        self.refresh_content();
    }

    fn resize(&mut self, columns: u16, rows: u16) {
        self.width = if columns == 0 {
            DEFAULT_WIDTH
        } else {
            usize::from(columns)
        };
        let chrome = HEADER_HEIGHT + FOOTER_HEIGHT;
        self.viewport
            .set_height(usize::from(rows.saturating_sub(chrome)).max(1));
        debug!(width = self.width, height = self.viewport.height(), "viewport resized");
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.store.mode()
    }

    pub fn store(&self) -> &ThreadStore {
        &self.store
    }

    pub fn color(&self) -> bool {
        self.color
    }

    pub fn current_thread(&self) -> Option<&Thread> {
        self.cursor.index().and_then(|i| self.store.visible(i))
    }

    /// Two header lines: repository summary and current thread status.
    pub fn header_lines(&self) -> [String; 2] {
        let summary = format!(
            "Repo: {}  PR: #{}  Threads: {} (filter: {})",
            self.repo,
            self.pr_number,
            self.store.visible_len(),
            self.store.mode()
        );
        let status = match (self.cursor.index(), self.current_thread()) {
            (Some(index), Some(thread)) => {
                let mut line = format!(
                    "Thread {}/{}  {}",
                    index + 1,
                    self.store.visible_len(),
                    thread.status_label()
                );
                if thread.is_outdated {
                    line.push_str(" (outdated)");
                }
                if let Some(locator) = thread.locator() {
                    line.push_str(&format!(" [{}]", locator));
                }
                line
            }
            _ => "No threads".to_owned(),
        };
        [summary, status]
    }

    pub async fn run(&mut self) -> Result<()> {
        ui::install_panic_hook();
        let mut terminal = ui::setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        ui::restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut ui::Tui) -> Result<()> {
        let mut dirty = true;
        while !self.should_quit {
            if dirty {
                terminal.draw(|frame| ui::render(frame, self))?;
                dirty = false;
            }
            if !event::poll(POLL_INTERVAL)? {
                continue;
            }
            dirty = match event::read()? {
                Event::Key(key) => self.handle(BrowserEvent::Key(key)),
                Event::Resize(columns, rows) => {
                    self.handle(resize_event((columns, rows), term::terminal_size()))
                }
                _ => false,
            };
        }
        Ok(())
    }
}

/// リサイズ時は通知値ではなく現在のサイズを取り直す。取得に失敗したら通知値を使う
fn resize_event(reported: (u16, u16), probed: Result<(u16, u16)>) -> BrowserEvent {
    let (columns, rows) = probed.unwrap_or_else(|err| {
        warn!(error = %err, "terminal size query failed, using resize event size");
        reported
    });
    BrowserEvent::Resize(columns, rows)
}
