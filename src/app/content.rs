use tracing::debug;

use crate::github::Thread;
use crate::render::{render_thread, RendererPool, StyledLine, NO_THREADS_MESSAGE};

use super::App;

impl App {
    /// 現在のスレッドの本文を（キャッシュ経由で）作り直し、スクロール範囲を更新する
    pub(crate) fn refresh_content(&mut self) {
        let width = self.width;
        let lines = match self.cursor.index().and_then(|i| self.store.visible(i)) {
            None => vec![StyledLine::plain(NO_THREADS_MESSAGE)],
            Some(thread) => {
                let markdown = self.markdown;
                let renderers = &mut self.renderers;
                let before = self.cache.misses();
                let lines = self.cache.get_or_insert_with(&thread.id, width, || {
                    build_thread_content(thread, width, markdown, renderers)
                });
                if self.cache.misses() == before {
                    debug!(thread = %thread.id, width, "content cache hit");
                }
                lines
            }
        };
        self.viewport.set_content_len(lines.len());
        self.content = lines;
    }

    /// Lines of the current thread, cached per width.
    pub fn content(&self) -> &[StyledLine] {
        &self.content
    }

    /// Times the rendering pipeline actually ran.
    pub fn render_calls(&self) -> usize {
        self.cache.misses()
    }
}

fn build_thread_content(
    thread: &Thread,
    width: usize,
    markdown: bool,
    renderers: &mut RendererPool,
) -> Vec<StyledLine> {
    debug!(thread = %thread.id, width, "rendering thread");
    let renderer = if markdown {
        renderers.renderer_for_width(width)
    } else {
        None
    };
    render_thread(thread, width, renderer)
}
