use std::ops::Range;

/// Scroll commands understood by the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAction {
    LineUp,
    LineDown,
    PageUp,
    PageDown,
    HalfPageUp,
    HalfPageDown,
    Top,
    Bottom,
}

/// スレッド本文のスクロール領域
///
/// `offset` は常に `0..=max(0, content_len - height)` に収まる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    offset: usize,
    height: usize,
    content_len: usize,
}

impl Viewport {
    pub fn new(height: usize) -> Self {
        Self {
            offset: 0,
            height: height.max(1),
            content_len: 0,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn set_height(&mut self, height: usize) {
        self.height = height.max(1);
        self.clamp();
    }

    pub fn set_content_len(&mut self, len: usize) {
        self.content_len = len;
        self.clamp();
    }

    pub fn goto_top(&mut self) {
        self.offset = 0;
    }

    pub fn max_offset(&self) -> usize {
        self.content_len.saturating_sub(self.height)
    }

    /// Line indices currently on screen
    pub fn visible_range(&self) -> Range<usize> {
        let end = (self.offset + self.height).min(self.content_len);
        self.offset.min(end)..end
    }

    /// Returns whether the offset changed.
    pub fn apply(&mut self, action: ScrollAction) -> bool {
        let half = (self.height / 2).max(1);
        let before = self.offset;
        self.offset = match action {
            ScrollAction::LineUp => self.offset.saturating_sub(1),
            ScrollAction::LineDown => self.offset + 1,
            ScrollAction::PageUp => self.offset.saturating_sub(self.height),
            ScrollAction::PageDown => self.offset + self.height,
            ScrollAction::HalfPageUp => self.offset.saturating_sub(half),
            ScrollAction::HalfPageDown => self.offset + half,
            ScrollAction::Top => 0,
            ScrollAction::Bottom => self.max_offset(),
        };
        self.clamp();
        self.offset != before
    }

    fn clamp(&mut self) {
        self.offset = self.offset.min(self.max_offset());
    }
}
