//! Virtualized scroll viewport over the message items.
//!
//! The viewport owns the item sequence and a prefix-sum table of rendered
//! heights (`line_starts`). The table is rebuilt after every mutation; items
//! whose cache already matches the width are not re-rendered, so a rebuild
//! after a single append or status update only renders that one item.

use std::ops::Range;

use chatline_tui_core::{RenderContext, ScrollAction, ScrollKeymap};
use chatline_util::TimingGuard;
use crossterm::event::KeyEvent;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tracing::{debug, trace};

use crate::hit_test::item_index_for_line;
use crate::item::MessageItem;

#[derive(Debug, Clone)]
pub struct ScrollViewport {
    items: Vec<MessageItem>,
    /// `line_starts[i]` = rendered lines before item `i`.
    line_starts: Vec<usize>,
    total_lines: usize,
    /// First visible content line.
    offset: usize,
    /// Pin to the bottom when content grows.
    auto_scroll: bool,
    focused: bool,
    width: u16,
    height: u16,
    /// Area of the last draw, used to reject clicks.
    last_area: Option<Rect>,
    keymap: ScrollKeymap,
}

impl Default for ScrollViewport {
    fn default() -> Self {
        Self::new(ScrollKeymap::default())
    }
}

impl ScrollViewport {
    pub fn new(keymap: ScrollKeymap) -> Self {
        Self {
            items: Vec::new(),
            line_starts: Vec::new(),
            total_lines: 0,
            offset: 0,
            auto_scroll: true,
            focused: false,
            width: 0,
            height: 0,
            last_area: None,
            keymap,
        }
    }

    pub fn items(&self) -> &[MessageItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn line_starts(&self) -> &[usize] {
        &self.line_starts
    }

    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn last_area(&self) -> Option<Rect> {
        self.last_area
    }

    pub fn set_keymap(&mut self, keymap: ScrollKeymap) {
        self.keymap = keymap;
    }

    /// Largest valid offset: `total_lines - height`, floored at 0.
    pub fn max_offset(&self) -> usize {
        self.total_lines.saturating_sub(self.height as usize)
    }

    pub fn is_at_bottom(&self) -> bool {
        self.offset >= self.max_offset()
    }

    /// Content lines currently on screen.
    pub fn visible_range(&self) -> Range<usize> {
        let end = (self.offset + self.height as usize).min(self.total_lines);
        self.offset.min(end)..end
    }

    /// Mutate the item sequence, then rebuild the layout.
    ///
    /// With auto-scroll on, the offset is pinned to the bottom afterwards.
    pub fn mutate<R>(
        &mut self,
        ctx: &RenderContext,
        f: impl FnOnce(&mut Vec<MessageItem>) -> R,
    ) -> R {
        let result = f(&mut self.items);
        self.recompute(ctx);
        result
    }

    /// Rebuild `line_starts`, rendering only items with a stale cache.
    pub fn recompute(&mut self, ctx: &RenderContext) {
        self.line_starts.clear();
        self.line_starts.reserve(self.items.len());

        let mut total = 0;
        if self.width == 0 {
            // Not laid out yet; heights are unknown.
            self.line_starts.resize(self.items.len(), 0);
        } else {
            for item in &mut self.items {
                self.line_starts.push(total);
                total += item.render(self.width, ctx).len();
            }
        }
        self.total_lines = total;

        if self.auto_scroll {
            self.offset = self.max_offset();
        } else {
            self.offset = self.offset.min(self.max_offset());
        }
        trace!(
            items = self.items.len(),
            total_lines = total,
            width = self.width,
            offset = self.offset,
            "Viewport recomputed"
        );
    }

    /// Apply new dimensions. Items re-render lazily through their width-keyed caches.
    pub fn update_size(&mut self, width: u16, height: u16, ctx: &RenderContext) {
        if width == self.width && height == self.height {
            return;
        }
        debug!(width, height, "Viewport resized");
        self.width = width;
        self.height = height;
        self.recompute(ctx);
    }

    /// Scroll by `delta` lines, clamped to `[0, max_offset]`.
    pub fn scroll_by(&mut self, delta: isize) {
        let max = self.max_offset();
        self.offset = self.offset.saturating_add_signed(delta).min(max);
        self.auto_scroll = self.offset >= max;
    }

    pub fn goto_top(&mut self) {
        self.offset = 0;
        self.auto_scroll = self.max_offset() == 0;
    }

    pub fn goto_bottom(&mut self) {
        self.offset = self.max_offset();
        self.auto_scroll = true;
    }

    /// Route a key press. Paging keys are ignored unless focused.
    ///
    /// Returns true when the key was consumed.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        let Some(action) = self.keymap.find_action(key) else {
            return false;
        };
        if action.is_paging() && !self.focused {
            return false;
        }

        let page = (self.height as isize).max(1);
        let half = (page / 2).max(1);
        match action {
            ScrollAction::LineUp => self.scroll_by(-1),
            ScrollAction::LineDown => self.scroll_by(1),
            ScrollAction::HalfPageUp => self.scroll_by(-half),
            ScrollAction::HalfPageDown => self.scroll_by(half),
            ScrollAction::PageUp => self.scroll_by(-page),
            ScrollAction::PageDown => self.scroll_by(page),
            ScrollAction::Top => self.goto_top(),
            ScrollAction::Bottom => self.goto_bottom(),
        }
        trace!(action = action.as_str(), offset = self.offset, "Scroll key");
        true
    }

    /// Remove every item and reset scrolling.
    pub fn clear(&mut self) {
        self.items.clear();
        self.line_starts.clear();
        self.total_lines = 0;
        self.offset = 0;
        self.auto_scroll = true;
    }

    /// Toggle one item's expansion and rebuild the layout.
    pub(crate) fn toggle_item(&mut self, index: usize, ctx: &RenderContext) -> bool {
        let toggled = self
            .items
            .get_mut(index)
            .is_some_and(|item| item.toggle_expanded());
        if toggled {
            self.recompute(ctx);
        }
        toggled
    }

    /// Lines visible at the current offset, cloned from the item caches.
    pub fn visible_lines(&mut self, ctx: &RenderContext) -> Vec<Line<'static>> {
        let range = self.visible_range();
        let mut lines = Vec::with_capacity(range.len());
        let Some(first) = item_index_for_line(&self.line_starts, self.total_lines, range.start)
        else {
            return lines;
        };

        for index in first..self.items.len() {
            let start = self.line_starts[index];
            if start >= range.end {
                break;
            }
            let skip = range.start.saturating_sub(start);
            let take = range.end - start.max(range.start);
            lines.extend(
                self.items[index]
                    .render(self.width, ctx)
                    .iter()
                    .skip(skip)
                    .take(take)
                    .cloned(),
            );
        }
        lines
    }

    /// Draw the visible slice into `area`.
    pub fn draw(&mut self, frame: &mut Frame, area: Rect, ctx: &RenderContext) {
        let _timer = TimingGuard::frame("messages");
        self.last_area = Some(area);
        self.update_size(area.width, area.height, ctx);

        let lines = self.visible_lines(ctx);
        frame.render_widget(Paragraph::new(lines), area);

        if ctx.settings.show_scroll_indicator && self.total_lines > self.height as usize {
            let label = format!(" {}% ", self.scroll_percent());
            let label_width = (label.len() as u16).min(area.width);
            let indicator = Rect {
                x: area.x + area.width - label_width,
                y: area.y,
                width: label_width,
                height: 1,
            };
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(label, ctx.theme.muted_style()))),
                indicator,
            );
        }
    }

    /// Position as a percentage of the scrollable range.
    pub fn scroll_percent(&self) -> usize {
        match self.max_offset() {
            0 => 100,
            max => self.offset * 100 / max,
        }
    }
}
