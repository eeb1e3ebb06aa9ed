//! Width-keyed render memoization.

use ratatui::text::Line;

/// Rendered lines of one item, valid for exactly one width.
///
/// A stored width of 0 means "nothing cached"; any content change must call
/// [`RenderCache::invalidate`] before the next render.
#[derive(Debug, Clone, Default)]
pub struct RenderCache {
    width: u16,
    lines: Vec<Line<'static>>,
    generation: u64,
}

impl RenderCache {
    /// True if the cached lines were rendered at `width`.
    pub fn is_valid(&self, width: u16) -> bool {
        self.width != 0 && self.width == width
    }

    pub fn store(&mut self, width: u16, lines: Vec<Line<'static>>) {
        self.width = width;
        self.lines = lines;
        self.generation += 1;
    }

    pub fn lines(&self) -> &[Line<'static>] {
        &self.lines
    }

    /// Width of the cached render, if any.
    pub fn width(&self) -> Option<u16> {
        (self.width != 0).then_some(self.width)
    }

    pub fn invalidate(&mut self) {
        self.width = 0;
        self.lines.clear();
    }

    /// Number of renders stored so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
