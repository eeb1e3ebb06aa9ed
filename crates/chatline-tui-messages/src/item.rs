//! The message item model.
//!
//! Every entry in the conversation is a [`MessageItem`]: an immutable id, a
//! closed set of content variants, and a render cache keyed by width.

use chatline_tui_core::RenderContext;
use ratatui::text::Line;

use crate::blocks::{Divider, RunInfo, TextBlock, ThinkingBlock, UserBlock};
use crate::cache::RenderCache;
use crate::tool::{SubagentItem, ToolItem};

/// Items that can be expanded and collapsed by clicking.
pub trait Expandable {
    fn is_expanded(&self) -> bool;
    fn toggle_expanded(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Text(TextBlock),
    User(UserBlock),
    Thinking(ThinkingBlock),
    Tool(ToolItem),
    Subagent(SubagentItem),
    Info(RunInfo),
    Divider(Divider),
}

impl ItemKind {
    pub fn name(&self) -> &'static str {
        match self {
            ItemKind::Text(_) => "text",
            ItemKind::User(_) => "user",
            ItemKind::Thinking(_) => "thinking",
            ItemKind::Tool(_) => "tool",
            ItemKind::Subagent(_) => "subagent",
            ItemKind::Info(_) => "info",
            ItemKind::Divider(_) => "divider",
        }
    }

    pub fn as_expandable(&self) -> Option<&dyn Expandable> {
        match self {
            ItemKind::Thinking(t) => Some(t),
            ItemKind::Tool(t) => Some(t),
            ItemKind::Subagent(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_expandable_mut(&mut self) -> Option<&mut dyn Expandable> {
        match self {
            ItemKind::Thinking(t) => Some(t),
            ItemKind::Tool(t) => Some(t),
            ItemKind::Subagent(s) => Some(s),
            _ => None,
        }
    }

    /// The tool record behind a Tool or Subagent item.
    pub fn tool(&self) -> Option<&ToolItem> {
        match self {
            ItemKind::Tool(t) => Some(t),
            ItemKind::Subagent(s) => Some(&s.tool),
            _ => None,
        }
    }

    fn render(&self, width: u16, ctx: &RenderContext) -> Vec<Line<'static>> {
        match self {
            ItemKind::Text(t) => t.render(width, ctx),
            ItemKind::User(u) => u.render(width, ctx),
            ItemKind::Thinking(t) => t.render(width, ctx),
            ItemKind::Tool(t) => t.render(width, ctx),
            ItemKind::Subagent(s) => s.render(width, ctx),
            ItemKind::Info(i) => i.render(width, ctx),
            ItemKind::Divider(d) => d.render(width, ctx),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MessageItem {
    id: String,
    kind: ItemKind,
    cache: RenderCache,
}

impl MessageItem {
    pub fn new(id: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: id.into(),
            kind,
            cache: RenderCache::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    /// Mutate the content. The cache is always invalidated.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut ItemKind) -> R) -> R {
        let result = f(&mut self.kind);
        self.cache.invalidate();
        result
    }

    /// Drop the cached render, e.g. after a theme change.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    /// Swap the variant in place, keeping the id.
    pub fn replace_kind(&mut self, kind: ItemKind) -> ItemKind {
        let old = std::mem::replace(&mut self.kind, kind);
        self.cache.invalidate();
        old
    }

    /// Rendered lines at `width`, reusing the cache when it matches.
    pub fn render(&mut self, width: u16, ctx: &RenderContext) -> &[Line<'static>] {
        let width = width.max(1);
        if !self.cache.is_valid(width) {
            let lines = self.render_fresh(width, ctx);
            tracing::trace!(id = %self.id, kind = self.kind.name(), width, lines = lines.len(), "Rendered item");
            self.cache.store(width, lines);
        }
        self.cache.lines()
    }

    /// Render without touching the cache. Every item ends with a blank spacer line.
    pub fn render_fresh(&self, width: u16, ctx: &RenderContext) -> Vec<Line<'static>> {
        let mut lines = self.kind.render(width.max(1), ctx);
        lines.push(Line::default());
        lines
    }

    /// Line count of the last render, 0 before the first one.
    pub fn height(&self) -> usize {
        match self.cache.width() {
            Some(_) => self.cache.lines().len(),
            None => 0,
        }
    }

    pub fn is_cached_at(&self, width: u16) -> bool {
        self.cache.is_valid(width)
    }

    pub fn cached_width(&self) -> Option<u16> {
        self.cache.width()
    }

    /// Number of times this item has been rendered into its cache.
    pub fn render_generation(&self) -> u64 {
        self.cache.generation()
    }

    pub fn is_expandable(&self) -> bool {
        self.kind.as_expandable().is_some()
    }

    pub fn is_expanded(&self) -> Option<bool> {
        self.kind.as_expandable().map(|e| e.is_expanded())
    }

    /// Toggle expansion. Returns false for items that cannot expand.
    pub fn toggle_expanded(&mut self) -> bool {
        match self.kind.as_expandable_mut() {
            Some(item) => {
                item.toggle_expanded();
                self.cache.invalidate();
                true
            }
            None => false,
        }
    }
}
