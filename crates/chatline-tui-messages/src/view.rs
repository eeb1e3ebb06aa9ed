//! The message view: applies agent events to the items and owns the viewport.

use std::time::Instant;

use chatline_tui_core::{RenderContext, ScrollKeymap, ViewConfig};
use chatline_tui_render::{display_width, line_text};
use crossterm::event::KeyEvent;
use ratatui::{layout::Alignment, layout::Rect, widgets::Paragraph, Frame};
use tracing::debug;

use crate::blocks::{Divider, RunInfo, TextBlock, ThinkingBlock, UserBlock};
use crate::event::{is_cancel_reason, AgentEvent};
use crate::hit_test::ClickOutcome;
use crate::item::{ItemKind, MessageItem};
use crate::lifecycle::cancel_in_flight;
use crate::spinner::Spinner;
use crate::tool::ToolStatus;
use crate::tool_index::ToolCallIndex;
use crate::viewport::ScrollViewport;

/// Side effects the host application has to carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEffect {
    OpenSubagent {
        session_id: String,
        subagent_type: String,
    },
}

#[derive(Debug, Clone)]
pub struct MessageView {
    viewport: ScrollViewport,
    index: ToolCallIndex,
    ctx: RenderContext,
    spinner: Spinner,
    /// Full area including the spinner row.
    area: Rect,
    next_id: u64,
    thinking_started: Option<Instant>,
}

impl Default for MessageView {
    fn default() -> Self {
        Self::new(RenderContext::default(), ScrollKeymap::default())
    }
}

impl MessageView {
    pub fn new(ctx: RenderContext, keymap: ScrollKeymap) -> Self {
        Self {
            viewport: ScrollViewport::new(keymap),
            index: ToolCallIndex::new(),
            ctx,
            spinner: Spinner::new(),
            area: Rect::default(),
            next_id: 0,
            thinking_started: None,
        }
    }

    pub fn from_config(config: &ViewConfig) -> Self {
        Self::new(config.render_context(), ScrollKeymap::new(&config.keybinds))
    }

    pub fn items(&self) -> &[MessageItem] {
        self.viewport.items()
    }

    pub fn viewport(&self) -> &ScrollViewport {
        &self.viewport
    }

    pub fn tool_index(&self) -> &ToolCallIndex {
        &self.index
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    /// Swap theme or settings. Every cached render is dropped.
    pub fn set_context(&mut self, ctx: RenderContext) {
        self.ctx = ctx;
        self.viewport.mutate(&self.ctx, |items| {
            items.iter_mut().for_each(MessageItem::invalidate);
        });
    }

    pub fn is_busy(&self) -> bool {
        self.spinner.is_active()
    }

    pub fn spinner(&self) -> &Spinner {
        &self.spinner
    }

    pub fn is_focused(&self) -> bool {
        self.viewport.is_focused()
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.viewport.set_focused(focused);
    }

    /// Apply one inbound event.
    pub fn apply(&mut self, event: AgentEvent) {
        debug!(event = event.name(), items = self.viewport.len(), "Applying event");
        match event {
            AgentEvent::AppendText { text } => self.append_text(text),
            AgentEvent::AppendThinking { text } => self.append_thinking(text),
            AgentEvent::ToolCall(update) => {
                self.finish_thinking();
                let id = self.alloc_id();
                let index = &mut self.index;
                self.viewport
                    .mutate(&self.ctx, |items| index.apply(items, update, move || id));
            }
            AgentEvent::UserMessage { text } => {
                self.push(ItemKind::User(UserBlock::new(text)));
            }
            AgentEvent::Divider { iteration } => {
                self.push(ItemKind::Divider(Divider { iteration }));
            }
            AgentEvent::Finish {
                duration_ms,
                model,
                provider,
                error,
                reason,
            } => {
                self.finish_thinking();
                self.spinner.stop();
                let canceled = reason.as_deref().is_some_and(is_cancel_reason);
                let info = RunInfo {
                    model,
                    provider,
                    duration_ms,
                    error,
                    canceled,
                };
                let id = self.alloc_id();
                self.viewport.mutate(&self.ctx, |items| {
                    if canceled {
                        cancel_in_flight(items);
                    }
                    items.push(MessageItem::new(id, ItemKind::Info(info)));
                });
            }
            AgentEvent::MarkToolError { call_id } => self.mark_tool(&call_id, ToolStatus::Error),
            AgentEvent::MarkToolCanceled { call_id } => {
                self.mark_tool(&call_id, ToolStatus::Canceled)
            }
            AgentEvent::Clear => {
                self.viewport.clear();
                self.index.clear();
                self.spinner.stop();
                self.thinking_started = None;
            }
        }
        self.sync_size();
    }

    /// Text chunks extend the trailing Text item. An empty chunk only starts the spinner.
    fn append_text(&mut self, text: String) {
        if text.is_empty() {
            self.spinner.start("Working…");
            return;
        }
        self.spinner.stop();
        self.finish_thinking();

        let id = self.alloc_id();
        self.viewport.mutate(&self.ctx, |items| {
            if let Some(last) = items.last_mut() {
                if matches!(last.kind(), ItemKind::Text(_)) {
                    last.edit(|kind| {
                        if let ItemKind::Text(block) = kind {
                            block.content.push_str(&text);
                        }
                    });
                    return;
                }
            }
            items.push(MessageItem::new(id, ItemKind::Text(TextBlock::new(text))));
        });
    }

    fn append_thinking(&mut self, text: String) {
        self.thinking_started.get_or_insert_with(Instant::now);
        if text.is_empty() {
            self.spinner.start("Thinking…");
            return;
        }
        self.spinner.stop();

        let id = self.alloc_id();
        self.viewport.mutate(&self.ctx, |items| {
            if let Some(last) = items.last_mut() {
                if matches!(last.kind(), ItemKind::Thinking(block) if !block.finished) {
                    last.edit(|kind| {
                        if let ItemKind::Thinking(block) = kind {
                            block.content.push_str(&text);
                        }
                    });
                    return;
                }
            }
            items.push(MessageItem::new(id, ItemKind::Thinking(ThinkingBlock::new(text))));
        });
    }

    /// Close the trailing open Thinking item, stamping its duration.
    fn finish_thinking(&mut self) {
        let started = self.thinking_started.take();
        let open = self
            .viewport
            .items()
            .iter()
            .rposition(|item| matches!(item.kind(), ItemKind::Thinking(block) if !block.finished));
        let Some(position) = open else {
            return;
        };

        let duration_ms = started.map(|s| s.elapsed().as_millis() as u64);
        self.viewport.mutate(&self.ctx, |items| {
            items[position].edit(|kind| {
                if let ItemKind::Thinking(block) = kind {
                    block.finish(duration_ms);
                }
            });
        });
    }

    fn mark_tool(&mut self, call_id: &str, status: ToolStatus) {
        let index = &self.index;
        self.viewport
            .mutate(&self.ctx, |items| index.set_status(items, call_id, status));
    }

    fn push(&mut self, kind: ItemKind) {
        let id = self.alloc_id();
        self.viewport
            .mutate(&self.ctx, |items| items.push(MessageItem::new(id, kind)));
    }

    fn alloc_id(&mut self) -> String {
        self.next_id += 1;
        format!("msg-{}", self.next_id)
    }

    /// Message list area: the full area minus the spinner row while busy.
    fn message_area(&self, area: Rect) -> Rect {
        if self.spinner.is_active() && area.height > 1 {
            Rect {
                height: area.height - 1,
                ..area
            }
        } else {
            area
        }
    }

    fn sync_size(&mut self) {
        let area = self.message_area(self.area);
        self.viewport.update_size(area.width, area.height, &self.ctx);
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.area = Rect {
            width,
            height,
            ..self.area
        };
        self.sync_size();
    }

    /// Mouse wheel scrolling.
    pub fn scroll_by(&mut self, delta: isize) {
        self.viewport.scroll_by(delta);
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        self.viewport.handle_key(key)
    }

    /// Route a click. Only opening a subagent produces an effect.
    pub fn click(&mut self, x: u16, y: u16) -> Option<ViewEffect> {
        match self.viewport.click(x, y, &self.ctx) {
            ClickOutcome::OpenSubagent {
                session_id,
                subagent_type,
                ..
            } => Some(ViewEffect::OpenSubagent {
                session_id,
                subagent_type,
            }),
            ClickOutcome::Toggled(_) | ClickOutcome::Nothing => None,
        }
    }

    pub fn tick(&mut self) {
        self.spinner.tick();
    }

    pub fn draw(&mut self, frame: &mut Frame, area: Rect) {
        self.area = area;
        let messages = self.message_area(area);
        self.viewport.draw(frame, messages, &self.ctx);

        if messages.height < area.height {
            let row = Rect {
                y: messages.bottom(),
                height: 1,
                ..area
            };
            frame.render_widget(Paragraph::new(self.spinner.line(&self.ctx.theme)), row);
        }
    }

    /// Plain text of every item rendered at `width`. Caches are left untouched.
    pub fn transcript(&self, width: u16) -> String {
        let width = width.max(1);
        let mut out: Vec<String> = Vec::new();
        for item in self.viewport.items() {
            for line in item.render_fresh(width, &self.ctx) {
                let text = line_text(&line);
                let text = match line.alignment {
                    Some(Alignment::Right) => {
                        let pad = (width as usize).saturating_sub(display_width(&text));
                        format!("{}{}", " ".repeat(pad), text)
                    }
                    _ => text,
                };
                out.push(text.trim_end().to_string());
            }
        }
        while out.last().is_some_and(|l| l.is_empty()) {
            out.pop();
        }
        out.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::ToolCallUpdate;
    use ratatui::{backend::TestBackend, Terminal};

    fn text(s: &str) -> AgentEvent {
        AgentEvent::AppendText { text: s.to_string() }
    }

    fn thinking(s: &str) -> AgentEvent {
        AgentEvent::AppendThinking { text: s.to_string() }
    }

    fn tool(call_id: &str, status: &str) -> AgentEvent {
        AgentEvent::ToolCall(ToolCallUpdate {
            call_id: call_id.to_string(),
            status: status.to_string(),
            ..Default::default()
        })
    }

    fn finish(reason: Option<&str>) -> AgentEvent {
        AgentEvent::Finish {
            duration_ms: 1500,
            model: "m".to_string(),
            provider: "p".to_string(),
            error: None,
            reason: reason.map(str::to_string),
        }
    }

    #[test]
    fn test_text_after_tool_starts_new_item() {
        let mut view = MessageView::default();
        view.apply(text("before"));
        view.apply(tool("t1", "running"));
        view.apply(text("after"));
        let kinds: Vec<&str> = view.items().iter().map(|i| i.kind().name()).collect();
        assert_eq!(kinds, vec!["text", "tool", "text"]);
    }

    #[test]
    fn test_thinking_streams_into_one_block_and_finishes() {
        let mut view = MessageView::default();
        view.apply(thinking(""));
        assert_eq!(view.spinner().label(), "Thinking…");
        view.apply(thinking("first "));
        view.apply(thinking("second"));
        assert_eq!(view.items().len(), 1);
        view.apply(text("answer"));

        match view.items()[0].kind() {
            ItemKind::Thinking(block) => {
                assert_eq!(block.content, "first second");
                assert!(block.finished);
                assert!(block.duration_ms.is_some());
            }
            other => panic!("expected thinking, got {}", other.name()),
        }
    }

    #[test]
    fn test_finish_with_cancel_reason() {
        let mut view = MessageView::default();
        view.apply(tool("a", "running"));
        view.apply(tool("b", "completed"));
        view.apply(finish(Some("cancelled")));

        let statuses: Vec<ToolStatus> = view
            .items()
            .iter()
            .filter_map(|i| i.kind().tool().map(|t| t.status))
            .collect();
        assert_eq!(statuses, vec![ToolStatus::Canceled, ToolStatus::Success]);
        match view.items().last().map(MessageItem::kind) {
            Some(ItemKind::Info(info)) => assert!(info.canceled),
            _ => panic!("expected run info"),
        }
    }

    #[test]
    fn test_finish_without_reason_leaves_tools() {
        let mut view = MessageView::default();
        view.apply(tool("a", "running"));
        view.apply(finish(None));
        assert_eq!(
            view.items()[0].kind().tool().map(|t| t.status),
            Some(ToolStatus::Running)
        );
    }

    #[test]
    fn test_mark_tool_events() {
        let mut view = MessageView::default();
        view.apply(tool("a", "running"));
        view.apply(tool("b", "running"));
        view.apply(AgentEvent::MarkToolError { call_id: "a".to_string() });
        view.apply(AgentEvent::MarkToolCanceled { call_id: "b".to_string() });
        view.apply(AgentEvent::MarkToolCanceled { call_id: "zzz".to_string() });
        let statuses: Vec<ToolStatus> = view
            .items()
            .iter()
            .filter_map(|i| i.kind().tool().map(|t| t.status))
            .collect();
        assert_eq!(statuses, vec![ToolStatus::Error, ToolStatus::Canceled]);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut view = MessageView::default();
        view.apply(text(""));
        view.apply(tool("a", "running"));
        view.apply(AgentEvent::Clear);
        assert!(view.items().is_empty());
        assert!(view.tool_index().is_empty());
        assert!(!view.is_busy());

        view.apply(tool("a", "pending"));
        assert_eq!(view.items().len(), 1);
        assert_eq!(view.tool_index().get("a"), Some(0));
    }

    #[test]
    fn test_spinner_row_is_reserved_while_busy() {
        let mut view = MessageView::default();
        view.apply(AgentEvent::UserMessage { text: "hi".to_string() });
        view.apply(text(""));

        let mut terminal = Terminal::new(TestBackend::new(40, 6)).unwrap();
        terminal.draw(|frame| view.draw(frame, frame.area())).unwrap();
        assert_eq!(view.viewport().height(), 5);

        let buffer = terminal.backend().buffer();
        let last_row: String = (0..40).map(|x| buffer[(x, 5)].symbol().to_string()).collect();
        assert_eq!(last_row.trim_end(), "  ⠋ Working…");

        view.apply(text("done"));
        assert_eq!(view.viewport().height(), 6);
    }

    #[test]
    fn test_transcript_aligns_user_messages() {
        let mut view = MessageView::default();
        view.apply(AgentEvent::UserMessage { text: "hi".to_string() });
        view.apply(text("Hello"));
        let transcript = view.transcript(20);
        let lines: Vec<&str> = transcript.lines().collect();
        assert_eq!(lines[0], format!("{}hi", " ".repeat(17)));
        assert_eq!(lines[2], "  Hello");
        assert!(view.items().iter().all(|i| i.cached_width().is_none()));
    }

    #[test]
    fn test_set_context_invalidates() {
        let mut view = MessageView::default();
        view.resize(40, 10);
        view.apply(text("hello"));
        assert!(view.items()[0].is_cached_at(40));
        let generation = view.items()[0].render_generation();

        let mut ctx = RenderContext::default();
        ctx.settings.max_text_width = 10;
        view.set_context(ctx);
        assert_eq!(view.items()[0].render_generation(), generation + 1);
    }
}
