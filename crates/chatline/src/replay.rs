//! `chatline replay`: feed a recorded event stream into a live message view.

use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use chatline_tui_core::{is_quit, Event, EventHandler, ViewConfig};
use chatline_tui_messages::{parse_jsonl, AgentEvent, MessageView, ViewEffect};
use crossterm::event::{KeyCode, MouseButton, MouseEventKind};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::terminal;

const TICK_RATE: Duration = Duration::from_millis(80);
const WHEEL_LINES: isize = 3;

pub fn load_events(path: &Path) -> anyhow::Result<Vec<AgentEvent>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_jsonl(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Apply every event and render the transcript at `width`.
pub fn transcript(config: &ViewConfig, events: Vec<AgentEvent>, width: u16) -> String {
    Replay::new(config, events, true).view.transcript(width)
}

pub async fn run(config: &ViewConfig, events: Vec<AgentEvent>, instant: bool) -> anyhow::Result<()> {
    let mut tui = terminal::setup().context("Failed to set up terminal")?;
    let mut replay = Replay::new(config, events, instant);

    let mut events = EventHandler::new(TICK_RATE);
    let event_loop = events.start();

    let result = async {
        tui.draw(|frame| replay.draw(frame))?;
        while let Some(event) = events.next().await {
            if !replay.handle(event) {
                break;
            }
            tui.draw(|frame| replay.draw(frame))?;
        }
        Ok::<(), std::io::Error>(())
    }
    .await;

    event_loop.stop().await;
    terminal::restore();
    result.context("Terminal I/O failed")
}

/// Replay state: the view plus the events not yet applied.
struct Replay {
    view: MessageView,
    pending: VecDeque<AgentEvent>,
    total: usize,
    status: String,
}

impl Replay {
    fn new(config: &ViewConfig, events: Vec<AgentEvent>, instant: bool) -> Self {
        let mut view = MessageView::from_config(config);
        view.set_focused(true);
        let total = events.len();
        let mut replay = Self {
            view,
            pending: events.into(),
            total,
            status: String::new(),
        };
        if instant {
            while replay.step() {}
        }
        replay
    }

    /// Apply the next pending event. False when the stream is exhausted.
    fn step(&mut self) -> bool {
        match self.pending.pop_front() {
            Some(event) => {
                self.view.apply(event);
                true
            }
            None => false,
        }
    }

    fn applied(&self) -> usize {
        self.total - self.pending.len()
    }

    /// Handle one terminal event. Returns false to quit.
    fn handle(&mut self, event: Event) -> bool {
        match event {
            Event::Key(key) => {
                if is_quit(&key) {
                    return false;
                }
                if key.code == KeyCode::Tab {
                    let focused = !self.view.is_focused();
                    self.view.set_focused(focused);
                } else {
                    self.view.handle_key(&key);
                }
            }
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => {
                    if let Some(ViewEffect::OpenSubagent {
                        session_id,
                        subagent_type,
                    }) = self.view.click(mouse.column, mouse.row)
                    {
                        tracing::info!(session_id = %session_id, subagent_type = %subagent_type, "Subagent session requested");
                        self.status = format!("open {subagent_type} session {session_id}");
                    }
                }
                MouseEventKind::ScrollUp => self.view.scroll_by(-WHEEL_LINES),
                MouseEventKind::ScrollDown => self.view.scroll_by(WHEEL_LINES),
                _ => {}
            },
            // The next draw picks up the new size.
            Event::Resize(_, _) => {}
            Event::Tick => {
                self.view.tick();
                self.step();
            }
        }
        true
    }

    fn draw(&mut self, frame: &mut Frame) {
        let [messages, status] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());
        self.view.draw(frame, messages);
        self.draw_status(frame, status);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let theme = &self.view.context().theme;
        let focus = if self.view.is_focused() { "focused" } else { "unfocused" };
        let mut spans = vec![
            Span::styled(
                format!(" {}/{} events", self.applied(), self.total),
                theme.muted_style(),
            ),
            Span::styled(format!(" · {focus}"), theme.muted_style()),
        ];
        if !self.status.is_empty() {
            spans.push(Span::styled(format!(" · {}", self.status), theme.accent_style()));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}
