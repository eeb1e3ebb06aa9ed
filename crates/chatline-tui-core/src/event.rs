//! Terminal event loop.

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Events delivered to the application loop.
#[derive(Debug, Clone)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// The terminal was resized to (width, height).
    Resize(u16, u16),
    /// Periodic tick for animations.
    Tick,
}

/// Reads terminal input on a background thread and forwards it as [`Event`]s.
pub struct EventHandler {
    sender: mpsc::UnboundedSender<Event>,
    receiver: mpsc::UnboundedReceiver<Event>,
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver,
            tick_rate,
        }
    }

    /// Get a sender for injecting events.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.sender.clone()
    }

    /// Start polling the terminal.
    pub fn start(&self) -> EventLoopHandle {
        let sender = self.sender.clone();
        let tick_rate = self.tick_rate;
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();

        let handle = tokio::task::spawn_blocking(move || {
            while !stop_flag.load(Ordering::Relaxed) {
                let event = if event::poll(tick_rate).unwrap_or(false) {
                    match event::read() {
                        Ok(CrosstermEvent::Key(key)) => Some(Event::Key(key)),
                        Ok(CrosstermEvent::Mouse(mouse)) => Some(Event::Mouse(mouse)),
                        Ok(CrosstermEvent::Resize(w, h)) => Some(Event::Resize(w, h)),
                        Ok(_) => None,
                        Err(e) => {
                            tracing::warn!(error = %e, "Error reading terminal event");
                            None
                        }
                    }
                } else {
                    Some(Event::Tick)
                };

                if let Some(event) = event {
                    if sender.send(event).is_err() {
                        break;
                    }
                }
            }
        });

        EventLoopHandle { stop, handle }
    }

    /// Receive the next event.
    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

/// Handle to the polling thread.
pub struct EventLoopHandle {
    stop: Arc<AtomicBool>,
    handle: tokio::task::JoinHandle<()>,
}

impl EventLoopHandle {
    /// Ask the polling thread to exit and wait for it.
    pub async fn stop(self) {
        self.stop.store(true, Ordering::Relaxed);
        let _ = self.handle.await;
    }
}

/// Check if a key event is Ctrl+C or `q`.
pub fn is_quit(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        KeyCode::Char('q') => key.modifiers.is_empty(),
        _ => false,
    }
}
