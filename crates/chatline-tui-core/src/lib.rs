//! Core types shared by the chatline TUI crates.
//!
//! - Theme and render settings, bundled into a [`RenderContext`]
//! - View configuration loaded from JSON
//! - Scroll keybindings
//! - Terminal event loop

pub mod config;
pub mod event;
pub mod keybind;
pub mod theme;

pub use config::ViewConfig;
pub use event::{is_quit, Event, EventHandler, EventLoopHandle};
pub use keybind::{Keybind, KeybindConfig, ScrollAction, ScrollKeymap};
pub use theme::{RenderContext, RenderSettings, Theme};
