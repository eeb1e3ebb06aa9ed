//! Scroll keybindings.
//!
//! Bindings are strings such as `ctrl+u` or `pageup`; several bindings for
//! one action are separated by commas (`up,k`).

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A scroll action the message view understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollAction {
    LineUp,
    LineDown,
    HalfPageUp,
    HalfPageDown,
    PageUp,
    PageDown,
    Top,
    Bottom,
}

impl ScrollAction {
    pub fn all() -> &'static [ScrollAction] {
        &[
            ScrollAction::LineUp,
            ScrollAction::LineDown,
            ScrollAction::HalfPageUp,
            ScrollAction::HalfPageDown,
            ScrollAction::PageUp,
            ScrollAction::PageDown,
            ScrollAction::Top,
            ScrollAction::Bottom,
        ]
    }

    /// Config key for this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrollAction::LineUp => "line_up",
            ScrollAction::LineDown => "line_down",
            ScrollAction::HalfPageUp => "half_page_up",
            ScrollAction::HalfPageDown => "half_page_down",
            ScrollAction::PageUp => "page_up",
            ScrollAction::PageDown => "page_down",
            ScrollAction::Top => "top",
            ScrollAction::Bottom => "bottom",
        }
    }

    pub fn default_binding(&self) -> &'static str {
        match self {
            ScrollAction::LineUp => "up,k",
            ScrollAction::LineDown => "down,j",
            ScrollAction::HalfPageUp => "ctrl+u",
            ScrollAction::HalfPageDown => "ctrl+d",
            ScrollAction::PageUp => "pageup",
            ScrollAction::PageDown => "pagedown",
            ScrollAction::Top => "home",
            ScrollAction::Bottom => "end",
        }
    }

    /// Paging actions are only honored while the view is focused.
    pub fn is_paging(&self) -> bool {
        !matches!(self, ScrollAction::LineUp | ScrollAction::LineDown)
    }
}

/// A single key combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keybind {
    /// Normalized key name (`"a"`, `"pageup"`, `"f5"`).
    pub key: String,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Keybind {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            alt: false,
            shift: false,
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    /// Parse a binding such as `ctrl+u`. Returns `None` for `none` or empty input.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        if s == "none" || s.is_empty() {
            return None;
        }

        let mut keybind = Keybind::new(String::new());
        for part in s.split('+') {
            match part.trim() {
                "ctrl" | "control" => keybind.ctrl = true,
                "alt" | "meta" | "option" => keybind.alt = true,
                "shift" => keybind.shift = true,
                "esc" => keybind.key = "escape".to_string(),
                "pgup" => keybind.key = "pageup".to_string(),
                "pgdn" | "pgdown" => keybind.key = "pagedown".to_string(),
                other if !other.is_empty() => keybind.key = other.to_string(),
                _ => {}
            }
        }

        if keybind.key.is_empty() {
            None
        } else {
            Some(keybind)
        }
    }

    /// Parse comma separated bindings, skipping invalid entries.
    pub fn parse_multi(s: &str) -> Vec<Self> {
        s.split(',').filter_map(Self::parse).collect()
    }

    /// Check if this binding matches a key event.
    pub fn matches(&self, key: &KeyEvent) -> bool {
        let ctrl_match = self.ctrl == key.modifiers.contains(KeyModifiers::CONTROL);
        let alt_match = self.alt == key.modifiers.contains(KeyModifiers::ALT);
        if !ctrl_match || !alt_match {
            return false;
        }

        // Shift is implied by uppercase characters, so only compare it for
        // named keys.
        match &key.code {
            KeyCode::Char(c) => self.key == c.to_lowercase().to_string(),
            code => {
                if self.shift != key.modifiers.contains(KeyModifiers::SHIFT) {
                    return false;
                }
                match code {
                    KeyCode::Enter => self.key == "enter",
                    KeyCode::Esc => self.key == "escape",
                    KeyCode::Tab => self.key == "tab",
                    KeyCode::Home => self.key == "home",
                    KeyCode::End => self.key == "end",
                    KeyCode::PageUp => self.key == "pageup",
                    KeyCode::PageDown => self.key == "pagedown",
                    KeyCode::Up => self.key == "up",
                    KeyCode::Down => self.key == "down",
                    KeyCode::Left => self.key == "left",
                    KeyCode::Right => self.key == "right",
                    KeyCode::F(n) => self.key == format!("f{n}"),
                    _ => false,
                }
            }
        }
    }
}

/// Binding overrides, keyed by action name (`"page_up": "pageup,b"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeybindConfig {
    #[serde(flatten)]
    pub bindings: HashMap<String, String>,
}

/// Resolved bindings for every scroll action.
#[derive(Debug, Clone)]
pub struct ScrollKeymap {
    actions: Vec<(ScrollAction, Vec<Keybind>)>,
}

impl Default for ScrollKeymap {
    fn default() -> Self {
        Self::new(&KeybindConfig::default())
    }
}

impl ScrollKeymap {
    pub fn new(config: &KeybindConfig) -> Self {
        let actions = ScrollAction::all()
            .iter()
            .map(|action| {
                let binding = config
                    .bindings
                    .get(action.as_str())
                    .map(|s| s.as_str())
                    .unwrap_or(action.default_binding());
                (*action, Keybind::parse_multi(binding))
            })
            .collect();
        Self { actions }
    }

    /// Find the action bound to a key, if any.
    pub fn find_action(&self, key: &KeyEvent) -> Option<ScrollAction> {
        self.actions
            .iter()
            .find(|(_, binds)| binds.iter().any(|kb| kb.matches(key)))
            .map(|(action, _)| *action)
    }

    pub fn bindings(&self, action: ScrollAction) -> &[Keybind] {
        self.actions
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, binds)| binds.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_parse_simple() {
        let kb = Keybind::parse("ctrl+u").unwrap();
        assert_eq!(kb.key, "u");
        assert!(kb.ctrl);
        assert!(!kb.alt);
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(Keybind::parse("pgup").unwrap().key, "pageup");
        assert_eq!(Keybind::parse("esc").unwrap().key, "escape");
    }

    #[test]
    fn test_parse_none() {
        assert!(Keybind::parse("none").is_none());
        assert!(Keybind::parse("ctrl+").is_none());
    }

    #[test]
    fn test_parse_multi() {
        let binds = Keybind::parse_multi("up, k,none");
        assert_eq!(binds.len(), 2);
        assert_eq!(binds[1].key, "k");
    }

    #[test]
    fn test_matches() {
        let kb = Keybind::parse("ctrl+d").unwrap();
        assert!(kb.matches(&key(KeyCode::Char('d'), KeyModifiers::CONTROL)));
        assert!(!kb.matches(&key(KeyCode::Char('d'), KeyModifiers::NONE)));
        let kb = Keybind::parse("pagedown").unwrap();
        assert!(kb.matches(&key(KeyCode::PageDown, KeyModifiers::NONE)));
    }

    #[test]
    fn test_default_keymap() {
        let keymap = ScrollKeymap::default();
        assert_eq!(
            keymap.find_action(&key(KeyCode::Up, KeyModifiers::NONE)),
            Some(ScrollAction::LineUp)
        );
        assert_eq!(
            keymap.find_action(&key(KeyCode::Char('j'), KeyModifiers::NONE)),
            Some(ScrollAction::LineDown)
        );
        assert_eq!(
            keymap.find_action(&key(KeyCode::End, KeyModifiers::NONE)),
            Some(ScrollAction::Bottom)
        );
        assert_eq!(
            keymap.find_action(&key(KeyCode::Char('x'), KeyModifiers::NONE)),
            None
        );
    }

    #[test]
    fn test_keymap_override() {
        let mut config = KeybindConfig::default();
        config
            .bindings
            .insert("page_up".to_string(), "b".to_string());
        let keymap = ScrollKeymap::new(&config);
        assert_eq!(
            keymap.find_action(&key(KeyCode::Char('b'), KeyModifiers::NONE)),
            Some(ScrollAction::PageUp)
        );
        assert_eq!(
            keymap.find_action(&key(KeyCode::PageUp, KeyModifiers::NONE)),
            None
        );
        assert_eq!(keymap.bindings(ScrollAction::PageUp).len(), 1);
    }

    #[test]
    fn test_is_paging() {
        assert!(!ScrollAction::LineUp.is_paging());
        assert!(ScrollAction::HalfPageDown.is_paging());
        assert!(ScrollAction::Top.is_paging());
    }
}
