//! View configuration.
//!
//! Loaded from a JSON file. Every field is optional:
//!
//! ```json
//! {
//!   "theme": "catppuccin",
//!   "render": { "tool_output_max_lines": 20 },
//!   "keybinds": { "page_up": "pageup,b" },
//!   "log_level": "debug",
//!   "log_file": "/tmp/chatline.log"
//! }
//! ```

use std::path::{Path, PathBuf};

use chatline_util::{Error, ErrorKind, LogLevel, Result};
use serde::{Deserialize, Serialize};

use crate::keybind::KeybindConfig;
use crate::theme::{RenderContext, RenderSettings, Theme};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Theme name, resolved with [`Theme::by_name`].
    pub theme: String,
    pub render: RenderSettings,
    pub keybinds: KeybindConfig,
    pub log_level: LogLevel,
    pub log_file: Option<PathBuf>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            theme: "chatline".to_string(),
            render: RenderSettings::default(),
            keybinds: KeybindConfig::default(),
            log_level: LogLevel::default(),
            log_file: None,
        }
    }
}

impl ViewConfig {
    /// Default config location: `<config dir>/chatline/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("chatline").join("config.json"))
    }

    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| {
            Error::with_source(
                ErrorKind::Config,
                format!("invalid config file {}", path.display()),
                e,
            )
        })
    }

    /// Load from `path`, or the default location when `None`.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let config = Self::load(&path)?;
        tracing::debug!(path = %path.display(), theme = %config.theme, "Loaded config");
        Ok(config)
    }

    pub fn theme(&self) -> Theme {
        Theme::by_name(&self.theme)
    }

    /// Build the styling context for rendering.
    pub fn render_context(&self) -> RenderContext {
        RenderContext::new(self.theme(), self.render.clone())
    }
}
