//! Inbound agent events.
//!
//! Recorded streams are newline-delimited JSON, one event per line:
//!
//! ```text
//! {"type":"append_text","text":"Hello"}
//! {"type":"tool_call","call_id":"t1","status":"pending","input":{"command":"ls"}}
//! {"type":"finish","duration_ms":1200,"model":"m","provider":"p"}
//! ```

use chatline_util::{Error, ErrorKind, Result};
use serde::{Deserialize, Serialize};

use crate::lifecycle::ToolCallUpdate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Streamed assistant text. An empty chunk marks the start of a stream.
    AppendText {
        #[serde(default)]
        text: String,
    },
    /// Streamed reasoning, with the same empty-chunk convention.
    AppendThinking {
        #[serde(default)]
        text: String,
    },
    ToolCall(ToolCallUpdate),
    UserMessage {
        #[serde(default)]
        text: String,
    },
    Divider {
        #[serde(default)]
        iteration: u32,
    },
    /// End of an iteration. A `cancelled` reason cancels in-flight tools.
    Finish {
        #[serde(default)]
        duration_ms: u64,
        #[serde(default)]
        model: String,
        #[serde(default)]
        provider: String,
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        reason: Option<String>,
    },
    MarkToolError {
        call_id: String,
    },
    MarkToolCanceled {
        call_id: String,
    },
    Clear,
}

impl AgentEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AgentEvent::AppendText { .. } => "append_text",
            AgentEvent::AppendThinking { .. } => "append_thinking",
            AgentEvent::ToolCall(_) => "tool_call",
            AgentEvent::UserMessage { .. } => "user_message",
            AgentEvent::Divider { .. } => "divider",
            AgentEvent::Finish { .. } => "finish",
            AgentEvent::MarkToolError { .. } => "mark_tool_error",
            AgentEvent::MarkToolCanceled { .. } => "mark_tool_canceled",
            AgentEvent::Clear => "clear",
        }
    }
}

/// True for the reason strings that abort a run.
pub fn is_cancel_reason(reason: &str) -> bool {
    matches!(reason, "cancelled" | "canceled")
}

/// Decode a newline-delimited stream. Blank lines are skipped.
pub fn parse_jsonl(text: &str) -> Result<Vec<AgentEvent>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| {
                Error::with_source(ErrorKind::Parse, format!("invalid event on line {}", i + 1), e)
            })
        })
        .collect()
}
