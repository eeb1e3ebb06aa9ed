//! Message rendering and scroll viewport for chatline.
//!
//! Agent events ([`AgentEvent`]) are applied to a [`MessageView`], which keeps
//! an ordered list of [`MessageItem`]s, a [`ToolCallIndex`] for in-place tool
//! updates, and a [`ScrollViewport`] that maps screen rows back to items.

pub mod blocks;
pub mod cache;
pub mod diagnostics;
pub mod event;
pub mod item;
pub mod lifecycle;
pub mod numbered;
pub mod spinner;
pub mod tool;
pub mod tool_index;
pub mod view;
pub mod viewport;

pub use blocks::{Divider, RunInfo, TextBlock, ThinkingBlock, UserBlock};
pub use cache::RenderCache;
pub use diagnostics::{parse_diagnostics, Diagnostic, DiagnosticsBlock, Severity};
pub use event::{is_cancel_reason, parse_jsonl, AgentEvent};
pub use hit_test::{item_index_for_line, ClickOutcome};
pub use item::{Expandable, ItemKind, MessageItem};
pub use lifecycle::{cancel_in_flight, ToolCallUpdate, UpdateOutcome};
pub use numbered::{is_numbered_output, parse_numbered_line};
pub use spinner::Spinner;
pub use tool::{FileDiff, SubagentItem, ToolItem, ToolStatus};
pub use tool_index::ToolCallIndex;
pub use view::{MessageView, ViewEffect};
pub use viewport::ScrollViewport;
