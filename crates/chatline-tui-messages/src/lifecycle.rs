//! Tool call lifecycle: create-or-update by call id.
//!
//! `absent -> Pending/Running -> Success | Error | Canceled`. Updates are
//! applied in arrival order and always in place.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::item::{ItemKind, MessageItem};
use crate::tool::{FileDiff, SubagentItem, ToolItem, ToolStatus};
use crate::tool_index::ToolCallIndex;

/// One inbound tool call event. Empty fields mean "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolCallUpdate {
    pub call_id: String,
    pub title: String,
    pub kind: String,
    /// Wire status: `pending`, `in_progress`, `completed`, `error`, `canceled`.
    pub status: String,
    pub input: Map<String, Value>,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<FileDiff>,
    pub session_id: String,
}

/// What [`ToolCallIndex::apply`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// A new item was appended at this position.
    Created(usize),
    /// The existing item at this position was updated.
    Updated(usize),
    /// A Tool item turned out to be a subagent and was replaced in place.
    Promoted(usize),
}

impl UpdateOutcome {
    pub fn position(&self) -> usize {
        match *self {
            UpdateOutcome::Created(p) | UpdateOutcome::Updated(p) | UpdateOutcome::Promoted(p) => p,
        }
    }
}

impl ToolCallIndex {
    /// Apply a tool call event to `items`.
    ///
    /// Unknown call ids append a new Tool or Subagent item (chosen by the
    /// input's subagent marker). Known ids are updated in place: status is
    /// always overwritten, other fields only when supplied.
    pub fn apply(
        &mut self,
        items: &mut Vec<MessageItem>,
        mut update: ToolCallUpdate,
        new_id: impl FnOnce() -> String,
    ) -> UpdateOutcome {
        let status = ToolStatus::parse(&update.status);
        if status.is_none() && !update.status.is_empty() {
            warn!(call_id = %update.call_id, status = %update.status, "Unknown tool status");
        }
        let session_id = std::mem::take(&mut update.session_id);

        let existing = self
            .get(&update.call_id)
            .filter(|&pos| items.get(pos).is_some_and(|item| item.kind().tool().is_some()));

        let Some(pos) = existing else {
            let call_id = update.call_id.clone();
            let mut tool = ToolItem::new(call_id.clone(), String::new());
            tool.status = status.unwrap_or_default();
            merge(&mut tool, update, None);

            let kind = if tool.is_subagent() {
                ItemKind::Subagent(SubagentItem::from_tool(tool, session_id))
            } else {
                ItemKind::Tool(tool)
            };
            debug!(call_id = %call_id, kind = kind.name(), position = items.len(), "Tool call created");
            items.push(MessageItem::new(new_id(), kind));
            let pos = items.len() - 1;
            self.insert(call_id, pos);
            return UpdateOutcome::Created(pos);
        };

        let call_id = update.call_id.clone();
        let promoted = items[pos].edit(move |kind| match kind {
            ItemKind::Tool(tool) => {
                merge(tool, update, status);
                if tool.is_subagent() {
                    let tool = std::mem::take(tool);
                    *kind = ItemKind::Subagent(SubagentItem::from_tool(tool, session_id));
                    return true;
                }
                false
            }
            ItemKind::Subagent(subagent) => {
                merge(&mut subagent.tool, update, status);
                if !session_id.is_empty() {
                    subagent.session_id = session_id;
                }
                false
            }
            _ => false,
        });

        if promoted {
            debug!(call_id = %call_id, position = pos, "Tool call promoted to subagent");
            UpdateOutcome::Promoted(pos)
        } else {
            debug!(call_id = %call_id, position = pos, ?status, "Tool call updated");
            UpdateOutcome::Updated(pos)
        }
    }

    /// Force the status of one call, e.g. an out-of-band error or cancel.
    pub fn set_status(&self, items: &mut [MessageItem], call_id: &str, status: ToolStatus) -> bool {
        let Some(item) = self.get(call_id).and_then(|pos| items.get_mut(pos)) else {
            warn!(call_id, "Status change for unknown tool call");
            return false;
        };
        if item.kind().tool().is_none() {
            return false;
        }
        item.edit(|kind| match kind {
            ItemKind::Tool(tool) => tool.status = status,
            ItemKind::Subagent(subagent) => subagent.tool.status = status,
            _ => {}
        });
        true
    }
}

/// Mark every pending or running Tool and Subagent item as canceled.
///
/// Returns the number of items changed. Finished items are left untouched.
pub fn cancel_in_flight(items: &mut [MessageItem]) -> usize {
    let mut canceled = 0;
    for item in items.iter_mut() {
        let in_flight = item
            .kind()
            .tool()
            .is_some_and(|tool| tool.status.is_in_flight());
        if !in_flight {
            continue;
        }
        item.edit(|kind| match kind {
            ItemKind::Tool(tool) => tool.status = ToolStatus::Canceled,
            ItemKind::Subagent(subagent) => subagent.tool.status = ToolStatus::Canceled,
            _ => {}
        });
        canceled += 1;
    }
    if canceled > 0 {
        debug!(count = canceled, "Canceled in-flight tool calls");
    }
    canceled
}

/// Overwrite status when known, other fields only when non-empty.
fn merge(tool: &mut ToolItem, update: ToolCallUpdate, status: Option<ToolStatus>) {
    if let Some(status) = status {
        tool.status = status;
    }
    if !update.title.is_empty() {
        tool.title = update.title;
    }
    if !update.kind.is_empty() {
        tool.kind = update.kind;
    }
    if !update.input.is_empty() {
        tool.input = update.input;
    }
    if !update.output.is_empty() {
        tool.output = update.output;
    }
    if update.diff.is_some() {
        tool.diff = update.diff;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn update(call_id: &str, status: &str) -> ToolCallUpdate {
        ToolCallUpdate {
            call_id: call_id.to_string(),
            status: status.to_string(),
            ..Default::default()
        }
    }

    fn apply(index: &mut ToolCallIndex, items: &mut Vec<MessageItem>, u: ToolCallUpdate) -> UpdateOutcome {
        let id = format!("item-{}", items.len());
        index.apply(items, u, move || id)
    }

    fn tool_at(items: &[MessageItem], pos: usize) -> &ToolItem {
        items[pos].kind().tool().unwrap()
    }

    #[test]
    fn test_pending_then_completed_is_one_item() {
        let mut index = ToolCallIndex::new();
        let mut items = Vec::new();

        let mut first = update("t1", "pending");
        first.input = input(json!({"command": "ls"}));
        assert_eq!(apply(&mut index, &mut items, first), UpdateOutcome::Created(0));

        let mut second = update("t1", "completed");
        second.output = "a.txt\nb.txt".to_string();
        assert_eq!(apply(&mut index, &mut items, second), UpdateOutcome::Updated(0));

        assert_eq!(items.len(), 1);
        let tool = tool_at(&items, 0);
        assert_eq!(tool.status, ToolStatus::Success);
        assert_eq!(tool.output, "a.txt\nb.txt");
        assert_eq!(tool.input.get("command"), Some(&json!("ls")));
    }

    #[test]
    fn test_empty_fields_do_not_overwrite() {
        let mut index = ToolCallIndex::new();
        let mut items = Vec::new();
        let mut first = update("t1", "in_progress");
        first.kind = "bash".to_string();
        first.title = "Run".to_string();
        first.output = "partial".to_string();
        apply(&mut index, &mut items, first);

        apply(&mut index, &mut items, update("t1", "completed"));
        let tool = tool_at(&items, 0);
        assert_eq!(tool.kind, "bash");
        assert_eq!(tool.title, "Run");
        assert_eq!(tool.output, "partial");
        assert_eq!(tool.status, ToolStatus::Success);
    }

    #[test]
    fn test_update_invalidates_cache() {
        let ctx = chatline_tui_core::RenderContext::default();
        let mut index = ToolCallIndex::new();
        let mut items = Vec::new();
        apply(&mut index, &mut items, update("t1", "pending"));
        items[0].render(80, &ctx);
        apply(&mut index, &mut items, update("t1", "completed"));
        assert!(!items[0].is_cached_at(80));
    }

    #[test]
    fn test_subagent_marker_on_create() {
        let mut index = ToolCallIndex::new();
        let mut items = Vec::new();
        let mut u = update("s1", "running");
        u.input = input(json!({"subagent_type": "explore", "description": "look around"}));
        apply(&mut index, &mut items, u);
        assert!(matches!(items[0].kind(), ItemKind::Subagent(_)));
    }

    #[test]
    fn test_promotion_keeps_position_and_index() {
        let mut index = ToolCallIndex::new();
        let mut items = Vec::new();
        apply(&mut index, &mut items, update("t0", "completed"));
        apply(&mut index, &mut items, update("s1", "pending"));
        apply(&mut index, &mut items, update("t2", "pending"));
        let id_before = items[1].id().to_string();

        let mut u = update("s1", "completed");
        u.input = input(json!({"subagent_type": "general"}));
        u.session_id = "ses_42".to_string();
        assert_eq!(apply(&mut index, &mut items, u), UpdateOutcome::Promoted(1));

        assert_eq!(items.len(), 3);
        assert_eq!(items[1].id(), id_before);
        match items[1].kind() {
            ItemKind::Subagent(s) => {
                assert_eq!(s.session_id, "ses_42");
                assert_eq!(s.tool.call_id, "s1");
                assert_eq!(s.tool.status, ToolStatus::Success);
            }
            other => panic!("expected subagent, got {}", other.name()),
        }
        assert_eq!(index.get("s1"), Some(1));
        assert!(index.dangling_entries(&items).is_empty());
    }

    #[test]
    fn test_subagent_session_arrives_later() {
        let mut index = ToolCallIndex::new();
        let mut items = Vec::new();
        let mut u = update("s1", "running");
        u.input = input(json!({"subagent_type": "explore"}));
        apply(&mut index, &mut items, u);

        let mut done = update("s1", "completed");
        done.session_id = "ses_1".to_string();
        apply(&mut index, &mut items, done);
        match items[0].kind() {
            ItemKind::Subagent(s) => assert!(s.has_session()),
            other => panic!("expected subagent, got {}", other.name()),
        }
    }

    #[test]
    fn test_unknown_status() {
        let mut index = ToolCallIndex::new();
        let mut items = Vec::new();
        apply(&mut index, &mut items, update("t1", "weird"));
        assert_eq!(tool_at(&items, 0).status, ToolStatus::Pending);

        apply(&mut index, &mut items, update("t1", "in_progress"));
        apply(&mut index, &mut items, update("t1", "weird"));
        assert_eq!(tool_at(&items, 0).status, ToolStatus::Running);
    }

    #[test]
    fn test_status_aliases() {
        assert_eq!(ToolStatus::parse("cancelled"), Some(ToolStatus::Canceled));
        assert_eq!(ToolStatus::parse("canceled"), Some(ToolStatus::Canceled));
        assert_eq!(ToolStatus::parse("in_progress"), Some(ToolStatus::Running));
        assert_eq!(ToolStatus::parse("completed"), Some(ToolStatus::Success));
        assert_eq!(ToolStatus::parse("error"), Some(ToolStatus::Error));
        assert_eq!(ToolStatus::parse("nope"), None);
    }

    #[test]
    fn test_cancel_in_flight_only_touches_unfinished() {
        let mut index = ToolCallIndex::new();
        let mut items = Vec::new();
        apply(&mut index, &mut items, update("a", "pending"));
        apply(&mut index, &mut items, update("b", "in_progress"));
        apply(&mut index, &mut items, update("c", "completed"));
        apply(&mut index, &mut items, update("d", "error"));
        let mut sub = update("e", "running");
        sub.input = input(json!({"subagent_type": "explore"}));
        apply(&mut index, &mut items, sub);

        assert_eq!(cancel_in_flight(&mut items), 3);
        let statuses: Vec<ToolStatus> = items
            .iter()
            .map(|i| i.kind().tool().unwrap().status)
            .collect();
        assert_eq!(
            statuses,
            vec![
                ToolStatus::Canceled,
                ToolStatus::Canceled,
                ToolStatus::Success,
                ToolStatus::Error,
                ToolStatus::Canceled,
            ]
        );
    }

    #[test]
    fn test_set_status() {
        let mut index = ToolCallIndex::new();
        let mut items = Vec::new();
        apply(&mut index, &mut items, update("a", "running"));
        assert!(index.set_status(&mut items, "a", ToolStatus::Error));
        assert_eq!(tool_at(&items, 0).status, ToolStatus::Error);
        assert!(!index.set_status(&mut items, "missing", ToolStatus::Error));
    }
}
