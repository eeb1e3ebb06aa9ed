//! Call id to item position lookup.

use std::collections::HashMap;

use crate::item::MessageItem;

/// Maps external tool call ids to positions in the item sequence.
///
/// Positions are never reordered; the index only exists for in-place
/// updates. It is emptied together with the items on a reset.
#[derive(Debug, Clone, Default)]
pub struct ToolCallIndex {
    positions: HashMap<String, usize>,
}

impl ToolCallIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, call_id: &str) -> Option<usize> {
        self.positions.get(call_id).copied()
    }

    pub fn contains(&self, call_id: &str) -> bool {
        self.positions.contains_key(call_id)
    }

    pub(crate) fn insert(&mut self, call_id: impl Into<String>, position: usize) {
        self.positions.insert(call_id.into(), position);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.positions.iter().map(|(id, pos)| (id.as_str(), *pos))
    }

    /// Call ids whose entry does not point at a Tool or Subagent item
    /// carrying that same id.
    pub fn dangling_entries<'a>(&'a self, items: &[MessageItem]) -> Vec<&'a str> {
        let mut dangling: Vec<&str> = self
            .iter()
            .filter(|(call_id, pos)| {
                items
                    .get(*pos)
                    .and_then(|item| item.kind().tool())
                    .map_or(true, |tool| tool.call_id != *call_id)
            })
            .map(|(call_id, _)| call_id)
            .collect();
        dangling.sort_unstable();
        dangling
    }
}
