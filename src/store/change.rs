use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value::AttributeMap;

/// How a change set is folded into a target session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Attribute-level last-writer-wins: the confined session's value replaces
    /// the target's value for exactly the attributes the change set names.
    #[default]
    ConfinedWins,
    /// Raise `MergeConflict` when the target has materialized a differing
    /// value for an attribute the change set names.
    Strict,
}

/// Operation recorded against one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChangeOp {
    /// Upsert carrying only the attributes the originating session touched.
    Upsert(AttributeMap),
    Delete,
}

/// One record's worth of committed change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordChange {
    pub kind: String,
    pub id: Uuid,
    pub op: ChangeOp,
}

/// Ordered set of committed changes produced by `Session::commit`. This is
/// the only value that crosses threads during merge-back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub changes: Vec<RecordChange>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }
}
