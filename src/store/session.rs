use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use uuid::Uuid;

use crate::errors::{StoreError, StoreResult};

use super::change::{ChangeOp, ChangeSet, MergePolicy, RecordChange};
use super::coordinator::{Filter, SortKey, StoreCoordinator};
use super::schema::EntitySchema;
use super::value::{AttributeMap, AttributeValue, Record};

/// A confined handle into the shared store.
///
/// Every operation asserts that the caller is the thread that created the
/// session; crossing that boundary is a programming error surfaced as a
/// deterministic `ConfinementViolation`. Fetched records are materialized
/// into the session's local object graph; mutations stage per-attribute
/// pending changes until `commit` drains them into a `ChangeSet` — the only
/// value that may leave the owning thread.
pub struct Session {
    id: Uuid,
    owner: ThreadId,
    coordinator: Arc<dyn StoreCoordinator>,
    objects: HashMap<(String, Uuid), AttributeMap>,
    pending: Vec<RecordChange>,
}

impl Session {
    /// Create a session bound to the current thread. Confined sessions are
    /// created on the worker running a task body; the main session is created
    /// on the main context thread.
    pub fn confined(coordinator: Arc<dyn StoreCoordinator>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: thread::current().id(),
            coordinator,
            objects: HashMap::new(),
            pending: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn assert_owner(&self) -> StoreResult<()> {
        let current = thread::current().id();
        if current != self.owner {
            return Err(StoreError::ConfinementViolation {
                session: self.id,
                owner: format!("{:?}", self.owner),
                accessor: format!("{:?}", current),
            });
        }
        Ok(())
    }

    /// Resolve the schema for an entity kind.
    pub fn schema(&self, kind: &str) -> StoreResult<EntitySchema> {
        self.assert_owner()?;
        self.coordinator.schema(kind)
    }

    /// Fetch records through the coordinator and materialize them locally.
    /// The returned sequence is exactly the coordinator's, with no reordering,
    /// duplication, or omission.
    pub fn fetch(
        &mut self,
        kind: &str,
        filter: Option<&Filter>,
        order: &[SortKey],
    ) -> StoreResult<Vec<Record>> {
        self.assert_owner()?;
        let records = self.coordinator.fetch(kind, filter, order)?;
        for record in &records {
            // Do not clobber local edits already materialized for the record.
            self.objects
                .entry((record.kind.clone(), record.id))
                .or_insert_with(|| record.attributes.clone());
        }
        Ok(records)
    }

    /// Stage a new record. Durable only after `commit`.
    pub fn insert(&mut self, kind: &str, attributes: AttributeMap) -> StoreResult<Uuid> {
        self.assert_owner()?;
        let id = Uuid::new_v4();
        self.objects
            .insert((kind.to_string(), id), attributes.clone());
        self.pending.push(RecordChange {
            kind: kind.to_string(),
            id,
            op: ChangeOp::Upsert(attributes),
        });
        Ok(id)
    }

    /// Stage a single attribute update. Repeated updates to one record
    /// coalesce into one pending change.
    pub fn update(
        &mut self,
        kind: &str,
        id: Uuid,
        attribute: &str,
        value: AttributeValue,
    ) -> StoreResult<()> {
        self.assert_owner()?;
        self.objects
            .entry((kind.to_string(), id))
            .or_default()
            .insert(attribute.to_string(), value.clone());

        let position = self
            .pending
            .iter()
            .position(|c| c.kind == kind && c.id == id && matches!(c.op, ChangeOp::Upsert(_)));
        match position {
            Some(index) => {
                if let ChangeOp::Upsert(map) = &mut self.pending[index].op {
                    map.insert(attribute.to_string(), value);
                }
            }
            None => self.pending.push(RecordChange {
                kind: kind.to_string(),
                id,
                op: ChangeOp::Upsert(HashMap::from([(attribute.to_string(), value)])),
            }),
        }
        Ok(())
    }

    /// Stage a record deletion, superseding any pending upsert for it.
    pub fn delete(&mut self, kind: &str, id: Uuid) -> StoreResult<()> {
        self.assert_owner()?;
        self.objects.remove(&(kind.to_string(), id));
        self.pending.retain(|c| !(c.kind == kind && c.id == id));
        self.pending.push(RecordChange {
            kind: kind.to_string(),
            id,
            op: ChangeOp::Delete,
        });
        Ok(())
    }

    /// Read one materialized attribute value.
    pub fn attribute(&self, kind: &str, id: Uuid, name: &str) -> StoreResult<Option<AttributeValue>> {
        self.assert_owner()?;
        Ok(self
            .objects
            .get(&(kind.to_string(), id))
            .and_then(|attrs| attrs.get(name))
            .cloned())
    }

    pub fn has_changes(&self) -> StoreResult<bool> {
        self.assert_owner()?;
        Ok(!self.pending.is_empty())
    }

    /// Drain pending changes into a change set, apply it durably through the
    /// coordinator, and return it for merge-back. Pending changes survive a
    /// failed apply.
    pub fn commit(&mut self) -> StoreResult<ChangeSet> {
        self.assert_owner()?;
        let set = ChangeSet {
            changes: self.pending.clone(),
        };
        self.coordinator.apply(&set)?;
        self.pending.clear();
        Ok(set)
    }

    /// Fold a committed change set from another session into this session's
    /// materialized objects. Runs only on this session's owning thread; for
    /// the main session that is the main context mailbox.
    pub fn apply(&mut self, changes: &ChangeSet, policy: MergePolicy) -> StoreResult<()> {
        self.assert_owner()?;
        for change in &changes.changes {
            let key = (change.kind.clone(), change.id);
            match &change.op {
                ChangeOp::Upsert(attrs) => {
                    if policy == MergePolicy::Strict {
                        if let Some(existing) = self.objects.get(&key) {
                            for (name, incoming) in attrs {
                                if let Some(current) = existing.get(name) {
                                    if current != incoming {
                                        return Err(StoreError::MergeConflict {
                                            kind: change.kind.clone(),
                                            id: change.id,
                                            attribute: name.clone(),
                                        });
                                    }
                                }
                            }
                        }
                    }
                    let entry = self.objects.entry(key).or_default();
                    for (name, value) in attrs {
                        entry.insert(name.clone(), value.clone());
                    }
                }
                ChangeOp::Delete => {
                    self.objects.remove(&key);
                }
            }
        }
        log::debug!(
            "session {} applied {} change(s)",
            self.id,
            changes.changes.len()
        );
        Ok(())
    }
}
