use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use crate::errors::{StoreError, StoreResult};

use super::change::{ChangeOp, ChangeSet};
use super::coordinator::{Filter, SortKey, StoreCoordinator};
use super::schema::EntitySchema;
use super::value::{compare_values, AttributeMap, Record};

#[derive(Debug, Clone)]
struct StoredRecord {
    id: Uuid,
    attributes: AttributeMap,
    relationships: HashMap<String, Vec<Uuid>>,
}

/// In-memory store coordinator. Records keep insertion order per kind, which
/// is the store-default fetch order. Persistent backends are plugged in
/// through the same `StoreCoordinator` trait and are out of scope here.
pub struct MemoryStore {
    schemas: HashMap<String, EntitySchema>,
    records: RwLock<HashMap<String, Vec<StoredRecord>>>,
}

impl MemoryStore {
    pub fn new(schemas: Vec<EntitySchema>) -> Self {
        Self {
            schemas: schemas.into_iter().map(|s| (s.name.clone(), s)).collect(),
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a record directly, bypassing sessions. Setup convenience.
    pub fn seed(&self, kind: &str, attributes: AttributeMap) -> StoreResult<Uuid> {
        self.seed_with_relationships(kind, attributes, HashMap::new())
    }

    pub fn seed_with_relationships(
        &self,
        kind: &str,
        attributes: AttributeMap,
        relationships: HashMap<String, Vec<Uuid>>,
    ) -> StoreResult<Uuid> {
        if !self.schemas.contains_key(kind) {
            return Err(StoreError::SchemaNotFound(kind.to_string()));
        }
        let id = Uuid::new_v4();
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;
        records.entry(kind.to_string()).or_default().push(StoredRecord {
            id,
            attributes,
            relationships,
        });
        Ok(id)
    }
}

impl StoreCoordinator for MemoryStore {
    fn schema(&self, kind: &str) -> StoreResult<EntitySchema> {
        self.schemas
            .get(kind)
            .cloned()
            .ok_or_else(|| StoreError::SchemaNotFound(kind.to_string()))
    }

    fn fetch(
        &self,
        kind: &str,
        filter: Option<&Filter>,
        order: &[SortKey],
    ) -> StoreResult<Vec<Record>> {
        if !self.schemas.contains_key(kind) {
            return Err(StoreError::SchemaNotFound(kind.to_string()));
        }
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::FetchFailed("store lock poisoned".to_string()))?;

        let mut out: Vec<Record> = records
            .get(kind)
            .map(|rows| {
                rows.iter()
                    .map(|row| Record {
                        id: row.id,
                        kind: kind.to_string(),
                        attributes: row.attributes.clone(),
                        relationships: row.relationships.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        if let Some(filter) = filter {
            out.retain(|record| filter.matches(record));
        }

        if !order.is_empty() {
            // Stable sort keeps insertion order among equal keys. Records
            // missing a key sort ahead of records that carry it.
            out.sort_by(|a, b| {
                for key in order {
                    let ord = match (a.attribute(&key.attribute), b.attribute(&key.attribute)) {
                        (Some(x), Some(y)) => compare_values(x, y),
                        (None, Some(_)) => Ordering::Less,
                        (Some(_), None) => Ordering::Greater,
                        (None, None) => Ordering::Equal,
                    };
                    let ord = if key.ascending { ord } else { ord.reverse() };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        Ok(out)
    }

    fn apply(&self, changes: &ChangeSet) -> StoreResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;
        for change in &changes.changes {
            let rows = records.entry(change.kind.clone()).or_default();
            match &change.op {
                ChangeOp::Upsert(attrs) => {
                    if let Some(row) = rows.iter_mut().find(|r| r.id == change.id) {
                        for (name, value) in attrs {
                            row.attributes.insert(name.clone(), value.clone());
                        }
                    } else {
                        rows.push(StoredRecord {
                            id: change.id,
                            attributes: attrs.clone(),
                            relationships: HashMap::new(),
                        });
                    }
                }
                ChangeOp::Delete => rows.retain(|r| r.id != change.id),
            }
        }
        Ok(())
    }
}
