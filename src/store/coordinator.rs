use std::fmt;
use std::sync::Arc;

use crate::errors::StoreResult;

use super::change::ChangeSet;
use super::schema::EntitySchema;
use super::value::Record;

/// Opaque filter predicate supplied by the caller. The framework never
/// interprets it; it is handed through to the store's fetch.
#[derive(Clone)]
pub struct Filter(Arc<dyn Fn(&Record) -> bool + Send + Sync>);

impl Filter {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    pub fn matches(&self, record: &Record) -> bool {
        (self.0)(record)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Filter(..)")
    }
}

/// Attribute-based sort key. Keys earlier in a slice take precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub attribute: String,
    pub ascending: bool,
}

impl SortKey {
    pub fn ascending(attribute: &str) -> Self {
        Self {
            attribute: attribute.to_string(),
            ascending: true,
        }
    }

    pub fn descending(attribute: &str) -> Self {
        Self {
            attribute: attribute.to_string(),
            ascending: false,
        }
    }
}

/// Boundary to the shared backing store. Implementations are multiplexed
/// across many confined sessions; sessions themselves are single-owner.
pub trait StoreCoordinator: Send + Sync {
    /// Look up the schema for an entity kind. `SchemaNotFound` if unknown.
    fn schema(&self, kind: &str) -> StoreResult<EntitySchema>;

    /// Fetch records of one kind, filtered and ordered per the criteria.
    /// Absent criteria mean all records in store-default order, which must be
    /// stable for a fixed store state.
    fn fetch(&self, kind: &str, filter: Option<&Filter>, order: &[SortKey])
        -> StoreResult<Vec<Record>>;

    /// Apply a committed change set durably.
    fn apply(&self, changes: &ChangeSet) -> StoreResult<()>;
}
