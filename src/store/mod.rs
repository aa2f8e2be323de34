pub mod change;
pub mod coordinator;
pub mod main_context;
pub mod memory;
pub mod schema;
pub mod session;
pub mod value;

pub use change::{ChangeOp, ChangeSet, MergePolicy, RecordChange};
pub use coordinator::{Filter, SortKey, StoreCoordinator};
pub use main_context::{MainContext, MainContextHandle};
pub use memory::MemoryStore;
pub use schema::{AttributeDescriptor, AttributeKind, Cardinality, EntitySchema, RelationshipDescriptor};
pub use session::Session;
pub use value::{AttributeMap, AttributeValue, Record};
