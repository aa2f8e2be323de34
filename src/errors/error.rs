use thiserror::Error;
use uuid::Uuid;

/// Store and session level errors
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    #[error("session {session} owned by {owner} accessed from {accessor}")]
    ConfinementViolation {
        session: Uuid,
        owner: String,
        accessor: String,
    },

    #[error("no entity schema named '{0}'")]
    SchemaNotFound(String),

    #[error("fetch failed: {0}")]
    FetchFailed(String),

    #[error("merge conflict on {kind}.{attribute} for record {id}")]
    MergeConflict {
        kind: String,
        id: Uuid,
        attribute: String,
    },

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Export pipeline errors
#[derive(Debug, Error, Clone)]
pub enum ExportError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("encode failed: {0}")]
    EncodeFailed(String),

    #[error("write failed: {0}")]
    WriteFailed(String),
}

/// Task lifecycle errors
#[derive(Debug, Error, Clone)]
pub enum TaskError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Export(#[from] ExportError),

    /// Cooperative cancellation observed at a checkpoint. The runner maps this
    /// to the cancelled terminal state rather than a failure.
    #[error("task cancelled")]
    Cancelled,

    #[error("task error: {0}")]
    Other(String),
}
