mod error;

pub use error::{ExportError, StoreError, TaskError};

/// Result type for store and session operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for task bodies and the task runner
pub type TaskResult<T> = Result<T, TaskError>;
