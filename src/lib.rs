//! Background task confinement and bulk export over a shared object graph
//! store.
//!
//! Each submitted task runs against a private session confined to its worker
//! thread; committed changes propagate back into the long-lived main session
//! at attribute granularity, on the main session's own thread. The export
//! task streams a filtered, ordered subset of one entity kind through a
//! pluggable [`export::Formatter`] into a named byte sequence.

pub mod errors;
pub mod export;
pub mod store;
pub mod tasks;

pub use errors::{ExportError, StoreError, TaskError};
pub use export::{ExportSink, ExportTask, Formatter};
pub use store::{
    AttributeValue, ChangeSet, EntitySchema, Filter, MainContext, MergePolicy, Record, Session,
    SortKey, StoreCoordinator,
};
pub use tasks::{BlockTask, Commit, Task, TaskHandle, TaskQueue, TaskState};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{CsvFormatter, FileSink};
    use crate::store::schema::{AttributeDescriptor, AttributeKind};
    use crate::store::MemoryStore;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[tokio::test]
    async fn end_to_end_export_through_the_queue() {
        let _ = env_logger::builder().is_test(true).try_init();
        let store = Arc::new(MemoryStore::new(vec![EntitySchema::new(
            "Invoice",
            vec![
                AttributeDescriptor::new("number", AttributeKind::String),
                AttributeDescriptor::new("total", AttributeKind::Number),
            ],
        )]));
        for (number, total) in [("A-1", 10.0), ("A-2", 20.0)] {
            store
                .seed(
                    "Invoice",
                    HashMap::from([
                        (
                            "number".to_string(),
                            AttributeValue::String(number.to_string()),
                        ),
                        ("total".to_string(), AttributeValue::Number(total)),
                    ]),
                )
                .unwrap();
        }

        let main = MainContext::start(store.clone()).unwrap();
        let queue = TaskQueue::new(store, main.handle(), 2);

        let dir = tempfile::tempdir().unwrap();
        let task = ExportTask::new(
            "Invoice",
            Box::new(CsvFormatter::default()),
            Arc::new(FileSink::new(dir.path())),
        )
        .with_order(vec![SortKey::ascending("number")]);

        let mut handle = queue.submit(Box::new(task));
        assert_eq!(handle.wait().await, TaskState::Completed);

        let written = std::fs::read_to_string(dir.path().join("Invoice.csv")).unwrap();
        assert_eq!(written, "number,total\nA-1,10.0\nA-2,20.0");
    }
}
