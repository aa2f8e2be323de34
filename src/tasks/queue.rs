use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Semaphore};
use uuid::Uuid;

use crate::errors::TaskError;
use crate::store::main_context::MainContextHandle;
use crate::store::StoreCoordinator;

use super::task::{run_task, Task, TaskContext, TaskState};

/// Handle for observing and cancelling one submitted task.
pub struct TaskHandle {
    id: Uuid,
    state_rx: watch::Receiver<TaskState>,
    cancelled: Arc<AtomicBool>,
}

impl TaskHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Request cooperative cancellation, observed at the task's checkpoints.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn state(&self) -> TaskState {
        self.state_rx.borrow().clone()
    }

    /// Wait for the task to reach its terminal state.
    pub async fn wait(&mut self) -> TaskState {
        loop {
            let state = self.state_rx.borrow().clone();
            if state.is_terminal() {
                return state;
            }
            if self.state_rx.changed().await.is_err() {
                return self.state_rx.borrow().clone();
            }
        }
    }
}

/// Queue statistics snapshot.
#[derive(Debug, Clone)]
pub struct QueueStats {
    pub active: usize,
    pub submitted: usize,
    pub capacity: usize,
}

/// Worker-pool task queue. Independent tasks may run in parallel up to
/// `max_concurrent`; no ordering is guaranteed between them. Each accepted
/// task occupies one blocking worker for its whole body.
pub struct TaskQueue {
    coordinator: Arc<dyn StoreCoordinator>,
    main: MainContextHandle,
    semaphore: Arc<Semaphore>,
    active: Arc<AtomicUsize>,
    submitted: Arc<AtomicUsize>,
    capacity: usize,
}

impl TaskQueue {
    pub fn new(
        coordinator: Arc<dyn StoreCoordinator>,
        main: MainContextHandle,
        max_concurrent: usize,
    ) -> Self {
        Self {
            coordinator,
            main,
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            active: Arc::new(AtomicUsize::new(0)),
            submitted: Arc::new(AtomicUsize::new(0)),
            capacity: max_concurrent,
        }
    }

    /// Submit a task for execution. Must be called within a tokio runtime.
    pub fn submit(&self, mut task: Box<dyn Task>) -> TaskHandle {
        let id = Uuid::new_v4();
        let (state_tx, state_rx) = watch::channel(TaskState::Pending);
        let cancelled = Arc::new(AtomicBool::new(false));

        self.submitted.fetch_add(1, Ordering::Relaxed);

        let coordinator = self.coordinator.clone();
        let main = self.main.clone();
        let semaphore = self.semaphore.clone();
        let active = self.active.clone();
        let ctx = TaskContext::new(cancelled.clone());

        tokio::spawn(async move {
            let permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    let _ = state_tx.send(TaskState::Failed("queue closed".to_string()));
                    return;
                }
            };

            active.fetch_add(1, Ordering::Relaxed);
            let _ = state_tx.send(TaskState::Executing);

            let result = tokio::task::spawn_blocking(move || {
                let outcome = run_task(task.as_mut(), coordinator, &main, &ctx);
                drop(task);
                outcome
            })
            .await;

            let state = match result {
                Ok(Ok(())) => TaskState::Completed,
                Ok(Err(TaskError::Cancelled)) => TaskState::Cancelled,
                Ok(Err(err)) => {
                    log::error!("task {} failed: {}", id, err);
                    TaskState::Failed(err.to_string())
                }
                Err(join_err) => {
                    log::error!("task {} worker panicked: {}", id, join_err);
                    TaskState::Failed(format!("worker panicked: {}", join_err))
                }
            };

            active.fetch_sub(1, Ordering::Relaxed);
            let _ = state_tx.send(state);
            drop(permit);
        });

        TaskHandle {
            id,
            state_rx,
            cancelled,
        }
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            active: self.active.load(Ordering::Relaxed),
            submitted: self.submitted.load(Ordering::Relaxed),
            capacity: self.capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{StoreError, TaskResult};
    use crate::store::schema::{AttributeDescriptor, AttributeKind, EntitySchema};
    use crate::store::{AttributeValue, MainContext, MemoryStore, Session, StoreCoordinator};
    use crate::tasks::block::BlockTask;
    use std::collections::HashMap;
    use std::sync::mpsc;

    fn fixtures() -> (Arc<MemoryStore>, MainContext) {
        let _ = env_logger::builder().is_test(true).try_init();
        let store = Arc::new(MemoryStore::new(vec![EntitySchema::new(
            "Invoice",
            vec![AttributeDescriptor::new("total", AttributeKind::Number)],
        )]));
        let main = MainContext::start(store.clone()).unwrap();
        (store, main)
    }

    #[tokio::test]
    async fn submitted_task_completes_and_merges() {
        let (store, main) = fixtures();
        let queue = TaskQueue::new(store.clone(), main.handle(), 2);

        let task = BlockTask::with_block(|session: &mut Session| {
            session.insert(
                "Invoice",
                HashMap::from([("total".to_string(), AttributeValue::Number(5.0))]),
            )?;
            Ok(true)
        });

        let mut handle = queue.submit(Box::new(task));
        assert_eq!(handle.wait().await, TaskState::Completed);
        assert_eq!(store.fetch("Invoice", None, &[]).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fetch_failure_terminates_failed_and_leaves_main_unchanged() {
        let (store, main) = fixtures();
        let id = store
            .seed(
                "Invoice",
                HashMap::from([("total".to_string(), AttributeValue::Number(1.0))]),
            )
            .unwrap();
        let handle = main.handle();
        handle
            .with_session(|session| {
                session.fetch("Invoice", None, &[]).unwrap();
            })
            .unwrap();

        let queue = TaskQueue::new(store.clone(), main.handle(), 1);
        let task = BlockTask::with_block(|_session: &mut Session| -> TaskResult<bool> {
            Err(StoreError::FetchFailed("disk gone".to_string()).into())
        });

        let mut task_handle = queue.submit(Box::new(task));
        match task_handle.wait().await {
            TaskState::Failed(message) => assert!(message.contains("fetch failed")),
            other => panic!("expected failed state, got {:?}", other),
        }

        let value = handle
            .with_session(move |session| session.attribute("Invoice", id, "total").unwrap())
            .unwrap();
        assert_eq!(value, Some(AttributeValue::Number(1.0)));
    }

    #[tokio::test]
    async fn cancellation_before_start_terminates_cancelled() {
        let (store, main) = fixtures();
        let queue = TaskQueue::new(store.clone(), main.handle(), 1);

        // Occupy the only worker slot until released.
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let blocker = BlockTask::with_block(move |_session: &mut Session| {
            let _ = gate_rx.recv();
            Ok(false)
        });
        let mut blocker_handle = queue.submit(Box::new(blocker));

        let victim = BlockTask::with_block(|_session: &mut Session| {
            panic!("cancelled task body must not run")
        });
        let mut victim_handle = queue.submit(Box::new(victim));
        victim_handle.cancel();

        gate_tx.send(()).unwrap();
        assert_eq!(blocker_handle.wait().await, TaskState::Completed);
        assert_eq!(victim_handle.wait().await, TaskState::Cancelled);
    }

    #[tokio::test]
    async fn stats_reflect_submissions() {
        let (store, main) = fixtures();
        let queue = TaskQueue::new(store, main.handle(), 3);
        assert_eq!(queue.stats().capacity, 3);

        let mut handle = queue.submit(Box::new(BlockTask::new()));
        handle.wait().await;
        assert_eq!(queue.stats().submitted, 1);
        assert_eq!(queue.stats().active, 0);
    }
}
