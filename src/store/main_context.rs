use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::errors::{StoreError, StoreResult};

use super::change::{ChangeSet, MergePolicy};
use super::coordinator::StoreCoordinator;
use super::session::Session;

enum MainOp {
    Apply(ChangeSet, mpsc::Sender<StoreResult<()>>),
    With(Box<dyn FnOnce(&mut Session) + Send>),
    Shutdown,
}

/// Owns the long-lived main session on a dedicated thread and services a
/// mailbox of operations against it. The single mailbox serializes merges
/// into the main session, so concurrent merge-backs cannot lose updates.
///
/// The session lives on a plain thread rather than an async task because
/// session ownership is asserted by `ThreadId`, which async workers do not
/// keep stable.
pub struct MainContext {
    handle: MainContextHandle,
    join: Option<JoinHandle<()>>,
}

/// Cloneable submission handle onto the main context mailbox.
#[derive(Clone)]
pub struct MainContextHandle {
    tx: mpsc::Sender<MainOp>,
}

impl MainContext {
    pub fn start(coordinator: Arc<dyn StoreCoordinator>) -> StoreResult<Self> {
        Self::with_policy(coordinator, MergePolicy::default())
    }

    pub fn with_policy(
        coordinator: Arc<dyn StoreCoordinator>,
        policy: MergePolicy,
    ) -> StoreResult<Self> {
        let (tx, rx) = mpsc::channel::<MainOp>();
        let join = std::thread::Builder::new()
            .name("graphops-main".to_string())
            .spawn(move || {
                let mut session = Session::confined(coordinator);
                while let Ok(op) = rx.recv() {
                    match op {
                        MainOp::Apply(set, reply) => {
                            let result = session.apply(&set, policy);
                            if let Err(err) = &result {
                                log::error!("merge into main session failed: {}", err);
                            }
                            let _ = reply.send(result);
                        }
                        MainOp::With(f) => f(&mut session),
                        MainOp::Shutdown => break,
                    }
                }
            })
            .map_err(|e| StoreError::Backend(format!("failed to spawn main context: {}", e)))?;
        Ok(Self {
            handle: MainContextHandle { tx },
            join: Some(join),
        })
    }

    pub fn handle(&self) -> MainContextHandle {
        self.handle.clone()
    }
}

impl Drop for MainContext {
    fn drop(&mut self) {
        let _ = self.handle.tx.send(MainOp::Shutdown);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl MainContextHandle {
    /// Merge a committed change set into the main session, blocking until the
    /// main context has applied it. Callers are task workers, which own a
    /// blocking thread for their whole run.
    pub fn apply(&self, changes: ChangeSet) -> StoreResult<()> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(MainOp::Apply(changes, reply_tx))
            .map_err(|_| StoreError::Backend("main context stopped".to_string()))?;
        reply_rx
            .recv()
            .map_err(|_| StoreError::Backend("main context stopped".to_string()))?
    }

    /// Run a closure against the main session on its owning thread and return
    /// the closure's result.
    pub fn with_session<R, F>(&self, f: F) -> StoreResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut Session) -> R + Send + 'static,
    {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(MainOp::With(Box::new(move |session| {
                let _ = reply_tx.send(f(session));
            })))
            .map_err(|_| StoreError::Backend("main context stopped".to_string()))?;
        reply_rx
            .recv()
            .map_err(|_| StoreError::Backend("main context stopped".to_string()))
    }
}
