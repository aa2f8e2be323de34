use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::{TaskError, TaskResult};
use crate::store::main_context::MainContextHandle;
use crate::store::{Session, StoreCoordinator};

/// What a task body wants done with its confined session's staged changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    Save,
    Discard,
}

/// Terminal and intermediate task states. A task reaches exactly one
/// terminal state; cancellation is distinct from failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Executing,
    Completed,
    Cancelled,
    Failed(String),
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskState::Pending | TaskState::Executing)
    }
}

/// Cooperative cancellation surface handed to task bodies. Bodies observe
/// cancellation at checkpoints; the runner adds its own before the body
/// starts and before merge.
#[derive(Clone)]
pub struct TaskContext {
    cancelled: Arc<AtomicBool>,
}

impl TaskContext {
    pub(crate) fn new(cancelled: Arc<AtomicBool>) -> Self {
        Self { cancelled }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Abort here if cancellation has been requested.
    pub fn checkpoint(&self) -> TaskResult<()> {
        if self.is_cancelled() {
            Err(TaskError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A unit of cancelable background work against the store.
///
/// The body runs on a dedicated worker with a confined session created for
/// this execution only; it must never touch the main session. Returning
/// `Commit::Save` commits staged changes durably, and — when `merge_changes`
/// is left at its default — propagates the committed change set into the
/// main session on the main context's own thread.
pub trait Task: Send {
    fn body(&mut self, session: &mut Session, ctx: &TaskContext) -> TaskResult<Commit>;

    /// Invoked exactly once, before the confined session is torn down, when
    /// cancellation is observed. Safe to call even if the body never started.
    fn will_cancel(&mut self) {}

    /// Whether committed changes propagate into the main session.
    fn merge_changes(&self) -> bool {
        true
    }
}

/// Drive one task to a terminal state on the current (worker) thread.
///
/// `Err(TaskError::Cancelled)` means the cancelled terminal state, any other
/// error the failed state. Uncommitted confined-session changes are dropped
/// with the session on every non-success path.
pub(crate) fn run_task(
    task: &mut dyn Task,
    coordinator: Arc<dyn StoreCoordinator>,
    main: &MainContextHandle,
    ctx: &TaskContext,
) -> TaskResult<()> {
    if ctx.is_cancelled() {
        task.will_cancel();
        return Err(TaskError::Cancelled);
    }

    // The confined session exists only for this execution and is bound to
    // the current worker thread.
    let mut session = Session::confined(coordinator);

    let decision = match task.body(&mut session, ctx) {
        Ok(decision) => decision,
        Err(TaskError::Cancelled) => {
            task.will_cancel();
            return Err(TaskError::Cancelled);
        }
        Err(err) => return Err(err),
    };

    // Checkpoint before merge: a cancellation landing after the body leaves
    // both the store and the main session untouched.
    if ctx.is_cancelled() {
        task.will_cancel();
        return Err(TaskError::Cancelled);
    }

    if decision == Commit::Save && session.has_changes()? {
        let set = session.commit()?;
        log::debug!("task committed {} change(s)", set.len());
        if task.merge_changes() {
            main.apply(set)?;
        }
    }

    Ok(())
}
