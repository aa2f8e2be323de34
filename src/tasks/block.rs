use std::time::Instant;

use crate::errors::TaskResult;
use crate::store::Session;

use super::task::{Commit, Task, TaskContext};

/// One execution block. The returned bool is the block's save vote.
pub type ExecutionBlock = Box<dyn FnMut(&mut Session) -> TaskResult<bool> + Send>;

/// Convenience task running a list of closures against the confined session.
/// Saves when any block voted to save or `save_after_execution` is set.
pub struct BlockTask {
    blocks: Vec<ExecutionBlock>,
    profiling_enabled: bool,
    save_after_execution: bool,
    merge_changes: bool,
}

impl BlockTask {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            profiling_enabled: false,
            save_after_execution: false,
            merge_changes: true,
        }
    }

    pub fn with_block<F>(block: F) -> Self
    where
        F: FnMut(&mut Session) -> TaskResult<bool> + Send + 'static,
    {
        let mut task = Self::new();
        task.add_block(block);
        task
    }

    pub fn add_block<F>(&mut self, block: F)
    where
        F: FnMut(&mut Session) -> TaskResult<bool> + Send + 'static,
    {
        self.blocks.push(Box::new(block));
    }

    /// Log per-block run times at debug level. Defaults to off.
    pub fn profiling_enabled(mut self, enabled: bool) -> Self {
        self.profiling_enabled = enabled;
        self
    }

    /// Save after all blocks ran, regardless of their votes. Defaults to off.
    pub fn save_after_execution(mut self, save: bool) -> Self {
        self.save_after_execution = save;
        self
    }

    pub fn merge_changes(mut self, merge: bool) -> Self {
        self.merge_changes = merge;
        self
    }
}

impl Default for BlockTask {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for BlockTask {
    fn body(&mut self, session: &mut Session, ctx: &TaskContext) -> TaskResult<Commit> {
        let mut save = self.save_after_execution;
        for (index, block) in self.blocks.iter_mut().enumerate() {
            ctx.checkpoint()?;
            let started = Instant::now();
            save |= block(session)?;
            if self.profiling_enabled {
                log::debug!("execution block {} ran in {:?}", index, started.elapsed());
            }
        }
        Ok(if save { Commit::Save } else { Commit::Discard })
    }

    fn merge_changes(&self) -> bool {
        self.merge_changes
    }
}
