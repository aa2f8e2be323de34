pub mod block;
pub mod queue;
pub mod task;

pub use block::{BlockTask, ExecutionBlock};
pub use queue::{QueueStats, TaskHandle, TaskQueue};
pub use task::{Commit, Task, TaskContext, TaskState};
