//! Background tasks run by the subsystem actors.
//!
//! - [`Task`] trait, [`TaskRef`] shared handle
//! - [`TaskFn`] closure-backed task
//! - [`TaskSpec`] task plus restart/backoff/timeout policies

mod spec;
mod task;
mod task_fn;

pub use spec::TaskSpec;
pub use task::{BoxTaskFuture, Task, TaskRef};
pub use task_fn::TaskFn;
