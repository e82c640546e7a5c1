//! # Task abstraction for background subsystems.
//!
//! A [`Task`] is a named unit of async work that can be started many times
//! (each restart calls [`Task::spawn`] again) and honors a cancellation token.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Future returned by [`Task::spawn`].
pub type BoxTaskFuture = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send + 'static>>;

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

/// # Asynchronous, cancelable unit.
///
/// Implementors should watch `ctx` and return (preferably with
/// `Err(TaskError::Canceled)` or `Ok(())`) once it is cancelled.
pub trait Task: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Creates the future for one attempt.
    fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture;
}
