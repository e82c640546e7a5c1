use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::{
    error::TaskError,
    events::{Bus, Event, EventKind},
    tasks::Task,
};

/// Executes a single attempt of `task`, publishing exactly one terminal event.
///
/// - `TaskStopped` on `Ok(())` or `Err(Canceled)`
/// - `TaskFailed` on any other error (`TimeoutHit` first, when the timeout fired)
///
/// The attempt runs under a child of `parent`; the child is cancelled on timeout.
pub async fn run_once<T: Task + ?Sized>(
    task: &T,
    parent: &CancellationToken,
    timeout: Option<Duration>,
    attempt: u64,
    bus: &Bus,
) -> Result<(), TaskError> {
    let child = parent.child_token();

    let res = match timeout.filter(|d| *d > Duration::ZERO) {
        Some(dur) => match time::timeout(dur, task.spawn(child.clone())).await {
            Ok(r) => r,
            Err(_elapsed) => {
                child.cancel();
                bus.publish(
                    Event::new(EventKind::TimeoutHit)
                        .with_task(task.name())
                        .with_timeout(dur)
                        .with_attempt(attempt),
                );
                Err(TaskError::Timeout { timeout: dur })
            }
        },
        None => task.spawn(child.clone()).await,
    };

    match &res {
        Ok(()) | Err(TaskError::Canceled) => bus.publish(
            Event::new(EventKind::TaskStopped)
                .with_task(task.name())
                .with_attempt(attempt),
        ),
        Err(e) => bus.publish(
            Event::new(EventKind::TaskFailed)
                .with_task(task.name())
                .with_attempt(attempt)
                .with_reason(e.to_string()),
        ),
    }
    res
}
