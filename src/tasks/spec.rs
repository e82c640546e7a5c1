use std::time::Duration;

use crate::policies::{BackoffPolicy, RestartPolicy};
use crate::tasks::task::TaskRef;

/// How a subsystem task is supervised by its actor.
///
/// Two shapes cover every subsystem:
/// - [`TaskSpec::subsystem`]: long-running (connectivity, updates); a clean
///   return ends it, a failure restarts it after exponential backoff;
/// - [`TaskSpec::periodic`]: one report per attempt (health metrics),
///   re-run every `interval` for as long as the runtime lives.
#[derive(Clone)]
pub struct TaskSpec {
    task: TaskRef,
    restart: RestartPolicy,
    backoff: BackoffPolicy,
    timeout: Option<Duration>,
}

impl TaskSpec {
    pub fn new(
        task: TaskRef,
        restart: RestartPolicy,
        backoff: BackoffPolicy,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            task,
            restart,
            backoff,
            timeout,
        }
    }

    pub fn subsystem(task: TaskRef) -> Self {
        Self::new(task, RestartPolicy::OnFailure, BackoffPolicy::subsystem(), None)
    }

    /// Each attempt is bounded by `interval`, so a hung report cannot
    /// delay the next one indefinitely.
    pub fn periodic(task: TaskRef, interval: Duration) -> Self {
        Self::new(
            task,
            RestartPolicy::Always {
                interval: Some(interval),
            },
            BackoffPolicy::subsystem(),
            Some(interval),
        )
    }

    pub fn task(&self) -> &TaskRef {
        &self.task
    }

    pub fn name(&self) -> &str {
        self.task.name()
    }

    pub fn restart(&self) -> RestartPolicy {
        self.restart
    }

    pub fn backoff(&self) -> BackoffPolicy {
        self.backoff
    }

    /// Per-attempt limit; `None` runs each attempt to completion.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn is_periodic(&self) -> bool {
        matches!(self.restart, RestartPolicy::Always { interval: Some(_) })
    }
}
