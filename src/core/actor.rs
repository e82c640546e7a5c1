//! # Retry loop for one background subsystem.
//!
//! ```text
//! loop {
//!   ├─► attempt += 1, publish TaskStarting
//!   ├─► run_once(task, timeout)
//!   │     ├─ Ok       ─► Never/OnFailure: exit(Exhausted)
//!   │     │              Always{interval}: sleep(interval), continue
//!   │     ├─ Canceled ─► exit(Cancelled)
//!   │     ├─ Fatal    ─► publish ActorDead, exit(Fatal)
//!   │     └─ Err      ─► Never: exit(Exhausted)
//!   │                    else: delay = backoff.next(failures), publish BackoffScheduled, sleep
//!   └─ token cancelled at any wait ─► exit(Cancelled)
//! }
//! ```
//! The failure counter resets after a successful attempt. An attempt that
//! ends after the token was cancelled always exits with `Cancelled`.

use std::{sync::Arc, time::Duration};

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::{
    core::runner::run_once,
    error::TaskError,
    events::{BackoffSource, Bus, Event, EventKind},
    policies::{BackoffPolicy, RestartPolicy},
    tasks::{Task, TaskSpec},
};

#[derive(Clone, Copy, Debug)]
pub struct TaskActorParams {
    pub restart: RestartPolicy,
    pub backoff: BackoffPolicy,
    pub timeout: Option<Duration>,
}

impl From<&TaskSpec> for TaskActorParams {
    fn from(spec: &TaskSpec) -> Self {
        Self {
            restart: spec.restart(),
            backoff: spec.backoff(),
            timeout: spec.timeout(),
        }
    }
}

/// Why an actor stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActorExitReason {
    /// Restart policy does not allow another attempt.
    Exhausted,
    /// Token cancelled.
    Cancelled,
    /// Task returned [`TaskError::Fatal`].
    Fatal,
}

pub struct TaskActor {
    task: Arc<dyn Task>,
    params: TaskActorParams,
    bus: Bus,
}

impl TaskActor {
    pub fn new(bus: Bus, task: Arc<dyn Task>, params: TaskActorParams) -> Self {
        Self { task, params, bus }
    }

    pub async fn run(self, token: CancellationToken) -> ActorExitReason {
        let mut attempt: u64 = 0;
        let mut failures: u32 = 0;

        loop {
            if token.is_cancelled() {
                return ActorExitReason::Cancelled;
            }
            attempt += 1;
            self.bus.publish(
                Event::new(EventKind::TaskStarting)
                    .with_task(self.task.name())
                    .with_attempt(attempt),
            );

            let res = run_once(
                self.task.as_ref(),
                &token,
                self.params.timeout,
                attempt,
                &self.bus,
            )
            .await;
            if token.is_cancelled() {
                return ActorExitReason::Cancelled;
            }

            let delay = match res {
                Ok(()) => {
                    failures = 0;
                    match self.params.restart {
                        RestartPolicy::Always { interval } => {
                            let delay = interval.unwrap_or(Duration::ZERO);
                            self.publish_backoff(attempt, delay, BackoffSource::Success, None);
                            delay
                        }
                        RestartPolicy::Never | RestartPolicy::OnFailure => {
                            return self.exhausted(attempt);
                        }
                    }
                }
                Err(TaskError::Canceled) => return ActorExitReason::Cancelled,
                Err(TaskError::Fatal { error }) => {
                    self.bus.publish(
                        Event::new(EventKind::ActorDead)
                            .with_task(self.task.name())
                            .with_attempt(attempt)
                            .with_reason(error),
                    );
                    return ActorExitReason::Fatal;
                }
                Err(e) => {
                    if matches!(self.params.restart, RestartPolicy::Never) {
                        return self.exhausted(attempt);
                    }
                    let delay = self.params.backoff.next(failures);
                    failures = failures.saturating_add(1);
                    self.publish_backoff(
                        attempt,
                        delay,
                        BackoffSource::Failure,
                        Some(e.to_string()),
                    );
                    delay
                }
            };

            select! {
                _ = time::sleep(delay) => {}
                _ = token.cancelled() => return ActorExitReason::Cancelled,
            }
        }
    }

    fn exhausted(&self, attempt: u64) -> ActorExitReason {
        self.bus.publish(
            Event::new(EventKind::ActorExhausted)
                .with_task(self.task.name())
                .with_attempt(attempt),
        );
        ActorExitReason::Exhausted
    }

    fn publish_backoff(
        &self,
        attempt: u64,
        delay: Duration,
        source: BackoffSource,
        reason: Option<String>,
    ) {
        let mut ev = Event::new(EventKind::BackoffScheduled)
            .with_task(self.task.name())
            .with_attempt(attempt)
            .with_delay(delay)
            .with_backoff_source(source);
        if let Some(r) = reason {
            ev = ev.with_reason(r);
        }
        self.bus.publish(ev);
    }
}
