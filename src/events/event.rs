//! # Runtime events emitted by the supervisor, bring-up and subsystem actors.
//!
//! [`EventKind`] groups events into:
//! - **Bring-up**: platform detection, resolution, device/app construction, storage
//! - **Lifecycle**: state transitions, faults, crash capture, shutdown, restart
//! - **Subsystems**: background task attempts, backoff, terminal states
//! - **Subscribers**: overflow and panic of event subscribers
//!
//! Each kind has a fixed [`LogLevel`] (see [`EventKind::level`]).
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use boardvisor::{Event, EventKind, LifecycleState, LogLevel};
//!
//! let ev = Event::new(EventKind::StateChanged)
//!     .with_transition(LifecycleState::Initializing, LifecycleState::Faulted);
//!
//! assert_eq!(ev.state, Some(LifecycleState::Faulted));
//! assert_eq!(ev.level(), LogLevel::Info);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::core::LifecycleState;
use crate::settings::LogLevel;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Bring-up ===
    /// Sets `reason`: platform label.
    PlatformDetected,
    /// Sets `task`: app name, `reason`: device target.
    AppResolved,
    /// Non-fatal resolver condition. Sets `reason`.
    ResolveWarning,
    /// Sets `reason`: device target.
    DeviceConstructed,
    /// Reliability service could not be attached. Sets `reason`.
    ReliabilityUnavailable,
    /// Device and platform OS initialized.
    PlatformInitialized,
    /// A storage area could not be prepared. Sets `task`: path, `reason`.
    StorageWarning,
    /// Sets `task`: app name.
    AppConstructed,
    /// Sets `task`: subsystem name.
    SubsystemStarted,
    /// Subsystem enabled but not started. Sets `task`, `reason`.
    SubsystemSkipped,
    /// Sets `task`: subsystem name.
    SubsystemStopped,
    /// Fatal bring-up error. Sets `reason`.
    BringUpFailed,
    /// Settings file unusable; defaults used. Sets `reason`.
    SettingsWarning,

    // === Lifecycle ===
    /// Sets `prev_state`, `state`.
    StateChanged,
    /// Previous boot ended in a crash; reliability hook ran.
    BootFromCrash,
    /// Reliability hook failed. Sets `reason`.
    BootFromCrashFailed,
    /// Application fault. Sets `task`: phase, `reason`: error.
    AppFault,
    /// One line of a captured fault (type, message, stack or inner cause). Sets `reason`.
    CrashDetail,
    /// Crash record written. Sets `reason`: path.
    CrashRecorded,
    /// Crash record could not be written. Sets `reason`.
    CrashWriteFailed,
    /// The app's error hook failed. Sets `reason`.
    ErrorHandlerFailed,
    /// Graceful shutdown requested (handle or OS signal).
    ShutdownRequested,
    /// Shutdown hook finished within the grace period.
    ShutdownWithinGrace,
    /// Shutdown hook still running when the grace period ended. Sets `timeout_ms`.
    GraceExceeded,
    /// Shutdown or disposal hook failed. Sets `task`: hook, `reason`.
    ShutdownFault,
    /// Hardware reset pending. Sets `delay_ms`.
    RestartScheduled,
    /// Restart not possible or disabled. Sets `reason`.
    RestartSkipped,
    /// Hardware reset accepted by the platform OS.
    DeviceReset,
    /// Hardware reset request failed. Sets `reason`.
    ResetFailed,
    /// External termination observed; supervisor returns.
    TerminateRequested,

    // === Subsystem tasks ===
    /// Sets `task`, `attempt`.
    TaskStarting,
    /// Finished successfully or cancelled. Sets `task`, `attempt`.
    TaskStopped,
    /// Sets `task`, `attempt`, `reason`.
    TaskFailed,
    /// Sets `task`, `attempt`, `timeout_ms`.
    TimeoutHit,
    /// Sets `task`, `attempt`, `delay_ms`, `backoff_source`, optional `reason`.
    BackoffScheduled,
    /// Restart policy exhausted. Sets `task`, `attempt`.
    ActorExhausted,
    /// Fatal task error. Sets `task`, `attempt`, `reason`.
    ActorDead,

    // === Subscribers ===
    /// Sets `task`: subscriber name, `reason`: panic message.
    SubscriberPanicked,
    /// Sets `task`: subscriber name, `reason`: "full" or "closed".
    SubscriberOverflow,
}

impl EventKind {
    /// Severity used by log subscribers.
    pub fn level(self) -> LogLevel {
        use EventKind::*;
        match self {
            BringUpFailed | AppFault | CrashDetail | BootFromCrashFailed | ResetFailed
            | ActorDead | SubscriberPanicked => LogLevel::Error,
            ResolveWarning | ReliabilityUnavailable | StorageWarning | SubsystemSkipped
            | SettingsWarning | CrashWriteFailed | ErrorHandlerFailed | GraceExceeded
            | ShutdownFault | RestartSkipped | TaskFailed | TimeoutHit | SubscriberOverflow => {
                LogLevel::Warn
            }
            PlatformDetected | AppResolved | StateChanged | BootFromCrash | CrashRecorded
            | ShutdownRequested | RestartScheduled | DeviceReset | TerminateRequested
            | SubsystemStarted | SubsystemStopped => LogLevel::Info,
            DeviceConstructed | PlatformInitialized | AppConstructed | ShutdownWithinGrace
            | TaskStarting | TaskStopped | BackoffScheduled | ActorExhausted => LogLevel::Debug,
        }
    }

    /// Short stable label, used as the log line tag.
    pub fn as_label(self) -> &'static str {
        use EventKind::*;
        match self {
            PlatformDetected => "platform-detected",
            AppResolved => "app-resolved",
            ResolveWarning => "resolve-warning",
            DeviceConstructed => "device-constructed",
            ReliabilityUnavailable => "reliability-unavailable",
            PlatformInitialized => "platform-initialized",
            StorageWarning => "storage-warning",
            AppConstructed => "app-constructed",
            SubsystemStarted => "subsystem-started",
            SubsystemSkipped => "subsystem-skipped",
            SubsystemStopped => "subsystem-stopped",
            BringUpFailed => "bringup-failed",
            SettingsWarning => "settings-warning",
            StateChanged => "state",
            BootFromCrash => "boot-from-crash",
            BootFromCrashFailed => "boot-from-crash-failed",
            AppFault => "app-fault",
            CrashDetail => "crash",
            CrashRecorded => "crash-recorded",
            CrashWriteFailed => "crash-write-failed",
            ErrorHandlerFailed => "error-handler-failed",
            ShutdownRequested => "shutdown-requested",
            ShutdownWithinGrace => "shutdown-within-grace",
            GraceExceeded => "grace-exceeded",
            ShutdownFault => "shutdown-fault",
            RestartScheduled => "restart-scheduled",
            RestartSkipped => "restart-skipped",
            DeviceReset => "device-reset",
            ResetFailed => "reset-failed",
            TerminateRequested => "terminate-requested",
            TaskStarting => "starting",
            TaskStopped => "stopped",
            TaskFailed => "failed",
            TimeoutHit => "timeout",
            BackoffScheduled => "backoff",
            ActorExhausted => "exhausted",
            ActorDead => "dead",
            SubscriberPanicked => "subscriber-panicked",
            SubscriberOverflow => "subscriber-overflow",
        }
    }
}

/// Reason for scheduling the next run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffSource {
    Success,
    Failure,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    pub seq: u64,
    pub at: SystemTime,
    pub kind: EventKind,

    /// Subject: task, subsystem, app, hook or path, depending on the kind.
    pub task: Option<Arc<str>>,
    /// Human-readable detail.
    pub reason: Option<Arc<str>>,
    /// Attempt count (starting from 1).
    pub attempt: Option<u64>,
    pub timeout_ms: Option<u32>,
    pub delay_ms: Option<u32>,
    pub backoff_source: Option<BackoffSource>,
    /// Lifecycle state before a transition.
    pub prev_state: Option<LifecycleState>,
    /// Lifecycle state after a transition.
    pub state: Option<LifecycleState>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            reason: None,
            attempt: None,
            timeout_ms: None,
            delay_ms: None,
            backoff_source: None,
            prev_state: None,
            state: None,
        }
    }

    #[inline]
    pub fn level(&self) -> LogLevel {
        self.kind.level()
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    #[inline]
    pub fn with_attempt(mut self, n: u64) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Stored as milliseconds, saturating at `u32::MAX`.
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(millis(d));
        self
    }

    /// Stored as milliseconds, saturating at `u32::MAX`.
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(millis(d));
        self
    }

    #[inline]
    pub fn with_backoff_source(mut self, source: BackoffSource) -> Self {
        self.backoff_source = Some(source);
        self
    }

    #[inline]
    pub fn with_transition(mut self, from: LifecycleState, to: LifecycleState) -> Self {
        self.prev_state = Some(from);
        self.state = Some(to);
        self
    }

    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(reason)
    }

    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }
}

fn millis(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::TaskStarting);
        let b = Event::new(EventKind::TaskStopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn durations_saturate() {
        let ev = Event::new(EventKind::RestartScheduled).with_delay(Duration::from_secs(u64::MAX));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }

    #[test]
    fn faults_are_errors_and_steps_are_debug() {
        assert_eq!(EventKind::AppFault.level(), LogLevel::Error);
        assert_eq!(EventKind::GraceExceeded.level(), LogLevel::Warn);
        assert_eq!(EventKind::AppConstructed.level(), LogLevel::Debug);
    }
}
