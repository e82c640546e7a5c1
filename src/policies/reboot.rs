//! # Hardware restart after the application has terminated.
//!
//! [`decide`] is pure: it turns the lifecycle settings and the bring-up
//! outcome into a [`RestartDecision`]. [`execute`] carries a positive
//! decision out: wait, reset through the platform OS, cancel the abort token.
//!
//! ```text
//! restart_on_app_failure = false      → no restart
//! device never brought up             → no restart (nothing can reset)
//! otherwise                           → restart after max(delay, 0) seconds
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::device::PlatformOs;
use crate::error::DeviceError;
use crate::events::{Bus, Event, EventKind};
use crate::settings::LifecycleSettings;

/// Outcome of [`decide`]; derived once per shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartDecision {
    pub restart: bool,
    pub delay_seconds: u32,
}

impl RestartDecision {
    pub const NO_RESTART: RestartDecision = RestartDecision {
        restart: false,
        delay_seconds: 0,
    };

    pub fn delay(&self) -> Duration {
        Duration::from_secs(u64::from(self.delay_seconds))
    }
}

/// Why [`decide`] said no.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoRestartReason {
    Disabled,
    DeviceUnavailable,
}

impl NoRestartReason {
    pub fn as_message(self) -> &'static str {
        match self {
            NoRestartReason::Disabled => "automatic restart disabled",
            NoRestartReason::DeviceUnavailable => {
                "initialization failure prevents automatic restart"
            }
        }
    }
}

pub fn decide(config: &LifecycleSettings, device_available: bool) -> RestartDecision {
    match explain(config, device_available) {
        Some(_) => RestartDecision::NO_RESTART,
        None => RestartDecision {
            restart: true,
            delay_seconds: config.app_failure_restart_delay_seconds.max(0).unsigned_abs(),
        },
    }
}

/// Reason a restart will not happen, `None` if it will.
pub fn explain(config: &LifecycleSettings, device_available: bool) -> Option<NoRestartReason> {
    if !config.restart_on_app_failure {
        Some(NoRestartReason::Disabled)
    } else if !device_available {
        Some(NoRestartReason::DeviceUnavailable)
    } else {
        None
    }
}

/// Waits the decided delay, requests a hardware reset and cancels `abort`.
///
/// The reset is published as [`EventKind::DeviceReset`], or as
/// [`EventKind::ResetFailed`] with the error, which is also returned; `abort`
/// is cancelled either way.
pub async fn execute(
    decision: RestartDecision,
    os: Arc<dyn PlatformOs>,
    abort: CancellationToken,
    bus: Bus,
) -> Result<(), DeviceError> {
    if !decision.restart {
        return Ok(());
    }
    bus.publish(Event::new(EventKind::RestartScheduled).with_delay(decision.delay()));
    tokio::time::sleep(decision.delay()).await;

    let res = os.reset();
    match &res {
        Ok(()) => bus.publish(Event::new(EventKind::DeviceReset)),
        Err(e) => bus.publish(Event::new(EventKind::ResetFailed).with_reason(e.to_string())),
    }
    abort.cancel();
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::args::LaunchArgs;
    use crate::hardware::DeviceCapabilities;

    fn lifecycle(restart: bool, delay: i32) -> LifecycleSettings {
        LifecycleSettings {
            restart_on_app_failure: restart,
            app_failure_restart_delay_seconds: delay,
        }
    }

    #[test]
    fn disabled_never_restarts() {
        for delay in [-10, 0, 5, 3600] {
            for device in [true, false] {
                assert_eq!(
                    decide(&lifecycle(false, delay), device),
                    RestartDecision::NO_RESTART
                );
            }
        }
    }

    #[test]
    fn missing_device_never_restarts() {
        let config = lifecycle(true, 5);
        assert_eq!(decide(&config, false), RestartDecision::NO_RESTART);
        assert_eq!(
            explain(&config, false),
            Some(NoRestartReason::DeviceUnavailable)
        );
    }

    #[test]
    fn enabled_with_device_restarts_after_delay() {
        assert_eq!(
            decide(&lifecycle(true, 7), true),
            RestartDecision {
                restart: true,
                delay_seconds: 7
            }
        );
        assert_eq!(decide(&lifecycle(true, -4), true).delay_seconds, 0);
    }

    #[derive(Default)]
    struct CountingOs(AtomicUsize);

    impl PlatformOs for CountingOs {
        fn initialize(&self, _: &DeviceCapabilities, _: &LaunchArgs) -> Result<(), DeviceError> {
            Ok(())
        }
        fn reset(&self) -> Result<(), DeviceError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn execute_waits_then_resets_and_cancels() {
        let os = Arc::new(CountingOs::default());
        let abort = CancellationToken::new();
        let decision = decide(&lifecycle(true, 3), true);

        let started = tokio::time::Instant::now();
        execute(decision, os.clone(), abort.clone(), Bus::new(8))
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_secs(3));
        assert_eq!(os.0.load(Ordering::SeqCst), 1);
        assert!(abort.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn board_firmware_accepts_the_reset() {
        use crate::device::Device;
        use crate::devices::Board;
        use crate::hardware::DeviceVariant;

        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let abort = CancellationToken::new();
        let os = Board::new(DeviceVariant::F7FeatherV2).platform_os();

        let res = execute(decide(&lifecycle(true, 0), true), os, abort.clone(), bus).await;

        assert!(res.is_ok(), "{res:?}");
        assert!(abort.is_cancelled());
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::RestartScheduled);
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::DeviceReset);
    }

    #[tokio::test]
    async fn host_reset_is_reported_as_failed() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let abort = CancellationToken::new();

        let res = execute(
            decide(&lifecycle(true, 0), true),
            Arc::new(crate::devices::HostOs),
            abort.clone(),
            bus,
        )
        .await;

        assert!(matches!(res, Err(DeviceError::Unsupported { .. })));
        assert!(abort.is_cancelled());
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::RestartScheduled);
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::ResetFailed);
    }

    #[tokio::test]
    async fn execute_without_restart_does_nothing() {
        let os = Arc::new(CountingOs::default());
        let abort = CancellationToken::new();
        execute(RestartDecision::NO_RESTART, os.clone(), abort.clone(), Bus::new(8))
            .await
            .unwrap();
        assert_eq!(os.0.load(Ordering::SeqCst), 0);
        assert!(!abort.is_cancelled());
    }
}
