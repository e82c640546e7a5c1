//! # Optional background subsystems.
//!
//! Connectivity, update delivery and health reporting run as supervised task
//! actors, each under its own child of the runtime token. The set owns the
//! handles (join handle plus token); the supervisor only starts them during
//! bring-up and stops them explicitly.
//!
//! ```text
//! cloud.enabled              ─► Connectivity   (OnFailure + subsystem backoff)
//! cloud.enable_updates       ─► Updates        (OnFailure + subsystem backoff)
//! cloud.enable_health_metrics ─► HealthMetrics (Always every interval; skipped if interval = 0)
//! ```
//!
//! A subsystem is started only if the device supplies a task for it.

use std::collections::HashMap;
use std::fmt;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::actor::{ActorExitReason, TaskActor, TaskActorParams};
use crate::device::Device;
use crate::events::{Bus, Event, EventKind};
use crate::settings::CloudSettings;
use crate::tasks::TaskSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubsystemKind {
    Connectivity,
    Updates,
    HealthMetrics,
}

impl SubsystemKind {
    pub const ALL: [SubsystemKind; 3] = [
        SubsystemKind::Connectivity,
        SubsystemKind::Updates,
        SubsystemKind::HealthMetrics,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SubsystemKind::Connectivity => "connectivity",
            SubsystemKind::Updates => "updates",
            SubsystemKind::HealthMetrics => "health-metrics",
        }
    }

    fn enabled(self, cloud: &CloudSettings) -> bool {
        match self {
            SubsystemKind::Connectivity => cloud.enabled,
            SubsystemKind::Updates => cloud.enable_updates,
            SubsystemKind::HealthMetrics => cloud.enable_health_metrics,
        }
    }
}

impl fmt::Display for SubsystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Handle {
    join: JoinHandle<ActorExitReason>,
    cancel: CancellationToken,
}

/// Running subsystems keyed by kind.
pub struct SubsystemSet {
    running: HashMap<SubsystemKind, Handle>,
    bus: Bus,
}

impl SubsystemSet {
    pub fn empty(bus: Bus) -> Self {
        Self {
            running: HashMap::new(),
            bus,
        }
    }

    /// Starts every subsystem enabled by the (already cascaded) cloud flags.
    pub fn start(
        device: &dyn Device,
        cloud: &CloudSettings,
        bus: &Bus,
        runtime_token: &CancellationToken,
    ) -> Self {
        let mut set = Self::empty(bus.clone());

        for kind in SubsystemKind::ALL {
            if !kind.enabled(cloud) {
                continue;
            }
            let Some(task) = device.subsystem(kind, cloud) else {
                set.skip(kind, "device provides no implementation");
                continue;
            };
            let spec = match kind {
                SubsystemKind::HealthMetrics => match cloud.health_interval() {
                    Some(interval) => TaskSpec::periodic(task, interval),
                    None => {
                        set.skip(kind, "health metrics interval is 0");
                        continue;
                    }
                },
                SubsystemKind::Connectivity | SubsystemKind::Updates => TaskSpec::subsystem(task),
            };
            set.spawn(kind, spec, runtime_token);
        }
        set
    }

    fn skip(&self, kind: SubsystemKind, reason: &'static str) {
        self.bus.publish(
            Event::new(EventKind::SubsystemSkipped)
                .with_task(kind.as_str())
                .with_reason(reason),
        );
    }

    fn spawn(&mut self, kind: SubsystemKind, spec: TaskSpec, runtime_token: &CancellationToken) {
        let cancel = runtime_token.child_token();
        let actor = TaskActor::new(
            self.bus.clone(),
            spec.task().clone(),
            TaskActorParams::from(&spec),
        );
        let join = tokio::spawn(actor.run(cancel.clone()));

        self.running.insert(kind, Handle { join, cancel });
        self.bus
            .publish(Event::new(EventKind::SubsystemStarted).with_task(kind.as_str()));
    }

    pub fn is_running(&self, kind: SubsystemKind) -> bool {
        self.running
            .get(&kind)
            .is_some_and(|h| !h.join.is_finished())
    }

    /// Kinds that were started, in start order.
    pub fn started(&self) -> Vec<SubsystemKind> {
        SubsystemKind::ALL
            .into_iter()
            .filter(|k| self.running.contains_key(k))
            .collect()
    }

    /// Cancels one subsystem and waits for its actor to exit.
    ///
    /// Returns `None` if it was never started.
    pub async fn stop(&mut self, kind: SubsystemKind) -> Option<ActorExitReason> {
        let handle = self.running.remove(&kind)?;
        handle.cancel.cancel();
        let reason = handle.join.await.unwrap_or(ActorExitReason::Cancelled);
        self.bus
            .publish(Event::new(EventKind::SubsystemStopped).with_task(kind.as_str()));
        Some(reason)
    }

    pub async fn stop_all(&mut self) {
        for kind in SubsystemKind::ALL {
            self.stop(kind).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use crate::devices::Board;
    use crate::error::TaskError;
    use crate::hardware::DeviceVariant;
    use crate::tasks::{TaskFn, TaskRef};

    fn parked(name: &'static str) -> TaskRef {
        TaskFn::arc(name, |ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Ok::<(), TaskError>(())
        })
    }

    fn board() -> Board {
        Board::new(DeviceVariant::F7FeatherV2)
            .with_subsystem(SubsystemKind::Connectivity, parked("wifi"))
            .with_subsystem(SubsystemKind::Updates, parked("ota"))
    }

    fn cloud(enabled: bool, updates: bool, health: bool, minutes: u32) -> CloudSettings {
        let mut c = CloudSettings {
            enabled,
            enable_updates: updates,
            enable_health_metrics: health,
            health_metrics_interval_minutes: minutes,
        };
        c.cascade();
        c
    }

    #[tokio::test]
    async fn nothing_starts_when_cloud_is_off() {
        let set = SubsystemSet::start(
            &board(),
            &CloudSettings::default(),
            &Bus::new(16),
            &CancellationToken::new(),
        );
        assert!(set.started().is_empty());
    }

    #[tokio::test]
    async fn updates_flag_also_starts_connectivity() {
        let mut set = SubsystemSet::start(
            &board(),
            &cloud(false, true, false, 60),
            &Bus::new(16),
            &CancellationToken::new(),
        );
        assert_eq!(
            set.started(),
            vec![SubsystemKind::Connectivity, SubsystemKind::Updates]
        );

        assert_eq!(
            set.stop(SubsystemKind::Connectivity).await,
            Some(ActorExitReason::Cancelled)
        );
        assert!(!set.is_running(SubsystemKind::Connectivity));
        assert!(set.is_running(SubsystemKind::Updates));
        assert_eq!(set.stop(SubsystemKind::Connectivity).await, None);
        set.stop_all().await;
    }

    #[tokio::test]
    async fn zero_health_interval_is_skipped_with_warning() {
        let bus = Bus::new(32);
        let mut rx = bus.subscribe();
        let device = board().with_subsystem(SubsystemKind::HealthMetrics, parked("health"));

        let mut set = SubsystemSet::start(
            &device,
            &cloud(false, false, true, 0),
            &bus,
            &CancellationToken::new(),
        );
        assert_eq!(set.started(), vec![SubsystemKind::Connectivity]);

        let mut skipped = None;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::SubsystemSkipped {
                skipped = ev.task.clone();
            }
        }
        assert_eq!(skipped.as_deref(), Some("health-metrics"));
        set.stop_all().await;
    }

    #[tokio::test(start_paused = true)]
    async fn health_reports_on_its_interval() {
        let reports = Arc::new(AtomicU32::new(0));
        let r = reports.clone();
        let health: TaskRef = TaskFn::arc("health", move |_ctx: CancellationToken| {
            r.fetch_add(1, Ordering::SeqCst);
            async { Ok::<(), TaskError>(()) }
        });
        let device = Board::new(DeviceVariant::F7FeatherV1)
            .with_subsystem(SubsystemKind::HealthMetrics, health);

        let runtime = CancellationToken::new();
        let mut set =
            SubsystemSet::start(&device, &cloud(true, false, true, 1), &Bus::new(64), &runtime);
        assert_eq!(set.started(), vec![SubsystemKind::HealthMetrics]);

        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(reports.load(Ordering::SeqCst), 3);

        runtime.cancel();
        assert_eq!(
            set.stop(SubsystemKind::HealthMetrics).await,
            Some(ActorExitReason::Cancelled)
        );
    }
}
