//! # Bring-up sequence.
//!
//! Takes a resolved [`AppEntry`] from cold to ready-to-run, strictly in order:
//!
//! ```text
//! 1. construct device            ── DeviceConstruction (fatal)
//! 2. attach reliability service  ── ReliabilityUnavailable event only
//! 3. device.initialize(platform)
//!    platform_os.initialize(..)  ── PlatformInit (fatal)
//! 4. storage areas               ── FileSystemInit (StorageWarning events, never fatal)
//! 5. construct app               ── AppConstruction (fatal)
//! 6. start subsystems            ── SubsystemSkipped events only
//! ```
//!
//! A fatal step returns immediately. Completed steps are not rolled back; the
//! supervisor moves straight to shutdown and the restart decision.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::args::LaunchArgs;
use crate::core::storage::StoragePaths;
use crate::core::subsystems::SubsystemSet;
use crate::device::{App, AppContext, Device, PlatformOs, ReliabilityService};
use crate::error::BringUpError;
use crate::events::{Bus, Event, EventKind};
use crate::platform::PlatformKind;
use crate::registry::AppEntry;
use crate::settings::Settings;

/// Everything bring-up produced.
pub struct RunningDevice {
    pub device: Arc<dyn Device>,
    pub os: Arc<dyn PlatformOs>,
    pub reliability: Option<Arc<dyn ReliabilityService>>,
    pub app: Arc<dyn App>,
    pub subsystems: SubsystemSet,
    /// Non-fatal failures, already published as events.
    pub warnings: Vec<BringUpError>,
}

/// Bring-up sequencer. Remembers the reliability service once step 2 attached
/// it and the platform OS once step 3 succeeded, so a later failure still
/// leaves something able to handle crash data and reset the hardware.
pub struct BringUp {
    bus: Bus,
    runtime_token: CancellationToken,
    app_abort: CancellationToken,
    reliability: Option<Arc<dyn ReliabilityService>>,
    os: Option<Arc<dyn PlatformOs>>,
}

impl BringUp {
    /// `runtime_token` parents the subsystems; `app_abort` is handed to the app.
    pub fn new(bus: Bus, runtime_token: CancellationToken, app_abort: CancellationToken) -> Self {
        Self {
            bus,
            runtime_token,
            app_abort,
            reliability: None,
            os: None,
        }
    }

    /// Reliability service, if the device attached one.
    pub fn reliability_service(&self) -> Option<Arc<dyn ReliabilityService>> {
        self.reliability.clone()
    }

    /// Platform OS, if the platform was initialized.
    pub fn platform_os(&self) -> Option<Arc<dyn PlatformOs>> {
        self.os.clone()
    }

    pub fn run(
        &mut self,
        platform: PlatformKind,
        entry: &AppEntry,
        args: &LaunchArgs,
        settings: &Settings,
        storage: &StoragePaths,
        supplied_app: Option<Arc<dyn App>>,
    ) -> Result<RunningDevice, BringUpError> {
        let mut device =
            entry
                .build_device()
                .map_err(|source| BringUpError::DeviceConstruction {
                    target: entry.target(),
                    source,
                })?;
        self.bus.publish(
            Event::new(EventKind::DeviceConstructed).with_reason(device.target().as_str()),
        );

        let reliability = match device.reliability_service() {
            Ok(service) => service,
            Err(e) => {
                self.bus.publish(
                    Event::new(EventKind::ReliabilityUnavailable).with_reason(e.to_string()),
                );
                None
            }
        };
        self.reliability = reliability.clone();

        device
            .initialize(platform)
            .map_err(|source| BringUpError::PlatformInit {
                stage: "device",
                source,
            })?;
        let os = device.platform_os();
        os.initialize(&device.capabilities(), args)
            .map_err(|source| BringUpError::PlatformInit {
                stage: "platform_os",
                source,
            })?;
        self.os = Some(Arc::clone(&os));
        self.bus.publish(Event::new(EventKind::PlatformInitialized));

        let device: Arc<dyn Device> = Arc::from(device);

        let warnings = storage.initialize();
        for w in &warnings {
            let mut ev = Event::new(EventKind::StorageWarning).with_reason(w.to_string());
            if let BringUpError::FileSystemInit { path, .. } = w {
                ev = ev.with_task(path.display().to_string());
            }
            self.bus.publish(ev);
        }

        let app = match supplied_app {
            Some(app) => app,
            None => {
                let ctx = AppContext::new(
                    settings.settings.clone(),
                    self.app_abort.clone(),
                    Arc::clone(&device),
                    args.passthrough.clone(),
                );
                entry
                    .build_app(ctx)
                    .map_err(|source| BringUpError::AppConstruction { source })?
            }
        };
        self.bus
            .publish(Event::new(EventKind::AppConstructed).with_task(entry.name().to_string()));

        let mut cloud = settings.cloud;
        cloud.cascade();
        let subsystems =
            SubsystemSet::start(device.as_ref(), &cloud, &self.bus, &self.runtime_token);

        Ok(RunningDevice {
            device,
            os,
            reliability,
            app,
            subsystems,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::Desktop;
    use crate::error::{AppError, DeviceError};
    use crate::platform::DeviceTarget;

    struct Idle;

    #[async_trait::async_trait]
    impl App for Idle {
        async fn run(&self) -> Result<(), AppError> {
            Ok(())
        }
    }

    fn desktop_entry() -> AppEntry {
        AppEntry::new(
            "idle",
            DeviceTarget::Desktop,
            || Ok(Box::new(Desktop::new()) as Box<dyn Device>),
            |_ctx| Ok(Arc::new(Idle) as Arc<dyn App>),
        )
    }

    fn sequencer(bus: &Bus) -> BringUp {
        BringUp::new(bus.clone(), CancellationToken::new(), CancellationToken::new())
    }

    fn kinds(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<EventKind> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev.kind);
        }
        out
    }

    #[tokio::test]
    async fn steps_run_in_order() {
        let root = tempfile::tempdir().unwrap();
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let mut bring_up = sequencer(&bus);

        let running = bring_up
            .run(
                PlatformKind::DesktopLinux,
                &desktop_entry(),
                &LaunchArgs::default(),
                &Settings::default(),
                &StoragePaths::new(root.path()),
                None,
            )
            .unwrap();

        assert!(running.warnings.is_empty());
        assert!(running.reliability.is_none());
        assert!(running.subsystems.started().is_empty());
        assert!(bring_up.platform_os().is_some());
        assert!(root.path().join("Temp").is_dir());
        assert_eq!(
            kinds(&mut rx),
            vec![
                EventKind::DeviceConstructed,
                EventKind::PlatformInitialized,
                EventKind::AppConstructed
            ]
        );
    }

    #[tokio::test]
    async fn device_construction_failure_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let entry = AppEntry::new(
            "broken",
            DeviceTarget::Desktop,
            || Err(DeviceError::failed("no board")),
            |_ctx| Ok(Arc::new(Idle) as Arc<dyn App>),
        );
        let mut bring_up = sequencer(&Bus::new(8));

        let err = bring_up
            .run(
                PlatformKind::Windows,
                &entry,
                &LaunchArgs::default(),
                &Settings::default(),
                &StoragePaths::new(root.path()),
                None,
            )
            .err()
            .unwrap();
        assert_eq!(err.as_label(), "bringup_device_construction");
        assert!(bring_up.platform_os().is_none());
        assert!(!root.path().join("Data").exists());
    }

    #[tokio::test]
    async fn platform_init_failure_leaves_no_platform_os() {
        let root = tempfile::tempdir().unwrap();
        let mut bring_up = sequencer(&Bus::new(8));

        let err = bring_up
            .run(
                PlatformKind::EmbeddedLinux,
                &desktop_entry(),
                &LaunchArgs::default(),
                &Settings::default(),
                &StoragePaths::new(root.path()),
                None,
            )
            .err()
            .unwrap();
        assert!(matches!(
            err,
            BringUpError::PlatformInit { stage: "device", .. }
        ));
        assert!(bring_up.platform_os().is_none());
    }

    #[tokio::test]
    async fn app_failure_keeps_platform_os_and_storage() {
        let root = tempfile::tempdir().unwrap();
        let entry = AppEntry::new(
            "broken-app",
            DeviceTarget::Desktop,
            || Ok(Box::new(Desktop::new()) as Box<dyn Device>),
            |_ctx| Err(AppError::new("ConfigError", "missing key")),
        );
        let mut bring_up = sequencer(&Bus::new(16));

        let err = bring_up
            .run(
                PlatformKind::MacOs,
                &entry,
                &LaunchArgs::default(),
                &Settings::default(),
                &StoragePaths::new(root.path()),
                None,
            )
            .err()
            .unwrap();
        assert_eq!(err.as_label(), "bringup_app_construction");
        assert!(bring_up.platform_os().is_some());
        assert!(root.path().join("Documents").is_dir());
    }

    #[tokio::test]
    async fn supplied_app_skips_the_factory() {
        let root = tempfile::tempdir().unwrap();
        let entry = AppEntry::new(
            "factory-fails",
            DeviceTarget::Desktop,
            || Ok(Box::new(Desktop::new()) as Box<dyn Device>),
            |_ctx| Err(AppError::new("Unreachable", "factory called")),
        );
        let mut bring_up = sequencer(&Bus::new(16));

        let running = bring_up.run(
            PlatformKind::Windows,
            &entry,
            &LaunchArgs::default(),
            &Settings::default(),
            &StoragePaths::new(root.path()),
            Some(Arc::new(Idle)),
        );
        assert!(running.is_ok());
    }
}
