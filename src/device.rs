//! # Collaborator contracts: device, platform OS, reliability service and application.
//!
//! The supervisor owns none of the hardware; it drives these traits in a fixed
//! order (see `core::bringup` and `core::supervisor`).
//!
//! ```text
//! DeviceFactory ──► Box<dyn Device> ──initialize(platform)──► Arc<dyn Device>
//!                        │
//!                        ├── platform_os()  ──► initialize(caps, args) / reset()
//!                        ├── reliability_service() (optional)
//!                        └── subsystem(kind) (optional background tasks)
//!
//! AppFactory(AppContext) ──► Arc<dyn App>
//!     initialize → run → [on_error] → on_shutdown → dispose
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::args::LaunchArgs;
use crate::core::SubsystemKind;
use crate::error::{AppError, DeviceError};
use crate::hardware::{Arbiter, DeviceCapabilities};
use crate::platform::{DeviceTarget, PlatformKind};
use crate::settings::CloudSettings;
use crate::tasks::TaskRef;

/// Low-level OS services of a device.
pub trait PlatformOs: Send + Sync {
    /// Brings the I/O subsystem online.
    fn initialize(&self, capabilities: &DeviceCapabilities, args: &LaunchArgs)
    -> Result<(), DeviceError>;

    /// Requests a hardware reset. Only the restart policy calls this.
    fn reset(&self) -> Result<(), DeviceError>;
}

/// Crash bookkeeping provided by some devices.
pub trait ReliabilityService: Send + Sync {
    /// Whether the previous boot ended in a crash that left data behind.
    fn is_crash_data_available(&self) -> bool;

    /// Handles the crash data of the previous boot.
    fn on_boot_from_crash(&self) -> Result<(), DeviceError>;
}

/// One physical (or host) device.
pub trait Device: Send + Sync {
    fn target(&self) -> DeviceTarget;

    /// Capability snapshot fixed at construction.
    fn capabilities(&self) -> Arc<DeviceCapabilities>;

    /// Prepares the device for `platform`. Called once, before sharing.
    fn initialize(&mut self, platform: PlatformKind) -> Result<(), DeviceError>;

    fn platform_os(&self) -> Arc<dyn PlatformOs>;

    /// Crash-reporting collaborator, if the device has one.
    fn reliability_service(&self) -> Result<Option<Arc<dyn ReliabilityService>>, DeviceError> {
        Ok(None)
    }

    /// Resource arbiter for devices with a pin table.
    fn arbiter(&self) -> Option<Arbiter> {
        None
    }

    /// Background task implementing `kind`, if the device provides one.
    fn subsystem(&self, kind: SubsystemKind, cloud: &CloudSettings) -> Option<TaskRef> {
        let _ = (kind, cloud);
        None
    }
}

/// Dependencies an application receives at construction.
#[derive(Clone)]
pub struct AppContext {
    settings: Arc<BTreeMap<String, String>>,
    cancel: CancellationToken,
    device: Arc<dyn Device>,
    args: Arc<[String]>,
}

impl AppContext {
    pub fn new(
        settings: BTreeMap<String, String>,
        cancel: CancellationToken,
        device: Arc<dyn Device>,
        args: Vec<String>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            cancel,
            device,
            args: args.into(),
        }
    }

    /// Free-form settings from the configuration file.
    pub fn settings(&self) -> &BTreeMap<String, String> {
        &self.settings
    }

    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    /// Process-wide abort signal; cancelled on fault and at the end of shutdown.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn device(&self) -> &Arc<dyn Device> {
        &self.device
    }

    /// Arguments not consumed by the supervisor.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// # Hosted application.
///
/// Every hook runs on the supervisor's control flow, one at a time. Errors and
/// panics from `initialize` or `run` are faults; errors from the other hooks
/// are logged only.
///
/// `run` should start the app's own background work and return; the
/// supervisor then waits on the abort signal.
#[async_trait]
pub trait App: Send + Sync + 'static {
    async fn initialize(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn run(&self) -> Result<(), AppError>;

    /// Called once with the fault that ended the app.
    async fn on_error(&self, error: &AppError) -> Result<(), AppError> {
        let _ = error;
        Ok(())
    }

    /// Bounded by the shutdown grace period.
    async fn on_shutdown(&self) -> Result<(), AppError> {
        Ok(())
    }

    /// Releases the app's resources after shutdown.
    async fn dispose(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Builds a device for one registry entry.
pub type DeviceFactory = Arc<dyn Fn() -> Result<Box<dyn Device>, DeviceError> + Send + Sync>;

/// Builds the application with its construction-time dependencies.
pub type AppFactory = Arc<dyn Fn(AppContext) -> Result<Arc<dyn App>, AppError> + Send + Sync>;
