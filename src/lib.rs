//! # boardvisor
//!
//! **Boardvisor** brings an embedded device online and supervises the one
//! application it hosts.
//!
//! It detects the platform it runs on, picks a compatible application from a
//! static registry, brings the device's I/O up in a fixed order, runs the
//! application through a crash-resilient lifecycle, and on shutdown decides
//! whether to reset the hardware. A resource arbiter maps bus, pin and port
//! requests onto the fixed pin table of each board variant.
//!
//! ## Architecture
//! ```text
//!  PlatformProbe ──► detect() ──► PlatformKind
//!                                     │
//!  AppRegistry (AppEntry: name, DeviceTarget, device factory, app factory)
//!                                     │ Resolver
//!                                     ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor                                                       │
//! │  - BringUp: device → reliability → platform OS → storage → app    │
//! │             → subsystems (connectivity, updates, health)          │
//! │  - Lifecycle: Uninitialized → Initializing → Running              │
//! │               → Faulted → ShuttingDown → Terminated               │
//! │  - CrashRecord → <root>/Data/app_crash.json                       │
//! │  - policies::decide / execute: delayed hardware reset             │
//! └──────┬──────────────────────────────────────────────┬─────────────┘
//!        │ publish(Event)                               │ Device::arbiter()
//!        ▼                                              ▼
//!  Bus ──► listener ──► SubscriberSet ──► LogWriter   Arbiter ──► PinTable
//!                                    └──► custom       (BusDescriptor, PortHandle)
//! ```
//!
//! ## Features
//! | Area              | Description                                             | Key types / traits                         |
//! |-------------------|---------------------------------------------------------|--------------------------------------------|
//! | **Supervision**   | Bring-up, lifecycle, crash capture, shutdown, restart   | [`Supervisor`], [`SupervisorHandle`]       |
//! | **Resolution**    | Platform detection and app selection                    | [`detect`], [`Resolver`], [`AppRegistry`]  |
//! | **Hardware**      | Pin tables and resource arbitration                     | [`Arbiter`], [`PinTable`], [`PinCaps`]     |
//! | **Collaborators** | What devices and applications implement                 | [`Device`], [`PlatformOs`], [`App`]        |
//! | **Subsystems**    | Supervised background tasks with restart/backoff        | [`TaskFn`], [`RestartPolicy`], [`BackoffPolicy`] |
//! | **Events**        | Observe everything the supervisor does                  | [`Event`], [`Subscribe`]                   |
//! | **Errors**        | Typed errors per layer                                  | [`ResourceError`], [`BringUpError`], [`AppError`] |
//! | **Configuration** | Settings file and process configuration                 | [`Settings`], [`SupervisorConfig`]         |
//!
//! ## Optional features
//! - `logging` (default): exports the built-in [`LogWriter`].
//!
//! ## Example
//! ```rust
//! use boardvisor::{Arbiter, BusKind, DeviceVariant, PortRequest};
//!
//! let arbiter = Arbiter::for_variant(DeviceVariant::F7FeatherV2);
//! let spi = arbiter.default_spi_bus(375).unwrap();
//! assert_eq!(spi.kind(), BusKind::Spi);
//!
//! let led = arbiter.pin("OnboardLedGreen").unwrap();
//! let port = arbiter.create_port(led, PortRequest::pwm()).unwrap();
//! assert!(port.is_onboard_indicator());
//! ```

pub mod args;
mod core;
pub mod device;
pub mod devices;
mod error;
pub mod events;
pub mod hardware;
pub mod platform;
pub mod policies;
mod registry;
pub mod settings;
pub mod subscribers;
pub mod tasks;

// ---- Public re-exports ----

pub use crate::core::{
    ActorExitReason, BringUp, CrashCause, CrashRecord, Lifecycle, LifecycleState, LifecycleView,
    Outcome, RunningDevice, StoragePaths, SubsystemKind, SubsystemSet, Supervisor,
    SupervisorBuilder, SupervisorConfig, SupervisorHandle, wait_for_termination_signal,
};
pub use args::LaunchArgs;
pub use device::{App, AppContext, Device, PlatformOs, ReliabilityService};
pub use devices::{Board, Desktop, FirmwareOs, HostOs};
pub use error::{
    AppError, BringUpError, DeviceError, ResolveError, ResourceError, SettingsError, StateError,
    TaskError,
};
pub use events::{BackoffSource, Bus, Event, EventKind};
pub use hardware::{
    Arbiter, BusDescriptor, BusKind, DeviceCapabilities, DeviceVariant, Pin, PinCaps, PinTable,
    PortHandle, PortRequest,
};
pub use platform::{
    AppDescriptor, DeviceTarget, HardwareRevision, HostProbe, PlatformKind, PlatformProbe,
    Resolver, detect,
};
pub use policies::{BackoffPolicy, JitterPolicy, RestartDecision, RestartPolicy};
pub use registry::{AppEntry, AppRegistry};
pub use settings::{LogLevel, Settings};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{Task, TaskFn, TaskRef, TaskSpec};

#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
