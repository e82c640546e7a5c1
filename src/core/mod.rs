//! Runtime core: bring-up, lifecycle and shutdown.
//!
//! The public entry point is [`Supervisor`], built with [`SupervisorBuilder`].
//!
//! Internal modules:
//! - [`bringup`]: the ordered bring-up sequence;
//! - [`supervisor`]: lifecycle, fault handling, graceful shutdown, restart;
//! - [`state`]: lifecycle state machine;
//! - [`crash`]: crash records and the crash file;
//! - [`storage`]: well-known storage areas;
//! - [`subsystems`]: connectivity, updates and health reporting actors;
//! - [`actor`]: runs one subsystem task with restart policy and backoff;
//! - [`runner`]: executes one attempt with timeout/cancellation and event publishing;
//! - [`shutdown`]: OS termination signals.

mod actor;
mod bringup;
mod builder;
mod config;
mod crash;
mod runner;
mod shutdown;
mod state;
mod storage;
mod subsystems;
mod supervisor;

pub use actor::ActorExitReason;
pub use bringup::{BringUp, RunningDevice};
pub use builder::SupervisorBuilder;
pub use config::SupervisorConfig;
pub use crash::{CrashCause, CrashRecord};
pub use shutdown::wait_for_termination_signal;
pub use state::{Lifecycle, LifecycleState, LifecycleView};
pub use storage::{CACHE_DIR, CRASH_FILE, DATA_DIR, DOCUMENTS_DIR, StoragePaths, TEMP_DIR};
pub use subsystems::{SubsystemKind, SubsystemSet};
pub use supervisor::{Outcome, Supervisor, SupervisorHandle};
