//! # Supervisor configuration.
//!
//! [`SupervisorConfig`] holds the process-level knobs that do not come from the
//! settings file: where the launch root is, how events are buffered, and
//! whether the supervisor reacts to OS signals.
//!
//! The shutdown grace period is not configured here; it follows
//! `lifecycle.app_failure_restart_delay_seconds` from the settings file.

use std::path::PathBuf;

/// Process-level configuration for [`Supervisor`](crate::Supervisor).
///
/// ## Field semantics
/// - `root`: launch root used when `--root` is absent; settings and storage live under it
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
/// - `listen_os_signals`: SIGINT/SIGTERM request shutdown, then release the final wait
/// - `strict_target_resolution`: unidentified target hardware with several
///   candidate apps fails bring-up instead of warning
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    pub root: PathBuf,

    /// Slow subscribers lagging more than this many events skip older ones.
    pub bus_capacity: usize,

    pub listen_os_signals: bool,

    pub strict_target_resolution: bool,
}

impl SupervisorConfig {
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for SupervisorConfig {
    /// `root = "."`, `bus_capacity = 1024`, OS signals on, lenient resolution.
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            bus_capacity: 1024,
            listen_os_signals: true,
            strict_target_resolution: false,
        }
    }
}
