//! Error types used by the supervisor, the bring-up sequence and the resource arbiter.
//!
//! - [`ResourceError`] pin/bus/port arbitration failures, returned to the caller as values.
//! - [`ResolveError`] no application matches the detected platform.
//! - [`DeviceError`] failures reported by device and platform-OS collaborators.
//! - [`BringUpError`] failures of the bring-up sequence (all fatal except `FileSystemInit`).
//! - [`AppError`] faults raised by the hosted application.
//! - [`SettingsError`] configuration file could not be read or parsed.
//! - [`StateError`] an invalid lifecycle transition was requested.
//! - [`TaskError`] failures of supervised background subsystems.
//!
//! Every enum provides `as_label` (stable snake_case label for logs).

use std::any::Any;
use std::borrow::Cow;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::core::LifecycleState;
use crate::hardware::{BusKind, DeviceVariant, PinCaps};
use crate::platform::{DeviceTarget, PlatformKind};

/// # Errors produced by the resource arbiter.
///
/// Local to one request. The arbiter never panics and never guesses; the
/// caller decides whether the failure is fatal.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// Pin is not part of the active variant's pin table.
    #[error("pin {pin} does not exist on {variant}")]
    UnknownPin { pin: String, variant: DeviceVariant },

    /// Pin lacks a capability the request needs.
    #[error("pin {pin} requires {required:?} but supports {available:?}")]
    CapabilityMismatch {
        pin: &'static str,
        required: PinCaps,
        available: PinCaps,
    },

    /// Clock pin is not routed to any bus controller of this kind.
    #[error("no {kind} bus on {variant} is clocked by {clock}")]
    UnsupportedBus {
        kind: BusKind,
        clock: &'static str,
        variant: DeviceVariant,
    },

    /// Wrong number of pins for the bus kind.
    #[error("{kind} bus needs {expected} pins, got {got}")]
    PinCount {
        kind: BusKind,
        expected: usize,
        got: usize,
    },

    /// Port parameter outside what the pin supports.
    #[error("{parameter}={value} is out of range for pin {pin}")]
    OutOfRange {
        pin: &'static str,
        parameter: &'static str,
        value: f64,
    },

    /// Serial port name unknown on this variant.
    #[error("serial port {port} does not exist on {variant}")]
    UnknownPort { port: String, variant: DeviceVariant },
}

impl ResourceError {
    pub fn as_label(&self) -> &'static str {
        match self {
            ResourceError::UnknownPin { .. } => "resource_unknown_pin",
            ResourceError::CapabilityMismatch { .. } => "resource_capability_mismatch",
            ResourceError::UnsupportedBus { .. } => "resource_unsupported_bus",
            ResourceError::PinCount { .. } => "resource_pin_count",
            ResourceError::OutOfRange { .. } => "resource_out_of_range",
            ResourceError::UnknownPort { .. } => "resource_unknown_port",
        }
    }
}

/// # Errors produced by the app/device resolver.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No candidate targets a device compatible with the platform.
    #[error("no application found for platform {platform}")]
    NoMatch { platform: PlatformKind },

    /// Hardware revision unknown and several candidates present (strict mode only).
    #[error("{candidates} applications found for unidentified platform {platform}")]
    Ambiguous {
        platform: PlatformKind,
        candidates: usize,
    },
}

impl ResolveError {
    pub fn as_label(&self) -> &'static str {
        match self {
            ResolveError::NoMatch { .. } => "resolve_no_match",
            ResolveError::Ambiguous { .. } => "resolve_ambiguous",
        }
    }
}

/// # Errors reported by device and platform-OS collaborators.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("{message}")]
    Failed { message: String },

    #[error("operation not supported: {operation}")]
    Unsupported { operation: &'static str },

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl DeviceError {
    pub fn failed(message: impl Into<String>) -> Self {
        DeviceError::Failed {
            message: message.into(),
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            DeviceError::Failed { .. } => "device_failed",
            DeviceError::Unsupported { .. } => "device_unsupported",
            DeviceError::Resource(_) => "device_resource",
            DeviceError::Io(_) => "device_io",
        }
    }
}

/// # Errors produced by the bring-up sequence.
///
/// All variants abort bring-up except [`BringUpError::FileSystemInit`], which
/// is only ever reported.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BringUpError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Device factory failed.
    #[error("device construction failed for {target}: {source}")]
    DeviceConstruction {
        target: DeviceTarget,
        #[source]
        source: DeviceError,
    },

    /// Device or platform-OS initialization failed.
    #[error("platform initialization failed at {stage}: {source}")]
    PlatformInit {
        stage: &'static str,
        #[source]
        source: DeviceError,
    },

    /// One storage area could not be prepared.
    #[error("file system initialization failed for {}: {source}", .path.display())]
    FileSystemInit {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Application factory failed.
    #[error("application construction failed: {source}")]
    AppConstruction {
        #[source]
        source: AppError,
    },
}

impl BringUpError {
    pub fn as_label(&self) -> &'static str {
        match self {
            BringUpError::Resolve(e) => e.as_label(),
            BringUpError::DeviceConstruction { .. } => "bringup_device_construction",
            BringUpError::PlatformInit { .. } => "bringup_platform_init",
            BringUpError::FileSystemInit { .. } => "bringup_file_system_init",
            BringUpError::AppConstruction { .. } => "bringup_app_construction",
        }
    }

    /// Whether this error aborts bring-up.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, BringUpError::FileSystemInit { .. })
    }
}

/// # Fault raised by the hosted application.
///
/// Carries enough information to build a crash record: a type name, a
/// message and, for wrapped errors, the full `source()` chain.
///
/// # Example
/// ```
/// use boardvisor::AppError;
///
/// let err = AppError::new("SensorTimeout", "no reply from 0x48");
/// assert_eq!(err.type_name(), "SensorTimeout");
/// assert_eq!(err.message(), "no reply from 0x48");
/// ```
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{type_name}: {message}")]
    Failed {
        type_name: Cow<'static, str>,
        message: String,
    },

    /// Any error value, keeping its concrete type name and cause chain.
    #[error("{type_name}: {inner}")]
    Wrapped {
        type_name: &'static str,
        inner: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// An application hook panicked. `stack` is the backtrace of the
    /// panicking frame, when backtraces are enabled.
    #[error("panic: {message}")]
    Panicked {
        message: String,
        stack: Option<String>,
    },

    /// Several independent faults.
    #[error("{} errors occurred", .0.len())]
    Aggregate(Vec<AppError>),
}

impl AppError {
    pub fn new(type_name: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        AppError::Failed {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    pub fn wrap<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        AppError::Wrapped {
            type_name: std::any::type_name::<E>(),
            inner: Box::new(err),
        }
    }

    pub fn aggregate(errors: Vec<AppError>) -> Self {
        AppError::Aggregate(errors)
    }

    /// Builds a fault from a caught panic payload.
    pub fn panicked(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        AppError::Panicked {
            message,
            stack: None,
        }
    }

    /// Attaches the panicking frame's backtrace; no-op for other faults.
    pub fn with_panic_stack(mut self, captured: Option<String>) -> Self {
        if let AppError::Panicked { stack, .. } = &mut self {
            *stack = captured;
        }
        self
    }

    pub fn type_name(&self) -> &str {
        match self {
            AppError::Failed { type_name, .. } => type_name,
            AppError::Wrapped { type_name, .. } => type_name,
            AppError::Panicked { .. } => "panic",
            AppError::Aggregate(_) => "aggregate",
        }
    }

    pub fn message(&self) -> String {
        match self {
            AppError::Failed { message, .. } => message.clone(),
            AppError::Wrapped { inner, .. } => inner.to_string(),
            AppError::Panicked { message, .. } => message.clone(),
            AppError::Aggregate(errors) => format!("{} errors occurred", errors.len()),
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            AppError::Failed { .. } => "app_failed",
            AppError::Wrapped { .. } => "app_failed",
            AppError::Panicked { .. } => "app_panicked",
            AppError::Aggregate(_) => "app_aggregate",
        }
    }
}

/// # Errors produced while loading settings.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SettingsError {
    pub fn as_label(&self) -> &'static str {
        match self {
            SettingsError::Io { .. } => "settings_io",
            SettingsError::Parse { .. } => "settings_parse",
        }
    }
}

/// # Invalid lifecycle transition.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    #[error("invalid lifecycle transition {from} -> {to}")]
    InvalidTransition {
        from: LifecycleState,
        to: LifecycleState,
    },
}

impl StateError {
    pub fn as_label(&self) -> &'static str {
        match self {
            StateError::InvalidTransition { .. } => "state_invalid_transition",
        }
    }
}

/// # Errors produced by background subsystem tasks.
///
/// `Timeout` and `Fail` are retryable under the subsystem's restart policy;
/// `Fatal` ends the subsystem; `Canceled` is a graceful exit.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("fatal error (no retry): {error}")]
    Fatal { error: String },

    #[error("execution failed: {error}")]
    Fail { error: String },

    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns `true` for [`TaskError::Fail`] and [`TaskError::Timeout`].
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::Fail { .. } | TaskError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("outer")]
    struct Outer {
        #[source]
        inner: io::Error,
    }

    #[test]
    fn wrapped_error_keeps_type_and_message() {
        let err = AppError::wrap(Outer {
            inner: io::Error::other("disk gone"),
        });
        assert!(err.type_name().ends_with("Outer"));
        assert_eq!(err.message(), "outer");
    }

    #[test]
    fn panic_payloads_are_decoded() {
        let a = AppError::panicked(Box::new("static str"));
        assert_eq!(a.message(), "static str");
        let b = AppError::panicked(Box::new(String::from("owned")));
        assert_eq!(b.message(), "owned");
        let c = AppError::panicked(Box::new(7_u8));
        assert_eq!(c.message(), "unknown panic");
        assert_eq!(c.type_name(), "panic");
    }

    #[test]
    fn only_file_system_failures_are_non_fatal() {
        let fs = BringUpError::FileSystemInit {
            path: PathBuf::from("/tmp/x"),
            source: io::Error::other("ro"),
        };
        assert!(!fs.is_fatal());
        let platform = BringUpError::PlatformInit {
            stage: "device",
            source: DeviceError::failed("bad clock"),
        };
        assert!(platform.is_fatal());
        assert_eq!(platform.as_label(), "bringup_platform_init");
    }

    #[test]
    fn retryable_task_errors() {
        assert!(TaskError::Fail { error: "x".into() }.is_retryable());
        assert!(!TaskError::Fatal { error: "x".into() }.is_retryable());
        assert!(!TaskError::Canceled.is_retryable());
    }
}
