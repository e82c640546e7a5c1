//! # Crash capture.
//!
//! An application fault is unwound into a [`CrashRecord`]: type name,
//! message, stack (when backtraces are enabled) and every inner cause. The
//! record is published line by line as [`EventKind::CrashDetail`] and then
//! written as JSON to the crash file, overwriting any previous record.
//!
//! ## Stacks
//! - panics: the panicking frame, kept by the hook `install_panic_capture`
//!   chains in front of the existing one;
//! - returned errors: the site where the supervisor captured the fault.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::cell::RefCell;
use std::error::Error as StdError;
use std::fs;
use std::io;
use std::panic;
use std::path::Path;
use std::sync::Once;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::events::{Bus, Event, EventKind};

/// One nested cause of a fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrashCause {
    /// Known only for aggregated application errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    pub message: String,
}

/// Everything known about one application fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrashRecord {
    /// Lifecycle step that faulted (`initialize`, `run`, ...).
    pub phase: String,
    pub type_name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default)]
    pub inner: Vec<CrashCause>,
}

impl CrashRecord {
    pub fn capture(phase: &str, error: &AppError) -> Self {
        let stack = match error {
            AppError::Panicked { stack, .. } => stack.clone(),
            _ => {
                let bt = Backtrace::capture();
                (bt.status() == BacktraceStatus::Captured).then(|| bt.to_string())
            }
        };

        let mut inner = Vec::new();
        collect_causes(error, &mut inner);

        Self {
            phase: phase.to_string(),
            type_name: error.type_name().to_string(),
            message: error.message(),
            stack,
            inner,
        }
    }

    /// Record for a fault outside the application (a failed bring-up).
    pub fn capture_error<E: StdError + 'static>(phase: &str, error: &E) -> Self {
        let mut inner = Vec::new();
        let mut next = error.source();
        while let Some(cause) = next {
            inner.push(CrashCause {
                type_name: None,
                message: cause.to_string(),
            });
            next = cause.source();
        }
        Self {
            phase: phase.to_string(),
            type_name: std::any::type_name::<E>().to_string(),
            message: error.to_string(),
            stack: None,
            inner,
        }
    }

    /// Human-readable lines, headline first.
    pub fn lines(&self) -> Vec<String> {
        let mut out = vec![format!(
            "{} failed with {}: {}",
            self.phase, self.type_name, self.message
        )];
        for (i, cause) in self.inner.iter().enumerate() {
            out.push(match &cause.type_name {
                Some(t) => format!("  inner[{i}] {t}: {}", cause.message),
                None => format!("  inner[{i}] {}", cause.message),
            });
        }
        if let Some(stack) = &self.stack {
            out.push(format!("  stack:\n{stack}"));
        }
        out
    }

    /// Publishes [`CrashRecord::lines`] as [`EventKind::CrashDetail`] events.
    pub fn publish(&self, bus: &Bus) {
        for line in self.lines() {
            bus.publish(
                Event::new(EventKind::CrashDetail)
                    .with_task(self.phase.clone())
                    .with_reason(line),
            );
        }
    }

    /// Writes the record to `path`, creating the parent directory if needed.
    pub fn write(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(self).map_err(io::Error::other)?;
        fs::write(path, json)
    }

    pub fn read(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

thread_local! {
    static PANIC_STACK: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

/// Chains a panic hook that keeps the backtrace of the latest panic on each
/// thread for `take_panic_stack`. Installs at most once per process.
pub(crate) fn install_panic_capture() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let bt = Backtrace::capture();
            let kept = (bt.status() == BacktraceStatus::Captured).then_some(bt);
            PANIC_STACK.with(|slot| *slot.borrow_mut() = kept);
            previous(info);
        }));
    });
}

/// Takes the stack of the latest panic on this thread. Call it on the
/// thread that caught the panic, right after `catch_unwind`.
pub(crate) fn take_panic_stack() -> Option<String> {
    PANIC_STACK
        .with(|slot| slot.borrow_mut().take())
        .map(|bt| bt.to_string())
}

fn collect_causes(error: &AppError, out: &mut Vec<CrashCause>) {
    match error {
        AppError::Wrapped { inner, .. } => {
            let mut next = inner.source();
            while let Some(cause) = next {
                out.push(CrashCause {
                    type_name: None,
                    message: cause.to_string(),
                });
                next = cause.source();
            }
        }
        AppError::Aggregate(errors) => {
            for e in errors {
                out.push(CrashCause {
                    type_name: Some(e.type_name().to_string()),
                    message: e.message(),
                });
                collect_causes(e, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("sensor read failed")]
    struct SensorError {
        #[source]
        source: io::Error,
    }

    #[test]
    fn captures_type_and_message() {
        let rec = CrashRecord::capture("initialize", &AppError::new("BadWiring", "pin 4 shorted"));
        assert_eq!(rec.phase, "initialize");
        assert_eq!(rec.type_name, "BadWiring");
        assert_eq!(rec.message, "pin 4 shorted");
        assert!(rec.inner.is_empty());
    }

    #[test]
    fn walks_source_chain_and_aggregates() {
        let wrapped = AppError::wrap(SensorError {
            source: io::Error::other("i2c nack"),
        });
        let rec = CrashRecord::capture(
            "run",
            &AppError::aggregate(vec![wrapped, AppError::new("Timeout", "no reply")]),
        );

        assert_eq!(rec.type_name, "aggregate");
        assert_eq!(rec.inner.len(), 3);
        assert!(rec.inner[0].type_name.as_deref().unwrap().ends_with("SensorError"));
        assert_eq!(rec.inner[0].message, "sensor read failed");
        assert_eq!(rec.inner[1].type_name, None);
        assert_eq!(rec.inner[1].message, "i2c nack");
        assert_eq!(rec.inner[2].type_name.as_deref(), Some("Timeout"));

        let lines = rec.lines();
        assert_eq!(lines[0], "run failed with aggregate: 2 errors occurred");
        assert_eq!(lines[2], "  inner[1] i2c nack");
    }

    #[test]
    fn written_record_reads_back_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Data").join("app_crash.json");
        let rec = CrashRecord::capture("run", &AppError::new("Overheat", "core at 97°C"));

        rec.write(&path).unwrap();
        let back = CrashRecord::read(&path).unwrap();
        assert_eq!(back.type_name, "Overheat");
        assert_eq!(back.message, "core at 97°C");
        assert_eq!(back, rec);

        let newer = CrashRecord::capture("run", &AppError::new("Brownout", "vin low"));
        newer.write(&path).unwrap();
        assert_eq!(CrashRecord::read(&path).unwrap().type_name, "Brownout");
    }

    #[test]
    fn panic_record_keeps_the_panicking_stack() {
        let err = AppError::panicked(Box::new("display buffer overrun"))
            .with_panic_stack(Some("at Blinker::run".to_string()));
        let rec = CrashRecord::capture("run", &err);
        assert_eq!(rec.type_name, "panic");
        assert_eq!(rec.stack.as_deref(), Some("at Blinker::run"));

        let unstacked = CrashRecord::capture("run", &AppError::panicked(Box::new("boom")));
        assert_eq!(unstacked.stack, None);
    }

    #[inline(never)]
    fn overrun_display_buffer() {
        panic!("display buffer overrun");
    }

    #[test]
    fn panic_stack_is_taken_once_on_the_panicking_thread() {
        install_panic_capture();
        let enabled = Backtrace::capture().status() == BacktraceStatus::Captured;

        assert!(panic::catch_unwind(overrun_display_buffer).is_err());
        let stack = take_panic_stack();
        assert_eq!(stack.is_some(), enabled);
        if let Some(stack) = stack {
            assert!(stack.contains("overrun_display_buffer"), "{stack}");
        }
        assert!(take_panic_stack().is_none());

        let other = std::thread::spawn(take_panic_stack).join().unwrap();
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn publishes_one_event_per_line() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let rec = CrashRecord::capture("run", &AppError::new("Oops", "bad"));
        rec.publish(&bus);

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::CrashDetail);
        assert_eq!(ev.reason.as_deref(), Some("run failed with Oops: bad"));
    }
}
