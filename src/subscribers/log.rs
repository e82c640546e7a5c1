//! # LogWriter: built-in event printer
//!
//! Prints events at or above the configured [`LogLevel`]; errors and warnings
//! go to stderr, the rest to stdout. With `show_ticks`, each line starts with
//! the time elapsed since the writer was created.
//!
//! ## Example output
//! ```text
//! [platform-detected] platform=target_f7_feather_v2
//! [app-resolved] app="blinky" target=f7_feather_v2
//! [state] Uninitialized -> Initializing
//! [app-fault] phase=run err="SensorTimeout: no reply from 0x48"
//! [+12.031s] [grace-exceeded] timeout=5s
//! [restart-scheduled] delay=5s
//! ```

use std::fmt::Write as _;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::settings::{LogLevel, LoggingSettings};
use crate::subscribers::Subscribe;

pub struct LogWriter {
    level: LogLevel,
    started: Option<Instant>,
}

impl LogWriter {
    #[must_use]
    pub fn new(settings: LoggingSettings) -> Self {
        Self {
            level: settings.level,
            started: settings.show_ticks.then(Instant::now),
        }
    }

    /// Whether an event of `level` passes the filter.
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.level != LogLevel::None && level >= self.level
    }

    /// Formats one log line (without ticks).
    pub fn format(e: &Event) -> String {
        let mut line = format!("[{}]", e.kind.as_label());
        let reason = e.reason.as_deref();
        let task = e.task.as_deref();
        let _ = match e.kind {
            EventKind::PlatformDetected => write!(line, " platform={}", reason.unwrap_or("?")),
            EventKind::AppResolved => write!(
                line,
                " app={:?} target={}",
                task.unwrap_or("?"),
                reason.unwrap_or("?")
            ),
            EventKind::StateChanged => match (e.prev_state, e.state) {
                (Some(from), Some(to)) => write!(line, " {from:?} -> {to:?}"),
                _ => Ok(()),
            },
            EventKind::AppFault => write!(
                line,
                " phase={} err={:?}",
                task.unwrap_or("?"),
                reason.unwrap_or("")
            ),
            EventKind::GraceExceeded | EventKind::TimeoutHit => {
                if let Some(t) = task {
                    let _ = write!(line, " task={t:?}");
                }
                write!(line, " timeout={:?}", ms(e.timeout_ms))
            }
            EventKind::RestartScheduled => write!(line, " delay={:?}", ms(e.delay_ms)),
            EventKind::BackoffScheduled => write!(
                line,
                " task={:?} delay={:?} after_attempt={} err={:?}",
                task.unwrap_or("?"),
                ms(e.delay_ms),
                e.attempt.unwrap_or(0),
                reason.unwrap_or("")
            ),
            EventKind::TaskStarting
            | EventKind::TaskStopped
            | EventKind::TaskFailed
            | EventKind::ActorExhausted
            | EventKind::ActorDead => {
                let _ = write!(
                    line,
                    " task={:?} attempt={}",
                    task.unwrap_or("?"),
                    e.attempt.unwrap_or(0)
                );
                match reason {
                    Some(r) => write!(line, " err={r:?}"),
                    None => Ok(()),
                }
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => write!(
                line,
                " subscriber={} info={}",
                task.unwrap_or("unknown"),
                reason.unwrap_or("unknown")
            ),
            _ => {
                if let Some(t) = task {
                    let _ = write!(line, " {t}");
                }
                match reason {
                    Some(r) => write!(line, " {r}"),
                    None => Ok(()),
                }
            }
        };
        line
    }
}

impl Default for LogWriter {
    fn default() -> Self {
        Self::new(LoggingSettings::default())
    }
}

fn ms(v: Option<u32>) -> Duration {
    Duration::from_millis(u64::from(v.unwrap_or(0)))
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let level = e.level();
        if !self.enabled(level) {
            return;
        }
        let mut line = Self::format(e);
        if let Some(start) = self.started {
            line = format!("[+{:.3}s] {line}", start.elapsed().as_secs_f64());
        }
        if level >= LogLevel::Warn {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LifecycleState;

    #[test]
    fn level_filter() {
        let w = LogWriter::new(LoggingSettings {
            level: LogLevel::Warn,
            show_ticks: false,
        });
        assert!(!w.enabled(LogLevel::Info));
        assert!(w.enabled(LogLevel::Warn));
        assert!(w.enabled(LogLevel::Error));

        let silent = LogWriter::new(LoggingSettings {
            level: LogLevel::None,
            show_ticks: false,
        });
        assert!(!silent.enabled(LogLevel::Error));
    }

    #[test]
    fn lines_carry_kind_and_fields() {
        let ev = Event::new(EventKind::StateChanged)
            .with_transition(LifecycleState::Running, LifecycleState::ShuttingDown);
        assert_eq!(LogWriter::format(&ev), "[state] Running -> ShuttingDown");

        let ev = Event::new(EventKind::RestartScheduled).with_delay(Duration::from_secs(5));
        assert_eq!(LogWriter::format(&ev), "[restart-scheduled] delay=5s");

        let ev = Event::new(EventKind::RestartSkipped).with_reason("restart disabled");
        assert_eq!(LogWriter::format(&ev), "[restart-skipped] restart disabled");
    }
}
