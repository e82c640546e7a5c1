use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Restart delay used when nothing is configured.
pub const DEFAULT_RESTART_DELAY_SECS: i32 = 5;
/// Health report interval used when nothing is configured.
pub const DEFAULT_HEALTH_INTERVAL_MINUTES: u32 = 60;

/// Parsed application settings.
///
/// Every section has defaults, so a partial (or empty) document is valid.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub lifecycle: LifecycleSettings,
    pub cloud: CloudSettings,
    /// Free-form values handed to the application untouched.
    pub settings: BTreeMap<String, String>,
}

impl Settings {
    /// Applies the cloud flag cascade; see [`CloudSettings::cascade`].
    pub fn normalized(mut self) -> Self {
        self.cloud.cascade();
        self
    }
}

/// Log verbosity, least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    /// Nothing is logged.
    None,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: LogLevel,
    /// Prefix each line with the time elapsed since start.
    pub show_ticks: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleSettings {
    pub restart_on_app_failure: bool,
    /// Negative values are treated as zero.
    pub app_failure_restart_delay_seconds: i32,
}

impl LifecycleSettings {
    /// Configured restart delay, clamped at zero.
    ///
    /// Also bounds the application's shutdown grace period.
    pub fn restart_delay(&self) -> Duration {
        let secs = self.app_failure_restart_delay_seconds.max(0);
        Duration::from_secs(u64::from(secs.unsigned_abs()))
    }
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            restart_on_app_failure: false,
            app_failure_restart_delay_seconds: DEFAULT_RESTART_DELAY_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudSettings {
    pub enabled: bool,
    pub enable_updates: bool,
    pub enable_health_metrics: bool,
    pub health_metrics_interval_minutes: u32,
}

impl CloudSettings {
    /// Updates and health metrics both need connectivity, so either one
    /// switches `enabled` on.
    pub fn cascade(&mut self) {
        if self.enable_updates || self.enable_health_metrics {
            self.enabled = true;
        }
    }

    /// Health report interval, `None` when it is zero.
    pub fn health_interval(&self) -> Option<Duration> {
        match self.health_metrics_interval_minutes {
            0 => None,
            m => Some(Duration::from_secs(u64::from(m) * 60)),
        }
    }
}

impl Default for CloudSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            enable_updates: false,
            enable_health_metrics: false,
            health_metrics_interval_minutes: DEFAULT_HEALTH_INTERVAL_MINUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updates_or_health_enable_connectivity() {
        let mut cloud = CloudSettings {
            enable_updates: true,
            ..CloudSettings::default()
        };
        cloud.cascade();
        assert!(cloud.enabled);

        let mut cloud = CloudSettings {
            enable_health_metrics: true,
            ..CloudSettings::default()
        };
        cloud.cascade();
        assert!(cloud.enabled);

        let mut cloud = CloudSettings::default();
        cloud.cascade();
        assert!(!cloud.enabled);
    }

    #[test]
    fn negative_restart_delay_clamps_to_zero() {
        let lifecycle = LifecycleSettings {
            restart_on_app_failure: true,
            app_failure_restart_delay_seconds: -3,
        };
        assert_eq!(lifecycle.restart_delay(), Duration::ZERO);
        assert_eq!(
            LifecycleSettings::default().restart_delay(),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn partial_document_fills_defaults() {
        let s: Settings = serde_json::from_str(
            r#"{ "logging": { "level": "warn" }, "settings": { "unit": "celsius" } }"#,
        )
        .unwrap();
        assert_eq!(s.logging.level, LogLevel::Warn);
        assert!(!s.logging.show_ticks);
        assert_eq!(s.lifecycle, LifecycleSettings::default());
        assert_eq!(s.settings.get("unit").map(String::as_str), Some("celsius"));
    }

    #[test]
    fn zero_interval_disables_health_reports() {
        let cloud = CloudSettings {
            health_metrics_interval_minutes: 0,
            ..CloudSettings::default()
        };
        assert_eq!(cloud.health_interval(), None);
        assert_eq!(
            CloudSettings::default().health_interval(),
            Some(Duration::from_secs(3600))
        );
    }
}
