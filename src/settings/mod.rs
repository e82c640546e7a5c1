//! Application settings consumed by the supervisor and handed to the app.
//!
//! Sections: logging, lifecycle (restart behavior), cloud (optional
//! subsystems) and a free-form map. See [`load`] for where they come from.

mod loader;
mod model;

pub use loader::{SETTINGS_FILE, load};
pub use model::{
    CloudSettings, DEFAULT_HEALTH_INTERVAL_MINUTES, DEFAULT_RESTART_DELAY_SECS, LifecycleSettings,
    LogLevel, LoggingSettings, Settings,
};
