//! # Event subscribers.
//!
//! ```text
//! publishers ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                          ├──► LogWriter
//!                                                          └──► custom subscribers
//! ```
//!
//! Implement [`Subscribe`] to route events elsewhere (files, telemetry, tests).

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
