//! Policies.
//!
//! - [`RestartPolicy`], [`BackoffPolicy`], [`JitterPolicy`] govern background subsystem tasks.
//! - [`decide`] / [`execute`] govern the hardware restart after the app terminates.

mod backoff;
mod jitter;
mod reboot;
mod restart;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use reboot::{NoRestartReason, RestartDecision, decide, execute, explain};
pub use restart::RestartPolicy;
