//! Built-in devices.
//!
//! - [`Board`] F7 board backed by its variant pin table
//! - [`Desktop`] general-purpose host, for running apps off-target
//! - [`FirmwareOs`] platform OS of a board; accepts hardware resets
//! - [`HostOs`] platform OS with no bring-up and no hardware reset

mod board;
mod desktop;
mod firmware;
mod host;

pub use board::Board;
pub use desktop::Desktop;
pub use firmware::FirmwareOs;
pub use host::HostOs;
