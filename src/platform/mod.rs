//! Platform detection and application resolution.
//!
//! ## Contents
//! - [`detect`], [`PlatformKind`], [`PlatformProbe`] classify the running environment
//! - [`Resolver`], [`AppDescriptor`], [`DeviceTarget`] pick one application for it

mod detect;
mod resolver;

pub use detect::{
    HARDWARE_REVISION_FILE, HardwareRevision, HostProbe, PlatformKind, PlatformProbe,
    TARGET_MARKER_DIR, detect,
};
pub use resolver::{
    AppDescriptor, DeviceTarget, Resolution, ResolveWarning, Resolver, resolve,
};
