//! Hardware resource model: pin tables, capabilities and the resource arbiter.
//!
//! ## Contents
//! - [`Pin`], [`PinCaps`], [`PinRoles`] rows of a variant's pin table
//! - [`PinTable`], [`DeviceVariant`] one static table per board variant
//! - [`Arbiter`] pure resolution of bus/port/serial requests
//! - [`BusDescriptor`], [`PortHandle`], [`SerialPortDescriptor`] resolution results
//! - [`DeviceCapabilities`] immutable per-device feature snapshot

mod arbiter;
mod bus;
mod capabilities;
mod pins;
mod port;
mod variants;

pub use arbiter::Arbiter;
pub use bus::{
    BusClock, BusDescriptor, BusKind, DEFAULT_I2C_FREQUENCY_HZ, DEFAULT_SPI_SPEED_KHZ,
    I2cClockConfig, SpiClockConfig, SpiMode,
};
pub use capabilities::{
    AnalogCapabilities, DEFAULT_ANALOG_RESOLUTION_BITS, DeviceCapabilities, NetworkCapabilities,
    StorageCapabilities,
};
pub use pins::{Pin, PinCaps, PinRoles, PwmRange};
pub use port::{
    InputConfig, InterruptMode, OutputType, Parity, PortDirection, PortHandle, PortKind,
    PortRequest, ResistorMode, SerialConfig, SerialPortDescriptor, StopBits,
};
pub use variants::{
    ClockRoute, DeviceVariant, F7_CORE_COMPUTE_V2, F7_FEATHER_V1, F7_FEATHER_V2, PinTable,
    SerialRoute,
};
