//! Immutable summary of what a device instance supports.
//!
//! Built once when the device is constructed and shared as
//! `Arc<DeviceCapabilities>`; nothing mutates it afterwards.

/// Default ADC resolution of the F7 boards.
pub const DEFAULT_ANALOG_RESOLUTION_BITS: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalogCapabilities {
    pub has_adc: bool,
    /// `None` when there is no ADC.
    pub resolution_bits: Option<u8>,
}

impl AnalogCapabilities {
    pub fn adc(resolution_bits: u8) -> Self {
        Self {
            has_adc: true,
            resolution_bits: Some(resolution_bits),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkCapabilities {
    pub wifi: bool,
    pub ethernet: bool,
}

impl NetworkCapabilities {
    #[inline]
    pub fn any(&self) -> bool {
        self.wifi || self.ethernet
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StorageCapabilities {
    /// Persistent file system available to applications.
    pub file_system: bool,
}

/// Capability snapshot of one device instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceCapabilities {
    analog: AnalogCapabilities,
    network: NetworkCapabilities,
    storage: StorageCapabilities,
}

impl DeviceCapabilities {
    pub fn new(
        analog: AnalogCapabilities,
        network: NetworkCapabilities,
        storage: StorageCapabilities,
    ) -> Self {
        Self {
            analog,
            network,
            storage,
        }
    }

    #[inline]
    pub fn analog(&self) -> AnalogCapabilities {
        self.analog
    }

    #[inline]
    pub fn network(&self) -> NetworkCapabilities {
        self.network
    }

    #[inline]
    pub fn storage(&self) -> StorageCapabilities {
        self.storage
    }

    /// Whether networked subsystems (connectivity, updates, health) can run.
    #[inline]
    pub fn has_network(&self) -> bool {
        self.network.any()
    }
}
