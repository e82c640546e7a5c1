use std::sync::Arc;

use crate::device::{Device, PlatformOs};
use crate::error::DeviceError;
use crate::hardware::{
    AnalogCapabilities, DeviceCapabilities, NetworkCapabilities, StorageCapabilities,
};
use crate::platform::{DeviceTarget, PlatformKind};

use super::host::HostOs;

/// Desktop host device: no pins, no ADC, networked, with a file system.
pub struct Desktop {
    capabilities: Arc<DeviceCapabilities>,
    os: Arc<dyn PlatformOs>,
}

impl Desktop {
    pub fn new() -> Self {
        Self::with_platform_os(Arc::new(HostOs))
    }

    pub fn with_platform_os(os: Arc<dyn PlatformOs>) -> Self {
        let capabilities = DeviceCapabilities::new(
            AnalogCapabilities::default(),
            NetworkCapabilities {
                wifi: false,
                ethernet: true,
            },
            StorageCapabilities { file_system: true },
        );
        Self {
            capabilities: Arc::new(capabilities),
            os,
        }
    }
}

impl Default for Desktop {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for Desktop {
    fn target(&self) -> DeviceTarget {
        DeviceTarget::Desktop
    }

    fn capabilities(&self) -> Arc<DeviceCapabilities> {
        Arc::clone(&self.capabilities)
    }

    fn initialize(&mut self, platform: PlatformKind) -> Result<(), DeviceError> {
        match platform {
            PlatformKind::Windows | PlatformKind::MacOs | PlatformKind::DesktopLinux => Ok(()),
            other => Err(DeviceError::failed(format!(
                "desktop device cannot run on {other}"
            ))),
        }
    }

    fn platform_os(&self) -> Arc<dyn PlatformOs> {
        Arc::clone(&self.os)
    }
}
