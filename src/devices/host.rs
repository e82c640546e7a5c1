use crate::args::LaunchArgs;
use crate::device::PlatformOs;
use crate::error::DeviceError;
use crate::hardware::DeviceCapabilities;

/// Platform OS of a general-purpose host: nothing to bring up, no hardware reset.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostOs;

impl PlatformOs for HostOs {
    fn initialize(&self, _: &DeviceCapabilities, _: &LaunchArgs) -> Result<(), DeviceError> {
        Ok(())
    }

    fn reset(&self) -> Result<(), DeviceError> {
        Err(DeviceError::Unsupported { operation: "reset" })
    }
}
