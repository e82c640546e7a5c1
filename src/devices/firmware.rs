use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::args::LaunchArgs;
use crate::device::PlatformOs;
use crate::error::DeviceError;
use crate::hardware::{DeviceCapabilities, DeviceVariant};

type ResetLine = Box<dyn Fn() -> Result<(), DeviceError> + Send + Sync>;

/// Platform OS of an F7 board.
///
/// A reset is accepted and counted. The board-specific action behind it (a
/// watchdog, a reset line) is supplied with [`FirmwareOs::with_reset_line`];
/// its error, if any, is the reset's error.
pub struct FirmwareOs {
    variant: DeviceVariant,
    reset_line: Option<ResetLine>,
    resets: AtomicUsize,
}

impl FirmwareOs {
    pub fn new(variant: DeviceVariant) -> Self {
        Self {
            variant,
            reset_line: None,
            resets: AtomicUsize::new(0),
        }
    }

    pub fn with_reset_line<F>(mut self, line: F) -> Self
    where
        F: Fn() -> Result<(), DeviceError> + Send + Sync + 'static,
    {
        self.reset_line = Some(Box::new(line));
        self
    }

    pub fn variant(&self) -> DeviceVariant {
        self.variant
    }

    /// Accepted resets so far.
    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for FirmwareOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirmwareOs")
            .field("variant", &self.variant)
            .field("reset_line", &self.reset_line.is_some())
            .field("resets", &self.resets())
            .finish()
    }
}

impl PlatformOs for FirmwareOs {
    fn initialize(&self, caps: &DeviceCapabilities, _: &LaunchArgs) -> Result<(), DeviceError> {
        if !caps.storage().file_system {
            return Err(DeviceError::failed(format!(
                "{} firmware needs its flash file system",
                self.variant
            )));
        }
        Ok(())
    }

    fn reset(&self) -> Result<(), DeviceError> {
        if let Some(line) = &self.reset_line {
            line()?;
        }
        self.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
