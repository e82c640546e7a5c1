//! Generic F7 board device backed by a variant pin table.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::SubsystemKind;
use crate::device::{Device, PlatformOs, ReliabilityService};
use crate::error::DeviceError;
use crate::hardware::{
    AnalogCapabilities, Arbiter, DEFAULT_ANALOG_RESOLUTION_BITS, DeviceCapabilities,
    DeviceVariant, NetworkCapabilities, StorageCapabilities,
};
use crate::platform::{DeviceTarget, HardwareRevision, PlatformKind};
use crate::settings::CloudSettings;
use crate::tasks::TaskRef;

use super::firmware::FirmwareOs;

pub struct Board {
    variant: DeviceVariant,
    capabilities: Arc<DeviceCapabilities>,
    os: Arc<dyn PlatformOs>,
    reliability: Option<Arc<dyn ReliabilityService>>,
    subsystems: HashMap<SubsystemKind, TaskRef>,
}

impl Board {
    pub fn new(variant: DeviceVariant) -> Self {
        Self {
            variant,
            capabilities: Arc::new(capabilities_of(variant)),
            os: Arc::new(FirmwareOs::new(variant)),
            reliability: None,
            subsystems: HashMap::new(),
        }
    }

    /// Replaces the platform OS (the board's firmware bindings).
    pub fn with_platform_os(mut self, os: Arc<dyn PlatformOs>) -> Self {
        self.os = os;
        self
    }

    pub fn with_reliability(mut self, service: Arc<dyn ReliabilityService>) -> Self {
        self.reliability = Some(service);
        self
    }

    /// Registers the background task implementing `kind`.
    pub fn with_subsystem(mut self, kind: SubsystemKind, task: TaskRef) -> Self {
        self.subsystems.insert(kind, task);
        self
    }

    pub fn variant(&self) -> DeviceVariant {
        self.variant
    }
}

fn capabilities_of(variant: DeviceVariant) -> DeviceCapabilities {
    let network = match variant {
        DeviceVariant::F7FeatherV1 | DeviceVariant::F7FeatherV2 => NetworkCapabilities {
            wifi: true,
            ethernet: false,
        },
        DeviceVariant::F7CoreComputeV2 => NetworkCapabilities {
            wifi: true,
            ethernet: true,
        },
    };
    DeviceCapabilities::new(
        AnalogCapabilities::adc(DEFAULT_ANALOG_RESOLUTION_BITS),
        network,
        StorageCapabilities { file_system: true },
    )
}

impl Device for Board {
    fn target(&self) -> DeviceTarget {
        DeviceTarget::Board(self.variant)
    }

    fn capabilities(&self) -> Arc<DeviceCapabilities> {
        Arc::clone(&self.capabilities)
    }

    fn initialize(&mut self, platform: PlatformKind) -> Result<(), DeviceError> {
        match platform {
            PlatformKind::TargetHardware(HardwareRevision::Unknown) => Ok(()),
            PlatformKind::TargetHardware(rev) if rev.variant() == Some(self.variant) => Ok(()),
            other => Err(DeviceError::failed(format!(
                "{} board cannot run on {other}",
                self.variant
            ))),
        }
    }

    fn platform_os(&self) -> Arc<dyn PlatformOs> {
        Arc::clone(&self.os)
    }

    fn reliability_service(&self) -> Result<Option<Arc<dyn ReliabilityService>>, DeviceError> {
        Ok(self.reliability.clone())
    }

    fn arbiter(&self) -> Option<Arbiter> {
        Some(Arbiter::for_variant(self.variant))
    }

    fn subsystem(&self, kind: SubsystemKind, _cloud: &CloudSettings) -> Option<TaskRef> {
        self.subsystems.get(&kind).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::LaunchArgs;
    use crate::hardware::{BusKind, PortRequest};

    #[test]
    fn board_runs_only_on_its_hardware() {
        let mut board = Board::new(DeviceVariant::F7FeatherV2);
        assert!(board.initialize(PlatformKind::DesktopLinux).is_err());
        assert!(
            board
                .initialize(PlatformKind::TargetHardware(HardwareRevision::F7FeatherV1))
                .is_err()
        );
        assert!(
            board
                .initialize(PlatformKind::TargetHardware(HardwareRevision::F7FeatherV2))
                .is_ok()
        );
        assert!(
            board
                .initialize(PlatformKind::TargetHardware(HardwareRevision::Unknown))
                .is_ok()
        );
    }

    #[test]
    fn capabilities_follow_variant() {
        let feather = Board::new(DeviceVariant::F7FeatherV1).capabilities();
        assert_eq!(feather.analog().resolution_bits, Some(12));
        assert!(feather.network().wifi && !feather.network().ethernet);

        let ccm = Board::new(DeviceVariant::F7CoreComputeV2).capabilities();
        assert!(ccm.network().ethernet);
        assert!(ccm.storage().file_system);
    }

    #[test]
    fn default_platform_os_accepts_reset() {
        let board = Board::new(DeviceVariant::F7FeatherV2);
        let os = board.platform_os();
        assert!(os.initialize(&board.capabilities(), &LaunchArgs::default()).is_ok());
        assert!(os.reset().is_ok());
    }

    #[test]
    fn arbiter_uses_the_board_table() {
        let board = Board::new(DeviceVariant::F7CoreComputeV2);
        let arbiter = board.arbiter().unwrap();
        let bus = arbiter.default_i2c_bus(400_000).unwrap();
        assert_eq!(bus.kind(), BusKind::I2c);
        assert_eq!(bus.bus_number(), 1);

        let led = arbiter.pin("OnboardLedGreen").unwrap();
        let port = arbiter.create_port(led, PortRequest::pwm()).unwrap();
        assert!(port.is_onboard_indicator());
    }
}
