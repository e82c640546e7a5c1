//! # Per-variant pin tables.
//!
//! Each supported board variant owns exactly one static [`PinTable`]: the pin
//! rows, the clock-pin → bus-number routes for SPI and I2C, the default bus
//! wiring and the serial port names. Tables are never mutated and are shared
//! across threads as `&'static PinTable`.
//!
//! ## Bus routes
//! ```text
//! F7 Feather v1/v2        F7 Core Compute v2
//!   SPI  ESP_CLK → 2        SPI  ESP_CLK   → 2
//!        SCK     → 3             SPI3_SCK  → 3
//!   I2C  D08     → 1             SPI5_SCK  → 5
//!                           I2C  I2C1_SCL  → 1
//!                                I2C3_SCL  → 3
//! ```

use std::fmt;

use crate::error::ResourceError;

use super::bus::BusKind;
use super::pins::{Pin, PinRoles};

/// Board variants that carry a physical pin table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceVariant {
    F7FeatherV1,
    F7FeatherV2,
    F7CoreComputeV2,
}

impl DeviceVariant {
    /// Returns the static pin table for this variant.
    pub fn table(self) -> &'static PinTable {
        match self {
            DeviceVariant::F7FeatherV1 => &F7_FEATHER_V1,
            DeviceVariant::F7FeatherV2 => &F7_FEATHER_V2,
            DeviceVariant::F7CoreComputeV2 => &F7_CORE_COMPUTE_V2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceVariant::F7FeatherV1 => "f7_feather_v1",
            DeviceVariant::F7FeatherV2 => "f7_feather_v2",
            DeviceVariant::F7CoreComputeV2 => "f7_core_compute_v2",
        }
    }
}

impl fmt::Display for DeviceVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a clock pin (by name) to the bus controller number it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct ClockRoute {
    pub clock: &'static str,
    pub bus: u8,
}

/// Maps a friendly serial port name to the OS device name.
#[derive(Debug, Clone, Copy)]
pub struct SerialRoute {
    pub name: &'static str,
    pub device: &'static str,
}

/// Immutable pin table of one device variant.
#[derive(Debug)]
pub struct PinTable {
    variant: DeviceVariant,
    pins: &'static [Pin],
    spi_routes: &'static [ClockRoute],
    i2c_routes: &'static [ClockRoute],
    default_spi: [&'static str; 3],
    default_i2c: [&'static str; 2],
    serial: &'static [SerialRoute],
}

impl PinTable {
    #[inline]
    pub fn variant(&self) -> DeviceVariant {
        self.variant
    }

    /// All pins of the variant, in physical index order.
    #[inline]
    pub fn pins(&self) -> &'static [Pin] {
        self.pins
    }

    /// Looks up a pin by name.
    pub fn pin(&self, name: &str) -> Result<&'static Pin, ResourceError> {
        self.pins
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| ResourceError::UnknownPin {
                pin: name.to_string(),
                variant: self.variant,
            })
    }

    /// True if `pin` is a row of this table.
    pub fn contains(&self, pin: &Pin) -> bool {
        pin.variant() == self.variant
            && self
                .pins
                .get(usize::from(pin.index()))
                .is_some_and(|own| own.name() == pin.name())
    }

    /// Bus number of the controller whose clock line is `clock`, if any.
    pub fn bus_number(&self, kind: BusKind, clock: &Pin) -> Option<u8> {
        let routes = match kind {
            BusKind::Spi => self.spi_routes,
            BusKind::I2c => self.i2c_routes,
        };
        routes
            .iter()
            .find(|r| r.clock == clock.name())
            .map(|r| r.bus)
    }

    /// Default SPI wiring: clock, COPI, CIPO.
    pub fn default_spi_pins(&self) -> Result<[&'static Pin; 3], ResourceError> {
        let [clk, copi, cipo] = self.default_spi;
        Ok([self.pin(clk)?, self.pin(copi)?, self.pin(cipo)?])
    }

    /// Default I2C wiring: clock, data.
    pub fn default_i2c_pins(&self) -> Result<[&'static Pin; 2], ResourceError> {
        let [scl, sda] = self.default_i2c;
        Ok([self.pin(scl)?, self.pin(sda)?])
    }

    /// OS device name of a friendly serial port name.
    pub fn serial_device(&self, name: &str) -> Option<&'static str> {
        self.serial
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .map(|s| s.device)
    }

    /// Pins tagged as onboard indicators.
    pub fn onboard_indicators(&self) -> impl Iterator<Item = &'static Pin> {
        self.pins.iter().filter(|p| p.is_onboard_indicator())
    }
}

const PWM_MIN_HZ: f32 = 0.0;
const PWM_MAX_HZ: f32 = 100_000.0;

/// Feather form factor; v1 and v2 share the header layout.
const fn feather_pins(v: DeviceVariant) -> [Pin; 31] {
    [
        Pin::gpio(v, 0, "A00").with_analog(),
        Pin::gpio(v, 1, "A01").with_analog(),
        Pin::gpio(v, 2, "A02").with_analog(),
        Pin::gpio(v, 3, "A03").with_analog(),
        Pin::gpio(v, 4, "A04").with_analog(),
        Pin::gpio(v, 5, "A05").with_analog(),
        Pin::gpio(v, 6, "SCK").with_role(PinRoles::SPI_CLOCK),
        Pin::gpio(v, 7, "COPI").with_role(PinRoles::SPI_COPI),
        Pin::gpio(v, 8, "CIPO").with_role(PinRoles::SPI_CIPO),
        Pin::gpio(v, 9, "D00"),
        Pin::gpio(v, 10, "D01"),
        Pin::gpio(v, 11, "D02").with_pwm(PWM_MIN_HZ, PWM_MAX_HZ),
        Pin::gpio(v, 12, "D03").with_pwm(PWM_MIN_HZ, PWM_MAX_HZ),
        Pin::gpio(v, 13, "D04").with_pwm(PWM_MIN_HZ, PWM_MAX_HZ),
        Pin::gpio(v, 14, "D05").with_pwm(PWM_MIN_HZ, PWM_MAX_HZ),
        Pin::gpio(v, 15, "D06").with_pwm(PWM_MIN_HZ, PWM_MAX_HZ),
        Pin::gpio(v, 16, "D07")
            .with_pwm(PWM_MIN_HZ, PWM_MAX_HZ)
            .with_role(PinRoles::I2C_DATA),
        Pin::gpio(v, 17, "D08")
            .with_pwm(PWM_MIN_HZ, PWM_MAX_HZ)
            .with_role(PinRoles::I2C_CLOCK),
        Pin::gpio(v, 18, "D09").with_pwm(PWM_MIN_HZ, PWM_MAX_HZ),
        Pin::gpio(v, 19, "D10").with_pwm(PWM_MIN_HZ, PWM_MAX_HZ),
        Pin::gpio(v, 20, "D11").with_pwm(PWM_MIN_HZ, PWM_MAX_HZ),
        Pin::gpio(v, 21, "D12").with_pwm(PWM_MIN_HZ, PWM_MAX_HZ),
        Pin::gpio(v, 22, "D13").with_pwm(PWM_MIN_HZ, PWM_MAX_HZ),
        Pin::gpio(v, 23, "D14"),
        Pin::gpio(v, 24, "D15"),
        Pin::gpio(v, 25, "ESP_CLK")
            .digital_only()
            .with_role(PinRoles::SPI_CLOCK),
        Pin::gpio(v, 26, "ESP_MOSI")
            .digital_only()
            .with_role(PinRoles::SPI_COPI),
        Pin::gpio(v, 27, "ESP_MISO")
            .digital_only()
            .with_role(PinRoles::SPI_CIPO),
        Pin::gpio(v, 28, "OnboardLedRed")
            .with_pwm(PWM_MIN_HZ, PWM_MAX_HZ)
            .with_role(PinRoles::ONBOARD_INDICATOR),
        Pin::gpio(v, 29, "OnboardLedGreen")
            .with_pwm(PWM_MIN_HZ, PWM_MAX_HZ)
            .with_role(PinRoles::ONBOARD_INDICATOR),
        Pin::gpio(v, 30, "OnboardLedBlue")
            .with_pwm(PWM_MIN_HZ, PWM_MAX_HZ)
            .with_role(PinRoles::ONBOARD_INDICATOR),
    ]
}

const fn core_compute_pins(v: DeviceVariant) -> [Pin; 35] {
    [
        Pin::gpio(v, 0, "A00").with_analog(),
        Pin::gpio(v, 1, "A01").with_analog(),
        Pin::gpio(v, 2, "A02").with_analog(),
        Pin::gpio(v, 3, "A03").with_analog(),
        Pin::gpio(v, 4, "A04").with_analog(),
        Pin::gpio(v, 5, "A05").with_analog(),
        Pin::gpio(v, 6, "A06").with_analog(),
        Pin::gpio(v, 7, "A07").with_analog(),
        Pin::gpio(v, 8, "D00"),
        Pin::gpio(v, 9, "D01"),
        Pin::gpio(v, 10, "D02").with_pwm(PWM_MIN_HZ, PWM_MAX_HZ),
        Pin::gpio(v, 11, "D03").with_pwm(PWM_MIN_HZ, PWM_MAX_HZ),
        Pin::gpio(v, 12, "D04").with_pwm(PWM_MIN_HZ, PWM_MAX_HZ),
        Pin::gpio(v, 13, "D05").with_pwm(PWM_MIN_HZ, PWM_MAX_HZ),
        Pin::gpio(v, 14, "D06").with_pwm(PWM_MIN_HZ, PWM_MAX_HZ),
        Pin::gpio(v, 15, "D07").with_pwm(PWM_MIN_HZ, PWM_MAX_HZ),
        Pin::gpio(v, 16, "D08"),
        Pin::gpio(v, 17, "D09"),
        Pin::gpio(v, 18, "D10"),
        Pin::gpio(v, 19, "D11"),
        Pin::gpio(v, 20, "SPI3_SCK").with_role(PinRoles::SPI_CLOCK),
        Pin::gpio(v, 21, "SPI3_COPI").with_role(PinRoles::SPI_COPI),
        Pin::gpio(v, 22, "SPI3_CIPO").with_role(PinRoles::SPI_CIPO),
        Pin::gpio(v, 23, "SPI5_SCK").with_role(PinRoles::SPI_CLOCK),
        Pin::gpio(v, 24, "SPI5_COPI").with_role(PinRoles::SPI_COPI),
        Pin::gpio(v, 25, "SPI5_CIPO").with_role(PinRoles::SPI_CIPO),
        Pin::gpio(v, 26, "I2C1_SCL").with_role(PinRoles::I2C_CLOCK),
        Pin::gpio(v, 27, "I2C1_SDA").with_role(PinRoles::I2C_DATA),
        Pin::gpio(v, 28, "I2C3_SCL").with_role(PinRoles::I2C_CLOCK),
        Pin::gpio(v, 29, "I2C3_SDA").with_role(PinRoles::I2C_DATA),
        Pin::gpio(v, 30, "ESP_CLK")
            .digital_only()
            .with_role(PinRoles::SPI_CLOCK),
        Pin::gpio(v, 31, "ESP_MOSI")
            .digital_only()
            .with_role(PinRoles::SPI_COPI),
        Pin::gpio(v, 32, "ESP_MISO")
            .digital_only()
            .with_role(PinRoles::SPI_CIPO),
        Pin::gpio(v, 33, "OnboardLedRed")
            .with_pwm(PWM_MIN_HZ, PWM_MAX_HZ)
            .with_role(PinRoles::ONBOARD_INDICATOR),
        Pin::gpio(v, 34, "OnboardLedGreen")
            .with_pwm(PWM_MIN_HZ, PWM_MAX_HZ)
            .with_role(PinRoles::ONBOARD_INDICATOR),
    ]
}

static FEATHER_V1_PINS: [Pin; 31] = feather_pins(DeviceVariant::F7FeatherV1);
static FEATHER_V2_PINS: [Pin; 31] = feather_pins(DeviceVariant::F7FeatherV2);
static CORE_COMPUTE_V2_PINS: [Pin; 35] = core_compute_pins(DeviceVariant::F7CoreComputeV2);

const FEATHER_SPI_ROUTES: &[ClockRoute] = &[
    ClockRoute { clock: "ESP_CLK", bus: 2 },
    ClockRoute { clock: "SCK", bus: 3 },
];
const FEATHER_I2C_ROUTES: &[ClockRoute] = &[ClockRoute { clock: "D08", bus: 1 }];
const FEATHER_SERIAL: &[SerialRoute] = &[
    SerialRoute { name: "Com1", device: "ttyS0" },
    SerialRoute { name: "Com4", device: "ttyS1" },
];

pub static F7_FEATHER_V1: PinTable = PinTable {
    variant: DeviceVariant::F7FeatherV1,
    pins: &FEATHER_V1_PINS,
    spi_routes: FEATHER_SPI_ROUTES,
    i2c_routes: FEATHER_I2C_ROUTES,
    default_spi: ["SCK", "COPI", "CIPO"],
    default_i2c: ["D08", "D07"],
    serial: FEATHER_SERIAL,
};

pub static F7_FEATHER_V2: PinTable = PinTable {
    variant: DeviceVariant::F7FeatherV2,
    pins: &FEATHER_V2_PINS,
    spi_routes: FEATHER_SPI_ROUTES,
    i2c_routes: FEATHER_I2C_ROUTES,
    default_spi: ["SCK", "COPI", "CIPO"],
    default_i2c: ["D08", "D07"],
    serial: FEATHER_SERIAL,
};

pub static F7_CORE_COMPUTE_V2: PinTable = PinTable {
    variant: DeviceVariant::F7CoreComputeV2,
    pins: &CORE_COMPUTE_V2_PINS,
    spi_routes: &[
        ClockRoute { clock: "ESP_CLK", bus: 2 },
        ClockRoute { clock: "SPI3_SCK", bus: 3 },
        ClockRoute { clock: "SPI5_SCK", bus: 5 },
    ],
    i2c_routes: &[
        ClockRoute { clock: "I2C1_SCL", bus: 1 },
        ClockRoute { clock: "I2C3_SCL", bus: 3 },
    ],
    default_spi: ["SPI5_SCK", "SPI5_COPI", "SPI5_CIPO"],
    default_i2c: ["I2C1_SCL", "I2C1_SDA"],
    serial: &[
        SerialRoute { name: "Com1", device: "ttyS0" },
        SerialRoute { name: "Com4", device: "ttyS1" },
        SerialRoute { name: "Com5", device: "ttyS2" },
    ],
};
