//! Bus descriptors produced by the [`Arbiter`](super::Arbiter).

use std::fmt;

use super::pins::Pin;

/// Default SPI clock when the caller does not provide one.
pub const DEFAULT_SPI_SPEED_KHZ: u32 = 375;
/// Default I2C clock when the caller does not provide one.
pub const DEFAULT_I2C_FREQUENCY_HZ: u32 = 100_000;

/// Shared bus families the arbiter can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusKind {
    Spi,
    I2c,
}

impl BusKind {
    /// Number of pins a request for this bus must supply.
    #[inline]
    pub fn pin_count(self) -> usize {
        match self {
            BusKind::Spi => 3,
            BusKind::I2c => 2,
        }
    }
}

impl fmt::Display for BusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusKind::Spi => f.write_str("spi"),
            BusKind::I2c => f.write_str("i2c"),
        }
    }
}

/// SPI clock polarity/phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpiMode {
    #[default]
    Mode0,
    Mode1,
    Mode2,
    Mode3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiClockConfig {
    pub speed_khz: u32,
    pub mode: SpiMode,
}

impl Default for SpiClockConfig {
    fn default() -> Self {
        Self {
            speed_khz: DEFAULT_SPI_SPEED_KHZ,
            mode: SpiMode::Mode0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cClockConfig {
    pub frequency_hz: u32,
}

impl Default for I2cClockConfig {
    fn default() -> Self {
        Self {
            frequency_hz: DEFAULT_I2C_FREQUENCY_HZ,
        }
    }
}

/// Clock configuration of a bus; the variant must match the bus kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusClock {
    Spi(SpiClockConfig),
    I2c(I2cClockConfig),
}

impl BusClock {
    /// Default clock for `kind`.
    pub fn default_for(kind: BusKind) -> Self {
        match kind {
            BusKind::Spi => BusClock::Spi(SpiClockConfig::default()),
            BusKind::I2c => BusClock::I2c(I2cClockConfig::default()),
        }
    }

    #[inline]
    pub fn kind(&self) -> BusKind {
        match self {
            BusClock::Spi(_) => BusKind::Spi,
            BusClock::I2c(_) => BusKind::I2c,
        }
    }
}

/// A resolved SPI or I2C bus.
///
/// The bus number is derived from the clock pin at resolution time and has no
/// setter: the same physical wiring always yields the same number.
#[derive(Debug, Clone, PartialEq)]
pub struct BusDescriptor {
    kind: BusKind,
    pins: Vec<&'static Pin>,
    bus_number: u8,
    clock: BusClock,
}

impl BusDescriptor {
    pub(crate) fn new(
        kind: BusKind,
        pins: Vec<&'static Pin>,
        bus_number: u8,
        clock: BusClock,
    ) -> Self {
        Self {
            kind,
            pins,
            bus_number,
            clock,
        }
    }

    #[inline]
    pub fn kind(&self) -> BusKind {
        self.kind
    }

    /// Participating pins, clock first.
    #[inline]
    pub fn pins(&self) -> &[&'static Pin] {
        &self.pins
    }

    #[inline]
    pub fn clock_pin(&self) -> &'static Pin {
        self.pins[0]
    }

    #[inline]
    pub fn bus_number(&self) -> u8 {
        self.bus_number
    }

    #[inline]
    pub fn clock(&self) -> BusClock {
        self.clock
    }

    /// Returns a copy with a different clock configuration of the same kind.
    ///
    /// A clock of another bus kind is ignored.
    pub fn with_clock(mut self, clock: BusClock) -> Self {
        if clock.kind() == self.kind {
            self.clock = clock;
        }
        self
    }
}
