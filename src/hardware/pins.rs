//! # Physical pins and their capability flags.
//!
//! A [`Pin`] is a row of a device variant's pin table. Pins are only ever
//! constructed inside the static tables in [`variants`](super::variants) and are
//! handed out as `&'static Pin`, so a pin's identity is its place in the table.
//!
//! ## Flags
//! - [`PinCaps`] electrical/logical functions the pin supports;
//! - [`PinRoles`] fixed bus roles and board annotations the pin is wired for.

use std::fmt;
use std::hash::{Hash, Hasher};

use bitflags::bitflags;

use super::variants::DeviceVariant;

bitflags! {
    /// Electrical/logical capabilities of a single pin.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PinCaps: u16 {
        /// Can be read as a digital input.
        const DIGITAL_IN  = 1 << 0;
        /// Can be driven as a digital output.
        const DIGITAL_OUT = 1 << 1;
        /// Routed to an ADC channel.
        const ANALOG_IN   = 1 << 2;
        /// Routed to a timer channel capable of PWM.
        const PWM         = 1 << 3;
        /// Can raise edge interrupts.
        const INTERRUPT   = 1 << 4;
        /// Has an internal pull-up resistor.
        const PULL_UP     = 1 << 5;
        /// Has an internal pull-down resistor.
        const PULL_DOWN   = 1 << 6;

        /// Both digital directions.
        const DIGITAL = Self::DIGITAL_IN.bits() | Self::DIGITAL_OUT.bits();
        /// A general purpose I/O line.
        const GPIO = Self::DIGITAL.bits()
            | Self::INTERRUPT.bits()
            | Self::PULL_UP.bits()
            | Self::PULL_DOWN.bits();
    }
}

bitflags! {
    /// Fixed bus roles and board-level annotations.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PinRoles: u16 {
        /// SPI clock line.
        const SPI_CLOCK = 1 << 0;
        /// SPI controller-out / peripheral-in line.
        const SPI_COPI  = 1 << 1;
        /// SPI controller-in / peripheral-out line.
        const SPI_CIPO  = 1 << 2;
        /// I2C clock line.
        const I2C_CLOCK = 1 << 3;
        /// I2C data line.
        const I2C_DATA  = 1 << 4;
        /// Drives an onboard indicator LED.
        const ONBOARD_INDICATOR = 1 << 8;
    }
}

/// Frequency range supported by a PWM-capable pin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PwmRange {
    pub min_hz: f32,
    pub max_hz: f32,
}

impl PwmRange {
    #[inline]
    pub fn contains(&self, hz: f32) -> bool {
        hz.is_finite() && hz >= self.min_hz && hz <= self.max_hz
    }
}

/// A physical pin of a device variant.
///
/// Equality and hashing use `(variant, index)`: two lookups of the same
/// physical pin always compare equal, pins of different variants never do.
#[derive(Debug)]
pub struct Pin {
    variant: DeviceVariant,
    name: &'static str,
    index: u16,
    caps: PinCaps,
    roles: PinRoles,
    pwm: Option<PwmRange>,
}

impl Pin {
    /// A plain general purpose I/O pin.
    pub(crate) const fn gpio(variant: DeviceVariant, index: u16, name: &'static str) -> Self {
        Self {
            variant,
            name,
            index,
            caps: PinCaps::GPIO,
            roles: PinRoles::empty(),
            pwm: None,
        }
    }

    pub(crate) const fn with_analog(mut self) -> Self {
        self.caps = self.caps.union(PinCaps::ANALOG_IN);
        self
    }

    pub(crate) const fn with_pwm(mut self, min_hz: f32, max_hz: f32) -> Self {
        self.caps = self.caps.union(PinCaps::PWM);
        self.pwm = Some(PwmRange { min_hz, max_hz });
        self
    }

    pub(crate) const fn with_role(mut self, role: PinRoles) -> Self {
        self.roles = self.roles.union(role);
        self
    }

    /// Restricts the pin to push/pull digital I/O (no interrupts, no pulls).
    pub(crate) const fn digital_only(mut self) -> Self {
        self.caps = self
            .caps
            .difference(PinCaps::INTERRUPT.union(PinCaps::PULL_UP).union(PinCaps::PULL_DOWN));
        self
    }

    #[inline]
    pub fn variant(&self) -> DeviceVariant {
        self.variant
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Physical index within the variant's table.
    #[inline]
    pub fn index(&self) -> u16 {
        self.index
    }

    #[inline]
    pub fn caps(&self) -> PinCaps {
        self.caps
    }

    #[inline]
    pub fn roles(&self) -> PinRoles {
        self.roles
    }

    #[inline]
    pub fn pwm_range(&self) -> Option<PwmRange> {
        self.pwm
    }

    /// True if every flag in `required` is present.
    #[inline]
    pub fn supports(&self, required: PinCaps) -> bool {
        self.caps.contains(required)
    }

    #[inline]
    pub fn is_onboard_indicator(&self) -> bool {
        self.roles.contains(PinRoles::ONBOARD_INDICATOR)
    }
}

impl PartialEq for Pin {
    fn eq(&self, other: &Self) -> bool {
        self.variant == other.variant && self.index == other.index
    }
}

impl Eq for Pin {}

impl Hash for Pin {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.variant.hash(state);
        self.index.hash(state);
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.variant, self.name)
    }
}
