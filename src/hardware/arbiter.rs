//! # Resource arbiter: pin requests → concrete bus/port assignments.
//!
//! [`Arbiter`] validates abstract requests against the active variant's
//! [`PinTable`] and resolves them deterministically.
//!
//! ## Bus resolution
//! ```text
//! resolve_bus(pins, kind, clock)
//!   ├─► pins.len() == kind.pin_count()    else PinCount
//!   ├─► every pin ∈ table                 else UnknownPin
//!   ├─► every pin has DIGITAL             else CapabilityMismatch
//!   └─► table.bus_number(kind, pins[0])   else UnsupportedBus
//! ```
//!
//! ## Rules
//! - Holds no mutable state: results are a pure function of
//!   `(variant, pins, request)`; the arbiter is `Copy` and needs no locking.
//! - Only the clock pin selects the bus number; the data pins are validated for
//!   membership and capability only.
//! - PWM requests on onboard indicator pins succeed and are tagged.

use crate::error::ResourceError;

use super::bus::{BusClock, BusDescriptor, BusKind, I2cClockConfig, SpiClockConfig};
use super::pins::{Pin, PinCaps};
use super::port::{PortHandle, PortRequest, SerialConfig, SerialPortDescriptor};
use super::variants::{DeviceVariant, PinTable};

/// Stateless resolver bound to one variant's pin table.
#[derive(Debug, Clone, Copy)]
pub struct Arbiter {
    table: &'static PinTable,
}

impl Arbiter {
    pub fn new(table: &'static PinTable) -> Self {
        Self { table }
    }

    pub fn for_variant(variant: DeviceVariant) -> Self {
        Self::new(variant.table())
    }

    #[inline]
    pub fn table(&self) -> &'static PinTable {
        self.table
    }

    /// Looks up a pin of the active variant by name.
    #[inline]
    pub fn pin(&self, name: &str) -> Result<&'static Pin, ResourceError> {
        self.table.pin(name)
    }

    /// Resolves an SPI or I2C bus for the given wiring (clock first).
    ///
    /// A `clock` of the wrong kind is replaced by the default clock for `kind`.
    pub fn resolve_bus(
        &self,
        pins: &[&'static Pin],
        kind: BusKind,
        clock: Option<BusClock>,
    ) -> Result<BusDescriptor, ResourceError> {
        if pins.len() != kind.pin_count() {
            return Err(ResourceError::PinCount {
                kind,
                expected: kind.pin_count(),
                got: pins.len(),
            });
        }
        for pin in pins {
            self.ensure_member(pin)?;
            ensure_caps(pin, PinCaps::DIGITAL)?;
        }

        let clock_pin = pins[0];
        let bus_number =
            self.table
                .bus_number(kind, clock_pin)
                .ok_or(ResourceError::UnsupportedBus {
                    kind,
                    clock: clock_pin.name(),
                    variant: self.table.variant(),
                })?;

        let clock = clock
            .filter(|c| c.kind() == kind)
            .unwrap_or_else(|| BusClock::default_for(kind));

        Ok(BusDescriptor::new(kind, pins.to_vec(), bus_number, clock))
    }

    /// SPI bus on the variant's default wiring.
    pub fn default_spi_bus(&self, speed_khz: u32) -> Result<BusDescriptor, ResourceError> {
        let pins = self.table.default_spi_pins()?;
        let clock = BusClock::Spi(SpiClockConfig {
            speed_khz,
            ..SpiClockConfig::default()
        });
        self.resolve_bus(&pins, BusKind::Spi, Some(clock))
    }

    /// I2C bus on the variant's default wiring.
    pub fn default_i2c_bus(&self, frequency_hz: u32) -> Result<BusDescriptor, ResourceError> {
        let pins = self.table.default_i2c_pins()?;
        let clock = BusClock::I2c(I2cClockConfig { frequency_hz });
        self.resolve_bus(&pins, BusKind::I2c, Some(clock))
    }

    /// Validates `request` against `pin` and returns the port assignment.
    pub fn create_port(
        &self,
        pin: &'static Pin,
        request: PortRequest,
    ) -> Result<PortHandle, ResourceError> {
        self.ensure_member(pin)?;
        ensure_caps(pin, request.required_caps())?;

        let mut onboard_indicator = false;
        if let PortRequest::Pwm {
            frequency_hz,
            duty_cycle,
            ..
        } = request
        {
            let in_range = pin.pwm_range().is_some_and(|r| r.contains(frequency_hz));
            if !in_range {
                return Err(ResourceError::OutOfRange {
                    pin: pin.name(),
                    parameter: "frequency_hz",
                    value: f64::from(frequency_hz),
                });
            }
            // NaN fails the range check too.
            if !(0.0..=1.0).contains(&duty_cycle) {
                return Err(ResourceError::OutOfRange {
                    pin: pin.name(),
                    parameter: "duty_cycle",
                    value: f64::from(duty_cycle),
                });
            }
            onboard_indicator = pin.is_onboard_indicator();
        }

        Ok(PortHandle::new(pin, request, onboard_indicator))
    }

    /// Resolves a friendly serial port name (e.g. `Com4`) to its OS device.
    pub fn resolve_serial(
        &self,
        name: &str,
        config: SerialConfig,
    ) -> Result<SerialPortDescriptor, ResourceError> {
        let device = self
            .table
            .serial_device(name)
            .ok_or_else(|| ResourceError::UnknownPort {
                port: name.to_string(),
                variant: self.table.variant(),
            })?;
        Ok(SerialPortDescriptor {
            name: name.to_string(),
            device,
            config,
        })
    }

    fn ensure_member(&self, pin: &Pin) -> Result<(), ResourceError> {
        if self.table.contains(pin) {
            Ok(())
        } else {
            Err(ResourceError::UnknownPin {
                pin: pin.to_string(),
                variant: self.table.variant(),
            })
        }
    }
}

fn ensure_caps(pin: &Pin, required: PinCaps) -> Result<(), ResourceError> {
    if pin.supports(required) {
        Ok(())
    } else {
        Err(ResourceError::CapabilityMismatch {
            pin: pin.name(),
            required,
            available: pin.caps(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::port::{InputConfig, InterruptMode};

    fn pins(arb: &Arbiter, names: &[&str]) -> Vec<&'static Pin> {
        names.iter().map(|n| arb.pin(n).unwrap()).collect()
    }

    #[test]
    fn known_clock_pins_resolve_to_documented_bus_numbers() {
        let cases: &[(DeviceVariant, BusKind, &[&str], u8)] = &[
            (DeviceVariant::F7FeatherV1, BusKind::Spi, &["ESP_CLK", "ESP_MOSI", "ESP_MISO"], 2),
            (DeviceVariant::F7FeatherV1, BusKind::Spi, &["SCK", "COPI", "CIPO"], 3),
            (DeviceVariant::F7FeatherV1, BusKind::I2c, &["D08", "D07"], 1),
            (DeviceVariant::F7FeatherV2, BusKind::Spi, &["ESP_CLK", "ESP_MOSI", "ESP_MISO"], 2),
            (DeviceVariant::F7FeatherV2, BusKind::Spi, &["SCK", "COPI", "CIPO"], 3),
            (DeviceVariant::F7FeatherV2, BusKind::I2c, &["D08", "D07"], 1),
            (DeviceVariant::F7CoreComputeV2, BusKind::Spi, &["ESP_CLK", "ESP_MOSI", "ESP_MISO"], 2),
            (DeviceVariant::F7CoreComputeV2, BusKind::Spi, &["SPI3_SCK", "SPI3_COPI", "SPI3_CIPO"], 3),
            (DeviceVariant::F7CoreComputeV2, BusKind::Spi, &["SPI5_SCK", "SPI5_COPI", "SPI5_CIPO"], 5),
            (DeviceVariant::F7CoreComputeV2, BusKind::I2c, &["I2C1_SCL", "I2C1_SDA"], 1),
            (DeviceVariant::F7CoreComputeV2, BusKind::I2c, &["I2C3_SCL", "I2C3_SDA"], 3),
        ];

        for (variant, kind, names, expected) in cases {
            let arb = Arbiter::for_variant(*variant);
            let bus = arb
                .resolve_bus(&pins(&arb, names), *kind, None)
                .unwrap_or_else(|e| panic!("{variant} {names:?}: {e}"));
            assert_eq!(bus.bus_number(), *expected, "{variant} {names:?}");
            assert_eq!(bus.kind(), *kind);
            assert_eq!(bus.clock(), BusClock::default_for(*kind));
        }
    }

    #[test]
    fn same_wiring_always_yields_same_bus() {
        let arb = Arbiter::for_variant(DeviceVariant::F7FeatherV2);
        let wiring = pins(&arb, &["SCK", "COPI", "CIPO"]);
        let a = arb.resolve_bus(&wiring, BusKind::Spi, None).unwrap();
        let b = arb.default_spi_bus(375).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn clock_pin_outside_route_table_is_unsupported() {
        let arb = Arbiter::for_variant(DeviceVariant::F7FeatherV2);

        for clock in ["D14", "D00", "A00", "COPI", "OnboardLedRed"] {
            let wiring = pins(&arb, &[clock, "COPI", "CIPO"]);
            let err = arb.resolve_bus(&wiring, BusKind::Spi, None).unwrap_err();
            assert!(
                matches!(err, ResourceError::UnsupportedBus { clock: c, .. } if c == clock),
                "{clock}: {err}"
            );
        }

        // An SPI clock is not an I2C clock.
        let wiring = pins(&arb, &["SCK", "D07"]);
        let err = arb.resolve_bus(&wiring, BusKind::I2c, None).unwrap_err();
        assert!(matches!(err, ResourceError::UnsupportedBus { kind: BusKind::I2c, .. }));
    }

    #[test]
    fn foreign_pin_is_unknown() {
        let v1 = Arbiter::for_variant(DeviceVariant::F7FeatherV1);
        let v2 = Arbiter::for_variant(DeviceVariant::F7FeatherV2);
        let mut wiring = pins(&v2, &["SCK", "COPI", "CIPO"]);
        wiring[1] = v1.pin("COPI").unwrap();

        let err = v2.resolve_bus(&wiring, BusKind::Spi, None).unwrap_err();
        assert!(matches!(err, ResourceError::UnknownPin { .. }));

        let err = v2
            .create_port(v1.pin("D02").unwrap(), PortRequest::pwm())
            .unwrap_err();
        assert!(matches!(err, ResourceError::UnknownPin { .. }));
    }

    #[test]
    fn wrong_pin_count_is_rejected() {
        let arb = Arbiter::for_variant(DeviceVariant::F7FeatherV2);
        let err = arb
            .resolve_bus(&pins(&arb, &["SCK", "COPI"]), BusKind::Spi, None)
            .unwrap_err();
        assert!(matches!(err, ResourceError::PinCount { expected: 3, got: 2, .. }));
    }

    #[test]
    fn mismatched_clock_kind_falls_back_to_default() {
        let arb = Arbiter::for_variant(DeviceVariant::F7FeatherV2);
        let wiring = pins(&arb, &["D08", "D07"]);
        let bus = arb
            .resolve_bus(&wiring, BusKind::I2c, Some(BusClock::Spi(SpiClockConfig::default())))
            .unwrap();
        assert_eq!(bus.clock(), BusClock::I2c(I2cClockConfig::default()));

        let custom = BusClock::I2c(I2cClockConfig { frequency_hz: 400_000 });
        assert_eq!(bus.with_clock(custom).clock(), custom);
    }

    #[test]
    fn every_pin_honors_its_capability_flags() {
        let requests = [
            PortRequest::digital_output(false),
            PortRequest::digital_input(),
            PortRequest::DigitalInput(InputConfig {
                interrupt: InterruptMode::EdgeRising,
                ..InputConfig::default()
            }),
            PortRequest::analog_input(),
            PortRequest::pwm(),
        ];

        for variant in [
            DeviceVariant::F7FeatherV1,
            DeviceVariant::F7FeatherV2,
            DeviceVariant::F7CoreComputeV2,
        ] {
            let arb = Arbiter::for_variant(variant);
            for pin in arb.table().pins() {
                for request in requests {
                    let res = arb.create_port(pin, request);
                    if pin.supports(request.required_caps()) {
                        let handle = res.unwrap_or_else(|e| panic!("{pin}: {e}"));
                        assert_eq!(handle.pin(), pin);
                        assert_eq!(handle.kind(), request.kind());
                    } else {
                        assert!(
                            matches!(res, Err(ResourceError::CapabilityMismatch { .. })),
                            "{pin} {request:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn pwm_on_plain_gpio_is_a_capability_mismatch() {
        let arb = Arbiter::for_variant(DeviceVariant::F7FeatherV2);
        let err = arb.create_port(arb.pin("D14").unwrap(), PortRequest::pwm()).unwrap_err();
        assert!(matches!(
            err,
            ResourceError::CapabilityMismatch { pin: "D14", required, .. } if required == PinCaps::PWM
        ));
    }

    #[test]
    fn interrupts_need_interrupt_capable_pins() {
        let arb = Arbiter::for_variant(DeviceVariant::F7FeatherV2);
        let request = PortRequest::DigitalInput(InputConfig {
            interrupt: InterruptMode::EdgeFalling,
            ..InputConfig::default()
        });
        assert!(arb.create_port(arb.pin("D03").unwrap(), request).is_ok());
        assert!(matches!(
            arb.create_port(arb.pin("ESP_CLK").unwrap(), request),
            Err(ResourceError::CapabilityMismatch { .. })
        ));
    }

    #[test]
    fn onboard_indicator_pwm_is_tagged() {
        let arb = Arbiter::for_variant(DeviceVariant::F7FeatherV2);
        for led in arb.table().onboard_indicators() {
            let handle = arb.create_port(led, PortRequest::pwm()).unwrap();
            assert!(handle.is_onboard_indicator(), "{led}");
        }

        let plain = arb.create_port(arb.pin("D02").unwrap(), PortRequest::pwm()).unwrap();
        assert!(!plain.is_onboard_indicator());

        let led_out = arb
            .create_port(arb.pin("OnboardLedRed").unwrap(), PortRequest::digital_output(true))
            .unwrap();
        assert!(!led_out.is_onboard_indicator());
    }

    #[test]
    fn pwm_frequency_outside_range_is_rejected() {
        let arb = Arbiter::for_variant(DeviceVariant::F7FeatherV2);
        let request = PortRequest::Pwm {
            frequency_hz: 250_000.0,
            duty_cycle: 0.5,
            inverted: false,
        };
        let err = arb.create_port(arb.pin("D02").unwrap(), request).unwrap_err();
        assert!(matches!(err, ResourceError::OutOfRange { parameter: "frequency_hz", .. }));
    }

    #[test]
    fn pwm_duty_cycle_must_be_a_fraction() {
        let arb = Arbiter::for_variant(DeviceVariant::F7FeatherV2);
        let d02 = arb.pin("D02").unwrap();
        let with_duty = |duty_cycle| PortRequest::Pwm {
            frequency_hz: 100.0,
            duty_cycle,
            inverted: false,
        };

        for bad in [7.5, -0.1, f32::NAN, f32::INFINITY] {
            let err = arb.create_port(d02, with_duty(bad)).unwrap_err();
            assert!(
                matches!(err, ResourceError::OutOfRange { parameter: "duty_cycle", .. }),
                "{bad}: {err}"
            );
        }
        for ok in [0.0, 0.5, 1.0] {
            assert!(arb.create_port(d02, with_duty(ok)).is_ok(), "{ok}");
        }
    }

    #[test]
    fn serial_ports_resolve_by_friendly_name() {
        let arb = Arbiter::for_variant(DeviceVariant::F7FeatherV2);
        let port = arb.resolve_serial("Com4", SerialConfig::default()).unwrap();
        assert_eq!(port.device, "ttyS1");

        let err = arb.resolve_serial("Com5", SerialConfig::default()).unwrap_err();
        assert!(matches!(err, ResourceError::UnknownPort { .. }));
    }

    #[test]
    fn arbiter_is_shareable_across_threads() {
        let arb = Arbiter::for_variant(DeviceVariant::F7CoreComputeV2);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(move || arb.default_spi_bus(1_000).map(|b| b.bus_number()))
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap().unwrap(), 5);
        }
    }
}
