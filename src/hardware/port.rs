//! Port requests and the handles the [`Arbiter`](super::Arbiter) resolves them to.

use std::fmt;

use super::pins::{Pin, PinCaps};

pub const DEFAULT_ANALOG_REFERENCE_VOLTS: f32 = 3.3;
pub const DEFAULT_PWM_FREQUENCY_HZ: f32 = 100.0;
pub const DEFAULT_PWM_DUTY_CYCLE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterruptMode {
    #[default]
    None,
    EdgeRising,
    EdgeFalling,
    EdgeBoth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResistorMode {
    #[default]
    Disabled,
    InternalPullUp,
    InternalPullDown,
    /// Pull resistor fitted on the board; needs nothing from the pin.
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputType {
    #[default]
    PushPull,
    OpenDrain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PortDirection {
    #[default]
    Input,
    Output,
}

/// Input-side parameters shared by digital input and bidirectional ports.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputConfig {
    pub interrupt: InterruptMode,
    pub resistor: ResistorMode,
    /// Debounce window in milliseconds (`0` = off).
    pub debounce_ms: f64,
    /// Glitch filter window in milliseconds (`0` = off).
    pub glitch_ms: f64,
}

/// What a caller wants a pin to become.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PortRequest {
    DigitalOutput {
        initial_state: bool,
        output: OutputType,
    },
    DigitalInput(InputConfig),
    BiDirectional {
        initial_state: bool,
        direction: PortDirection,
        output: OutputType,
        input: InputConfig,
    },
    AnalogInput {
        reference_volts: f32,
    },
    Pwm {
        frequency_hz: f32,
        duty_cycle: f32,
        inverted: bool,
    },
}

impl PortRequest {
    pub fn digital_output(initial_state: bool) -> Self {
        PortRequest::DigitalOutput {
            initial_state,
            output: OutputType::PushPull,
        }
    }

    pub fn digital_input() -> Self {
        PortRequest::DigitalInput(InputConfig::default())
    }

    pub fn analog_input() -> Self {
        PortRequest::AnalogInput {
            reference_volts: DEFAULT_ANALOG_REFERENCE_VOLTS,
        }
    }

    pub fn pwm() -> Self {
        PortRequest::Pwm {
            frequency_hz: DEFAULT_PWM_FREQUENCY_HZ,
            duty_cycle: DEFAULT_PWM_DUTY_CYCLE,
            inverted: false,
        }
    }

    #[inline]
    pub fn kind(&self) -> PortKind {
        match self {
            PortRequest::DigitalOutput { .. } => PortKind::DigitalOutput,
            PortRequest::DigitalInput(_) => PortKind::DigitalInput,
            PortRequest::BiDirectional { .. } => PortKind::BiDirectional,
            PortRequest::AnalogInput { .. } => PortKind::AnalogInput,
            PortRequest::Pwm { .. } => PortKind::Pwm,
        }
    }

    /// Capability flags a pin must carry to satisfy this request.
    pub fn required_caps(&self) -> PinCaps {
        match self {
            PortRequest::DigitalOutput { .. } => PinCaps::DIGITAL_OUT,
            PortRequest::DigitalInput(input) => PinCaps::DIGITAL_IN | input_caps(input),
            PortRequest::BiDirectional { input, .. } => PinCaps::DIGITAL | input_caps(input),
            PortRequest::AnalogInput { .. } => PinCaps::ANALOG_IN,
            PortRequest::Pwm { .. } => PinCaps::PWM,
        }
    }
}

fn input_caps(input: &InputConfig) -> PinCaps {
    let mut caps = PinCaps::empty();
    if input.interrupt != InterruptMode::None {
        caps |= PinCaps::INTERRUPT;
    }
    match input.resistor {
        ResistorMode::InternalPullUp => caps |= PinCaps::PULL_UP,
        ResistorMode::InternalPullDown => caps |= PinCaps::PULL_DOWN,
        ResistorMode::Disabled | ResistorMode::External => {}
    }
    caps
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortKind {
    DigitalOutput,
    DigitalInput,
    BiDirectional,
    AnalogInput,
    Pwm,
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PortKind::DigitalOutput => "digital_output",
            PortKind::DigitalInput => "digital_input",
            PortKind::BiDirectional => "bidirectional",
            PortKind::AnalogInput => "analog_input",
            PortKind::Pwm => "pwm",
        };
        f.write_str(s)
    }
}

/// A validated port assignment, ready to hand to a driver.
#[derive(Debug, Clone, PartialEq)]
pub struct PortHandle {
    pin: &'static Pin,
    request: PortRequest,
    onboard_indicator: bool,
}

impl PortHandle {
    pub(crate) fn new(pin: &'static Pin, request: PortRequest, onboard_indicator: bool) -> Self {
        Self {
            pin,
            request,
            onboard_indicator,
        }
    }

    #[inline]
    pub fn pin(&self) -> &'static Pin {
        self.pin
    }

    #[inline]
    pub fn request(&self) -> &PortRequest {
        &self.request
    }

    #[inline]
    pub fn kind(&self) -> PortKind {
        self.request.kind()
    }

    /// PWM port driving an onboard indicator LED.
    ///
    /// Drivers use this to apply the board's brightness/inversion quirks.
    #[inline]
    pub fn is_onboard_indicator(&self) -> bool {
        self.onboard_indicator
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
    Mark,
    Space,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopBits {
    #[default]
    One,
    OnePointFive,
    Two,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub read_buffer_size: usize,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: StopBits::One,
            read_buffer_size: 1024,
        }
    }
}

/// A resolved serial port: friendly name, OS device and line settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialPortDescriptor {
    pub name: String,
    pub device: &'static str,
    pub config: SerialConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_requirements_follow_config() {
        let plain = PortRequest::digital_input();
        assert_eq!(plain.required_caps(), PinCaps::DIGITAL_IN);

        let irq = PortRequest::DigitalInput(InputConfig {
            interrupt: InterruptMode::EdgeBoth,
            resistor: ResistorMode::InternalPullUp,
            ..InputConfig::default()
        });
        assert_eq!(
            irq.required_caps(),
            PinCaps::DIGITAL_IN | PinCaps::INTERRUPT | PinCaps::PULL_UP
        );

        let external = PortRequest::DigitalInput(InputConfig {
            resistor: ResistorMode::External,
            ..InputConfig::default()
        });
        assert_eq!(external.required_caps(), PinCaps::DIGITAL_IN);
    }

    #[test]
    fn defaults_match_board_conventions() {
        assert_eq!(
            PortRequest::pwm(),
            PortRequest::Pwm {
                frequency_hz: 100.0,
                duty_cycle: 0.5,
                inverted: false
            }
        );
        assert_eq!(SerialConfig::default().baud_rate, 9600);
    }
}
