//! Board abstraction.
//!
//! The core never touches GPIO registers directly. Interrupt handlers sample
//! pins through [`InputSampler`]; everything else the controller needs from
//! the board (interrupt registration, digital outputs, restart) goes through
//! [`Board`]. [`InputPins`] and [`OutputPins`] adapt embedded-hal 1.0 pins to
//! these traits.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::HardwareError;

/// GPIO pin number.
pub type PinId = u8;

/// Reserved "no pin" value.
pub const NO_PIN: PinId = u8::MAX;

/// Interrupt entry point a pin is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqSource {
    /// Emergency-stop switches.
    Emergency,
    /// Homing and limit switches.
    Limit,
    /// General position switches.
    General,
    /// Both phase pins of the rotary encoder with this ID.
    Encoder(u8),
}

/// Infallible pin sampling, callable from interrupt context.
///
/// Implementations must not block or allocate.
pub trait InputSampler {
    /// Current level of `pin`. Unknown pins read low.
    fn is_high(&mut self, pin: PinId) -> bool;
}

/// Board services used by the controller from task context.
pub trait Board {
    /// Register a both-edges interrupt for `pin` routed to `source`.
    fn attach_interrupt(
        &mut self,
        pin: PinId,
        source: IrqSource,
    ) -> core::result::Result<(), HardwareError>;

    /// Remove any interrupt registration for `pin`.
    fn detach_interrupt(&mut self, pin: PinId);

    /// Drive a digital output.
    fn set_output(&mut self, pin: PinId, high: bool) -> core::result::Result<(), HardwareError>;

    /// Restart the system. Called only while all motion is complete.
    fn restart(&mut self);
}

/// Fixed-capacity map from pin numbers to embedded-hal input pins.
pub struct InputPins<P: InputPin, const N: usize> {
    pins: heapless::Vec<(PinId, P), N>,
}

impl<P: InputPin, const N: usize> Default for InputPins<P, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: InputPin, const N: usize> InputPins<P, N> {
    /// Create an empty pin map.
    pub const fn new() -> Self {
        Self {
            pins: heapless::Vec::new(),
        }
    }

    /// Add a pin. Returns the pin back if the map is full.
    pub fn insert(&mut self, id: PinId, pin: P) -> core::result::Result<(), P> {
        self.pins.push((id, pin)).map_err(|(_, pin)| pin)
    }
}

impl<P: InputPin, const N: usize> InputSampler for InputPins<P, N> {
    fn is_high(&mut self, pin: PinId) -> bool {
        self.pins
            .iter_mut()
            .find(|(id, _)| *id == pin)
            .map(|(_, p)| p.is_high().unwrap_or(false))
            .unwrap_or(false)
    }
}

/// Fixed-capacity map from pin numbers to embedded-hal output pins.
pub struct OutputPins<P: OutputPin, const N: usize> {
    pins: heapless::Vec<(PinId, P), N>,
}

impl<P: OutputPin, const N: usize> Default for OutputPins<P, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: OutputPin, const N: usize> OutputPins<P, N> {
    /// Create an empty pin map.
    pub const fn new() -> Self {
        Self {
            pins: heapless::Vec::new(),
        }
    }

    /// Add a pin. Returns the pin back if the map is full.
    pub fn insert(&mut self, id: PinId, pin: P) -> core::result::Result<(), P> {
        self.pins.push((id, pin)).map_err(|(_, pin)| pin)
    }

    /// Drive `pin` high or low.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::PinError`] if the pin is unknown or the write fails.
    pub fn set(&mut self, pin: PinId, high: bool) -> core::result::Result<(), HardwareError> {
        let (_, p) = self
            .pins
            .iter_mut()
            .find(|(id, _)| *id == pin)
            .ok_or(HardwareError::PinError(pin))?;

        if high {
            p.set_high().map_err(|_| HardwareError::PinError(pin))
        } else {
            p.set_low().map_err(|_| HardwareError::PinError(pin))
        }
    }
}
