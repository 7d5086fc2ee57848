//! Rotary encoder configuration.

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::hal::PinId;

/// Configuration of one rotary encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Human-readable name (max 32 chars).
    pub name: String<32>,

    /// Phase A input pin.
    pub pin_a: PinId,

    /// Phase B input pin.
    pub pin_b: PinId,

    /// Steps moved per detent. Negative values reverse the direction.
    #[serde(default = "default_step_multiplier")]
    pub step_multiplier: i32,

    /// Stepper moved by this encoder.
    pub stepper: u8,
}

fn default_step_multiplier() -> i32 {
    1
}

impl EncoderConfig {
    /// Create an encoder configuration.
    pub fn new(name: &str, pin_a: PinId, pin_b: PinId, step_multiplier: i32, stepper: u8) -> Self {
        Self {
            name: String::try_from(name).unwrap_or_default(),
            pin_a,
            pin_b,
            step_multiplier,
            stepper,
        }
    }

    /// Whether this encoder reads `pin`.
    pub fn uses_pin(&self, pin: PinId) -> bool {
        self.pin_a == pin || self.pin_b == pin
    }
}
