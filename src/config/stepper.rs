//! Stepper channel configuration.

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::hal::PinId;
use crate::units::{StepScale, StepsPerSec, StepsPerSecSquared};

/// Configuration of one stepper channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepperConfig {
    /// Human-readable name (max 32 chars).
    pub name: String<32>,

    /// STEP output pin.
    pub step_pin: PinId,

    /// DIR output pin.
    pub dir_pin: PinId,

    /// Optional brake output pin.
    #[serde(default)]
    pub brake_pin: Option<PinId>,

    /// Steps per millimeter of linear travel.
    #[serde(default = "default_steps_per_mm")]
    pub steps_per_mm: f32,

    /// Steps per output shaft revolution (after microstepping).
    #[serde(default = "default_steps_per_revolution")]
    pub steps_per_revolution: f32,

    /// Cruise speed.
    #[serde(default = "default_speed", rename = "max_speed_steps_per_sec")]
    pub max_speed: StepsPerSec,

    /// Acceleration rate.
    #[serde(default = "default_accel", rename = "acceleration_steps_per_sec2")]
    pub acceleration: StepsPerSecSquared,

    /// Deceleration rate.
    #[serde(default = "default_accel", rename = "deceleration_steps_per_sec2")]
    pub deceleration: StepsPerSecSquared,
}

fn default_steps_per_mm() -> f32 {
    100.0
}

fn default_steps_per_revolution() -> f32 {
    200.0
}

fn default_speed() -> StepsPerSec {
    StepsPerSec(1000.0)
}

fn default_accel() -> StepsPerSecSquared {
    StepsPerSecSquared(1000.0)
}

impl StepperConfig {
    /// Create a configuration with default motion parameters.
    pub fn new(name: &str, step_pin: PinId, dir_pin: PinId) -> Self {
        Self {
            name: String::try_from(name).unwrap_or_default(),
            step_pin,
            dir_pin,
            brake_pin: None,
            steps_per_mm: default_steps_per_mm(),
            steps_per_revolution: default_steps_per_revolution(),
            max_speed: default_speed(),
            acceleration: default_accel(),
            deceleration: default_accel(),
        }
    }

    /// Unit conversion factors for this channel.
    pub fn scale(&self) -> StepScale {
        StepScale::new(self.steps_per_mm, self.steps_per_revolution)
    }

    /// Whether this channel drives `pin`.
    pub fn uses_pin(&self, pin: PinId) -> bool {
        self.step_pin == pin || self.dir_pin == pin || self.brake_pin == Some(pin)
    }
}
