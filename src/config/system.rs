//! System configuration - root configuration structure.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use super::encoder::EncoderConfig;
use super::stepper::StepperConfig;
use super::switch::SwitchConfig;
use super::{MAX_ENCODERS, MAX_STEPPERS, MAX_SWITCHES};

/// Global runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Minimum time between telemetry snapshots, in milliseconds.
    #[serde(default = "default_telemetry_interval_ms")]
    pub telemetry_interval_ms: u32,
}

fn default_telemetry_interval_ms() -> u32 {
    500
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            telemetry_interval_ms: default_telemetry_interval_ms(),
        }
    }
}

/// Root configuration structure from TOML.
///
/// Entity IDs are list positions: the first `[[steppers]]` entry is stepper 0,
/// and switch/encoder `stepper` fields refer to those positions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Runtime settings.
    #[serde(default)]
    pub settings: Settings,

    /// Stepper channels.
    #[serde(default)]
    pub steppers: Vec<StepperConfig, MAX_STEPPERS>,

    /// Position switches.
    #[serde(default)]
    pub switches: Vec<SwitchConfig, MAX_SWITCHES>,

    /// Rotary encoders.
    #[serde(default)]
    pub encoders: Vec<EncoderConfig, MAX_ENCODERS>,
}

impl SystemConfig {
    /// Get a stepper configuration by ID.
    pub fn stepper(&self, id: u8) -> Option<&StepperConfig> {
        self.steppers.get(id as usize)
    }

    /// Get a switch configuration by ID.
    pub fn switch(&self, id: u8) -> Option<&SwitchConfig> {
        self.switches.get(id as usize)
    }

    /// Get an encoder configuration by ID.
    pub fn encoder(&self, id: u8) -> Option<&EncoderConfig> {
        self.encoders.get(id as usize)
    }

    /// Find a stepper ID by name.
    pub fn stepper_id(&self, name: &str) -> Option<u8> {
        self.steppers
            .iter()
            .position(|s| s.name.as_str() == name)
            .map(|i| i as u8)
    }

    /// List all stepper names.
    pub fn stepper_names(&self) -> impl Iterator<Item = &str> {
        self.steppers.iter().map(|s| s.name.as_str())
    }
}
