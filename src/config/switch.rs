//! Position switch configuration.

use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use super::action::MacroAction;
use super::MAX_MACRO_ACTIONS;
use crate::engine::LimitSide;
use crate::error::ConfigError;
use crate::hal::{IrqSource, PinId};
use crate::units::Steps;

/// Electrical polarity of a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Pin reads high when the switch is active.
    #[default]
    ActiveHigh,
    /// Pin reads low when the switch is active.
    ActiveLow,
}

impl Polarity {
    /// Logical state for a raw pin level.
    #[inline]
    pub const fn is_active(self, pin_high: bool) -> bool {
        match self {
            Polarity::ActiveHigh => pin_high,
            Polarity::ActiveLow => !pin_high,
        }
    }
}

/// What a switch is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum SwitchCategory {
    /// Homing switch at the begin of travel.
    HomingBegin,
    /// Homing switch at the end of travel.
    HomingEnd,
    /// General position switch.
    #[default]
    GeneralPosition,
    /// Emergency stop switch.
    EmergencyStop,
}

impl SwitchCategory {
    /// Interrupt entry point serving this category.
    pub const fn irq_source(self) -> IrqSource {
        match self {
            SwitchCategory::EmergencyStop => IrqSource::Emergency,
            SwitchCategory::HomingBegin | SwitchCategory::HomingEnd => IrqSource::Limit,
            SwitchCategory::GeneralPosition => IrqSource::General,
        }
    }

    /// Travel end guarded by a homing switch.
    pub const fn limit_side(self) -> Option<LimitSide> {
        match self {
            SwitchCategory::HomingBegin => Some(LimitSide::Begin),
            SwitchCategory::HomingEnd => Some(LimitSide::End),
            _ => None,
        }
    }
}

/// Polarity and category of a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchType {
    /// Electrical polarity.
    pub polarity: Polarity,
    /// Usage category.
    pub category: SwitchCategory,
}

impl SwitchType {
    const ACTIVE_HIGH: u8 = 1 << 0;
    const ACTIVE_LOW: u8 = 1 << 1;
    const HOMING_BEGIN: u8 = 1 << 2;
    const HOMING_END: u8 = 1 << 3;
    const GENERAL_POSITION: u8 = 1 << 4;
    const EMERGENCY_STOP: u8 = 1 << 5;

    /// Create a new switch type.
    pub const fn new(polarity: Polarity, category: SwitchCategory) -> Self {
        Self { polarity, category }
    }

    /// Pack into the wire byte used by the configuration API.
    pub const fn to_wire(self) -> u8 {
        let polarity = match self.polarity {
            Polarity::ActiveHigh => Self::ACTIVE_HIGH,
            Polarity::ActiveLow => Self::ACTIVE_LOW,
        };
        let category = match self.category {
            SwitchCategory::HomingBegin => Self::HOMING_BEGIN,
            SwitchCategory::HomingEnd => Self::HOMING_END,
            SwitchCategory::GeneralPosition => Self::GENERAL_POSITION,
            SwitchCategory::EmergencyStop => Self::EMERGENCY_STOP,
        };
        polarity | category
    }

    /// Unpack a wire byte.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidSwitchType` unless exactly one polarity
    /// bit and exactly one category bit are set.
    pub fn from_wire(bits: u8) -> Result<Self, ConfigError> {
        let polarity = match bits & (Self::ACTIVE_HIGH | Self::ACTIVE_LOW) {
            Self::ACTIVE_HIGH => Polarity::ActiveHigh,
            Self::ACTIVE_LOW => Polarity::ActiveLow,
            _ => return Err(ConfigError::InvalidSwitchType(bits)),
        };
        let category = match bits & !(Self::ACTIVE_HIGH | Self::ACTIVE_LOW) {
            Self::HOMING_BEGIN => SwitchCategory::HomingBegin,
            Self::HOMING_END => SwitchCategory::HomingEnd,
            Self::GENERAL_POSITION => SwitchCategory::GeneralPosition,
            Self::EMERGENCY_STOP => SwitchCategory::EmergencyStop,
            _ => return Err(ConfigError::InvalidSwitchType(bits)),
        };
        Ok(Self { polarity, category })
    }
}

/// Configuration of one position switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchConfig {
    /// Human-readable name (max 32 chars).
    pub name: String<32>,

    /// Input pin.
    pub pin: PinId,

    /// Electrical polarity.
    #[serde(default)]
    pub polarity: Polarity,

    /// Usage category.
    #[serde(default)]
    pub category: SwitchCategory,

    /// Linked stepper, if any. Pure emergency switches may have none.
    #[serde(default)]
    pub stepper: Option<u8>,

    /// Position assigned to the linked stepper when a homing switch triggers.
    #[serde(default)]
    pub home_position: Option<Steps>,

    /// Actions run in order when the switch becomes active.
    #[serde(default)]
    pub actions: Vec<MacroAction, MAX_MACRO_ACTIONS>,
}

impl SwitchConfig {
    /// Create a switch with no macro actions.
    pub fn new(name: &str, pin: PinId, switch_type: SwitchType, stepper: Option<u8>) -> Self {
        Self {
            name: String::try_from(name).unwrap_or_default(),
            pin,
            polarity: switch_type.polarity,
            category: switch_type.category,
            stepper,
            home_position: None,
            actions: Vec::new(),
        }
    }

    /// Set the homing reference position.
    pub fn with_home_position(mut self, position: Steps) -> Self {
        self.home_position = Some(position);
        self
    }

    /// Append a macro action.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::TooManyActions` if the action list is full.
    pub fn push_action(&mut self, action: MacroAction) -> Result<(), ConfigError> {
        self.actions
            .push(action)
            .map_err(|_| ConfigError::TooManyActions)
    }

    /// Polarity and category.
    #[inline]
    pub fn switch_type(&self) -> SwitchType {
        SwitchType::new(self.polarity, self.category)
    }
}
