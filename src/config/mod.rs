//! Configuration module for stepper-switchboard.
//!
//! Provides the records describing steppers, position switches, rotary
//! encoders and macro actions, loaded from TOML files (with `std` feature)
//! or built programmatically by the outer layers.

mod action;
mod encoder;
#[cfg(feature = "std")]
mod loader;
mod stepper;
mod switch;
mod system;
mod validation;

pub use action::{ActionType, MacroAction};
pub use encoder::EncoderConfig;
pub use stepper::StepperConfig;
pub use switch::{Polarity, SwitchCategory, SwitchConfig, SwitchType};
pub use system::{Settings, SystemConfig};
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, load_config_or_default, parse_config};

pub(crate) use validation::{validate_encoder, validate_stepper, validate_switch};

/// Maximum number of stepper channels.
pub const MAX_STEPPERS: usize = 10;

/// Maximum number of position switches.
pub const MAX_SWITCHES: usize = 40;

/// Maximum number of rotary encoders.
pub const MAX_ENCODERS: usize = 5;

/// Maximum number of macro actions attached to one switch.
pub const MAX_MACRO_ACTIONS: usize = 8;

/// Number of 8-bit words in the switch status register.
pub const STATUS_REGISTER_WORDS: usize = (MAX_SWITCHES + 7) / 8;
