//! Error types for stepper-switchboard.
//!
//! Configuration and command errors are returned synchronously to the caller.
//! Interrupt paths never produce errors; an emergency stop is a state
//! transition, not an error.

use core::fmt;

use crate::hal::PinId;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all stepper-switchboard operations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration parsing, validation or registry error
    Config(ConfigError),
    /// Motion command rejected
    Motion(MotionError),
    /// Hardware resource unavailable
    Hardware(HardwareError),
}

/// Kind of configurable entity, used in capacity errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EntityKind {
    /// Stepper motion channel
    Stepper,
    /// Position switch
    Switch,
    /// Rotary encoder
    Encoder,
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Pin is already used by another stepper, switch or encoder
    PinInUse(PinId),
    /// Pin identifier is reserved or out of range
    InvalidPin(PinId),
    /// No stepper is configured with this ID
    UnknownStepper(u8),
    /// No switch is configured with this ID
    UnknownSwitch(u8),
    /// No encoder is configured with this ID
    UnknownEncoder(u8),
    /// ID lies outside the entity's fixed capacity
    InvalidId(u8),
    /// Every slot for this entity kind is occupied
    CapacityExceeded(EntityKind),
    /// Switch carries more macro actions than fit
    TooManyActions,
    /// Encoder step multiplier must be non-zero
    InvalidStepMultiplier(i32),
    /// Packed switch type byte does not name exactly one polarity and one category
    InvalidSwitchType(u8),
    /// Switch category requires a linked stepper
    MissingStepperLink(u8),
    /// Speed, acceleration or scale factor must be > 0
    InvalidMotionParameter(f32),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Motion command errors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionError {
    /// Emergency stop latch is set; revoke it before commanding motion
    EmergencyStopActive,
    /// No stepper is configured with this ID
    UnknownStepper(u8),
}

/// Hardware resource errors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HardwareError {
    /// Pin cannot generate interrupts
    InterruptUnavailable(PinId),
    /// GPIO pin operation failed
    PinError(PinId),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Motion(e) => write!(f, "Motion error: {}", e),
            Error::Hardware(e) => write!(f, "Hardware error: {}", e),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Stepper => write!(f, "stepper"),
            EntityKind::Switch => write!(f, "position switch"),
            EntityKind::Encoder => write!(f, "rotary encoder"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::PinInUse(pin) => write!(f, "Pin {} is already in use", pin),
            ConfigError::InvalidPin(pin) => write!(f, "Invalid pin: {}", pin),
            ConfigError::UnknownStepper(id) => write!(f, "Stepper {} not configured", id),
            ConfigError::UnknownSwitch(id) => write!(f, "Position switch {} not configured", id),
            ConfigError::UnknownEncoder(id) => write!(f, "Rotary encoder {} not configured", id),
            ConfigError::InvalidId(id) => write!(f, "ID {} is out of range", id),
            ConfigError::CapacityExceeded(kind) => write!(f, "No free {} slot", kind),
            ConfigError::TooManyActions => {
                write!(f, "Too many macro actions (max {})", crate::config::MAX_MACRO_ACTIONS)
            }
            ConfigError::InvalidStepMultiplier(v) => {
                write!(f, "Invalid step multiplier: {}. Must be non-zero", v)
            }
            ConfigError::InvalidSwitchType(bits) => write!(f, "Invalid switch type: {:#04x}", bits),
            ConfigError::MissingStepperLink(id) => {
                write!(f, "Position switch {} requires a linked stepper", id)
            }
            ConfigError::InvalidMotionParameter(v) => {
                write!(f, "Invalid motion parameter: {}. Must be > 0", v)
            }
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionError::EmergencyStopActive => write!(f, "Emergency stop is active"),
            MotionError::UnknownStepper(id) => write!(f, "Stepper {} not configured", id),
        }
    }
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardwareError::InterruptUnavailable(pin) => {
                write!(f, "Pin {} cannot generate interrupts", pin)
            }
            HardwareError::PinError(pin) => write!(f, "GPIO operation on pin {} failed", pin),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<MotionError> for Error {
    fn from(e: MotionError) -> Self {
        Error::Motion(e)
    }
}

impl From<HardwareError> for Error {
    fn from(e: HardwareError) -> Self {
        Error::Hardware(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for MotionError {}

#[cfg(feature = "std")]
impl std::error::Error for HardwareError {}
