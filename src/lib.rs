//! # stepper-switchboard
//!
//! Interrupt-driven switch, encoder and emergency-stop coordination for
//! multi-channel stepper motion control.
//!
//! ## Features
//!
//! - **Lock-free interrupt boundary**: handlers only sample pins and update atomics
//! - **Switch status register**: packed, polarity-aware, one bit per switch
//! - **Rotary encoders**: table-driven quadrature decoding with built-in debounce
//! - **Emergency stop latch**: tripped from interrupts, cleared only on command
//! - **Macro actions**: ordered side effects run when a switch becomes active
//! - **no_std compatible**: fixed-capacity arenas, no heap
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stepper_switchboard::{Controller, IrqContext, NoTelemetry};
//!
//! static IRQ: IrqContext = IrqContext::new();
//!
//! // Load configuration from TOML
//! let config = stepper_switchboard::load_config_or_default("switchboard.toml");
//!
//! let mut controller = Controller::new(&IRQ, board);
//! controller.apply_config(&config, |_id, stepper| MyEngine::new(stepper))?;
//!
//! // GPIO interrupt handler
//! fn on_gpio(source: IrqSource) {
//!     IRQ.on_interrupt(source, &mut pins());
//! }
//!
//! loop {
//!     controller.tick(clock.now(), &mut NoTelemetry);
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): TOML file loading and `tracing` logging
//! - `alloc`: Enables heap allocation for no_std with allocator
//! - `defmt`: Enables defmt logging for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Must come first so the logging macros are visible to every module
mod fmt;

// Core modules
pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod hal;
pub mod irq;
pub mod units;

// Re-exports for ergonomic API
pub use config::{
    validate_config, ActionType, EncoderConfig, MacroAction, Polarity, StepperConfig,
    SwitchCategory, SwitchConfig, SwitchType, SystemConfig,
};
pub use control::{Controller, MotionSnapshot, NoTelemetry, TelemetrySink, TickReport};
pub use engine::{LimitSide, TrajectoryEngine};
pub use error::{Error, Result};
pub use hal::{Board, InputSampler, IrqSource, PinId, NO_PIN};
pub use irq::{IrqContext, QuadratureDecoder, Rotation};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, load_config_or_default, parse_config};

// Unit types
pub use units::{Millimeters, MoveTarget, Positioning, Revolutions, Steps};
