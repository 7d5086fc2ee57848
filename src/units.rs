//! Unit types for stepper positions and rates.
//!
//! Provides type-safe representations of positions (steps, millimeters,
//! revolutions) and step rates so a target in one unit can't be handed to a
//! trajectory engine as another.

use libm::roundf;
use serde::{Deserialize, Serialize};

/// Stepper position in steps (absolute from origin).
///
/// Uses i64 for unlimited range in either direction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(transparent)]
pub struct Steps(pub i64);

impl Steps {
    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> i64 {
        self.0
    }
}

/// Linear position in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(transparent)]
pub struct Millimeters(pub f32);

/// Angular position in output shaft revolutions.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(transparent)]
pub struct Revolutions(pub f32);

/// Step rate in steps per second.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(transparent)]
pub struct StepsPerSec(pub f32);

impl StepsPerSec {
    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}

/// Step acceleration in steps per second squared.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(transparent)]
pub struct StepsPerSecSquared(pub f32);

impl StepsPerSecSquared {
    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}

/// A target position in one of the supported units.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MoveTarget {
    /// Raw steps.
    Steps(Steps),
    /// Linear distance.
    Millimeters(Millimeters),
    /// Shaft revolutions.
    Revolutions(Revolutions),
}

/// Whether a target is absolute or relative to the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Positioning {
    /// Target is measured from the origin.
    Absolute,
    /// Target is an offset from the current position.
    Relative,
}

/// Conversion factors between physical units and steps for one stepper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepScale {
    /// Steps per millimeter of linear travel.
    pub steps_per_mm: f32,
    /// Steps per output shaft revolution.
    pub steps_per_revolution: f32,
}

impl StepScale {
    /// Create a new scale.
    pub const fn new(steps_per_mm: f32, steps_per_revolution: f32) -> Self {
        Self {
            steps_per_mm,
            steps_per_revolution,
        }
    }

    /// Convert any target unit to the nearest whole step.
    pub fn to_steps(&self, target: MoveTarget) -> Steps {
        match target {
            MoveTarget::Steps(s) => s,
            MoveTarget::Millimeters(mm) => Steps(roundf(mm.0 * self.steps_per_mm) as i64),
            MoveTarget::Revolutions(rev) => {
                Steps(roundf(rev.0 * self.steps_per_revolution) as i64)
            }
        }
    }
}
