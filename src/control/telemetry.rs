//! Motion telemetry snapshots.

use heapless::Vec;
use serde::Serialize;

use crate::config::MAX_STEPPERS;

/// Position and velocity of one stepper at snapshot time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepperTelemetry {
    /// Stepper ID.
    pub id: u8,
    /// Position in steps.
    pub position: i64,
    /// Velocity in steps per second.
    pub velocity: f32,
}

/// Compact state of every configured stepper, in ascending ID order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MotionSnapshot {
    /// One entry per configured stepper.
    pub steppers: Vec<StepperTelemetry, MAX_STEPPERS>,
    /// Whether the emergency latch was tripped.
    pub emergency_stop: bool,
}

/// Consumer of rate-limited motion snapshots.
///
/// Typically backed by a web-socket broadcaster. `publish` runs inside the
/// scheduler tick and must not block.
pub trait TelemetrySink {
    /// Whether anyone is listening. Snapshots are skipped otherwise.
    fn has_subscribers(&self) -> bool;

    /// Deliver one snapshot.
    fn publish(&mut self, snapshot: &MotionSnapshot);
}

/// Sink with no subscribers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTelemetry;

impl TelemetrySink for NoTelemetry {
    fn has_subscribers(&self) -> bool {
        false
    }

    fn publish(&mut self, _snapshot: &MotionSnapshot) {}
}
