//! Trajectory engine contract.
//!
//! Each stepper channel owns one engine. The engine plans velocity profiles
//! and emits step pulses; the core only tells it where to go, when to stop
//! and when to take its next tick.

use crate::units::{MoveTarget, Positioning, Steps, StepsPerSec, StepsPerSecSquared};

/// End of travel a homing or limit switch guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LimitSide {
    /// Switch at the start (negative end) of travel.
    Begin,
    /// Switch at the end (positive end) of travel.
    End,
}

/// Per-stepper motion engine driven by the scheduler tick.
///
/// Calls are made from task context only. `advance` runs once per tick and
/// must return quickly; in a software-stepped design it is the step clock.
pub trait TrajectoryEngine {
    /// Advance the trajectory by one tick. Returns `true` once motion is complete.
    fn advance(&mut self) -> bool;

    /// Set a new target position.
    fn set_target(&mut self, target: MoveTarget, positioning: Positioning);

    /// Stop immediately, without a deceleration ramp.
    fn emergency_stop(&mut self);

    /// Current position.
    fn position(&self) -> Steps;

    /// Current velocity in steps per second (signed).
    fn velocity(&self) -> f32;

    /// Whether the last target has been reached.
    fn is_motion_complete(&self) -> bool;

    /// Set the cruise speed.
    fn set_speed(&mut self, speed: StepsPerSec);

    /// Set the acceleration rate.
    fn set_acceleration(&mut self, acceleration: StepsPerSecSquared);

    /// Set the deceleration rate.
    fn set_deceleration(&mut self, deceleration: StepsPerSecSquared);

    /// Redefine the current position without moving.
    fn set_position(&mut self, position: Steps);

    /// Set a software travel limit.
    fn set_soft_limit(&mut self, side: LimitSide, position: Steps);

    /// Notify the engine that a limit switch became active (`Some`) or released (`None`).
    fn limit_switch_changed(&mut self, _active: Option<LimitSide>) {}
}
