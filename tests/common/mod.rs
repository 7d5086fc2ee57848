//! Shared test doubles: a scripted trajectory engine, a recording board,
//! a pin-level sampler and a recording telemetry sink.

#![allow(dead_code)]

use stepper_switchboard::control::{MotionSnapshot, TelemetrySink};
use stepper_switchboard::error::HardwareError;
use stepper_switchboard::units::{StepsPerSec, StepsPerSecSquared};
use stepper_switchboard::{
    Board, InputSampler, IrqSource, LimitSide, MoveTarget, PinId, Positioning, Steps,
    TrajectoryEngine,
};

/// Ticks a mock move takes to finish.
pub const MOVE_TICKS: u32 = 2;

/// Engine that reaches any target after `MOVE_TICKS` advances and records
/// every call it receives.
#[derive(Debug, Default)]
pub struct MockEngine {
    pub position: i64,
    pub goal: i64,
    pub ticks_left: u32,
    pub targets: Vec<(MoveTarget, Positioning)>,
    pub stops: u32,
    pub advances: u32,
    pub speed: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    pub soft_limits: Vec<(LimitSide, i64)>,
    pub limit_events: Vec<Option<LimitSide>>,
}

impl TrajectoryEngine for MockEngine {
    fn advance(&mut self) -> bool {
        self.advances += 1;
        if self.ticks_left > 0 {
            self.ticks_left -= 1;
            if self.ticks_left == 0 {
                self.position = self.goal;
            }
        }
        self.ticks_left == 0
    }

    fn set_target(&mut self, target: MoveTarget, positioning: Positioning) {
        self.targets.push((target, positioning));
        let steps = match target {
            MoveTarget::Steps(s) => s.value(),
            other => panic!("engine expects steps, got {:?}", other),
        };
        self.goal = match positioning {
            Positioning::Absolute => steps,
            Positioning::Relative => self.goal + steps,
        };
        self.ticks_left = MOVE_TICKS;
    }

    fn emergency_stop(&mut self) {
        self.stops += 1;
        self.ticks_left = 0;
        self.goal = self.position;
    }

    fn position(&self) -> Steps {
        Steps(self.position)
    }

    fn velocity(&self) -> f32 {
        if self.ticks_left > 0 {
            100.0
        } else {
            0.0
        }
    }

    fn is_motion_complete(&self) -> bool {
        self.ticks_left == 0
    }

    fn set_speed(&mut self, speed: StepsPerSec) {
        self.speed = speed.value();
    }

    fn set_acceleration(&mut self, acceleration: StepsPerSecSquared) {
        self.acceleration = acceleration.value();
    }

    fn set_deceleration(&mut self, deceleration: StepsPerSecSquared) {
        self.deceleration = deceleration.value();
    }

    fn set_position(&mut self, position: Steps) {
        self.position = position.value();
        self.goal = position.value();
    }

    fn set_soft_limit(&mut self, side: LimitSide, position: Steps) {
        self.soft_limits.push((side, position.value()));
    }

    fn limit_switch_changed(&mut self, active: Option<LimitSide>) {
        self.limit_events.push(active);
    }
}

/// Board that records interrupt registrations, output writes and restarts.
#[derive(Debug, Default)]
pub struct FakeBoard {
    pub attached: Vec<(PinId, IrqSource)>,
    pub attach_calls: usize,
    pub no_interrupt_pins: Vec<PinId>,
    pub outputs: Vec<(PinId, bool)>,
    pub restarts: u32,
}

impl FakeBoard {
    pub fn source_of(&self, pin: PinId) -> Option<IrqSource> {
        self.attached
            .iter()
            .find(|(p, _)| *p == pin)
            .map(|(_, source)| *source)
    }
}

impl Board for FakeBoard {
    fn attach_interrupt(&mut self, pin: PinId, source: IrqSource) -> Result<(), HardwareError> {
        self.attach_calls += 1;
        if self.no_interrupt_pins.contains(&pin) {
            return Err(HardwareError::InterruptUnavailable(pin));
        }
        self.attached.retain(|(p, _)| *p != pin);
        self.attached.push((pin, source));
        Ok(())
    }

    fn detach_interrupt(&mut self, pin: PinId) {
        self.attached.retain(|(p, _)| *p != pin);
    }

    fn set_output(&mut self, pin: PinId, high: bool) -> Result<(), HardwareError> {
        self.outputs.push((pin, high));
        Ok(())
    }

    fn restart(&mut self) {
        self.restarts += 1;
    }
}

/// Pin levels, all high by default (idle level of pulled-up switches).
pub struct Pins(pub [bool; 256]);

impl Default for Pins {
    fn default() -> Self {
        Pins([true; 256])
    }
}

impl Pins {
    pub fn set(&mut self, pin: PinId, high: bool) {
        self.0[pin as usize] = high;
    }
}

impl InputSampler for Pins {
    fn is_high(&mut self, pin: PinId) -> bool {
        self.0[pin as usize]
    }
}

/// Telemetry sink that keeps every snapshot.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub subscribed: bool,
    pub snapshots: Vec<MotionSnapshot>,
}

impl TelemetrySink for RecordingSink {
    fn has_subscribers(&self) -> bool {
        self.subscribed
    }

    fn publish(&mut self, snapshot: &MotionSnapshot) {
        self.snapshots.push(snapshot.clone());
    }
}

/// Gray-code samples `(A, B)` of one clockwise detent starting from rest (both high).
pub const CW_DETENT: [(bool, bool); 4] = [(true, false), (false, false), (false, true), (true, true)];

/// Gray-code samples `(A, B)` of one counter-clockwise detent starting from rest.
pub const CCW_DETENT: [(bool, bool); 4] =
    [(false, true), (false, false), (true, false), (true, true)];
