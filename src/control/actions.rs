//! Macro action execution.

use crate::config::{ActionType, MacroAction};
use crate::engine::{LimitSide, TrajectoryEngine};
use crate::hal::Board;
use crate::units::{MoveTarget, Positioning, Steps, StepsPerSec, StepsPerSecSquared};

use super::Controller;

impl<'a, E: TrajectoryEngine, B: Board> Controller<'a, E, B> {
    /// Run `actions` in order, synchronously and without rollback.
    ///
    /// Actions naming an unconfigured stepper or an invalid pin are skipped
    /// with a warning. Moves are skipped while the emergency latch is tripped.
    /// Returns the number of actions that ran.
    pub fn execute_actions(&mut self, actions: &[MacroAction]) -> usize {
        actions
            .iter()
            .filter(|action| self.execute_action(action))
            .count()
    }

    fn execute_action(&mut self, action: &MacroAction) -> bool {
        if action.action.targets_stepper() {
            return self.execute_stepper_action(action);
        }

        match action.action {
            ActionType::SetOutputHigh | ActionType::SetOutputLow => {
                let Ok(pin) = u8::try_from(action.val1) else {
                    warn!("macro output pin {} out of range, skipped", action.val1);
                    return false;
                };
                let high = action.action == ActionType::SetOutputHigh;
                match self.board.set_output(pin, high) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("macro output write failed: {}", e);
                        false
                    }
                }
            }
            ActionType::TriggerEmergencyStop => {
                let scope = u8::try_from(action.val1).ok();
                self.perform_emergency_stop(scope);
                true
            }
            ActionType::ReleaseEmergencyStop => {
                self.revoke_emergency_stop();
                true
            }
            _ => false,
        }
    }

    fn execute_stepper_action(&mut self, action: &MacroAction) -> bool {
        let latched = self.is_emergency_stop_active();
        let Some(channel) = u8::try_from(action.val1)
            .ok()
            .and_then(|id| self.channel_mut(id))
        else {
            warn!("macro action names unknown stepper {}, skipped", action.val1);
            return false;
        };
        let engine = &mut channel.engine;
        let value = action.val2;

        match action.action {
            ActionType::MoveTo | ActionType::MoveBy if latched => {
                warn!("macro move for stepper {} skipped: emergency stop active", action.val1);
                return false;
            }
            ActionType::MoveTo => {
                engine.set_target(MoveTarget::Steps(Steps(value)), Positioning::Absolute)
            }
            ActionType::MoveBy => {
                engine.set_target(MoveTarget::Steps(Steps(value)), Positioning::Relative)
            }
            ActionType::SetSpeed | ActionType::SetAcceleration | ActionType::SetDeceleration
                if value <= 0 =>
            {
                warn!("macro rate {} for stepper {} must be > 0, skipped", value, action.val1);
                return false;
            }
            ActionType::SetSpeed => engine.set_speed(StepsPerSec(value as f32)),
            ActionType::SetAcceleration => engine.set_acceleration(StepsPerSecSquared(value as f32)),
            ActionType::SetDeceleration => engine.set_deceleration(StepsPerSecSquared(value as f32)),
            ActionType::SetHome => engine.set_position(Steps(value)),
            ActionType::SetLimitA => engine.set_soft_limit(LimitSide::Begin, Steps(value)),
            ActionType::SetLimitB => engine.set_soft_limit(LimitSide::End, Steps(value)),
            _ => return false,
        }
        true
    }
}
