//! Macro action records.

use serde::{Deserialize, Serialize};

/// What a macro action does.
///
/// Motion actions address the stepper in `val1` and take their argument from
/// `val2`. Output actions address the pin in `val1`. `TriggerEmergencyStop`
/// scopes to the stepper in `val1`, or all steppers when `val1` is negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "camelCase")]
pub enum ActionType {
    /// Move to absolute step position `val2`.
    MoveTo,
    /// Move by `val2` steps.
    MoveBy,
    /// Set speed to `val2` steps/s.
    SetSpeed,
    /// Set acceleration to `val2` steps/s².
    SetAcceleration,
    /// Set deceleration to `val2` steps/s².
    SetDeceleration,
    /// Declare the current position to be `val2`.
    SetHome,
    /// Set the begin-side soft limit to `val2`.
    SetLimitA,
    /// Set the end-side soft limit to `val2`.
    SetLimitB,
    /// Drive output pin `val1` high.
    SetOutputHigh,
    /// Drive output pin `val1` low.
    SetOutputLow,
    /// Trip the emergency stop latch.
    TriggerEmergencyStop,
    /// Clear the emergency stop latch.
    ReleaseEmergencyStop,
}

impl ActionType {
    /// Whether `val1` names a stepper for this action.
    pub fn targets_stepper(self) -> bool {
        matches!(
            self,
            ActionType::MoveTo
                | ActionType::MoveBy
                | ActionType::SetSpeed
                | ActionType::SetAcceleration
                | ActionType::SetDeceleration
                | ActionType::SetHome
                | ActionType::SetLimitA
                | ActionType::SetLimitB
        )
    }
}

/// One configured side effect, run when its switch becomes active.
///
/// Serializes as `{ "type": ..., "val1": ..., "val2": ... }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MacroAction {
    /// Action kind.
    #[serde(rename = "type")]
    pub action: ActionType,

    /// Stepper ID or pin, depending on the action.
    #[serde(default)]
    pub val1: i32,

    /// Position, rate or offset, depending on the action.
    #[serde(default)]
    pub val2: i64,
}

impl MacroAction {
    /// Create a new action.
    pub const fn new(action: ActionType, val1: i32, val2: i64) -> Self {
        Self { action, val1, val2 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let action = MacroAction::new(ActionType::SetOutputHigh, 21, 0);
        let json = serde_json::to_string(&action).unwrap();
        assert_eq!(json, r#"{"type":"setOutputHigh","val1":21,"val2":0}"#);
    }

    #[test]
    fn test_missing_values_default_to_zero() {
        let action: MacroAction = serde_json::from_str(r#"{"type":"releaseEmergencyStop"}"#).unwrap();
        assert_eq!(action, MacroAction::new(ActionType::ReleaseEmergencyStop, 0, 0));
    }

    #[test]
    fn test_targets_stepper() {
        assert!(ActionType::MoveBy.targets_stepper());
        assert!(ActionType::SetLimitB.targets_stepper());
        assert!(!ActionType::SetOutputLow.targets_stepper());
        assert!(!ActionType::TriggerEmergencyStop.targets_stepper());
    }
}
