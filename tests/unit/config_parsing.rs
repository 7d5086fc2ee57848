//! Unit tests for TOML configuration parsing.

use std::io::Write;

use stepper_switchboard::config::{
    load_config, ActionType, Polarity, SwitchCategory, SwitchType, SystemConfig,
};
use stepper_switchboard::error::{ConfigError, Error};
use stepper_switchboard::Steps;

/// Test parsing a stepper with every field set.
#[test]
fn test_parse_stepper_config() {
    let toml_str = r#"
[[steppers]]
name = "main_axis"
step_pin = 2
dir_pin = 3
brake_pin = 4
steps_per_mm = 80.0
steps_per_revolution = 3200.0
max_speed_steps_per_sec = 1500.0
acceleration_steps_per_sec2 = 500.0
deceleration_steps_per_sec2 = 250.0
"#;

    let config: SystemConfig = toml::from_str(toml_str).expect("Failed to parse TOML");
    let stepper = config.stepper(0).expect("Stepper not found");

    assert_eq!(stepper.name.as_str(), "main_axis");
    assert_eq!(stepper.brake_pin, Some(4));
    assert_eq!(stepper.steps_per_mm, 80.0);
    assert_eq!(stepper.steps_per_revolution, 3200.0);
    assert_eq!(stepper.max_speed.0, 1500.0);
    assert_eq!(stepper.acceleration.0, 500.0);
    assert_eq!(stepper.deceleration.0, 250.0);
    assert_eq!(config.stepper_id("main_axis"), Some(0));
}

/// Test parsing switches with defaults and macro actions.
#[test]
fn test_parse_switches() {
    let toml_str = r#"
[[steppers]]
name = "x"
step_pin = 2
dir_pin = 3

[[switches]]
name = "pos"
pin = 10
stepper = 0

[[switches]]
name = "end"
pin = 11
polarity = "active_low"
category = "homing_end"
stepper = 0
home_position = 12000
actions = [
    { type = "moveTo", val1 = 0, val2 = 0 },
    { type = "setLimitB", val1 = 0, val2 = 11990 },
    { type = "releaseEmergencyStop" },
]
"#;

    let config: SystemConfig = toml::from_str(toml_str).expect("Failed to parse TOML");

    let pos = config.switch(0).expect("Switch not found");
    assert_eq!(
        pos.switch_type(),
        SwitchType::new(Polarity::ActiveHigh, SwitchCategory::GeneralPosition)
    );
    assert!(pos.actions.is_empty());
    assert_eq!(pos.home_position, None);

    let end = config.switch(1).expect("Switch not found");
    assert_eq!(end.category, SwitchCategory::HomingEnd);
    assert_eq!(end.home_position, Some(Steps(12000)));
    let kinds: Vec<_> = end.actions.iter().map(|a| a.action).collect();
    assert_eq!(
        kinds,
        vec![
            ActionType::MoveTo,
            ActionType::SetLimitB,
            ActionType::ReleaseEmergencyStop
        ]
    );
    assert_eq!(end.actions[2].val1, 0);
}

/// Test parsing an encoder.
#[test]
fn test_parse_encoder() {
    let toml_str = r#"
[[steppers]]
name = "x"
step_pin = 2
dir_pin = 3

[[encoders]]
name = "jog"
pin_a = 20
pin_b = 21
stepper = 0
"#;

    let config: SystemConfig = toml::from_str(toml_str).expect("Failed to parse TOML");
    let encoder = config.encoder(0).expect("Encoder not found");
    assert_eq!((encoder.pin_a, encoder.pin_b), (20, 21));
    assert_eq!(encoder.step_multiplier, 1);
}

/// Test that an unknown action type is a parse error.
#[test]
fn test_unknown_action_rejected() {
    let toml_str = r#"
[[switches]]
name = "e"
pin = 5
category = "emergency_stop"
actions = [{ type = "selfDestruct" }]
"#;

    let result: Result<SystemConfig, _> = toml::from_str(toml_str);
    assert!(result.is_err());
}

/// Test loading from a file on disk.
#[test]
fn test_load_config_from_file() {
    let path = std::env::temp_dir().join("stepper-switchboard-load-test.toml");
    let mut file = std::fs::File::create(&path).expect("Failed to create file");
    writeln!(file, "[[steppers]]\nname = \"x\"\nstep_pin = 2\ndir_pin = 3").unwrap();
    drop(file);

    let config = load_config(&path).expect("Failed to load config");
    assert_eq!(config.steppers.len(), 1);
    let _ = std::fs::remove_file(&path);

    let missing = load_config("/nonexistent/switchboard.toml");
    assert!(matches!(missing, Err(Error::Config(ConfigError::IoError(_)))));
}
