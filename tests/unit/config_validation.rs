//! Unit tests for configuration validation.

use stepper_switchboard::config::{
    validate_config, EncoderConfig, StepperConfig, SwitchConfig, SwitchType, SystemConfig,
};
use stepper_switchboard::error::{ConfigError, Error};
use stepper_switchboard::NO_PIN;

fn one_stepper() -> SystemConfig {
    let mut config = SystemConfig::default();
    config
        .steppers
        .push(StepperConfig::new("x", 2, 3))
        .unwrap();
    config
}

/// Test validation of a valid configuration.
#[test]
fn test_valid_config_passes_validation() {
    let toml_str = r#"
[[steppers]]
name = "x"
step_pin = 2
dir_pin = 3

[[switches]]
name = "home"
pin = 4
category = "homing_begin"
stepper = 0

[[encoders]]
name = "jog"
pin_a = 5
pin_b = 6
stepper = 0
"#;

    let config: SystemConfig = toml::from_str(toml_str).expect("Failed to parse TOML");
    assert!(validate_config(&config).is_ok());
}

/// Test validation fails for an encoder linked to a missing stepper.
#[test]
fn test_encoder_invalid_stepper_reference() {
    let mut config = one_stepper();
    config
        .encoders
        .push(EncoderConfig::new("jog", 5, 6, 1, 3))
        .unwrap();

    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::UnknownStepper(3)))
    );
}

/// Test validation fails for a reserved pin number.
#[test]
fn test_reserved_pin_rejected() {
    let mut config = one_stepper();
    config
        .switches
        .push(SwitchConfig::new("pos", NO_PIN, SwitchType::default(), Some(0)))
        .unwrap();

    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidPin(NO_PIN)))
    );
}

/// Test validation fails when an encoder reuses its own pin.
#[test]
fn test_encoder_same_pin_twice() {
    let mut config = one_stepper();
    config
        .encoders
        .push(EncoderConfig::new("jog", 5, 5, 1, 0))
        .unwrap();

    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::PinInUse(5)))
    ));
}

/// Test an empty configuration is valid.
#[test]
fn test_empty_config_is_valid() {
    let config = SystemConfig::default();
    assert!(validate_config(&config).is_ok());
}
