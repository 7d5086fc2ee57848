//! Configuration validation.

use crate::error::{ConfigError, Error, Result};
use crate::hal::{PinId, NO_PIN};

use super::{EncoderConfig, StepperConfig, SwitchCategory, SwitchConfig, SystemConfig};

/// Validate a system configuration.
///
/// Checks:
/// - Every record is valid on its own
/// - Pins are unique across steppers, switches and encoders
/// - Switch and encoder stepper links refer to configured steppers
pub fn validate_config(config: &SystemConfig) -> Result<()> {
    let mut seen: heapless::Vec<PinId, 128> = heapless::Vec::new();
    let mut claim = |pin: PinId| -> Result<()> {
        if seen.contains(&pin) {
            return Err(Error::Config(ConfigError::PinInUse(pin)));
        }
        // Capacity covers three pins per stepper and two per switch/encoder.
        let _ = seen.push(pin);
        Ok(())
    };

    for stepper in config.steppers.iter() {
        validate_stepper(stepper)?;
        claim(stepper.step_pin)?;
        claim(stepper.dir_pin)?;
        if let Some(brake) = stepper.brake_pin {
            claim(brake)?;
        }
    }

    let stepper_count = config.steppers.len();

    for (id, switch) in config.switches.iter().enumerate() {
        validate_switch(id as u8, switch)?;
        claim(switch.pin)?;
        if let Some(stepper) = switch.stepper {
            if stepper as usize >= stepper_count {
                return Err(Error::Config(ConfigError::UnknownStepper(stepper)));
            }
        }
    }

    for encoder in config.encoders.iter() {
        validate_encoder(encoder)?;
        claim(encoder.pin_a)?;
        claim(encoder.pin_b)?;
        if encoder.stepper as usize >= stepper_count {
            return Err(Error::Config(ConfigError::UnknownStepper(encoder.stepper)));
        }
    }

    Ok(())
}

fn check_pin(pin: PinId) -> Result<()> {
    if pin == NO_PIN {
        return Err(Error::Config(ConfigError::InvalidPin(pin)));
    }
    Ok(())
}

fn check_positive(value: f32) -> Result<()> {
    // NaN fails this comparison too
    if !(value > 0.0) {
        return Err(Error::Config(ConfigError::InvalidMotionParameter(value)));
    }
    Ok(())
}

pub(crate) fn validate_stepper(config: &StepperConfig) -> Result<()> {
    check_pin(config.step_pin)?;
    check_pin(config.dir_pin)?;
    if config.step_pin == config.dir_pin {
        return Err(Error::Config(ConfigError::PinInUse(config.dir_pin)));
    }
    if let Some(brake) = config.brake_pin {
        check_pin(brake)?;
        if brake == config.step_pin || brake == config.dir_pin {
            return Err(Error::Config(ConfigError::PinInUse(brake)));
        }
    }

    check_positive(config.steps_per_mm)?;
    check_positive(config.steps_per_revolution)?;
    check_positive(config.max_speed.0)?;
    check_positive(config.acceleration.0)?;
    check_positive(config.deceleration.0)?;

    Ok(())
}

pub(crate) fn validate_switch(id: u8, config: &SwitchConfig) -> Result<()> {
    check_pin(config.pin)?;

    // Only pure emergency switches may stand alone
    if config.stepper.is_none() && config.category != SwitchCategory::EmergencyStop {
        return Err(Error::Config(ConfigError::MissingStepperLink(id)));
    }

    Ok(())
}

pub(crate) fn validate_encoder(config: &EncoderConfig) -> Result<()> {
    check_pin(config.pin_a)?;
    check_pin(config.pin_b)?;
    if config.pin_a == config.pin_b {
        return Err(Error::Config(ConfigError::PinInUse(config.pin_b)));
    }
    if config.step_multiplier == 0 {
        return Err(Error::Config(ConfigError::InvalidStepMultiplier(
            config.step_multiplier,
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Polarity, SwitchType};

    #[test]
    fn test_zero_step_multiplier() {
        let config = EncoderConfig::new("knob", 4, 5, 0, 0);

        let result = validate_encoder(&config);
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidStepMultiplier(0)))
        ));
    }

    #[test]
    fn test_general_switch_needs_stepper() {
        let config = SwitchConfig::new(
            "pos",
            7,
            SwitchType::new(Polarity::ActiveHigh, SwitchCategory::GeneralPosition),
            None,
        );
        assert!(matches!(
            validate_switch(3, &config),
            Err(Error::Config(ConfigError::MissingStepperLink(3)))
        ));

        let estop = SwitchConfig::new(
            "estop",
            7,
            SwitchType::new(Polarity::ActiveLow, SwitchCategory::EmergencyStop),
            None,
        );
        assert!(validate_switch(3, &estop).is_ok());
    }

    #[test]
    fn test_negative_speed_rejected() {
        let mut config = StepperConfig::new("x", 2, 3);
        config.max_speed.0 = -5.0;

        assert!(matches!(
            validate_stepper(&config),
            Err(Error::Config(ConfigError::InvalidMotionParameter(_)))
        ));
    }

    #[test]
    fn test_duplicate_pin_across_entities() {
        let mut config = SystemConfig::default();
        config.steppers.push(StepperConfig::new("x", 2, 3)).unwrap();
        config
            .encoders
            .push(EncoderConfig::new("knob", 3, 9, 1, 0))
            .unwrap();

        assert_eq!(
            validate_config(&config),
            Err(Error::Config(ConfigError::PinInUse(3)))
        );
    }

    #[test]
    fn test_dangling_stepper_link() {
        let mut config = SystemConfig::default();
        config.steppers.push(StepperConfig::new("x", 2, 3)).unwrap();
        config
            .switches
            .push(SwitchConfig::new("home", 8, SwitchType::default(), Some(1)))
            .unwrap();

        assert_eq!(
            validate_config(&config),
            Err(Error::Config(ConfigError::UnknownStepper(1)))
        );
    }
}
