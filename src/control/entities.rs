//! Entity add, update and remove.
//!
//! IDs are arena slots. A `None` ID takes the first free slot; an explicit ID
//! creates or replaces that slot. Every check runs before anything changes,
//! so a rejected call leaves the controller untouched.

use crate::config::{
    validate_config, validate_encoder, validate_stepper, validate_switch, EncoderConfig,
    StepperConfig, SwitchConfig, SystemConfig,
};
use crate::engine::TrajectoryEngine;
use crate::error::{ConfigError, EntityKind, Result};
use crate::hal::{Board, IrqSource, PinId};

use super::{Controller, StepperChannel};

fn resolve_slot<T>(slots: &[Option<T>], id: Option<u8>, kind: EntityKind) -> Result<u8> {
    match id {
        Some(id) if (id as usize) < slots.len() => Ok(id),
        Some(id) => Err(ConfigError::InvalidId(id).into()),
        None => slots
            .iter()
            .position(Option::is_none)
            .map(|slot| slot as u8)
            .ok_or_else(|| ConfigError::CapacityExceeded(kind).into()),
    }
}

impl<'a, E: TrajectoryEngine, B: Board> Controller<'a, E, B> {
    /// Entity currently using `pin`.
    pub fn pin_owner(&self, pin: PinId) -> Option<(EntityKind, u8)> {
        let stepper = self
            .steppers
            .iter()
            .position(|s| s.as_ref().is_some_and(|c| c.config.uses_pin(pin)))
            .map(|id| (EntityKind::Stepper, id as u8));
        let switch = || {
            self.switches
                .iter()
                .position(|s| s.as_ref().is_some_and(|c| c.pin == pin))
                .map(|id| (EntityKind::Switch, id as u8))
        };
        let encoder = || {
            self.encoders
                .iter()
                .position(|e| e.as_ref().is_some_and(|c| c.uses_pin(pin)))
                .map(|id| (EntityKind::Encoder, id as u8))
        };

        stepper.or_else(switch).or_else(encoder)
    }

    fn check_pins(&self, pins: &[PinId], owner: (EntityKind, u8)) -> Result<()> {
        for &pin in pins {
            match self.pin_owner(pin) {
                Some(other) if other != owner => return Err(ConfigError::PinInUse(pin).into()),
                _ => {}
            }
        }
        Ok(())
    }

    fn check_stepper_link(&self, stepper: u8) -> Result<()> {
        if self.channel(stepper).is_none() {
            return Err(ConfigError::UnknownStepper(stepper).into());
        }
        Ok(())
    }

    // Steppers

    /// Create or replace a stepper channel. Returns its ID.
    ///
    /// The engine receives the configured speed and ramps before it is stored.
    ///
    /// # Errors
    ///
    /// - `CapacityExceeded` if `id` is `None` and every slot is taken
    /// - `InvalidId` if `id` is out of range
    /// - `PinInUse` if another entity already uses one of the pins
    /// - `InvalidPin` / `InvalidMotionParameter` for malformed records
    pub fn add_or_update_stepper(
        &mut self,
        config: StepperConfig,
        mut engine: E,
        id: Option<u8>,
    ) -> Result<u8> {
        let id = resolve_slot(&self.steppers, id, EntityKind::Stepper)?;
        validate_stepper(&config)?;

        let mut pins: heapless::Vec<PinId, 3> = heapless::Vec::new();
        let _ = pins.push(config.step_pin);
        let _ = pins.push(config.dir_pin);
        if let Some(brake) = config.brake_pin {
            let _ = pins.push(brake);
        }
        self.check_pins(&pins, (EntityKind::Stepper, id))?;

        engine.set_speed(config.max_speed);
        engine.set_acceleration(config.acceleration);
        engine.set_deceleration(config.deceleration);

        info!("stepper {} configured: {}", id, config.name.as_str());
        self.steppers[id as usize] = Some(StepperChannel { config, engine });
        Ok(id)
    }

    /// Remove a stepper, along with every switch and encoder linked to it.
    ///
    /// # Errors
    ///
    /// Returns `UnknownStepper` if `id` is not configured.
    pub fn remove_stepper(&mut self, id: u8) -> Result<()> {
        self.check_stepper_link(id)?;

        for switch in 0..self.switches.len() as u8 {
            if self.switch(switch).is_some_and(|s| s.stepper == Some(id)) {
                self.remove_switch(switch)?;
            }
        }
        for encoder in 0..self.encoders.len() as u8 {
            if self.encoder(encoder).is_some_and(|e| e.stepper == id) {
                self.remove_encoder(encoder)?;
            }
        }

        self.steppers[id as usize] = None;
        info!("stepper {} removed", id);
        Ok(())
    }

    // Position switches

    /// Create or replace a position switch and attach its interrupt. Returns its ID.
    ///
    /// The interrupt is re-registered only when the pin or category changes.
    /// If the board cannot raise interrupts on the pin, the switch is kept but
    /// stays unmonitored.
    ///
    /// # Errors
    ///
    /// - `CapacityExceeded` / `InvalidId` for slot problems
    /// - `MissingStepperLink` if a non-emergency switch has no stepper
    /// - `UnknownStepper` if the linked stepper is not configured
    /// - `PinInUse` if another entity already uses the pin
    pub fn add_or_update_switch(&mut self, config: SwitchConfig, id: Option<u8>) -> Result<u8> {
        let id = resolve_slot(&self.switches, id, EntityKind::Switch)?;
        validate_switch(id, &config)?;
        if let Some(stepper) = config.stepper {
            self.check_stepper_link(stepper)?;
        }
        self.check_pins(&[config.pin], (EntityKind::Switch, id))?;

        let irq = self.irq;
        let registry = irq.switches();
        let previous = self.switches[id as usize].take();

        match previous {
            Some(old) if old.pin == config.pin && old.category == config.category => {
                registry.refresh(id, &config);
            }
            other => {
                if let Some(old) = other {
                    registry.detach(&mut self.board, id, old.pin);
                }
                if let Err(e) = registry.attach(&mut self.board, id, &config) {
                    warn!("switch {} left unmonitored: {}", id, e);
                }
            }
        }

        info!("switch {} configured: {}", id, config.name.as_str());
        self.switches[id as usize] = Some(config);
        Ok(id)
    }

    /// Detach and remove a position switch.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSwitch` if `id` is not configured.
    pub fn remove_switch(&mut self, id: u8) -> Result<()> {
        let config = self
            .switches
            .get_mut(id as usize)
            .and_then(Option::take)
            .ok_or(ConfigError::UnknownSwitch(id))?;

        self.irq.switches().detach(&mut self.board, id, config.pin);
        info!("switch {} removed", id);
        Ok(())
    }

    // Rotary encoders

    /// Create or replace a rotary encoder and attach both phase pins. Returns its ID.
    ///
    /// # Errors
    ///
    /// - `CapacityExceeded` / `InvalidId` for slot problems
    /// - `UnknownStepper` if the linked stepper is not configured
    /// - `PinInUse` if another entity already uses either pin
    /// - `InvalidStepMultiplier` if the multiplier is zero
    pub fn add_or_update_encoder(&mut self, config: EncoderConfig, id: Option<u8>) -> Result<u8> {
        let id = resolve_slot(&self.encoders, id, EntityKind::Encoder)?;
        validate_encoder(&config)?;
        self.check_stepper_link(config.stepper)?;
        self.check_pins(&[config.pin_a, config.pin_b], (EntityKind::Encoder, id))?;

        if let Some(old) = self.encoders[id as usize].take() {
            self.board.detach_interrupt(old.pin_a);
            self.board.detach_interrupt(old.pin_b);
        }

        if let Some(slot) = self.irq.encoder(id) {
            slot.install(&config);
        }
        for pin in [config.pin_a, config.pin_b] {
            if let Err(e) = self.board.attach_interrupt(pin, IrqSource::Encoder(id)) {
                warn!("encoder {} pin {} left unmonitored: {}", id, pin, e);
            }
        }

        info!("encoder {} configured: {}", id, config.name.as_str());
        self.encoders[id as usize] = Some(config);
        Ok(id)
    }

    /// Detach and remove a rotary encoder.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEncoder` if `id` is not configured.
    pub fn remove_encoder(&mut self, id: u8) -> Result<()> {
        let config = self
            .encoders
            .get_mut(id as usize)
            .and_then(Option::take)
            .ok_or(ConfigError::UnknownEncoder(id))?;

        self.board.detach_interrupt(config.pin_a);
        self.board.detach_interrupt(config.pin_b);
        if let Some(slot) = self.irq.encoder(id) {
            slot.clear();
        }
        info!("encoder {} removed", id);
        Ok(())
    }

    /// Replace every entity with the contents of `config`.
    ///
    /// The configuration is validated first; on error nothing changes.
    /// `make_engine` builds the engine for each stepper, in ID order.
    ///
    /// # Errors
    ///
    /// Returns the first validation error.
    pub fn apply_config<F>(&mut self, config: &SystemConfig, mut make_engine: F) -> Result<()>
    where
        F: FnMut(u8, &StepperConfig) -> E,
    {
        validate_config(config)?;

        self.shutdown();
        self.switches.iter_mut().for_each(|s| *s = None);
        self.encoders.iter_mut().for_each(|e| *e = None);
        self.steppers.iter_mut().for_each(|s| *s = None);
        self.scheduler.apply_settings(&config.settings);

        for (id, stepper) in config.steppers.iter().enumerate() {
            let engine = make_engine(id as u8, stepper);
            self.add_or_update_stepper(stepper.clone(), engine, Some(id as u8))?;
        }
        for (id, switch) in config.switches.iter().enumerate() {
            self.add_or_update_switch(switch.clone(), Some(id as u8))?;
        }
        for (id, encoder) in config.encoders.iter().enumerate() {
            self.add_or_update_encoder(encoder.clone(), Some(id as u8))?;
        }

        info!(
            "configuration applied: {} steppers, {} switches, {} encoders",
            config.steppers.len(),
            config.switches.len(),
            config.encoders.len()
        );
        Ok(())
    }
}
