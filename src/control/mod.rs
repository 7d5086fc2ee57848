//! Task-side controller.
//!
//! [`Controller`] owns the entity arenas, every stepper's trajectory engine
//! and the board, and borrows the shared [`IrqContext`]. External layers
//! (HTTP handlers, a command line, a persisted configuration) call its
//! operations; a task loop calls [`Controller::tick`].
//!
//! # Example
//!
//! ```rust,ignore
//! use stepper_switchboard::{Controller, IrqContext, NoTelemetry, StepperConfig};
//!
//! static IRQ: IrqContext = IrqContext::new();
//!
//! let mut controller = Controller::new(&IRQ, board);
//! let x = controller.add_or_update_stepper(StepperConfig::new("x", 12, 13), engine, None)?;
//!
//! loop {
//!     controller.tick(clock.now(), &mut NoTelemetry);
//! }
//! ```

mod actions;
mod entities;
mod scheduler;
mod telemetry;

pub use scheduler::{MotionScheduler, TickReport};
pub use telemetry::{MotionSnapshot, NoTelemetry, StepperTelemetry, TelemetrySink};

use core::fmt::Write;

use heapless::String;

use crate::config::{
    EncoderConfig, Settings, StepperConfig, SwitchConfig, MAX_ENCODERS, MAX_STEPPERS,
    MAX_SWITCHES,
};
use crate::engine::TrajectoryEngine;
use crate::error::{MotionError, Result};
use crate::hal::{Board, PinId};
use crate::irq::IrqContext;
use crate::units::{MoveTarget, Positioning};

/// One configured stepper and its engine.
pub struct StepperChannel<E> {
    /// Channel configuration.
    pub config: StepperConfig,
    /// Trajectory engine driving the channel.
    pub engine: E,
}

/// Coordinates steppers, switches, encoders and the emergency latch.
pub struct Controller<'a, E: TrajectoryEngine, B: Board> {
    irq: &'a IrqContext,
    board: B,
    steppers: [Option<StepperChannel<E>>; MAX_STEPPERS],
    switches: [Option<SwitchConfig>; MAX_SWITCHES],
    encoders: [Option<EncoderConfig>; MAX_ENCODERS],
    scheduler: MotionScheduler,
}

impl<'a, E: TrajectoryEngine, B: Board> Controller<'a, E, B> {
    /// Create a controller with no entities configured.
    pub fn new(irq: &'a IrqContext, board: B) -> Self {
        Self::with_settings(irq, board, &Settings::default())
    }

    /// Create a controller with explicit runtime settings.
    pub fn with_settings(irq: &'a IrqContext, board: B, settings: &Settings) -> Self {
        Self {
            irq,
            board,
            steppers: core::array::from_fn(|_| None),
            switches: core::array::from_fn(|_| None),
            encoders: core::array::from_fn(|_| None),
            scheduler: MotionScheduler::new(settings),
        }
    }

    /// Shared interrupt context.
    pub fn irq(&self) -> &'a IrqContext {
        self.irq
    }

    /// The board.
    pub fn board(&self) -> &B {
        &self.board
    }

    /// The board, mutably.
    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    /// Scheduler state.
    pub fn scheduler(&self) -> &MotionScheduler {
        &self.scheduler
    }

    /// Configuration of stepper `id`.
    pub fn stepper(&self, id: u8) -> Option<&StepperConfig> {
        self.channel(id).map(|c| &c.config)
    }

    /// Engine of stepper `id`.
    pub fn engine(&self, id: u8) -> Option<&E> {
        self.channel(id).map(|c| &c.engine)
    }

    /// Engine of stepper `id`, mutably.
    pub fn engine_mut(&mut self, id: u8) -> Option<&mut E> {
        self.channel_mut(id).map(|c| &mut c.engine)
    }

    /// Configuration of switch `id`.
    pub fn switch(&self, id: u8) -> Option<&SwitchConfig> {
        self.switches.get(id as usize).and_then(Option::as_ref)
    }

    /// Configuration of encoder `id`.
    pub fn encoder(&self, id: u8) -> Option<&EncoderConfig> {
        self.encoders.get(id as usize).and_then(Option::as_ref)
    }

    /// Configured stepper IDs in ascending order.
    pub fn stepper_ids(&self) -> impl Iterator<Item = u8> + '_ {
        self.steppers
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(id, _)| id as u8)
    }

    pub(crate) fn channel(&self, id: u8) -> Option<&StepperChannel<E>> {
        self.steppers.get(id as usize).and_then(Option::as_ref)
    }

    pub(crate) fn channel_mut(&mut self, id: u8) -> Option<&mut StepperChannel<E>> {
        self.steppers.get_mut(id as usize).and_then(Option::as_mut)
    }

    // Queries

    /// Whether any stepper, switch or encoder uses `pin`.
    pub fn is_io_pin_used(&self, pin: PinId) -> bool {
        self.pin_owner(pin).is_some()
    }

    /// Logical state of switch `id` as of its last interrupt.
    pub fn position_switch_status(&self, id: u8) -> bool {
        self.irq.switches().is_active(id)
    }

    /// Status word `index` as eight binary digits, most significant bit first.
    ///
    /// This is the logical view: a bit is set when the switch is active after
    /// applying its polarity. Pin levels are in
    /// [`SwitchEventRegistry::raw_register_word`](crate::irq::SwitchEventRegistry::raw_register_word).
    /// Switch `i` is bit `i % 8` of word `i / 8`. Returns `None` past the last word.
    pub fn formatted_status_register(&self, index: usize) -> Option<String<8>> {
        let word = self.irq.switches().register_word(index)?;
        let mut out = String::new();
        write!(out, "{:08b}", word).ok()?;
        Some(out)
    }

    // Emergency stop

    /// Stop `scope` (or every stepper) immediately and trip the latch.
    ///
    /// An unknown scope halts every stepper. Idempotent.
    pub fn perform_emergency_stop(&mut self, scope: Option<u8>) {
        self.irq.latch().set();

        match scope {
            Some(id) if self.channel(id).is_some() => {
                if let Some(channel) = self.channel_mut(id) {
                    channel.engine.emergency_stop();
                }
            }
            Some(id) => {
                warn!("emergency stop scoped to unknown stepper {}, halting all", id);
                self.halt_all();
            }
            None => self.halt_all(),
        }
    }

    /// Clear the latch. Steppers stay where they stopped until commanded again.
    ///
    /// Halts still pending from interrupt context are applied here, so a move
    /// commanded after this call is not cancelled by the next tick. A trip that
    /// lands between the two steps leaves the latch set.
    pub fn revoke_emergency_stop(&mut self) {
        self.irq.latch().revoke();
        self.apply_halt_requests();
    }

    /// Whether the emergency latch is tripped.
    pub fn is_emergency_stop_active(&self) -> bool {
        self.irq.latch().is_tripped()
    }

    pub(crate) fn halt_all(&mut self) {
        for channel in self.steppers.iter_mut().flatten() {
            channel.engine.emergency_stop();
        }
    }

    // Motion

    /// Command stepper `id` toward `target`.
    ///
    /// Millimeter and revolution targets are converted to whole steps with the
    /// channel's scale before reaching the engine.
    ///
    /// # Errors
    ///
    /// - [`MotionError::EmergencyStopActive`] while the latch is tripped
    /// - [`MotionError::UnknownStepper`] if `id` is not configured
    pub fn move_stepper(
        &mut self,
        id: u8,
        target: MoveTarget,
        positioning: Positioning,
    ) -> Result<()> {
        if self.is_emergency_stop_active() {
            return Err(MotionError::EmergencyStopActive.into());
        }
        let channel = self
            .channel_mut(id)
            .ok_or(MotionError::UnknownStepper(id))?;

        let steps = channel.config.scale().to_steps(target);
        channel.engine.set_target(MoveTarget::Steps(steps), positioning);
        Ok(())
    }

    /// Ask for a restart once every stepper has finished moving.
    pub fn request_reboot(&mut self) {
        info!("reboot requested");
        self.scheduler.request_reboot();
    }

    /// Remove every interrupt registration. Entity records are kept.
    pub fn shutdown(&mut self) {
        self.irq.switches().detach_all(&mut self.board);

        for (id, encoder) in self.encoders.iter().enumerate() {
            if let Some(encoder) = encoder {
                self.board.detach_interrupt(encoder.pin_a);
                self.board.detach_interrupt(encoder.pin_b);
                if let Some(slot) = self.irq.encoder(id as u8) {
                    slot.clear();
                }
            }
        }
        info!("interrupts detached");
    }
}
