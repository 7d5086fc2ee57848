//! Motion scheduler tick.

use core::time::Duration;

use crate::config::{Settings, MAX_ENCODERS};
use crate::engine::TrajectoryEngine;
use crate::hal::Board;
use crate::irq::{set_bits, HaltRequest};
use crate::units::{MoveTarget, Positioning, Steps};

use super::telemetry::{MotionSnapshot, StepperTelemetry, TelemetrySink};
use super::Controller;

/// Scheduler state carried between ticks.
#[derive(Debug, Clone)]
pub struct MotionScheduler {
    interval: Duration,
    last_publish: Option<Duration>,
    reboot_requested: bool,
    latch_seen: bool,
}

impl MotionScheduler {
    /// Create scheduler state from runtime settings.
    pub fn new(settings: &Settings) -> Self {
        Self {
            interval: Duration::from_millis(settings.telemetry_interval_ms as u64),
            last_publish: None,
            reboot_requested: false,
            latch_seen: false,
        }
    }

    pub(crate) fn apply_settings(&mut self, settings: &Settings) {
        self.interval = Duration::from_millis(settings.telemetry_interval_ms as u64);
    }

    /// Minimum time between telemetry snapshots.
    pub fn telemetry_interval(&self) -> Duration {
        self.interval
    }

    /// Whether a reboot is waiting for motion to finish.
    pub fn reboot_pending(&self) -> bool {
        self.reboot_requested
    }

    pub(crate) fn request_reboot(&mut self) {
        self.reboot_requested = true;
    }

    // A clock that went backwards counts as due.
    fn snapshot_due(&mut self, now: Duration) -> bool {
        let due = match self.last_publish {
            None => true,
            Some(last) => now < last || now - last >= self.interval,
        };
        if due {
            self.last_publish = Some(now);
        }
        due
    }
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickReport {
    /// Every configured engine reported motion complete.
    pub all_motion_complete: bool,
    /// Emergency latch state at the end of the tick.
    pub emergency_stop: bool,
    /// Macro actions that ran.
    pub actions_run: usize,
    /// A telemetry snapshot went out.
    pub telemetry_published: bool,
    /// The board was restarted.
    pub rebooted: bool,
}

impl<'a, E: TrajectoryEngine, B: Board> Controller<'a, E, B> {
    /// Run one scheduler iteration.
    ///
    /// In order:
    /// 1. halt engines named by emergency interrupts since the last tick
    /// 2. report homing switch changes to engines, then run the macro
    ///    actions of switches that became active, in ascending switch ID
    /// 3. turn accumulated encoder detents into relative moves
    /// 4. advance every engine in ascending stepper ID
    /// 5. log emergency latch transitions
    /// 6. restart the board if requested and nothing is moving
    /// 7. publish a snapshot if the interval elapsed and someone listens
    ///
    /// Never blocks and never allocates.
    pub fn tick<T: TelemetrySink>(&mut self, now: Duration, telemetry: &mut T) -> TickReport {
        let mut report = TickReport::default();

        self.apply_halt_requests();
        report.actions_run = self.dispatch_switch_events();
        self.dispatch_encoder_detents();

        let mut all_complete = true;
        for channel in self.steppers.iter_mut().flatten() {
            if !channel.engine.advance() {
                all_complete = false;
            }
        }
        report.all_motion_complete = all_complete;

        let tripped = self.is_emergency_stop_active();
        if tripped != self.scheduler.latch_seen {
            if tripped {
                warn!("emergency stop latched");
            } else {
                info!("emergency stop released");
            }
            self.scheduler.latch_seen = tripped;
        }
        report.emergency_stop = tripped;

        if self.scheduler.reboot_requested && all_complete {
            info!("motion complete, restarting");
            self.scheduler.reboot_requested = false;
            self.board.restart();
            report.rebooted = true;
        }

        if self.scheduler.snapshot_due(now) && telemetry.has_subscribers() {
            telemetry.publish(&self.snapshot());
            report.telemetry_published = true;
        }

        report
    }

    /// Position and velocity of every configured stepper.
    pub fn snapshot(&self) -> MotionSnapshot {
        let mut snapshot = MotionSnapshot {
            emergency_stop: self.is_emergency_stop_active(),
            ..MotionSnapshot::default()
        };
        for (id, channel) in self.steppers.iter().enumerate() {
            if let Some(channel) = channel {
                // Capacity matches the arena
                let _ = snapshot.steppers.push(StepperTelemetry {
                    id: id as u8,
                    position: channel.engine.position().value(),
                    velocity: channel.engine.velocity(),
                });
            }
        }
        snapshot
    }

    pub(crate) fn apply_halt_requests(&mut self) {
        match self.irq.latch().take_halt_request() {
            HaltRequest::None => {}
            HaltRequest::All => self.halt_all(),
            HaltRequest::Steppers(mask) => {
                for id in 0..15u8 {
                    if mask & (1 << id) != 0 {
                        if let Some(channel) = self.channel_mut(id) {
                            channel.engine.emergency_stop();
                        }
                    }
                }
            }
        }
    }

    fn dispatch_switch_events(&mut self) -> usize {
        let irq = self.irq;
        let registry = irq.switches();

        let changed = registry.take_changed();
        for id in set_bits(&changed) {
            let Some(switch) = self.switch(id) else {
                continue;
            };
            let (Some(side), Some(stepper)) = (switch.category.limit_side(), switch.stepper)
            else {
                continue;
            };
            let home = switch.home_position;
            let active = registry.is_active(id);

            if let Some(channel) = self.channel_mut(stepper) {
                channel.engine.limit_switch_changed(active.then_some(side));
                if let (true, Some(home)) = (active, home) {
                    channel.engine.set_position(home);
                }
            }
        }

        let rising = registry.take_rising();
        let mut ran = 0;
        for id in set_bits(&rising) {
            let Some(actions) = self.switch(id).map(|s| s.actions.clone()) else {
                continue;
            };
            if !actions.is_empty() {
                debug!("switch {} active, running {} actions", id, actions.len());
                ran += self.execute_actions(&actions);
            }
        }
        ran
    }

    fn dispatch_encoder_detents(&mut self) {
        for id in 0..MAX_ENCODERS as u8 {
            let detents = self.irq.take_detents(id);
            if detents == 0 {
                continue;
            }
            let Some(encoder) = self.encoder(id) else {
                continue;
            };
            let (stepper, multiplier) = (encoder.stepper, encoder.step_multiplier);

            if self.is_emergency_stop_active() {
                warn!("encoder {} move dropped: emergency stop active", id);
                continue;
            }
            if let Some(channel) = self.channel_mut(stepper) {
                let steps = Steps(detents as i64 * multiplier as i64);
                channel
                    .engine
                    .set_target(MoveTarget::Steps(steps), Positioning::Relative);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_rate_limit() {
        let mut scheduler = MotionScheduler::new(&Settings::default());
        assert!(scheduler.snapshot_due(Duration::from_millis(0)));
        assert!(!scheduler.snapshot_due(Duration::from_millis(499)));
        assert!(scheduler.snapshot_due(Duration::from_millis(500)));
        assert!(!scheduler.snapshot_due(Duration::from_millis(600)));
        // Clock restarted
        assert!(scheduler.snapshot_due(Duration::from_millis(10)));
    }

    #[test]
    fn test_interval_follows_settings() {
        let mut scheduler = MotionScheduler::new(&Settings::default());
        assert_eq!(scheduler.telemetry_interval(), Duration::from_millis(500));

        scheduler.apply_settings(&Settings {
            telemetry_interval_ms: 100,
        });
        assert_eq!(scheduler.telemetry_interval(), Duration::from_millis(100));
    }
}
