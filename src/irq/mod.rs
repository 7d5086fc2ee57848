//! Interrupt-side state and dispatch.
//!
//! [`IrqContext`] is the one table interrupt handlers touch. Place it in a
//! `static` and hand `&'static IrqContext` to both the handlers and the
//! [`Controller`](crate::control::Controller):
//!
//! ```rust,ignore
//! static IRQ: IrqContext = IrqContext::new();
//!
//! fn gpio_handler(source: IrqSource) {
//!     IRQ.on_interrupt(source, &mut board_sampler());
//! }
//! ```
//!
//! Everything here is lock-free. Handlers only sample pins and update
//! atomics; the scheduler tick consumes the results.

#![allow(clippy::declare_interior_mutable_const)]

mod latch;
mod quadrature;
mod switches;

pub use latch::{EmergencyLatch, HaltRequest};
pub use quadrature::{DecoderState, EncoderSlot, QuadratureDecoder, Rotation};
pub use switches::SwitchEventRegistry;

pub(crate) use switches::set_bits;

use crate::config::MAX_ENCODERS;
use crate::hal::{InputSampler, IrqSource};

const UNUSED_ENCODER: EncoderSlot = EncoderSlot::new();

/// Statically sized table shared by interrupt handlers and the controller.
pub struct IrqContext {
    switches: SwitchEventRegistry,
    encoders: [EncoderSlot; MAX_ENCODERS],
    latch: EmergencyLatch,
}

impl Default for IrqContext {
    fn default() -> Self {
        Self::new()
    }
}

impl IrqContext {
    /// Create an empty context. Usable in a `static` initializer.
    pub const fn new() -> Self {
        Self {
            switches: SwitchEventRegistry::new(),
            encoders: [UNUSED_ENCODER; MAX_ENCODERS],
            latch: EmergencyLatch::new(),
        }
    }

    /// Interrupt entry point.
    ///
    /// Emergency edges trip the latch for every active emergency switch,
    /// scoped to its linked stepper. An inactive switch never clears it.
    pub fn on_interrupt<S: InputSampler>(&self, source: IrqSource, sampler: &mut S) {
        match source {
            IrqSource::Emergency => {
                let latch = &self.latch;
                self.switches.sample_source(source, sampler, |stepper, active| {
                    if active {
                        latch.trip(stepper);
                    }
                });
            }
            IrqSource::Limit | IrqSource::General => self.switches.on_edge(source, sampler),
            IrqSource::Encoder(id) => {
                if let Some(slot) = self.encoders.get(id as usize) {
                    slot.on_edge(sampler);
                }
            }
        }
    }

    /// Sample every installed switch, tripping the latch for active
    /// emergency switches as their handler would.
    pub fn sample_all<S: InputSampler>(&self, sampler: &mut S) {
        self.switches.sample_all(sampler);
        self.on_interrupt(IrqSource::Emergency, sampler);
    }

    /// Switch status register.
    pub fn switches(&self) -> &SwitchEventRegistry {
        &self.switches
    }

    /// Encoder slot `id`.
    pub fn encoder(&self, id: u8) -> Option<&EncoderSlot> {
        self.encoders.get(id as usize)
    }

    /// Emergency-stop latch.
    pub fn latch(&self) -> &EmergencyLatch {
        &self.latch
    }

    pub(crate) fn take_detents(&self, id: u8) -> i32 {
        self.encoders
            .get(id as usize)
            .map(EncoderSlot::take_detents)
            .unwrap_or(0)
    }
}
