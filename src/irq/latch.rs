//! Emergency-stop latch shared between interrupt and task context.

use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

/// Halt requests raised since the last tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HaltRequest {
    /// Nothing to halt.
    None,
    /// Halt every configured stepper.
    All,
    /// Halt the steppers whose bits are set (bit `n` = stepper `n`).
    Steppers(u16),
}

/// Two-state latch: armed or tripped.
///
/// Interrupt handlers can only trip it. Tripping also records which engines
/// still need an immediate stop, because engines are owned by the task and
/// cannot be reached from an interrupt. The scheduler drains that request
/// at the start of its next tick.
#[derive(Debug)]
pub struct EmergencyLatch {
    tripped: AtomicBool,
    halt_mask: AtomicU16,
}

const HALT_ALL: u16 = 1 << 15;

impl Default for EmergencyLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl EmergencyLatch {
    /// Create an armed latch.
    pub const fn new() -> Self {
        Self {
            tripped: AtomicBool::new(false),
            halt_mask: AtomicU16::new(0),
        }
    }

    /// Trip the latch and request a halt of `scope` (or of everything).
    ///
    /// Safe from interrupt context. Idempotent.
    pub fn trip(&self, scope: Option<u8>) {
        let bit = match scope {
            Some(id) if id < 15 => 1u16 << id,
            _ => HALT_ALL,
        };
        self.halt_mask.fetch_or(bit, Ordering::AcqRel);
        self.tripped.store(true, Ordering::Release);
    }

    /// Set the latch without requesting a halt; the caller stops engines itself.
    pub(crate) fn set(&self) {
        self.tripped.store(true, Ordering::Release);
    }

    /// Whether the latch is tripped.
    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }

    /// Re-arm the latch. Pending halt requests stay until taken.
    pub(crate) fn revoke(&self) {
        self.tripped.store(false, Ordering::Release);
    }

    /// Consume the pending halt request.
    pub(crate) fn take_halt_request(&self) -> HaltRequest {
        match self.halt_mask.swap(0, Ordering::AcqRel) {
            0 => HaltRequest::None,
            mask if mask & HALT_ALL != 0 => HaltRequest::All,
            mask => HaltRequest::Steppers(mask),
        }
    }
}
