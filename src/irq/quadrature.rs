//! Full-step quadrature decoder for mechanical rotary encoders.
//!
//! The decoder walks a gray-code sequence and reports a direction only when a
//! complete detent closes. Bounced or out-of-sequence codes fall back toward
//! `Start` without emitting anything, so no debounce timer is needed.

use core::sync::atomic::{AtomicI32, AtomicU32, AtomicU8, Ordering};

use crate::config::EncoderConfig;
use crate::hal::{InputSampler, PinId};

/// Decoder state. Discriminants index the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DecoderState {
    /// At rest between detents.
    Start = 0,
    /// Last code of a clockwise detent seen.
    CwFinal = 1,
    /// First code of a clockwise detent seen.
    CwBegin = 2,
    /// Middle code of a clockwise detent seen.
    CwNext = 3,
    /// First code of a counter-clockwise detent seen.
    CcwBegin = 4,
    /// Last code of a counter-clockwise detent seen.
    CcwFinal = 5,
    /// Middle code of a counter-clockwise detent seen.
    CcwNext = 6,
}

impl DecoderState {
    const ALL: [DecoderState; 7] = [
        DecoderState::Start,
        DecoderState::CwFinal,
        DecoderState::CwBegin,
        DecoderState::CwNext,
        DecoderState::CcwBegin,
        DecoderState::CcwFinal,
        DecoderState::CcwNext,
    ];

    #[inline]
    fn from_bits(bits: u8) -> Self {
        // The table never produces values outside 0..=6
        Self::ALL[(bits & STATE_MASK) as usize % 7]
    }
}

/// Direction reported for one input sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    /// No detent completed.
    NoChange,
    /// One clockwise detent completed.
    Clockwise,
    /// One counter-clockwise detent completed.
    CounterClockwise,
}

const STATE_MASK: u8 = 0x0F;
const DIR_CW: u8 = 0x10;
const DIR_CCW: u8 = 0x20;

const START: u8 = DecoderState::Start as u8;
const CW_FINAL: u8 = DecoderState::CwFinal as u8;
const CW_BEGIN: u8 = DecoderState::CwBegin as u8;
const CW_NEXT: u8 = DecoderState::CwNext as u8;
const CCW_BEGIN: u8 = DecoderState::CcwBegin as u8;
const CCW_FINAL: u8 = DecoderState::CcwFinal as u8;
const CCW_NEXT: u8 = DecoderState::CcwNext as u8;

/// Next state per `[state][sample]`, sample = `(B << 1) | A`.
const TRANSITIONS: [[u8; 4]; 7] = [
    // Start
    [START, CW_BEGIN, CCW_BEGIN, START],
    // CwFinal
    [CW_NEXT, START, CW_FINAL, START | DIR_CW],
    // CwBegin
    [CW_NEXT, CW_BEGIN, START, START],
    // CwNext
    [CW_NEXT, CW_BEGIN, CW_FINAL, START],
    // CcwBegin
    [CCW_NEXT, START, CCW_BEGIN, START],
    // CcwFinal
    [CCW_NEXT, CCW_FINAL, START, START | DIR_CCW],
    // CcwNext
    [CCW_NEXT, CCW_FINAL, CCW_BEGIN, START],
];

/// Quadrature decoder state, updated from the encoder's interrupt handler.
#[derive(Debug)]
pub struct QuadratureDecoder {
    state: AtomicU8,
}

impl Default for QuadratureDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadratureDecoder {
    /// Create a decoder at rest.
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(START),
        }
    }

    /// Feed one 2-bit pin sample (`(B << 1) | A`).
    ///
    /// Single writer: call only from the one handler serving this encoder.
    pub fn process(&self, sample: u8) -> Rotation {
        let current = self.state.load(Ordering::Acquire) & STATE_MASK;
        let next = TRANSITIONS[current as usize % 7][(sample & 0b11) as usize];
        self.state.store(next & STATE_MASK, Ordering::Release);

        match next & (DIR_CW | DIR_CCW) {
            DIR_CW => Rotation::Clockwise,
            DIR_CCW => Rotation::CounterClockwise,
            _ => Rotation::NoChange,
        }
    }

    /// Current state.
    pub fn state(&self) -> DecoderState {
        DecoderState::from_bits(self.state.load(Ordering::Acquire))
    }

    /// Return to `Start`.
    pub fn reset(&self) {
        self.state.store(START, Ordering::Release);
    }
}

/// Interrupt-side view of one configured encoder.
///
/// Completed detents accumulate in `pending` until the scheduler tick turns
/// them into a relative move.
#[derive(Debug)]
pub struct EncoderSlot {
    // [31] valid | [15:8] pin B | [7:0] pin A
    pins: AtomicU32,
    decoder: QuadratureDecoder,
    pending: AtomicI32,
}

const VALID: u32 = 1 << 31;

impl Default for EncoderSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderSlot {
    /// Create an empty slot.
    pub const fn new() -> Self {
        Self {
            pins: AtomicU32::new(0),
            decoder: QuadratureDecoder::new(),
            pending: AtomicI32::new(0),
        }
    }

    pub(crate) fn install(&self, config: &EncoderConfig) {
        self.pins.store(0, Ordering::Release);
        self.decoder.reset();
        self.pending.store(0, Ordering::Release);
        self.pins.store(
            VALID | ((config.pin_b as u32) << 8) | config.pin_a as u32,
            Ordering::Release,
        );
    }

    pub(crate) fn clear(&self) {
        self.pins.store(0, Ordering::Release);
        self.decoder.reset();
        self.pending.store(0, Ordering::Release);
    }

    /// Whether an encoder is installed in this slot.
    pub fn is_installed(&self) -> bool {
        self.pins.load(Ordering::Acquire) & VALID != 0
    }

    /// Phase pins `(A, B)`, if installed.
    pub fn pins(&self) -> Option<(PinId, PinId)> {
        let p = self.pins.load(Ordering::Acquire);
        (p & VALID != 0).then_some((p as u8, (p >> 8) as u8))
    }

    /// The slot's decoder.
    pub fn decoder(&self) -> &QuadratureDecoder {
        &self.decoder
    }

    /// Edge handler for either phase pin.
    ///
    /// Interrupt context: samples both pins, steps the decoder and counts
    /// completed detents (+1 clockwise, -1 counter-clockwise).
    pub fn on_edge<S: InputSampler>(&self, sampler: &mut S) {
        let p = self.pins.load(Ordering::Acquire);
        if p & VALID == 0 {
            return;
        }
        let a = sampler.is_high(p as u8) as u8;
        let b = sampler.is_high((p >> 8) as u8) as u8;

        match self.decoder.process((b << 1) | a) {
            Rotation::Clockwise => {
                self.pending.fetch_add(1, Ordering::AcqRel);
            }
            Rotation::CounterClockwise => {
                self.pending.fetch_sub(1, Ordering::AcqRel);
            }
            Rotation::NoChange => {}
        }
    }

    /// Consume the detents counted since the last call.
    pub(crate) fn take_detents(&self) -> i32 {
        self.pending.swap(0, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(decoder: &QuadratureDecoder, samples: &[u8]) -> (u32, u32) {
        let mut cw = 0;
        let mut ccw = 0;
        for &s in samples {
            match decoder.process(s) {
                Rotation::Clockwise => cw += 1,
                Rotation::CounterClockwise => ccw += 1,
                Rotation::NoChange => {}
            }
        }
        (cw, ccw)
    }

    #[test]
    fn test_clean_clockwise_detent() {
        let decoder = QuadratureDecoder::new();
        assert_eq!(feed(&decoder, &[0b01, 0b00, 0b10]), (0, 0));
        assert_eq!(decoder.state(), DecoderState::CwFinal);
        assert_eq!(decoder.process(0b11), Rotation::Clockwise);
        assert_eq!(decoder.state(), DecoderState::Start);
    }

    #[test]
    fn test_clean_counter_clockwise_detent() {
        let decoder = QuadratureDecoder::new();
        assert_eq!(feed(&decoder, &[0b10, 0b00, 0b01, 0b11]), (0, 1));
        assert_eq!(decoder.state(), DecoderState::Start);
    }

    #[test]
    fn test_half_turn_and_back_emits_nothing() {
        let decoder = QuadratureDecoder::new();
        assert_eq!(feed(&decoder, &[0b01, 0b00, 0b01, 0b11]), (0, 0));
        assert_eq!(decoder.state(), DecoderState::Start);
    }

    #[test]
    fn test_table_stays_within_states() {
        for row in TRANSITIONS.iter() {
            for &next in row.iter() {
                assert!((next & STATE_MASK) < 7);
            }
        }
    }

    #[test]
    fn test_only_two_entries_carry_direction() {
        let tagged: usize = TRANSITIONS
            .iter()
            .flat_map(|row| row.iter())
            .filter(|&&next| next & (DIR_CW | DIR_CCW) != 0)
            .count();
        assert_eq!(tagged, 2);
        assert_eq!(TRANSITIONS[CW_FINAL as usize][3], START | DIR_CW);
        assert_eq!(TRANSITIONS[CCW_FINAL as usize][3], START | DIR_CCW);
    }

    struct TwoPins {
        a: bool,
        b: bool,
    }

    impl InputSampler for TwoPins {
        fn is_high(&mut self, pin: PinId) -> bool {
            match pin {
                20 => self.a,
                21 => self.b,
                _ => false,
            }
        }
    }

    #[test]
    fn test_slot_counts_detents() {
        let slot = EncoderSlot::new();
        slot.install(&EncoderConfig::new("knob", 20, 21, 4, 0));
        assert_eq!(slot.pins(), Some((20, 21)));

        let mut pins = TwoPins { a: true, b: true };
        for (a, b) in [(true, false), (false, false), (false, true), (true, true)] {
            pins.a = a;
            pins.b = b;
            slot.on_edge(&mut pins);
        }
        assert_eq!(slot.take_detents(), 1);
        assert_eq!(slot.take_detents(), 0);

        slot.clear();
        assert!(!slot.is_installed());
        slot.on_edge(&mut pins);
        assert_eq!(slot.take_detents(), 0);
    }
}
