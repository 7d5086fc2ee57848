//! Interrupt-fed switch status register.
//!
//! Task context installs one descriptor per configured switch. Interrupt
//! handlers scan the descriptors of their category, sample the pins and
//! update the packed registers. Every shared field is a single atomic word
//! with one writer per bit, so readers see either the old or the new value.

#![allow(clippy::declare_interior_mutable_const)]

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use crate::config::{Polarity, SwitchCategory, SwitchConfig, MAX_SWITCHES, STATUS_REGISTER_WORDS};
use crate::error::HardwareError;
use crate::hal::{Board, InputSampler, IrqSource, PinId};

/// One switch as seen from interrupt context, packed into a single word.
///
/// `[31] valid | [18] active-low | [17:16] category | [15:8] stepper | [7:0] pin`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SwitchDescriptor(u32);

impl SwitchDescriptor {
    const VALID: u32 = 1 << 31;
    const ACTIVE_LOW: u32 = 1 << 18;
    const CATEGORY_SHIFT: u32 = 16;
    const STEPPER_SHIFT: u32 = 8;
    const NO_STEPPER: u8 = u8::MAX;

    fn new(config: &SwitchConfig) -> Self {
        let category = match config.category {
            SwitchCategory::HomingBegin => 0,
            SwitchCategory::HomingEnd => 1,
            SwitchCategory::GeneralPosition => 2,
            SwitchCategory::EmergencyStop => 3,
        };
        let polarity = match config.polarity {
            Polarity::ActiveHigh => 0,
            Polarity::ActiveLow => Self::ACTIVE_LOW,
        };
        let stepper = config.stepper.unwrap_or(Self::NO_STEPPER) as u32;

        Self(
            Self::VALID
                | polarity
                | (category << Self::CATEGORY_SHIFT)
                | (stepper << Self::STEPPER_SHIFT)
                | config.pin as u32,
        )
    }

    #[inline]
    fn is_valid(self) -> bool {
        self.0 & Self::VALID != 0
    }

    #[inline]
    fn pin(self) -> PinId {
        self.0 as u8
    }

    #[inline]
    fn polarity(self) -> Polarity {
        if self.0 & Self::ACTIVE_LOW != 0 {
            Polarity::ActiveLow
        } else {
            Polarity::ActiveHigh
        }
    }

    #[inline]
    fn category(self) -> SwitchCategory {
        match (self.0 >> Self::CATEGORY_SHIFT) & 0b11 {
            0 => SwitchCategory::HomingBegin,
            1 => SwitchCategory::HomingEnd,
            2 => SwitchCategory::GeneralPosition,
            _ => SwitchCategory::EmergencyStop,
        }
    }

    #[inline]
    fn stepper(self) -> Option<u8> {
        match (self.0 >> Self::STEPPER_SHIFT) as u8 {
            Self::NO_STEPPER => None,
            id => Some(id),
        }
    }
}

const EMPTY_SLOT: AtomicU32 = AtomicU32::new(0);
const ZERO_WORD: AtomicU8 = AtomicU8::new(0);

/// Packed status register of all configured switches.
///
/// Bit `id % 8` of word `id / 8` belongs to switch `id`.
pub struct SwitchEventRegistry {
    slots: [AtomicU32; MAX_SWITCHES],
    logical: [AtomicU8; STATUS_REGISTER_WORDS],
    raw: [AtomicU8; STATUS_REGISTER_WORDS],
    rising: [AtomicU8; STATUS_REGISTER_WORDS],
    changed: [AtomicU8; STATUS_REGISTER_WORDS],
    update_available: AtomicBool,
}

impl Default for SwitchEventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SwitchEventRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            slots: [EMPTY_SLOT; MAX_SWITCHES],
            logical: [ZERO_WORD; STATUS_REGISTER_WORDS],
            raw: [ZERO_WORD; STATUS_REGISTER_WORDS],
            rising: [ZERO_WORD; STATUS_REGISTER_WORDS],
            changed: [ZERO_WORD; STATUS_REGISTER_WORDS],
            update_available: AtomicBool::new(false),
        }
    }

    /// Install the switch descriptor and register its interrupt.
    ///
    /// The descriptor stays installed even if the board refuses the
    /// interrupt; the switch then only updates on explicit sampling.
    pub(crate) fn attach<B: Board>(
        &self,
        board: &mut B,
        id: u8,
        config: &SwitchConfig,
    ) -> Result<(), HardwareError> {
        self.clear_bits(id);
        self.slots[id as usize].store(SwitchDescriptor::new(config).0, Ordering::Release);
        board.attach_interrupt(config.pin, config.category.irq_source())
    }

    /// Replace the descriptor of an attached switch without touching its
    /// interrupt registration.
    ///
    /// The logical bit is recomputed from the last raw pin level under the new
    /// polarity. A flip is reported as a change but never as a rising edge, so
    /// macros only run on a physical activation.
    pub(crate) fn refresh(&self, id: u8, config: &SwitchConfig) {
        let d = SwitchDescriptor::new(config);
        self.slots[id as usize].store(d.0, Ordering::Release);

        let (word, mask) = Self::position(id);
        let active = d.polarity().is_active(self.raw_level(id));
        let previous = if active {
            self.logical[word].fetch_or(mask, Ordering::AcqRel)
        } else {
            self.logical[word].fetch_and(!mask, Ordering::AcqRel)
        };
        if (previous & mask != 0) != active {
            self.changed[word].fetch_or(mask, Ordering::AcqRel);
            self.update_available.store(true, Ordering::Release);
        }
    }

    /// Remove the interrupt registration and descriptor of a switch.
    pub(crate) fn detach<B: Board>(&self, board: &mut B, id: u8, pin: PinId) {
        board.detach_interrupt(pin);
        self.slots[id as usize].store(0, Ordering::Release);
        self.clear_bits(id);
    }

    /// Remove every interrupt registration and descriptor.
    pub(crate) fn detach_all<B: Board>(&self, board: &mut B) {
        for id in 0..MAX_SWITCHES {
            let d = SwitchDescriptor(self.slots[id].load(Ordering::Acquire));
            if d.is_valid() {
                self.detach(board, id as u8, d.pin());
            }
        }
    }

    fn clear_bits(&self, id: u8) {
        let (word, mask) = Self::position(id);
        self.logical[word].fetch_and(!mask, Ordering::AcqRel);
        self.raw[word].fetch_and(!mask, Ordering::AcqRel);
        self.rising[word].fetch_and(!mask, Ordering::AcqRel);
        self.changed[word].fetch_and(!mask, Ordering::AcqRel);
    }

    #[inline]
    const fn position(id: u8) -> (usize, u8) {
        ((id / 8) as usize, 1 << (id % 8))
    }

    /// Edge handler for the homing/limit and general entry points.
    ///
    /// Interrupt context: no allocation, no blocking, no floating point.
    pub fn on_edge<S: InputSampler>(&self, source: IrqSource, sampler: &mut S) {
        self.sample_source(source, sampler, |_, _| {});
    }

    /// Sample every installed switch regardless of category.
    ///
    /// Used at start-up so the register reflects the pins before the first edge.
    pub fn sample_all<S: InputSampler>(&self, sampler: &mut S) {
        for id in 0..MAX_SWITCHES {
            let d = SwitchDescriptor(self.slots[id].load(Ordering::Acquire));
            if d.is_valid() {
                let high = sampler.is_high(d.pin());
                self.record(id as u8, d, high);
            }
        }
    }

    /// Scan every slot of one category, calling `on_sample(stepper, active)`
    /// after each switch is recorded. Always scans the full capacity.
    pub(crate) fn sample_source<S, F>(&self, source: IrqSource, sampler: &mut S, mut on_sample: F)
    where
        S: InputSampler,
        F: FnMut(Option<u8>, bool),
    {
        for id in 0..MAX_SWITCHES {
            let d = SwitchDescriptor(self.slots[id].load(Ordering::Acquire));
            if !d.is_valid() || d.category().irq_source() != source {
                continue;
            }
            let high = sampler.is_high(d.pin());
            let active = self.record(id as u8, d, high);
            on_sample(d.stepper(), active);
        }
    }

    fn record(&self, id: u8, d: SwitchDescriptor, high: bool) -> bool {
        let (word, mask) = Self::position(id);

        if high {
            self.raw[word].fetch_or(mask, Ordering::AcqRel);
        } else {
            self.raw[word].fetch_and(!mask, Ordering::AcqRel);
        }

        let active = d.polarity().is_active(high);
        let previous = if active {
            self.logical[word].fetch_or(mask, Ordering::AcqRel)
        } else {
            self.logical[word].fetch_and(!mask, Ordering::AcqRel)
        };

        if (previous & mask != 0) != active {
            self.changed[word].fetch_or(mask, Ordering::AcqRel);
            if active {
                self.rising[word].fetch_or(mask, Ordering::AcqRel);
            }
        }

        self.update_available.store(true, Ordering::Release);
        active
    }

    /// Logical status word `index`, or `None` past the last word.
    pub fn register_word(&self, index: usize) -> Option<u8> {
        self.logical.get(index).map(|w| w.load(Ordering::Acquire))
    }

    /// Raw pin-level word `index`, or `None` past the last word.
    pub fn raw_register_word(&self, index: usize) -> Option<u8> {
        self.raw.get(index).map(|w| w.load(Ordering::Acquire))
    }

    /// Whether switch `id` was active at its last sample.
    pub fn is_active(&self, id: u8) -> bool {
        Self::read_bit(&self.logical, id)
    }

    /// Whether switch `id`'s pin was high at its last sample.
    pub fn raw_level(&self, id: u8) -> bool {
        Self::read_bit(&self.raw, id)
    }

    fn read_bit(words: &[AtomicU8; STATUS_REGISTER_WORDS], id: u8) -> bool {
        let (word, mask) = Self::position(id);
        words
            .get(word)
            .map(|w| w.load(Ordering::Acquire) & mask != 0)
            .unwrap_or(false)
    }

    /// Consume the "update available" flag.
    pub fn take_update(&self) -> bool {
        self.update_available.swap(false, Ordering::AcqRel)
    }

    /// Consume the inactive-to-active transition bits.
    pub(crate) fn take_rising(&self) -> [u8; STATUS_REGISTER_WORDS] {
        Self::drain(&self.rising)
    }

    /// Consume the any-transition bits.
    pub(crate) fn take_changed(&self) -> [u8; STATUS_REGISTER_WORDS] {
        Self::drain(&self.changed)
    }

    fn drain(words: &[AtomicU8; STATUS_REGISTER_WORDS]) -> [u8; STATUS_REGISTER_WORDS] {
        let mut out = [0u8; STATUS_REGISTER_WORDS];
        for (o, w) in out.iter_mut().zip(words.iter()) {
            *o = w.swap(0, Ordering::AcqRel);
        }
        out
    }
}

/// Iterate the switch IDs whose bits are set, in ascending order.
pub(crate) fn set_bits(words: &[u8; STATUS_REGISTER_WORDS]) -> impl Iterator<Item = u8> + '_ {
    words.iter().enumerate().flat_map(|(w, &bits)| {
        (0..8u8).filter(move |b| bits & (1u8 << *b) != 0).map(move |b| (w as u8) * 8 + b)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SwitchType;

    struct Pins([bool; 64]);

    impl InputSampler for Pins {
        fn is_high(&mut self, pin: PinId) -> bool {
            self.0.get(pin as usize).copied().unwrap_or(false)
        }
    }

    fn install(registry: &SwitchEventRegistry, id: u8, pin: PinId, t: SwitchType) {
        let config = SwitchConfig::new("sw", pin, t, Some(0));
        registry.slots[id as usize].store(SwitchDescriptor::new(&config).0, Ordering::Release);
    }

    #[test]
    fn test_descriptor_fields() {
        let mut config = SwitchConfig::new(
            "home",
            33,
            SwitchType::new(Polarity::ActiveLow, SwitchCategory::HomingEnd),
            Some(7),
        );
        let d = SwitchDescriptor::new(&config);
        assert!(d.is_valid());
        assert_eq!(d.pin(), 33);
        assert_eq!(d.polarity(), Polarity::ActiveLow);
        assert_eq!(d.category(), SwitchCategory::HomingEnd);
        assert_eq!(d.stepper(), Some(7));

        config.stepper = None;
        assert_eq!(SwitchDescriptor::new(&config).stepper(), None);
    }

    #[test]
    fn test_active_low_raw_and_logical() {
        let registry = SwitchEventRegistry::new();
        install(
            &registry,
            11,
            9,
            SwitchType::new(Polarity::ActiveLow, SwitchCategory::GeneralPosition),
        );
        let mut pins = Pins([false; 64]);

        pins.0[9] = true;
        registry.on_edge(IrqSource::General, &mut pins);
        assert_eq!(registry.raw_register_word(1), Some(0b0000_1000));
        assert!(!registry.is_active(11));

        pins.0[9] = false;
        registry.on_edge(IrqSource::General, &mut pins);
        assert_eq!(registry.raw_register_word(1), Some(0));
        assert!(registry.is_active(11));
        assert_eq!(registry.register_word(1), Some(0b0000_1000));
    }

    #[test]
    fn test_edge_only_scans_its_category() {
        let registry = SwitchEventRegistry::new();
        install(&registry, 0, 1, SwitchType::new(Polarity::ActiveHigh, SwitchCategory::HomingBegin));
        install(&registry, 1, 2, SwitchType::new(Polarity::ActiveHigh, SwitchCategory::GeneralPosition));
        let mut pins = Pins([true; 64]);

        registry.on_edge(IrqSource::Limit, &mut pins);
        assert!(registry.is_active(0));
        assert!(!registry.is_active(1));
    }

    #[test]
    fn test_rising_and_update_flags() {
        let registry = SwitchEventRegistry::new();
        install(&registry, 3, 4, SwitchType::new(Polarity::ActiveHigh, SwitchCategory::GeneralPosition));
        let mut pins = Pins([false; 64]);

        assert!(!registry.take_update());
        pins.0[4] = true;
        registry.on_edge(IrqSource::General, &mut pins);
        assert!(registry.take_update());
        assert!(!registry.take_update());

        let rising = registry.take_rising();
        assert_eq!(set_bits(&rising).collect::<heapless::Vec<u8, 8>>().as_slice(), &[3]);
        assert_eq!(registry.take_rising(), [0; STATUS_REGISTER_WORDS]);

        // Repeated edge with the same level is not a transition
        registry.on_edge(IrqSource::General, &mut pins);
        assert_eq!(registry.take_changed()[0], 0b0000_1000);
        assert_eq!(registry.take_changed()[0], 0);
        assert_eq!(registry.take_rising()[0], 0);
    }

    #[test]
    fn test_refresh_reapplies_polarity() {
        let registry = SwitchEventRegistry::new();
        install(&registry, 5, 4, SwitchType::new(Polarity::ActiveHigh, SwitchCategory::GeneralPosition));
        let mut pins = Pins([false; 64]);
        pins.0[4] = true;
        registry.on_edge(IrqSource::General, &mut pins);
        assert!(registry.is_active(5));
        registry.take_changed();
        registry.take_rising();
        registry.take_update();

        let config = SwitchConfig::new(
            "sw",
            4,
            SwitchType::new(Polarity::ActiveLow, SwitchCategory::GeneralPosition),
            Some(0),
        );
        registry.refresh(5, &config);
        assert!(registry.raw_level(5));
        assert!(!registry.is_active(5));
        assert_eq!(registry.register_word(0), Some(0));
        assert!(registry.take_update());
        assert_eq!(registry.take_changed()[0], 0b0010_0000);
        assert_eq!(registry.take_rising()[0], 0);

        // Same polarity again: nothing changes
        registry.refresh(5, &config);
        assert!(!registry.take_update());
        assert_eq!(registry.take_changed()[0], 0);
    }

    #[test]
    fn test_set_bits_ascending() {
        let mut words = [0u8; STATUS_REGISTER_WORDS];
        words[0] = 0b1000_0001;
        words[2] = 0b0000_0100;
        let ids: heapless::Vec<u8, 8> = set_bits(&words).collect();
        assert_eq!(ids.as_slice(), &[0, 7, 18]);
    }
}
