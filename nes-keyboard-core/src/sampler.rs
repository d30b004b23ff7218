//! NES controller sampling over a shared latch/clock bus.
//!
//! Both controllers share the latch and clock lines and each drives its own
//! serial data line. A sample:
//!
//! ```text
//! latch  ‾‾‾‾‾|________________________________________
//! clock  ‾‾‾‾‾‾‾‾‾‾|___|‾‾‾|___|‾‾‾ ... |___|‾‾‾
//! data        bit0     ^       ^           ^  (read while clock is low)
//! ```
//!
//! Data lines are active low: a pressed button pulls its line down.

use crate::types::ButtonMask;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// Bus timing in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SamplerTiming {
    /// How long latch and clock are held high to load the shift registers.
    pub latch_settle_us: u32,
    /// Half of one clock period; each bit waits this long before and after
    /// the data lines are read.
    pub half_period_us: u32,
}

impl SamplerTiming {
    /// 12 µs latch pulse, 6 µs half-periods.
    pub const DEFAULT: Self = Self {
        latch_settle_us: 12,
        half_period_us: 6,
    };
}

impl Default for SamplerTiming {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Reads two NES controllers through their 8-bit shift registers.
///
/// Pin errors are not surfaced. A data line that cannot be read counts as
/// released, and a failed write just produces one bad sample that the next
/// report cycle replaces.
pub struct ControllerSampler<L, C, DA, DB, D> {
    latch: L,
    clock: C,
    data_a: DA,
    data_b: DB,
    delay: D,
    timing: SamplerTiming,
}

impl<L, C, DA, DB, D> ControllerSampler<L, C, DA, DB, D>
where
    L: OutputPin,
    C: OutputPin,
    DA: InputPin,
    DB: InputPin,
    D: DelayNs,
{
    /// Create a sampler with [`SamplerTiming::DEFAULT`] and park the bus low.
    pub fn new(latch: L, clock: C, data_a: DA, data_b: DB, delay: D) -> Self {
        Self::with_timing(latch, clock, data_a, data_b, delay, SamplerTiming::DEFAULT)
    }

    /// Create a sampler with custom bus timing and park the bus low.
    pub fn with_timing(
        latch: L,
        clock: C,
        data_a: DA,
        data_b: DB,
        delay: D,
        timing: SamplerTiming,
    ) -> Self {
        let mut sampler = Self {
            latch,
            clock,
            data_a,
            data_b,
            delay,
            timing,
        };
        sampler.park();
        sampler
    }

    /// Drive latch and clock low.
    pub fn park(&mut self) {
        let _ = self.latch.set_low();
        let _ = self.clock.set_low();
    }

    /// Clock eight bits out of both controllers.
    ///
    /// Returns `(pad_a, pad_b)`. A mask with every bit set is reported as
    /// empty, since that is what an unplugged port reads as.
    pub fn sample(&mut self) -> (ButtonMask, ButtonMask) {
        let mut pad_a = ButtonMask::NONE;
        let mut pad_b = ButtonMask::NONE;

        // Load both registers; first bit is valid once latch drops.
        let _ = self.latch.set_high();
        let _ = self.clock.set_high();
        self.delay.delay_us(self.timing.latch_settle_us);
        let _ = self.latch.set_low();

        for bit in 0..8 {
            let button = ButtonMask(1 << bit);

            let _ = self.clock.set_low();
            self.delay.delay_us(self.timing.half_period_us);

            pad_a.set(button, is_pulled_low(&mut self.data_a));
            pad_b.set(button, is_pulled_low(&mut self.data_b));

            self.delay.delay_us(self.timing.half_period_us);
            let _ = self.clock.set_high();
        }

        (pad_a.or_disconnected(), pad_b.or_disconnected())
    }

    /// Current bus timing.
    #[inline]
    #[must_use]
    pub fn timing(&self) -> SamplerTiming {
        self.timing
    }

    /// Give the pins and delay back.
    pub fn release(self) -> (L, C, DA, DB, D) {
        (self.latch, self.clock, self.data_a, self.data_b, self.delay)
    }
}

#[inline]
fn is_pulled_low<P: InputPin>(pin: &mut P) -> bool {
    pin.is_low().unwrap_or(false)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::cell::RefCell;
    use core::convert::Infallible;
    use embedded_hal::digital::{Error, ErrorKind, ErrorType};
    use std::rc::Rc;
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum BusEvent {
        Latch(bool),
        Clock(bool),
        Delay(u32),
        Read(usize),
    }

    /// Two 4021 shift registers on a shared latch/clock bus.
    struct MockBus {
        pressed: [u8; 2],
        /// Port is empty: the data line floats low.
        unplugged: [bool; 2],
        latch: bool,
        clock: bool,
        index: usize,
        events: Vec<BusEvent>,
    }

    impl MockBus {
        fn new(pad_a: u8, pad_b: u8) -> Rc<RefCell<Self>> {
            Rc::new(RefCell::new(Self {
                pressed: [pad_a, pad_b],
                unplugged: [false; 2],
                latch: false,
                clock: false,
                index: 0,
                events: Vec::new(),
            }))
        }

        fn set_latch(&mut self, high: bool) {
            self.latch = high;
            if high {
                self.index = 0;
            }
            self.events.push(BusEvent::Latch(high));
        }

        fn set_clock(&mut self, high: bool) {
            // Rising edge shifts the next bit out while latch is low
            if high && !self.clock && !self.latch {
                self.index += 1;
            }
            self.clock = high;
            self.events.push(BusEvent::Clock(high));
        }

        fn line_is_high(&mut self, pad: usize) -> bool {
            self.events.push(BusEvent::Read(self.index));
            if self.unplugged[pad] {
                return false;
            }
            // Past the eighth bit the register shifts in ones
            self.index >= 8 || self.pressed[pad] & (1 << self.index) == 0
        }
    }

    struct LatchPin(Rc<RefCell<MockBus>>);
    struct ClockPin(Rc<RefCell<MockBus>>);
    struct DataPin(Rc<RefCell<MockBus>>, usize);
    struct MockDelay(Rc<RefCell<MockBus>>);

    impl ErrorType for LatchPin {
        type Error = Infallible;
    }

    impl OutputPin for LatchPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.0.borrow_mut().set_latch(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.0.borrow_mut().set_latch(true);
            Ok(())
        }
    }

    impl ErrorType for ClockPin {
        type Error = Infallible;
    }

    impl OutputPin for ClockPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.0.borrow_mut().set_clock(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.0.borrow_mut().set_clock(true);
            Ok(())
        }
    }

    impl ErrorType for DataPin {
        type Error = Infallible;
    }

    impl InputPin for DataPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.0.borrow_mut().line_is_high(self.1))
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.0.borrow_mut().line_is_high(self.1))
        }
    }

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.0.borrow_mut().events.push(BusEvent::Delay(ns / 1_000));
        }

        fn delay_us(&mut self, us: u32) {
            self.0.borrow_mut().events.push(BusEvent::Delay(us));
        }
    }

    #[derive(Debug)]
    struct ReadFault;

    impl Error for ReadFault {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    struct BrokenPin;

    impl ErrorType for BrokenPin {
        type Error = ReadFault;
    }

    impl InputPin for BrokenPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Err(ReadFault)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Err(ReadFault)
        }
    }

    type MockSampler = ControllerSampler<LatchPin, ClockPin, DataPin, DataPin, MockDelay>;

    fn sampler_for(bus: &Rc<RefCell<MockBus>>) -> MockSampler {
        ControllerSampler::new(
            LatchPin(bus.clone()),
            ClockPin(bus.clone()),
            DataPin(bus.clone(), 0),
            DataPin(bus.clone(), 1),
            MockDelay(bus.clone()),
        )
    }

    #[test]
    fn test_sample_reads_both_pads() {
        let bus = MockBus::new(0x11, 0x82);
        let mut sampler = sampler_for(&bus);

        let (pad_a, pad_b) = sampler.sample();
        assert_eq!(pad_a, ButtonMask::A | ButtonMask::UP);
        assert_eq!(pad_b, ButtonMask::B | ButtonMask::RIGHT);
    }

    #[test]
    fn test_mask_is_inverted_line_levels() {
        for pattern in 0..0xFFu8 {
            let bus = MockBus::new(pattern, pattern.reverse_bits());
            let mut sampler = sampler_for(&bus);

            let (pad_a, pad_b) = sampler.sample();
            assert_eq!(pad_a.raw(), pattern);
            assert_eq!(pad_b.raw(), pattern.reverse_bits());
        }
    }

    #[test]
    fn test_all_pressed_reads_as_empty() {
        let bus = MockBus::new(0xFF, ButtonMask::START.raw());
        let mut sampler = sampler_for(&bus);

        let (pad_a, pad_b) = sampler.sample();
        assert_eq!(pad_a, ButtonMask::NONE);
        assert_eq!(pad_b, ButtonMask::START);
    }

    #[test]
    fn test_unplugged_port_reads_as_empty() {
        let bus = MockBus::new(0x00, 0x08);
        bus.borrow_mut().unplugged[0] = true;
        let mut sampler = sampler_for(&bus);

        let (pad_a, pad_b) = sampler.sample();
        assert_eq!(pad_a, ButtonMask::NONE);
        assert_eq!(pad_b, ButtonMask::START);
    }

    #[test]
    fn test_bus_sequence() {
        let bus = MockBus::new(0, 0);
        let mut sampler = sampler_for(&bus);
        bus.borrow_mut().events.clear();

        sampler.sample();

        let events = bus.borrow().events.clone();
        assert_eq!(
            &events[..4],
            &[
                BusEvent::Latch(true),
                BusEvent::Clock(true),
                BusEvent::Delay(12),
                BusEvent::Latch(false),
            ]
        );

        // Every bit: clock low, wait, read both lines, wait, clock high
        for (bit, chunk) in events[4..].chunks(6).enumerate() {
            assert_eq!(
                chunk,
                &[
                    BusEvent::Clock(false),
                    BusEvent::Delay(6),
                    BusEvent::Read(bit),
                    BusEvent::Read(bit),
                    BusEvent::Delay(6),
                    BusEvent::Clock(true),
                ]
            );
        }
        assert_eq!(events.len(), 4 + 8 * 6);
    }

    #[test]
    fn test_custom_timing() {
        let bus = MockBus::new(0, 0);
        let timing = SamplerTiming {
            latch_settle_us: 20,
            half_period_us: 3,
        };
        let mut sampler = ControllerSampler::with_timing(
            LatchPin(bus.clone()),
            ClockPin(bus.clone()),
            DataPin(bus.clone(), 0),
            DataPin(bus.clone(), 1),
            MockDelay(bus.clone()),
            timing,
        );
        assert_eq!(sampler.timing(), timing);

        sampler.sample();

        let total: u32 = bus
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                BusEvent::Delay(us) => Some(*us),
                _ => None,
            })
            .sum();
        assert_eq!(total, 20 + 8 * 2 * 3);
    }

    #[test]
    fn test_new_parks_bus_low() {
        let bus = MockBus::new(0, 0);
        let _sampler = sampler_for(&bus);

        let bus = bus.borrow();
        assert!(!bus.latch);
        assert!(!bus.clock);
    }

    #[test]
    fn test_read_fault_counts_as_released() {
        let bus = MockBus::new(0x24, 0);
        let mut sampler = ControllerSampler::new(
            LatchPin(bus.clone()),
            ClockPin(bus.clone()),
            DataPin(bus.clone(), 0),
            BrokenPin,
            MockDelay(bus.clone()),
        );

        let (pad_a, pad_b) = sampler.sample();
        assert_eq!(pad_a.raw(), 0x24);
        assert_eq!(pad_b, ButtonMask::NONE);
    }
}
