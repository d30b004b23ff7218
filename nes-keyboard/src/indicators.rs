//! Board indicator LEDs.

use embassy_rp::gpio::{Level, Output};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use nes_keyboard_core::{Indicators, LedSink};

/// Latest indicator pattern requested by the USB stack or the host.
pub type IndicatorSignal = Signal<CriticalSectionRawMutex, Indicators>;

/// [`LedSink`] that forwards patterns to the indicator task.
///
/// Cheap to copy, so the control handler and the LED OUT task can each own
/// one.
#[derive(Clone, Copy)]
pub struct SignalLeds {
    signal: &'static IndicatorSignal,
}

impl SignalLeds {
    pub fn new(signal: &'static IndicatorSignal) -> Self {
        Self { signal }
    }
}

impl LedSink for SignalLeds {
    fn set_indicators(&mut self, indicators: Indicators) {
        self.signal.signal(indicators);
    }
}

/// The four indicator pins, LED1 first.
pub struct IndicatorPins {
    pins: [Output<'static>; 4],
}

impl IndicatorPins {
    pub fn new(pins: [Output<'static>; 4]) -> Self {
        Self { pins }
    }
}

impl LedSink for IndicatorPins {
    fn set_indicators(&mut self, indicators: Indicators) {
        for (n, pin) in self.pins.iter_mut().enumerate() {
            pin.set_level(Level::from(indicators.is_lit(n)));
        }
    }
}
