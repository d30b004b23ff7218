//! Key source trait and the NES controller implementation.

use crate::keymap::{KeyMapping, DEFAULT_KEYMAP};
use crate::sampler::ControllerSampler;
use crate::types::KeyReport;
use core::cell::RefCell;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// Source of fresh keyboard reports.
///
/// Every call reads the hardware again; there is no cached report. Used both
/// by the periodic report cycle and by GET_REPORT.
pub trait KeySource {
    /// Sample the inputs and build the report for this instant.
    fn scan(&mut self) -> KeyReport;
}

impl<T: KeySource + ?Sized> KeySource for &mut T {
    fn scan(&mut self) -> KeyReport {
        (**self).scan()
    }
}

/// A [`KeySource`] behind a blocking mutex, shared by several users.
///
/// The lock is held for the whole scan. Pick a raw mutex that does not mask
/// interrupts when every user runs in thread mode.
pub struct SharedKeys<'a, M: RawMutex, K> {
    inner: &'a Mutex<M, RefCell<K>>,
}

impl<'a, M: RawMutex, K> SharedKeys<'a, M, K> {
    pub fn new(inner: &'a Mutex<M, RefCell<K>>) -> Self {
        Self { inner }
    }
}

impl<M: RawMutex, K> Clone for SharedKeys<'_, M, K> {
    fn clone(&self) -> Self {
        Self { inner: self.inner }
    }
}

impl<M: RawMutex, K: KeySource> KeySource for SharedKeys<'_, M, K> {
    fn scan(&mut self) -> KeyReport {
        self.inner.lock(|keys| keys.borrow_mut().scan())
    }
}

/// Two NES controllers plus the on-board auxiliary button.
///
/// The auxiliary button is wired active low like the controller data lines.
pub struct NesKeyboard<L, C, DA, DB, D, X> {
    sampler: ControllerSampler<L, C, DA, DB, D>,
    aux: X,
    mapping: KeyMapping,
}

impl<L, C, DA, DB, D, X> NesKeyboard<L, C, DA, DB, D, X>
where
    L: OutputPin,
    C: OutputPin,
    DA: InputPin,
    DB: InputPin,
    D: DelayNs,
    X: InputPin,
{
    /// Create a keyboard with [`DEFAULT_KEYMAP`].
    #[must_use]
    pub fn new(sampler: ControllerSampler<L, C, DA, DB, D>, aux: X) -> Self {
        Self::with_mapping(sampler, aux, DEFAULT_KEYMAP)
    }

    /// Create a keyboard with a custom key mapping.
    #[must_use]
    pub fn with_mapping(
        sampler: ControllerSampler<L, C, DA, DB, D>,
        aux: X,
        mapping: KeyMapping,
    ) -> Self {
        Self {
            sampler,
            aux,
            mapping,
        }
    }

    /// Active key mapping.
    #[inline]
    #[must_use]
    pub fn mapping(&self) -> &KeyMapping {
        &self.mapping
    }
}

impl<L, C, DA, DB, D, X> KeySource for NesKeyboard<L, C, DA, DB, D, X>
where
    L: OutputPin,
    C: OutputPin,
    DA: InputPin,
    DB: InputPin,
    D: DelayNs,
    X: InputPin,
{
    fn scan(&mut self) -> KeyReport {
        let aux_pressed = self.aux.is_low().unwrap_or(false);
        let (pad_a, pad_b) = self.sampler.sample();
        let keys = self.mapping.map(pad_a, pad_b, aux_pressed);
        KeyReport::from_keys(&keys)
    }
}
