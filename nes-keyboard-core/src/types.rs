//! Core keyboard types: ButtonMask, KeyList, KeyReport, ProtocolMode.

use core::ops::{BitAnd, BitOr, BitOrAssign, Not};
use heapless::Vec;

/// Maximum number of simultaneous key codes in a boot keyboard report.
pub const MAX_KEYS: usize = 6;

/// Button state of one NES controller as a bitfield.
///
/// Bit `i` is the `i`-th bit clocked out of the controller's shift register,
/// so the constants follow the hardware order: A, B, Select, Start, Up, Down,
/// Left, Right.
///
/// # Example
///
/// ```
/// use nes_keyboard_core::ButtonMask;
///
/// let buttons = ButtonMask::A | ButtonMask::START;
/// assert!(buttons.contains(ButtonMask::A));
/// assert!(!buttons.contains(ButtonMask::B));
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonMask(pub u8);

impl ButtonMask {
    pub const A: Self = Self(1 << 0);
    pub const B: Self = Self(1 << 1);
    pub const SELECT: Self = Self(1 << 2);
    pub const START: Self = Self(1 << 3);
    pub const UP: Self = Self(1 << 4);
    pub const DOWN: Self = Self(1 << 5);
    pub const LEFT: Self = Self(1 << 6);
    pub const RIGHT: Self = Self(1 << 7);

    /// No buttons pressed.
    pub const NONE: Self = Self(0);

    /// Every line reads low, which is what an unplugged port looks like.
    pub const DISCONNECTED: Self = Self(0xFF);

    /// Check if the given button(s) are pressed.
    #[inline]
    #[must_use]
    pub const fn contains(self, button: ButtonMask) -> bool {
        (self.0 & button.0) == button.0
    }

    /// Check if the button at bit position `bit` is pressed.
    #[inline]
    #[must_use]
    pub const fn is_bit_set(self, bit: usize) -> bool {
        bit < 8 && (self.0 >> bit) & 1 != 0
    }

    /// Set or clear button(s).
    #[inline]
    pub fn set(&mut self, button: ButtonMask, pressed: bool) {
        if pressed {
            self.0 |= button.0;
        } else {
            self.0 &= !button.0;
        }
    }

    /// Replace the all-pressed pattern with an empty mask.
    ///
    /// A controller can't physically report all eight buttons at once through
    /// the pull-ups, so 0xFF means the port is empty.
    #[inline]
    #[must_use]
    pub const fn or_disconnected(self) -> Self {
        if self.0 == Self::DISCONNECTED.0 {
            Self::NONE
        } else {
            self
        }
    }

    /// Get the raw u8 value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Check if no buttons are pressed.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ButtonMask {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ButtonMask {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ButtonMask {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl Not for ButtonMask {
    type Output = Self;

    #[inline]
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

/// Ordered list of at most [`MAX_KEYS`] key codes.
///
/// # Truncation
///
/// The boot keyboard report has six key slots. Codes pushed after the list is
/// full are dropped, not queued: the seventh and later presses of a cycle are
/// simply not reported. [`KeyList::push`] returns `false` when that happens.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct KeyList(Vec<u8, MAX_KEYS>);

impl KeyList {
    /// Create an empty key list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a key code, dropping it if the list is already full.
    ///
    /// Returns `true` if the code was kept.
    #[inline]
    pub fn push(&mut self, code: u8) -> bool {
        self.0.push(code).is_ok()
    }

    /// Number of key codes in the list.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.0.is_full()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for KeyList {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=[u8]:x}", self.as_slice())
    }
}

/// HID boot keyboard report.
///
/// Total size: 8 bytes (modifier, reserved, six key codes). Unused key slots
/// are zero.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(C)]
pub struct KeyReport {
    /// Modifier bitfield (always zero, the bridge maps no modifiers)
    pub modifier: u8,
    /// Reserved byte
    pub reserved: u8,
    /// Key codes in press order, zero padded
    pub keycodes: [u8; MAX_KEYS],
}

impl KeyReport {
    /// Size of the report in bytes.
    pub const SIZE: usize = 8;

    /// Report with no keys pressed.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            modifier: 0,
            reserved: 0,
            keycodes: [0; MAX_KEYS],
        }
    }

    /// Build a report from a key list.
    ///
    /// Modifier and reserved bytes are zero; the key codes are copied in
    /// order and the remaining slots are left zero.
    #[must_use]
    pub fn from_keys(keys: &KeyList) -> Self {
        let mut report = Self::empty();
        for (slot, code) in report.keycodes.iter_mut().zip(keys.as_slice()) {
            *slot = *code;
        }
        report
    }

    /// Number of non-empty key slots.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.keycodes.iter().filter(|&&code| code != 0).count()
    }

    /// Convert the report to its wire format.
    #[must_use]
    pub fn as_bytes(&self) -> [u8; Self::SIZE] {
        let k = &self.keycodes;
        [
            self.modifier,
            self.reserved,
            k[0],
            k[1],
            k[2],
            k[3],
            k[4],
            k[5],
        ]
    }
}

/// HID protocol selected by the host.
///
/// Only tracked so the host can read back what it set; the report layout is
/// the boot layout in both modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ProtocolMode {
    Boot = 0,
    #[default]
    Report = 1,
}

impl ProtocolMode {
    /// Decode a SET_PROTOCOL `wValue`: any non-zero value selects Report.
    #[inline]
    #[must_use]
    pub const fn from_w_value(value: u16) -> Self {
        if value != 0 {
            Self::Report
        } else {
            Self::Boot
        }
    }

    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        Self::from_w_value(raw as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_mask_bitwise_or() {
        let buttons = ButtonMask::A | ButtonMask::UP;
        assert_eq!(buttons.raw(), 0x11);
        assert!(buttons.contains(ButtonMask::A));
        assert!(buttons.contains(ButtonMask::UP));
        assert!(!buttons.contains(ButtonMask::B));
    }

    #[test]
    fn test_button_mask_set_clear() {
        let mut buttons = ButtonMask::NONE;
        buttons.set(ButtonMask::SELECT, true);
        assert!(buttons.is_bit_set(2));
        buttons.set(ButtonMask::SELECT, false);
        assert!(buttons.is_empty());
    }

    #[test]
    fn test_disconnected_mask_is_cleared() {
        assert_eq!(ButtonMask(0xFF).or_disconnected(), ButtonMask::NONE);
        assert_eq!(ButtonMask(0xFE).or_disconnected(), ButtonMask(0xFE));
        assert_eq!(ButtonMask::NONE.or_disconnected(), ButtonMask::NONE);
    }

    #[test]
    fn test_key_list_drops_past_capacity() {
        let mut keys = KeyList::new();
        for code in 1..=MAX_KEYS as u8 {
            assert!(keys.push(code));
        }
        assert!(keys.is_full());
        assert!(!keys.push(0x42));
        assert_eq!(keys.as_slice(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_report_from_keys_pads_with_zero() {
        let mut keys = KeyList::new();
        keys.push(0x1B);
        keys.push(0x52);

        let report = KeyReport::from_keys(&keys);
        assert_eq!(report.modifier, 0);
        assert_eq!(report.reserved, 0);
        assert_eq!(report.key_count(), 2);
        assert_eq!(report.as_bytes(), [0, 0, 0x1B, 0x52, 0, 0, 0, 0]);
    }

    #[test]
    fn test_empty_report() {
        assert_eq!(KeyReport::from_keys(&KeyList::new()), KeyReport::empty());
        assert_eq!(KeyReport::empty().as_bytes(), [0; KeyReport::SIZE]);
    }

    #[test]
    fn test_protocol_from_w_value() {
        assert_eq!(ProtocolMode::from_w_value(0), ProtocolMode::Boot);
        assert_eq!(ProtocolMode::from_w_value(1), ProtocolMode::Report);
        assert_eq!(ProtocolMode::from_w_value(0x0100), ProtocolMode::Report);
        assert_eq!(ProtocolMode::default(), ProtocolMode::Report);
    }
}
