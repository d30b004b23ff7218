//! Button-to-key mapping.
//!
//! Each controller has an 8-entry table indexed by button bit position. The
//! auxiliary button on the board has a single fixed code.

use crate::types::{ButtonMask, KeyList};

/// HID keyboard usage IDs (USB HID Usage Tables, page 0x07) used by the
/// default mapping.
pub mod keycodes {
    pub const A: u8 = 0x04;
    pub const B: u8 = 0x05;
    pub const F: u8 = 0x09;
    pub const G: u8 = 0x0A;
    pub const I: u8 = 0x0C;
    pub const J: u8 = 0x0D;
    pub const K: u8 = 0x0E;
    pub const L: u8 = 0x0F;
    pub const S: u8 = 0x16;
    pub const V: u8 = 0x19;
    pub const X: u8 = 0x1B;
    pub const Z: u8 = 0x1D;
    pub const RIGHT_ARROW: u8 = 0x4F;
    pub const LEFT_ARROW: u8 = 0x50;
    pub const DOWN_ARROW: u8 = 0x51;
    pub const UP_ARROW: u8 = 0x52;
}

/// Key tables for both controllers and the auxiliary button.
///
/// Customize this at compile-time by creating your own const.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMapping {
    /// Key code per button bit of controller A.
    pub pad_a: [u8; 8],
    /// Key code per button bit of controller B.
    pub pad_b: [u8; 8],
    /// Key code of the on-board auxiliary button.
    pub aux: u8,
}

/// Default mapping.
///
/// | Button | Pad A | Pad B |
/// |--------|-------|-------|
/// | A      | X     | V     |
/// | B      | Z     | B     |
/// | Select | A     | F     |
/// | Start  | S     | G     |
/// | Up     | Up    | I     |
/// | Down   | Down  | K     |
/// | Left   | Left  | J     |
/// | Right  | Right | L     |
///
/// The auxiliary button sends K.
pub const DEFAULT_KEYMAP: KeyMapping = KeyMapping {
    pad_a: [
        keycodes::X,
        keycodes::Z,
        keycodes::A,
        keycodes::S,
        keycodes::UP_ARROW,
        keycodes::DOWN_ARROW,
        keycodes::LEFT_ARROW,
        keycodes::RIGHT_ARROW,
    ],
    pad_b: [
        keycodes::V,
        keycodes::B,
        keycodes::F,
        keycodes::G,
        keycodes::I,
        keycodes::K,
        keycodes::J,
        keycodes::L,
    ],
    aux: keycodes::K,
};

impl KeyMapping {
    /// Translate both controller masks and the aux button into key codes.
    ///
    /// Bits are scanned from 0 to 7; at each bit controller A's code comes
    /// before controller B's, so the two pads are interleaved rather than
    /// grouped. The aux code is appended last. Anything past the sixth code
    /// is dropped (see [`KeyList`]).
    #[must_use]
    pub fn map(&self, pad_a: ButtonMask, pad_b: ButtonMask, aux_pressed: bool) -> KeyList {
        let mut keys = KeyList::new();

        for bit in 0..8 {
            if pad_a.is_bit_set(bit) {
                keys.push(self.pad_a[bit]);
            }
            if pad_b.is_bit_set(bit) {
                keys.push(self.pad_b[bit]);
            }
        }

        if aux_pressed {
            keys.push(self.aux);
        }

        keys
    }
}

impl Default for KeyMapping {
    fn default() -> Self {
        DEFAULT_KEYMAP
    }
}
