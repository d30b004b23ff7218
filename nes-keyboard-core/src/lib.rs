//! Platform-agnostic core of the NES controller to USB keyboard bridge.
//!
//! This crate contains everything that does not depend on a specific chip or
//! USB stack:
//!
//! - **Sampling**: [`ControllerSampler`] clocks two NES shift registers sharing
//!   one latch/clock bus and returns a [`ButtonMask`] per controller.
//! - **Mapping**: [`KeyMapping`] turns the two masks (plus a local auxiliary
//!   button) into a bounded [`KeyList`] of HID key codes.
//! - **Reports**: [`KeyReport`] is the 8-byte boot keyboard report built from a
//!   key list.
//! - **Pacing**: [`IdleScheduler`] and [`ReportChannel`] implement the
//!   send-on-change plus idle heartbeat policy of HID keyboards.
//! - **Control**: [`ControlRequestHandler`] answers the HID class control
//!   requests (GET/SET_REPORT, GET/SET_IDLE, GET/SET_PROTOCOL).
//! - **Bridge**: [`KeyboardBridge`] runs one report cycle from a [`KeySource`]
//!   to a [`ReportSink`].
//!
//! # Example
//!
//! ```rust
//! use nes_keyboard_core::{ButtonMask, KeyReport, DEFAULT_KEYMAP};
//!
//! let keys = DEFAULT_KEYMAP.map(ButtonMask::A | ButtonMask::UP, ButtonMask::NONE, false);
//! let report = KeyReport::from_keys(&keys);
//! assert_eq!(report.as_bytes(), [0, 0, 0x1B, 0x52, 0, 0, 0, 0]);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting and logging (for embedded targets)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations. All
//! shared state lives in [`DeviceState`], which is `Sync` and meant to be
//! placed in a `static`.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

mod fmt;

pub mod bridge;
pub mod channel;
pub mod control;
pub mod idle;
pub mod input;
pub mod keymap;
pub mod led;
pub mod output;
pub mod sampler;
pub mod state;
pub mod types;

#[cfg(test)]
mod test_util;

// Re-export main types at crate root
pub use bridge::{CycleOutcome, KeyboardBridge, Pacer};
pub use channel::ReportChannel;
pub use control::{
    wait_out_or_detach, ControlPipe, ControlRequestHandler, HidRequest, RequestOutcome,
    SetupPacket, REQUEST_TYPE_CLASS_IN, REQUEST_TYPE_CLASS_OUT,
};
pub use idle::{IdleCountdown, IdleScheduler, DEFAULT_IDLE_PERIOD, MAX_IDLE_PERIOD};
pub use input::{KeySource, NesKeyboard, SharedKeys};
pub use keymap::{keycodes, KeyMapping, DEFAULT_KEYMAP};
pub use led::{Indicators, LedSink, LedStatus};
pub use output::{OutputError, ReportSink};
pub use sampler::{ControllerSampler, SamplerTiming};
pub use state::{DeviceState, LinkMonitor, LinkStatus};
pub use types::{ButtonMask, KeyList, KeyReport, ProtocolMode, MAX_KEYS};
