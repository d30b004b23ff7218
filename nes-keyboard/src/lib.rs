//! Two NES controllers as a USB boot keyboard, for RP2040.
//!
//! This crate binds the platform-agnostic [`nes_keyboard_core`] to the
//! RP2040 through embassy: GPIO drives the controller bus and indicators,
//! and embassy-usb carries the HID keyboard interface.
//!
//! # Hardware Configuration
//!
//! | Function    | GPIO  | Description |
//! |-------------|-------|-------------|
//! | Latch       | 2     | Shared by both controllers |
//! | Clock       | 3     | Shared by both controllers |
//! | Data A      | 4     | Controller A serial data (pull-up) |
//! | Data B      | 5     | Controller B serial data (pull-up) |
//! | Aux button  | 6     | Local button, active low (pull-up) |
//! | LED1..LED4  | 16-19 | Status and lock indicators |
//!
//! # Architecture
//!
//! The firmware uses the Embassy async runtime with these tasks:
//!
//! - **USB Task**: runs the USB device stack; [`KeyboardControl`] answers the
//!   HID class requests and tracks the connection state
//! - **Report Task**: runs the [`KeyboardBridge`] once per millisecond
//! - **Frame Task**: ticks the idle countdown once per millisecond
//! - **LED OUT Task**: applies LED reports from the interrupt OUT endpoint
//! - **Indicator Task**: drives the four indicator pins
//!
//! Indicator updates go through an Embassy
//! [`Signal`](embassy_sync::signal::Signal) with "latest value wins" semantics.
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)

#![no_std]

// Re-export core types for convenience
pub use nes_keyboard_core::{
    ButtonMask, ControllerSampler, DeviceState, IdleCountdown, Indicators, KeyMapping, KeyReport,
    KeySource, KeyboardBridge, LedSink, LedStatus, NesKeyboard, OutputError, ReportSink,
    SamplerTiming, SharedKeys, DEFAULT_KEYMAP,
};

pub mod indicators;
pub mod usb_control;
pub mod usb_output;

pub use indicators::{IndicatorPins, IndicatorSignal, SignalLeds};
pub use usb_control::KeyboardControl;
pub use usb_output::{
    add_keyboard_interface, hid_descriptor, report_descriptor, FramePacer, KeyboardInterface,
    UsbKeyboardOutput,
};

use embassy_rp::peripherals::USB;

/// The RP2040 USB driver.
pub type UsbDriver = embassy_rp::usb::Driver<'static, USB>;
/// Interrupt IN endpoint of [`UsbDriver`].
pub type UsbEndpointIn = <UsbDriver as embassy_usb::driver::Driver<'static>>::EndpointIn;
/// Interrupt OUT endpoint of [`UsbDriver`].
pub type UsbEndpointOut = <UsbDriver as embassy_usb::driver::Driver<'static>>::EndpointOut;
