//! USB HID keyboard interface and report output.

use embassy_time::{Duration, Ticker};
use embassy_usb::driver::{Driver, EndpointError, EndpointIn};
use embassy_usb::types::InterfaceNumber;
use embassy_usb::Builder;
use nes_keyboard_core::{DeviceState, KeyReport, OutputError, Pacer, ReportSink};
use usbd_hid::descriptor::{KeyboardReport, SerializedDescriptor};

const USB_CLASS_HID: u8 = 0x03;
const HID_SUBCLASS_BOOT: u8 = 0x01;
const HID_PROTOCOL_KEYBOARD: u8 = 0x01;

/// HID class descriptor type.
pub const HID_DESC_TYPE: u8 = 0x21;
/// HID report descriptor type.
pub const REPORT_DESC_TYPE: u8 = 0x22;

/// Boot keyboard report descriptor: modifier byte, reserved byte, five LED
/// output bits and six key codes.
pub fn report_descriptor() -> &'static [u8] {
    KeyboardReport::desc()
}

/// The 9-byte HID class descriptor pointing at [`report_descriptor`].
pub fn hid_descriptor() -> [u8; 9] {
    let len = (report_descriptor().len() as u16).to_le_bytes();
    [
        9,                // bLength
        HID_DESC_TYPE,    // bDescriptorType
        0x11,             // bcdHID 1.11
        0x01,
        0x00,             // bCountryCode
        0x01,             // bNumDescriptors
        REPORT_DESC_TYPE, // bDescriptorType (Report)
        len[0],
        len[1],
    ]
}

/// Endpoints and interface number of the keyboard interface.
pub struct KeyboardInterface<'d, D: Driver<'d>> {
    pub number: InterfaceNumber,
    pub ep_in: D::EndpointIn,
    pub ep_out: D::EndpointOut,
}

/// Add the boot keyboard interface to the USB builder.
///
/// Class requests for the interface are answered by
/// [`KeyboardControl`](crate::KeyboardControl), which must be registered with
/// [`Builder::handler`] afterwards.
pub fn add_keyboard_interface<'d, D: Driver<'d>>(
    builder: &mut Builder<'d, D>,
) -> KeyboardInterface<'d, D> {
    let mut func = builder.function(USB_CLASS_HID, HID_SUBCLASS_BOOT, HID_PROTOCOL_KEYBOARD);
    let mut iface = func.interface();
    let number = iface.interface_number();
    let mut alt = iface.alt_setting(USB_CLASS_HID, HID_SUBCLASS_BOOT, HID_PROTOCOL_KEYBOARD, None);

    alt.descriptor(HID_DESC_TYPE, &hid_descriptor()[2..]);

    // 8-byte packets, polled every 1 ms
    let ep_in = alt.endpoint_interrupt_in(None, KeyReport::SIZE as u16, 1);
    let ep_out = alt.endpoint_interrupt_out(None, KeyReport::SIZE as u16, 1);

    KeyboardInterface {
        number,
        ep_in,
        ep_out,
    }
}

/// USB HID keyboard output.
///
/// Writes boot keyboard reports to the interrupt IN endpoint.
pub struct UsbKeyboardOutput<E> {
    ep: E,
    state: &'static DeviceState,
}

impl<E: EndpointIn> UsbKeyboardOutput<E> {
    pub fn new(ep: E, state: &'static DeviceState) -> Self {
        Self { ep, state }
    }

    /// Wait until the host enables the endpoint.
    pub async fn wait_ready(&mut self) {
        self.ep.wait_enabled().await;
    }
}

impl<E: EndpointIn> ReportSink for UsbKeyboardOutput<E> {
    async fn send(&mut self, report: &KeyReport) -> Result<(), OutputError> {
        self.ep.write(&report.as_bytes()).await.map_err(|e| match e {
            EndpointError::Disabled => OutputError::NotReady,
            EndpointError::BufferOverflow => OutputError::Io,
        })
    }

    fn is_ready(&self) -> bool {
        self.state.is_configured()
    }
}

/// Paces the report cycle to the 1 ms USB frame.
pub struct FramePacer {
    ticker: Ticker,
}

impl FramePacer {
    pub fn new(period: Duration) -> Self {
        Self {
            ticker: Ticker::every(period),
        }
    }
}

impl Pacer for FramePacer {
    async fn wait(&mut self) {
        self.ticker.next().await;
    }
}
