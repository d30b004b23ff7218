//! HID class control requests.
//!
//! Each request follows the control transfer handshake: the SETUP stage is
//! acknowledged, the data stage (if any) runs, and the status stage is
//! cleared. The transport supplies those primitives through [`ControlPipe`].

use crate::fmt::debug;
use crate::input::KeySource;
use crate::led::{LedSink, LedStatus};
use crate::state::{DeviceState, LinkMonitor};
use crate::types::ProtocolMode;
use core::future::Future;
use embassy_futures::select::{select, Either};

/// `bmRequestType` of a device-to-host, class, interface request.
pub const REQUEST_TYPE_CLASS_IN: u8 = 0xA1;
/// `bmRequestType` of a host-to-device, class, interface request.
pub const REQUEST_TYPE_CLASS_OUT: u8 = 0x21;

/// HID class `bRequest` codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum HidRequest {
    GetReport = 0x01,
    GetIdle = 0x02,
    GetProtocol = 0x03,
    SetReport = 0x09,
    SetIdle = 0x0A,
    SetProtocol = 0x0B,
}

impl HidRequest {
    #[must_use]
    pub const fn from_raw(request: u8) -> Option<Self> {
        match request {
            0x01 => Some(Self::GetReport),
            0x02 => Some(Self::GetIdle),
            0x03 => Some(Self::GetProtocol),
            0x09 => Some(Self::SetReport),
            0x0A => Some(Self::SetIdle),
            0x0B => Some(Self::SetProtocol),
            _ => None,
        }
    }

    /// The only `bmRequestType` this request is accepted with.
    #[must_use]
    pub const fn request_type(self) -> u8 {
        match self {
            Self::GetReport | Self::GetIdle | Self::GetProtocol => REQUEST_TYPE_CLASS_IN,
            Self::SetReport | Self::SetIdle | Self::SetProtocol => REQUEST_TYPE_CLASS_OUT,
        }
    }
}

/// The 8-byte SETUP packet of a control transfer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetupPacket {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    pub length: u16,
}

impl SetupPacket {
    /// Decode a SETUP packet as it arrives on the wire (little endian).
    #[must_use]
    pub fn parse(raw: &[u8; 8]) -> Self {
        Self {
            request_type: raw[0],
            request: raw[1],
            value: u16::from_le_bytes([raw[2], raw[3]]),
            index: u16::from_le_bytes([raw[4], raw[5]]),
            length: u16::from_le_bytes([raw[6], raw[7]]),
        }
    }
}

/// Stage-level access to the default control endpoint.
pub trait ControlPipe {
    /// Acknowledge the SETUP stage.
    fn clear_setup(&mut self);

    /// Send `data` as the IN data stage.
    fn write_in(&mut self, data: &[u8]);

    /// Wait for the first byte of the OUT data stage.
    fn read_out(&mut self) -> impl Future<Output = u8>;

    /// Release the OUT data packet.
    fn clear_out(&mut self);

    /// Complete the status stage.
    fn clear_status_stage(&mut self);
}

/// How a control request ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestOutcome {
    /// Fully handled, status stage cleared.
    Handled(HidRequest),
    /// The host detached during the data stage; nothing was applied.
    Cancelled,
    /// Not a HID class request for this interface; left to the transport.
    Unhandled,
}

/// Wait for one OUT data byte, giving up as soon as the link detaches.
///
/// Returns `None` if the device is (or becomes) detached before the byte
/// arrives.
pub async fn wait_out_or_detach<P, M>(pipe: &mut P, link: &M) -> Option<u8>
where
    P: ControlPipe,
    M: LinkMonitor + ?Sized,
{
    if !link.is_attached() {
        return None;
    }

    match select(pipe.read_out(), link.wait_detached()).await {
        Either::First(byte) => Some(byte),
        Either::Second(()) => None,
    }
}

/// Answers HID class requests for the keyboard interface.
///
/// GET_REPORT scans `keys` on demand; SET_REPORT forwards the LED byte to
/// `leds`. Idle and protocol settings live in the shared [`DeviceState`].
pub struct ControlRequestHandler<'s, K, L> {
    state: &'s DeviceState,
    keys: K,
    leds: L,
}

impl<'s, K: KeySource, L: LedSink> ControlRequestHandler<'s, K, L> {
    pub fn new(state: &'s DeviceState, keys: K, leds: L) -> Self {
        Self { state, keys, leds }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> &'s DeviceState {
        self.state
    }

    #[inline]
    pub fn leds_mut(&mut self) -> &mut L {
        &mut self.leds
    }

    /// Process one control request.
    pub async fn handle<P: ControlPipe>(
        &mut self,
        setup: &SetupPacket,
        pipe: &mut P,
    ) -> RequestOutcome {
        let Some(request) = HidRequest::from_raw(setup.request) else {
            return RequestOutcome::Unhandled;
        };
        if setup.request_type != request.request_type() {
            return RequestOutcome::Unhandled;
        }

        debug!("HID request {} wValue={=u16:#x}", request, setup.value);

        match request {
            HidRequest::GetReport => {
                let report = self.keys.scan();
                pipe.clear_setup();
                pipe.write_in(&report.as_bytes());
                pipe.clear_status_stage();
            }
            HidRequest::SetReport => {
                pipe.clear_setup();
                let Some(byte) = wait_out_or_detach(pipe, self.state).await else {
                    debug!("SET_REPORT abandoned, host detached");
                    return RequestOutcome::Cancelled;
                };
                pipe.clear_out();
                pipe.clear_status_stage();
                self.leds.apply_led_report(LedStatus(byte));
            }
            HidRequest::GetProtocol => {
                pipe.clear_setup();
                pipe.write_in(&[self.state.protocol() as u8]);
                pipe.clear_status_stage();
            }
            HidRequest::SetProtocol => {
                pipe.clear_setup();
                pipe.clear_status_stage();
                self.state.set_protocol(ProtocolMode::from_w_value(setup.value));
            }
            HidRequest::GetIdle => {
                pipe.clear_setup();
                pipe.write_in(&[self.state.idle().get_idle()]);
                pipe.clear_status_stage();
            }
            HidRequest::SetIdle => {
                pipe.clear_setup();
                pipe.clear_status_stage();
                self.state.idle().set_idle(setup.value);
            }
        }

        RequestOutcome::Handled(request)
    }
}
