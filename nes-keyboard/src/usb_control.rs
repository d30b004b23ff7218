//! embassy-usb adapter for the HID class control requests.
//!
//! embassy-usb runs the control handshake itself and hands over complete
//! data stages, so the pipe given to the core handler is pre-staged: the OUT
//! byte is already there and IN data goes straight into the response buffer.

use core::future::{poll_fn, Future};
use core::task::Poll;
use defmt::{debug, info};
use embassy_futures::block_on;
use embassy_usb::control::{InResponse, OutResponse, Recipient, Request, RequestType};
use embassy_usb::driver::Direction;
use embassy_usb::types::InterfaceNumber;
use embassy_usb::Handler;
use nes_keyboard_core::{
    ControlPipe, ControlRequestHandler, DeviceState, HidRequest, Indicators, KeySource, LedSink,
    RequestOutcome, SetupPacket,
};

use crate::usb_output::{hid_descriptor, report_descriptor, HID_DESC_TYPE, REPORT_DESC_TYPE};

/// Rebuild the SETUP packet embassy-usb already decoded.
fn setup_packet(req: &Request) -> SetupPacket {
    let direction = match req.direction {
        Direction::Out => 0x00,
        Direction::In => 0x80,
    };
    let kind = match req.request_type {
        RequestType::Standard => 0,
        RequestType::Class => 1,
        RequestType::Vendor => 2,
        RequestType::Reserved => 3,
    };
    let recipient = match req.recipient {
        Recipient::Device => 0,
        Recipient::Interface => 1,
        Recipient::Endpoint => 2,
        Recipient::Other => 3,
        Recipient::Reserved => 31,
    };

    SetupPacket {
        request_type: direction | (kind << 5) | recipient,
        request: req.request,
        value: req.value,
        index: req.index,
        length: req.length,
    }
}

/// Data stage already transferred by embassy-usb.
struct StagedPipe<'b> {
    out: Option<u8>,
    buf: &'b mut [u8],
    written: usize,
}

impl<'b> StagedPipe<'b> {
    fn new(out: Option<u8>, buf: &'b mut [u8]) -> Self {
        Self {
            out,
            buf,
            written: 0,
        }
    }
}

impl ControlPipe for StagedPipe<'_> {
    // Stage acknowledgement is done by embassy-usb once the handler returns.
    fn clear_setup(&mut self) {}

    fn write_in(&mut self, data: &[u8]) {
        let n = data.len().min(self.buf.len());
        self.buf[..n].copy_from_slice(&data[..n]);
        self.written = n;
    }

    fn read_out(&mut self) -> impl Future<Output = u8> {
        let out = self.out;
        poll_fn(move |_| match out {
            Some(byte) => Poll::Ready(byte),
            None => Poll::Pending,
        })
    }

    fn clear_out(&mut self) {}

    fn clear_status_stage(&mut self) {}
}

/// USB device handler for the keyboard interface.
///
/// Tracks the connection in [`DeviceState`], shows the USB status on the
/// indicators and forwards HID class requests to [`ControlRequestHandler`].
pub struct KeyboardControl<K, L> {
    interface: InterfaceNumber,
    requests: ControlRequestHandler<'static, K, L>,
}

impl<K: KeySource, L: LedSink> KeyboardControl<K, L> {
    pub fn new(interface: InterfaceNumber, state: &'static DeviceState, keys: K, leds: L) -> Self {
        Self {
            interface,
            requests: ControlRequestHandler::new(state, keys, leds),
        }
    }

    fn state(&self) -> &'static DeviceState {
        self.requests.state()
    }

    fn show(&mut self, indicators: Indicators) {
        self.requests.leds_mut().set_indicators(indicators);
    }

    fn is_for_interface(&self, req: &Request) -> bool {
        req.recipient == Recipient::Interface && req.index == u16::from(self.interface.0)
    }

    fn connect(&mut self) {
        self.state().connect();
        self.show(Indicators::USB_ENUMERATING);
    }

    fn class_descriptor<'a>(&self, req: &Request, buf: &'a mut [u8]) -> Option<InResponse<'a>> {
        match (req.value >> 8) as u8 {
            REPORT_DESC_TYPE => Some(InResponse::Accepted(report_descriptor())),
            HID_DESC_TYPE => {
                let desc = hid_descriptor();
                let n = desc.len().min(buf.len());
                buf[..n].copy_from_slice(&desc[..n]);
                Some(InResponse::Accepted(&buf[..n]))
            }
            _ => Some(InResponse::Rejected),
        }
    }
}

impl<K: KeySource, L: LedSink> Handler for KeyboardControl<K, L> {
    fn enabled(&mut self, enabled: bool) {
        if enabled {
            info!("USB connected");
            self.connect();
        } else {
            info!("USB disconnected");
            self.state().disconnect();
            self.show(Indicators::USB_NOT_READY);
        }
    }

    fn reset(&mut self) {
        debug!("USB bus reset");
        self.connect();
    }

    fn configured(&mut self, configured: bool) {
        self.state().set_configured(configured);
        if configured {
            info!("USB configured, keyboard ready");
            self.show(Indicators::USB_READY);
        } else {
            self.show(Indicators::USB_ENUMERATING);
        }
    }

    fn suspended(&mut self, suspended: bool) {
        debug!("USB suspended: {}", suspended);
    }

    fn control_out(&mut self, req: Request, data: &[u8]) -> Option<OutResponse> {
        if !self.is_for_interface(&req) {
            return None;
        }

        let setup = setup_packet(&req);
        if setup.request == HidRequest::SetReport as u8 && data.is_empty() {
            return Some(OutResponse::Rejected);
        }

        let mut no_in_data = [0u8; 0];
        let mut pipe = StagedPipe::new(data.first().copied(), &mut no_in_data);
        match block_on(self.requests.handle(&setup, &mut pipe)) {
            RequestOutcome::Handled(_) => Some(OutResponse::Accepted),
            RequestOutcome::Cancelled => Some(OutResponse::Rejected),
            RequestOutcome::Unhandled => None,
        }
    }

    fn control_in<'a>(&'a mut self, req: Request, buf: &'a mut [u8]) -> Option<InResponse<'a>> {
        if !self.is_for_interface(&req) {
            return None;
        }

        if req.request_type == RequestType::Standard && req.request == Request::GET_DESCRIPTOR {
            return self.class_descriptor(&req, buf);
        }

        let setup = setup_packet(&req);
        let (outcome, len) = {
            let mut pipe = StagedPipe::new(None, &mut *buf);
            let outcome = block_on(self.requests.handle(&setup, &mut pipe));
            (outcome, pipe.written)
        };

        match outcome {
            RequestOutcome::Handled(_) => Some(InResponse::Accepted(&buf[..len])),
            RequestOutcome::Cancelled => Some(InResponse::Rejected),
            RequestOutcome::Unhandled => None,
        }
    }
}
