//! Device-wide state shared by the report cycle, control requests and the
//! frame tick.

use crate::fmt::debug;
use crate::idle::IdleScheduler;
use crate::types::ProtocolMode;
use core::future::{poll_fn, Future};
use core::task::Poll;
use embassy_sync::waitqueue::AtomicWaker;
use portable_atomic::{AtomicU8, Ordering};

/// Connection state of the USB device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum LinkStatus {
    /// No host (unpowered bus or unplugged).
    Detached = 0,
    /// Powered and talking to a host, not configured yet.
    Attached = 1,
    /// Host selected a configuration; reports may flow.
    Configured = 2,
}

impl LinkStatus {
    const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Attached,
            2 => Self::Configured,
            _ => Self::Detached,
        }
    }
}

/// Observable connection state, used to abandon waits when the host goes
/// away.
pub trait LinkMonitor {
    /// Whether a host is still attached.
    fn is_attached(&self) -> bool;

    /// Resolve once the device is detached.
    fn wait_detached(&self) -> impl Future<Output = ()>;
}

/// Everything that outlives a single report cycle.
///
/// Create one in a `static` and pass references around. All fields are
/// atomics, so the report task, the USB control handler and the frame tick
/// can share it without a lock.
///
/// The idle settings survive re-enumeration; the protocol mode goes back to
/// [`ProtocolMode::Report`] on every connect.
pub struct DeviceState {
    idle: IdleScheduler,
    protocol: AtomicU8,
    link: AtomicU8,
    detached: AtomicWaker,
}

impl DeviceState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            idle: IdleScheduler::new(),
            protocol: AtomicU8::new(ProtocolMode::Report as u8),
            link: AtomicU8::new(LinkStatus::Detached as u8),
            detached: AtomicWaker::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn idle(&self) -> &IdleScheduler {
        &self.idle
    }

    #[inline]
    #[must_use]
    pub fn protocol(&self) -> ProtocolMode {
        ProtocolMode::from_raw(self.protocol.load(Ordering::Acquire))
    }

    pub fn set_protocol(&self, mode: ProtocolMode) {
        debug!("Protocol mode: {}", mode);
        self.protocol.store(mode as u8, Ordering::Release);
    }

    #[inline]
    #[must_use]
    pub fn link(&self) -> LinkStatus {
        LinkStatus::from_raw(self.link.load(Ordering::Acquire))
    }

    #[inline]
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.link() == LinkStatus::Configured
    }

    /// A host appeared (bus powered or reset).
    pub fn connect(&self) {
        self.set_protocol(ProtocolMode::Report);
        self.set_link(LinkStatus::Attached);
    }

    /// The host selected (`true`) or dropped (`false`) the configuration.
    ///
    /// Ignored while detached.
    pub fn set_configured(&self, configured: bool) {
        if self.link() == LinkStatus::Detached {
            return;
        }
        let link = if configured {
            LinkStatus::Configured
        } else {
            LinkStatus::Attached
        };
        self.set_link(link);
    }

    /// The host went away. Wakes anything blocked in
    /// [`LinkMonitor::wait_detached`].
    pub fn disconnect(&self) {
        self.set_link(LinkStatus::Detached);
        self.detached.wake();
    }

    fn set_link(&self, link: LinkStatus) {
        debug!("Link: {}", link);
        self.link.store(link as u8, Ordering::Release);
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkMonitor for DeviceState {
    fn is_attached(&self) -> bool {
        self.link() != LinkStatus::Detached
    }

    fn wait_detached(&self) -> impl Future<Output = ()> {
        poll_fn(move |cx| {
            self.detached.register(cx.waker());
            if self.is_attached() {
                Poll::Pending
            } else {
                Poll::Ready(())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{block_on, noop_waker};
    use core::pin::pin;
    use core::task::Context;

    #[test]
    fn test_startup_defaults() {
        let state = DeviceState::new();
        assert_eq!(state.protocol(), ProtocolMode::Report);
        assert_eq!(state.link(), LinkStatus::Detached);
        assert_eq!(state.idle().period_ms(), 500);
        assert!(!state.is_attached());
    }

    #[test]
    fn test_connect_resets_protocol_only() {
        let state = DeviceState::new();
        state.connect();
        state.set_protocol(ProtocolMode::Boot);
        state.idle().set_idle(0x0A00);

        state.disconnect();
        state.connect();

        assert_eq!(state.protocol(), ProtocolMode::Report);
        assert_eq!(state.idle().get_idle(), 0x0A);
    }

    #[test]
    fn test_configuration_transitions() {
        let state = DeviceState::new();

        state.set_configured(true);
        assert_eq!(state.link(), LinkStatus::Detached);

        state.connect();
        state.set_configured(true);
        assert!(state.is_configured());

        state.set_configured(false);
        assert_eq!(state.link(), LinkStatus::Attached);

        state.set_configured(true);
        state.disconnect();
        assert_eq!(state.link(), LinkStatus::Detached);
    }

    #[test]
    fn test_wait_detached_ready_when_detached() {
        let state = DeviceState::new();
        block_on(state.wait_detached());
    }

    #[test]
    fn test_wait_detached_pending_until_disconnect() {
        let state = DeviceState::new();
        state.connect();

        let mut wait = pin!(state.wait_detached());
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        assert!(wait.as_mut().poll(&mut cx).is_pending());

        state.disconnect();
        assert!(wait.as_mut().poll(&mut cx).is_ready());
    }
}
