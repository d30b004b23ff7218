//! Host-side helpers shared by the unit tests.

extern crate std;

use crate::input::KeySource;
use crate::output::{OutputError, ReportSink};
use crate::types::KeyReport;
use core::future::Future;
use core::pin::pin;
use core::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
use std::vec::Vec;

/// Waker that does nothing when woken.
pub fn noop_waker() -> Waker {
    fn noop_raw_waker() -> RawWaker {
        fn noop(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            noop_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
        RawWaker::new(core::ptr::null(), &VTABLE)
    }

    // SAFETY: the vtable functions do nothing and never touch the data pointer
    unsafe { Waker::from_raw(noop_raw_waker()) }
}

/// Run a future to completion (simple blocking executor).
///
/// Panics if the future returns `Pending`; every mock here completes on the
/// first poll.
pub fn block_on<F: Future>(f: F) -> F::Output {
    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);
    let mut f = pin!(f);

    match f.as_mut().poll(&mut cx) {
        Poll::Ready(result) => result,
        Poll::Pending => panic!("Mock future returned Pending unexpectedly"),
    }
}

/// Records every report it is given.
pub struct MockSink {
    pub sent: Vec<KeyReport>,
    pub ready: bool,
    pub fail_with: Option<OutputError>,
}

impl MockSink {
    pub fn new() -> Self {
        Self {
            sent: Vec::new(),
            ready: true,
            fail_with: None,
        }
    }
}

impl ReportSink for MockSink {
    fn send(&mut self, report: &KeyReport) -> impl Future<Output = Result<(), OutputError>> {
        let result = match self.fail_with {
            Some(e) => Err(e),
            None => {
                self.sent.push(*report);
                Ok(())
            }
        };
        core::future::ready(result)
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}

/// Key source returning whatever report the test put in it.
pub struct MockKeys {
    pub report: KeyReport,
    pub scans: usize,
}

impl MockKeys {
    pub fn new(report: KeyReport) -> Self {
        Self { report, scans: 0 }
    }
}

impl KeySource for MockKeys {
    fn scan(&mut self) -> KeyReport {
        self.scans += 1;
        self.report
    }
}
