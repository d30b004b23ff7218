//! HID idle rate tracking.
//!
//! The host sets an idle period with SET_IDLE. While it is non-zero the
//! device must repeat its current report at least once per period even if
//! nothing changed. A period of zero means "only report changes".

use crate::fmt::debug;
use portable_atomic::{AtomicU16, Ordering};

/// Idle period at start-up, in milliseconds.
pub const DEFAULT_IDLE_PERIOD: u16 = 500;

/// Longest period SET_IDLE can express: 255 units of 4 ms.
pub const MAX_IDLE_PERIOD: u16 = 0xFF << 2;

/// Milliseconds left in the current idle period.
///
/// This is the only piece of state the 1 ms frame tick touches, so it is the
/// only thing handed to the tick source.
#[derive(Debug)]
pub struct IdleCountdown {
    remaining: AtomicU16,
}

impl IdleCountdown {
    /// An exhausted countdown.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            remaining: AtomicU16::new(0),
        }
    }

    /// One frame has passed.
    ///
    /// Decrements the countdown unless it has already run out.
    #[inline]
    pub fn tick(&self) {
        let _ = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |ms| ms.checked_sub(1));
    }

    /// Milliseconds left before the period elapses.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> u16 {
        self.remaining.load(Ordering::Acquire)
    }

    #[inline]
    fn restart(&self, period: u16) {
        self.remaining.store(period, Ordering::Release);
    }
}

impl Default for IdleCountdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Host-configured idle period plus its countdown.
///
/// # Scaling
///
/// SET_IDLE carries the period in the high byte of `wValue`, in units of
/// 4 ms. The stored period is `(wValue & 0xFF00) >> 6`, which is that byte
/// times four, i.e. milliseconds. GET_IDLE reports `period >> 2`, so a value
/// written by the host reads back unchanged.
#[derive(Debug)]
pub struct IdleScheduler {
    configured: AtomicU16,
    countdown: IdleCountdown,
}

impl IdleScheduler {
    /// Scheduler with [`DEFAULT_IDLE_PERIOD`] and an exhausted countdown.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_period(DEFAULT_IDLE_PERIOD)
    }

    /// Scheduler with the given period in milliseconds, clamped to
    /// [`MAX_IDLE_PERIOD`].
    #[must_use]
    pub const fn with_period(period_ms: u16) -> Self {
        let period_ms = if period_ms > MAX_IDLE_PERIOD {
            MAX_IDLE_PERIOD
        } else {
            period_ms
        };
        Self {
            configured: AtomicU16::new(period_ms),
            countdown: IdleCountdown::new(),
        }
    }

    /// Narrow view for the frame tick source.
    #[inline]
    #[must_use]
    pub fn countdown(&self) -> &IdleCountdown {
        &self.countdown
    }

    /// Forward one frame tick to the countdown.
    #[inline]
    pub fn tick(&self) {
        self.countdown.tick();
    }

    /// Apply a SET_IDLE request's `wValue`.
    pub fn set_idle(&self, w_value: u16) {
        let period = (w_value & 0xFF00) >> 6;
        debug!("SET_IDLE: period {=u16} ms", period);
        self.configured.store(period, Ordering::Release);
    }

    /// Value to answer GET_IDLE with, in 4 ms units.
    #[inline]
    #[must_use]
    pub fn get_idle(&self) -> u8 {
        // Stored periods never exceed MAX_IDLE_PERIOD
        (self.period_ms() >> 2) as u8
    }

    /// Configured period in milliseconds.
    #[inline]
    #[must_use]
    pub fn period_ms(&self) -> u16 {
        self.configured.load(Ordering::Acquire)
    }

    /// Check whether the idle period has run out.
    ///
    /// Returns `true` when a period is configured and the countdown has
    /// reached zero; the countdown is restarted from the configured period
    /// and the caller must send a report even if nothing changed.
    pub fn elapsed(&self) -> bool {
        let period = self.period_ms();
        if period != 0 && self.countdown.remaining() == 0 {
            self.countdown.restart(period);
            true
        } else {
            false
        }
    }
}

impl Default for IdleScheduler {
    fn default() -> Self {
        Self::new()
    }
}
