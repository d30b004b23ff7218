//! Host LED reports and board indicator patterns.

use core::ops::{BitOr, BitOrAssign};

/// Keyboard LED state sent by the host (SET_REPORT or interrupt OUT).
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedStatus(pub u8);

impl LedStatus {
    pub const NUM_LOCK: u8 = 1 << 0;
    pub const CAPS_LOCK: u8 = 1 << 1;
    pub const SCROLL_LOCK: u8 = 1 << 2;

    #[inline]
    #[must_use]
    pub const fn num_lock(self) -> bool {
        self.0 & Self::NUM_LOCK != 0
    }

    #[inline]
    #[must_use]
    pub const fn caps_lock(self) -> bool {
        self.0 & Self::CAPS_LOCK != 0
    }

    #[inline]
    #[must_use]
    pub const fn scroll_lock(self) -> bool {
        self.0 & Self::SCROLL_LOCK != 0
    }
}

/// Board indicator bitmask, LED1 to LED4.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Indicators(pub u8);

impl Indicators {
    pub const LED1: Self = Self(1 << 0);
    pub const LED2: Self = Self(1 << 1);
    pub const LED3: Self = Self(1 << 2);
    pub const LED4: Self = Self(1 << 3);

    pub const NONE: Self = Self(0);

    /// USB not attached or not yet powered.
    pub const USB_NOT_READY: Self = Self::LED1;
    /// Attached, host is enumerating.
    pub const USB_ENUMERATING: Self = Self(Self::LED2.0 | Self::LED3.0);
    /// Configured and running.
    pub const USB_READY: Self = Self(Self::LED2.0 | Self::LED4.0);
    /// Configuration failed.
    pub const USB_ERROR: Self = Self(Self::LED1.0 | Self::LED3.0);

    /// Indicator pattern for a host LED report.
    ///
    /// LED2 is always lit; LED1, LED3 and LED4 follow Num, Caps and Scroll
    /// Lock.
    #[must_use]
    pub const fn from_led_report(status: LedStatus) -> Self {
        let mut mask = Self::LED2.0;
        if status.num_lock() {
            mask |= Self::LED1.0;
        }
        if status.caps_lock() {
            mask |= Self::LED3.0;
        }
        if status.scroll_lock() {
            mask |= Self::LED4.0;
        }
        Self(mask)
    }

    #[inline]
    #[must_use]
    pub const fn contains(self, other: Indicators) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether LED `n` (0-based) is lit.
    #[inline]
    #[must_use]
    pub const fn is_lit(self, n: usize) -> bool {
        n < 4 && (self.0 >> n) & 1 != 0
    }
}

impl BitOr for Indicators {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Indicators {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Whatever drives the physical indicators.
pub trait LedSink {
    /// Show exactly this set of indicators.
    fn set_indicators(&mut self, indicators: Indicators);

    /// Apply a host LED report.
    fn apply_led_report(&mut self, status: LedStatus) {
        self.set_indicators(Indicators::from_led_report(status));
    }
}

impl<T: LedSink + ?Sized> LedSink for &mut T {
    fn set_indicators(&mut self, indicators: Indicators) {
        (**self).set_indicators(indicators);
    }
}
