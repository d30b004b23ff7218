//! Report sink trait and error types.

use crate::types::KeyReport;
use core::future::Future;

/// Error type for output operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    /// USB/communication I/O error.
    Io,
    /// Device not ready (e.g., USB not configured or endpoint disabled).
    NotReady,
}

/// Async trait for keyboard report sinks.
///
/// This trait abstracts the interrupt IN endpoint the reports go out on.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait ReportSink {
    /// Send a keyboard report.
    ///
    /// May wait until the endpoint accepts the packet.
    fn send(&mut self, report: &KeyReport) -> impl Future<Output = Result<(), OutputError>>;

    /// Check if the sink can take a report this cycle.
    fn is_ready(&self) -> bool;
}
