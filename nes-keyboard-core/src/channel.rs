//! Send-on-change plus idle heartbeat.

use crate::fmt::trace;
use crate::idle::IdleScheduler;
use crate::output::{OutputError, ReportSink};
use crate::types::KeyReport;

/// Decides which reports go out on the interrupt IN endpoint.
///
/// A report is required when it differs from the last one sent, or when the
/// idle period has elapsed. Required reports that meet a busy endpoint are
/// not queued; the next cycle builds a new report and decides again.
#[derive(Debug, Default)]
pub struct ReportChannel {
    previous: KeyReport,
}

impl ReportChannel {
    /// Channel whose last sent report is the empty report.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            previous: KeyReport::empty(),
        }
    }

    /// Last report committed for transmission.
    #[inline]
    #[must_use]
    pub fn previous(&self) -> &KeyReport {
        &self.previous
    }

    /// Decide whether `report` must be transmitted now.
    ///
    /// The idle period is checked on every call, so an elapsed period is
    /// consumed even when the content changed as well. When this returns
    /// `true` the report has been committed as the new previous report and
    /// the caller must transmit it.
    pub fn decide(&mut self, report: &KeyReport, idle: &IdleScheduler, ready: bool) -> bool {
        let changed = *report != self.previous;
        let heartbeat = idle.elapsed();

        if ready && (changed || heartbeat) {
            self.previous = *report;
            true
        } else {
            false
        }
    }

    /// Run [`decide`](Self::decide) against a sink and transmit if required.
    ///
    /// Returns `Ok(true)` if the report was sent. A failed transmit rolls
    /// the previous report back, so the next cycle sends it again.
    pub async fn submit<S: ReportSink>(
        &mut self,
        report: &KeyReport,
        idle: &IdleScheduler,
        sink: &mut S,
    ) -> Result<bool, OutputError> {
        let last_sent = self.previous;
        if !self.decide(report, idle, sink.is_ready()) {
            return Ok(false);
        }

        trace!("Sending report: {}", report);
        if let Err(e) = sink.send(report).await {
            self.previous = last_sent;
            return Err(e);
        }
        Ok(true)
    }
}
