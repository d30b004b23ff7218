//! KeyboardBridge: runs the report cycle from a key source to a report sink.

use crate::channel::ReportChannel;
use crate::fmt::debug;
use crate::input::KeySource;
use crate::output::{OutputError, ReportSink};
use crate::state::DeviceState;
use core::future::Future;

/// Result of one report cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleOutcome {
    /// The report was transmitted.
    Sent,
    /// Nothing changed and the idle period has not elapsed, or the endpoint
    /// was busy.
    Skipped,
    /// The host has not configured the device; inputs were not scanned.
    NotConfigured,
}

/// Paces the report cycle.
pub trait Pacer {
    /// Wait for the start of the next cycle.
    fn wait(&mut self) -> impl Future<Output = ()>;
}

impl<T: Pacer + ?Sized> Pacer for &mut T {
    fn wait(&mut self) -> impl Future<Output = ()> {
        (**self).wait()
    }
}

/// Forwards keyboard reports from a [`KeySource`] to a [`ReportSink`].
///
/// Every cycle scans the inputs again and lets the [`ReportChannel`] decide
/// whether the report goes out. Idle settings come from the shared
/// [`DeviceState`], so SET_IDLE takes effect on the next cycle.
pub struct KeyboardBridge<'s, S, O> {
    source: S,
    output: O,
    channel: ReportChannel,
    state: &'s DeviceState,
}

impl<'s, S: KeySource, O: ReportSink> KeyboardBridge<'s, S, O> {
    /// Create a new bridge from a key source and report sink.
    pub fn new(source: S, output: O, state: &'s DeviceState) -> Self {
        Self {
            source,
            output,
            channel: ReportChannel::new(),
            state,
        }
    }

    /// Run the bridge, one cycle per `pacer` tick, indefinitely.
    pub async fn run<P: Pacer>(&mut self, mut pacer: P) -> ! {
        loop {
            pacer.wait().await;
            if let Err(e) = self.process_one().await {
                debug!("Report cycle failed: {}", e);
            }
        }
    }

    /// Run a single report cycle.
    pub async fn process_one(&mut self) -> Result<CycleOutcome, OutputError> {
        if !self.state.is_configured() {
            return Ok(CycleOutcome::NotConfigured);
        }

        let report = self.source.scan();
        let sent = self
            .channel
            .submit(&report, self.state.idle(), &mut self.output)
            .await?;

        Ok(if sent {
            CycleOutcome::Sent
        } else {
            CycleOutcome::Skipped
        })
    }

    /// Get a reference to the key source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Get a mutable reference to the key source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Get a reference to the report sink.
    pub fn output(&self) -> &O {
        &self.output
    }

    /// Get a mutable reference to the report sink.
    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Report channel holding the last sent report.
    pub fn channel(&self) -> &ReportChannel {
        &self.channel
    }

    /// Decompose the bridge into its source and sink.
    pub fn into_parts(self) -> (S, O) {
        (self.source, self.output)
    }
}
