// Copyright 2026 the Sluice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are converted to microseconds using a [`Timebase`].

use std::io::Write;

use sluice_core::time::{HostTime, Timebase};
use sluice_core::trace::{
    CycleBeginEvent, CycleSummary, PresentErrorEvent, PresentEvent, StateChangeEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            timebase,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }

    /// Consumes the sink and returns its writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn ticks_to_us(&self, ticks: u64) -> f64 {
        self.timebase.ticks_to_nanos(ticks) as f64 / 1000.0
    }

    fn host_us(&self, t: HostTime) -> f64 {
        self.ticks_to_us(t.ticks())
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[cycle] #{} at {:.1}µs",
            e.cycle_index,
            self.host_us(e.now),
        );
    }

    fn on_present(&mut self, e: &PresentEvent) {
        let _ = writeln!(
            self.writer,
            "[present] #{} {}x{} ({} bytes) via {} at {:.1}µs",
            e.cycle_index,
            e.width,
            e.height,
            e.bytes,
            e.kind,
            self.host_us(e.presented_at),
        );
    }

    fn on_present_error(&mut self, e: &PresentErrorEvent) {
        let kind = if e.transient { "transient" } else { "fatal" };
        let action = if e.stopped { "stopped" } else { "skipped" };
        let _ = writeln!(
            self.writer,
            "[present:error] #{} {kind} failure, {action} at {:.1}µs",
            e.cycle_index,
            self.host_us(e.at),
        );
    }

    fn on_state_change(&mut self, e: &StateChangeEvent) {
        let _ = writeln!(
            self.writer,
            "[state] {:?} -> {:?} after {} cycles",
            e.from, e.to, e.cycle_index,
        );
    }

    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        let rate = match s.frame_rate {
            Some(r) => format!("{:.1}Hz", r * self.timebase.ticks_per_second()),
            None => "?".to_owned(),
        };
        let _ = writeln!(
            self.writer,
            "[summary] #{} late={:.1}µs next={:.1}µs rate={rate}",
            s.cycle_index,
            self.ticks_to_us(s.lateness_ticks),
            self.host_us(s.next_due),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::scheduler::LoopState;
    use sluice_core::surface::ContextKind;

    fn sink() -> PrettyPrintSink<Vec<u8>> {
        PrettyPrintSink::with_writer(Vec::new(), Timebase::NANOS)
    }

    #[test]
    fn pretty_print_present() {
        let mut sink = sink();
        sink.on_present(&PresentEvent {
            cycle_index: 3,
            presented_at: HostTime(2_000),
            width: 385,
            height: 385,
            bytes: 385 * 385 * 4,
            kind: ContextKind::Raster2D,
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(output.contains("[present] #3"), "got: {output}");
        assert!(output.contains("385x385"), "got: {output}");
        assert!(output.contains("raster-2d"), "got: {output}");
        assert!(output.contains("2.0µs"), "got: {output}");
    }

    #[test]
    fn pretty_print_summary_rate_in_hz() {
        let mut sink = PrettyPrintSink::with_writer(Vec::new(), Timebase::MICROS);
        sink.on_cycle_summary(&CycleSummary {
            cycle_index: 1,
            presented_at: HostTime(10_000),
            next_due: HostTime(20_000),
            lateness_ticks: 0,
            frame_rate: Some(1.0 / 10_000.0),
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(output.contains("rate=100.0Hz"), "got: {output}");
    }

    #[test]
    fn pretty_print_state_and_error() {
        let mut sink = sink();
        sink.on_state_change(&StateChangeEvent {
            from: LoopState::Running,
            to: LoopState::Stopped,
            cycle_index: 9,
        });
        sink.on_present_error(&PresentErrorEvent {
            cycle_index: 9,
            at: HostTime(0),
            transient: false,
            stopped: true,
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(output.contains("Running -> Stopped"), "got: {output}");
        assert!(output.contains("fatal failure, stopped"), "got: {output}");
    }
}
