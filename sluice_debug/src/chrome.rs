// Copyright 2026 the Sluice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use sluice_core::time::Timebase;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Presents and failures are instant events; each cycle summary also becomes
/// a `Cadence` counter sample (rate in Hz, lateness in µs).
///
/// Timestamps are converted to microseconds using the provided [`Timebase`].
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::CycleBegin(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "CycleBegin",
                    "cat": "Loop",
                    "ts": ticks_to_us(e.now.ticks(), timebase),
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "cycle_index": e.cycle_index,
                    }
                }));
            }
            RecordedEvent::Present(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Present",
                    "cat": "Frame",
                    "ts": ticks_to_us(e.presented_at.ticks(), timebase),
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "cycle_index": e.cycle_index,
                        "width": e.width,
                        "height": e.height,
                        "bytes": e.bytes,
                        "kind": e.kind.name(),
                    }
                }));
            }
            RecordedEvent::PresentError(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "PresentError",
                    "cat": "Frame",
                    "ts": ticks_to_us(e.at.ticks(), timebase),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "cycle_index": e.cycle_index,
                        "transient": e.transient,
                        "stopped": e.stopped,
                    }
                }));
            }
            RecordedEvent::StateChange(e) => {
                // State changes carry no timestamp; pin them to the last event.
                let ts = events.last().map_or(Value::from(0), |v| v["ts"].clone());
                events.push(json!({
                    "ph": "i",
                    "name": "StateChange",
                    "cat": "Loop",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "from": format!("{:?}", e.from),
                        "to": format!("{:?}", e.to),
                        "cycles": e.cycle_index,
                    }
                }));
            }
            RecordedEvent::CycleSummary(s) => {
                let hz = s.frame_rate.map_or(0.0, |r| r * timebase.ticks_per_second());
                events.push(json!({
                    "ph": "C",
                    "name": "Cadence",
                    "ts": ticks_to_us(s.presented_at.ticks(), timebase),
                    "pid": 0,
                    "args": {
                        "rate_hz": hz,
                        "lateness_us": ticks_to_us(s.lateness_ticks, timebase),
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn ticks_to_us(ticks: u64, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(ticks) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use sluice_core::scheduler::LoopState;
    use sluice_core::surface::ContextKind;
    use sluice_core::time::HostTime;
    use sluice_core::trace::{
        CycleBeginEvent, CycleSummary, PresentEvent, StateChangeEvent, TraceSink,
    };

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_cycle_begin(&CycleBeginEvent {
            cycle_index: 0,
            now: HostTime(10_000),
        });
        rec.on_present(&PresentEvent {
            cycle_index: 0,
            presented_at: HostTime(10_000),
            width: 2,
            height: 2,
            bytes: 16,
            kind: ContextKind::Raster2D,
        });
        rec.on_cycle_summary(&CycleSummary {
            cycle_index: 0,
            presented_at: HostTime(10_000),
            next_due: HostTime(20_000),
            lateness_ticks: 500,
            frame_rate: Some(1.0 / 10_000.0),
        });
        rec.on_state_change(&StateChangeEvent {
            from: LoopState::Running,
            to: LoopState::Paused,
            cycle_index: 1,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), Timebase::MICROS, &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 4);

        assert_eq!(parsed[0]["name"], "CycleBegin");
        // 10_000 µs ticks → 10_000 µs.
        assert_eq!(parsed[0]["ts"], 10_000.0);

        assert_eq!(parsed[1]["name"], "Present");
        assert_eq!(parsed[1]["args"]["kind"], "raster-2d");

        assert_eq!(parsed[2]["ph"], "C");
        assert_eq!(parsed[2]["args"]["rate_hz"], 100.0);
        assert_eq!(parsed[2]["args"]["lateness_us"], 500.0);

        assert_eq!(parsed[3]["args"]["to"], "Paused");
        assert_eq!(parsed[3]["ts"], parsed[2]["ts"]);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], Timebase::NANOS, &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
