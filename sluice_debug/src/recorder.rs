// Copyright 2026 the Sluice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use sluice_core::scheduler::LoopState;
use sluice_core::surface::ContextKind;
use sluice_core::time::HostTime;
use sluice_core::trace::{
    CycleBeginEvent, CycleSummary, PresentErrorEvent, PresentEvent, StateChangeEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_CYCLE_BEGIN: u8 = 1;
const TAG_PRESENT: u8 = 2;
const TAG_PRESENT_ERROR: u8 = 3;
const TAG_STATE_CHANGE: u8 = 4;
const TAG_CYCLE_SUMMARY: u8 = 5;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_option_f64(&mut self, v: Option<f64>) {
        self.write_bool(v.is_some());
        self.write_u64(v.unwrap_or(0.0).to_bits());
    }

    fn write_state(&mut self, s: LoopState) {
        self.write_u8(match s {
            LoopState::Idle => 0,
            LoopState::Running => 1,
            LoopState::Paused => 2,
            LoopState::Stopped => 3,
        });
    }

    fn write_kind(&mut self, k: ContextKind) {
        self.write_u8(match k {
            ContextKind::Raster2D => 0,
            ContextKind::Accelerated3D => 1,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
        self.write_u8(TAG_CYCLE_BEGIN);
        self.write_u64(e.cycle_index);
        self.write_u64(e.now.ticks());
    }

    fn on_present(&mut self, e: &PresentEvent) {
        self.write_u8(TAG_PRESENT);
        self.write_u64(e.cycle_index);
        self.write_u64(e.presented_at.ticks());
        self.write_u32(e.width);
        self.write_u32(e.height);
        self.write_u64(u64::try_from(e.bytes).unwrap_or(u64::MAX));
        self.write_kind(e.kind);
    }

    fn on_present_error(&mut self, e: &PresentErrorEvent) {
        self.write_u8(TAG_PRESENT_ERROR);
        self.write_u64(e.cycle_index);
        self.write_u64(e.at.ticks());
        self.write_bool(e.transient);
        self.write_bool(e.stopped);
    }

    fn on_state_change(&mut self, e: &StateChangeEvent) {
        self.write_u8(TAG_STATE_CHANGE);
        self.write_state(e.from);
        self.write_state(e.to);
        self.write_u64(e.cycle_index);
    }

    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        self.write_u8(TAG_CYCLE_SUMMARY);
        self.write_u64(s.cycle_index);
        self.write_u64(s.presented_at.ticks());
        self.write_u64(s.next_due.ticks());
        self.write_u64(s.lateness_ticks);
        self.write_option_f64(s.frame_rate);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`CycleBeginEvent`].
    CycleBegin(CycleBeginEvent),
    /// A [`PresentEvent`].
    Present(PresentEvent),
    /// A [`PresentErrorEvent`].
    PresentError(PresentErrorEvent),
    /// A [`StateChangeEvent`].
    StateChange(StateChangeEvent),
    /// A [`CycleSummary`].
    CycleSummary(CycleSummary),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration ends at the first truncated record or unknown tag.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos.checked_add(N)?)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|v| v != 0)
    }

    fn read_option_f64(&mut self) -> Option<Option<f64>> {
        let present = self.read_bool()?;
        let bits = self.read_u64()?;
        Some(present.then(|| f64::from_bits(bits)))
    }

    fn read_state(&mut self) -> Option<LoopState> {
        Some(match self.read_u8()? {
            0 => LoopState::Idle,
            1 => LoopState::Running,
            2 => LoopState::Paused,
            _ => LoopState::Stopped,
        })
    }

    fn read_kind(&mut self) -> Option<ContextKind> {
        Some(match self.read_u8()? {
            0 => ContextKind::Raster2D,
            _ => ContextKind::Accelerated3D,
        })
    }

    fn decode_cycle_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CycleBegin(CycleBeginEvent {
            cycle_index: self.read_u64()?,
            now: self.read_time()?,
        }))
    }

    fn decode_present(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Present(PresentEvent {
            cycle_index: self.read_u64()?,
            presented_at: self.read_time()?,
            width: self.read_u32()?,
            height: self.read_u32()?,
            bytes: usize::try_from(self.read_u64()?).unwrap_or(usize::MAX),
            kind: self.read_kind()?,
        }))
    }

    fn decode_present_error(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PresentError(PresentErrorEvent {
            cycle_index: self.read_u64()?,
            at: self.read_time()?,
            transient: self.read_bool()?,
            stopped: self.read_bool()?,
        }))
    }

    fn decode_state_change(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::StateChange(StateChangeEvent {
            from: self.read_state()?,
            to: self.read_state()?,
            cycle_index: self.read_u64()?,
        }))
    }

    fn decode_cycle_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CycleSummary(CycleSummary {
            cycle_index: self.read_u64()?,
            presented_at: self.read_time()?,
            next_due: self.read_time()?,
            lateness_ticks: self.read_u64()?,
            frame_rate: self.read_option_f64()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_CYCLE_BEGIN => self.decode_cycle_begin(),
            TAG_PRESENT => self.decode_present(),
            TAG_PRESENT_ERROR => self.decode_present_error(),
            TAG_STATE_CHANGE => self.decode_state_change(),
            TAG_CYCLE_SUMMARY => self.decode_cycle_summary(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::config::LoopConfig;
    use sluice_core::engine::{EngineHandle, PixelBuffer};
    use sluice_core::scheduler::RenderLoop;
    use sluice_core::surface::{DrawingSurface, Surface};
    use sluice_core::time::Duration;
    use sluice_core::view::FrameView;

    struct Sink;

    impl DrawingSurface for Sink {
        fn negotiate(&mut self, kind: ContextKind) -> bool {
            kind == ContextKind::Raster2D
        }

        fn blit(&mut self, _: &FrameView<'_>) -> Result<(), sluice_core::SurfaceError> {
            Ok(())
        }
    }

    #[test]
    fn records_a_render_loop_session() {
        let mut surface = Surface::new(Sink);
        let config = LoopConfig::native().with_min_delay(Duration(10));
        let mut render_loop = RenderLoop::with_trace_sink(config, RecorderSink::new());
        render_loop
            .attach_engine(EngineHandle::<PixelBuffer>::create(2, 3, None).unwrap().shared())
            .unwrap();
        render_loop
            .attach_context(surface.acquire(ContextKind::Raster2D).unwrap())
            .unwrap();
        render_loop.start().unwrap();
        render_loop.poll(HostTime(100)).unwrap();
        render_loop.poll(HostTime(125)).unwrap();
        render_loop.stop();

        let events: Vec<_> = decode(render_loop.trace_sink().as_bytes()).collect();
        // start, 2 × (begin, present, summary), stop
        assert_eq!(events.len(), 8);

        match &events[0] {
            RecordedEvent::StateChange(e) => {
                assert_eq!((e.from, e.to), (LoopState::Idle, LoopState::Running));
            }
            other => panic!("expected StateChange, got {other:?}"),
        }
        match &events[5] {
            RecordedEvent::Present(e) => {
                assert_eq!(e.cycle_index, 1);
                assert_eq!(e.presented_at, HostTime(125));
                assert_eq!((e.width, e.height, e.bytes), (2, 3, 24));
                assert_eq!(e.kind, ContextKind::Raster2D);
            }
            other => panic!("expected Present, got {other:?}"),
        }
        match &events[6] {
            RecordedEvent::CycleSummary(s) => {
                assert_eq!(s.lateness_ticks, 15);
                assert_eq!(s.next_due, HostTime(135));
                assert_eq!(s.frame_rate, Some(1.0 / 25.0));
            }
            other => panic!("expected CycleSummary, got {other:?}"),
        }
        match &events[7] {
            RecordedEvent::StateChange(e) => {
                assert_eq!(e.to, LoopState::Stopped);
                assert_eq!(e.cycle_index, 2);
            }
            other => panic!("expected StateChange, got {other:?}"),
        }
    }

    #[test]
    fn present_error_flags_survive() {
        let mut rec = RecorderSink::new();
        rec.on_present_error(&PresentErrorEvent {
            cycle_index: 4,
            at: HostTime(77),
            transient: true,
            stopped: false,
        });
        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match events.as_slice() {
            [RecordedEvent::PresentError(e)] => {
                assert_eq!(e.cycle_index, 4);
                assert!(e.transient && !e.stopped, "got {e:?}");
            }
            other => panic!("expected one PresentError, got {other:?}"),
        }
    }

    #[test]
    fn truncated_record_ends_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_cycle_begin(&CycleBeginEvent {
            cycle_index: 0,
            now: HostTime(1),
        });
        rec.on_cycle_begin(&CycleBeginEvent {
            cycle_index: 1,
            now: HostTime(2),
        });
        let bytes = rec.into_bytes();
        let cut = &bytes[..bytes.len() - 3];
        assert_eq!(decode(cut).count(), 1);
    }

    #[test]
    fn unknown_tag_ends_iteration() {
        assert_eq!(decode(&[0xff, 1, 2, 3]).count(), 0);
    }
}
