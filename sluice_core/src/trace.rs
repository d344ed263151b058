// Copyright 2026 the Sluice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-loop instrumentation.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! [`RenderLoop`](crate::scheduler::RenderLoop) calls as it runs. All method
//! bodies default to no-ops, so implementing only the events you care about
//! is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.

use crate::scheduler::LoopState;
use crate::surface::ContextKind;
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a due cycle starts, before the frame is read.
#[derive(Clone, Copy, Debug)]
pub struct CycleBeginEvent {
    /// Index the cycle will have if it presents.
    pub cycle_index: u64,
    /// Host time passed to `poll`.
    pub now: HostTime,
}

/// Emitted after a frame was presented.
#[derive(Clone, Copy, Debug)]
pub struct PresentEvent {
    /// Cycle counter.
    pub cycle_index: u64,
    /// Host time of the present.
    pub presented_at: HostTime,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frame length in bytes.
    pub bytes: usize,
    /// How the frame was presented.
    pub kind: ContextKind,
}

/// Emitted when a present failed.
#[derive(Clone, Copy, Debug)]
pub struct PresentErrorEvent {
    /// Cycle counter of the failed cycle.
    pub cycle_index: u64,
    /// Host time of the attempt.
    pub at: HostTime,
    /// Whether the failure was transient.
    pub transient: bool,
    /// Whether the loop stopped because of it.
    pub stopped: bool,
}

/// Emitted on every state transition.
#[derive(Clone, Copy, Debug)]
pub struct StateChangeEvent {
    /// Previous state.
    pub from: LoopState,
    /// New state.
    pub to: LoopState,
    /// Number of cycles presented so far.
    pub cycle_index: u64,
}

/// Per-cycle summary emitted after a successful present.
#[derive(Clone, Copy, Debug)]
pub struct CycleSummary {
    /// Cycle counter.
    pub cycle_index: u64,
    /// Host time of the present.
    pub presented_at: HostTime,
    /// When the next cycle is due.
    pub next_due: HostTime,
    /// Ticks late relative to the due time (0 for the first cycle).
    pub lateness_ticks: u64,
    /// Latest instantaneous rate in cycles per tick, if known.
    pub frame_rate: Option<f64>,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the render loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a due cycle begins.
    fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
        _ = e;
    }

    /// Called after a successful present.
    fn on_present(&mut self, e: &PresentEvent) {
        _ = e;
    }

    /// Called after a failed present.
    fn on_present_error(&mut self, e: &PresentErrorEvent) {
        _ = e;
    }

    /// Called on every state transition.
    fn on_state_change(&mut self, e: &StateChangeEvent) {
        _ = e;
    }

    /// Called with a per-cycle summary.
    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        _ = s;
    }
}

impl<T: TraceSink + ?Sized> TraceSink for &mut T {
    fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
        (**self).on_cycle_begin(e);
    }

    fn on_present(&mut self, e: &PresentEvent) {
        (**self).on_present(e);
    }

    fn on_present_error(&mut self, e: &PresentErrorEvent) {
        (**self).on_present_error(e);
    }

    fn on_state_change(&mut self, e: &StateChangeEvent) {
        (**self).on_state_change(e);
    }

    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        (**self).on_cycle_summary(s);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! dispatch {
    ($self:ident, $method:ident, $e:ident) => {{
        #[cfg(feature = "trace")]
        if let Some(s) = &mut $self.sink {
            s.$method($e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = (&$self, $e);
        }
    }};
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`CycleBeginEvent`].
    #[inline]
    pub fn cycle_begin(&mut self, e: &CycleBeginEvent) {
        dispatch!(self, on_cycle_begin, e);
    }

    /// Emits a [`PresentEvent`].
    #[inline]
    pub fn present(&mut self, e: &PresentEvent) {
        dispatch!(self, on_present, e);
    }

    /// Emits a [`PresentErrorEvent`].
    #[inline]
    pub fn present_error(&mut self, e: &PresentErrorEvent) {
        dispatch!(self, on_present_error, e);
    }

    /// Emits a [`StateChangeEvent`].
    #[inline]
    pub fn state_change(&mut self, e: &StateChangeEvent) {
        dispatch!(self, on_state_change, e);
    }

    /// Emits a [`CycleSummary`].
    #[inline]
    pub fn cycle_summary(&mut self, s: &CycleSummary) {
        dispatch!(self, on_cycle_summary, s);
    }
}
