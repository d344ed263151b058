// Copyright 2026 the Sluice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The cooperative render loop.
//!
//! [`RenderLoop`] moves frames from an attached
//! [`EngineHandle`](crate::engine::EngineHandle) to an attached
//! [`Context`]. It does not own a timer: a backend driver calls
//! [`poll`](RenderLoop::poll) with the current host time and sleeps until
//! [`wait_hint`](RenderLoop::wait_hint) says the next cycle is due.
//!
//! # States
//!
//! ```text
//!   Idle ──start──► Running ◄──resume── Paused
//!                      │ └────pause────►  │
//!                      ▼                  ▼
//!                   Stopped ◄──────────── (any state, via stop)
//! ```
//!
//! A cycle reads the engine's current frame location, views exactly
//! `width * height * 4` bytes, presents them, records the timestamp in a
//! [`FrameRateSampler`] and schedules the next cycle `min_delay` ticks later.
//! Cadence is best-effort, not locked to display refresh.
//!
//! The engine stays mutable between cycles in every state. During a cycle
//! the loop holds a shared borrow of it; a mutation attempted from inside
//! `present` panics in the `RefCell`, and a cycle started while the engine
//! is mutably borrowed fails with [`Error::EngineBusy`].

use crate::config::{LoopConfig, PresentErrorPolicy};
use crate::engine::{ComputeEngine, SharedEngine};
use crate::error::{Error, MissingDependency, Result};
use crate::rate::FrameRateSampler;
use crate::surface::{Context, ContextKind, DrawingSurface};
use crate::time::{Duration, HostTime};
use crate::trace::{
    CycleBeginEvent, CycleSummary, NoopSink, PresentErrorEvent, PresentEvent, StateChangeEvent,
    TraceSink, Tracer,
};

/// Render-loop lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LoopState {
    /// Created, not started.
    #[default]
    Idle,
    /// Presenting a frame each time a cycle is due.
    Running,
    /// Started, not presenting.
    Paused,
    /// Terminal. References to the engine and context are released.
    Stopped,
}

/// Outcome of one presented cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CycleReport {
    /// Zero-based index of this cycle among presented cycles.
    pub cycle_index: u64,
    /// Host time the frame was presented at.
    pub presented_at: HostTime,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frame length in bytes.
    pub bytes: usize,
    /// How the frame was presented.
    pub kind: ContextKind,
    /// When the next cycle is due.
    pub next_due: HostTime,
    /// Instantaneous rate in cycles per tick, once two cycles have run.
    pub frame_rate: Option<f64>,
}

/// Moves frames from an engine to a surface context on a fixed cadence.
///
/// The loop *uses* the engine handle and the context; dropping or stopping
/// it releases its references without destroying either.
pub struct RenderLoop<E, S, T = NoopSink> {
    config: LoopConfig,
    state: LoopState,
    engine: Option<SharedEngine<E>>,
    context: Option<Context<S>>,
    sampler: FrameRateSampler,
    next_due: Option<HostTime>,
    cycle_index: u64,
    sink: T,
}

impl<E, S> RenderLoop<E, S>
where
    E: ComputeEngine,
    S: DrawingSurface,
{
    /// Creates an idle loop without instrumentation.
    #[must_use]
    pub fn new(config: LoopConfig) -> Self {
        Self::with_trace_sink(config, NoopSink)
    }
}

impl<E, S, T> RenderLoop<E, S, T>
where
    E: ComputeEngine,
    S: DrawingSurface,
    T: TraceSink,
{
    /// Creates an idle loop reporting to `sink`.
    ///
    /// Events reach the sink only when the `trace` feature is enabled.
    #[must_use]
    pub fn with_trace_sink(config: LoopConfig, sink: T) -> Self {
        Self {
            sampler: FrameRateSampler::new(config.rate_alpha),
            config,
            state: LoopState::Idle,
            engine: None,
            context: None,
            next_due: None,
            cycle_index: 0,
            sink,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> LoopState {
        self.state
    }

    /// The loop's configuration.
    #[must_use]
    pub const fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Number of cycles presented so far.
    #[must_use]
    pub const fn cycles_presented(&self) -> u64 {
        self.cycle_index
    }

    /// Attaches (or replaces) the engine handle. Takes effect at the next
    /// cycle.
    pub fn attach_engine(&mut self, engine: SharedEngine<E>) -> Result<()> {
        self.ensure_not_stopped()?;
        self.engine = Some(engine);
        Ok(())
    }

    /// Attaches (or replaces) the presentation context. Takes effect at the
    /// next cycle.
    pub fn attach_context(&mut self, context: Context<S>) -> Result<()> {
        self.ensure_not_stopped()?;
        self.context = Some(context);
        Ok(())
    }

    /// The attached engine handle.
    #[must_use]
    pub fn engine(&self) -> Option<&SharedEngine<E>> {
        self.engine.as_ref()
    }

    /// The attached context.
    #[must_use]
    pub fn context(&self) -> Option<&Context<S>> {
        self.context.as_ref()
    }

    /// Starts presenting. The first cycle is due immediately.
    ///
    /// Fails with [`Error::NotReady`] if no engine is attached or the context
    /// is missing or detached; attach and retry. Starting a running loop is a
    /// no-op. Paused and stopped loops fail with [`Error::InvalidState`].
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            LoopState::Idle => {}
            LoopState::Running => return Ok(()),
            state @ (LoopState::Paused | LoopState::Stopped) => {
                return Err(Error::InvalidState { state });
            }
        }
        if self.engine.is_none() {
            return Err(Error::NotReady(MissingDependency::Engine));
        }
        if !self.context.as_ref().is_some_and(Context::is_live) {
            return Err(Error::NotReady(MissingDependency::Context));
        }
        self.next_due = None;
        self.transition(LoopState::Running);
        Ok(())
    }

    /// Pauses a running loop. Returns `false` (and does nothing) otherwise.
    ///
    /// The pending due time is kept, so pausing and resuming never shortens
    /// the minimum delay between cycles.
    pub fn pause(&mut self) -> bool {
        if self.state != LoopState::Running {
            return false;
        }
        self.transition(LoopState::Paused);
        true
    }

    /// Resumes a paused loop. The next cycle runs at the first slot the
    /// minimum delay allows and presents the engine's current frame. Returns
    /// `false` (and does nothing) otherwise.
    pub fn resume(&mut self) -> bool {
        if self.state != LoopState::Paused {
            return false;
        }
        self.transition(LoopState::Running);
        true
    }

    /// Stops the loop for good, cancelling the pending cycle and releasing
    /// the engine and context. Returns `false` if it was already stopped.
    pub fn stop(&mut self) -> bool {
        if self.state == LoopState::Stopped {
            return false;
        }
        self.engine = None;
        self.context = None;
        self.next_due = None;
        self.transition(LoopState::Stopped);
        true
    }

    /// When the next cycle is due, or `None` if it is due immediately or the
    /// loop is not running.
    #[must_use]
    pub const fn next_due(&self) -> Option<HostTime> {
        match self.state {
            LoopState::Running => self.next_due,
            _ => None,
        }
    }

    /// How long a driver should sleep before polling again, or `None` when
    /// the loop is not running.
    #[must_use]
    pub fn wait_hint(&self, now: HostTime) -> Option<Duration> {
        if self.state != LoopState::Running {
            return None;
        }
        Some(
            self.next_due
                .map_or(Duration::ZERO, |due| due.saturating_duration_since(now)),
        )
    }

    /// Runs a cycle if the loop is running and one is due at `now`.
    ///
    /// Returns `Ok(None)` when nothing was due. A failed present is reported
    /// as [`Error::Present`] after the loop applied its
    /// [`PresentErrorPolicy`].
    pub fn poll(&mut self, now: HostTime) -> Result<Option<CycleReport>> {
        if self.state != LoopState::Running {
            return Ok(None);
        }
        if self.next_due.is_some_and(|due| now < due) {
            return Ok(None);
        }
        self.run_cycle(now).map(Some)
    }

    /// Latest instantaneous frame rate in cycles per tick.
    #[must_use]
    pub fn frame_rate(&self) -> Option<f64> {
        self.sampler.rate()
    }

    /// The loop's frame-rate sampler.
    #[must_use]
    pub const fn sampler(&self) -> &FrameRateSampler {
        &self.sampler
    }

    /// The trace sink.
    #[must_use]
    pub const fn trace_sink(&self) -> &T {
        &self.sink
    }

    /// The trace sink, mutably.
    pub fn trace_sink_mut(&mut self) -> &mut T {
        &mut self.sink
    }

    /// Consumes the loop, returning its trace sink.
    pub fn into_trace_sink(self) -> T {
        self.sink
    }

    fn ensure_not_stopped(&self) -> Result<()> {
        match self.state {
            LoopState::Stopped => Err(Error::InvalidState {
                state: LoopState::Stopped,
            }),
            _ => Ok(()),
        }
    }

    fn transition(&mut self, to: LoopState) {
        let from = self.state;
        self.state = to;
        tracing::debug!(?from, ?to, cycles = self.cycle_index, "render loop state change");
        Tracer::new(&mut self.sink).state_change(&StateChangeEvent {
            from,
            to,
            cycle_index: self.cycle_index,
        });
    }

    fn run_cycle(&mut self, now: HostTime) -> Result<CycleReport> {
        let Some(engine) = self.engine.clone() else {
            return Err(Error::NotReady(MissingDependency::Engine));
        };
        let Some(context) = self.context.clone() else {
            return Err(Error::NotReady(MissingDependency::Context));
        };
        let cycle_index = self.cycle_index;
        Tracer::new(&mut self.sink).cycle_begin(&CycleBeginEvent { cycle_index, now });

        let handle = engine.try_borrow().map_err(|_| Error::EngineBusy)?;
        let location = handle.location();
        let view = handle.view_at(&location)?;
        let presented = context.present_frame(&view);
        drop(handle);

        if let Err(err) = presented {
            let transient = err.is_transient();
            let stopped = !(transient
                && self.config.present_error_policy == PresentErrorPolicy::SkipTransient);
            tracing::warn!(cycle_index, %err, transient, stopped, "present failed");
            Tracer::new(&mut self.sink).present_error(&PresentErrorEvent {
                cycle_index,
                at: now,
                transient,
                stopped,
            });
            if stopped {
                self.stop();
            } else {
                self.next_due = Some(now.saturating_add(self.config.min_delay));
            }
            return Err(Error::Present(err));
        }

        self.sampler.record(now);
        let lateness_ticks = self
            .next_due
            .map_or(0, |due| now.saturating_duration_since(due).ticks());
        let next_due = now.saturating_add(self.config.min_delay);
        self.next_due = Some(next_due);
        self.cycle_index += 1;

        let report = CycleReport {
            cycle_index,
            presented_at: now,
            width: location.width,
            height: location.height,
            bytes: location.len,
            kind: context.kind(),
            next_due,
            frame_rate: self.sampler.rate(),
        };
        let mut tracer = Tracer::new(&mut self.sink);
        tracer.present(&PresentEvent {
            cycle_index,
            presented_at: now,
            width: report.width,
            height: report.height,
            bytes: report.bytes,
            kind: report.kind,
        });
        tracer.cycle_summary(&CycleSummary {
            cycle_index,
            presented_at: now,
            next_due,
            lateness_ticks,
            frame_rate: report.frame_rate,
        });
        Ok(report)
    }
}

impl<E, S, T> core::fmt::Debug for RenderLoop<E, S, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RenderLoop")
            .field("state", &self.state)
            .field("cycle_index", &self.cycle_index)
            .field("next_due", &self.next_due)
            .field("has_engine", &self.engine.is_some())
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
