// Copyright 2026 the Sluice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for sluice.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`TimeoutLoop`]: `setTimeout` driver with a fixed delay
//! - [`CanvasSurface`]: `<canvas>` drawing surface (`"2d"` or `"webgl2"`)
//! - [`drive`]: polls a shared [`RenderLoop`] from a [`TimeoutLoop`]

#![no_std]

extern crate alloc;

mod canvas;
mod timeout;

pub use canvas::CanvasSurface;
pub use timeout::TimeoutLoop;

use alloc::rc::Rc;
use core::cell::RefCell;
use core::ops::ControlFlow;

use sluice_core::engine::ComputeEngine;
use sluice_core::scheduler::{LoopState, RenderLoop};
use sluice_core::surface::DrawingSurface;
use sluice_core::time::{HostTime, Timebase};
use sluice_core::trace::TraceSink;

/// Returns the current host time from `performance.now()`.
///
/// The returned [`HostTime`] is in microsecond ticks. Use [`timebase`] to
/// convert to nanoseconds.
#[must_use]
pub fn now() -> HostTime {
    timeout::millis_to_host_time(timeout::performance_now())
}

/// Returns the web [`Timebase`]: 1 tick = 1 µs = 1000 ns.
#[must_use]
pub fn timebase() -> Timebase {
    Timebase::MICROS
}

/// Builds a [`TimeoutLoop`] that polls `render_loop` every `delay_ms`.
///
/// The timer ends itself once the render loop is stopped. Presentation
/// errors are logged; the render loop has already applied its error policy
/// by the time they reach the driver.
pub fn drive<E, S, T>(render_loop: Rc<RefCell<RenderLoop<E, S, T>>>, delay_ms: i32) -> TimeoutLoop
where
    E: ComputeEngine + 'static,
    S: DrawingSurface + 'static,
    T: TraceSink + 'static,
{
    TimeoutLoop::new(delay_ms, move |now| {
        let Ok(mut render_loop) = render_loop.try_borrow_mut() else {
            // The host holds the loop; try again next tick.
            return ControlFlow::Continue(());
        };
        if let Err(err) = render_loop.poll(now) {
            tracing::warn!(%err, "render cycle failed");
        }
        match render_loop.state() {
            LoopState::Stopped => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    })
}
