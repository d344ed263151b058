// Copyright 2026 the Sluice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Blocking render-loop driver.

use sluice_core::engine::ComputeEngine;
use sluice_core::scheduler::{CycleReport, LoopState, RenderLoop};
use sluice_core::surface::DrawingSurface;
use sluice_core::trace::TraceSink;
use sluice_core::{Error, Result};

use crate::time::{now, timebase, to_std};

/// Runs `render_loop` on the current thread until it has presented `cycles`
/// more frames, sleeping between cycles.
///
/// Returns the reports of the presented cycles. Returns early with the
/// reports so far if the loop leaves the running state without an error
/// (for example when paused from a trace sink). Skipped frames under
/// [`PresentErrorPolicy::SkipTransient`] are logged and retried; any error
/// that leaves the loop unable to continue is returned.
///
/// The loop must count in this crate's nanosecond ticks (for example
/// [`LoopConfig::native`]); any other configured timebase fails with
/// [`Error::TimebaseMismatch`] before a cycle runs.
///
/// [`LoopConfig::native`]: sluice_core::config::LoopConfig::native
/// [`PresentErrorPolicy::SkipTransient`]: sluice_core::config::PresentErrorPolicy::SkipTransient
pub fn run_cycles<E, S, T>(
    render_loop: &mut RenderLoop<E, S, T>,
    cycles: usize,
) -> Result<Vec<CycleReport>>
where
    E: ComputeEngine,
    S: DrawingSurface,
    T: TraceSink,
{
    let configured = render_loop.config().timebase;
    if configured != timebase() {
        return Err(Error::TimebaseMismatch {
            configured,
            clock: timebase(),
        });
    }
    let mut reports = Vec::with_capacity(cycles);
    while reports.len() < cycles {
        let Some(wait) = render_loop.wait_hint(now()) else {
            break;
        };
        if wait.ticks() > 0 {
            std::thread::sleep(to_std(wait));
        }
        match render_loop.poll(now()) {
            Ok(Some(report)) => reports.push(report),
            Ok(None) => {}
            Err(err @ Error::Present(_)) if render_loop.state() == LoopState::Running => {
                tracing::debug!(%err, "frame skipped");
            }
            Err(err) => return Err(err),
        }
    }
    Ok(reports)
}
