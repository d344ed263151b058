// Copyright 2026 the Sluice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-loop configuration presets.

use crate::time::{Duration, Timebase};

/// What the render loop does when a present fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PresentErrorPolicy {
    /// Stop the loop on any presentation failure.
    #[default]
    Stop,
    /// Skip the frame and keep running when the failure is transient
    /// ([`SurfaceError::is_transient`](crate::SurfaceError::is_transient));
    /// stop on anything else.
    SkipTransient,
}

/// Configuration for the [`RenderLoop`](crate::scheduler::RenderLoop).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoopConfig {
    /// Units of the host ticks the loop is polled with.
    pub timebase: Timebase,
    /// Minimum delay between the end of one cycle and the start of the next,
    /// in host ticks.
    pub min_delay: Duration,
    /// Reaction to presentation failures.
    pub present_error_policy: PresentErrorPolicy,
    /// EMA smoothing factor for the frame-rate sampler (0.0–1.0).
    /// Smaller values = more smoothing.
    pub rate_alpha: f64,
}

impl LoopConfig {
    /// Browser hosts: microsecond ticks from `performance.now()`, 10 ms
    /// delay.
    #[must_use]
    pub const fn web() -> Self {
        Self {
            timebase: Timebase::MICROS,
            min_delay: Duration::from_millis(10, Timebase::MICROS),
            present_error_policy: PresentErrorPolicy::Stop,
            rate_alpha: 0.1,
        }
    }

    /// Native hosts: nanosecond ticks from a monotonic clock, 10 ms delay.
    #[must_use]
    pub const fn native() -> Self {
        Self {
            timebase: Timebase::NANOS,
            min_delay: Duration::from_millis(10, Timebase::NANOS),
            present_error_policy: PresentErrorPolicy::Stop,
            rate_alpha: 0.1,
        }
    }

    /// Replaces the minimum delay.
    #[must_use]
    pub const fn with_min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self
    }

    /// Replaces the presentation error policy.
    #[must_use]
    pub const fn with_present_error_policy(mut self, policy: PresentErrorPolicy) -> Self {
        self.present_error_policy = policy;
        self
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self::native()
    }
}
