// Copyright 2026 the Sluice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observed frame-rate sampling.
//!
//! [`FrameRateSampler`] keeps the last two presentation timestamps and an
//! exponential moving average of the intervals between them. Rates are in
//! cycles per host tick; convert with [`FrameRateSampler::rate_hz`].

use crate::time::{HostTime, Timebase};

/// Exponential moving average.
#[derive(Clone, Copy, Debug)]
struct Ema {
    value: f64,
    alpha: f64,
    initialized: bool,
}

impl Ema {
    const fn new(alpha: f64) -> Self {
        Self {
            value: 0.0,
            alpha,
            initialized: false,
        }
    }

    fn update(&mut self, sample: f64) {
        if self.initialized {
            self.value = self.alpha * sample + (1.0 - self.alpha) * self.value;
        } else {
            self.value = sample;
            self.initialized = true;
        }
    }

    const fn get(&self) -> Option<f64> {
        if self.initialized {
            Some(self.value)
        } else {
            None
        }
    }
}

/// Records presentation timestamps and reports the achieved rate.
///
/// Reporting never fails: with fewer than two samples, or when the last two
/// samples share a timestamp, every rate is `None`.
#[derive(Clone, Copy, Debug)]
pub struct FrameRateSampler {
    prev: Option<HostTime>,
    last: Option<HostTime>,
    interval_ema: Ema,
    samples: u64,
}

impl Default for FrameRateSampler {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl FrameRateSampler {
    /// Creates a sampler smoothing intervals with EMA factor `alpha`
    /// (clamped to `0.0..=1.0`; higher weighs recent intervals more).
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        Self {
            prev: None,
            last: None,
            interval_ema: Ema::new(alpha.clamp(0.0, 1.0)),
            samples: 0,
        }
    }

    /// Records a presentation at `now`.
    pub fn record(&mut self, now: HostTime) {
        if let Some(last) = self.last {
            let interval = now.saturating_duration_since(last).ticks();
            self.interval_ema.update(interval as f64);
        }
        self.prev = self.last;
        self.last = Some(now);
        self.samples += 1;
    }

    /// Number of recorded samples.
    #[must_use]
    pub const fn samples(&self) -> u64 {
        self.samples
    }

    /// Timestamp of the latest sample.
    #[must_use]
    pub const fn last(&self) -> Option<HostTime> {
        self.last
    }

    /// `1 / (t_last - t_prev)`, in cycles per tick.
    #[must_use]
    pub fn rate(&self) -> Option<f64> {
        let (prev, last) = (self.prev?, self.last?);
        let interval = last.saturating_duration_since(prev).ticks();
        if interval == 0 {
            return None;
        }
        Some(1.0 / interval as f64)
    }

    /// Reciprocal of the smoothed interval, in cycles per tick.
    #[must_use]
    pub fn smoothed_rate(&self) -> Option<f64> {
        let interval = self.interval_ema.get()?;
        (interval > 0.0).then(|| 1.0 / interval)
    }

    /// [`rate`](Self::rate) converted to cycles per second.
    #[must_use]
    pub fn rate_hz(&self, timebase: Timebase) -> Option<f64> {
        self.rate().map(|r| r * timebase.ticks_per_second())
    }

    /// [`smoothed_rate`](Self::smoothed_rate) converted to cycles per second.
    #[must_use]
    pub fn smoothed_rate_hz(&self, timebase: Timebase) -> Option<f64> {
        self.smoothed_rate().map(|r| r * timebase.ticks_per_second())
    }

    /// Forgets every sample.
    pub fn reset(&mut self) {
        *self = Self {
            interval_ema: Ema::new(self.interval_ema.alpha),
            ..Self::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn fewer_than_two_samples_is_none() {
        let mut s = FrameRateSampler::default();
        assert_eq!(s.rate(), None, "no samples");
        s.record(HostTime(10));
        assert_eq!(s.rate(), None, "one sample");
        assert_eq!(s.smoothed_rate(), None, "one sample");
    }

    #[test]
    fn rate_is_reciprocal_of_last_interval() {
        let mut s = FrameRateSampler::default();
        s.record(HostTime(10));
        s.record(HostTime(30));
        assert_eq!(s.rate(), Some(1.0 / 20.0));
        assert_eq!(s.samples(), 2);
    }

    #[test]
    fn zero_interval_is_none() {
        let mut s = FrameRateSampler::default();
        s.record(HostTime(5));
        s.record(HostTime(5));
        assert_eq!(s.rate(), None, "duplicate timestamp");
    }

    #[test]
    fn smoothed_rate_follows_ema() {
        let mut s = FrameRateSampler::new(0.5);
        s.record(HostTime(0));
        s.record(HostTime(10));
        s.record(HostTime(30));
        // EMA of intervals: 10, then 0.5 * 20 + 0.5 * 10 = 15.
        let smoothed = s.smoothed_rate().unwrap();
        assert!(close(smoothed, 1.0 / 15.0), "got {smoothed}");
        assert_eq!(s.rate(), Some(1.0 / 20.0));
    }

    #[test]
    fn rate_hz_converts_ticks() {
        let mut s = FrameRateSampler::default();
        // 10 ms apart in microsecond ticks.
        s.record(HostTime(0));
        s.record(HostTime(10_000));
        let hz = s.rate_hz(Timebase::MICROS).unwrap();
        assert!(close(hz, 100.0), "got {hz}");

        let mut s = FrameRateSampler::default();
        s.record(HostTime(0));
        s.record(HostTime(16_666_667));
        let hz = s.rate_hz(Timebase::NANOS).unwrap();
        assert!((hz - 60.0).abs() < 1e-3, "got {hz}");
    }

    #[test]
    fn reset_forgets_samples() {
        let mut s = FrameRateSampler::default();
        s.record(HostTime(1));
        s.record(HostTime(2));
        s.reset();
        assert_eq!(s.samples(), 0);
        assert_eq!(s.rate(), None, "reset sampler");
    }
}
