// Copyright 2026 the Sluice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless backend for sluice.
//!
//! - [`MemorySurface`]: a drawing surface backed by a `Vec<u8>`
//! - [`run_cycles`]: a blocking driver that sleeps until the next cycle is due
//! - [`now`] / [`timebase`]: `CLOCK_MONOTONIC` host time in nanosecond ticks
//!
//! Useful for tests, offline capture and native hosts without a window.

mod driver;
mod memory;
mod time;

pub use driver::run_cycles;
pub use memory::MemorySurface;
pub use time::{now, timebase, to_std};
