// Copyright 2026 the Sluice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `setTimeout` driver.
//!
//! [`TimeoutLoop`] calls a callback every `delay_ms` milliseconds (best
//! effort, as the browser schedules timers) with the current
//! [`HostTime`] in microsecond ticks. The callback returns
//! [`ControlFlow::Break`] to end the loop from the inside.
//!
//! [`HostTime`]: sluice_core::time::HostTime

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::ops::ControlFlow;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use sluice_core::time::HostTime;

// Direct global bindings; these also exist in workers, where there is no
// `Window`.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(handler: &JsValue, timeout: i32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: i32);
}

/// Converts a `performance.now()` reading (ms) to microsecond ticks.
pub(crate) fn millis_to_host_time(ms: f64) -> HostTime {
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "performance.now() returns small positive f64; µs fits in u64"
    )]
    let us = (ms * 1000.0) as u64;
    HostTime(us)
}

/// A self-rescheduling `setTimeout` loop.
///
/// Create with [`TimeoutLoop::new`], then call [`start`](Self::start). The
/// loop re-arms its timer after each callback until [`stop`](Self::stop) is
/// called, the callback breaks, or the `TimeoutLoop` is dropped.
pub struct TimeoutLoop {
    inner: Rc<TimeoutInner>,
}

type TimeoutClosure = Closure<dyn FnMut()>;

struct TimeoutInner {
    /// The JS closure registered with `setTimeout`.
    ///
    /// Kept apart from `callback` so the closure can re-arm itself while the
    /// callback is borrowed.
    closure: RefCell<Option<TimeoutClosure>>,

    callback: RefCell<Box<dyn FnMut(HostTime) -> ControlFlow<()>>>,

    delay_ms: i32,

    running: Cell<bool>,

    /// ID of the pending timer, for `clearTimeout`.
    timer_id: Cell<Option<i32>>,

    fired: Cell<u64>,
}

impl TimeoutInner {
    fn arm(&self) {
        if let Some(ref closure) = *self.closure.borrow() {
            let id = set_timeout(closure.as_ref().unchecked_ref(), self.delay_ms);
            self.timer_id.set(Some(id));
        }
    }
}

impl TimeoutLoop {
    /// Creates a loop that is **not yet running**.
    ///
    /// Negative delays are treated as zero.
    pub fn new(
        delay_ms: i32,
        callback: impl FnMut(HostTime) -> ControlFlow<()> + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(TimeoutInner {
                closure: RefCell::new(None),
                callback: RefCell::new(Box::new(callback)),
                delay_ms: delay_ms.max(0),
                running: Cell::new(false),
                timer_id: Cell::new(None),
                fired: Cell::new(0),
            }),
        }
    }

    /// Starts the loop; the first callback runs after one delay.
    ///
    /// If already running, this is a no-op.
    pub fn start(&self) {
        if self.inner.running.get() {
            return;
        }
        self.inner.running.set(true);

        if self.inner.closure.borrow().is_none() {
            // Weak, so the closure stored inside `inner` does not keep
            // `inner` alive.
            let weak = Rc::downgrade(&self.inner);
            let closure = Closure::wrap(Box::new(move || {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                inner.timer_id.set(None);
                if !inner.running.get() {
                    return;
                }
                inner.fired.set(inner.fired.get() + 1);

                let now = millis_to_host_time(performance_now());
                let flow = inner.callback.borrow_mut()(now);
                if flow.is_break() {
                    inner.running.set(false);
                }

                if inner.running.get() {
                    inner.arm();
                }
            }) as Box<dyn FnMut()>);
            *self.inner.closure.borrow_mut() = Some(closure);
        }

        self.inner.arm();
    }

    /// Stops the loop and cancels the pending timer. Can be restarted.
    pub fn stop(&self) {
        if !self.inner.running.get() {
            return;
        }
        self.inner.running.set(false);
        if let Some(id) = self.inner.timer_id.take() {
            clear_timeout(id);
        }
    }

    /// Returns `true` if the loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Number of timer callbacks delivered so far.
    #[must_use]
    pub fn fired(&self) -> u64 {
        self.inner.fired.get()
    }
}

impl Drop for TimeoutLoop {
    fn drop(&mut self) {
        self.stop();
        // Drop the JS closure so it doesn't leak.
        self.inner.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for TimeoutLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TimeoutLoop")
            .field("running", &self.inner.running.get())
            .field("delay_ms", &self.inner.delay_ms)
            .field("fired", &self.inner.fired.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_convert_to_microsecond_ticks() {
        assert_eq!(millis_to_host_time(0.0), HostTime(0));
        assert_eq!(millis_to_host_time(10.0), HostTime(10_000));
        assert_eq!(millis_to_host_time(1.2345), HostTime(1_234));
    }
}
