// Copyright 2026 the Sluice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web demo: a frame owned by wasm memory is presented to a `<canvas>`.
//!
//! JavaScript constructs a [`DirectCanvas`] over a canvas element, then
//! mutates the frame (`splatter`, `clear`, `plot`) while the render loop
//! presents it every 10 ms. `frame_address` and `frame_len` locate the frame
//! in wasm linear memory so the page can also read it directly.
//!
//! Build with: `wasm-pack build --target web demos/web_canvas`
//! Then serve `demos/web_canvas/` and open `index.html`.

#![no_std]
#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

extern crate alloc;

use alloc::rc::Rc;
use alloc::string::ToString as _;
use core::cell::RefCell;

use sluice_backend_web::{CanvasSurface, TimeoutLoop, drive, timebase};
use sluice_core::config::LoopConfig;
use sluice_core::engine::{EngineHandle, PaintCommand, PixelBuffer, SharedEngine};
use sluice_core::scheduler::{LoopState, RenderLoop};
use sluice_core::surface::{ContextKind, Surface};
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

const DELAY_MS: i32 = 10;

type Loop = RenderLoop<PixelBuffer, CanvasSurface>;

fn js_error(err: sluice_core::Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// A canvas fed from a wasm-owned RGBA8 frame.
#[wasm_bindgen]
#[derive(Debug)]
pub struct DirectCanvas {
    surface: Surface<CanvasSurface>,
    engine: SharedEngine<PixelBuffer>,
    render_loop: Rc<RefCell<Loop>>,
    timer: TimeoutLoop,
}

#[wasm_bindgen]
impl DirectCanvas {
    /// Creates a `width`×`height` transparent frame and starts presenting it
    /// to `canvas` through a WebGL2 texture (`accelerated`) or the 2D context.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas: HtmlCanvasElement,
        width: u32,
        height: u32,
        accelerated: bool,
    ) -> Result<Self, JsValue> {
        let kind = if accelerated {
            ContextKind::Accelerated3D
        } else {
            ContextKind::Raster2D
        };
        let engine = EngineHandle::<PixelBuffer>::create(width, height, None)
            .map_err(js_error)?
            .shared();
        let mut surface = Surface::new(CanvasSurface::new(canvas));
        let context = surface.acquire(kind).map_err(js_error)?;

        let mut render_loop = Loop::new(LoopConfig::web());
        render_loop.attach_engine(engine.clone()).map_err(js_error)?;
        render_loop.attach_context(context).map_err(js_error)?;
        render_loop.start().map_err(js_error)?;

        let render_loop = Rc::new(RefCell::new(render_loop));
        let timer = drive(render_loop.clone(), DELAY_MS);
        timer.start();

        Ok(Self {
            surface,
            engine,
            render_loop,
            timer,
        })
    }

    /// Paints the whole frame in the splatter color.
    pub fn splatter(&self) {
        self.engine.borrow_mut().mutate(PaintCommand::Splatter);
    }

    /// Clears the frame to transparent black.
    pub fn clear(&self) {
        self.engine.borrow_mut().mutate(PaintCommand::Clear);
    }

    /// Sets the pixel at `(x, y)`. Out-of-range coordinates are ignored.
    pub fn plot(&self, x: u32, y: u32, r: u8, g: u8, b: u8, a: u8) {
        self.engine.borrow_mut().mutate(PaintCommand::Plot {
            x,
            y,
            color: [r, g, b, a],
        });
    }

    /// Reallocates the frame at a new size. The next present resizes the
    /// canvas to match.
    pub fn resize(&self, width: u32, height: u32) -> Result<(), JsValue> {
        self.engine
            .borrow_mut()
            .resize(width, height)
            .map_err(js_error)
    }

    /// Address of the frame in wasm linear memory.
    pub fn frame_address(&self) -> usize {
        self.engine.borrow().frame_address()
    }

    /// Length of the frame in bytes.
    pub fn frame_len(&self) -> usize {
        self.engine.borrow().frame_len()
    }

    /// Pauses presentation; the frame can still be mutated.
    pub fn pause(&self) -> bool {
        self.render_loop.borrow_mut().pause()
    }

    /// Resumes presentation with the current frame.
    pub fn resume(&self) -> bool {
        self.render_loop.borrow_mut().resume()
    }

    /// Stops the loop and its timer, and releases the canvas.
    pub fn stop(&mut self) {
        self.render_loop.borrow_mut().stop();
        self.timer.stop();
        self.surface.unmount();
    }

    /// Whether the loop is still presenting frames.
    pub fn running(&self) -> bool {
        self.render_loop.borrow().state() == LoopState::Running
    }

    /// Smoothed presentation rate in frames per second.
    pub fn fps(&self) -> Option<f64> {
        self.render_loop
            .borrow()
            .sampler()
            .smoothed_rate_hz(timebase())
    }
}
