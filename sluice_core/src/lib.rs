// Copyright 2026 the Sluice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Zero-copy frame transfer from a pixel-producing engine to a drawing surface.
//!
//! `sluice_core` bridges an opaque compute engine, which renders RGBA8 pixels
//! into memory it owns, and a host-side drawing surface. Frames are handed to
//! the surface as borrowed views over the engine's own buffer; nothing is
//! copied unless a backend chooses to take its own copy. It is `no_std`
//! compatible (with `alloc`).
//!
//! # Architecture
//!
//! One cooperative render loop drives every transfer:
//!
//! ```text
//!   Surface::acquire(kind) ──► Context (Raster2D | Accelerated3D)
//!                                  │
//!   EngineHandle ──► FrameLocation │
//!        │                         ▼
//!        └──► FrameView<'_> ──► Context::present() ──► FrameRateSampler::record()
//!                                                          │
//!   RenderLoop::poll(now) ◄── next_due = now + min_delay ◄─┘
//! ```
//!
//! **[`engine`]**: The [`ComputeEngine`](engine::ComputeEngine) contract, the
//! [`EngineHandle`](engine::EngineHandle) that owns one engine instance, and
//! the stock [`PixelBuffer`](engine::PixelBuffer) engine.
//!
//! **[`view`]**: [`FrameView`](view::FrameView), a borrowed read-only window
//! over one frame, valid for a single cycle.
//!
//! **[`surface`]**: The [`DrawingSurface`](surface::DrawingSurface) trait that
//! backends implement, and context acquisition through
//! [`Surface`](surface::Surface).
//!
//! **[`scheduler`]**: [`RenderLoop`](scheduler::RenderLoop), the
//! `Idle → Running ⇄ Paused → Stopped` state machine that runs cycles.
//!
//! **[`rate`]**: [`FrameRateSampler`](rate::FrameRateSampler) for observing
//! the achieved cycle rate.
//!
//! **[`config`]**: [`LoopConfig`](config::LoopConfig) presets.
//!
//! **[`time`]**: Host-time tick types shared with backends.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! render-loop instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod config;
pub mod engine;
mod error;
pub mod rate;
pub mod scheduler;
pub mod surface;
pub mod time;
pub mod trace;
pub mod view;

pub use error::{Error, MissingDependency, Result, SurfaceError};
