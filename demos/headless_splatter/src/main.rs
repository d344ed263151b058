// Copyright 2026 the Sluice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Native demo: a 385×385 engine frame is presented into a memory surface.
//!
//! The demo runs a few cycles of a blank frame, pauses, splatters the frame,
//! resumes, and stops, printing the achieved cycle rate.
//!
//! ```text
//! cargo run -p headless_splatter
//! cargo run -p headless_splatter -- --chrome trace.json
//! ```
//!
//! With `--chrome`, the session is recorded and exported as Chrome Trace
//! Event Format JSON instead of being pretty-printed to stderr.

use std::error::Error;
use std::fs::File;
use std::io::BufWriter;

use sluice_backend_headless::{MemorySurface, now, run_cycles, timebase};
use sluice_core::config::LoopConfig;
use sluice_core::engine::{EngineHandle, PaintCommand, PixelBuffer, SPLATTER};
use sluice_core::scheduler::RenderLoop;
use sluice_core::surface::{ContextKind, Surface};
use sluice_core::trace::TraceSink;
use sluice_debug::pretty::PrettyPrintSink;
use sluice_debug::recorder::RecorderSink;

const SIZE: u32 = 385;
const CYCLES: usize = 5;

fn run<T: TraceSink>(sink: T) -> Result<T, Box<dyn Error>> {
    let engine = EngineHandle::<PixelBuffer>::create(SIZE, SIZE, None)?.shared();
    let mut surface = Surface::new(MemorySurface::new());

    let mut render_loop = RenderLoop::with_trace_sink(LoopConfig::native(), sink);
    render_loop.attach_engine(engine.clone())?;
    render_loop.attach_context(surface.acquire(ContextKind::Raster2D)?)?;
    render_loop.start()?;

    run_cycles(&mut render_loop, CYCLES)?;
    let before = surface.with_backend(|mem| mem.pixel(0, 0))?;
    tracing::info!(?before, "blank frames presented");

    render_loop.pause();
    engine.borrow_mut().mutate(PaintCommand::Splatter);
    render_loop.resume();
    run_cycles(&mut render_loop, CYCLES)?;

    let after = surface.with_backend(|mem| mem.pixel(SIZE / 2, SIZE / 2))?;
    assert_eq!(after, Some(SPLATTER), "resumed cycles show the splatter");

    if let Some(hz) = render_loop.sampler().smoothed_rate_hz(timebase()) {
        println!("{} cycles at ~{hz:.1} Hz", render_loop.cycles_presented());
    }
    let presents = surface.with_backend(|mem| mem.presents())?;
    println!("surface received {presents} frames, last at {:?}", now());

    render_loop.stop();
    Ok(render_loop.into_trace_sink())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    match (args.next().as_deref(), args.next()) {
        (Some("--chrome"), Some(path)) => {
            let recorder = run(RecorderSink::new())?;
            let mut out = BufWriter::new(File::create(&path)?);
            sluice_debug::chrome::export(recorder.as_bytes(), timebase(), &mut out)?;
            println!("wrote {path}");
        }
        (None, _) => {
            run(PrettyPrintSink::stderr(timebase()))?;
        }
        _ => return Err("usage: headless_splatter [--chrome <trace.json>]".into()),
    }
    Ok(())
}
