// Copyright 2026 the Sluice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compute engine contract and the handle that owns an engine instance.
//!
//! A compute engine is an opaque unit that renders RGBA8 pixels into linear
//! memory it owns. [`ComputeEngine`] is the contract it exposes;
//! [`EngineHandle`] owns exactly one instance and is what the host and the
//! [`RenderLoop`](crate::scheduler::RenderLoop) talk to.
//!
//! # Frame locations
//!
//! [`EngineHandle::location`] describes the current frame as an address,
//! length, size and *generation*. The generation advances on every
//! [`resize`](EngineHandle::resize), so a location taken before a resize is
//! rejected by [`EngineHandle::view_at`] with
//! [`Error::DanglingView`](crate::Error::DanglingView) instead of being read.
//! Locations must be re-queried every cycle.

mod pixel_buffer;

pub use pixel_buffer::{PaintCommand, PixelBuffer, SPLATTER};

use alloc::rc::Rc;
use core::cell::RefCell;

use crate::error::{Error, Result};
use crate::view::{FrameView, frame_len};

/// An [`EngineHandle`] shared between the host and a render loop on one
/// thread.
pub type SharedEngine<E> = Rc<RefCell<EngineHandle<E>>>;

/// The contract of a pixel-producing compute engine.
///
/// Implementations own their frame memory. `frame()` must always be exactly
/// `width() * height() * 4` bytes of row-major RGBA8. Dropping the engine
/// releases its memory.
pub trait ComputeEngine {
    /// Engine-defined mutation applied by [`mutate`](Self::mutate).
    type Command;

    /// Creates an engine with a `width × height` frame.
    ///
    /// With `seed`, the frame starts as a copy of it; `seed` must hold exactly
    /// one frame or creation fails with [`Error::InvalidSeedSize`] before
    /// anything is allocated. Without `seed`, the frame is zero-filled.
    fn create(width: u32, height: u32, seed: Option<&[u8]>) -> Result<Self>
    where
        Self: Sized;

    /// Frame width in pixels.
    fn width(&self) -> u32;

    /// Frame height in pixels.
    fn height(&self) -> u32;

    /// The current frame's bytes.
    fn frame(&self) -> &[u8];

    /// Applies a mutation to the frame in place. The frame may move.
    fn mutate(&mut self, command: Self::Command);

    /// Reallocates the frame at a new size.
    ///
    /// On error the engine must be left unchanged.
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;
}

/// Where the current frame lives, valid until the next resize.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameLocation {
    /// Address of the first byte in the engine's memory.
    pub address: usize,
    /// Length in bytes (`width * height * 4`).
    pub len: usize,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Resize generation the location was taken in.
    pub generation: u64,
}

/// Exclusive owner of one compute engine instance.
///
/// There is no process-wide engine: create a handle, share it with
/// [`shared`](Self::shared), and attach it to a render loop.
#[derive(Debug)]
pub struct EngineHandle<E> {
    engine: E,
    generation: u64,
}

impl<E: ComputeEngine> EngineHandle<E> {
    /// Creates the engine with a `width × height` frame.
    ///
    /// See [`ComputeEngine::create`] for the seed contract.
    pub fn create(width: u32, height: u32, seed: Option<&[u8]>) -> Result<Self> {
        let engine = E::create(width, height, seed)?;
        Ok(Self::from_engine(engine))
    }

    /// Takes ownership of an already created engine.
    pub fn from_engine(engine: E) -> Self {
        debug_assert_eq!(
            frame_len(engine.width(), engine.height()).ok(),
            Some(engine.frame().len()),
            "engine frame length must be width * height * 4"
        );
        Self {
            engine,
            generation: 0,
        }
    }

    /// Wraps the handle for sharing with a render loop.
    #[must_use]
    pub fn shared(self) -> SharedEngine<E> {
        Rc::new(RefCell::new(self))
    }

    /// Frame width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.engine.width()
    }

    /// Frame height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.engine.height()
    }

    /// Address of the current frame. Re-query every cycle.
    #[must_use]
    pub fn frame_address(&self) -> usize {
        self.engine.frame().as_ptr().addr()
    }

    /// Length of the current frame in bytes.
    #[must_use]
    pub fn frame_len(&self) -> usize {
        self.engine.frame().len()
    }

    /// Number of resizes since creation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Describes the current frame.
    #[must_use]
    pub fn location(&self) -> FrameLocation {
        FrameLocation {
            address: self.frame_address(),
            len: self.frame_len(),
            width: self.width(),
            height: self.height(),
            generation: self.generation,
        }
    }

    /// Views the current frame.
    #[must_use]
    pub fn view(&self) -> FrameView<'_> {
        self.view_unchecked()
    }

    /// Views the frame described by `location`.
    ///
    /// Fails with [`Error::DanglingView`] unless `location` still describes
    /// the engine's current frame exactly.
    pub fn view_at(&self, location: &FrameLocation) -> Result<FrameView<'_>> {
        if *location != self.location() {
            return Err(Error::DanglingView);
        }
        Ok(self.view_unchecked())
    }

    fn view_unchecked(&self) -> FrameView<'_> {
        FrameView::from_engine_frame(self.engine.frame(), self.width(), self.height())
    }

    /// Applies an engine-defined mutation.
    pub fn mutate(&mut self, command: E::Command) {
        self.engine.mutate(command);
    }

    /// Reallocates the frame, invalidating every earlier [`FrameLocation`].
    ///
    /// Fails with [`Error::InvalidDimensions`] and leaves the handle unchanged
    /// if either dimension is zero.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        frame_len(width, height)?;
        self.engine.resize(width, height)?;
        self.generation += 1;
        tracing::debug!(width, height, generation = self.generation, "engine resized");
        Ok(())
    }

    /// Borrows the engine.
    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    type Handle = EngineHandle<PixelBuffer>;

    #[test]
    fn fresh_handle_exposes_one_zeroed_frame() {
        for (w, h) in [(1, 1), (2, 2), (3, 7), (385, 385)] {
            let handle = Handle::create(w, h, None).unwrap();
            let view = handle.view();
            assert_eq!(view.len(), w as usize * h as usize * 4, "{w}x{h}");
            assert!(view.as_bytes().iter().all(|&b| b == 0), "{w}x{h} zeroed");
            assert_eq!(handle.frame_len(), view.len());
        }
    }

    #[test]
    fn seed_must_match_frame_size() {
        let err = Handle::create(2, 2, Some(&[1, 2, 3])).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidSeedSize {
                expected: 16,
                actual: 3
            }
        );

        let seed: vec::Vec<u8> = (0..16).collect();
        let handle = Handle::create(2, 2, Some(&seed)).unwrap();
        assert_eq!(handle.view().as_bytes(), seed.as_slice());
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert_eq!(
            Handle::create(0, 2, None).unwrap_err(),
            Error::InvalidDimensions {
                width: 0,
                height: 2
            }
        );
    }

    #[test]
    fn resize_updates_dimensions_and_poisons_old_locations() {
        let mut handle = Handle::create(2, 2, None).unwrap();
        let before = handle.location();
        assert!(handle.view_at(&before).is_ok());

        handle.resize(3, 5).unwrap();
        assert_eq!((handle.width(), handle.height()), (3, 5));
        assert_eq!(handle.frame_len(), 3 * 5 * 4);
        assert_eq!(handle.generation(), 1);
        assert_eq!(handle.view_at(&before).unwrap_err(), Error::DanglingView);

        let after = handle.location();
        assert_eq!(handle.view_at(&after).map(|v| v.len()), Ok(60));
    }

    #[test]
    fn resize_to_same_size_still_poisons() {
        let mut handle = Handle::create(2, 2, None).unwrap();
        let before = handle.location();
        handle.resize(2, 2).unwrap();
        assert_eq!(handle.view_at(&before).unwrap_err(), Error::DanglingView);
    }

    #[test]
    fn failed_resize_leaves_handle_unchanged() {
        let mut handle = Handle::create(2, 2, None).unwrap();
        handle.mutate(PaintCommand::Splatter);
        let before = handle.location();

        assert!(handle.resize(0, 4).is_err());
        assert_eq!(handle.location(), before);
        assert_eq!(handle.view().pixel(1, 1), Some(SPLATTER));
    }

    #[test]
    fn mutate_keeps_location_valid() {
        let mut handle = Handle::create(2, 2, None).unwrap();
        let location = handle.location();
        handle.mutate(PaintCommand::Fill([255, 0, 0, 255]));
        let view = handle.view_at(&location).unwrap();
        assert_eq!(view.as_bytes(), [255, 0, 0, 255].repeat(4).as_slice());
    }
}
