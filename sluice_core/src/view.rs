// Copyright 2026 the Sluice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Borrowed read-only views over one frame of engine memory.
//!
//! A [`FrameView`] is the only way frame bytes leave an
//! [`EngineHandle`](crate::engine::EngineHandle). It borrows the handle, so
//! it cannot outlive the cycle that created it, and it cannot be held across
//! a `resize`:
//!
//! ```compile_fail
//! use sluice_core::engine::{EngineHandle, PixelBuffer};
//!
//! let mut handle = EngineHandle::<PixelBuffer>::create(2, 2, None).unwrap();
//! let view = handle.view();
//! handle.resize(4, 4).unwrap(); // error: `handle` is borrowed by `view`
//! assert_eq!(view.len(), 16);
//! ```

use alloc::vec::Vec;
use core::slice::ChunksExact;

use crate::error::{Error, Result};

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// One RGBA8 pixel, `[r, g, b, a]`.
pub type Rgba8 = [u8; BYTES_PER_PIXEL];

/// Returns the byte length of a `width × height` RGBA8 frame.
///
/// Fails with [`Error::InvalidDimensions`] when either dimension is zero or
/// the length overflows `usize`.
pub fn frame_len(width: u32, height: u32) -> Result<usize> {
    let invalid = Error::InvalidDimensions { width, height };
    if width == 0 || height == 0 {
        return Err(invalid);
    }
    usize::try_from(width)
        .ok()
        .zip(usize::try_from(height).ok())
        .and_then(|(w, h)| w.checked_mul(h))
        .and_then(|px| px.checked_mul(BYTES_PER_PIXEL))
        .ok_or(invalid)
}

/// A read-only window over one RGBA8 frame, row-major, stride `width * 4`.
///
/// The view never owns or copies the bytes; [`to_vec`](Self::to_vec) is the
/// one explicit copy.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FrameView<'a> {
    bytes: &'a [u8],
    width: u32,
    height: u32,
}

impl<'a> FrameView<'a> {
    /// Wraps `bytes` as a `width × height` frame.
    ///
    /// Fails with [`Error::InvalidDimensions`] if the dimensions are invalid
    /// or do not describe exactly `bytes.len()` bytes.
    pub fn new(bytes: &'a [u8], width: u32, height: u32) -> Result<Self> {
        if frame_len(width, height)? != bytes.len() {
            return Err(Error::InvalidDimensions { width, height });
        }
        Ok(Self {
            bytes,
            width,
            height,
        })
    }

    /// Wraps an engine frame whose length the engine contract guarantees.
    pub(crate) fn from_engine_frame(bytes: &'a [u8], width: u32, height: u32) -> Self {
        debug_assert_eq!(frame_len(width, height).ok(), Some(bytes.len()));
        Self {
            bytes,
            width,
            height,
        }
    }

    /// Frame width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.bytes.len() / self.height as usize
    }

    /// Length in bytes (`width * height * 4`).
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always `false`; frames have non-zero dimensions.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw RGBA8 bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// All pixels in row-major order.
    #[must_use]
    pub fn pixels(&self) -> &'a [Rgba8] {
        bytemuck::cast_slice(self.bytes)
    }

    /// Iterates over rows of pixels, top to bottom.
    #[must_use]
    pub fn rows(&self) -> ChunksExact<'a, Rgba8> {
        self.pixels().chunks_exact(self.width as usize)
    }

    /// Returns row `y`, or `None` if out of range.
    #[must_use]
    pub fn row(&self, y: u32) -> Option<&'a [Rgba8]> {
        if y >= self.height {
            return None;
        }
        let w = self.width as usize;
        let start = y as usize * w;
        self.pixels().get(start..start + w)
    }

    /// Returns the pixel at `(x, y)`, or `None` if out of range.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        if x >= self.width {
            return None;
        }
        self.row(y)?.get(x as usize).copied()
    }

    /// Copies the frame into a new buffer.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }
}

impl core::fmt::Debug for FrameView<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameView")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}
