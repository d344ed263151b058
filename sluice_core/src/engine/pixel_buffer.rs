// Copyright 2026 the Sluice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The stock RGBA8 engine.

use alloc::vec;
use alloc::vec::Vec;

use super::ComputeEngine;
use crate::error::{Error, Result};
use crate::view::{BYTES_PER_PIXEL, Rgba8, frame_len};

/// The demo "splatter" color: opaque blood red.
pub const SPLATTER: Rgba8 = [252, 3, 27, 255];

/// Mutations understood by [`PixelBuffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaintCommand {
    /// Sets every pixel to a color.
    Fill(Rgba8),
    /// Sets every pixel to [`SPLATTER`].
    Splatter,
    /// Sets every byte to zero (transparent black).
    Clear,
    /// Sets one pixel. Out-of-range coordinates are ignored.
    Plot {
        /// Column.
        x: u32,
        /// Row.
        y: u32,
        /// New color.
        color: Rgba8,
    },
}

/// A heap-allocated RGBA8 frame mutated in place.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    fn fill(&mut self, color: Rgba8) {
        for px in self.data.chunks_exact_mut(BYTES_PER_PIXEL) {
            px.copy_from_slice(&color);
        }
    }

    fn plot(&mut self, x: u32, y: u32, color: Rgba8) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        if let Some(px) = self.data.get_mut(offset..offset + BYTES_PER_PIXEL) {
            px.copy_from_slice(&color);
        }
    }
}

impl ComputeEngine for PixelBuffer {
    type Command = PaintCommand;

    fn create(width: u32, height: u32, seed: Option<&[u8]>) -> Result<Self> {
        let len = frame_len(width, height)?;
        let data = match seed {
            Some(seed) if seed.len() != len => {
                return Err(Error::InvalidSeedSize {
                    expected: len,
                    actual: seed.len(),
                });
            }
            Some(seed) => seed.to_vec(),
            None => vec![0; len],
        };
        Ok(Self {
            width,
            height,
            data,
        })
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn frame(&self) -> &[u8] {
        &self.data
    }

    fn mutate(&mut self, command: PaintCommand) {
        match command {
            PaintCommand::Fill(color) => self.fill(color),
            PaintCommand::Splatter => self.fill(SPLATTER),
            PaintCommand::Clear => self.data.fill(0),
            PaintCommand::Plot { x, y, color } => self.plot(x, y, color),
        }
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let len = frame_len(width, height)?;
        // Fresh allocation; the old frame is released here.
        self.data = vec![0; len];
        self.width = width;
        self.height = height;
        Ok(())
    }
}

impl core::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splatter_paints_every_pixel() {
        let mut buf = PixelBuffer::create(385, 385, None).unwrap();
        buf.mutate(PaintCommand::Splatter);
        assert_eq!(buf.frame().len(), 385 * 385 * 4);
        assert!(
            buf.frame()
                .chunks_exact(4)
                .all(|px| px == [252, 3, 27, 255])
        );
    }

    #[test]
    fn plot_ignores_out_of_range() {
        let mut buf = PixelBuffer::create(2, 2, None).unwrap();
        buf.mutate(PaintCommand::Plot {
            x: 1,
            y: 0,
            color: [1, 2, 3, 4],
        });
        buf.mutate(PaintCommand::Plot {
            x: 2,
            y: 0,
            color: [9; 4],
        });
        assert_eq!(
            buf.frame(),
            [0, 0, 0, 0, 1, 2, 3, 4, 0, 0, 0, 0, 0, 0, 0, 0].as_slice()
        );
    }

    #[test]
    fn clear_zeroes() {
        let mut buf = PixelBuffer::create(3, 1, None).unwrap();
        buf.mutate(PaintCommand::Fill([7; 4]));
        buf.mutate(PaintCommand::Clear);
        assert!(buf.frame().iter().all(|&b| b == 0));
    }

    #[test]
    fn resize_zero_fills_new_frame() {
        let mut buf = PixelBuffer::create(2, 2, None).unwrap();
        buf.mutate(PaintCommand::Splatter);
        buf.resize(4, 1).unwrap();
        assert_eq!((buf.width(), buf.height()), (4, 1));
        assert_eq!(buf.frame(), [0; 16].as_slice());
    }

    #[test]
    fn mutate_does_not_move_the_frame() {
        let mut buf = PixelBuffer::create(8, 8, None).unwrap();
        let before = buf.frame().as_ptr();
        buf.mutate(PaintCommand::Fill([1; 4]));
        assert_eq!(buf.frame().as_ptr(), before);
    }
}
