// Copyright 2026 the Sluice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An in-memory drawing surface.

use sluice_core::SurfaceError;
use sluice_core::surface::{ContextKind, DrawingSurface};
use sluice_core::view::{BYTES_PER_PIXEL, FrameView, Rgba8};

/// A drawing surface whose pixels live in a `Vec<u8>`.
///
/// The surface adopts each presented frame's dimensions, so it always holds a
/// full copy of the latest frame. It supports [`ContextKind::Raster2D`], and
/// [`ContextKind::Accelerated3D`] when built with
/// [`with_accelerated`](Self::with_accelerated), where uploads land in the
/// same storage standing in for a texture.
#[derive(Clone, Default)]
pub struct MemorySurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    accelerated: bool,
    detached: bool,
    negotiated: Option<ContextKind>,
    presents: u64,
    uploads: u64,
    fail_next: Option<SurfaceError>,
}

impl core::fmt::Debug for MemorySurface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemorySurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("negotiated", &self.negotiated)
            .field("presents", &self.presents)
            .field("uploads", &self.uploads)
            .finish_non_exhaustive()
    }
}

impl MemorySurface {
    /// A raster-only surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface that also accepts [`ContextKind::Accelerated3D`].
    #[must_use]
    pub fn with_accelerated() -> Self {
        Self {
            accelerated: true,
            ..Self::default()
        }
    }

    /// Simulates the host removing the surface. Later presents fail with
    /// [`SurfaceError::Detached`].
    pub fn detach(&mut self) {
        self.detached = true;
    }

    /// Makes the next present fail with `err`.
    pub fn fail_next(&mut self, err: SurfaceError) {
        self.fail_next = Some(err);
    }

    /// Width of the latest frame.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the latest frame.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes of the latest frame.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixel at `(x, y)` of the latest frame.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        self.pixels
            .get(offset..offset + BYTES_PER_PIXEL)?
            .try_into()
            .ok()
    }

    /// The negotiated kind, if any.
    #[must_use]
    pub fn negotiated(&self) -> Option<ContextKind> {
        self.negotiated
    }

    /// Number of successful blits.
    #[must_use]
    pub fn presents(&self) -> u64 {
        self.presents
    }

    /// Number of successful uploads.
    #[must_use]
    pub fn uploads(&self) -> u64 {
        self.uploads
    }

    fn store(&mut self, frame: &FrameView<'_>) -> Result<(), SurfaceError> {
        if let Some(err) = self.fail_next.take() {
            return Err(err);
        }
        if (self.width, self.height) != (frame.width(), frame.height()) {
            tracing::debug!(
                width = frame.width(),
                height = frame.height(),
                "memory surface resized"
            );
            self.width = frame.width();
            self.height = frame.height();
        }
        self.pixels.clear();
        self.pixels.extend_from_slice(frame.as_bytes());
        Ok(())
    }
}

impl DrawingSurface for MemorySurface {
    fn is_mounted(&self) -> bool {
        !self.detached
    }

    fn negotiate(&mut self, kind: ContextKind) -> bool {
        let ok = match kind {
            ContextKind::Raster2D => true,
            ContextKind::Accelerated3D => self.accelerated,
        };
        if ok {
            self.negotiated = Some(kind);
        }
        ok
    }

    fn blit(&mut self, frame: &FrameView<'_>) -> Result<(), SurfaceError> {
        if self.negotiated != Some(ContextKind::Raster2D) {
            return Err(SurfaceError::Unsupported(ContextKind::Raster2D));
        }
        self.store(frame)?;
        self.presents += 1;
        Ok(())
    }

    fn upload(&mut self, frame: &FrameView<'_>) -> Result<(), SurfaceError> {
        if self.negotiated != Some(ContextKind::Accelerated3D) {
            return Err(SurfaceError::Unsupported(ContextKind::Accelerated3D));
        }
        self.store(frame)?;
        self.uploads += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::Error;
    use sluice_core::engine::{EngineHandle, PaintCommand, PixelBuffer};
    use sluice_core::surface::Surface;

    #[test]
    fn raster_present_is_an_exact_copy() {
        let mut handle = EngineHandle::<PixelBuffer>::create(2, 2, None).unwrap();
        handle.mutate(PaintCommand::Fill([255, 0, 0, 255]));

        let mut surface = Surface::new(MemorySurface::new());
        let context = surface.acquire(ContextKind::Raster2D).unwrap();
        context.present_frame(&handle.view()).unwrap();

        surface
            .with_backend(|mem| {
                assert_eq!((mem.width(), mem.height()), (2, 2));
                assert_eq!(mem.pixels(), [255, 0, 0, 255].repeat(4).as_slice());
                assert_eq!(mem.presents(), 1);
            })
            .unwrap();
    }

    #[test]
    fn surface_adopts_new_frame_size() {
        let mut handle = EngineHandle::<PixelBuffer>::create(2, 2, None).unwrap();
        let mut surface = Surface::new(MemorySurface::new());
        let context = surface.acquire(ContextKind::Raster2D).unwrap();
        context.present_frame(&handle.view()).unwrap();

        handle.resize(3, 1).unwrap();
        handle.mutate(PaintCommand::Plot {
            x: 2,
            y: 0,
            color: [9, 8, 7, 6],
        });
        context.present_frame(&handle.view()).unwrap();

        let (size, px) = surface
            .with_backend(|mem| ((mem.width(), mem.height()), mem.pixel(2, 0)))
            .unwrap();
        assert_eq!(size, (3, 1));
        assert_eq!(px, Some([9, 8, 7, 6]));
    }

    #[test]
    fn accelerated_requires_opt_in() {
        let mut raster_only = Surface::new(MemorySurface::new());
        assert_eq!(
            raster_only.acquire(ContextKind::Accelerated3D).unwrap_err(),
            Error::UnsupportedContextKind(ContextKind::Accelerated3D)
        );

        let handle = EngineHandle::<PixelBuffer>::create(1, 1, None).unwrap();
        let mut both = Surface::new(MemorySurface::with_accelerated());
        let context = both.acquire(ContextKind::Accelerated3D).unwrap();
        context.present_frame(&handle.view()).unwrap();
        assert_eq!(both.with_backend(|mem| mem.uploads()), Ok(1));
    }

    #[test]
    fn detached_surface_is_not_live() {
        let mut surface = Surface::new(MemorySurface::new());
        let context = surface.acquire(ContextKind::Raster2D).unwrap();
        surface.with_backend(MemorySurface::detach).unwrap();
        assert!(!context.is_live());
        assert_eq!(
            surface.acquire(ContextKind::Raster2D).unwrap_err(),
            Error::SurfaceUnavailable
        );
    }

    #[test]
    fn injected_failure_hits_one_present() {
        let handle = EngineHandle::<PixelBuffer>::create(1, 1, None).unwrap();
        let mut surface = Surface::new(MemorySurface::new());
        let context = surface.acquire(ContextKind::Raster2D).unwrap();
        surface
            .with_backend(|mem| mem.fail_next(SurfaceError::Timeout))
            .unwrap();
        assert_eq!(
            context.present_frame(&handle.view()),
            Err(SurfaceError::Timeout)
        );
        assert_eq!(context.present_frame(&handle.view()), Ok(()));
    }
}
