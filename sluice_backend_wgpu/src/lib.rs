// Copyright 2026 the Sluice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! wgpu backend for sluice.
//!
//! [`TextureSurface`] provides [`ContextKind::Accelerated3D`] contexts: each
//! presented frame is written into an `Rgba8Unorm` texture with
//! [`Queue::write_texture`](wgpu::Queue::write_texture). Drawing that texture
//! is left to the host, through
//! [`AcceleratedContext::with_surface`](sluice_core::surface::AcceleratedContext::with_surface).

use sluice_core::SurfaceError;
use sluice_core::surface::{ContextKind, DrawingSurface};
use sluice_core::view::FrameView;

/// Texture format frames are uploaded in.
pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// A drawing surface that uploads frames into a GPU texture.
///
/// The texture is created on the first upload and recreated whenever the
/// frame size changes.
pub struct TextureSurface {
    device: wgpu::Device,
    queue: wgpu::Queue,
    texture: Option<wgpu::Texture>,
    uploads: u64,
}

impl core::fmt::Debug for TextureSurface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TextureSurface")
            .field("size", &self.texture.as_ref().map(wgpu::Texture::size))
            .field("uploads", &self.uploads)
            .finish_non_exhaustive()
    }
}

impl TextureSurface {
    /// Wraps an existing device and queue.
    #[must_use]
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            texture: None,
            uploads: 0,
        }
    }

    /// Creates a device on the default adapter, blocking until it is ready.
    pub fn headless() -> Result<Self, SurfaceError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter =
            pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
                .map_err(|e| SurfaceError::backend(format!("wgpu request_adapter failed: {e}")))?;
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("sluice"),
            ..wgpu::DeviceDescriptor::default()
        }))
        .map_err(|e| SurfaceError::backend(format!("wgpu request_device failed: {e}")))?;
        Ok(Self::new(device, queue))
    }

    /// The device textures are created on.
    #[must_use]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// The queue uploads are written through.
    #[must_use]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// The texture holding the latest frame.
    #[must_use]
    pub fn texture(&self) -> Option<&wgpu::Texture> {
        self.texture.as_ref()
    }

    /// Number of successful uploads.
    #[must_use]
    pub fn uploads(&self) -> u64 {
        self.uploads
    }

    fn ensure_texture(&mut self, size: wgpu::Extent3d) -> Result<(), SurfaceError> {
        let max = self.device.limits().max_texture_dimension_2d;
        if size.width > max || size.height > max {
            return Err(SurfaceError::backend(format!(
                "{}x{} frame exceeds the {max} texel texture limit",
                size.width, size.height
            )));
        }
        if self.texture.as_ref().map(wgpu::Texture::size) != Some(size) {
            tracing::debug!(size.width, size.height, "creating frame texture");
            self.texture = Some(self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("sluice_frame"),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_DST
                    | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            }));
        }
        Ok(())
    }
}

impl DrawingSurface for TextureSurface {
    fn negotiate(&mut self, kind: ContextKind) -> bool {
        kind == ContextKind::Accelerated3D
    }

    fn upload(&mut self, frame: &FrameView<'_>) -> Result<(), SurfaceError> {
        let size = wgpu::Extent3d {
            width: frame.width(),
            height: frame.height(),
            depth_or_array_layers: 1,
        };
        let bytes_per_row = u32::try_from(frame.stride())
            .map_err(|_| SurfaceError::backend("frame row exceeds u32 bytes"))?;

        self.ensure_texture(size)?;
        let Some(texture) = &self.texture else {
            return Err(SurfaceError::Lost);
        };
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            frame.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(frame.height()),
            },
            size,
        );
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

    fn backend() -> TextureSurface {
        TextureSurface::headless().expect("a wgpu adapter is available")
    }

    #[test]
    #[ignore = "needs a wgpu adapter"]
    fn only_accelerated_is_negotiated() {
        let mut surface = Surface::new(backend());
        assert_eq!(
            surface.acquire(ContextKind::Raster2D).unwrap_err(),
            Error::UnsupportedContextKind(ContextKind::Raster2D)
        );
        assert!(surface.acquire(ContextKind::Accelerated3D).is_ok());
    }

    #[test]
    #[ignore = "needs a wgpu adapter"]
    fn upload_creates_and_resizes_the_texture() {
        let mut handle = EngineHandle::<PixelBuffer>::create(4, 2, None).unwrap();
        handle.mutate(PaintCommand::Splatter);

        let mut surface = Surface::new(backend());
        let context = surface.acquire(ContextKind::Accelerated3D).unwrap();
        context.present_frame(&handle.view()).unwrap();
        let size = context
            .with_backend(|b| b.texture().map(wgpu::Texture::size))
            .unwrap();
        assert_eq!(
            size,
            Some(wgpu::Extent3d {
                width: 4,
                height: 2,
                depth_or_array_layers: 1
            })
        );

        handle.resize(3, 3).unwrap();
        context.present_frame(&handle.view()).unwrap();
        let (size, uploads) = context
            .with_backend(|b| (b.texture().map(|t| (t.width(), t.height())), b.uploads()))
            .unwrap();
        assert_eq!(size, Some((3, 3)));
        assert_eq!(uploads, 2);
    }
}
