// Copyright 2026 the Sluice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `<canvas>` drawing surface.
//!
//! [`CanvasSurface`] negotiates a `"2d"` context for
//! [`ContextKind::Raster2D`] or a `"webgl2"` context for
//! [`ContextKind::Accelerated3D`]. Raster frames are wrapped in an
//! `ImageData` that views the engine's memory and written with
//! `putImageData` at (0, 0); accelerated frames are uploaded into a
//! `TEXTURE_2D`.

use alloc::format;

use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{
    CanvasRenderingContext2d, HtmlCanvasElement, ImageData, WebGl2RenderingContext, WebGlTexture,
};

use sluice_core::SurfaceError;
use sluice_core::surface::{ContextKind, DrawingSurface};
use sluice_core::view::FrameView;

enum Negotiated {
    Raster(CanvasRenderingContext2d),
    WebGl {
        gl: WebGl2RenderingContext,
        texture: Option<WebGlTexture>,
    },
}

/// A drawing surface backed by an `HtmlCanvasElement`.
///
/// The canvas is resized to the frame's dimensions whenever they differ, so
/// every present covers the whole canvas.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    negotiated: Option<Negotiated>,
}

impl core::fmt::Debug for CanvasSurface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let kind = self.negotiated.as_ref().map(|n| match n {
            Negotiated::Raster(_) => ContextKind::Raster2D,
            Negotiated::WebGl { .. } => ContextKind::Accelerated3D,
        });
        f.debug_struct("CanvasSurface")
            .field("canvas", &"HtmlCanvasElement")
            .field("negotiated", &kind)
            .finish_non_exhaustive()
    }
}

impl CanvasSurface {
    /// Wraps `canvas`. No context is requested until negotiation.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self {
            canvas,
            negotiated: None,
        }
    }

    /// The wrapped canvas element.
    #[must_use]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// The WebGL2 context, once negotiated.
    #[must_use]
    pub fn gl(&self) -> Option<&WebGl2RenderingContext> {
        match &self.negotiated {
            Some(Negotiated::WebGl { gl, .. }) => Some(gl),
            _ => None,
        }
    }

    /// The texture holding the latest uploaded frame.
    #[must_use]
    pub fn texture(&self) -> Option<&WebGlTexture> {
        match &self.negotiated {
            Some(Negotiated::WebGl { texture, .. }) => texture.as_ref(),
            _ => None,
        }
    }

    fn fit_to(&self, frame: &FrameView<'_>) {
        if self.canvas.width() != frame.width() {
            self.canvas.set_width(frame.width());
        }
        if self.canvas.height() != frame.height() {
            self.canvas.set_height(frame.height());
        }
    }

    fn context<T: JsCast>(&self, id: &str) -> Option<T> {
        self.canvas
            .get_context(id)
            .ok()
            .flatten()
            .and_then(|ctx| ctx.dyn_into::<T>().ok())
    }
}

fn js_error(err: JsValue) -> SurfaceError {
    SurfaceError::backend(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

fn gl_int(value: u32) -> Result<i32, SurfaceError> {
    i32::try_from(value).map_err(|_| SurfaceError::backend(format!("{value} exceeds GLint")))
}

impl DrawingSurface for CanvasSurface {
    fn is_mounted(&self) -> bool {
        self.canvas.is_connected()
    }

    fn negotiate(&mut self, kind: ContextKind) -> bool {
        let negotiated = match kind {
            ContextKind::Raster2D => self.context("2d").map(Negotiated::Raster),
            ContextKind::Accelerated3D => self
                .context("webgl2")
                .map(|gl| Negotiated::WebGl { gl, texture: None }),
        };
        let ok = negotiated.is_some();
        self.negotiated = negotiated;
        ok
    }

    fn blit(&mut self, frame: &FrameView<'_>) -> Result<(), SurfaceError> {
        let Some(Negotiated::Raster(ctx)) = &self.negotiated else {
            return Err(SurfaceError::Unsupported(ContextKind::Raster2D));
        };
        self.fit_to(frame);
        let image = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(frame.as_bytes()),
            frame.width(),
            frame.height(),
        )
        .map_err(js_error)?;
        ctx.put_image_data(&image, 0.0, 0.0).map_err(js_error)
    }

    fn upload(&mut self, frame: &FrameView<'_>) -> Result<(), SurfaceError> {
        self.fit_to(frame);
        let Some(Negotiated::WebGl { gl, texture: slot }) = &mut self.negotiated else {
            return Err(SurfaceError::Unsupported(ContextKind::Accelerated3D));
        };
        if gl.is_context_lost() {
            *slot = None;
            return Err(SurfaceError::Lost);
        }
        let texture = match slot.take() {
            Some(texture) => texture,
            None => gl
                .create_texture()
                .ok_or_else(|| SurfaceError::backend("createTexture failed"))?,
        };

        let target = WebGl2RenderingContext::TEXTURE_2D;
        gl.bind_texture(target, Some(&texture));
        *slot = Some(texture);

        let nearest = gl_int(WebGl2RenderingContext::NEAREST)?;
        gl.tex_parameteri(target, WebGl2RenderingContext::TEXTURE_MIN_FILTER, nearest);
        gl.tex_parameteri(target, WebGl2RenderingContext::TEXTURE_MAG_FILTER, nearest);
        gl.pixel_storei(WebGl2RenderingContext::UNPACK_ALIGNMENT, 4);
        gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
            target,
            0,
            gl_int(WebGl2RenderingContext::RGBA8)?,
            gl_int(frame.width())?,
            gl_int(frame.height())?,
            0,
            WebGl2RenderingContext::RGBA,
            WebGl2RenderingContext::UNSIGNED_BYTE,
            Some(frame.as_bytes()),
        )
        .map_err(js_error)
    }
}
