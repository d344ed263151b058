// Copyright 2026 the Sluice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing surfaces and presentation-context acquisition.
//!
//! Backends implement [`DrawingSurface`]. The host wraps one in a [`Surface`]
//! and calls [`Surface::acquire`] to negotiate a [`Context`] of a given
//! [`ContextKind`]. Negotiation happens once per mounted backend; the result
//! is cached, so later acquisitions of the same kind return the same
//! context and acquisitions of another kind fail with
//! [`Error::ContextKindConflict`].
//!
//! A context shares its backend with the surface. Unmounting the surface
//! detaches every context acquired from it: presents then fail with
//! [`SurfaceError::Detached`] and [`Context::is_live`] returns `false`.

use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::error::{Error, Result, SurfaceError};
use crate::view::FrameView;

/// The kind of presentation context a surface can provide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContextKind {
    /// CPU pixel blits.
    Raster2D,
    /// GPU texture uploads.
    Accelerated3D,
}

impl ContextKind {
    /// Short lowercase name, as used in logs and trace output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Raster2D => "raster-2d",
            Self::Accelerated3D => "accelerated-3d",
        }
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A host drawing target.
///
/// Implement [`negotiate`](Self::negotiate) plus the presentation method for
/// each kind the backend supports. The defaults report
/// [`SurfaceError::Unsupported`].
pub trait DrawingSurface {
    /// Whether the surface is still attached to the host (e.g. in the DOM).
    fn is_mounted(&self) -> bool {
        true
    }

    /// Prepares the backend for `kind`, returning `false` if it cannot
    /// provide it. Called at most once per successful acquisition.
    fn negotiate(&mut self, kind: ContextKind) -> bool;

    /// Copies `frame` to the surface at (0, 0), replacing every pixel.
    fn blit(&mut self, frame: &FrameView<'_>) -> Result<(), SurfaceError> {
        _ = frame;
        Err(SurfaceError::Unsupported(ContextKind::Raster2D))
    }

    /// Uploads `frame` into the backend's GPU resource.
    fn upload(&mut self, frame: &FrameView<'_>) -> Result<(), SurfaceError> {
        _ = frame;
        Err(SurfaceError::Unsupported(ContextKind::Accelerated3D))
    }
}

struct Shared<S> {
    attached: Cell<bool>,
    backend: RefCell<S>,
}

impl<S: DrawingSurface> Shared<S> {
    fn with_backend<R>(&self, f: impl FnOnce(&mut S) -> R) -> Result<R, SurfaceError> {
        if !self.attached.get() {
            return Err(SurfaceError::Detached);
        }
        let mut backend = self
            .backend
            .try_borrow_mut()
            .map_err(|_| SurfaceError::Busy)?;
        Ok(f(&mut backend))
    }

    fn is_live(&self) -> bool {
        self.attached.get() && self.backend.try_borrow().is_ok_and(|b| b.is_mounted())
    }

    fn present(
        &self,
        frame: &FrameView<'_>,
        op: fn(&mut S, &FrameView<'_>) -> Result<(), SurfaceError>,
    ) -> Result<(), SurfaceError> {
        self.with_backend(|backend| {
            if !backend.is_mounted() {
                return Err(SurfaceError::Detached);
            }
            op(backend, frame)
        })?
    }
}

/// A negotiated CPU blit context.
pub struct RasterContext<S> {
    shared: Rc<Shared<S>>,
}

impl<S: DrawingSurface> RasterContext<S> {
    /// Blits `frame` at (0, 0) as a full-surface overwrite.
    pub fn present(&self, frame: &FrameView<'_>) -> Result<(), SurfaceError> {
        self.shared.present(frame, S::blit)
    }
}

/// A negotiated GPU context.
pub struct AcceleratedContext<S> {
    shared: Rc<Shared<S>>,
}

impl<S: DrawingSurface> AcceleratedContext<S> {
    /// Uploads `frame` into the backend's GPU resource.
    pub fn upload(&self, frame: &FrameView<'_>) -> Result<(), SurfaceError> {
        self.shared.present(frame, S::upload)
    }

    /// Runs `f` with the raw backend, for engine-specific draw paths.
    pub fn with_surface<R>(&self, f: impl FnOnce(&mut S) -> R) -> Result<R, SurfaceError> {
        self.shared.with_backend(f)
    }
}

/// An acquired presentation context. Cloning shares the same context.
pub enum Context<S> {
    /// CPU blits.
    Raster2D(RasterContext<S>),
    /// GPU uploads.
    Accelerated3D(AcceleratedContext<S>),
}

impl<S> Clone for Context<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Raster2D(c) => Self::Raster2D(RasterContext {
                shared: Rc::clone(&c.shared),
            }),
            Self::Accelerated3D(c) => Self::Accelerated3D(AcceleratedContext {
                shared: Rc::clone(&c.shared),
            }),
        }
    }
}

impl<S> Context<S> {
    fn shared(&self) -> &Rc<Shared<S>> {
        match self {
            Self::Raster2D(c) => &c.shared,
            Self::Accelerated3D(c) => &c.shared,
        }
    }

    /// Which kind was negotiated.
    #[must_use]
    pub const fn kind(&self) -> ContextKind {
        match self {
            Self::Raster2D(_) => ContextKind::Raster2D,
            Self::Accelerated3D(_) => ContextKind::Accelerated3D,
        }
    }

    /// Returns `true` if both handles refer to the same acquired context.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && Rc::ptr_eq(self.shared(), other.shared())
    }
}

impl<S: DrawingSurface> Context<S> {
    /// Presents `frame` the way this kind presents: a blit for
    /// [`Raster2D`](Self::Raster2D), an upload for
    /// [`Accelerated3D`](Self::Accelerated3D).
    pub fn present_frame(&self, frame: &FrameView<'_>) -> Result<(), SurfaceError> {
        match self {
            Self::Raster2D(c) => c.present(frame),
            Self::Accelerated3D(c) => c.upload(frame),
        }
    }

    /// `false` once the surface was unmounted or the backend reports it is
    /// no longer attached to the host.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.shared().is_live()
    }

    /// Runs `f` with the raw backend.
    pub fn with_backend<R>(&self, f: impl FnOnce(&mut S) -> R) -> Result<R, SurfaceError> {
        self.shared().with_backend(f)
    }
}

impl<S> fmt::Debug for Context<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("kind", &self.kind())
            .field("attached", &self.shared().attached.get())
            .finish_non_exhaustive()
    }
}

/// A host drawing target that may or may not currently have a backend.
pub struct Surface<S> {
    shared: Option<Rc<Shared<S>>>,
    active: Option<Context<S>>,
}

impl<S> Default for Surface<S> {
    fn default() -> Self {
        Self {
            shared: None,
            active: None,
        }
    }
}

impl<S: DrawingSurface> Surface<S> {
    /// A surface with no backend yet. Acquisition fails until
    /// [`mount`](Self::mount).
    #[must_use]
    pub const fn unmounted() -> Self {
        Self {
            shared: None,
            active: None,
        }
    }

    /// A surface mounted on `backend`.
    #[must_use]
    pub fn new(backend: S) -> Self {
        let mut surface = Self::unmounted();
        surface.mount(backend);
        surface
    }

    /// Mounts `backend`, detaching any previous backend and its context.
    pub fn mount(&mut self, backend: S) {
        self.unmount();
        self.shared = Some(Rc::new(Shared {
            attached: Cell::new(true),
            backend: RefCell::new(backend),
        }));
    }

    /// Detaches the backend. Contexts acquired from it stop presenting.
    pub fn unmount(&mut self) {
        self.active = None;
        if let Some(shared) = self.shared.take() {
            shared.attached.set(false);
            tracing::debug!("surface unmounted");
        }
    }

    /// Whether a backend is mounted and reports itself attached.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.shared.as_ref().is_some_and(|s| s.is_live())
    }

    /// Kind of the context acquired so far, if any.
    #[must_use]
    pub fn active_kind(&self) -> Option<ContextKind> {
        self.active.as_ref().map(Context::kind)
    }

    /// Acquires a context of `kind`.
    ///
    /// The first successful call negotiates with the backend and caches the
    /// context. After that the same kind returns the cached context and any
    /// other kind fails with [`Error::ContextKindConflict`].
    pub fn acquire(&mut self, kind: ContextKind) -> Result<Context<S>> {
        let shared = match &self.shared {
            Some(shared) if shared.is_live() => shared,
            _ => return Err(Error::SurfaceUnavailable),
        };
        if let Some(active) = &self.active {
            if active.kind() == kind {
                return Ok(active.clone());
            }
            return Err(Error::ContextKindConflict {
                active: active.kind(),
                requested: kind,
            });
        }

        let negotiated = shared
            .with_backend(|backend| backend.negotiate(kind))
            .map_err(|_| Error::SurfaceUnavailable)?;
        if !negotiated {
            tracing::debug!(%kind, "context negotiation refused");
            return Err(Error::UnsupportedContextKind(kind));
        }

        let shared = Rc::clone(shared);
        let context = match kind {
            ContextKind::Raster2D => Context::Raster2D(RasterContext { shared }),
            ContextKind::Accelerated3D => Context::Accelerated3D(AcceleratedContext { shared }),
        };
        self.active = Some(context.clone());
        tracing::debug!(%kind, "context acquired");
        Ok(context)
    }

    /// Runs `f` with the mounted backend.
    pub fn with_backend<R>(&self, f: impl FnOnce(&mut S) -> R) -> Result<R, SurfaceError> {
        self.shared
            .as_ref()
            .ok_or(SurfaceError::Detached)?
            .with_backend(f)
    }
}

impl<S> fmt::Debug for Surface<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("mounted", &self.shared.is_some())
            .field("active", &self.active.as_ref().map(Context::kind))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::engine::{EngineHandle, PaintCommand, PixelBuffer};
    use alloc::vec::Vec;

    /// A test surface recording every present.
    #[derive(Debug, Default)]
    pub(crate) struct Recorder {
        pub(crate) supports_3d: bool,
        pub(crate) refuse: bool,
        pub(crate) negotiations: u32,
        pub(crate) frames: Vec<(u32, u32, Vec<u8>)>,
        pub(crate) fail_with: Option<SurfaceError>,
    }

    impl DrawingSurface for Recorder {
        fn negotiate(&mut self, kind: ContextKind) -> bool {
            self.negotiations += 1;
            !self.refuse && (kind == ContextKind::Raster2D || self.supports_3d)
        }

        fn blit(&mut self, frame: &FrameView<'_>) -> Result<(), SurfaceError> {
            if let Some(err) = self.fail_with.clone() {
                return Err(err);
            }
            self.frames
                .push((frame.width(), frame.height(), frame.to_vec()));
            Ok(())
        }
    }

    #[test]
    fn unmounted_surface_is_unavailable() {
        let mut surface = Surface::<Recorder>::unmounted();
        assert_eq!(
            surface.acquire(ContextKind::Raster2D).unwrap_err(),
            Error::SurfaceUnavailable
        );
    }

    #[test]
    fn same_kind_returns_same_context() {
        let mut surface = Surface::new(Recorder::default());
        let a = surface.acquire(ContextKind::Raster2D).unwrap();
        let b = surface.acquire(ContextKind::Raster2D).unwrap();
        assert!(a.ptr_eq(&b));
        let negotiations = surface.with_backend(|r| r.negotiations).unwrap();
        assert_eq!(negotiations, 1, "negotiation is cached");
    }

    #[test]
    fn other_kind_conflicts() {
        let mut surface = Surface::new(Recorder {
            supports_3d: true,
            ..Recorder::default()
        });
        surface.acquire(ContextKind::Raster2D).unwrap();
        assert_eq!(
            surface.acquire(ContextKind::Accelerated3D).unwrap_err(),
            Error::ContextKindConflict {
                active: ContextKind::Raster2D,
                requested: ContextKind::Accelerated3D,
            }
        );
        assert_eq!(surface.active_kind(), Some(ContextKind::Raster2D));
    }

    #[test]
    fn refused_kind_is_unsupported_and_not_cached() {
        let mut surface = Surface::new(Recorder::default());
        assert_eq!(
            surface.acquire(ContextKind::Accelerated3D).unwrap_err(),
            Error::UnsupportedContextKind(ContextKind::Accelerated3D)
        );
        assert_eq!(surface.active_kind(), None);
        assert!(surface.acquire(ContextKind::Raster2D).is_ok());
    }

    #[test]
    fn raster_present_copies_the_exact_frame() {
        let mut handle = EngineHandle::<PixelBuffer>::create(2, 2, None).unwrap();
        handle.mutate(PaintCommand::Fill([255, 0, 0, 255]));

        let mut surface = Surface::new(Recorder::default());
        let context = surface.acquire(ContextKind::Raster2D).unwrap();
        context.present_frame(&handle.view()).unwrap();

        let frames = surface.with_backend(|r| r.frames.clone()).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!((frames[0].0, frames[0].1), (2, 2));
        assert_eq!(frames[0].2, [255, 0, 0, 255].repeat(4));
    }

    #[test]
    fn default_upload_is_unsupported() {
        let handle = EngineHandle::<PixelBuffer>::create(1, 1, None).unwrap();
        let mut surface = Surface::new(Recorder {
            supports_3d: true,
            ..Recorder::default()
        });
        let context = surface.acquire(ContextKind::Accelerated3D).unwrap();
        assert_eq!(
            context.present_frame(&handle.view()),
            Err(SurfaceError::Unsupported(ContextKind::Accelerated3D))
        );
    }

    #[test]
    fn unmount_detaches_outstanding_contexts() {
        let handle = EngineHandle::<PixelBuffer>::create(1, 1, None).unwrap();
        let mut surface = Surface::new(Recorder::default());
        let context = surface.acquire(ContextKind::Raster2D).unwrap();
        assert!(context.is_live());

        surface.unmount();
        assert!(!context.is_live());
        assert!(!surface.is_mounted());
        assert_eq!(
            context.present_frame(&handle.view()),
            Err(SurfaceError::Detached)
        );
    }

    #[test]
    fn remount_allows_a_new_kind() {
        let mut surface = Surface::new(Recorder {
            supports_3d: true,
            ..Recorder::default()
        });
        surface.acquire(ContextKind::Raster2D).unwrap();
        surface.mount(Recorder {
            supports_3d: true,
            ..Recorder::default()
        });
        assert_eq!(surface.active_kind(), None);
        assert!(surface.acquire(ContextKind::Accelerated3D).is_ok());
    }

    #[test]
    fn reentrant_present_reports_busy() {
        let handle = EngineHandle::<PixelBuffer>::create(1, 1, None).unwrap();
        let mut surface = Surface::new(Recorder::default());
        let context = surface.acquire(ContextKind::Raster2D).unwrap();
        let inner = context
            .with_backend(|_| context.present_frame(&handle.view()))
            .unwrap();
        assert_eq!(inner, Err(SurfaceError::Busy));
    }

    #[test]
    fn kind_names() {
        use alloc::string::ToString;
        assert_eq!(ContextKind::Raster2D.to_string(), "raster-2d");
        assert_eq!(ContextKind::Accelerated3D.to_string(), "accelerated-3d");
    }
}
