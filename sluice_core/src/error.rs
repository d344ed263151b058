// Copyright 2026 the Sluice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for frame transfer.

use alloc::string::String;

use crate::scheduler::LoopState;
use crate::surface::ContextKind;
use crate::time::Timebase;

/// A `Result` defaulting to [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Which render-loop dependency was missing when starting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MissingDependency {
    /// No engine handle is attached.
    Engine,
    /// No context is attached, or its surface is no longer mounted.
    Context,
}

/// Errors reported by engine handles, context acquisition and the render loop.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A frame dimension is zero, or `width * height * 4` does not fit in
    /// memory.
    #[error("invalid frame dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// A seed buffer does not hold exactly one frame.
    #[error("seed is {actual} bytes, expected {expected}")]
    InvalidSeedSize {
        /// `width * height * 4`.
        expected: usize,
        /// Length of the seed that was passed.
        actual: usize,
    },

    /// The drawing surface is not mounted.
    #[error("drawing surface is not mounted")]
    SurfaceUnavailable,

    /// The surface cannot provide the requested kind of context.
    #[error("surface cannot provide a {0} context")]
    UnsupportedContextKind(ContextKind),

    /// The surface already has a context of another kind.
    #[error("surface already has a {active} context, cannot acquire {requested}")]
    ContextKindConflict {
        /// Kind of the context already acquired on the surface.
        active: ContextKind,
        /// Kind that was requested.
        requested: ContextKind,
    },

    /// The render loop was started without an engine or a live context.
    #[error("render loop is missing its {0:?}")]
    NotReady(MissingDependency),

    /// A frame location was used after its frame was resized, moved or freed.
    #[error("frame location no longer refers to the engine's current frame")]
    DanglingView,

    /// The engine was already borrowed mutably when a cycle tried to read it.
    #[error("engine is mutably borrowed during a render cycle")]
    EngineBusy,

    /// The operation is not valid in the loop's current state.
    #[error("operation not valid while the render loop is {state:?}")]
    InvalidState {
        /// State of the loop when the operation was attempted.
        state: LoopState,
    },

    /// A driver's clock counts in different units than the loop's
    /// configuration.
    #[error("loop is configured for {configured:?} ticks, driver clock is {clock:?}")]
    TimebaseMismatch {
        /// Timebase of the loop's [`LoopConfig`](crate::config::LoopConfig).
        configured: Timebase,
        /// Timebase of the driver's clock.
        clock: Timebase,
    },

    /// The drawing surface failed to present a frame.
    #[error("presentation failed")]
    Present(#[source] SurfaceError),
}

/// Failures reported by a [`DrawingSurface`](crate::surface::DrawingSurface).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The surface was destroyed or detached from the host.
    #[error("drawing surface was detached")]
    Detached,

    /// The surface does not implement this kind of presentation.
    #[error("surface does not support {0} presentation")]
    Unsupported(ContextKind),

    /// The surface is already borrowed, e.g. by a re-entrant present.
    #[error("drawing surface is busy")]
    Busy,

    /// The backing resource was lost and must be recreated.
    #[error("drawing surface lost its backing resource")]
    Lost,

    /// The backend timed out acquiring or presenting.
    #[error("drawing surface timed out")]
    Timeout,

    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

impl SurfaceError {
    /// Wraps a backend message.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Returns `true` if the next frame may succeed without intervention.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Lost | Self::Timeout | Self::Busy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use core::error::Error as _;

    #[test]
    fn display_mentions_the_details() {
        let err = Error::InvalidSeedSize {
            expected: 16,
            actual: 3,
        };
        assert_eq!(err.to_string(), "seed is 3 bytes, expected 16");

        let err = Error::ContextKindConflict {
            active: ContextKind::Raster2D,
            requested: ContextKind::Accelerated3D,
        };
        assert!(
            err.to_string().contains("raster-2d"),
            "got: {err}"
        );
    }

    #[test]
    fn present_keeps_surface_error_as_source() {
        let err = Error::Present(SurfaceError::backend("canvas gone"));
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("backend error: canvas gone"));
    }

    #[test]
    fn transient_classification() {
        assert!(SurfaceError::Lost.is_transient());
        assert!(SurfaceError::Timeout.is_transient());
        assert!(!SurfaceError::Detached.is_transient());
        assert!(!SurfaceError::backend("x").is_transient());
    }
}
