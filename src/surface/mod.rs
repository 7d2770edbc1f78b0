//! Surface Lifecycle
//!
//! The windowing layer creates, resizes, and destroys the two surfaces on
//! its own thread and delivers raw callbacks for each. The adapter here
//! translates those callbacks into bridge events without reordering or
//! coalescing them: a Changed with unchanged dimensions is still forwarded,
//! because Changed doubles as the "surface is drawable now" signal.

use log::debug;
use std::fmt;
use std::sync::Arc;

use crate::render::software::RenderTarget;

/// Which of the two surfaces an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Shows decoded video output.
    Rendering,
    /// Shows the platform camera feed; pixels never pass through the bridge.
    Preview,
}

/// Lifecycle event for one surface, in the order the windowing layer emits
/// them: Created, zero or more Changed, at most one terminal Destroyed.
pub enum SurfaceEvent {
    Created,
    Changed {
        /// Drawable reference, live until the next Destroyed. Absent for
        /// surfaces the bridge never blits onto (accelerated or preview).
        target: Option<Arc<dyn RenderTarget>>,
        width: u32,
        height: u32,
    },
    Destroyed,
}

impl fmt::Debug for SurfaceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceEvent::Created => write!(f, "Created"),
            SurfaceEvent::Changed { width, height, .. } => {
                write!(f, "Changed({}x{})", width, height)
            }
            SurfaceEvent::Destroyed => write!(f, "Destroyed"),
        }
    }
}

/// Callbacks the windowing layer invokes for one surface, on its own thread.
pub trait SurfaceCallbacks: Send + Sync {
    fn on_surface_created(&self);
    fn on_surface_changed(&self, target: Option<Arc<dyn RenderTarget>>, width: u32, height: u32);
    fn on_surface_destroyed(&self);
}

/// One platform surface the bridge registers callbacks with at `start()` and
/// deregisters from at `stop()`.
pub trait SurfaceHost: Send + Sync {
    fn register(&self, callbacks: Arc<dyn SurfaceCallbacks>);
    fn unregister(&self);
}

/// Consumer notifications for the four surface lifecycle events. At most one
/// listener is registered at a time; registration may be replaced at any
/// time and delivery uses whichever listener was current at dispatch.
pub trait VideoWindowListener: Send + Sync {
    fn on_rendering_surface_ready(&self);
    fn on_rendering_surface_destroyed(&self);
    fn on_preview_surface_ready(&self);
    fn on_preview_surface_destroyed(&self);
}

/// Translates one surface's raw windowing callbacks into tagged
/// [`SurfaceEvent`]s for the bridge, preserving arrival order.
pub struct SurfaceLifecycleAdapter {
    kind: SurfaceKind,
    sink: Box<dyn Fn(SurfaceKind, SurfaceEvent) + Send + Sync>,
}

impl SurfaceLifecycleAdapter {
    pub fn new(
        kind: SurfaceKind,
        sink: impl Fn(SurfaceKind, SurfaceEvent) + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            sink: Box::new(sink),
        }
    }
}

impl SurfaceCallbacks for SurfaceLifecycleAdapter {
    fn on_surface_created(&self) {
        debug!("{:?} surface created", self.kind);
        (self.sink)(self.kind, SurfaceEvent::Created);
    }

    fn on_surface_changed(&self, target: Option<Arc<dyn RenderTarget>>, width: u32, height: u32) {
        debug!("{:?} surface changed to {}x{}", self.kind, width, height);
        (self.sink)(
            self.kind,
            SurfaceEvent::Changed {
                target,
                width,
                height,
            },
        );
    }

    fn on_surface_destroyed(&self) {
        debug!("{:?} surface destroyed", self.kind);
        (self.sink)(self.kind, SurfaceEvent::Destroyed);
    }
}

/// Maps a platform display-rotation quadrant (0..=3) to degrees.
pub fn rotation_to_angle(rotation: u32) -> u32 {
    match rotation {
        0 => 0,
        1 => 90,
        2 => 180,
        3 => 270,
        _ => 0,
    }
}
