//! Display Bridge
//!
//! Root component: fixes the software/hardware mode decision at construction,
//! wires surface lifecycle events into the active render path, exposes the
//! public contract to the windowing layer and the media engine, and fans
//! lifecycle notifications out to the registered listener.
//!
//! Three uncoordinated threads call in here: the windowing thread (lifecycle
//! callbacks), the render thread (frame ticks), and the media engine
//! (handle/frame delivery). All coordination is via each path's own lock;
//! there is no global lock.

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::render::hardware::{
    HardwareRenderPath, NativeContextHandle, NativeRenderer, RedrawPolicy, RenderLoop,
};
use crate::render::software::SoftwareBlitPath;
use crate::surface::{
    SurfaceEvent, SurfaceHost, SurfaceKind, SurfaceLifecycleAdapter, VideoWindowListener,
};

/// How decoded frames reach the rendering surface. Fixed for the lifetime of
/// a bridge, derived once from the surface's capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Software,
    Hardware,
}

/// Advertised capability of the rendering surface, declared at construction.
/// An accelerated surface brings the two collaborators the hardware path
/// needs; a plain surface brings nothing, and the unused path's collaborators
/// are never stored.
pub enum SurfaceCapability {
    /// Plain surface: frames are blitted on the CPU.
    Software,
    /// Surface backed by a render loop that draws through the media engine's
    /// native renderer.
    Accelerated {
        renderer: Arc<dyn NativeRenderer>,
        render_loop: Arc<dyn RenderLoop>,
    },
}

enum ActivePath {
    Software(SoftwareBlitPath),
    Hardware {
        path: Arc<HardwareRenderPath>,
        render_loop: Arc<dyn RenderLoop>,
    },
}

struct BridgeInner {
    path: ActivePath,
    listener: Mutex<Option<Arc<dyn VideoWindowListener>>>,
}

impl BridgeInner {
    fn dispatch(&self, kind: SurfaceKind, event: SurfaceEvent) {
        match (kind, event) {
            (SurfaceKind::Rendering, SurfaceEvent::Created) => {
                debug!("rendering surface created, waiting for geometry");
            }
            (
                SurfaceKind::Rendering,
                SurfaceEvent::Changed {
                    target,
                    width,
                    height,
                },
            ) => {
                match &self.path {
                    ActivePath::Software(path) => path.on_surface_changed(target, width, height),
                    ActivePath::Hardware { path, .. } => path.on_surface_changed(width, height),
                }
                self.notify(|l| l.on_rendering_surface_ready());
            }
            (SurfaceKind::Rendering, SurfaceEvent::Destroyed) => {
                // Clear the drawable reference before the listener hears
                // about the teardown.
                if let ActivePath::Software(path) = &self.path {
                    path.on_surface_destroyed();
                }
                self.notify(|l| l.on_rendering_surface_destroyed());
            }
            (SurfaceKind::Preview, SurfaceEvent::Created) => {
                debug!("preview surface created");
            }
            (SurfaceKind::Preview, SurfaceEvent::Changed { .. }) => {
                self.notify(|l| l.on_preview_surface_ready());
            }
            (SurfaceKind::Preview, SurfaceEvent::Destroyed) => {
                self.notify(|l| l.on_preview_surface_destroyed());
            }
        }
    }

    fn notify(&self, deliver: impl FnOnce(&dyn VideoWindowListener)) {
        // Snapshot the current listener; a concurrent set_listener swaps the
        // reference for later dispatches, never this one.
        let listener = self.listener.lock().clone();
        if let Some(listener) = listener {
            deliver(listener.as_ref());
        }
    }
}

/// Bridges a decoded video stream to the rendering surface and fans the two
/// surfaces' lifecycle events out to a listener.
pub struct DisplayBridge {
    inner: Arc<BridgeInner>,
    rendering_host: Arc<dyn SurfaceHost>,
    preview_host: Option<Arc<dyn SurfaceHost>>,
    started: AtomicBool,
}

impl DisplayBridge {
    /// Builds a bridge for the given surfaces. The display mode follows the
    /// rendering surface's capability and never changes afterwards.
    pub fn new(
        rendering_host: Arc<dyn SurfaceHost>,
        preview_host: Option<Arc<dyn SurfaceHost>>,
        capability: SurfaceCapability,
    ) -> Self {
        let path = match capability {
            SurfaceCapability::Software => ActivePath::Software(SoftwareBlitPath::new()),
            SurfaceCapability::Accelerated {
                renderer,
                render_loop,
            } => ActivePath::Hardware {
                path: Arc::new(HardwareRenderPath::new(renderer)),
                render_loop,
            },
        };
        let bridge = Self {
            inner: Arc::new(BridgeInner {
                path,
                listener: Mutex::new(None),
            }),
            rendering_host,
            preview_host,
            started: AtomicBool::new(false),
        };
        info!("display bridge created in {:?} mode", bridge.mode());
        bridge
    }

    pub fn mode(&self) -> DisplayMode {
        match self.inner.path {
            ActivePath::Software(_) => DisplayMode::Software,
            ActivePath::Hardware { .. } => DisplayMode::Hardware,
        }
    }

    /// Registers lifecycle callbacks with both surfaces and, in hardware
    /// mode, installs the frame tick on the render loop with on-demand
    /// redraw scheduling.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("display bridge already started");
            return;
        }

        let inner = self.inner.clone();
        self.rendering_host
            .register(Arc::new(SurfaceLifecycleAdapter::new(
                SurfaceKind::Rendering,
                move |kind, event| inner.dispatch(kind, event),
            )));
        if let Some(preview) = &self.preview_host {
            let inner = self.inner.clone();
            preview.register(Arc::new(SurfaceLifecycleAdapter::new(
                SurfaceKind::Preview,
                move |kind, event| inner.dispatch(kind, event),
            )));
        }

        if let ActivePath::Hardware { path, render_loop } = &self.inner.path {
            let tick_path = path.clone();
            render_loop.install(
                Box::new(move || tick_path.on_frame_tick()),
                RedrawPolicy::OnDemand,
            );
            info!("render loop installed with on-demand redraw");
        }
    }

    /// Deregisters all callbacks and clears path and listener state. Safe to
    /// call repeatedly and safe while a tick or present is in flight: state
    /// is cleared under the path's lock, so in-flight operations complete
    /// against valid state or observe the cleared state and no-op. After
    /// `stop()` no further listener notifications are delivered.
    pub fn stop(&self) {
        if !self.started.swap(false, Ordering::SeqCst) {
            return;
        }

        self.rendering_host.unregister();
        if let Some(preview) = &self.preview_host {
            preview.unregister();
        }
        match &self.inner.path {
            ActivePath::Software(path) => path.on_surface_destroyed(),
            ActivePath::Hardware { path, render_loop } => {
                render_loop.uninstall();
                path.reset();
            }
        }
        *self.inner.listener.lock() = None;
        info!("display bridge stopped");
    }

    /// Replaces the registered listener. May race lifecycle delivery; an
    /// in-flight notification goes to whichever listener was current when it
    /// was dispatched.
    pub fn set_listener(&self, listener: Arc<dyn VideoWindowListener>) {
        *self.inner.listener.lock() = Some(listener);
    }

    /// Schedules one extra frame tick. Hardware mode only.
    pub fn request_redraw(&self) {
        match &self.inner.path {
            ActivePath::Hardware { render_loop, .. } => render_loop.request_redraw(),
            ActivePath::Software(_) => {
                warn!("request_redraw called in software mode; ignoring");
            }
        }
    }

    /// Hands over a new native rendering context from the media engine.
    /// Hardware mode only; in software mode this is a usage error, logged
    /// and ignored.
    pub fn set_native_handle(&self, handle: NativeContextHandle) {
        match &self.inner.path {
            ActivePath::Hardware { path, .. } => path.set_native_handle(handle),
            ActivePath::Software(_) => {
                error!("set_native_handle called in software mode; ignoring");
            }
        }
    }

    /// Blits the current frame buffer onto the rendering surface. Software
    /// mode only; in hardware mode this is a usage error, logged and ignored.
    pub fn present(&self) {
        match &self.inner.path {
            ActivePath::Software(path) => path.present(),
            ActivePath::Hardware { .. } => {
                error!("present called in hardware mode; ignoring");
            }
        }
    }

    /// Copies a decoded frame into the buffer and presents it under a single
    /// lock acquisition. Software mode only.
    pub fn push_frame(&self, pixels: &[u8]) {
        match &self.inner.path {
            ActivePath::Software(path) => path.push_frame(pixels),
            ActivePath::Hardware { .. } => {
                error!("push_frame called in hardware mode; ignoring");
            }
        }
    }
}

impl Drop for DisplayBridge {
    fn drop(&mut self) {
        self.stop();
    }
}
