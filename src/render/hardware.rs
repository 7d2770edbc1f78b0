//! Hardware Render Path
//!
//! Accelerated rendering path driven by a dedicated render thread. The media
//! engine hands over an opaque native context handle from an arbitrary
//! thread; geometry arrives on the windowing thread; the render loop invokes
//! [`HardwareRenderPath::on_frame_tick`] on its own thread. One mutex covers
//! handle, geometry, and the reinit flag, so a tick always observes the most
//! recently completed handle/geometry write before drawing with it.

use log::trace;
use parking_lot::Mutex;
use std::sync::Arc;

/// Opaque token identifying a rendering context inside the external media
/// engine. A foreign key into engine-owned state: the bridge never frees or
/// interprets it, and the engine may replace it at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NativeContextHandle(u64);

impl NativeContextHandle {
    /// "No context yet". Ticks observing this handle draw nothing.
    pub const UNSET: Self = Self(0);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub const fn is_unset(self) -> bool {
        self.0 == 0
    }
}

/// Opaque draw calls into the external media engine, invoked only from the
/// render thread under the hardware path's lock. The engine requires
/// init-before-draw after every handle or geometry change and reports its own
/// failures out of band; this layer never sees a recoverable error.
pub trait NativeRenderer: Send + Sync {
    /// (Re)initializes the native renderer for the given context and surface
    /// geometry.
    fn init(&self, handle: NativeContextHandle, width: u32, height: u32);
    /// Clears the color buffer once, right after a successful init.
    fn clear(&self);
    /// Draws the latest frame for the given context.
    fn draw(&self, handle: NativeContextHandle);
}

/// Redraw scheduling policy for the accelerated render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawPolicy {
    /// Tick only when a redraw was requested (the bridge's policy).
    OnDemand,
    /// Tick on every vsync.
    Continuous,
}

/// The platform's accelerated render loop: a per-frame callback slot plus a
/// "schedule one redraw" primitive.
pub trait RenderLoop: Send + Sync {
    /// Installs the per-frame callback. The loop invokes it repeatedly on the
    /// render thread while the surface is visible, per `policy`.
    fn install(&self, callback: Box<dyn FnMut() + Send>, policy: RedrawPolicy);
    /// Removes the per-frame callback; no further ticks are delivered.
    fn uninstall(&self);
    /// Asks the loop to schedule one additional frame tick.
    fn request_redraw(&self);
}

/// Observable state of the hardware path.
///
/// `Unbound` → handle and/or geometry arrive → `PendingInit` → first tick
/// with a usable handle runs the native init → `Ready`. Any later handle
/// replacement or geometry change drops back to `PendingInit` until the next
/// tick re-initializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwPhase {
    Unbound,
    PendingInit,
    Ready,
}

#[derive(Default)]
struct HwState {
    handle: NativeContextHandle,
    width: u32,
    height: u32,
    reinit: bool,
    initialized: bool,
    frames: u64,
}

/// Accelerated rendering path: holds the native context handle and decides,
/// on each frame tick, whether a (re)initialization must run before the draw
/// call.
pub struct HardwareRenderPath {
    renderer: Arc<dyn NativeRenderer>,
    state: Mutex<HwState>,
}

impl HardwareRenderPath {
    pub fn new(renderer: Arc<dyn NativeRenderer>) -> Self {
        Self {
            renderer,
            state: Mutex::new(HwState::default()),
        }
    }

    /// Stores a new native context handle, called by the media engine from an
    /// arbitrary thread. Replacing a live handle with a different one forces
    /// a re-initialization before the next draw; the first handle relies on
    /// the geometry callback having already flagged init (the windowing layer
    /// always delivers a surface change before the first tick).
    pub fn set_native_handle(&self, handle: NativeContextHandle) {
        let mut state = self.state.lock();
        if !state.handle.is_unset() && handle != state.handle {
            state.reinit = true;
        }
        state.handle = handle;
    }

    /// Surface geometry changed: record it and require init before the next
    /// draw.
    pub fn on_surface_changed(&self, width: u32, height: u32) {
        let mut state = self.state.lock();
        state.width = width;
        state.height = height;
        state.reinit = true;
    }

    /// One render-loop tick. Runs the pending native init if any, then issues
    /// the draw call. A tick with no context yet is a no-op.
    pub fn on_frame_tick(&self) {
        let mut state = self.state.lock();
        state.frames += 1;
        trace!("frame tick {}", state.frames);
        if state.handle.is_unset() {
            return;
        }
        if state.reinit {
            self.renderer.init(state.handle, state.width, state.height);
            self.renderer.clear();
            state.reinit = false;
            state.initialized = true;
        }
        self.renderer.draw(state.handle);
    }

    pub fn phase(&self) -> HwPhase {
        let state = self.state.lock();
        if state.reinit {
            HwPhase::PendingInit
        } else if state.initialized {
            HwPhase::Ready
        } else if state.handle.is_unset() && state.width == 0 && state.height == 0 {
            HwPhase::Unbound
        } else {
            HwPhase::PendingInit
        }
    }

    /// Clears handle, geometry, and init state under the lock. An in-flight
    /// tick on the render thread either completes first or observes the unset
    /// handle and no-ops.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        *state = HwState::default();
    }
}
