//! Dual-Surface Display Bridge
//!
//! Bridges a decoded video stream produced by an external media engine onto
//! one or two platform drawing surfaces: a rendering surface showing decoded
//! frames and an optional preview surface fed by the platform camera stack.
//!
//! The bridge owns the software/hardware rendering mode decision, mediates
//! the handoff of the native rendering handle across threads, and manages
//! the re-initialization state machine triggered by surface resize or handle
//! change. The software blit path never touches a destroyed surface or a
//! half-resized buffer.
//!
//! Decoding, camera capture, and media transport live elsewhere; this crate
//! only ever sees opaque handles and pixel buffers.

pub mod bridge;
pub mod render;
pub mod surface;

pub use bridge::{DisplayBridge, DisplayMode, SurfaceCapability};
pub use render::{
    FrameBuffer, HardwareRenderPath, HwPhase, NativeContextHandle, NativeRenderer, RedrawPolicy,
    RenderLoop, RenderTarget, SoftwareBlitPath, TargetError, BYTES_PER_PIXEL,
};
pub use surface::{
    rotation_to_angle, SurfaceCallbacks, SurfaceEvent, SurfaceHost, SurfaceKind,
    SurfaceLifecycleAdapter, VideoWindowListener,
};
