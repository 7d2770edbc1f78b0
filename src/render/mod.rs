//! Render Paths
//!
//! The two mutually-exclusive ways decoded frames reach the rendering
//! surface: a CPU blit fallback and an accelerated per-tick draw loop. Each
//! path carries its own lock so they stay independent; only one is ever
//! active per bridge.

pub mod hardware;
pub mod software;

pub use hardware::{
    HardwareRenderPath, HwPhase, NativeContextHandle, NativeRenderer, RedrawPolicy, RenderLoop,
};
pub use software::{FrameBuffer, RenderTarget, SoftwareBlitPath, TargetError, BYTES_PER_PIXEL};
