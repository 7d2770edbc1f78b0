//! Software Blit Path
//!
//! CPU fallback for surfaces without accelerated rendering: the media engine
//! writes decoded RGB565 pixels into an off-screen [`FrameBuffer`], then asks
//! the path to blit the buffer onto the live drawing target.
//!
//! One mutex serializes buffer geometry mutation against blits. A blit that
//! races a resize either completes against the old buffer or waits for the
//! reallocation to finish; partial-size writes are never observed.

use log::{debug, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

/// Bytes per pixel of the fixed RGB565 buffer format.
pub const BYTES_PER_PIXEL: usize = 2;

/// Transient failure while presenting to a drawing target.
///
/// These are expected during surface teardown and are never fatal: the path
/// logs them and drops the frame.
#[derive(Debug, Error)]
pub enum TargetError {
    /// The surface was torn down between acquiring the target and drawing.
    #[error("surface is gone")]
    SurfaceGone,
    /// The windowing layer could not hand out a drawing context.
    #[error("out of drawing resources")]
    OutOfResources,
}

/// A live drawable surface the software path can blit onto.
///
/// The windowing layer owns the underlying surface; the bridge holds this
/// reference only between the surface's Changed and Destroyed events.
pub trait RenderTarget: Send + Sync {
    /// Acquires a drawing context, copies the frame onto the surface, and
    /// commits it.
    fn blit(&self, frame: &FrameBuffer) -> Result<(), TargetError>;
}

/// Off-screen RGB565 pixel buffer sized to the rendering surface.
///
/// Reallocated on every surface size change; exclusively owned by
/// [`SoftwareBlitPath`] and only ever touched under its lock.
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Copies decoded pixels in, clamped to the buffer size. A shorter input
    /// leaves the tail untouched; a longer one is a stale frame for a prior
    /// geometry and its excess is dropped.
    pub fn copy_from(&mut self, pixels: &[u8]) {
        let n = self.pixels.len().min(pixels.len());
        self.pixels[..n].copy_from_slice(&pixels[..n]);
    }
}

#[derive(Default)]
struct BlitState {
    target: Option<Arc<dyn RenderTarget>>,
    buffer: Option<FrameBuffer>,
}

/// Software rendering path: owns the frame buffer and the target reference.
///
/// Thread-safe: surface lifecycle callbacks arrive on the windowing thread
/// while the media engine calls [`present`](Self::present) from its own.
pub struct SoftwareBlitPath {
    state: Mutex<BlitState>,
}

impl SoftwareBlitPath {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BlitState::default()),
        }
    }

    /// Surface became drawable or changed size: reallocate the buffer to the
    /// new geometry and store the drawing target.
    pub fn on_surface_changed(
        &self,
        target: Option<Arc<dyn RenderTarget>>,
        width: u32,
        height: u32,
    ) {
        let mut state = self.state.lock();
        state.buffer = Some(FrameBuffer::new(width, height));
        state.target = target;
        debug!("software frame buffer reallocated to {}x{}", width, height);
    }

    /// Surface destroyed: drop the target reference and release the buffer.
    pub fn on_surface_destroyed(&self) {
        let mut state = self.state.lock();
        state.target = None;
        state.buffer = None;
        debug!("software blit target released");
    }

    /// Overwrites the frame buffer with freshly decoded pixels.
    pub fn write_frame(&self, pixels: &[u8]) {
        let mut state = self.state.lock();
        if let Some(buffer) = state.buffer.as_mut() {
            buffer.copy_from(pixels);
        }
    }

    /// Blits the current frame buffer onto the target. No-ops if the surface
    /// is not live.
    pub fn present(&self) {
        let state = self.state.lock();
        Self::blit_locked(&state);
    }

    /// Writes a decoded frame and presents it under a single lock
    /// acquisition, so the blit can never see a half-written frame.
    pub fn push_frame(&self, pixels: &[u8]) {
        let mut state = self.state.lock();
        if let Some(buffer) = state.buffer.as_mut() {
            buffer.copy_from(pixels);
        }
        Self::blit_locked(&state);
    }

    fn blit_locked(state: &BlitState) {
        let (Some(target), Some(buffer)) = (state.target.as_ref(), state.buffer.as_ref()) else {
            return;
        };
        if let Err(e) = target.blit(buffer) {
            // The surface may legitimately be mid-teardown; drop the frame.
            warn!("frame dropped: {}", e);
        }
    }
}

impl Default for SoftwareBlitPath {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct RecordingTarget {
        blits: Mutex<Vec<(u32, u32, Vec<u8>)>>,
        fail: AtomicBool,
    }

    impl RecordingTarget {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                blits: Mutex::new(Vec::new()),
                fail: AtomicBool::new(false),
            })
        }

        fn blit_count(&self) -> usize {
            self.blits.lock().len()
        }
    }

    impl RenderTarget for RecordingTarget {
        fn blit(&self, frame: &FrameBuffer) -> Result<(), TargetError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(TargetError::OutOfResources);
            }
            self.blits
                .lock()
                .push((frame.width(), frame.height(), frame.as_bytes().to_vec()));
            Ok(())
        }
    }

    #[test]
    fn test_present_blits_current_geometry() {
        let target = RecordingTarget::new();
        let path = SoftwareBlitPath::new();
        path.on_surface_changed(Some(target.clone()), 320, 240);
        path.write_frame(&vec![0xAB; 320 * 240 * BYTES_PER_PIXEL]);
        path.present();

        let blits = target.blits.lock();
        assert_eq!(blits.len(), 1);
        let (w, h, pixels) = &blits[0];
        assert_eq!((*w, *h), (320, 240));
        assert!(pixels.iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn test_present_without_surface_is_noop() {
        let path = SoftwareBlitPath::new();
        path.present();
    }

    #[test]
    fn test_present_after_destroy_is_noop() {
        let target = RecordingTarget::new();
        let path = SoftwareBlitPath::new();
        path.on_surface_changed(Some(target.clone()), 320, 240);
        path.on_surface_destroyed();
        path.present();
        assert_eq!(target.blit_count(), 0);
    }

    #[test]
    fn test_resize_reallocates_buffer() {
        let target = RecordingTarget::new();
        let path = SoftwareBlitPath::new();
        path.on_surface_changed(Some(target.clone()), 320, 240);
        path.on_surface_changed(Some(target.clone()), 640, 480);
        path.present();

        let blits = target.blits.lock();
        assert_eq!(blits.len(), 1);
        let (w, h, pixels) = &blits[0];
        assert_eq!((*w, *h), (640, 480));
        assert_eq!(pixels.len(), 640 * 480 * BYTES_PER_PIXEL);
    }

    #[test]
    fn test_blit_failure_is_swallowed() {
        let target = RecordingTarget::new();
        target.fail.store(true, Ordering::SeqCst);
        let path = SoftwareBlitPath::new();
        path.on_surface_changed(Some(target.clone()), 64, 64);
        path.present();
        assert_eq!(target.blit_count(), 0);
    }

    #[test]
    fn test_stale_frame_is_clamped() {
        let target = RecordingTarget::new();
        let path = SoftwareBlitPath::new();
        path.on_surface_changed(Some(target.clone()), 16, 16);
        // A frame decoded for an older, larger geometry.
        path.push_frame(&vec![0x55; 64 * 64 * BYTES_PER_PIXEL]);

        let blits = target.blits.lock();
        assert_eq!(blits.len(), 1);
        assert_eq!(blits[0].2.len(), 16 * 16 * BYTES_PER_PIXEL);
    }
}
