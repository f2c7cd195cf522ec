//! Input surface consumed from the host shell.
//!
//! The core never creates windows, binds hotkeys or grabs the screen itself.
//! The shell feeds pointer events into the session and provides a
//! [`FrameSource`] that can capture the calibrated map rectangle.

use image::RgbImage;
use thiserror::Error;

use crate::geometry::PixelPoint;

/// A pointer click event forwarded by the shell.
///
/// Only `pressed == true` events are meaningful to the core; release events
/// are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub x: i32,
    pub y: i32,
    pub pressed: bool,
}

impl PointerEvent {
    /// A press at the given screen coordinates.
    pub fn press(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            pressed: true,
        }
    }

    /// The event position as a point.
    pub fn point(&self) -> PixelPoint {
        PixelPoint::new(self.x, self.y)
    }
}

/// A rectangular screen region to capture, in absolute pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRegion {
    /// Top-left corner of the region on screen.
    pub origin: PixelPoint,
    pub width: u32,
    pub height: u32,
}

/// Screen capture errors reported by the shell's frame source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("screen capture failed: {0}")]
    Failed(String),
    #[error("capture region is outside the screen")]
    InvalidRegion,
}

/// Provider of captured frames for the calibrated map region.
///
/// Implementations are supplied by the shell (screen grabber, video feed,
/// test stub). `capture` may block; the session always invokes it from a
/// blocking task under a timeout.
pub trait FrameSource: Send + Sync {
    /// Capture the given screen region as an RGB frame whose dimensions
    /// match the region size.
    fn capture(&self, region: &CaptureRegion) -> Result<RgbImage, CaptureError>;
}
