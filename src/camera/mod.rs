// Camera collaborator: frame capture, resolution control, JPEG encoding
//
// The sensor driver itself (pin setup, pixel format negotiation) lives
// behind the `Camera` trait. The runtime only needs to grab frames, read
// and change the resolution, and get JPEG bytes out.

use std::time::Duration;

mod frame_size;
pub mod jpeg;
pub mod sim;

pub use frame_size::FrameSize;
pub use sim::TestPatternCamera;

#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("Camera sensor not available")]
    Unavailable,

    #[error("No frame ready")]
    NoFrame,

    #[error("Unsupported frame size: {0}")]
    InvalidFrameSize(FrameSize),

    #[error("Frame buffer does not match {width}x{height} {format:?}")]
    BadFrame {
        width: u32,
        height: u32,
        format: PixelFormat,
    },

    #[error("JPEG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Jpeg,
    Rgb888,
    Grayscale,
}

/// One captured frame. Dropping it hands the buffer back.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Capture time since the Unix epoch
    pub timestamp: Duration,
}

pub trait Camera: Send + Sync {
    /// Grab the latest frame. May block until the sensor delivers one.
    fn capture(&self) -> Result<Frame, CameraError>;

    /// Current resolution, or `Unavailable` if there is no sensor
    fn frame_size(&self) -> Result<FrameSize, CameraError>;

    /// Switch resolution. `FrameSize::Invalid` is rejected and leaves the
    /// current resolution unchanged.
    fn set_frame_size(&self, size: FrameSize) -> Result<(), CameraError>;
}
