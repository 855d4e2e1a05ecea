// Test-pattern camera for running without the sensor
//
// Produces raw RGB frames (a moving gradient) so the streaming path
// exercises the JPEG encoder exactly as it would for a raw sensor.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;

use super::{Camera, CameraError, Frame, FrameSize, PixelFormat};

pub struct TestPatternCamera {
    frame_size: Mutex<FrameSize>,
    sequence: AtomicU32,
}

impl TestPatternCamera {
    pub fn new(frame_size: FrameSize) -> Self {
        Self {
            frame_size: Mutex::new(frame_size),
            sequence: AtomicU32::new(0),
        }
    }
}

impl Camera for TestPatternCamera {
    fn capture(&self) -> Result<Frame, CameraError> {
        let size = *crate::lock(&self.frame_size);
        let (width, height) = size.dimensions().ok_or(CameraError::InvalidFrameSize(size))?;
        let shift = self.sequence.fetch_add(1, Ordering::Relaxed);

        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(x.wrapping_add(shift) as u8);
                data.push(y as u8);
                data.push(shift as u8);
            }
        }

        Ok(Frame {
            data,
            width,
            height,
            format: PixelFormat::Rgb888,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default(),
        })
    }

    fn frame_size(&self) -> Result<FrameSize, CameraError> {
        Ok(*crate::lock(&self.frame_size))
    }

    fn set_frame_size(&self, size: FrameSize) -> Result<(), CameraError> {
        if !size.is_valid() {
            return Err(CameraError::InvalidFrameSize(size));
        }
        info!("Frame size changed to {}", size);
        *crate::lock(&self.frame_size) = size;
        Ok(())
    }
}
