// JPEG encoding for frames the sensor delivers uncompressed

use image::ColorType;
use image::codecs::jpeg::JpegEncoder;

use super::{CameraError, Frame, PixelFormat};

/// JPEG bytes for `frame`. Frames already in JPEG are passed through
/// untouched; raw frames are encoded at `quality` (1-100).
pub fn to_jpeg(frame: Frame, quality: u8) -> Result<Vec<u8>, CameraError> {
    let (color, bytes_per_pixel) = match frame.format {
        PixelFormat::Jpeg => return Ok(frame.data),
        PixelFormat::Rgb888 => (ColorType::Rgb8, 3),
        PixelFormat::Grayscale => (ColorType::L8, 1),
    };

    let expected = frame.width as usize * frame.height as usize * bytes_per_pixel;
    if frame.data.len() != expected || expected == 0 {
        return Err(CameraError::BadFrame {
            width: frame.width,
            height: frame.height,
            format: frame.format,
        });
    }

    let mut out = Vec::with_capacity(expected / 8);
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)).encode(
        &frame.data,
        frame.width,
        frame.height,
        color,
    )?;
    Ok(out)
}
