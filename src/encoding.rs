//! Frame encoding for the live view

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::error::RecognitionError;

/// Multipart boundary used by the MJPEG stream
pub const MJPEG_BOUNDARY: &str = "frame";

/// `Content-Type` value for a response carrying [`multipart_chunk`]s
pub const MJPEG_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

/// Encode an RGB frame as JPEG; quality is clamped to 1-100
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, RecognitionError> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .encode_image(image)
        .map_err(|e| RecognitionError::Encoding(format!("JPEG encode failed: {e}")))?;
    Ok(buffer)
}

/// Wrap one JPEG in a multipart part
pub fn multipart_chunk(jpeg: &[u8], frame_number: u64) -> Vec<u8> {
    let mut payload = Vec::with_capacity(jpeg.len() + 64);
    payload.extend_from_slice(b"--");
    payload.extend_from_slice(MJPEG_BOUNDARY.as_bytes());
    payload.extend_from_slice(b"\r\n");
    payload.extend_from_slice(format!("X-Sequence: {frame_number}\r\n").as_bytes());
    payload.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
    payload.extend_from_slice(jpeg);
    payload.extend_from_slice(b"\r\n");
    payload
}
