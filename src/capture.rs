//! Frame capture
//!
//! The recognizer opens its camera through a [`FrameSourceFactory`] so the
//! device can be swapped for an in-memory source in tests or replays. The
//! nokhwa-backed [`CameraSource`] is only built with the `camera` feature.

use image::{Rgb, RgbImage};

use crate::error::RecognitionError;

/// A device that yields RGB frames
pub trait FrameSource {
    /// Human-readable device name
    fn name(&self) -> String;

    /// Block until the next frame is available
    fn read_frame(&mut self) -> Result<RgbImage, RecognitionError>;
}

/// Opens frame sources by device index.
///
/// `open` is called on the capture thread, so sources themselves need not be
/// `Send`.
pub trait FrameSourceFactory: Send + Sync {
    fn open(&self, index: u32) -> Result<Box<dyn FrameSource>, RecognitionError>;
}

/// Solid-color frames of a fixed size, for running the pipeline without a device
#[derive(Debug, Clone)]
pub struct BlankSource {
    width: u32,
    height: u32,
    color: Rgb<u8>,
}

impl BlankSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            color: Rgb([0, 0, 0]),
        }
    }

    pub fn with_color(mut self, color: Rgb<u8>) -> Self {
        self.color = color;
        self
    }
}

impl FrameSource for BlankSource {
    fn name(&self) -> String {
        format!("blank {}x{}", self.width, self.height)
    }

    fn read_frame(&mut self) -> Result<RgbImage, RecognitionError> {
        Ok(RgbImage::from_pixel(self.width, self.height, self.color))
    }
}

/// Factory handing out [`BlankSource`]s for every index
#[derive(Debug, Clone)]
pub struct BlankSourceFactory {
    pub width: u32,
    pub height: u32,
}

impl FrameSourceFactory for BlankSourceFactory {
    fn open(&self, _index: u32) -> Result<Box<dyn FrameSource>, RecognitionError> {
        Ok(Box::new(BlankSource::new(self.width, self.height)))
    }
}

#[cfg(feature = "camera")]
pub use self::camera::{capture_format, CameraFactory, CameraSource};

#[cfg(feature = "camera")]
mod camera {
    use image::RgbImage;
    use nokhwa::{
        pixel_format::RgbFormat,
        utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType},
        Camera,
    };
    use tracing::{info, warn};

    use super::{FrameSource, FrameSourceFactory};
    use crate::config::CaptureConfig;
    use crate::error::RecognitionError;

    /// Native camera opened through nokhwa
    pub struct CameraSource {
        camera: Camera,
    }

    impl CameraSource {
        /// Open camera `index` at the format closest to `capture`, falling
        /// back to the highest frame rate the device offers.
        pub fn open(index: u32, capture: &CaptureConfig) -> Result<Self, RecognitionError> {
            let unavailable =
                |reason: String| RecognitionError::DeviceUnavailable { index, reason };

            let closest = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
                capture_format(capture),
            ));
            let mut camera = match Camera::new(CameraIndex::Index(index), closest) {
                Ok(camera) => camera,
                Err(e) => {
                    warn!(
                        error = %e,
                        "requested capture format unavailable, using highest frame rate"
                    );
                    let fallback = RequestedFormat::new::<RgbFormat>(
                        RequestedFormatType::AbsoluteHighestFrameRate,
                    );
                    Camera::new(CameraIndex::Index(index), fallback)
                        .map_err(|e| unavailable(e.to_string()))?
                }
            };
            camera
                .open_stream()
                .map_err(|e| unavailable(e.to_string()))?;

            info!(
                camera = %camera.info().human_name(),
                format = %camera.camera_format(),
                "camera opened"
            );
            Ok(Self { camera })
        }

        pub fn width(&self) -> u32 {
            self.camera.resolution().width()
        }

        pub fn height(&self) -> u32 {
            self.camera.resolution().height()
        }
    }

    impl FrameSource for CameraSource {
        fn name(&self) -> String {
            self.camera.info().human_name()
        }

        fn read_frame(&mut self) -> Result<RgbImage, RecognitionError> {
            let frame = self
                .camera
                .frame()
                .map_err(|e| RecognitionError::FrameRead(e.to_string()))?;
            let decoded = frame
                .decode_image::<RgbFormat>()
                .map_err(|e| RecognitionError::FrameRead(e.to_string()))?;
            let (width, height) = (decoded.width(), decoded.height());
            RgbImage::from_raw(width, height, decoded.into_raw()).ok_or_else(|| {
                RecognitionError::FrameRead(format!("short frame buffer for {width}x{height}"))
            })
        }
    }

    impl Drop for CameraSource {
        fn drop(&mut self) {
            if let Err(e) = self.camera.stop_stream() {
                warn!(error = %e, "failed to stop camera stream");
            }
        }
    }

    /// MJPEG at the configured resolution and frame rate
    pub fn capture_format(capture: &CaptureConfig) -> CameraFormat {
        CameraFormat::new_from(capture.width, capture.height, FrameFormat::MJPEG, capture.fps)
    }

    /// Opens native cameras with the configured capture settings
    #[derive(Debug, Clone, Default)]
    pub struct CameraFactory {
        capture: CaptureConfig,
    }

    impl CameraFactory {
        pub fn new(capture: CaptureConfig) -> Self {
            Self { capture }
        }
    }

    impl FrameSourceFactory for CameraFactory {
        fn open(&self, index: u32) -> Result<Box<dyn FrameSource>, RecognitionError> {
            info!(
                index,
                width = self.capture.width,
                height = self.capture.height,
                fps = self.capture.fps,
                "opening camera"
            );
            Ok(Box::new(CameraSource::open(index, &self.capture)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_source_frames() {
        let factory = BlankSourceFactory {
            width: 8,
            height: 4,
        };
        let mut source = factory.open(0).unwrap();
        let frame = source.read_frame().unwrap();
        assert_eq!(frame.dimensions(), (8, 4));
        assert_eq!(source.name(), "blank 8x4");
    }

    #[test]
    fn test_blank_source_color() {
        let mut source = BlankSource::new(2, 2).with_color(Rgb([10, 20, 30]));
        let frame = source.read_frame().unwrap();
        assert_eq!(frame.get_pixel(1, 1), &Rgb([10, 20, 30]));
    }

    #[cfg(feature = "camera")]
    #[test]
    fn test_capture_format_follows_config() {
        use crate::config::CaptureConfig;
        use nokhwa::utils::FrameFormat;

        let format = capture_format(&CaptureConfig::default());
        assert_eq!((format.width(), format.height()), (1280, 720));
        assert_eq!(format.frame_rate(), 30);
        assert_eq!(format.format(), FrameFormat::MJPEG);
    }
}
