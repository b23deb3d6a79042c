//! Error types for Synheart Gesture

use thiserror::Error;

/// Errors that can occur while capturing or recognizing gestures.
///
/// Missing landmarks are never an error: a frame without a face, hands or pose
/// simply disables the detectors that depend on that modality.
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("Camera {index} unavailable: {reason}")]
    DeviceUnavailable { index: u32, reason: String },

    #[error("Failed to read frame: {0}")]
    FrameRead(String),

    #[error("Recognizer is already running")]
    AlreadyRunning,

    #[error("Invalid landmark frame: {0}")]
    InvalidLandmarks(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
