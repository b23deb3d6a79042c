//! Synheart Gesture - On-device gesture and posture signals from live video
//!
//! Gesture turns per-frame face, hand and body landmarks into conversational
//! signals through a deterministic pipeline: landmark extraction → temporal
//! buffering → gesture detection → session aggregation → report encoding.
//!
//! ## Modules
//!
//! - **Live recognition**: [`GestureRecognizer`] owns a camera, runs detection
//!   on a capture thread and publishes the latest annotated frame and snapshot
//! - **Offline replay**: [`analyze_recording`] and [`GestureProcessor`] run
//!   recorded landmark frames through the same engine

pub mod buffer;
pub mod capture;
pub mod config;
pub mod detectors;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod landmarks;
pub mod overlay;
pub mod pipeline;
pub mod recognizer;
pub mod report;
pub mod session;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::RecognizerConfig;
pub use engine::GestureEngine;
pub use error::RecognitionError;
pub use landmarks::{LandmarkSource, ReplayLandmarkSource};
pub use pipeline::{analyze_recording, GestureProcessor, RecordingAnalysis};
pub use recognizer::{FrameStream, GestureRecognizer, PublishedFrame};
pub use report::{ReportEncoder, SessionReport};
pub use session::Session;
pub use types::{
    FrameLandmarks, GestureKind, GestureSnapshot, PipelineState, Posture, SessionStats,
};

/// Library version embedded in session reports
pub const GESTURE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for session reports
pub const PRODUCER_NAME: &str = "synheart-gesture";
