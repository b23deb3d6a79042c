//! Recognizer configuration
//!
//! Every struct is `#[serde(default)]`, so a configuration file only needs the
//! fields it overrides.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::buffer::{DEFAULT_HISTORY_CAPACITY, DEFAULT_POSITION_CAPACITY};
use crate::error::RecognitionError;

/// Top-level configuration for the capture pipeline and detectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    pub capture: CaptureConfig,
    /// Pause between processing cycles (milliseconds)
    pub cycle_pause_ms: u64,
    /// Interval between frames on the live-view stream (milliseconds)
    pub stream_interval_ms: u64,
    /// JPEG quality for published frames (1-100)
    pub jpeg_quality: u8,
    pub overlay: OverlayConfig,
    pub buffers: BufferConfig,
    pub thresholds: DetectorThresholds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Flip frames horizontally before detection
    pub mirror: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub enabled: bool,
    /// Blend factor of the indicator panel over the frame
    pub alpha: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    pub history_capacity: usize,
    pub position_capacity: usize,
    /// Number of newest wrist positions used by the fidget detector
    pub fidget_window: usize,
}

/// Thresholds for the geometric and temporal detectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorThresholds {
    /// Mouth width / lip gap ratio above which a smile is reported
    pub smile_ratio: f64,
    /// Allowed nose deviation from the eye midpoint, as a fraction of eye distance
    pub eye_contact_tolerance: f64,
    /// Minimum vertical nose travel within the window (pixels)
    pub nod_min_range_px: f64,
    pub nod_min_crossings: usize,
    /// Minimum horizontal wrist travel within the window (normalized)
    pub wave_min_range: f64,
    /// Maximum nose-to-wrist distance for the thinking pose (normalized)
    pub thinking_max_distance: f64,
    /// Minimum shoulder span for a confident posture (normalized)
    pub posture_min_shoulder_span: f64,
    pub fidget_min_variance: f64,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            cycle_pause_ms: 10,
            stream_interval_ms: 33,
            jpeg_quality: 80,
            overlay: OverlayConfig::default(),
            buffers: BufferConfig::default(),
            thresholds: DetectorThresholds::default(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 30,
            mirror: true,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            alpha: 0.7,
        }
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            position_capacity: DEFAULT_POSITION_CAPACITY,
            fidget_window: 5,
        }
    }
}

impl Default for DetectorThresholds {
    fn default() -> Self {
        Self {
            smile_ratio: 3.5,
            eye_contact_tolerance: 0.15,
            nod_min_range_px: 20.0,
            nod_min_crossings: 2,
            wave_min_range: 0.1,
            thinking_max_distance: 0.15,
            posture_min_shoulder_span: 0.2,
            fidget_min_variance: 0.01,
        }
    }
}

impl RecognizerConfig {
    /// Load a configuration file (JSON)
    pub fn load(path: &Path) -> Result<Self, RecognitionError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, RecognitionError> {
        let config: RecognizerConfig =
            serde_json::from_str(json).map_err(|e| RecognitionError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, RecognitionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), RecognitionError> {
        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(RecognitionError::Config(
                "capture width and height must be non-zero".to_string(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(RecognitionError::Config(format!(
                "jpeg_quality must be within 1-100, got {}",
                self.jpeg_quality
            )));
        }
        if !(0.0..=1.0).contains(&self.overlay.alpha) {
            return Err(RecognitionError::Config(format!(
                "overlay alpha must be within 0-1, got {}",
                self.overlay.alpha
            )));
        }
        if self.buffers.fidget_window == 0 {
            return Err(RecognitionError::Config(
                "fidget_window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn cycle_pause(&self) -> Duration {
        Duration::from_millis(self.cycle_pause_ms)
    }

    pub fn stream_interval(&self) -> Duration {
        Duration::from_millis(self.stream_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_match_detector_constants() {
        let config = RecognizerConfig::default();
        assert_eq!(config.thresholds.smile_ratio, 3.5);
        assert_eq!(config.thresholds.nod_min_range_px, 20.0);
        assert_eq!(config.buffers.history_capacity, 30);
        assert_eq!(config.buffers.position_capacity, 10);
        assert_eq!(config.cycle_pause(), Duration::from_millis(10));
        assert_eq!(config.stream_interval(), Duration::from_millis(33));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = RecognizerConfig::from_json(
            r#"{"jpeg_quality": 60, "thresholds": {"smile_ratio": 4.0}}"#,
        )
        .unwrap();

        assert_eq!(config.jpeg_quality, 60);
        assert_eq!(config.thresholds.smile_ratio, 4.0);
        assert_eq!(config.thresholds.wave_min_range, 0.1);
        assert_eq!(config.capture, CaptureConfig::default());
    }

    #[test]
    fn test_invalid_quality_rejected() {
        let result = RecognizerConfig::from_json(r#"{"jpeg_quality": 0}"#);
        assert!(matches!(result, Err(RecognitionError::Config(_))));
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let result = RecognizerConfig::from_json("{ not json");
        assert!(matches!(result, Err(RecognitionError::Config(_))));
    }

    #[test]
    fn test_round_trip_through_json() {
        let config = RecognizerConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(RecognizerConfig::from_json(&json).unwrap(), config);
    }
}
