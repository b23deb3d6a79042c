//! Offline orchestration
//!
//! Runs recorded landmark frames through the same engine and session
//! aggregation the live recognizer uses, without a camera. Recorded frames
//! carry no timestamps, so durations and rates are derived from the nominal
//! capture frame rate.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::config::RecognizerConfig;
use crate::engine::GestureEngine;
use crate::error::RecognitionError;
use crate::landmarks::{parse_array, parse_ndjson};
use crate::report::{ReportEncoder, SessionReport};
use crate::session::Session;
use crate::types::{FrameLandmarks, FrameSize, GestureSnapshot, RecentActivity, SessionStats};

/// Per-frame verdicts and session statistics for one recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingAnalysis {
    pub snapshots: Vec<GestureSnapshot>,
    pub stats: SessionStats,
}

/// Analyze a recording with default thresholds.
///
/// `input` is NDJSON (one frame per line) or a JSON array of frames.
///
/// # Example
/// ```ignore
/// let analysis = analyze_recording(&recording, FrameSize::new(1280, 720))?;
/// println!("smiles: {}", analysis.stats.gestures_detected.smile);
/// ```
pub fn analyze_recording(
    input: &str,
    size: FrameSize,
) -> Result<RecordingAnalysis, RecognitionError> {
    let mut config = RecognizerConfig::default();
    config.capture.width = size.width;
    config.capture.height = size.height;

    let mut processor = GestureProcessor::with_config(config);
    let snapshots = processor.process_json(input)?;
    Ok(RecordingAnalysis {
        snapshots,
        stats: processor.stats(),
    })
}

/// Parse a recording in either supported layout
pub fn parse_recording(input: &str) -> Result<Vec<FrameLandmarks>, RecognitionError> {
    if input.trim_start().starts_with('[') {
        parse_array(input)
    } else {
        parse_ndjson(input)
    }
}

/// Stateful processor that keeps temporal buffers and counters across calls.
///
/// Use this when frames arrive incrementally (for example over the C ABI).
pub struct GestureProcessor {
    config: RecognizerConfig,
    engine: GestureEngine,
    session: Session,
    encoder: ReportEncoder,
}

impl Default for GestureProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureProcessor {
    pub fn new() -> Self {
        Self::with_config(RecognizerConfig::default())
    }

    pub fn with_config(config: RecognizerConfig) -> Self {
        Self {
            engine: GestureEngine::new(config.thresholds.clone(), &config.buffers),
            session: Session::start(),
            encoder: ReportEncoder::new(),
            config,
        }
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    pub fn frame_size(&self) -> FrameSize {
        FrameSize::new(self.config.capture.width, self.config.capture.height)
    }

    /// Evaluate one frame and count it
    pub fn process(&mut self, frame: &FrameLandmarks) -> GestureSnapshot {
        let snapshot = self.engine.evaluate(frame, self.frame_size());
        self.session.record(&snapshot);
        snapshot
    }

    /// Evaluate every frame of an NDJSON or JSON-array recording
    pub fn process_json(&mut self, input: &str) -> Result<Vec<GestureSnapshot>, RecognitionError> {
        let frames = parse_recording(input)?;
        Ok(frames.iter().map(|frame| self.process(frame)).collect())
    }

    /// Number of frames processed since creation or the last reset
    pub fn snapshot_count(&self) -> u64 {
        self.session.frame_count()
    }

    pub fn recent_activity(&self) -> RecentActivity {
        self.engine.recent_activity()
    }

    /// Recording time implied by the frame count at the nominal frame rate
    pub fn nominal_duration(&self) -> Duration {
        let fps = self.config.capture.fps.max(1) as f64;
        Duration::from_secs_f64(self.session.frame_count() as f64 / fps)
    }

    pub fn stats(&self) -> SessionStats {
        self.session.stats_for(self.nominal_duration())
    }

    pub fn report(&self) -> SessionReport {
        self.encoder.encode_stats(
            self.stats(),
            self.session.id(),
            self.session.started_at(),
            chrono::Utc::now(),
        )
    }

    /// Write the current report to `path`, replacing any existing file
    pub fn save_stats(&self, path: &Path) -> Result<SessionReport, RecognitionError> {
        let report = self.report();
        report.write_to(path)?;
        Ok(report)
    }

    /// Clear buffers and start a new session
    pub fn reset(&mut self) {
        self.engine.reset();
        self.session = Session::start();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SHORT_FACE: &str = r#"{"face": [{"x": 0.0, "y": 0.0}, {"x": 0.5, "y": 0.5}]}"#;

    fn smiling_frame() -> FrameLandmarks {
        use crate::landmarks::face;
        use crate::types::{Landmark, LandmarkSet};

        let mut set = LandmarkSet::default();
        set.set(face::NOSE_TIP, Landmark::new(0.5, 0.5));
        set.set(face::LEFT_EYE_OUTER, Landmark::new(0.4, 0.4));
        set.set(face::RIGHT_EYE_OUTER, Landmark::new(0.6, 0.4));
        set.set(face::MOUTH_LEFT, Landmark::new(0.4, 0.6));
        set.set(face::MOUTH_RIGHT, Landmark::new(0.6, 0.6));
        set.set(face::UPPER_LIP, Landmark::new(0.5, 0.6));
        set.set(face::LOWER_LIP, Landmark::new(0.5, 0.65));
        FrameLandmarks {
            face: Some(set),
            ..Default::default()
        }
    }

    fn recording(frames: usize) -> String {
        let line = serde_json::to_string(&smiling_frame()).unwrap();
        vec![line; frames].join("\n")
    }

    #[test]
    fn test_analyze_recording_counts_and_rates() {
        let analysis = analyze_recording(&recording(60), FrameSize::new(1000, 1000)).unwrap();

        assert_eq!(analysis.snapshots.len(), 60);
        assert!(analysis.snapshots.iter().all(|s| s.smile && s.eye_contact));
        assert_eq!(analysis.stats.total_frames, 60);
        assert_eq!(analysis.stats.gestures_detected.smile, 60);
        // 60 frames at 30 fps is two seconds
        assert!((analysis.stats.duration_seconds - 2.0).abs() < 1e-9);
        assert!((analysis.stats.fps - 30.0).abs() < 1e-9);
        assert!((analysis.stats.gesture_rates.smile - 1800.0).abs() < 1e-6);
    }

    #[test]
    fn test_analyze_accepts_json_array() {
        let input = format!("[{}]", serde_json::to_string(&smiling_frame()).unwrap());
        let analysis = analyze_recording(&input, FrameSize::new(1000, 1000)).unwrap();
        assert_eq!(analysis.snapshots.len(), 1);
    }

    #[test]
    fn test_short_face_set_disables_face_detectors() {
        let analysis = analyze_recording(SHORT_FACE, FrameSize::new(1000, 1000)).unwrap();
        assert_eq!(analysis.snapshots[0], GestureSnapshot::default());
    }

    #[test]
    fn test_empty_recording() {
        let analysis = analyze_recording("\n\n", FrameSize::default()).unwrap();
        assert!(analysis.snapshots.is_empty());
        assert_eq!(analysis.stats.fps, 0.0);
        assert_eq!(analysis.stats.total_frames, 0);
    }

    #[test]
    fn test_processor_keeps_state_across_calls() {
        let mut processor = GestureProcessor::new();
        processor.process_json(&recording(3)).unwrap();
        processor.process(&FrameLandmarks::empty());

        assert_eq!(processor.snapshot_count(), 4);
        assert_eq!(processor.recent_activity().window_frames, 4);

        processor.reset();
        assert_eq!(processor.snapshot_count(), 0);
        assert_eq!(processor.stats().gestures_detected.total(), 0);
    }

    #[test]
    fn test_processor_rejects_bad_input() {
        let mut processor = GestureProcessor::new();
        let result = processor.process_json("{\"face\": 3}");
        assert!(matches!(result, Err(RecognitionError::InvalidLandmarks(_))));
        assert_eq!(processor.snapshot_count(), 0);
    }

    #[test]
    fn test_save_stats_writes_report() {
        let mut processor = GestureProcessor::new();
        processor.process(&smiling_frame());

        let path = std::env::temp_dir()
            .join(format!("gesture-processor-{}.json", uuid::Uuid::new_v4()));
        let report = processor.save_stats(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: SessionReport = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed.session_id, report.session_id);
        std::fs::remove_file(&path).unwrap();
    }
}
