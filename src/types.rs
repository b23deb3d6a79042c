//! Core types for Synheart Gesture
//!
//! This module defines the data structures that flow through the recognition
//! pipeline: landmarks in, per-frame gesture snapshots out, and the session
//! statistics aggregated from them.

use serde::{Deserialize, Serialize};

use crate::error::RecognitionError;

/// A single landmark, normalized to the frame (`[0, 1]` per axis).
///
/// `z` carries relative depth when the landmark source provides it and is
/// zero otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn with_depth(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance in the image plane (depth ignored)
    pub fn distance_2d(&self, other: &Landmark) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Ordered landmarks indexed by a fixed anatomical scheme.
///
/// See [`crate::landmarks`] for the indices used by the detectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    /// Landmark at an anatomical index, if the set is long enough
    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.points.get(index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    /// Overwrite a single landmark, growing the set with default points if needed
    pub fn set(&mut self, index: usize, landmark: Landmark) {
        if self.points.len() <= index {
            self.points.resize(index + 1, Landmark::default());
        }
        self.points[index] = landmark;
    }

    /// Reject non-finite coordinates
    pub fn validate(&self, modality: &str) -> Result<(), RecognitionError> {
        for (index, point) in self.points.iter().enumerate() {
            if !(point.x.is_finite() && point.y.is_finite() && point.z.is_finite()) {
                return Err(RecognitionError::InvalidLandmarks(format!(
                    "{modality} landmark {index} has non-finite coordinates"
                )));
            }
        }
        Ok(())
    }
}

/// Which hand a hand landmark set belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handedness {
    Left,
    Right,
}

/// Landmarks for one detected hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandLandmarks {
    pub side: Handedness,
    pub landmarks: LandmarkSet,
}

/// Everything the landmark source found in one frame.
///
/// Any modality may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameLandmarks {
    #[serde(default)]
    pub face: Option<LandmarkSet>,
    #[serde(default)]
    pub hands: Vec<HandLandmarks>,
    #[serde(default)]
    pub pose: Option<LandmarkSet>,
}

impl FrameLandmarks {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.face.is_none() && self.hands.is_empty() && self.pose.is_none()
    }

    pub fn validate(&self) -> Result<(), RecognitionError> {
        if let Some(face) = &self.face {
            face.validate("face")?;
        }
        for hand in &self.hands {
            hand.landmarks.validate("hand")?;
        }
        if let Some(pose) = &self.pose {
            pose.validate("pose")?;
        }
        Ok(())
    }
}

/// Frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for FrameSize {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

/// Body posture category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Posture {
    Confident,
    Slouching,
    #[default]
    Unknown,
}

impl Posture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Posture::Confident => "confident",
            Posture::Slouching => "slouching",
            Posture::Unknown => "unknown",
        }
    }
}

/// Gesture verdicts for one processed frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestureSnapshot {
    pub smile: bool,
    pub eye_contact: bool,
    pub head_nod: bool,
    pub thumbs_up: bool,
    pub wave: bool,
    pub thinking: bool,
    pub posture: Posture,
    pub nervous: bool,
}

impl GestureSnapshot {
    /// Whether the snapshot carries a positive verdict for a counted gesture
    pub fn has(&self, kind: GestureKind) -> bool {
        match kind {
            GestureKind::Smile => self.smile,
            GestureKind::ThumbsUp => self.thumbs_up,
            GestureKind::Wave => self.wave,
            GestureKind::Nod => self.head_nod,
            GestureKind::EyeContact => self.eye_contact,
            GestureKind::Thinking => self.thinking,
            GestureKind::ConfidentPosture => self.posture == Posture::Confident,
            GestureKind::NervousGestures => self.nervous,
        }
    }
}

/// Gestures tracked by the session counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    Smile,
    ThumbsUp,
    Wave,
    Nod,
    EyeContact,
    Thinking,
    ConfidentPosture,
    NervousGestures,
}

impl GestureKind {
    pub const ALL: [GestureKind; 8] = [
        GestureKind::Smile,
        GestureKind::ThumbsUp,
        GestureKind::Wave,
        GestureKind::Nod,
        GestureKind::EyeContact,
        GestureKind::Thinking,
        GestureKind::ConfidentPosture,
        GestureKind::NervousGestures,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GestureKind::Smile => "smile",
            GestureKind::ThumbsUp => "thumbs_up",
            GestureKind::Wave => "wave",
            GestureKind::Nod => "nod",
            GestureKind::EyeContact => "eye_contact",
            GestureKind::Thinking => "thinking",
            GestureKind::ConfidentPosture => "confident_posture",
            GestureKind::NervousGestures => "nervous_gestures",
        }
    }

    /// Human readable label for summaries
    pub fn label(&self) -> &'static str {
        match self {
            GestureKind::Smile => "Smile",
            GestureKind::ThumbsUp => "Thumbs Up",
            GestureKind::Wave => "Wave",
            GestureKind::Nod => "Nod",
            GestureKind::EyeContact => "Eye Contact",
            GestureKind::Thinking => "Thinking",
            GestureKind::ConfidentPosture => "Confident Posture",
            GestureKind::NervousGestures => "Nervous Gestures",
        }
    }
}

/// Cumulative per-gesture detection counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCounters {
    pub smile: u64,
    pub thumbs_up: u64,
    pub wave: u64,
    pub nod: u64,
    pub eye_contact: u64,
    pub thinking: u64,
    pub confident_posture: u64,
    pub nervous_gestures: u64,
}

impl SessionCounters {
    pub fn get(&self, kind: GestureKind) -> u64 {
        match kind {
            GestureKind::Smile => self.smile,
            GestureKind::ThumbsUp => self.thumbs_up,
            GestureKind::Wave => self.wave,
            GestureKind::Nod => self.nod,
            GestureKind::EyeContact => self.eye_contact,
            GestureKind::Thinking => self.thinking,
            GestureKind::ConfidentPosture => self.confident_posture,
            GestureKind::NervousGestures => self.nervous_gestures,
        }
    }

    fn slot(&mut self, kind: GestureKind) -> &mut u64 {
        match kind {
            GestureKind::Smile => &mut self.smile,
            GestureKind::ThumbsUp => &mut self.thumbs_up,
            GestureKind::Wave => &mut self.wave,
            GestureKind::Nod => &mut self.nod,
            GestureKind::EyeContact => &mut self.eye_contact,
            GestureKind::Thinking => &mut self.thinking,
            GestureKind::ConfidentPosture => &mut self.confident_posture,
            GestureKind::NervousGestures => &mut self.nervous_gestures,
        }
    }

    pub fn increment(&mut self, kind: GestureKind) {
        let slot = self.slot(kind);
        *slot = slot.saturating_add(1);
    }

    /// Add one for every gesture present in the snapshot
    pub fn record(&mut self, snapshot: &GestureSnapshot) {
        for kind in GestureKind::ALL {
            if snapshot.has(kind) {
                self.increment(kind);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (GestureKind, u64)> + '_ {
        GestureKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }

    pub fn total(&self) -> u64 {
        self.iter().map(|(_, count)| count).sum()
    }
}

/// Detections per minute, one field per counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GestureRates {
    pub smile: f64,
    pub thumbs_up: f64,
    pub wave: f64,
    pub nod: f64,
    pub eye_contact: f64,
    pub thinking: f64,
    pub confident_posture: f64,
    pub nervous_gestures: f64,
}

impl GestureRates {
    pub fn get(&self, kind: GestureKind) -> f64 {
        match kind {
            GestureKind::Smile => self.smile,
            GestureKind::ThumbsUp => self.thumbs_up,
            GestureKind::Wave => self.wave,
            GestureKind::Nod => self.nod,
            GestureKind::EyeContact => self.eye_contact,
            GestureKind::Thinking => self.thinking,
            GestureKind::ConfidentPosture => self.confident_posture,
            GestureKind::NervousGestures => self.nervous_gestures,
        }
    }

    pub fn set(&mut self, kind: GestureKind, rate: f64) {
        match kind {
            GestureKind::Smile => self.smile = rate,
            GestureKind::ThumbsUp => self.thumbs_up = rate,
            GestureKind::Wave => self.wave = rate,
            GestureKind::Nod => self.nod = rate,
            GestureKind::EyeContact => self.eye_contact = rate,
            GestureKind::Thinking => self.thinking = rate,
            GestureKind::ConfidentPosture => self.confident_posture = rate,
            GestureKind::NervousGestures => self.nervous_gestures = rate,
        }
    }
}

/// Read-only projection of a session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub duration_seconds: f64,
    pub total_frames: u64,
    pub fps: f64,
    pub gestures_detected: SessionCounters,
    pub gesture_rates: GestureRates,
}

/// Positive-frame counts over the engine's recent gesture history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentActivity {
    pub window_frames: usize,
    pub gestures: SessionCounters,
}

/// Lifecycle of the capture pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    #[default]
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// Status report for the serving layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizerStatus {
    pub running: bool,
    pub state: PipelineState,
    pub current_gestures: Option<GestureSnapshot>,
    pub recent: RecentActivity,
    pub stats: SessionStats,
}
