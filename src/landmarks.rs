//! Landmark sources
//!
//! The landmark model itself is outside this crate. Anything that can turn a
//! frame into face, hand and pose keypoints implements [`LandmarkSource`].
//! Recorded landmark streams (NDJSON or a JSON array of frames) can be replayed
//! through [`ReplayLandmarkSource`].

use image::RgbImage;
use std::sync::{Mutex, PoisonError};

use crate::error::RecognitionError;
use crate::types::FrameLandmarks;

/// Face mesh indices (468/478 point topology)
pub mod face {
    pub const NOSE_TIP: usize = 1;
    pub const UPPER_LIP: usize = 13;
    pub const LOWER_LIP: usize = 14;
    pub const LEFT_EYE_OUTER: usize = 33;
    pub const MOUTH_LEFT: usize = 61;
    pub const RIGHT_EYE_OUTER: usize = 263;
    pub const MOUTH_RIGHT: usize = 291;
}

/// Hand indices (21 point topology)
pub mod hand {
    pub const WRIST: usize = 0;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_TIP: usize = 16;
    pub const PINKY_TIP: usize = 20;

    pub const FINGER_TIPS: [usize; 4] = [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];
}

/// Body pose indices (33 point topology)
pub mod pose {
    pub const NOSE: usize = 0;
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
    pub const LEFT_HIP: usize = 23;
    pub const RIGHT_HIP: usize = 24;
}

/// Produces landmarks for a frame.
///
/// Implementations must be a pure function of the frame from the caller's point
/// of view; they are called from the capture thread only.
pub trait LandmarkSource: Send + Sync {
    fn name(&self) -> String;

    fn extract(&self, frame: &RgbImage) -> FrameLandmarks;
}

/// Source that never finds anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLandmarks;

impl LandmarkSource for NoLandmarks {
    fn name(&self) -> String {
        "none".to_string()
    }

    fn extract(&self, _frame: &RgbImage) -> FrameLandmarks {
        FrameLandmarks::empty()
    }
}

/// Replays recorded landmark frames in order, one per call
pub struct ReplayLandmarkSource {
    frames: Vec<FrameLandmarks>,
    cursor: Mutex<usize>,
    looping: bool,
}

impl ReplayLandmarkSource {
    pub fn new(frames: Vec<FrameLandmarks>) -> Self {
        Self {
            frames,
            cursor: Mutex::new(0),
            looping: false,
        }
    }

    /// Restart from the first frame once the recording is exhausted
    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    pub fn from_ndjson(input: &str) -> Result<Self, RecognitionError> {
        Ok(Self::new(parse_ndjson(input)?))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Next recorded frame, or an empty frame once exhausted
    pub fn next_frame(&self) -> FrameLandmarks {
        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        if self.frames.is_empty() {
            return FrameLandmarks::empty();
        }
        if *cursor >= self.frames.len() {
            if !self.looping {
                return FrameLandmarks::empty();
            }
            *cursor = 0;
        }
        let frame = self.frames[*cursor].clone();
        *cursor += 1;
        frame
    }
}

impl LandmarkSource for ReplayLandmarkSource {
    fn name(&self) -> String {
        format!("replay ({} frames)", self.frames.len())
    }

    fn extract(&self, _frame: &RgbImage) -> FrameLandmarks {
        self.next_frame()
    }
}

/// Parse newline-delimited landmark frames. Blank lines are skipped.
pub fn parse_ndjson(input: &str) -> Result<Vec<FrameLandmarks>, RecognitionError> {
    let mut frames = Vec::new();
    for (line_no, line) in input.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let frame: FrameLandmarks = serde_json::from_str(trimmed).map_err(|e| {
            RecognitionError::InvalidLandmarks(format!("line {}: {}", line_no + 1, e))
        })?;
        frame.validate()?;
        frames.push(frame);
    }
    Ok(frames)
}

/// Parse a JSON array of landmark frames
pub fn parse_array(input: &str) -> Result<Vec<FrameLandmarks>, RecognitionError> {
    let frames: Vec<FrameLandmarks> = serde_json::from_str(input)?;
    for frame in &frames {
        frame.validate()?;
    }
    Ok(frames)
}
