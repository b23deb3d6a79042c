//! Gesture detection engine
//!
//! Evaluates every detector against one frame of landmarks and keeps the
//! temporal buffers the motion detectors depend on. The engine is owned by a
//! single processing context; it is not shared across threads.

use crate::buffer::TemporalBuffer;
use crate::config::{BufferConfig, DetectorThresholds};
use crate::detectors;
use crate::landmarks::{face, hand};
use crate::types::{FrameLandmarks, FrameSize, GestureSnapshot, RecentActivity, SessionCounters};

/// Per-session detector state
#[derive(Debug, Clone)]
pub struct GestureEngine {
    thresholds: DetectorThresholds,
    fidget_window: usize,
    /// Nose tip vertical position (pixels)
    head_positions: TemporalBuffer<f64>,
    /// Wrist horizontal position (normalized), one sample per hand per frame
    hand_positions: TemporalBuffer<f64>,
    history: TemporalBuffer<GestureSnapshot>,
}

impl Default for GestureEngine {
    fn default() -> Self {
        Self::new(DetectorThresholds::default(), &BufferConfig::default())
    }
}

impl GestureEngine {
    pub fn new(thresholds: DetectorThresholds, buffers: &BufferConfig) -> Self {
        Self {
            thresholds,
            fidget_window: buffers.fidget_window,
            head_positions: TemporalBuffer::new(buffers.position_capacity),
            hand_positions: TemporalBuffer::new(buffers.position_capacity),
            history: TemporalBuffer::new(buffers.history_capacity),
        }
    }

    /// Evaluate all detectors for one frame and fold the result into history.
    ///
    /// With two hands in frame, hand-based verdicts come from the last hand
    /// evaluated; both wrists still feed the position buffer.
    pub fn evaluate(&mut self, landmarks: &FrameLandmarks, size: FrameSize) -> GestureSnapshot {
        let t = &self.thresholds;
        let mut snapshot = GestureSnapshot::default();

        if let Some(face_set) = &landmarks.face {
            snapshot.smile = detectors::detect_smile(face_set, size, t);
            snapshot.eye_contact = detectors::detect_eye_contact(face_set, t);

            if let Some(nose) = face_set.get(face::NOSE_TIP) {
                self.head_positions.push(nose.y * size.height as f64);
                snapshot.head_nod = detectors::detect_head_nod(&self.head_positions, t);
            }
        }

        for hand_set in &landmarks.hands {
            let hand_set = &hand_set.landmarks;
            snapshot.thumbs_up = detectors::detect_thumbs_up(hand_set);

            snapshot.wave = match hand_set.get(hand::WRIST) {
                Some(wrist) => {
                    self.hand_positions.push(wrist.x);
                    detectors::detect_wave(&self.hand_positions, t)
                }
                None => false,
            };

            snapshot.nervous =
                detectors::detect_nervous(&self.hand_positions, self.fidget_window, t);

            if let Some(pose_set) = &landmarks.pose {
                snapshot.thinking = detectors::detect_thinking_pose(pose_set, hand_set, t);
            }
        }

        snapshot.posture = detectors::detect_posture(landmarks.pose.as_ref(), t);

        self.history.push(snapshot);
        snapshot
    }

    /// Recent snapshots, oldest first
    pub fn history(&self) -> impl Iterator<Item = &GestureSnapshot> {
        self.history.iter()
    }

    /// Positive-frame counts over the history window
    pub fn recent_activity(&self) -> RecentActivity {
        let mut gestures = SessionCounters::default();
        for snapshot in self.history.iter() {
            gestures.record(snapshot);
        }
        RecentActivity {
            window_frames: self.history.len(),
            gestures,
        }
    }

    pub fn head_positions(&self) -> &TemporalBuffer<f64> {
        &self.head_positions
    }

    pub fn hand_positions(&self) -> &TemporalBuffer<f64> {
        &self.hand_positions
    }

    pub fn thresholds(&self) -> &DetectorThresholds {
        &self.thresholds
    }

    /// Drop all buffered history
    pub fn reset(&mut self) {
        self.head_positions.clear();
        self.hand_positions.clear();
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::pose;
    use crate::types::{HandLandmarks, Handedness, Landmark, LandmarkSet, Posture};
    use pretty_assertions::assert_eq;

    const SIZE: FrameSize = FrameSize {
        width: 1000,
        height: 1000,
    };

    fn face_at(nose_y: f64) -> LandmarkSet {
        let mut set = LandmarkSet::default();
        set.set(face::NOSE_TIP, Landmark::new(0.5, nose_y));
        set.set(face::LEFT_EYE_OUTER, Landmark::new(0.4, 0.4));
        set.set(face::RIGHT_EYE_OUTER, Landmark::new(0.6, 0.4));
        set.set(face::MOUTH_LEFT, Landmark::new(0.4, 0.6));
        set.set(face::MOUTH_RIGHT, Landmark::new(0.6, 0.6));
        set.set(face::UPPER_LIP, Landmark::new(0.5, 0.6));
        set.set(face::LOWER_LIP, Landmark::new(0.5, 0.65));
        set
    }

    fn open_hand(wrist_x: f64) -> HandLandmarks {
        let mut set = LandmarkSet::default();
        set.set(hand::WRIST, Landmark::new(wrist_x, 0.5));
        set.set(hand::THUMB_TIP, Landmark::new(wrist_x, 0.3));
        for tip in hand::FINGER_TIPS {
            set.set(tip, Landmark::new(wrist_x, 0.3));
        }
        HandLandmarks {
            side: Handedness::Right,
            landmarks: set,
        }
    }

    fn thumbs_up_hand(wrist_x: f64) -> HandLandmarks {
        let mut hand_landmarks = open_hand(wrist_x);
        for tip in hand::FINGER_TIPS {
            hand_landmarks.landmarks.set(tip, Landmark::new(wrist_x, 0.6));
        }
        hand_landmarks
    }

    fn upright_pose() -> LandmarkSet {
        let mut set = LandmarkSet::default();
        set.set(pose::NOSE, Landmark::new(0.5, 0.3));
        set.set(pose::LEFT_SHOULDER, Landmark::new(0.35, 0.5));
        set.set(pose::RIGHT_SHOULDER, Landmark::new(0.65, 0.5));
        set.set(pose::LEFT_HIP, Landmark::new(0.42, 0.9));
        set.set(pose::RIGHT_HIP, Landmark::new(0.58, 0.9));
        set
    }

    #[test]
    fn test_empty_frame_yields_default_snapshot() {
        let mut engine = GestureEngine::default();
        let snapshot = engine.evaluate(&FrameLandmarks::empty(), SIZE);
        assert_eq!(snapshot, GestureSnapshot::default());
        assert_eq!(engine.history().count(), 1);
    }

    #[test]
    fn test_face_detectors() {
        let mut engine = GestureEngine::default();
        let frame = FrameLandmarks {
            face: Some(face_at(0.5)),
            ..Default::default()
        };

        let snapshot = engine.evaluate(&frame, SIZE);
        assert!(snapshot.smile);
        assert!(snapshot.eye_contact);
        assert!(!snapshot.head_nod);
        assert_eq!(snapshot.posture, Posture::Unknown);
        assert_eq!(engine.head_positions().latest(), Some(&500.0));
    }

    #[test]
    fn test_nod_across_frames() {
        let mut engine = GestureEngine::default();
        let mut verdicts = Vec::new();
        for i in 0..12 {
            let nose_y = if i % 2 == 0 { 0.40 } else { 0.43 };
            let frame = FrameLandmarks {
                face: Some(face_at(nose_y)),
                ..Default::default()
            };
            verdicts.push(engine.evaluate(&frame, SIZE).head_nod);
        }

        // first nine frames fill the window, then the sliding window keeps firing
        assert!(verdicts[..9].iter().all(|v| !v));
        assert!(verdicts[9..].iter().all(|v| *v));
    }

    #[test]
    fn test_last_hand_wins() {
        let mut engine = GestureEngine::default();
        let frame = FrameLandmarks {
            hands: vec![thumbs_up_hand(0.3), open_hand(0.7)],
            ..Default::default()
        };

        let snapshot = engine.evaluate(&frame, SIZE);
        assert!(!snapshot.thumbs_up);
        // both wrists were sampled
        assert_eq!(engine.hand_positions().len(), 2);

        let frame = FrameLandmarks {
            hands: vec![open_hand(0.7), thumbs_up_hand(0.3)],
            ..Default::default()
        };
        assert!(engine.evaluate(&frame, SIZE).thumbs_up);
    }

    #[test]
    fn test_wave_and_nervous_from_alternating_wrist() {
        let mut engine = GestureEngine::default();
        let mut last = GestureSnapshot::default();
        for i in 0..10 {
            let x = if i % 2 == 0 { 0.2 } else { 0.5 };
            let frame = FrameLandmarks {
                hands: vec![open_hand(x)],
                ..Default::default()
            };
            last = engine.evaluate(&frame, SIZE);
        }
        assert!(last.wave);
        assert!(last.nervous);
    }

    #[test]
    fn test_thinking_requires_pose() {
        let mut engine = GestureEngine::default();
        let frame = FrameLandmarks {
            hands: vec![open_hand(0.52)],
            ..Default::default()
        };
        assert!(!engine.evaluate(&frame, SIZE).thinking);

        let mut hand_near_face = open_hand(0.52);
        hand_near_face.landmarks.set(hand::WRIST, Landmark::new(0.52, 0.35));
        let frame = FrameLandmarks {
            hands: vec![hand_near_face],
            pose: Some(upright_pose()),
            ..Default::default()
        };
        let snapshot = engine.evaluate(&frame, SIZE);
        assert!(snapshot.thinking);
        assert_eq!(snapshot.posture, Posture::Confident);
    }

    #[test]
    fn test_detectors_are_reproducible() {
        let frames: Vec<FrameLandmarks> = (0..15)
            .map(|i| FrameLandmarks {
                face: Some(face_at(0.4 + 0.01 * (i % 4) as f64)),
                hands: vec![open_hand(0.3 + 0.05 * (i % 3) as f64)],
                pose: Some(upright_pose()),
            })
            .collect();

        let mut first = GestureEngine::default();
        let mut second = GestureEngine::default();
        let a: Vec<_> = frames.iter().map(|f| first.evaluate(f, SIZE)).collect();
        let b: Vec<_> = frames.iter().map(|f| second.evaluate(f, SIZE)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_history_is_bounded_and_summarized() {
        let mut engine = GestureEngine::new(
            DetectorThresholds::default(),
            &BufferConfig {
                history_capacity: 4,
                ..Default::default()
            },
        );
        let frame = FrameLandmarks {
            face: Some(face_at(0.5)),
            ..Default::default()
        };
        for _ in 0..6 {
            engine.evaluate(&frame, SIZE);
        }

        let recent = engine.recent_activity();
        assert_eq!(recent.window_frames, 4);
        assert_eq!(recent.gestures.smile, 4);
        assert_eq!(recent.gestures.eye_contact, 4);

        engine.reset();
        assert_eq!(engine.history().count(), 0);
        assert!(engine.head_positions().is_empty());
    }
}
