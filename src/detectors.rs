//! Gesture detectors
//!
//! Each detector is a pure function of the current landmarks and, for the
//! motion detectors, a temporal buffer the caller has already updated. A
//! landmark set too short for a detector's indices counts as absent.

use crate::buffer::TemporalBuffer;
use crate::config::DetectorThresholds;
use crate::landmarks::{face, hand, pose};
use crate::types::{FrameSize, LandmarkSet, Posture};

/// Mouth width / lip gap ratio in pixel units.
///
/// Returns `None` when the landmarks are missing or the lips are closed
/// (zero vertical gap).
pub fn smile_ratio(face_set: &LandmarkSet, size: FrameSize) -> Option<f64> {
    let left = face_set.get(face::MOUTH_LEFT)?;
    let right = face_set.get(face::MOUTH_RIGHT)?;
    let top = face_set.get(face::UPPER_LIP)?;
    let bottom = face_set.get(face::LOWER_LIP)?;

    let mouth_width = (right.x - left.x).abs() * size.width as f64;
    let mouth_height = (top.y - bottom.y).abs() * size.height as f64;

    if mouth_height > 0.0 {
        Some(mouth_width / mouth_height)
    } else {
        None
    }
}

pub fn detect_smile(face_set: &LandmarkSet, size: FrameSize, t: &DetectorThresholds) -> bool {
    smile_ratio(face_set, size).is_some_and(|ratio| ratio > t.smile_ratio)
}

/// Nose tip centred between the outer eye corners
pub fn detect_eye_contact(face_set: &LandmarkSet, t: &DetectorThresholds) -> bool {
    let (Some(left_eye), Some(right_eye), Some(nose)) = (
        face_set.get(face::LEFT_EYE_OUTER),
        face_set.get(face::RIGHT_EYE_OUTER),
        face_set.get(face::NOSE_TIP),
    ) else {
        return false;
    };

    let eye_center_x = (left_eye.x + right_eye.x) / 2.0;
    let deviation = (nose.x - eye_center_x).abs();
    let eye_distance = (right_eye.x - left_eye.x).abs();

    deviation < eye_distance * t.eye_contact_tolerance
}

/// Vertical nose oscillation over a full window of pixel positions.
///
/// The window is not cleared on detection, so a sustained nod can be reported
/// on several consecutive frames.
pub fn detect_head_nod(head_positions: &TemporalBuffer<f64>, t: &DetectorThresholds) -> bool {
    if !head_positions.is_full() {
        return false;
    }
    let Some((min, max)) = head_positions.bounds() else {
        return false;
    };
    if max - min <= t.nod_min_range_px {
        return false;
    }
    midpoint_crossings(head_positions, (max + min) / 2.0) >= t.nod_min_crossings
}

/// Number of consecutive sample pairs that straddle `mid`
fn midpoint_crossings(positions: &TemporalBuffer<f64>, mid: f64) -> usize {
    let samples: Vec<f64> = positions.iter().copied().collect();
    samples
        .windows(2)
        .filter(|pair| (pair[0] < mid) != (pair[1] < mid))
        .count()
}

/// Thumb above the wrist, every other fingertip below it (image y grows down)
pub fn detect_thumbs_up(hand_set: &LandmarkSet) -> bool {
    let (Some(wrist), Some(thumb)) = (hand_set.get(hand::WRIST), hand_set.get(hand::THUMB_TIP))
    else {
        return false;
    };

    let thumb_extended = thumb.y < wrist.y;
    let fingers_curled = hand::FINGER_TIPS
        .iter()
        .all(|&index| hand_set.get(index).is_some_and(|tip| tip.y > wrist.y));

    thumb_extended && fingers_curled
}

/// Horizontal wrist sweep over a full window of normalized positions
pub fn detect_wave(hand_positions: &TemporalBuffer<f64>, t: &DetectorThresholds) -> bool {
    hand_positions.is_full() && hand_positions.range() > t.wave_min_range
}

/// Wrist close to the nose
pub fn detect_thinking_pose(
    pose_set: &LandmarkSet,
    hand_set: &LandmarkSet,
    t: &DetectorThresholds,
) -> bool {
    match (pose_set.get(pose::NOSE), hand_set.get(hand::WRIST)) {
        (Some(nose), Some(wrist)) => nose.distance_2d(wrist) < t.thinking_max_distance,
        _ => false,
    }
}

/// Shoulders above hips and squared to the camera
pub fn detect_posture(pose_set: Option<&LandmarkSet>, t: &DetectorThresholds) -> Posture {
    let Some(pose_set) = pose_set else {
        return Posture::Unknown;
    };
    let (Some(ls), Some(rs), Some(lh), Some(rh)) = (
        pose_set.get(pose::LEFT_SHOULDER),
        pose_set.get(pose::RIGHT_SHOULDER),
        pose_set.get(pose::LEFT_HIP),
        pose_set.get(pose::RIGHT_HIP),
    ) else {
        return Posture::Unknown;
    };

    let shoulder_center_y = (ls.y + rs.y) / 2.0;
    let hip_center_y = (lh.y + rh.y) / 2.0;
    let shoulder_width = (rs.x - ls.x).abs();

    if shoulder_center_y < hip_center_y && shoulder_width > t.posture_min_shoulder_span {
        Posture::Confident
    } else {
        Posture::Slouching
    }
}

/// High variance in the newest wrist positions
pub fn detect_nervous(
    hand_positions: &TemporalBuffer<f64>,
    window: usize,
    t: &DetectorThresholds,
) -> bool {
    hand_positions
        .variance_of_last(window)
        .is_some_and(|variance| variance > t.fidget_min_variance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Landmark;
    use pretty_assertions::assert_eq;

    fn thresholds() -> DetectorThresholds {
        DetectorThresholds::default()
    }

    fn mouth(width: f64, gap: f64) -> LandmarkSet {
        let mut set = LandmarkSet::default();
        set.set(face::MOUTH_LEFT, Landmark::new(0.4, 0.6));
        set.set(face::MOUTH_RIGHT, Landmark::new(0.4 + width, 0.6));
        set.set(face::UPPER_LIP, Landmark::new(0.5, 0.6));
        set.set(face::LOWER_LIP, Landmark::new(0.5, 0.6 + gap));
        set
    }

    fn buffer(values: &[f64]) -> TemporalBuffer<f64> {
        let mut buffer = TemporalBuffer::new(10);
        for v in values {
            buffer.push(*v);
        }
        buffer
    }

    #[test]
    fn test_smile_ratio_four_is_smile() {
        // 0.2 * 1000 / (0.05 * 1000) = 4.0
        let size = FrameSize::new(1000, 1000);
        let face_set = mouth(0.2, 0.05);
        let ratio = smile_ratio(&face_set, size).unwrap();
        assert!((ratio - 4.0).abs() < 1e-9);
        assert!(detect_smile(&face_set, size, &thresholds()));
    }

    #[test]
    fn test_smile_ratio_two_is_not_smile() {
        let size = FrameSize::new(1000, 1000);
        assert!(!detect_smile(&mouth(0.1, 0.05), size, &thresholds()));
    }

    #[test]
    fn test_smile_zero_gap_is_false() {
        let size = FrameSize::new(1280, 720);
        let face_set = mouth(0.2, 0.0);
        assert_eq!(smile_ratio(&face_set, size), None);
        assert!(!detect_smile(&face_set, size, &thresholds()));
    }

    #[test]
    fn test_smile_uses_pixel_aspect() {
        // width 0.1 * 1280 = 128, gap 0.05 * 720 = 36 -> 3.55
        let size = FrameSize::new(1280, 720);
        assert!(detect_smile(&mouth(0.1, 0.05), size, &thresholds()));
    }

    #[test]
    fn test_eye_contact() {
        let mut face_set = LandmarkSet::default();
        face_set.set(face::LEFT_EYE_OUTER, Landmark::new(0.4, 0.4));
        face_set.set(face::RIGHT_EYE_OUTER, Landmark::new(0.6, 0.4));

        face_set.set(face::NOSE_TIP, Landmark::new(0.51, 0.5));
        assert!(detect_eye_contact(&face_set, &thresholds()));

        // deviation 0.04 >= 0.15 * 0.2
        face_set.set(face::NOSE_TIP, Landmark::new(0.54, 0.5));
        assert!(!detect_eye_contact(&face_set, &thresholds()));
    }

    #[test]
    fn test_eye_contact_missing_landmarks() {
        assert!(!detect_eye_contact(&LandmarkSet::default(), &thresholds()));
    }

    #[test]
    fn test_nod_oscillation_detected() {
        let positions = buffer(&[
            100.0, 130.0, 100.0, 130.0, 100.0, 130.0, 100.0, 130.0, 100.0, 130.0,
        ]);
        assert!(detect_head_nod(&positions, &thresholds()));
    }

    #[test]
    fn test_nod_monotonic_rejected() {
        let values: Vec<f64> = (0..10).map(|i| 100.0 + 3.0 * i as f64).collect();
        let positions = buffer(&values);
        assert!(positions.range() > 20.0);
        assert!(!detect_head_nod(&positions, &thresholds()));
    }

    #[test]
    fn test_nod_needs_full_window() {
        let positions = buffer(&[100.0, 130.0, 100.0, 130.0, 100.0]);
        assert!(!detect_head_nod(&positions, &thresholds()));
    }

    #[test]
    fn test_nod_small_motion_rejected() {
        let positions = buffer(&[
            100.0, 110.0, 100.0, 110.0, 100.0, 110.0, 100.0, 110.0, 100.0, 110.0,
        ]);
        assert!(!detect_head_nod(&positions, &thresholds()));
    }

    #[test]
    fn test_midpoint_crossings_counts_both_directions() {
        let positions = buffer(&[0.0, 10.0, 0.0]);
        assert_eq!(midpoint_crossings(&positions, 5.0), 2);
        // landing exactly on the midpoint counts as crossing upward
        let positions = buffer(&[0.0, 5.0]);
        assert_eq!(midpoint_crossings(&positions, 5.0), 1);
    }

    fn hand_with(thumb_y: f64, finger_y: f64) -> LandmarkSet {
        let mut set = LandmarkSet::default();
        set.set(hand::WRIST, Landmark::new(0.5, 0.5));
        set.set(hand::THUMB_TIP, Landmark::new(0.48, thumb_y));
        for tip in hand::FINGER_TIPS {
            set.set(tip, Landmark::new(0.52, finger_y));
        }
        set
    }

    #[test]
    fn test_thumbs_up() {
        assert!(detect_thumbs_up(&hand_with(0.3, 0.6)));
        assert!(!detect_thumbs_up(&hand_with(0.6, 0.6)));
        assert!(!detect_thumbs_up(&hand_with(0.3, 0.4)));
    }

    #[test]
    fn test_thumbs_up_incomplete_hand() {
        let mut set = hand_with(0.3, 0.6);
        let truncated = LandmarkSet::new(set.points()[..hand::PINKY_TIP].to_vec());
        assert!(!detect_thumbs_up(&truncated));
        set.set(hand::PINKY_TIP, Landmark::new(0.5, 0.4));
        assert!(!detect_thumbs_up(&set));
    }

    #[test]
    fn test_wave() {
        let sweep = buffer(&[0.30, 0.36, 0.42, 0.36, 0.30, 0.36, 0.42, 0.36, 0.30, 0.36]);
        assert!(detect_wave(&sweep, &thresholds()));

        let still = buffer(&[0.30, 0.31, 0.32, 0.31, 0.30, 0.31, 0.32, 0.31, 0.30, 0.31]);
        assert!(!detect_wave(&still, &thresholds()));

        let partial = buffer(&[0.1, 0.9]);
        assert!(!detect_wave(&partial, &thresholds()));
    }

    #[test]
    fn test_thinking_pose() {
        let mut pose_set = LandmarkSet::default();
        pose_set.set(pose::NOSE, Landmark::new(0.5, 0.3));
        let mut hand_set = LandmarkSet::default();

        hand_set.set(hand::WRIST, Landmark::new(0.55, 0.38));
        assert!(detect_thinking_pose(&pose_set, &hand_set, &thresholds()));

        hand_set.set(hand::WRIST, Landmark::new(0.5, 0.7));
        assert!(!detect_thinking_pose(&pose_set, &hand_set, &thresholds()));
    }

    fn body(shoulder_y: f64, hip_y: f64, span: f64) -> LandmarkSet {
        let mut set = LandmarkSet::default();
        set.set(pose::LEFT_SHOULDER, Landmark::new(0.5 - span / 2.0, shoulder_y));
        set.set(pose::RIGHT_SHOULDER, Landmark::new(0.5 + span / 2.0, shoulder_y));
        set.set(pose::LEFT_HIP, Landmark::new(0.45, hip_y));
        set.set(pose::RIGHT_HIP, Landmark::new(0.55, hip_y));
        set
    }

    #[test]
    fn test_posture_categories() {
        let t = thresholds();
        assert_eq!(detect_posture(Some(&body(0.4, 0.8, 0.3)), &t), Posture::Confident);
        assert_eq!(detect_posture(Some(&body(0.4, 0.8, 0.15)), &t), Posture::Slouching);
        assert_eq!(detect_posture(Some(&body(0.9, 0.8, 0.3)), &t), Posture::Slouching);
        assert_eq!(detect_posture(None, &t), Posture::Unknown);
        assert_eq!(detect_posture(Some(&LandmarkSet::default()), &t), Posture::Unknown);
    }

    #[test]
    fn test_nervous_variance() {
        let t = thresholds();
        let calm = buffer(&[0.5, 0.5, 0.51, 0.5, 0.49]);
        assert!(!detect_nervous(&calm, 5, &t));

        // 0.2, 0.5 alternating: variance 0.0216
        let fidget = buffer(&[0.2, 0.5, 0.2, 0.5, 0.2]);
        assert!(detect_nervous(&fidget, 5, &t));

        let short = buffer(&[0.1, 0.9]);
        assert!(!detect_nervous(&short, 5, &t));
    }
}
