//! Recorded landmarks replayed through both the offline processor and the
//! live recognizer must yield the same verdicts.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;

use synheart_gesture::capture::BlankSourceFactory;
use synheart_gesture::landmarks::{hand, pose};
use synheart_gesture::types::{
    FrameLandmarks, FrameSize, HandLandmarks, Handedness, Landmark, LandmarkSet, Posture,
};
use synheart_gesture::{
    analyze_recording, GestureRecognizer, RecognizerConfig, ReplayLandmarkSource,
};

fn waving_frame(i: usize) -> FrameLandmarks {
    let x = if i % 2 == 0 { 0.3 } else { 0.6 };
    let mut hand_set = LandmarkSet::default();
    hand_set.set(hand::WRIST, Landmark::new(x, 0.5));
    hand_set.set(hand::THUMB_TIP, Landmark::new(x, 0.3));
    for tip in hand::FINGER_TIPS {
        hand_set.set(tip, Landmark::new(x, 0.3));
    }

    let mut pose_set = LandmarkSet::default();
    pose_set.set(pose::NOSE, Landmark::new(0.5, 0.2));
    pose_set.set(pose::LEFT_SHOULDER, Landmark::new(0.35, 0.45));
    pose_set.set(pose::RIGHT_SHOULDER, Landmark::new(0.65, 0.45));
    pose_set.set(pose::LEFT_HIP, Landmark::new(0.4, 0.9));
    pose_set.set(pose::RIGHT_HIP, Landmark::new(0.6, 0.9));

    FrameLandmarks {
        face: None,
        hands: vec![HandLandmarks {
            side: Handedness::Right,
            landmarks: hand_set,
        }],
        pose: Some(pose_set),
    }
}

fn recording(frames: usize) -> String {
    (0..frames)
        .map(|i| serde_json::to_string(&waving_frame(i)).unwrap())
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_offline_wave_detection() {
    let analysis = analyze_recording(&recording(12), FrameSize::default()).unwrap();

    // the wrist window fills on the tenth frame
    let waves: Vec<bool> = analysis.snapshots.iter().map(|s| s.wave).collect();
    assert!(waves[..9].iter().all(|w| !w));
    assert!(waves[9..].iter().all(|w| *w));

    assert!(analysis.snapshots.iter().all(|s| s.posture == Posture::Confident));
    assert!(analysis.snapshots.iter().all(|s| !s.thumbs_up && !s.smile));
    assert_eq!(analysis.stats.gestures_detected.wave, 3);
    assert_eq!(analysis.stats.gestures_detected.confident_posture, 12);
}

#[test]
fn test_live_replay_matches_offline() {
    let frames = 12;
    let offline = analyze_recording(&recording(frames), FrameSize::new(64, 48)).unwrap();

    let config = RecognizerConfig {
        cycle_pause_ms: 1,
        ..Default::default()
    };
    let source = ReplayLandmarkSource::from_ndjson(&recording(frames)).unwrap();
    let recognizer = GestureRecognizer::new(
        config,
        Arc::new(BlankSourceFactory {
            width: 64,
            height: 48,
        }),
        Arc::new(source),
    );
    recognizer.start(0).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while recognizer.session_stats().total_frames < frames as u64 {
        assert!(Instant::now() < deadline, "replay did not finish");
        thread::sleep(Duration::from_millis(2));
    }
    recognizer.stop();

    // frames past the end of the recording are empty and add nothing but frame counts
    let live = recognizer.session_stats();
    assert_eq!(live.gestures_detected.wave, offline.stats.gestures_detected.wave);
    assert_eq!(
        live.gestures_detected.confident_posture,
        offline.stats.gestures_detected.confident_posture
    );
}
