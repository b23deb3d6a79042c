//! Generate a synthetic landmark recording and print its gesture analysis

use synheart_gesture::landmarks::{face, hand};
use synheart_gesture::types::{
    FrameLandmarks, FrameSize, HandLandmarks, Handedness, Landmark, LandmarkSet,
};

fn frame(i: usize) -> FrameLandmarks {
    // wrist sweeps left and right under a wide smile
    let wrist_x = if i % 2 == 0 { 0.35 } else { 0.55 };

    let mut face_set = LandmarkSet::default();
    face_set.set(face::NOSE_TIP, Landmark::new(0.5, 0.5));
    face_set.set(face::LEFT_EYE_OUTER, Landmark::new(0.4, 0.4));
    face_set.set(face::RIGHT_EYE_OUTER, Landmark::new(0.6, 0.4));
    face_set.set(face::MOUTH_LEFT, Landmark::new(0.4, 0.6));
    face_set.set(face::MOUTH_RIGHT, Landmark::new(0.6, 0.6));
    face_set.set(face::UPPER_LIP, Landmark::new(0.5, 0.6));
    face_set.set(face::LOWER_LIP, Landmark::new(0.5, 0.62));

    let mut hand_set = LandmarkSet::default();
    hand_set.set(hand::WRIST, Landmark::new(wrist_x, 0.5));
    hand_set.set(hand::THUMB_TIP, Landmark::new(wrist_x, 0.3));
    for tip in hand::FINGER_TIPS {
        hand_set.set(tip, Landmark::new(wrist_x, 0.6));
    }

    FrameLandmarks {
        face: Some(face_set),
        hands: vec![HandLandmarks {
            side: Handedness::Right,
            landmarks: hand_set,
        }],
        pose: None,
    }
}

fn main() {
    let lines: Result<Vec<String>, _> = (0..30).map(|i| serde_json::to_string(&frame(i))).collect();
    let recording = match lines {
        Ok(lines) => lines.join("\n"),
        Err(e) => {
            eprintln!("Error: {e:?}");
            return;
        }
    };

    match synheart_gesture::analyze_recording(&recording, FrameSize::default()) {
        Ok(analysis) => match serde_json::to_string_pretty(&analysis.stats) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error: {e:?}"),
        },
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
