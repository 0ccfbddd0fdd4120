//! End-to-end checks of scene lowering: built-in scenes produce timelines
//! whose evaluated frames match the beat script.

use plumage::{Evaluator, FrameIndex, mascot};

#[test]
fn debugging_duck_timeline_validates_and_serializes() {
    let timeline = mascot::debugging_duck().unwrap().lower().unwrap();
    timeline.validate().unwrap();

    let json = serde_json::to_string(&timeline).unwrap();
    let back: plumage::Timeline = serde_json::from_str(&json).unwrap();
    back.validate().unwrap();
    assert_eq!(back.duration, timeline.duration);
    assert_eq!(back.tracks[0].clips.len(), timeline.tracks[0].clips.len());
}

#[test]
fn duck_fades_in_over_the_first_beat() {
    let timeline = mascot::debugging_duck().unwrap().lower().unwrap();

    let g0 = Evaluator::eval_frame(&timeline, FrameIndex(0)).unwrap();
    let body0 = g0.nodes.iter().find(|n| n.clip_id == "body").unwrap();
    assert_eq!(body0.opacity, 0.0);

    // Midway through the 45-frame fade the duck is partially visible and
    // still below its resting position.
    let g_mid = Evaluator::eval_frame(&timeline, FrameIndex(22)).unwrap();
    let body_mid = g_mid.nodes.iter().find(|n| n.clip_id == "body").unwrap();
    assert!(body_mid.opacity > 0.0 && body_mid.opacity < 1.0);

    let g_end = Evaluator::eval_frame(&timeline, FrameIndex(45)).unwrap();
    let body_end = g_end.nodes.iter().find(|n| n.clip_id == "body").unwrap();
    assert_eq!(body_end.opacity, 1.0);

    let rest_y = body_end.transform.translation().y;
    let mid_y = body_mid.transform.translation().y;
    assert!(mid_y > rest_y, "sliding up means y decreases toward rest");
}

#[test]
fn bubble_only_appears_after_the_bob() {
    let timeline = mascot::debugging_duck().unwrap().lower().unwrap();

    // Bubble beat starts at frame 60 (1.5s fade + 0.5s bob).
    let before = Evaluator::eval_frame(&timeline, FrameIndex(59)).unwrap();
    assert!(!before.nodes.iter().any(|n| n.clip_id == "bubble"));

    let after = Evaluator::eval_frame(&timeline, FrameIndex(60)).unwrap();
    assert!(after.nodes.iter().any(|n| n.clip_id == "bubble"));
}

#[test]
fn advice_reveal_sweeps_left_to_right() {
    let timeline = mascot::debugging_duck().unwrap().lower().unwrap();

    // Write beat spans frames 84..129.
    let g = Evaluator::eval_frame(&timeline, FrameIndex(84)).unwrap();
    let advice = g.nodes.iter().find(|n| n.clip_id == "advice").unwrap();
    let r = advice.reveal.unwrap();
    assert_eq!(r.progress, 0.0);

    let g = Evaluator::eval_frame(&timeline, FrameIndex(128)).unwrap();
    let advice = g.nodes.iter().find(|n| n.clip_id == "advice").unwrap();
    assert_eq!(advice.reveal.unwrap().progress, 1.0);

    let g = Evaluator::eval_frame(&timeline, FrameIndex(140)).unwrap();
    let advice = g.nodes.iter().find(|n| n.clip_id == "advice").unwrap();
    assert!(advice.reveal.is_none());
}

#[test]
fn final_frame_matches_resting_state() {
    let timeline = mascot::debugging_duck().unwrap().lower().unwrap();
    let last = FrameIndex(timeline.duration.0 - 1);

    let g_rest = Evaluator::eval_frame(&timeline, FrameIndex(60)).unwrap();
    let g_last = Evaluator::eval_frame(&timeline, last).unwrap();
    for id in ["body", "head", "beak", "eye", "wing"] {
        let rest = g_rest.nodes.iter().find(|n| n.clip_id == id).unwrap();
        let end = g_last.nodes.iter().find(|n| n.clip_id == id).unwrap();
        assert_eq!(rest.transform, end.transform, "{id} must return to rest");
    }
}

#[test]
fn intro_duck_moves_linearly_to_center() {
    let timeline = mascot::duck_introduction().unwrap().lower().unwrap();

    // Shift beat spans frames 60..120, linear, body x from 370 to 640.
    let x_at = |frame: u64| {
        let g = Evaluator::eval_frame(&timeline, FrameIndex(frame)).unwrap();
        g.nodes
            .iter()
            .find(|n| n.clip_id == "body")
            .unwrap()
            .transform
            .translation()
            .x
    };
    let start = x_at(60);
    let quarter = x_at(75);
    let half = x_at(90);
    let end = x_at(120);
    assert!((end - start - 270.0).abs() < 1e-6);
    assert!((half - start - 135.0).abs() < 1e-6);
    assert!((quarter - start - 67.5).abs() < 1e-6);
}
