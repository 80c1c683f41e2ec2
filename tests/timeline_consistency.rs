//! Cross-module consistency: the script on disk, the planned timing, the
//! frame track, and the caption track must all agree on scene boundaries.

use std::collections::BTreeMap;

use slidecast::subtitle::build_cues;
use slidecast::timeline::{frame_windows, total_frames};
use slidecast::{ScriptDocument, SceneTiming};

fn load_fixture_script(dir: &std::path::Path) -> ScriptDocument {
    let script_json = r#"{
        "title": "Gwen Stacy",
        "scenes": [
            { "scene_id": 1, "narration": "Peter swings through the city at dawn.", "effect": "slow_zoom_in" },
            { "scene_id": 2, "narration": "A shadow waits on the bridge, patient and certain of what comes next, watching the water far below.", "effect": "pan_left", "mood": "tense" },
            { "scene_id": 3, "narration": "The fall.", "effect": "static" }
        ]
    }"#;
    let path = dir.join("script.json");
    std::fs::write(&path, script_json).unwrap();
    ScriptDocument::load(&path).unwrap()
}

#[test]
fn cue_windows_sit_inside_scene_frame_windows() {
    let dir = tempfile::tempdir().unwrap();
    let script = load_fixture_script(dir.path());

    let mut measured = BTreeMap::new();
    measured.insert(2, 8.5);
    let timing = SceneTiming::plan(&script, &measured);
    let (timing, factor) = timing.fit_to_budget(120.0);
    assert_eq!(factor, None);

    let fps = 30;
    let windows = frame_windows(&script, &timing, fps);
    let cues = build_cues(&script, &timing);
    assert_eq!(windows.len(), 3);
    assert_eq!(cues.len(), 3);

    for (window, cue) in windows.iter().zip(&cues) {
        assert_eq!(window.scene_id, cue.scene_id);
        let window_start_secs = window.start as f64 / f64::from(fps);
        let window_end_secs = window.end as f64 / f64::from(fps);
        assert!(cue.start > window_start_secs);
        assert!(cue.end < window_end_secs + 1e-9);
    }
}

#[test]
fn budget_fit_carries_through_to_the_frame_track() {
    let dir = tempfile::tempdir().unwrap();
    let script = load_fixture_script(dir.path());

    let mut measured = BTreeMap::new();
    measured.insert(1, 80.0);
    measured.insert(2, 80.0);
    measured.insert(3, 80.0);
    let planned = SceneTiming::plan(&script, &measured);
    let (fitted, factor) = planned.fit_to_budget(120.0);
    assert_eq!(factor, Some(0.5));

    let windows = frame_windows(&script, &fitted, 30);
    assert_eq!(total_frames(&windows), 3600);
    for window in &windows {
        assert_eq!(window.len_frames(), 1200);
    }
}

#[test]
fn script_order_survives_non_monotonic_scene_ids() {
    let dir = tempfile::tempdir().unwrap();
    let script_json = r#"{
        "title": "out of order",
        "scenes": [
            { "scene_id": 7, "narration": "first beat" },
            { "scene_id": 2, "narration": "second beat" }
        ]
    }"#;
    let path = dir.path().join("script.json");
    std::fs::write(&path, script_json).unwrap();
    let script = ScriptDocument::load(&path).unwrap();

    let timing = SceneTiming::plan(&script, &BTreeMap::new());
    let windows = frame_windows(&script, &timing, 30);
    assert_eq!(
        windows.iter().map(|w| w.scene_id).collect::<Vec<_>>(),
        vec![7, 2]
    );
    let cues = build_cues(&script, &timing);
    assert_eq!(cues[0].scene_id, 7);
    assert!(cues[0].start < cues[1].start);
}
