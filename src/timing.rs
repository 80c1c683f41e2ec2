use std::collections::BTreeMap;

use crate::script::ScriptDocument;

/// Narration speaking rate assumed when no recording exists.
pub const WORDS_PER_SEC: f64 = 3.0;

/// Floor applied to estimated scene durations. Prevents degenerate
/// zero-length scenes for one-word narrations. Not re-applied after a budget
/// rescale.
pub const MIN_SCENE_SECS: f64 = 3.0;

/// Estimate a scene's duration from its narration text.
pub fn estimate_secs(narration: &str) -> f64 {
    let words = narration.split_whitespace().count();
    (words as f64 / WORDS_PER_SEC).max(MIN_SCENE_SECS)
}

/// Per-scene durations for one run, keyed by `scene_id`.
///
/// Produced once by the duration planner and never mutated afterwards; a
/// budget rescale returns a new map.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneTiming {
    by_scene: BTreeMap<u32, f64>,
}

impl SceneTiming {
    /// Plan durations for a script.
    ///
    /// A measured audio length is authoritative for its scene; every other
    /// scene falls back to the word-count estimate. An empty script yields an
    /// empty map, which the caller is responsible for detecting.
    pub fn plan(script: &ScriptDocument, measured: &BTreeMap<u32, f64>) -> Self {
        let by_scene = script
            .scenes
            .iter()
            .map(|scene| {
                let secs = measured
                    .get(&scene.scene_id)
                    .copied()
                    .unwrap_or_else(|| estimate_secs(&scene.narration));
                (scene.scene_id, secs)
            })
            .collect();
        Self { by_scene }
    }

    pub fn get(&self, scene_id: u32) -> Option<f64> {
        self.by_scene.get(&scene_id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.by_scene.is_empty()
    }

    /// Sum of all scene durations in seconds.
    pub fn total_secs(&self) -> f64 {
        self.by_scene.values().sum()
    }

    /// Uniformly rescale so the total respects `max_secs`.
    ///
    /// Returns the fitted timing and the applied scale factor, or `None` when
    /// the plan already fits. The shrink is linear and preserves relative
    /// pacing; scaled scenes may fall below [`MIN_SCENE_SECS`].
    pub fn fit_to_budget(&self, max_secs: f64) -> (Self, Option<f64>) {
        let total = self.total_secs();
        if total <= max_secs {
            return (self.clone(), None);
        }
        let factor = max_secs / total;
        let by_scene = self
            .by_scene
            .iter()
            .map(|(&id, &secs)| (id, secs * factor))
            .collect();
        (Self { by_scene }, Some(factor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{Effect, Scene};

    fn script_with(narrations: &[(u32, &str)]) -> ScriptDocument {
        ScriptDocument {
            title: "t".to_string(),
            scenes: narrations
                .iter()
                .map(|&(scene_id, narration)| Scene {
                    scene_id,
                    narration: narration.to_string(),
                    effect: Effect::SlowZoomIn,
                    mood: None,
                })
                .collect(),
        }
    }

    #[test]
    fn seven_words_hits_the_three_second_floor() {
        // 7 words / 3 wps = 2.33s, floored to 3.0.
        assert_eq!(estimate_secs("Peter swings through the city at dawn."), 3.0);
    }

    #[test]
    fn long_narration_uses_word_rate() {
        let narration = vec!["word"; 30].join(" ");
        assert_eq!(estimate_secs(&narration), 10.0);
    }

    #[test]
    fn measured_duration_wins_over_estimate() {
        let script = script_with(&[(1, "a b c d e f g h i j k l"), (2, "short")]);
        let mut measured = BTreeMap::new();
        measured.insert(1, 7.5);
        let timing = SceneTiming::plan(&script, &measured);
        assert_eq!(timing.get(1), Some(7.5));
        assert_eq!(timing.get(2), Some(3.0));
    }

    #[test]
    fn within_budget_is_returned_unscaled() {
        let script = script_with(&[(1, "a"), (2, "b")]);
        let timing = SceneTiming::plan(&script, &BTreeMap::new());
        let (fitted, factor) = timing.fit_to_budget(120.0);
        assert_eq!(factor, None);
        assert_eq!(fitted, timing);
    }

    #[test]
    fn over_budget_scales_uniformly() {
        let script = script_with(&[(1, "a"), (2, "b")]);
        let mut measured = BTreeMap::new();
        measured.insert(1, 80.0);
        measured.insert(2, 80.0);
        let timing = SceneTiming::plan(&script, &measured);

        let (fitted, factor) = timing.fit_to_budget(120.0);
        assert_eq!(factor, Some(0.75));
        assert_eq!(fitted.get(1), Some(60.0));
        assert_eq!(fitted.get(2), Some(60.0));
        assert!(fitted.total_secs() <= 120.0 + 1e-9);
    }

    #[test]
    fn rescale_preserves_relative_proportions() {
        let script = script_with(&[(1, "a"), (2, "b"), (3, "c")]);
        let mut measured = BTreeMap::new();
        measured.insert(1, 50.0);
        measured.insert(2, 100.0);
        measured.insert(3, 25.0);
        let timing = SceneTiming::plan(&script, &measured);

        let (fitted, factor) = timing.fit_to_budget(100.0);
        assert!(factor.is_some());
        let ratio_before = timing.get(2).unwrap() / timing.get(1).unwrap();
        let ratio_after = fitted.get(2).unwrap() / fitted.get(1).unwrap();
        assert!((ratio_before - ratio_after).abs() < 1e-12);
    }

    #[test]
    fn rescale_may_drop_scenes_below_the_floor() {
        let script = script_with(&[(1, "a"), (2, "b")]);
        let mut measured = BTreeMap::new();
        measured.insert(1, 3.0);
        measured.insert(2, 597.0);
        let timing = SceneTiming::plan(&script, &measured);

        let (fitted, _) = timing.fit_to_budget(120.0);
        assert!(fitted.get(1).unwrap() < MIN_SCENE_SECS);
    }

    #[test]
    fn empty_script_yields_empty_timing() {
        let script = script_with(&[]);
        let timing = SceneTiming::plan(&script, &BTreeMap::new());
        assert!(timing.is_empty());
        assert_eq!(timing.total_secs(), 0.0);
    }
}
