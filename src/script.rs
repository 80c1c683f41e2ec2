use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Context as _;

use crate::error::{SlidecastError, SlidecastResult};

/// Virtual-camera motion applied to a scene's still image.
///
/// Closed set: the assembly core dispatches on the variant and computes the
/// camera pose in [`crate::kenburns`]. Unknown effect names are rejected at
/// script load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    #[default]
    SlowZoomIn,
    SlowZoomOut,
    PanLeft,
    PanRight,
    PanUp,
    PanDown,
    Static,
}

/// One narrative beat: narration text plus a named visual effect.
///
/// The scene's image and audio files are located by convention from
/// `scene_id` (see [`crate::project`]), never stored inline.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    pub scene_id: u32,
    pub narration: String,
    #[serde(default)]
    pub effect: Effect,
    /// Advisory tone hint from the script producer. Parsed, not consumed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
}

impl Scene {
    /// Whitespace-delimited word count of the narration.
    pub fn word_count(&self) -> usize {
        self.narration.split_whitespace().count()
    }
}

/// The full script for one program, in narrative order.
///
/// Immutable after load; scene order is preserved by every downstream stage.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ScriptDocument {
    pub title: String,
    pub scenes: Vec<Scene>,
}

impl ScriptDocument {
    /// Load and validate `script.json`.
    ///
    /// A missing or malformed script is fatal for the run; no partial output
    /// is produced past this point.
    pub fn load(path: &Path) -> SlidecastResult<Self> {
        if !path.exists() {
            return Err(SlidecastError::script(format!(
                "script not found: {}",
                path.display()
            )));
        }
        let bytes = std::fs::read(path)
            .with_context(|| format!("read script '{}'", path.display()))?;
        let script: ScriptDocument = serde_json::from_slice(&bytes).map_err(|e| {
            SlidecastError::script(format!("malformed script '{}': {e}", path.display()))
        })?;
        script.validate()?;
        Ok(script)
    }

    pub fn validate(&self) -> SlidecastResult<()> {
        let mut seen = BTreeSet::new();
        for scene in &self.scenes {
            if !seen.insert(scene.scene_id) {
                return Err(SlidecastError::script(format!(
                    "duplicate scene_id {}",
                    scene.scene_id
                )));
            }
        }
        Ok(())
    }
}
