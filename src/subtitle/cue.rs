use crate::script::ScriptDocument;
use crate::timing::SceneTiming;

/// Wrap width for burned-in overlay captions, in characters.
pub const OVERLAY_WRAP_CHARS: usize = 50;

/// Lead-in from the scene's nominal start to the cue start.
pub const CUE_START_INSET_SECS: f64 = 0.1;

/// Trim taken off the scene duration for the displayed window. Together with
/// the start inset this keeps consecutive captions from touching across a
/// hard scene cut.
pub const CUE_END_TRIM_SECS: f64 = 0.2;

/// Fallback display window for a scene absent from the timing map.
const FALLBACK_SCENE_SECS: f64 = 5.0;

/// One time-boxed caption: pre-wrapped lines with an absolute display window.
///
/// Immutable once created. Cue windows sit strictly inside their scene's
/// timing window; the full ordered sequence is the caption track.
#[derive(Clone, Debug, PartialEq)]
pub struct SubtitleCue {
    pub scene_id: u32,
    pub start: f64,
    pub end: f64,
    pub lines: Vec<String>,
}

/// Greedy word wrap at `max_chars` columns. Words are never split; a word
/// longer than the limit gets a line of its own.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current_len + word_len + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_len += word_len + 1;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Build the ordered caption track for the burned-in overlay.
///
/// Each cue starts [`CUE_START_INSET_SECS`] after its scene and is displayed
/// for the scene duration minus [`CUE_END_TRIM_SECS`]. Scenes too short to
/// hold a positive window produce no cue but still advance the cursor.
pub fn build_cues(script: &ScriptDocument, timing: &SceneTiming) -> Vec<SubtitleCue> {
    let mut cues = Vec::with_capacity(script.scenes.len());
    let mut cursor = 0.0f64;

    for scene in &script.scenes {
        let duration = timing.get(scene.scene_id).unwrap_or(FALLBACK_SCENE_SECS);
        let displayed = duration - CUE_END_TRIM_SECS;
        if displayed > 0.0 && !scene.narration.trim().is_empty() {
            cues.push(SubtitleCue {
                scene_id: scene.scene_id,
                start: cursor + CUE_START_INSET_SECS,
                end: cursor + CUE_START_INSET_SECS + displayed,
                lines: wrap_text(&scene.narration, OVERLAY_WRAP_CHARS),
            });
        }
        cursor += duration;
    }
    cues
}
