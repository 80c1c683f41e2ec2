use std::collections::BTreeMap;

use crate::script::ScriptDocument;
use crate::subtitle::cue::wrap_text;
use crate::timing;

/// Wrap width for the sidecar subtitle file, in characters.
pub const SRT_WRAP_CHARS: usize = 45;

/// Gap subtracted from each entry's end so consecutive entries never abut.
pub const SRT_GAP_SECS: f64 = 0.1;

/// Format seconds as an SRT timestamp: `HH:MM:SS,mmm`.
pub fn format_timestamp(secs: f64) -> String {
    let secs = secs.max(0.0);
    let hours = (secs / 3600.0) as u64;
    let minutes = ((secs % 3600.0) / 60.0) as u64;
    let whole = (secs % 60.0) as u64;
    let millis = ((secs % 1.0) * 1000.0) as u64;
    format!("{hours:02}:{minutes:02}:{whole:02},{millis:03}")
}

/// Render the sidecar subtitle file for a script.
///
/// Measured per-scene audio durations are authoritative where available;
/// scenes without a recording fall back to the word-count estimate. The
/// sidecar is deliberately independent of budget fitting: it follows the
/// narration, not the rescaled program.
pub fn sidecar_srt(script: &ScriptDocument, measured: &BTreeMap<u32, f64>) -> String {
    let mut entries = Vec::with_capacity(script.scenes.len());
    let mut cursor = 0.0f64;

    for scene in &script.scenes {
        let duration = measured
            .get(&scene.scene_id)
            .copied()
            .unwrap_or_else(|| timing::estimate_secs(&scene.narration));

        let start = format_timestamp(cursor);
        let end = format_timestamp((cursor + duration - SRT_GAP_SECS).max(cursor));
        let wrapped = wrap_text(&scene.narration, SRT_WRAP_CHARS).join("\n");
        entries.push(format!("{}\n{start} --> {end}\n{wrapped}\n", scene.scene_id));

        cursor += duration;
    }
    entries.join("\n")
}
