use crate::script::ScriptDocument;
use crate::timing::SceneTiming;

/// Half-open frame window `[start, end)` one scene occupies on the final
/// track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameWindow {
    pub scene_id: u32,
    pub start: u64,
    pub end: u64,
}

impl FrameWindow {
    pub fn len_frames(self) -> u64 {
        self.end.saturating_sub(self.start)
    }
}

/// Lay the scenes out as one continuous, gapless track at a fixed fps.
///
/// Windows are cut at rounded *cumulative* second boundaries rather than by
/// rounding each scene independently, so per-scene rounding error never
/// accumulates: the track total is always `round(total_secs * fps)` and
/// consecutive windows share a boundary (hard cut, no gaps, scene order
/// preserved).
pub fn frame_windows(script: &ScriptDocument, timing: &SceneTiming, fps: u32) -> Vec<FrameWindow> {
    let mut windows = Vec::with_capacity(script.scenes.len());
    let mut cursor_secs = 0.0f64;
    let mut cursor_frame = 0u64;

    for scene in &script.scenes {
        let secs = timing.get(scene.scene_id).unwrap_or(0.0);
        cursor_secs += secs;
        let end_frame = (cursor_secs * f64::from(fps)).round().max(0.0) as u64;
        let end_frame = end_frame.max(cursor_frame);
        windows.push(FrameWindow {
            scene_id: scene.scene_id,
            start: cursor_frame,
            end: end_frame,
        });
        cursor_frame = end_frame;
    }
    windows
}

/// Total frame count of the laid-out track.
pub fn total_frames(windows: &[FrameWindow]) -> u64 {
    windows.last().map(|w| w.end).unwrap_or(0)
}
