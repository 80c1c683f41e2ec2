use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::error::{SlidecastError, SlidecastResult};

/// Run configuration, fixed at process start.
///
/// Defaults mirror the shipping pipeline settings; an optional JSON file can
/// override individual fields. The configuration is never re-read mid-run.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Output width in pixels. Must be even (yuv420p output).
    pub width: u32,
    /// Output height in pixels. Must be even (yuv420p output).
    pub height: u32,
    /// Output frames-per-second for full-quality renders.
    pub fps: u32,
    /// Hard ceiling on total program length in seconds.
    pub max_duration_secs: f64,
    /// Ken Burns zoom span as `(start, end)` multipliers.
    pub zoom_range: (f64, f64),
    /// Background music gain, 0.0..=1.0.
    pub bgm_volume: f32,
    /// Background music fade-in window in seconds.
    pub fade_in_secs: f64,
    /// Background music fade-out window in seconds.
    pub fade_out_secs: f64,
    /// Burned-in subtitle styling.
    pub subtitle: SubtitleStyle,
    /// Scene transition length in seconds. Concatenation is a hard cut by
    /// default; the constant is kept for renders that opt into crossfades.
    pub crossfade_secs: f64,
    /// Candidate cap for the upstream image-search step. Not consumed by the
    /// assembly core.
    pub image_search_max_results: usize,
}

/// Styling for burned-in subtitle overlays.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubtitleStyle {
    /// Glyph size in pixels.
    pub font_size: f32,
    /// Fill color as RGBA8.
    pub font_color: [u8; 4],
    /// Outline color as RGBA8.
    pub stroke_color: [u8; 4],
    /// Outline thickness in pixels. 0 disables the outline.
    pub stroke_width: u32,
    /// Distance of the caption block from the bottom edge, in pixels.
    pub margin_bottom: u32,
    /// Explicit TTF/OTF path. When unset, a platform fallback list is probed.
    pub font_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30,
            max_duration_secs: 120.0,
            zoom_range: (1.0, 1.15),
            bgm_volume: 0.15,
            fade_in_secs: 1.0,
            fade_out_secs: 2.0,
            subtitle: SubtitleStyle::default(),
            crossfade_secs: 0.3,
            image_search_max_results: 12,
        }
    }
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_size: 42.0,
            font_color: [255, 255, 255, 255],
            stroke_color: [0, 0, 0, 255],
            stroke_width: 2,
            margin_bottom: 60,
            font_path: None,
        }
    }
}

impl Config {
    /// Load the default configuration, optionally overridden by a JSON file.
    pub fn load(override_path: Option<&Path>) -> SlidecastResult<Self> {
        let cfg = match override_path {
            None => Self::default(),
            Some(path) => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("read config '{}'", path.display()))?;
                serde_json::from_slice(&bytes)
                    .with_context(|| format!("parse config '{}'", path.display()))?
            }
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> SlidecastResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SlidecastError::validation(
                "output width/height must be non-zero",
            ));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(SlidecastError::validation(
                "output width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if self.fps == 0 {
            return Err(SlidecastError::validation("fps must be non-zero"));
        }
        if self.max_duration_secs <= 0.0 {
            return Err(SlidecastError::validation("max_duration_secs must be > 0"));
        }
        let (z0, z1) = self.zoom_range;
        if z0 <= 0.0 || z1 < z0 {
            return Err(SlidecastError::validation(
                "zoom_range must satisfy 0 < start <= end",
            ));
        }
        if !(0.0..=1.0).contains(&self.bgm_volume) {
            return Err(SlidecastError::validation("bgm_volume must be in 0.0..=1.0"));
        }
        if self.fade_in_secs < 0.0 || self.fade_out_secs < 0.0 {
            return Err(SlidecastError::validation("fade durations must be >= 0"));
        }
        Ok(())
    }
}
