use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context as _;
use fontdue::layout::{CoordinateSystem, GlyphRasterConfig, HorizontalAlign, Layout, LayoutSettings, TextStyle};
use fontdue::{Font, FontSettings};

use crate::config::SubtitleStyle;
use crate::error::{SlidecastError, SlidecastResult};
use crate::kenburns::FrameRgba;
use crate::subtitle::cue::SubtitleCue;

/// Vertical offset of the caption block above the bottom margin, in pixels.
const CAPTION_BLOCK_OFFSET: f32 = 80.0;

/// Common system locations probed when no explicit font path is configured.
const FALLBACK_FONTS: [&str; 6] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// First fallback font present on this system, if any.
pub fn default_font_path() -> Option<PathBuf> {
    FALLBACK_FONTS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

struct GlyphBitmap {
    width: usize,
    height: usize,
    coverage: Vec<u8>,
}

#[derive(Clone, Copy)]
struct PlacedGlyph {
    x: i32,
    y: i32,
    key: GlyphRasterConfig,
}

/// A cue laid out against a fixed frame size, ready to blit onto any frame
/// of its display window.
pub struct PreparedCue {
    glyphs: Vec<PlacedGlyph>,
}

/// Rasterizes caption cues onto output frames.
///
/// Glyph bitmaps are cached across cues; the outline is drawn by stamping
/// the coverage mask at the eight neighbor offsets in the stroke color
/// before the fill pass.
pub struct OverlayRenderer {
    font: Font,
    style: SubtitleStyle,
    line_height: f32,
    glyph_cache: HashMap<GlyphRasterConfig, GlyphBitmap>,
}

impl OverlayRenderer {
    /// Load the configured subtitle font, or probe the platform fallbacks.
    ///
    /// An unresolvable font is reported as an error so the caller can keep
    /// rendering without burned-in captions.
    pub fn new(style: &SubtitleStyle) -> SlidecastResult<Self> {
        let path = style
            .font_path
            .clone()
            .or_else(default_font_path)
            .ok_or_else(|| {
                SlidecastError::validation(
                    "no subtitle font found; set subtitle.font_path in the config",
                )
            })?;
        let bytes = std::fs::read(&path)
            .with_context(|| format!("read subtitle font '{}'", path.display()))?;
        let font = Font::from_bytes(bytes, FontSettings::default()).map_err(|e| {
            SlidecastError::validation(format!(
                "failed to parse subtitle font '{}': {e}",
                path.display()
            ))
        })?;
        let line_height = font
            .horizontal_line_metrics(style.font_size)
            .map(|m| m.new_line_size)
            .unwrap_or(style.font_size * 1.2);
        Ok(Self {
            font,
            style: style.clone(),
            line_height,
            glyph_cache: HashMap::new(),
        })
    }

    /// Lay out a cue's lines centered above the bottom margin of a
    /// `frame_w x frame_h` frame.
    ///
    /// Fails when a non-empty cue yields no drawable glyphs; the caller
    /// skips just that cue.
    pub fn prepare(&mut self, cue: &SubtitleCue, frame_w: u32, frame_h: u32) -> SlidecastResult<PreparedCue> {
        let block_top = frame_h as f32 - self.style.margin_bottom as f32 - CAPTION_BLOCK_OFFSET;

        let mut glyphs = Vec::new();
        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        for (i, line) in cue.lines.iter().enumerate() {
            layout.reset(&LayoutSettings {
                x: 0.0,
                y: block_top + i as f32 * self.line_height,
                max_width: Some(frame_w as f32),
                horizontal_align: HorizontalAlign::Center,
                ..LayoutSettings::default()
            });
            layout.append(
                &[&self.font],
                &TextStyle::new(line, self.style.font_size, 0),
            );
            for glyph in layout.glyphs() {
                if glyph.width == 0 || glyph.height == 0 {
                    continue;
                }
                self.glyph_cache.entry(glyph.key).or_insert_with(|| {
                    let (metrics, coverage) = self.font.rasterize_config(glyph.key);
                    GlyphBitmap {
                        width: metrics.width,
                        height: metrics.height,
                        coverage,
                    }
                });
                glyphs.push(PlacedGlyph {
                    x: glyph.x.round() as i32,
                    y: glyph.y.round() as i32,
                    key: glyph.key,
                });
            }
        }

        let has_text = cue.lines.iter().any(|l| !l.trim().is_empty());
        if has_text && glyphs.is_empty() {
            return Err(SlidecastError::validation(format!(
                "cue for scene {} produced no drawable glyphs",
                cue.scene_id
            )));
        }
        Ok(PreparedCue { glyphs })
    }

    /// Blend a prepared cue onto one frame: outline pass, then fill pass.
    pub fn blit(&self, frame: &mut FrameRgba, prepared: &PreparedCue) {
        let stroke = self.style.stroke_width as i32;
        if stroke > 0 {
            for dy in -stroke..=stroke {
                for dx in -stroke..=stroke {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    for glyph in &prepared.glyphs {
                        self.blend_glyph(frame, glyph, dx, dy, self.style.stroke_color);
                    }
                }
            }
        }
        for glyph in &prepared.glyphs {
            self.blend_glyph(frame, glyph, 0, 0, self.style.font_color);
        }
    }

    fn blend_glyph(&self, frame: &mut FrameRgba, glyph: &PlacedGlyph, dx: i32, dy: i32, color: [u8; 4]) {
        let Some(bitmap) = self.glyph_cache.get(&glyph.key) else {
            return;
        };
        blend_coverage(
            frame,
            glyph.x + dx,
            glyph.y + dy,
            bitmap.width,
            bitmap.height,
            &bitmap.coverage,
            color,
        );
    }
}

/// Alpha-blend an 8-bit coverage mask in `color` onto an opaque RGBA frame,
/// clipping at the frame edges.
fn blend_coverage(
    frame: &mut FrameRgba,
    origin_x: i32,
    origin_y: i32,
    mask_w: usize,
    mask_h: usize,
    coverage: &[u8],
    color: [u8; 4],
) {
    let frame_w = frame.width as i32;
    let frame_h = frame.height as i32;

    for row in 0..mask_h {
        let y = origin_y + row as i32;
        if y < 0 || y >= frame_h {
            continue;
        }
        for col in 0..mask_w {
            let x = origin_x + col as i32;
            if x < 0 || x >= frame_w {
                continue;
            }
            let cov = u32::from(coverage[row * mask_w + col]);
            if cov == 0 {
                continue;
            }
            let alpha = cov * u32::from(color[3]) / 255;
            let inv = 255 - alpha;
            let idx = (y as usize * frame.width as usize + x as usize) * 4;
            for c in 0..3 {
                let src = u32::from(color[c]);
                let dst = u32::from(frame.data[idx + c]);
                frame.data[idx + c] = ((src * alpha + dst * inv) / 255) as u8;
            }
            frame.data[idx + 3] = 255;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitle::cue::SubtitleCue;

    #[test]
    fn blend_full_coverage_replaces_pixel() {
        let mut frame = FrameRgba::black(4, 4);
        blend_coverage(&mut frame, 1, 1, 1, 1, &[255], [255, 255, 255, 255]);
        let idx = (1 * 4 + 1) * 4;
        assert_eq!(&frame.data[idx..idx + 4], &[255, 255, 255, 255]);
    }

    #[test]
    fn blend_half_coverage_mixes_toward_color() {
        let mut frame = FrameRgba::black(2, 2);
        blend_coverage(&mut frame, 0, 0, 1, 1, &[128], [255, 255, 255, 255]);
        let v = frame.data[0];
        assert!(v > 100 && v < 150);
    }

    #[test]
    fn blend_clips_at_frame_edges() {
        let mut frame = FrameRgba::black(2, 2);
        blend_coverage(&mut frame, -1, -1, 3, 3, &[255; 9], [255, 0, 0, 255]);
        assert_eq!(frame.data.len(), 2 * 2 * 4);
        assert_eq!(frame.data[0], 255);
    }

    #[test]
    fn missing_explicit_font_is_an_error() {
        let style = SubtitleStyle {
            font_path: Some(PathBuf::from("does/not/exist.ttf")),
            ..SubtitleStyle::default()
        };
        assert!(OverlayRenderer::new(&style).is_err());
    }

    #[test]
    fn prepared_cue_marks_pixels_when_a_system_font_exists() {
        // Only runs where a fallback font is installed, like the ffmpeg-gated
        // media tests.
        if default_font_path().is_none() {
            return;
        }
        let mut renderer = OverlayRenderer::new(&SubtitleStyle::default()).unwrap();
        let cue = SubtitleCue {
            scene_id: 1,
            start: 0.0,
            end: 1.0,
            lines: vec!["Hello".to_string()],
        };
        let prepared = renderer.prepare(&cue, 640, 360).unwrap();
        let mut frame = FrameRgba::black(640, 360);
        renderer.blit(&mut frame, &prepared);
        assert!(frame.data.chunks_exact(4).any(|px| px[0] > 0));
    }
}
