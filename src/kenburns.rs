use std::path::Path;

use anyhow::Context as _;
use image::{RgbaImage, imageops};

use crate::error::SlidecastResult;
use crate::script::Effect;

/// Headroom factor applied when preparing the source still. The image is
/// upscaled past the output resolution so the crop window can pan and zoom
/// without ever sampling outside the source.
pub const OVERSAMPLE: f64 = 1.3;

/// Pan travel as a fraction of the oversampled dimension.
pub const PAN_SPAN: f64 = 0.08;

/// Fixed zoom held by [`Effect::Static`] so the frame is not visually flat.
pub const STATIC_ZOOM: f64 = 1.05;

/// An opaque RGBA8 output frame, tightly packed, row-major.
#[derive(Clone, Debug)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameRgba {
    /// Solid black frame of the given size.
    pub fn black(width: u32, height: u32) -> Self {
        let mut data = vec![0u8; width as usize * height as usize * 4];
        for px in data.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Self {
            width,
            height,
            data,
        }
    }
}

/// Cubic ease-in-out: `4t^3` below the midpoint, `1 - (-2t+2)^3 / 2` above.
///
/// Monotonic on `[0,1]` with `ease(0)=0`, `ease(1)=1`, symmetric around 0.5.
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Virtual-camera state for one frame: zoom factor plus the crop-window
/// center in oversampled-image coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub zoom: f64,
    pub center_x: f64,
    pub center_y: f64,
}

/// Compute the camera pose for an effect at eased progress `p in [0,1]`.
///
/// Zoom effects travel linearly across the configured range about the image
/// center. Pan effects hold zoom at the range midpoint and start offset by
/// [`PAN_SPAN`] of the oversampled dimension, easing toward center.
pub fn camera_pose(
    effect: Effect,
    p: f64,
    zoom_range: (f64, f64),
    over_w: f64,
    over_h: f64,
) -> CameraPose {
    let (z0, z1) = zoom_range;
    let mid = (z0 + z1) / 2.0;
    let (cx, cy) = (over_w / 2.0, over_h / 2.0);
    match effect {
        Effect::SlowZoomIn => CameraPose {
            zoom: z0 + (z1 - z0) * p,
            center_x: cx,
            center_y: cy,
        },
        Effect::SlowZoomOut => CameraPose {
            zoom: z1 - (z1 - z0) * p,
            center_x: cx,
            center_y: cy,
        },
        Effect::PanLeft => CameraPose {
            zoom: mid,
            center_x: cx + over_w * PAN_SPAN * (1.0 - p),
            center_y: cy,
        },
        Effect::PanRight => CameraPose {
            zoom: mid,
            center_x: cx - over_w * PAN_SPAN * (1.0 - p),
            center_y: cy,
        },
        Effect::PanUp => CameraPose {
            zoom: mid,
            center_x: cx,
            center_y: cy + over_h * PAN_SPAN * (1.0 - p),
        },
        Effect::PanDown => CameraPose {
            zoom: mid,
            center_x: cx,
            center_y: cy - over_h * PAN_SPAN * (1.0 - p),
        },
        Effect::Static => CameraPose {
            zoom: STATIC_ZOOM,
            center_x: cx,
            center_y: cy,
        },
    }
}

enum ClipSource {
    Still {
        oversampled: RgbaImage,
        effect: Effect,
        zoom_range: (f64, f64),
    },
    Black,
}

/// A fixed-duration, fixed-resolution moving-camera rendition of one still.
///
/// Frames are produced lazily in index order and never buffered as a whole
/// clip; the track builder streams them straight into the encoder.
pub struct SceneClip {
    source: ClipSource,
    frames: u64,
    out_w: u32,
    out_h: u32,
}

impl SceneClip {
    /// Decode a still and prepare it for camera motion: center-crop to the
    /// output aspect ratio, then upscale by [`OVERSAMPLE`].
    pub fn still(
        image_path: &Path,
        effect: Effect,
        zoom_range: (f64, f64),
        frames: u64,
        out_w: u32,
        out_h: u32,
    ) -> SlidecastResult<Self> {
        let decoded = image::open(image_path)
            .with_context(|| format!("decode image '{}'", image_path.display()))?
            .to_rgba8();
        let cropped = center_crop_to_aspect(decoded, out_w, out_h);
        let over_w = (f64::from(out_w) * OVERSAMPLE) as u32;
        let over_h = (f64::from(out_h) * OVERSAMPLE) as u32;
        let oversampled = imageops::resize(
            &cropped,
            over_w.max(1),
            over_h.max(1),
            imageops::FilterType::Lanczos3,
        );
        Ok(Self {
            source: ClipSource::Still {
                oversampled,
                effect,
                zoom_range,
            },
            frames,
            out_w,
            out_h,
        })
    }

    /// Substitute clip for a missing or undecodable image: solid black for
    /// the full duration. Keeps the pipeline alive on missing assets.
    pub fn black(frames: u64, out_w: u32, out_h: u32) -> Self {
        Self {
            source: ClipSource::Black,
            frames,
            out_w,
            out_h,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Render frame `index in [0, frame_count)`.
    ///
    /// Every produced frame has exactly the output dimensions.
    pub fn render_frame(&self, index: u64) -> FrameRgba {
        let ClipSource::Still {
            oversampled,
            effect,
            zoom_range,
        } = &self.source
        else {
            return FrameRgba::black(self.out_w, self.out_h);
        };

        let progress = if self.frames == 0 {
            0.0
        } else {
            index as f64 / self.frames as f64
        };
        let eased = ease_in_out_cubic(progress);

        let (over_w, over_h) = oversampled.dimensions();
        let pose = camera_pose(
            *effect,
            eased,
            *zoom_range,
            f64::from(over_w),
            f64::from(over_h),
        );

        // Crop window from the current zoom, clamped inside the oversampled
        // bounds so motion never samples past the source.
        let crop_w = ((f64::from(self.out_w) / pose.zoom) as u32).clamp(1, over_w);
        let crop_h = ((f64::from(self.out_h) / pose.zoom) as u32).clamp(1, over_h);
        let max_x = f64::from(over_w - crop_w);
        let max_y = f64::from(over_h - crop_h);
        let x = (pose.center_x - f64::from(crop_w) / 2.0).clamp(0.0, max_x) as u32;
        let y = (pose.center_y - f64::from(crop_h) / 2.0).clamp(0.0, max_y) as u32;

        let view = imageops::crop_imm(oversampled, x, y, crop_w, crop_h).to_image();
        let frame = imageops::resize(
            &view,
            self.out_w,
            self.out_h,
            imageops::FilterType::Lanczos3,
        );
        FrameRgba {
            width: self.out_w,
            height: self.out_h,
            data: frame.into_raw(),
        }
    }
}

fn center_crop_to_aspect(img: RgbaImage, target_w: u32, target_h: u32) -> RgbaImage {
    let (img_w, img_h) = img.dimensions();
    if img_w == 0 || img_h == 0 || target_w == 0 || target_h == 0 {
        return img;
    }
    let target_ratio = f64::from(target_w) / f64::from(target_h);
    let img_ratio = f64::from(img_w) / f64::from(img_h);

    if img_ratio > target_ratio {
        let new_w = ((f64::from(img_h) * target_ratio) as u32).clamp(1, img_w);
        let left = (img_w - new_w) / 2;
        imageops::crop_imm(&img, left, 0, new_w, img_h).to_image()
    } else if img_ratio < target_ratio {
        let new_h = ((f64::from(img_w) / target_ratio) as u32).clamp(1, img_h);
        let top = (img_h - new_h) / 2;
        imageops::crop_imm(&img, 0, top, img_w, new_h).to_image()
    } else {
        img
    }
}
