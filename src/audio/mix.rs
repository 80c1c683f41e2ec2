//! Pure-sample operations on interleaved stereo f32 buffers: looping,
//! trimming, gain, fade envelopes, and the final additive mix.

use std::path::Path;

use anyhow::Context as _;

use crate::error::SlidecastResult;

/// Convert a frame count at `fps` to the nearest sample frame count at
/// `sample_rate`.
pub fn frames_to_samples(frames: u64, fps: u32, sample_rate: u32) -> u64 {
    if fps == 0 {
        return 0;
    }
    let num = u128::from(frames) * u128::from(sample_rate);
    let den = u128::from(fps);
    ((num + den / 2) / den) as u64
}

/// Truncate an interleaved buffer to at most `max_frames` sample frames.
/// Shorter buffers are left untouched, never padded.
pub fn truncate_to_frames(samples: &mut Vec<f32>, max_frames: u64, channels: u16) {
    let max_len = (max_frames as usize).saturating_mul(usize::from(channels));
    if samples.len() > max_len {
        samples.truncate(max_len);
    }
}

/// Repeat a whole track until it covers `target_frames`, then cut to exactly
/// that length. No crossfading between repetitions. An empty source yields an
/// empty buffer.
pub fn loop_to_frames(src: &[f32], target_frames: u64, channels: u16) -> Vec<f32> {
    if src.is_empty() {
        return Vec::new();
    }
    let target_len = (target_frames as usize).saturating_mul(usize::from(channels));
    let mut out = Vec::with_capacity(target_len);
    while out.len() < target_len {
        out.extend_from_slice(src);
    }
    out.truncate(target_len);
    out
}

/// Apply a flat linear gain.
pub fn apply_gain(samples: &mut [f32], gain: f32) {
    for s in samples.iter_mut() {
        *s *= gain;
    }
}

/// Linear fade from silence over the first `fade_secs` of the buffer.
pub fn apply_fade_in(samples: &mut [f32], fade_secs: f64, sample_rate: u32, channels: u16) {
    if fade_secs <= 0.0 {
        return;
    }
    let channels = usize::from(channels.max(1));
    for (frame, chunk) in samples.chunks_mut(channels).enumerate() {
        let t = frame as f64 / f64::from(sample_rate);
        if t >= fade_secs {
            break;
        }
        let g = (t / fade_secs) as f32;
        for s in chunk {
            *s *= g;
        }
    }
}

/// Linear fade to silence over the last `fade_secs` of the buffer.
pub fn apply_fade_out(samples: &mut [f32], fade_secs: f64, sample_rate: u32, channels: u16) {
    if fade_secs <= 0.0 {
        return;
    }
    let channels = usize::from(channels.max(1));
    let total_frames = samples.len() / channels;
    let total_secs = total_frames as f64 / f64::from(sample_rate);
    for (frame, chunk) in samples.chunks_mut(channels).enumerate() {
        let remaining = total_secs - frame as f64 / f64::from(sample_rate);
        if remaining >= fade_secs {
            continue;
        }
        let g = (remaining / fade_secs).clamp(0.0, 1.0) as f32;
        for s in chunk {
            *s *= g;
        }
    }
}

/// Additive composite of two tracks, clamped to `[-1, 1]`. The result is as
/// long as the longer input; no ducking is applied.
pub fn mix_additive(mut a: Vec<f32>, b: &[f32]) -> Vec<f32> {
    if a.len() < b.len() {
        a.resize(b.len(), 0.0);
    }
    for (dst, src) in a.iter_mut().zip(b.iter()) {
        *dst += src;
    }
    for s in a.iter_mut() {
        *s = s.clamp(-1.0, 1.0);
    }
    a
}

/// Shape the background-music bed: loop to the video length, cut, apply the
/// configured volume, then fade in/out at the edges.
pub fn build_bgm_track(
    src: &[f32],
    target_frames: u64,
    volume: f32,
    fade_in_secs: f64,
    fade_out_secs: f64,
    sample_rate: u32,
    channels: u16,
) -> Vec<f32> {
    let mut track = loop_to_frames(src, target_frames, channels);
    apply_gain(&mut track, volume);
    apply_fade_in(&mut track, fade_in_secs, sample_rate, channels);
    apply_fade_out(&mut track, fade_out_secs, sample_rate, channels);
    track
}

/// Write interleaved samples as raw little-endian f32 for the encoder's
/// audio side input.
pub fn write_f32le(samples: &[f32], path: &Path) -> SlidecastResult<()> {
    let mut bytes = Vec::with_capacity(samples.len() * 4);
    for s in samples {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    std::fs::write(path, bytes)
        .with_context(|| format!("write audio mix '{}'", path.display()))?;
    Ok(())
}
