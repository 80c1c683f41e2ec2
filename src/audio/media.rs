//! Boundary to the system `ffmpeg`/`ffprobe` binaries for audio input.
//!
//! Deliberately a process boundary rather than an FFI binding: sources in any
//! common container are decoded to one canonical in-memory format
//! (interleaved stereo `f32` at [`MIX_SAMPLE_RATE`]) and everything past this
//! module works on plain sample buffers.

use std::path::Path;
use std::process::Command;

use crate::error::{SlidecastError, SlidecastResult};

/// Canonical mixing sample rate in Hz.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

/// Canonical mixing channel count.
pub const MIX_CHANNELS: u16 = 2;

/// Decoded interleaved floating-point PCM.
#[derive(Clone, Debug)]
pub struct AudioPcm {
    pub sample_rate: u32,
    pub channels: u16,
    /// Interleaved samples; `len / channels` frames.
    pub samples: Vec<f32>,
}

impl AudioPcm {
    pub fn frame_count(&self) -> u64 {
        (self.samples.len() / usize::from(self.channels.max(1))) as u64
    }

    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / f64::from(self.sample_rate.max(1))
    }
}

/// Measure a media file's duration in seconds via `ffprobe`.
pub fn probe_duration_secs(path: &Path) -> SlidecastResult<f64> {
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        format: ProbeFormat,
    }

    let out = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_format"])
        .arg(path)
        .output()
        .map_err(|e| SlidecastError::validation(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(SlidecastError::validation(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| SlidecastError::validation(format!("ffprobe json parse failed: {e}")))?;
    let duration = parsed
        .format
        .duration
        .as_deref()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| {
            SlidecastError::validation(format!(
                "ffprobe reported no duration for '{}'",
                path.display()
            ))
        })?;
    if duration <= 0.0 {
        return Err(SlidecastError::validation(format!(
            "ffprobe reported non-positive duration for '{}'",
            path.display()
        )));
    }
    Ok(duration)
}

/// Decode any supported audio container to canonical stereo f32 PCM.
pub fn decode_f32_stereo(path: &Path) -> SlidecastResult<AudioPcm> {
    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            &MIX_CHANNELS.to_string(),
            "-ar",
            &MIX_SAMPLE_RATE.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| {
            SlidecastError::validation(format!("failed to run ffmpeg for audio decode: {e}"))
        })?;

    if !out.status.success() {
        return Err(SlidecastError::validation(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    if !out.stdout.len().is_multiple_of(4) {
        return Err(SlidecastError::validation(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }

    let samples = out
        .stdout
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Ok(AudioPcm {
        sample_rate: MIX_SAMPLE_RATE,
        channels: MIX_CHANNELS,
        samples,
    })
}

// Probing and decoding shell out to `ffprobe`/`ffmpeg`; they are exercised by
// the integration tests that skip when the tools are unavailable.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm_frame_count_and_duration() {
        let pcm = AudioPcm {
            sample_rate: 48_000,
            channels: 2,
            samples: vec![0.0; 96_000],
        };
        assert_eq!(pcm.frame_count(), 48_000);
        assert!((pcm.duration_secs() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn probe_on_missing_file_fails() {
        // Regardless of whether ffprobe is installed, a nonexistent input
        // must come back as an error, never a duration.
        assert!(probe_duration_secs(Path::new("does/not/exist.wav")).is_err());
    }
}
