use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use anyhow::Context as _;

use crate::error::{SlidecastError, SlidecastResult};
use crate::kenburns::FrameRgba;

/// Encoding quality profile: full renders versus fast previews.
///
/// Preview keeps the same logical composition but drops the frame rate and
/// trades bitrate for encoder speed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeProfile {
    pub fps: u32,
    pub bitrate: &'static str,
    pub preset: &'static str,
}

impl EncodeProfile {
    pub fn full(fps: u32) -> Self {
        Self {
            fps,
            bitrate: "5000k",
            preset: "medium",
        }
    }

    pub fn preview() -> Self {
        Self {
            fps: 15,
            bitrate: "2000k",
            preset: "ultrafast",
        }
    }
}

/// Pre-mixed raw PCM side input for the final mux.
#[derive(Clone, Debug)]
pub struct AudioInput {
    /// Path to interleaved `f32le` samples.
    pub path: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Options for one export.
#[derive(Clone, Debug)]
pub struct EncodeOpts {
    pub out_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub profile: EncodeProfile,
    pub audio: Option<AudioInput>,
}

impl EncodeOpts {
    pub fn validate(&self) -> SlidecastResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SlidecastError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(SlidecastError::validation(
                "encode width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if self.profile.fps == 0 {
            return Err(SlidecastError::validation("encode fps must be non-zero"));
        }
        if let Some(audio) = &self.audio
            && (audio.sample_rate == 0 || audio.channels == 0)
        {
            return Err(SlidecastError::validation(
                "audio sample_rate/channels must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Streams raw RGBA frames into a system `ffmpeg` process muxing h264 + aac.
///
/// Frames must be pushed in timeline order; the whole program is one ffmpeg
/// invocation so the export either completes or fails outright.
pub struct FfmpegSink {
    opts: EncodeOpts,
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    frame_len: usize,
    frames_pushed: u64,
}

impl FfmpegSink {
    pub fn spawn(opts: EncodeOpts) -> SlidecastResult<Self> {
        opts.validate()?;
        if let Some(parent) = opts.out_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        if !is_ffmpeg_on_path() {
            return Err(SlidecastError::encode(
                "ffmpeg is required for MP4 export, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", opts.width, opts.height),
            "-r",
            &opts.profile.fps.to_string(),
            "-i",
            "pipe:0",
        ]);

        if let Some(audio) = &opts.audio {
            cmd.args([
                "-f",
                "f32le",
                "-ar",
                &audio.sample_rate.to_string(),
                "-ac",
                &audio.channels.to_string(),
                "-i",
            ])
            .arg(&audio.path)
            .args(["-c:a", "aac", "-shortest"]);
        } else {
            cmd.arg("-an");
        }

        cmd.args([
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-b:v",
            opts.profile.bitrate,
            "-preset",
            opts.profile.preset,
            "-movflags",
            "+faststart",
        ])
        .arg(&opts.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            SlidecastError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SlidecastError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| SlidecastError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        Ok(Self {
            frame_len: opts.width as usize * opts.height as usize * 4,
            opts,
            child,
            stdin: Some(stdin),
            stderr_drain: Some(stderr_drain),
            frames_pushed: 0,
        })
    }

    pub fn push_frame(&mut self, frame: &FrameRgba) -> SlidecastResult<()> {
        if frame.width != self.opts.width || frame.height != self.opts.height {
            return Err(SlidecastError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.opts.width, self.opts.height
            )));
        }
        if frame.data.len() != self.frame_len {
            return Err(SlidecastError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(SlidecastError::encode("ffmpeg sink is already finalized"));
        };
        stdin.write_all(&frame.data).map_err(|e| {
            SlidecastError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        self.frames_pushed += 1;
        Ok(())
    }

    pub fn frames_pushed(&self) -> u64 {
        self.frames_pushed
    }

    /// Close stdin, wait for ffmpeg, and surface its stderr on failure.
    pub fn finish(mut self) -> SlidecastResult<()> {
        drop(self.stdin.take());
        let status = self.child.wait().map_err(|e| {
            SlidecastError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| SlidecastError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| SlidecastError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        if !status.success() {
            return Err(SlidecastError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        // Abandoned before finish: stop the encoder so no half-written file
        // lingers behind the partial-output cleanup.
        if self.stdin.is_some() {
            drop(self.stdin.take());
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Remove a partial output file after a failed export so it cannot be
/// mistaken for a successful render.
pub fn discard_partial_output(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to remove partial output"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_carry_the_expected_tradeoffs() {
        let full = EncodeProfile::full(30);
        assert_eq!(full.fps, 30);
        assert_eq!(full.bitrate, "5000k");
        assert_eq!(full.preset, "medium");

        let preview = EncodeProfile::preview();
        assert_eq!(preview.fps, 15);
        assert_eq!(preview.bitrate, "2000k");
        assert_eq!(preview.preset, "ultrafast");
    }

    #[test]
    fn validation_catches_bad_geometry() {
        let base = EncodeOpts {
            out_path: PathBuf::from("out.mp4"),
            width: 64,
            height: 64,
            profile: EncodeProfile::preview(),
            audio: None,
        };
        assert!(base.validate().is_ok());

        let odd = EncodeOpts {
            width: 63,
            ..base.clone()
        };
        assert!(odd.validate().is_err());

        let zero_fps = EncodeOpts {
            profile: EncodeProfile {
                fps: 0,
                bitrate: "1k",
                preset: "ultrafast",
            },
            ..base.clone()
        };
        assert!(zero_fps.validate().is_err());

        let bad_audio = EncodeOpts {
            audio: Some(AudioInput {
                path: PathBuf::from("mix.f32le"),
                sample_rate: 0,
                channels: 2,
            }),
            ..base
        };
        assert!(bad_audio.validate().is_err());
    }

    #[test]
    fn discard_partial_output_is_quiet_on_missing_file() {
        discard_partial_output(Path::new("does/not/exist.mp4"));
    }
}
