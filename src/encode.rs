pub mod ffmpeg;

pub use ffmpeg::{AudioInput, EncodeOpts, EncodeProfile, FfmpegSink, is_ffmpeg_on_path};
