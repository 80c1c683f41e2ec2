//! Slidecast assembles a narrated slideshow-style video from a scene script:
//! per-scene timing under a hard duration budget, Ken Burns camera motion
//! over still images, mixed narration/music with fade envelopes, time-boxed
//! caption overlays, and ffmpeg MP4 export with an SRT sidecar.
#![forbid(unsafe_code)]

pub mod assemble;
pub mod audio;
pub mod config;
pub mod encode;
pub mod error;
pub mod kenburns;
pub mod project;
pub mod script;
pub mod subtitle;
pub mod timeline;
pub mod timing;

pub use assemble::{AssembleOptions, AssembleReport, assemble};
pub use config::{Config, SubtitleStyle};
pub use error::{SlidecastError, SlidecastResult};
pub use kenburns::{FrameRgba, SceneClip};
pub use project::{ProjectDirs, list_projects, projects_root};
pub use script::{Effect, Scene, ScriptDocument};
pub use subtitle::SubtitleCue;
pub use timing::SceneTiming;
