use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::error::SlidecastResult;

/// Script document filename inside a project folder.
pub const SCRIPT_FILE: &str = "script.json";

/// Accepted per-scene audio container extensions, tried in order.
pub const AUDIO_EXTS: [&str; 3] = ["wav", "mp3", "ogg"];

/// Accepted per-scene image extensions, tried in order.
pub const IMAGE_EXTS: [&str; 2] = ["jpg", "png"];

/// Pre-made full narration filenames, tried in order.
pub const NARRATION_FILES: [&str; 2] = ["narration.mp3", "narration.wav"];

/// Conventional background-music filename in the project root.
pub const DEFAULT_BGM_FILE: &str = "bgm.mp3";

const ENV_PROJECTS_ROOT: &str = "SLIDECAST_PROJECTS";

/// Resolve the projects root: explicit flag, else `SLIDECAST_PROJECTS`, else
/// `./projects`.
pub fn projects_root(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::var_os(ENV_PROJECTS_ROOT).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("projects"))
}

/// On-disk layout of one project.
///
/// Media files are read-only inputs; the exporter is the only writer and only
/// touches `output/`.
#[derive(Clone, Debug)]
pub struct ProjectDirs {
    pub root: PathBuf,
    pub images: PathBuf,
    pub audio: PathBuf,
    pub output: PathBuf,
}

impl ProjectDirs {
    /// Open a project folder, creating the output directory if needed.
    pub fn open(projects_root: &Path, name: &str) -> SlidecastResult<Self> {
        let root = projects_root.join(name);
        let dirs = Self {
            images: root.join("images"),
            audio: root.join("audio"),
            output: root.join("output"),
            root,
        };
        std::fs::create_dir_all(&dirs.output)
            .with_context(|| format!("create output dir '{}'", dirs.output.display()))?;
        Ok(dirs)
    }

    pub fn script_path(&self) -> PathBuf {
        self.root.join(SCRIPT_FILE)
    }

    /// Image for a scene: `images/scene_NN.<ext>`, first extension that exists.
    pub fn scene_image(&self, scene_id: u32) -> Option<PathBuf> {
        first_existing(&self.images, &scene_stem(scene_id), &IMAGE_EXTS)
    }

    /// Per-scene narration audio: `audio/scene_NN.<ext>`, first that exists.
    pub fn scene_audio(&self, scene_id: u32) -> Option<PathBuf> {
        first_existing(&self.audio, &scene_stem(scene_id), &AUDIO_EXTS)
    }

    /// Pre-made full narration track, if the project ships one.
    pub fn full_narration(&self) -> Option<PathBuf> {
        NARRATION_FILES
            .iter()
            .map(|name| self.audio.join(name))
            .find(|p| p.exists())
    }

    /// Project-local default background music, if present.
    pub fn default_bgm(&self) -> Option<PathBuf> {
        let path = self.root.join(DEFAULT_BGM_FILE);
        path.exists().then_some(path)
    }

    pub fn video_out(&self) -> PathBuf {
        self.output.join("final_video.mp4")
    }

    pub fn srt_out(&self) -> PathBuf {
        self.output.join("subtitles.srt")
    }
}

fn scene_stem(scene_id: u32) -> String {
    format!("scene_{scene_id:02}")
}

fn first_existing(dir: &Path, stem: &str, exts: &[&str]) -> Option<PathBuf> {
    exts.iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|p| p.exists())
}

/// Enumerate project folders that carry a recognized script document.
///
/// Administrative discovery surface; sorted by name for stable output.
pub fn list_projects(root: &Path) -> SlidecastResult<Vec<String>> {
    let mut names = Vec::new();
    if !root.exists() {
        return Ok(names);
    }
    let entries =
        std::fs::read_dir(root).with_context(|| format!("read projects root '{}'", root.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry under '{}'", root.display()))?;
        let path = entry.path();
        if path.is_dir() && path.join(SCRIPT_FILE).exists() {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_stems_are_zero_padded() {
        assert_eq!(scene_stem(3), "scene_03");
        assert_eq!(scene_stem(12), "scene_12");
        assert_eq!(scene_stem(123), "scene_123");
    }

    #[test]
    fn scene_audio_respects_extension_priority() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = ProjectDirs::open(dir.path(), "demo").unwrap();
        std::fs::create_dir_all(&dirs.audio).unwrap();
        std::fs::write(dirs.audio.join("scene_01.mp3"), b"x").unwrap();
        std::fs::write(dirs.audio.join("scene_01.wav"), b"x").unwrap();

        let found = dirs.scene_audio(1).unwrap();
        assert_eq!(found.extension().unwrap(), "wav");
        assert!(dirs.scene_audio(2).is_none());
    }

    #[test]
    fn full_narration_prefers_mp3() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = ProjectDirs::open(dir.path(), "demo").unwrap();
        std::fs::create_dir_all(&dirs.audio).unwrap();
        assert!(dirs.full_narration().is_none());

        std::fs::write(dirs.audio.join("narration.wav"), b"x").unwrap();
        std::fs::write(dirs.audio.join("narration.mp3"), b"x").unwrap();
        let found = dirs.full_narration().unwrap();
        assert_eq!(found.file_name().unwrap(), "narration.mp3");
    }

    #[test]
    fn list_projects_requires_script_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("with_script")).unwrap();
        std::fs::write(dir.path().join("with_script").join(SCRIPT_FILE), b"{}").unwrap();
        std::fs::create_dir_all(dir.path().join("without_script")).unwrap();
        std::fs::write(dir.path().join("stray_file"), b"x").unwrap();

        let names = list_projects(dir.path()).unwrap();
        assert_eq!(names, vec!["with_script".to_string()]);
    }

    #[test]
    fn list_projects_on_missing_root_is_empty() {
        let names = list_projects(Path::new("does/not/exist")).unwrap();
        assert!(names.is_empty());
    }
}
