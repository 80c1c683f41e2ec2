use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tracing::{info, warn};

use crate::audio::{MIX_CHANNELS, MIX_SAMPLE_RATE, media, mix};
use crate::config::Config;
use crate::encode::{AudioInput, EncodeOpts, EncodeProfile, FfmpegSink, ffmpeg};
use crate::error::{SlidecastError, SlidecastResult};
use crate::kenburns::SceneClip;
use crate::project::ProjectDirs;
use crate::script::{Effect, ScriptDocument};
use crate::subtitle::overlay::{OverlayRenderer, PreparedCue};
use crate::subtitle::{build_cues, srt};
use crate::timeline::{self, FrameWindow};
use crate::timing::SceneTiming;

/// Per-run switches for [`assemble`].
#[derive(Clone, Debug)]
pub struct AssembleOptions {
    /// Explicit background-music file. Falls back to the project-local
    /// default when unset or missing.
    pub bgm_path: Option<PathBuf>,
    /// Burn caption overlays into the video.
    pub include_subtitles: bool,
    /// Fast low-quality render: 15 fps, lower bitrate, fastest preset.
    pub preview: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            bgm_path: None,
            include_subtitles: true,
            preview: false,
        }
    }
}

/// What one run produced and what it had to work around.
///
/// Substitutions and skips are facts of the run, not errors: the caller can
/// fix inputs and re-run. The reported duration is always the duration of
/// the written file.
#[derive(Clone, Debug)]
pub struct AssembleReport {
    pub video_path: PathBuf,
    pub srt_path: PathBuf,
    pub duration_secs: f64,
    /// Uniform factor applied when the planned total exceeded the budget.
    pub rescale_factor: Option<f64>,
    /// Scenes rendered as solid black because the image was missing or
    /// undecodable.
    pub substituted_images: Vec<u32>,
    /// Scenes with no usable narration recording (only tracked when the
    /// narration is assembled per scene).
    pub missing_narration: Vec<u32>,
    /// Scenes whose caption overlay failed to render and was skipped.
    pub skipped_cues: Vec<u32>,
    pub has_narration: bool,
    pub has_bgm: bool,
}

/// Assemble one project into its final media file plus subtitle sidecar.
///
/// Stages run strictly in order: duration planning, budget fit, per-scene
/// render streamed into the encoder, audio composition, caption overlay,
/// export. Missing media degrades locally (black frames, silence, skipped
/// cues); only a broken script or a failed encode aborts the run.
#[tracing::instrument(skip(cfg, opts))]
pub fn assemble(
    cfg: &Config,
    projects_root: &Path,
    project: &str,
    opts: &AssembleOptions,
) -> SlidecastResult<AssembleReport> {
    cfg.validate()?;
    let dirs = ProjectDirs::open(projects_root, project)?;
    let script = ScriptDocument::load(&dirs.script_path())?;
    if script.scenes.is_empty() {
        return Err(SlidecastError::validation(format!(
            "script for '{project}' has no scenes"
        )));
    }
    info!(title = %script.title, scenes = script.scenes.len(), "assembling");

    // Measured per-scene audio is authoritative; estimates fill the rest.
    let measured = measure_scene_audio(&script, &dirs);
    let planned = SceneTiming::plan(&script, &measured);
    let (timing, rescale_factor) = planned.fit_to_budget(cfg.max_duration_secs);
    if let Some(factor) = rescale_factor {
        info!(
            total_secs = planned.total_secs(),
            max_secs = cfg.max_duration_secs,
            factor,
            "planned total exceeds budget, rescaling all scenes"
        );
    }

    let profile = if opts.preview {
        EncodeProfile::preview()
    } else {
        EncodeProfile::full(cfg.fps)
    };
    let windows = timeline::frame_windows(&script, &timing, profile.fps);
    let total_frames = timeline::total_frames(&windows);
    if total_frames == 0 {
        return Err(SlidecastError::validation(
            "planned timeline contains no frames",
        ));
    }
    let duration_secs = total_frames as f64 / f64::from(profile.fps);

    // The sidecar follows the narration timing, not the budget-fitted
    // program, and is written before the slow export.
    let srt_path = dirs.srt_out();
    std::fs::write(&srt_path, srt::sidecar_srt(&script, &measured))
        .with_context(|| format!("write subtitles '{}'", srt_path.display()))?;

    let mut report = AssembleReport {
        video_path: dirs.video_out(),
        srt_path,
        duration_secs,
        rescale_factor,
        substituted_images: Vec::new(),
        missing_narration: Vec::new(),
        skipped_cues: Vec::new(),
        has_narration: false,
        has_bgm: false,
    };

    let video_sample_frames = mix::frames_to_samples(total_frames, profile.fps, MIX_SAMPLE_RATE);
    let audio_track = compose_audio(&script, &dirs, opts, cfg, video_sample_frames, &mut report);

    let audio_tmp = dirs.output.join(".audio_mix.f32le");
    let audio_input = match &audio_track {
        Some(samples) => {
            mix::write_f32le(samples, &audio_tmp)?;
            Some(AudioInput {
                path: audio_tmp.clone(),
                sample_rate: MIX_SAMPLE_RATE,
                channels: MIX_CHANNELS,
            })
        }
        None => None,
    };

    let mut overlay = if opts.include_subtitles {
        match OverlayRenderer::new(&cfg.subtitle) {
            Ok(renderer) => Some(renderer),
            Err(e) => {
                warn!(error = %e, "subtitle overlay unavailable, continuing without burned-in captions");
                None
            }
        }
    } else {
        None
    };
    let cues = if overlay.is_some() {
        build_cues(&script, &timing)
    } else {
        Vec::new()
    };

    let render_result = render_program(
        cfg,
        &dirs,
        &script,
        &windows,
        profile,
        audio_input,
        overlay.as_mut(),
        &cues,
        &mut report,
    );

    if audio_track.is_some() {
        let _ = std::fs::remove_file(&audio_tmp);
    }
    if let Err(e) = render_result {
        ffmpeg::discard_partial_output(&report.video_path);
        return Err(e);
    }

    info!(
        video = %report.video_path.display(),
        srt = %report.srt_path.display(),
        duration_secs = report.duration_secs,
        substituted_images = report.substituted_images.len(),
        skipped_cues = report.skipped_cues.len(),
        "assembled"
    );
    Ok(report)
}

fn measure_scene_audio(script: &ScriptDocument, dirs: &ProjectDirs) -> BTreeMap<u32, f64> {
    let mut measured = BTreeMap::new();
    for scene in &script.scenes {
        let Some(path) = dirs.scene_audio(scene.scene_id) else {
            continue;
        };
        match media::probe_duration_secs(&path) {
            Ok(secs) => {
                measured.insert(scene.scene_id, secs);
            }
            Err(e) => {
                warn!(
                    scene = scene.scene_id,
                    error = %e,
                    "could not measure scene audio, falling back to estimate"
                );
            }
        }
    }
    measured
}

/// Build the composite audio track for the program, or `None` for a silent
/// video. The returned buffer always covers exactly the video length.
fn compose_audio(
    script: &ScriptDocument,
    dirs: &ProjectDirs,
    opts: &AssembleOptions,
    cfg: &Config,
    video_sample_frames: u64,
    report: &mut AssembleReport,
) -> Option<Vec<f32>> {
    let mut narration = load_narration(script, dirs, report);
    if let Some(samples) = narration.as_mut() {
        mix::truncate_to_frames(samples, video_sample_frames, MIX_CHANNELS);
    }
    report.has_narration = narration.is_some();

    let bgm = load_bgm(dirs, opts).map(|samples| {
        mix::build_bgm_track(
            &samples,
            video_sample_frames,
            cfg.bgm_volume,
            cfg.fade_in_secs,
            cfg.fade_out_secs,
            MIX_SAMPLE_RATE,
            MIX_CHANNELS,
        )
    });
    report.has_bgm = bgm.is_some();

    let mut track = match (narration, bgm) {
        (Some(n), Some(b)) => mix::mix_additive(n, &b),
        (Some(n), None) => n,
        (None, Some(b)) => b,
        (None, None) => return None,
    };
    // Cover the full program so the mux never cuts the video short.
    let target_len = video_sample_frames as usize * usize::from(MIX_CHANNELS);
    track.resize(target_len, 0.0);
    Some(track)
}

fn load_narration(
    script: &ScriptDocument,
    dirs: &ProjectDirs,
    report: &mut AssembleReport,
) -> Option<Vec<f32>> {
    if let Some(full) = dirs.full_narration() {
        info!(path = %full.display(), "using pre-made narration track");
        match media::decode_f32_stereo(&full) {
            Ok(pcm) => return Some(pcm.samples),
            Err(e) => {
                warn!(error = %e, "failed to decode full narration, trying per-scene files");
            }
        }
    }

    let mut combined = Vec::new();
    let mut found_any = false;
    for scene in &script.scenes {
        let Some(path) = dirs.scene_audio(scene.scene_id) else {
            report.missing_narration.push(scene.scene_id);
            continue;
        };
        match media::decode_f32_stereo(&path) {
            Ok(pcm) => {
                combined.extend_from_slice(&pcm.samples);
                found_any = true;
            }
            Err(e) => {
                warn!(scene = scene.scene_id, error = %e, "failed to decode scene audio, skipping");
                report.missing_narration.push(scene.scene_id);
            }
        }
    }
    if !found_any {
        warn!("no narration audio found; the video will be silent unless music is supplied");
        return None;
    }
    Some(combined)
}

fn load_bgm(dirs: &ProjectDirs, opts: &AssembleOptions) -> Option<Vec<f32>> {
    let path = match &opts.bgm_path {
        Some(explicit) if explicit.exists() => explicit.clone(),
        Some(explicit) => {
            warn!(path = %explicit.display(), "background music not found, trying project default");
            dirs.default_bgm()?
        }
        None => dirs.default_bgm()?,
    };
    info!(path = %path.display(), "adding background music");
    match media::decode_f32_stereo(&path) {
        Ok(pcm) if !pcm.samples.is_empty() => Some(pcm.samples),
        Ok(_) => {
            warn!(path = %path.display(), "background music decoded to silence, skipping");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to decode background music, skipping");
            None
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn render_program(
    cfg: &Config,
    dirs: &ProjectDirs,
    script: &ScriptDocument,
    windows: &[FrameWindow],
    profile: EncodeProfile,
    audio: Option<AudioInput>,
    mut overlay: Option<&mut OverlayRenderer>,
    cues: &[crate::subtitle::SubtitleCue],
    report: &mut AssembleReport,
) -> SlidecastResult<()> {
    let effects: BTreeMap<u32, Effect> = script
        .scenes
        .iter()
        .map(|s| (s.scene_id, s.effect))
        .collect();

    let mut sink = FfmpegSink::spawn(EncodeOpts {
        out_path: report.video_path.clone(),
        width: cfg.width,
        height: cfg.height,
        profile,
        audio,
    })?;

    let mut cue_idx = 0usize;
    let mut prepared: Option<(usize, PreparedCue)> = None;
    let mut failed_cues = BTreeSet::new();

    for window in windows {
        let effect = effects.get(&window.scene_id).copied().unwrap_or_default();
        let clip = open_scene_clip(cfg, dirs, window, effect, report);
        for local in 0..window.len_frames() {
            let mut frame = clip.render_frame(local);

            if let Some(renderer) = overlay.as_deref_mut() {
                let t = (window.start + local) as f64 / f64::from(profile.fps);
                while cue_idx < cues.len() && cues[cue_idx].end <= t {
                    cue_idx += 1;
                    prepared = None;
                }
                if cue_idx < cues.len()
                    && cues[cue_idx].start <= t
                    && t < cues[cue_idx].end
                    && !failed_cues.contains(&cue_idx)
                {
                    if prepared.as_ref().map(|(i, _)| *i) != Some(cue_idx) {
                        match renderer.prepare(&cues[cue_idx], cfg.width, cfg.height) {
                            Ok(p) => prepared = Some((cue_idx, p)),
                            Err(e) => {
                                warn!(
                                    scene = cues[cue_idx].scene_id,
                                    error = %e,
                                    "skipping caption that failed to render"
                                );
                                failed_cues.insert(cue_idx);
                                report.skipped_cues.push(cues[cue_idx].scene_id);
                                prepared = None;
                            }
                        }
                    }
                    if let Some((_, p)) = &prepared {
                        renderer.blit(&mut frame, p);
                    }
                }
            }

            sink.push_frame(&frame)?;
        }
    }

    sink.finish()
}

fn open_scene_clip(
    cfg: &Config,
    dirs: &ProjectDirs,
    window: &FrameWindow,
    effect: Effect,
    report: &mut AssembleReport,
) -> SceneClip {
    let frames = window.len_frames();
    let scene_id = window.scene_id;
    let Some(image_path) = dirs.scene_image(scene_id) else {
        warn!(scene = scene_id, "missing image, substituting black frames");
        report.substituted_images.push(scene_id);
        return SceneClip::black(frames, cfg.width, cfg.height);
    };

    match SceneClip::still(
        &image_path,
        effect,
        cfg.zoom_range,
        frames,
        cfg.width,
        cfg.height,
    ) {
        Ok(clip) => clip,
        Err(e) => {
            warn!(scene = scene_id, error = %e, "unusable image, substituting black frames");
            report.substituted_images.push(scene_id);
            SceneClip::black(frames, cfg.width, cfg.height)
        }
    }
}
