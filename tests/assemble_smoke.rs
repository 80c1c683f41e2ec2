//! End-to-end assembly against a real project folder. Runs only where the
//! system ffmpeg is available, like the other media-boundary tests.

use slidecast::{AssembleOptions, Config, Effect, Scene, ScriptDocument};

fn write_project(root: &std::path::Path, name: &str) -> std::path::PathBuf {
    let project = root.join(name);
    let images = project.join("images");
    std::fs::create_dir_all(&images).unwrap();

    let script = ScriptDocument {
        title: "smoke".to_string(),
        scenes: vec![
            Scene {
                scene_id: 1,
                narration: "A hero appears over the skyline.".to_string(),
                effect: Effect::SlowZoomIn,
                mood: None,
            },
            Scene {
                scene_id: 2,
                narration: "The picture for this beat is missing.".to_string(),
                effect: Effect::PanRight,
                mood: None,
            },
        ],
    };
    std::fs::write(
        project.join("script.json"),
        serde_json::to_string_pretty(&script).unwrap(),
    )
    .unwrap();

    let still = image::RgbaImage::from_fn(80, 60, |x, y| {
        image::Rgba([(x * 3) as u8, (y * 4) as u8, 128, 255])
    });
    still.save(images.join("scene_01.png")).unwrap();

    project
}

#[test]
fn preview_assembly_writes_video_and_sidecar() {
    if !slidecast::encode::is_ffmpeg_on_path() {
        eprintln!("ffmpeg not on PATH, skipping");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path(), "smoke");

    let cfg = Config {
        width: 64,
        height: 36,
        ..Config::default()
    };
    let opts = AssembleOptions {
        preview: true,
        ..AssembleOptions::default()
    };
    let report = slidecast::assemble(&cfg, dir.path(), "smoke", &opts).unwrap();

    assert!(report.video_path.exists());
    assert!(std::fs::metadata(&report.video_path).unwrap().len() > 0);
    assert!(report.srt_path.exists());

    // Two estimated 3s scenes at preview fps.
    assert!((report.duration_secs - 6.0).abs() < 0.1);
    assert_eq!(report.rescale_factor, None);
    assert_eq!(report.substituted_images, vec![2]);
    assert!(!report.has_narration);
    assert!(!report.has_bgm);

    let srt = std::fs::read_to_string(&report.srt_path).unwrap();
    assert!(srt.contains("00:00:00,000 --> 00:00:02,900"));
    assert!(srt.contains("A hero appears over the skyline."));

    // The temporary audio side-file never outlives the run.
    assert!(!report.video_path.with_file_name(".audio_mix.f32le").exists());
}

#[test]
fn missing_script_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("empty")).unwrap();

    let cfg = Config {
        width: 64,
        height: 36,
        ..Config::default()
    };
    let err = slidecast::assemble(&cfg, dir.path(), "empty", &AssembleOptions::default());
    assert!(err.is_err());
    assert!(!dir.path().join("empty/output/final_video.mp4").exists());
}
