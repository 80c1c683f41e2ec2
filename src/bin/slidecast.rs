use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use slidecast::{AssembleOptions, Config};

#[derive(Parser, Debug)]
#[command(name = "slidecast", version, about = "Assemble narrated slideshow videos from scene scripts")]
struct Cli {
    /// Projects root (default: $SLIDECAST_PROJECTS, else ./projects).
    #[arg(long)]
    projects_root: Option<PathBuf>,

    /// JSON config override; unset fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble a project's final video and subtitle sidecar.
    Assemble(AssembleArgs),
    /// List projects that carry a script document.
    List,
}

#[derive(Parser, Debug)]
struct AssembleArgs {
    /// Project folder name under the projects root.
    project: String,

    /// Background music file (default: the project's bgm.mp3, if present).
    #[arg(long)]
    bgm: Option<PathBuf>,

    /// Disable burned-in subtitles. The SRT sidecar is always written.
    #[arg(long)]
    no_subs: bool,

    /// Fast low-quality render: 15 fps, lower bitrate, fastest preset.
    #[arg(long)]
    preview: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let cli = Cli::parse();
    let root = slidecast::projects_root(cli.projects_root.clone());
    let cfg = Config::load(cli.config.as_deref())?;

    match cli.cmd {
        Command::List => cmd_list(&root),
        Command::Assemble(args) => cmd_assemble(&cfg, &root, args),
    }
}

fn cmd_list(root: &Path) -> anyhow::Result<()> {
    let projects = slidecast::list_projects(root)?;
    if projects.is_empty() {
        eprintln!("no projects found under {}", root.display());
        return Ok(());
    }
    for name in projects {
        println!("{name}");
    }
    Ok(())
}

fn cmd_assemble(cfg: &Config, root: &Path, args: AssembleArgs) -> anyhow::Result<()> {
    let opts = AssembleOptions {
        bgm_path: args.bgm,
        include_subtitles: !args.no_subs,
        preview: args.preview,
    };
    let report = slidecast::assemble(cfg, root, &args.project, &opts)?;

    if let Some(factor) = report.rescale_factor {
        eprintln!("note: scene durations rescaled by {factor:.3} to fit the duration budget");
    }
    for scene in &report.substituted_images {
        eprintln!("note: scene {scene} had no usable image and was rendered black");
    }
    if !report.missing_narration.is_empty() {
        eprintln!(
            "note: no narration audio for scenes {:?}",
            report.missing_narration
        );
    }
    for scene in &report.skipped_cues {
        eprintln!("note: caption for scene {scene} could not be rendered and was skipped");
    }

    eprintln!(
        "wrote {} ({:.1}s)",
        report.video_path.display(),
        report.duration_secs
    );
    eprintln!("wrote {}", report.srt_path.display());
    Ok(())
}
