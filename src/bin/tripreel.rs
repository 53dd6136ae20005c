use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tripreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the stage plan as JSON.
    Plan(CommonArgs),
    /// Render the trip video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Input trip JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Reel configuration JSON. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory relative photo URLs are resolved against. Defaults to the trip file's directory.
    #[arg(long)]
    photos_root: Option<PathBuf>,

    /// Override output width.
    #[arg(long)]
    width: Option<u32>,

    /// Override output height.
    #[arg(long)]
    height: Option<u32>,

    /// Override output frame rate (integer fps).
    #[arg(long)]
    fps: Option<u32>,

    /// Font file used for all overlay text.
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Output video path.
    #[arg(long)]
    out: PathBuf,

    /// Pace frames to the wall clock.
    #[arg(long, default_value_t = false)]
    realtime: bool,

    /// `ffmpeg` binary to use.
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: String,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Plan(args) => cmd_plan(args),
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn load_inputs(args: &CommonArgs) -> anyhow::Result<(tripreel::TripInput, tripreel::ReelConfig)> {
    let trip = tripreel::TripInput::from_path(&args.in_path)
        .with_context(|| format!("load trip '{}'", args.in_path.display()))?;
    let mut cfg = match &args.config {
        Some(p) => tripreel::ReelConfig::from_path(p)
            .with_context(|| format!("load config '{}'", p.display()))?,
        None => tripreel::ReelConfig::default(),
    };
    if let Some(w) = args.width {
        cfg.canvas.width = w;
    }
    if let Some(h) = args.height {
        cfg.canvas.height = h;
    }
    if let Some(fps) = args.fps {
        cfg.fps = tripreel::Fps::new(fps, 1)?;
    }
    if let Some(font) = &args.font {
        cfg.font_path = Some(font.clone());
    }
    cfg.validate()?;
    Ok((trip, cfg))
}

fn photos_root(args: &CommonArgs) -> PathBuf {
    args.photos_root.clone().unwrap_or_else(|| {
        args.in_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf()
    })
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn print_progress(pct: f64, status: &str) {
    let mut err = std::io::stderr().lock();
    let _ = write!(err, "\r{pct:5.1}% {status:<48}");
    let _ = err.flush();
}

fn cmd_plan(args: CommonArgs) -> anyhow::Result<()> {
    let (trip, cfg) = load_inputs(&args)?;
    let plan = tripreel::StagePlan::build(&trip, &cfg)?;
    let json = serde_json::to_string_pretty(&plan).context("serialize stage plan")?;
    println!("{json}");
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let (trip, mut cfg) = load_inputs(&args.common)?;
    if args.realtime {
        cfg.pacing = tripreel::Pacing::Realtime;
    }
    let images = Arc::new(tripreel::FsImageSource::new(photos_root(&args.common)));
    let mut comp = tripreel::Compositor::new(
        cfg,
        tripreel::FlatMapFactory::default(),
        tripreel::FfmpegEncoderFactory::with_program(args.ffmpeg.clone()),
        images,
    )?;

    let artifact = comp.generate(&trip, &mut print_progress, &tripreel::CancelToken::new())?;
    eprintln!();

    ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, &artifact.bytes)
        .with_context(|| format!("write video '{}'", args.out.display()))?;
    eprintln!(
        "wrote {} ({} bytes, {})",
        args.out.display(),
        artifact.size,
        artifact.mime
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (trip, mut cfg) = load_inputs(&args.common)?;
    let plan = tripreel::StagePlan::build(&trip, &cfg)?;
    anyhow::ensure!(
        args.frame < plan.total_frames,
        "frame {} is out of range (video has {} frames)",
        args.frame,
        plan.total_frames
    );

    cfg.format_preferences = vec![tripreel::PNG_MIME.to_string()];
    let images = Arc::new(tripreel::FsImageSource::new(photos_root(&args.common)));
    let mut comp = tripreel::Compositor::new(
        cfg,
        tripreel::FlatMapFactory::default(),
        tripreel::StillFrameEncoderFactory {
            target: tripreel::FrameIndex(args.frame),
        },
        images,
    )?;
    let artifact = comp.generate(&trip, &mut print_progress, &tripreel::CancelToken::new())?;
    eprintln!();

    ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, &artifact.bytes)
        .with_context(|| format!("write png '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}
