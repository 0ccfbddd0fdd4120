use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "plumage", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame of a scene as a PNG.
    Frame(FrameArgs),
    /// Render a scene to MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Print a scene's lowered timeline as JSON.
    Dump(DumpArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SceneChoice {
    /// Yellow duck with a speech bubble.
    DebuggingDuck,
    /// Title card with the duck waddling to center.
    DuckIntro,
}

impl SceneChoice {
    fn build(self) -> plumage::PlumageResult<plumage::Scene> {
        match self {
            SceneChoice::DebuggingDuck => plumage::mascot::debugging_duck(),
            SceneChoice::DuckIntro => plumage::mascot::duck_introduction(),
        }
    }
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Built-in scene to render.
    #[arg(long, value_enum)]
    scene: SceneChoice,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Directory font paths are resolved against.
    #[arg(long, default_value = "assets")]
    assets_root: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Built-in scene to render.
    #[arg(long, value_enum)]
    scene: SceneChoice,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Directory font paths are resolved against.
    #[arg(long, default_value = "assets")]
    assets_root: PathBuf,
}

#[derive(Parser, Debug)]
struct DumpArgs {
    /// Built-in scene to dump.
    #[arg(long, value_enum)]
    scene: SceneChoice,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
        Command::Dump(args) => cmd_dump(args),
    }
}

fn lower_scene(choice: SceneChoice) -> anyhow::Result<plumage::Timeline> {
    let scene = choice.build()?;
    let timeline = scene.lower()?;
    Ok(timeline)
}

fn prepare(
    timeline: &plumage::Timeline,
    assets_root: &Path,
) -> anyhow::Result<(plumage::CpuBackend, plumage::PreparedAssetStore)> {
    let settings = plumage::RenderSettings {
        clear_rgba: Some(timeline.background),
    };
    let assets = plumage::PreparedAssetStore::prepare(timeline, assets_root)?;
    Ok((plumage::CpuBackend::new(settings), assets))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let timeline = lower_scene(args.scene)?;
    let (mut backend, assets) = prepare(&timeline, &args.assets_root)?;

    let frame = plumage::render_frame(
        &timeline,
        plumage::FrameIndex(args.frame),
        &mut backend,
        &assets,
    )?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ExtendedColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let timeline = lower_scene(args.scene)?;
    let (mut backend, assets) = prepare(&timeline, &args.assets_root)?;

    let opts = plumage::RenderToMp4Opts {
        range: plumage::FrameRange::new(plumage::FrameIndex(0), timeline.duration)?,
        overwrite: true,
    };
    plumage::render_to_mp4(&timeline, &args.out, opts, &mut backend, &assets)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_dump(args: DumpArgs) -> anyhow::Result<()> {
    let timeline = lower_scene(args.scene)?;
    let json = serde_json::to_string_pretty(&timeline).context("serialize timeline")?;
    println!("{json}");
    Ok(())
}
