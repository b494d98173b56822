//! LyricFrame CLI
//!
//! Headless front end for the lyric-video engine: turns a captioning model
//! reply into a project, exports captions as SRT, dumps frame plans, and runs
//! the full export loop.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use lyricframe_lib::core::captions::{captions_from_raw, parse_caption_response};
use lyricframe_lib::core::commands::EditorAction;
use lyricframe_lib::core::project::Snapshot;
use lyricframe_lib::core::render::{
    ApproxTextMeasurer, AudioSource, ExportProgress, ExportResources, FsImageLoader, InMemorySink,
    PassthroughMuxer,
};
use lyricframe_lib::core::settings::{AppSettings, SettingsManager};
use lyricframe_lib::core::AspectRatio;
use lyricframe_lib::EditorSession;
use tokio::sync::mpsc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "lyricframe-cli", version)]
struct Cli {
    /// Directory holding settings.json (defaults are used when absent).
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Also write logs to a daily rolling file in this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a project from a captioning model reply.
    Import(ImportArgs),
    /// Print the project's captions as SRT.
    Srt(SrtArgs),
    /// Print the frame plan at a given time as JSON.
    Frame(FrameArgs),
    /// Render the whole song against a WAV file.
    Export(ExportArgs),
}

#[derive(Parser, Debug)]
struct ImportArgs {
    /// Model reply (JSON array, `{captions: [...]}`, optionally fenced).
    #[arg(long)]
    reply: PathBuf,

    /// Output project file.
    #[arg(long)]
    out: PathBuf,

    /// Theme to activate.
    #[arg(long)]
    theme: Option<String>,

    /// Aspect ratio (16:9, 9:16, 1:1, 4:5).
    #[arg(long)]
    aspect: Option<AspectRatio>,
}

#[derive(Parser, Debug)]
struct SrtArgs {
    /// Input project file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path (stdout when omitted).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input project file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Time in seconds.
    #[arg(long)]
    time: f64,

    /// Scale the plan to the preview width.
    #[arg(long, default_value_t = false)]
    preview: bool,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input project file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Audio track (WAV).
    #[arg(long)]
    audio: PathBuf,

    /// Directory the artifact is written to.
    #[arg(long)]
    out_dir: PathBuf,

    /// Override the export frame rate.
    #[arg(long)]
    fps: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    lyricframe_lib::init_logging(cli.log_dir.as_deref());

    let settings = match &cli.config_dir {
        Some(dir) => SettingsManager::new(dir).load(),
        None => AppSettings::default(),
    };

    match cli.cmd {
        Command::Import(args) => cmd_import(args, settings),
        Command::Srt(args) => cmd_srt(args, settings),
        Command::Frame(args) => cmd_frame(args, settings),
        Command::Export(args) => cmd_export(args, settings).await,
    }
}

fn open_project(path: &Path, settings: AppSettings) -> anyhow::Result<EditorSession> {
    EditorSession::open(path, settings)
        .with_context(|| format!("open project '{}'", path.display()))
}

fn cmd_import(args: ImportArgs, settings: AppSettings) -> anyhow::Result<()> {
    let reply = std::fs::read_to_string(&args.reply)
        .with_context(|| format!("read reply '{}'", args.reply.display()))?;
    let raw = parse_caption_response(&reply)?;
    anyhow::ensure!(!raw.is_empty(), "reply contains no caption lines");

    let mut session = EditorSession::new(settings);
    let captions = captions_from_raw(&raw, session.settings().editor.min_caption_duration);
    let count = captions.len();
    session.dispatch(EditorAction::SetCaptions { captions })?;
    if let Some(theme) = args.theme {
        session.set_theme(theme)?;
    }
    if let Some(aspect) = args.aspect {
        session.set_aspect_ratio(aspect)?;
    }

    session
        .save(&args.out)
        .with_context(|| format!("write project '{}'", args.out.display()))?;
    eprintln!("imported {} captions into {}", count, args.out.display());
    Ok(())
}

fn cmd_srt(args: SrtArgs, settings: AppSettings) -> anyhow::Result<()> {
    let session = open_project(&args.in_path, settings)?;
    let srt = session.export_srt();

    match args.out {
        Some(out) => {
            std::fs::write(&out, &srt).with_context(|| format!("write srt '{}'", out.display()))?;
            eprintln!("wrote {}", out.display());
        }
        None => print!("{}", srt),
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs, settings: AppSettings) -> anyhow::Result<()> {
    let session = open_project(&args.in_path, settings)?;
    let plan = if args.preview {
        session.preview_frame(args.time)?
    } else {
        session.render_frame(args.time)?
    };
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

async fn cmd_export(args: ExportArgs, mut settings: AppSettings) -> anyhow::Result<()> {
    if let Some(fps) = args.fps {
        settings.export.fps = fps;
    }
    let mut session = open_project(&args.in_path, settings)?;

    let bytes = std::fs::read(&args.audio)
        .with_context(|| format!("read audio '{}'", args.audio.display()))?;
    let name = args
        .audio
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    session.set_audio(AudioSource::from_wav(name, bytes)?);

    let assets_root = args
        .in_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let images = FsImageLoader::with_base_dir(assets_root);
    let measurer = ApproxTextMeasurer::new(session.settings().compositor.char_advance);
    let mut sink = InMemorySink::new();

    let (tx, mut rx) = mpsc::channel::<ExportProgress>(64);
    let reporter = tokio::spawn(async move {
        let mut last_phase = None;
        while let Some(update) = rx.recv().await {
            if last_phase != Some(update.phase) {
                info!(phase = ?update.phase, percent = update.percent, "Export progress");
                last_phase = Some(update.phase);
            }
        }
    });

    let mut orchestrator = session.export_orchestrator().with_progress(tx);
    let artifact = session
        .export(
            &mut orchestrator,
            ExportResources {
                sink: &mut sink,
                muxer: &PassthroughMuxer,
                images: &images,
                measurer: &measurer,
            },
        )
        .await?
        .clone();
    drop(orchestrator);
    let _ = reporter.await;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;
    let out = args.out_dir.join(&artifact.file_name);
    std::fs::write(&out, &artifact.bytes)
        .with_context(|| format!("write artifact '{}'", out.display()))?;

    eprintln!("wrote {}", out.display());
    Ok(())
}
