//! Auralux command line: play a track with live visuals in the terminal, or
//! render frames of it to PNG files.

use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};

use auralux::app::App;
use auralux::audio::{AudioSource, RodioBackend};
use auralux::config::{self, AppConfig};
use auralux::export::{ExportOptions, export_frames};
use auralux::render::StyleKind;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "auralux", version)]
#[command(about = "Audio-reactive procedural visuals", long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/auralux/config.yaml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a track with visuals in the terminal
    Play(PlayArgs),
    /// Render frames of a track to numbered PNG files
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct PlayArgs {
    /// Audio file to play
    file: PathBuf,

    /// Initial style: abstract, neon, smoke, nature, retro, minimal, nebula, fractal, wave
    #[arg(long, value_name = "KEY")]
    style: Option<String>,

    /// Target frames per second
    #[arg(long, value_name = "N")]
    fps: Option<u32>,

    /// Seed for the style generators
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Audio file to analyze
    file: PathBuf,

    /// Number of frames to write
    #[arg(long, value_name = "N")]
    frames: u32,

    /// Output directory
    #[arg(long, value_name = "DIR")]
    out: PathBuf,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 450)]
    height: u32,

    #[arg(long, value_name = "KEY")]
    style: Option<String>,

    #[arg(long, value_name = "N")]
    fps: Option<u32>,

    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn resolve_style(key: Option<&str>, config: &AppConfig) -> Result<StyleKind> {
    match key {
        Some(key) => match StyleKind::from_key(key) {
            Some(kind) => Ok(kind),
            None => bail!("unknown style '{}'", key),
        },
        None => Ok(config.display.style()),
    }
}

/// Initialize logging. While the terminal UI owns the screen, output goes to
/// the configured log file instead of stderr.
fn init_logging(config: &AppConfig, to_file: bool) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    );
    builder.format_timestamp_millis();

    if to_file {
        let path = config.logging.file_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create log directory {:?}", parent))?;
        }
        let file = File::create(&path).with_context(|| format!("failed to open log file {:?}", path))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn play(args: PlayArgs, mut config: AppConfig) -> Result<()> {
    let style = resolve_style(args.style.as_deref(), &config)?;
    if let Some(fps) = args.fps {
        config.display.target_fps = fps.max(1);
    }
    log::info!("auralux starting: play {:?} ({})", args.file, style);

    let app = App::new(
        RodioBackend::new(),
        &config,
        AudioSource::from_path(args.file),
        style,
        args.seed,
    );
    auralux::ui::run(app)
}

fn render(args: RenderArgs, config: AppConfig) -> Result<()> {
    let options = ExportOptions {
        style: resolve_style(args.style.as_deref(), &config)?,
        source: args.file,
        out_dir: args.out,
        frames: args.frames,
        width: args.width,
        height: args.height,
        fps: args.fps.unwrap_or(config.display.target_fps),
        seed: args.seed,
        analyzer: config.analyzer,
    };
    let summary = export_frames(&options)?;
    println!(
        "wrote {} frames to {} ({} skipped)",
        summary.written,
        options.out_dir.display(),
        summary.skipped
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    // Parsed before logging starts; its own messages are not shown
    let config = config::load_config(&config_path);

    match cli.command {
        Command::Play(args) => {
            init_logging(&config, true)?;
            play(args, config)
        }
        Command::Render(args) => {
            init_logging(&config, false)?;
            render(args, config)
        }
    }
}
