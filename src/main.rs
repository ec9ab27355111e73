use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

mod app;
mod bbdown;
mod config;
mod form;
mod utils;

use bbdown::{BBDownRunner, DownloadOptions, Runner};
use config::Config;
use form::{FormState, Status};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Video URL or av/BV/ep/ss id
    target: Option<String>,

    /// Directory the downloads are written to
    #[arg(short = 'd', long)]
    work_dir: Option<PathBuf>,

    /// Only download the video stream
    #[arg(long)]
    video_only: bool,

    /// Only download the audio stream
    #[arg(long)]
    audio_only: bool,

    /// Only download danmaku
    #[arg(long)]
    danmaku_only: bool,

    /// Only download subtitles
    #[arg(long)]
    sub_only: bool,

    /// Path to the BBDown executable
    #[arg(long)]
    bbdown: Option<PathBuf>,

    /// Check that BBDown can be launched, then exit
    #[arg(long)]
    check: bool,

    /// Path to the config file
    #[arg(short, long)]
    config: Option<String>,
}

impl Args {
    fn options(&self) -> DownloadOptions {
        DownloadOptions {
            video_only: self.video_only,
            audio_only: self.audio_only,
            danmaku_only: self.danmaku_only,
            sub_only: self.sub_only,
        }
    }
}

fn get_config_path(args: &Args) -> Option<String> {
    if let Some(path) = &args.config {
        return Some(path.clone());
    }

    if let Ok(path) = std::env::var("CONFIG_FILE") {
        return Some(path);
    }

    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        let config_path = format!("{}/bbgrab/config.toml", xdg_config_home);
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let config_path = format!("{}/.config/bbgrab/config.toml", home.display());
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    None
}

/// Fills the form the way a user would: defaults first, then the picked directory.
fn build_form(args: &Args, config: &Config) -> FormState {
    let mut form = FormState::new(utils::default_download_dir());

    if let Some(dir) = args
        .work_dir
        .as_ref()
        .or_else(|| config.get_download_dir())
    {
        form.choose_directory(dir);
    }

    form.target = args.target.clone().unwrap_or_default();
    form.options = config.get_default_options().merge(args.options());
    form
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config_path = get_config_path(&args);
    let config = match &config_path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => Config::default(),
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    if config.get_logging_format() == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter)
            .init();
    }

    match &config_path {
        Some(path) => info!("Loaded config from: {}", path),
        None => info!("No config file found, using defaults"),
    }

    let bbdown_path = args
        .bbdown
        .clone()
        .or_else(|| config.get_bbdown_path().cloned())
        .unwrap_or_else(utils::default_bbdown_path);
    let runner = Arc::new(BBDownRunner::new(bbdown_path));

    if args.check {
        let available = runner.check_available().await;
        return Ok(if available {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let form = build_form(&args, &config);

    info!(
        bbdown = %runner.executable().display(),
        work_dir = %form.work_dir().display(),
        "Starting bbgrab"
    );

    let status = app::run(form, runner).await?;

    Ok(if status == Status::Completed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
