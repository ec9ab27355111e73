use crate::bbdown::DownloadOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: Option<String>,
}

/// Checkboxes that start out checked.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default)]
#[serde(default)]
pub struct DefaultOptions {
    pub video_only: bool,
    pub audio_only: bool,
    pub danmaku_only: bool,
    pub sub_only: bool,
}

impl From<DefaultOptions> for DownloadOptions {
    fn from(d: DefaultOptions) -> Self {
        DownloadOptions {
            video_only: d.video_only,
            audio_only: d.audio_only,
            danmaku_only: d.danmaku_only,
            sub_only: d.sub_only,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub bbdown_path: Option<PathBuf>,
    pub download_dir: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub defaults: DefaultOptions,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config file {}", path))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse TOML")?;
        Ok(config)
    }

    pub fn get_logging_format(&self) -> &str {
        self.logging.format.as_deref().unwrap_or("text")
    }

    pub fn get_bbdown_path(&self) -> Option<&PathBuf> {
        self.bbdown_path.as_ref()
    }

    pub fn get_download_dir(&self) -> Option<&PathBuf> {
        self.download_dir.as_ref()
    }

    pub fn get_default_options(&self) -> DownloadOptions {
        self.defaults.into()
    }
}
