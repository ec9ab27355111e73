use std::ffi::OsString;
use std::fmt;
use std::path::Path;

/// A single "only download X" switch understood by BBDown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadMode {
    VideoOnly,
    AudioOnly,
    DanmakuOnly,
    SubOnly,
}

impl DownloadMode {
    pub const ALL: [DownloadMode; 4] = [
        DownloadMode::VideoOnly,
        DownloadMode::AudioOnly,
        DownloadMode::DanmakuOnly,
        DownloadMode::SubOnly,
    ];

    pub fn flag(self) -> &'static str {
        match self {
            DownloadMode::VideoOnly => "--video-only",
            DownloadMode::AudioOnly => "--audio-only",
            DownloadMode::DanmakuOnly => "--danmaku-only",
            DownloadMode::SubOnly => "--sub-only",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DownloadMode::VideoOnly => "video only",
            DownloadMode::AudioOnly => "audio only",
            DownloadMode::DanmakuOnly => "danmaku only",
            DownloadMode::SubOnly => "subtitles only",
        }
    }
}

/// The four option checkboxes. They are independent of each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadOptions {
    pub video_only: bool,
    pub audio_only: bool,
    pub danmaku_only: bool,
    pub sub_only: bool,
}

impl DownloadOptions {
    pub fn is_checked(&self, mode: DownloadMode) -> bool {
        match mode {
            DownloadMode::VideoOnly => self.video_only,
            DownloadMode::AudioOnly => self.audio_only,
            DownloadMode::DanmakuOnly => self.danmaku_only,
            DownloadMode::SubOnly => self.sub_only,
        }
    }

    pub fn selected_modes(&self) -> Vec<DownloadMode> {
        DownloadMode::ALL
            .into_iter()
            .filter(|mode| self.is_checked(*mode))
            .collect()
    }

    /// One run per checked mode, or a single full download when nothing is checked.
    pub fn plan(&self) -> Vec<Invocation> {
        let modes = self.selected_modes();
        if modes.is_empty() {
            return vec![Invocation { mode: None }];
        }
        modes
            .into_iter()
            .map(|mode| Invocation { mode: Some(mode) })
            .collect()
    }

    /// Checkbox-wise OR, used to merge config defaults with command line flags.
    pub fn merge(self, other: DownloadOptions) -> DownloadOptions {
        DownloadOptions {
            video_only: self.video_only || other.video_only,
            audio_only: self.audio_only || other.audio_only,
            danmaku_only: self.danmaku_only || other.danmaku_only,
            sub_only: self.sub_only || other.sub_only,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation {
    pub mode: Option<DownloadMode>,
}

impl Invocation {
    pub fn describe(&self) -> &'static str {
        match self.mode {
            Some(mode) => mode.flag(),
            None => "full content",
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            Some(mode) => write!(f, "{} ({})", mode.label(), mode.flag()),
            None => f.write_str("full content"),
        }
    }
}

/// Arguments for one BBDown run, excluding the executable itself.
pub fn build_args(target: &str, work_dir: &Path, invocation: &Invocation) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        target.into(),
        "--work-dir".into(),
        work_dir.as_os_str().to_owned(),
    ];
    if let Some(mode) = invocation.mode {
        args.push(mode.flag().into());
    }
    args
}
