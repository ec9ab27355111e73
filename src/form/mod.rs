use crate::bbdown::{DownloadOptions, DownloadRequest, SessionEvent, Target, TargetError};
use crate::utils::uppercase_first_path;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Downloading,
    Completed,
    Failed,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Idle => "",
            Status::Downloading => "Downloading...",
            Status::Completed => "Download complete!",
            Status::Failed => "Download failed!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StartError {
    #[error(transparent)]
    Target(#[from] TargetError),
    #[error("A download is already running")]
    AlreadyRunning,
}

/// Read-only output log. Only the form appends to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogBuffer {
    lines: Vec<String>,
}

impl LogBuffer {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub(crate) fn append(&mut self, text: &str) {
        self.lines
            .push(text.trim_end_matches(|c| c == '\r' || c == '\n').to_string());
    }
}

/// State behind the download form.
///
/// Owned by the front end; the download worker only ever talks to it through
/// `SessionEvent`s passed to [`FormState::apply`].
#[derive(Debug, Clone)]
pub struct FormState {
    pub target: String,
    pub options: DownloadOptions,
    work_dir: PathBuf,
    status: Status,
    log: LogBuffer,
    busy: bool,
}

impl FormState {
    pub fn new(work_dir: impl AsRef<Path>) -> Self {
        Self {
            target: String::new(),
            options: DownloadOptions::default(),
            work_dir: uppercase_first_path(work_dir.as_ref()),
            status: Status::Idle,
            log: LogBuffer::default(),
            busy: false,
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn log(&self) -> &LogBuffer {
        &self.log
    }

    pub fn choose_directory(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return;
        }
        self.work_dir = uppercase_first_path(path);
        debug!(work_dir = %self.work_dir.display(), "Download directory chosen");
    }

    /// Validates the form and, if it is complete, switches to downloading.
    pub fn start(&mut self) -> Result<DownloadRequest, StartError> {
        if self.busy {
            return Err(StartError::AlreadyRunning);
        }
        let target = Target::parse(&self.target)?;

        self.busy = true;
        self.status = Status::Downloading;
        info!(target = %target, "Download requested");

        Ok(DownloadRequest {
            target,
            work_dir: self.work_dir.clone(),
            options: self.options,
        })
    }

    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Started(invocation) => {
                debug!("Run started: {}", invocation);
            }
            SessionEvent::Line(line) => self.log.append(&line),
            SessionEvent::Finished(Ok(())) => {
                self.status = Status::Completed;
                self.busy = false;
            }
            SessionEvent::Finished(Err(e)) => {
                self.log.append(&format!("Error: {e}"));
                self.status = Status::Failed;
                self.busy = false;
            }
        }
    }
}
