use super::options::Invocation;
use std::path::PathBuf;
use thiserror::Error;

/// Messages sent from the download worker to whoever owns the form.
#[derive(Debug)]
pub enum SessionEvent {
    /// A run of the executable is about to start.
    Started(Invocation),
    /// One line of output, without its trailing newline.
    Line(String),
    /// The session is over. Always the last event.
    Finished(Result<(), DownloadError>),
}

/// Exit information of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub success: bool,
    pub code: Option<i32>,
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("BBDown executable not found at {}; make sure the tools folder contains it", .path.display())]
    ExecutableMissing { path: PathBuf },

    #[error("download failed: {mode}{}", exit_suffix(.code))]
    ExitedNonZero { mode: String, code: Option<i32> },

    #[error("cannot create download directory {}: {source}", .path.display())]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start BBDown: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while running BBDown: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("download cancelled")]
    Cancelled,
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" (exit code {code})"),
        None => " (terminated by signal)".to_string(),
    }
}
