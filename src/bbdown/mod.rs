mod options;
mod process;
mod runner;
mod target;
mod types;

pub use options::{build_args, DownloadMode, DownloadOptions, Invocation};
pub use process::BBDownRunner;
pub use runner::Runner;
pub use target::{Target, TargetError, TargetKind};
pub use types::{DownloadError, RunOutcome, SessionEvent};

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Everything needed to start downloading, as captured from the form.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub target: Target,
    pub work_dir: PathBuf,
    pub options: DownloadOptions,
}

pub struct DownloadSession {
    runner: Arc<dyn Runner>,
}

impl DownloadSession {
    pub fn new(runner: Arc<dyn Runner>) -> Self {
        Self { runner }
    }

    /// Runs the executable once per planned invocation, stopping at the first failure.
    pub async fn run(
        &self,
        request: &DownloadRequest,
        events: &UnboundedSender<SessionEvent>,
        cancel: &CancellationToken,
    ) -> Result<(), DownloadError> {
        info!(
            target = %request.target,
            kind = ?request.target.kind(),
            work_dir = %request.work_dir.display(),
            "Starting download session"
        );

        self.runner.ensure_ready()?;

        tokio::fs::create_dir_all(&request.work_dir)
            .await
            .map_err(|source| DownloadError::WorkDir {
                path: request.work_dir.clone(),
                source,
            })?;

        for invocation in request.options.plan() {
            if cancel.is_cancelled() {
                return Err(DownloadError::Cancelled);
            }

            info!("Running {} for {}", self.runner.name(), invocation);
            // The receiver going away only means nobody is displaying the log anymore.
            let _ = events.send(SessionEvent::Started(invocation));

            let args = build_args(request.target.as_str(), &request.work_dir, &invocation);
            let outcome = self.runner.run(&args, events, cancel).await?;

            if !outcome.success {
                return Err(DownloadError::ExitedNonZero {
                    mode: invocation.describe().to_string(),
                    code: outcome.code,
                });
            }
        }

        info!("Download session finished");
        Ok(())
    }
}

/// Runs the session on a background task so the caller stays responsive.
///
/// Exactly one `SessionEvent::Finished` is sent, after all other events.
pub fn spawn_session(
    session: DownloadSession,
    request: DownloadRequest,
    events: UnboundedSender<SessionEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = session.run(&request, &events, &cancel).await;
        if let Err(e) = &result {
            error!("Download failed: {}", e);
        }
        // A closed form has nothing left to update.
        let _ = events.send(SessionEvent::Finished(result));
    })
}
