use crate::{
    bbdown::{spawn_session, DownloadSession, Runner, SessionEvent},
    form::{FormState, Status},
};
use anyhow::{Context, Result};
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Terminal rendition of the download form.
///
/// Log lines go to `out`, the status label and validation errors to `status_out`.
pub struct TerminalApp {
    form: FormState,
    runner: Arc<dyn Runner>,
    printed: usize,
    shown_status: Status,
}

impl TerminalApp {
    pub fn new(form: FormState, runner: Arc<dyn Runner>) -> Self {
        let shown_status = form.status();
        Self {
            form,
            runner,
            printed: 0,
            shown_status,
        }
    }

    fn render(&mut self, out: &mut impl Write, status_out: &mut impl Write) -> Result<()> {
        for line in &self.form.log().lines()[self.printed..] {
            writeln!(out, "{line}")?;
        }
        self.printed = self.form.log().lines().len();
        out.flush()?;

        let status = self.form.status();
        if status != self.shown_status {
            self.shown_status = status;
            if !status.label().is_empty() {
                writeln!(status_out, "{}", status.label())?;
            }
        }

        Ok(())
    }

    /// Starts the download and pumps worker events into the form until it finishes.
    ///
    /// When `shutdown` completes first the running process is terminated and the
    /// loop waits for the worker to report back.
    pub async fn run<F>(
        &mut self,
        out: &mut impl Write,
        status_out: &mut impl Write,
        shutdown: F,
    ) -> Result<Status>
    where
        F: Future<Output = ()>,
    {
        let request = match self.form.start() {
            Ok(request) => request,
            Err(e) => {
                writeln!(status_out, "Error: {e}")?;
                return Ok(self.form.status());
            }
        };
        self.render(out, status_out)?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let worker = spawn_session(
            DownloadSession::new(self.runner.clone()),
            request,
            tx,
            cancel.clone(),
        );

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                event = rx.recv() => {
                    let Some(event) = event else {
                        break;
                    };
                    let finished = matches!(event, SessionEvent::Finished(_));
                    self.form.apply(event);
                    self.render(out, status_out)?;
                    if finished {
                        break;
                    }
                }
                _ = &mut shutdown, if !cancel.is_cancelled() => {
                    warn!("Shutdown requested, terminating download");
                    cancel.cancel();
                }
            }
        }

        worker.await.context("Download worker panicked")?;
        info!(status = ?self.form.status(), "Download form closed");
        Ok(self.form.status())
    }
}
