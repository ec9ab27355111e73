use super::types::{DownloadError, RunOutcome, SessionEvent};
use async_trait::async_trait;
use std::ffi::OsString;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait Runner: Send + Sync {
    /// Human-readable name of the external program
    fn name(&self) -> &'static str;

    /// Checks that the program can be run before anything touches the filesystem
    fn ensure_ready(&self) -> Result<(), DownloadError> {
        Ok(())
    }

    /// Run the program once with `args`, forwarding every output line to `events`.
    ///
    /// Returns once the process has exited. When `cancel` fires the process is
    /// killed and `DownloadError::Cancelled` is returned.
    async fn run(
        &self,
        args: &[OsString],
        events: &UnboundedSender<SessionEvent>,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, DownloadError>;

    /// Test if the program can be launched at all
    async fn check_available(&self) -> bool;
}
