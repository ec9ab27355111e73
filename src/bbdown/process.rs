use super::{
    runner::Runner,
    types::{DownloadError, RunOutcome, SessionEvent},
};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

pub struct BBDownRunner {
    executable: PathBuf,
}

impl BBDownRunner {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

fn emit_line(buf: &[u8], events: &UnboundedSender<SessionEvent>, stream: Stream) {
    let line = String::from_utf8_lossy(buf).into_owned();

    match stream {
        Stream::Stdout => {
            debug!(line = %line, "BBDown stdout");
            // The receiver going away only means nobody is displaying the log anymore.
            let _ = events.send(SessionEvent::Line(line));
        }
        // Only stdout belongs in the log.
        Stream::Stderr => warn!(line = %line, "BBDown stderr"),
    }
}

/// Reads `reader` to the end, emitting each line as soon as it is terminated.
///
/// `\n`, `\r` and `\r\n` all end a line, so `\r`-driven progress output shows up
/// step by step. Bytes that are not valid UTF-8 are replaced rather than aborting
/// the run.
async fn forward_lines<R>(
    reader: R,
    events: &UnboundedSender<SessionEvent>,
    stream: Stream,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    let mut after_cr = false;

    loop {
        let chunk = reader.fill_buf().await?;
        if chunk.is_empty() {
            if !line.is_empty() {
                emit_line(&line, events, stream);
            }
            return Ok(());
        }

        let consumed = chunk.len();
        for &byte in chunk {
            match byte {
                b'\n' if after_cr => after_cr = false,
                b'\r' | b'\n' => {
                    emit_line(&line, events, stream);
                    line.clear();
                    after_cr = byte == b'\r';
                }
                _ => {
                    after_cr = false;
                    line.push(byte);
                }
            }
        }
        reader.consume(consumed);
    }
}

#[async_trait]
impl Runner for BBDownRunner {
    fn name(&self) -> &'static str {
        "BBDown"
    }

    fn ensure_ready(&self) -> Result<(), DownloadError> {
        if !self.executable.exists() {
            return Err(DownloadError::ExecutableMissing {
                path: self.executable.clone(),
            });
        }
        Ok(())
    }

    async fn run(
        &self,
        args: &[OsString],
        events: &UnboundedSender<SessionEvent>,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, DownloadError> {
        self.ensure_ready()?;

        info!(
            executable = %self.executable.display(),
            args = ?args,
            "Starting BBDown"
        );

        let mut child = Command::new(&self.executable)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DownloadError::Spawn { source })?;

        let stdout = child.stdout.take().ok_or_else(|| DownloadError::Io {
            source: std::io::Error::other("BBDown stdout was not captured"),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| DownloadError::Io {
            source: std::io::Error::other("BBDown stderr was not captured"),
        })?;

        let finished = tokio::select! {
            result = async {
                let (out, err) = tokio::join!(
                    forward_lines(stdout, events, Stream::Stdout),
                    forward_lines(stderr, events, Stream::Stderr),
                );
                out?;
                err?;
                child.wait().await
            } => Some(result),
            _ = cancel.cancelled() => None,
        };

        let status = match finished {
            Some(result) => result.map_err(|source| DownloadError::Io { source })?,
            None => {
                warn!("Terminating BBDown");
                if let Err(e) = child.kill().await {
                    warn!("Failed to terminate BBDown: {}", e);
                }
                return Err(DownloadError::Cancelled);
            }
        };

        let outcome = RunOutcome {
            success: status.success(),
            code: status.code(),
        };

        info!(
            exit_code = ?outcome.code,
            success = outcome.success,
            "BBDown exited"
        );

        Ok(outcome)
    }

    async fn check_available(&self) -> bool {
        if !self.executable.exists() {
            warn!("❌ BBDown not found at {}", self.executable.display());
            return false;
        }

        let output = tokio::time::timeout(
            Duration::from_secs(10),
            Command::new(&self.executable)
                .arg("--version")
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output(),
        )
        .await;

        match output {
            Ok(Ok(output)) if output.status.success() => {
                let version_line = String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .next()
                    .unwrap_or("unknown")
                    .to_string();
                info!("✅ BBDown is available: {}", version_line.trim());
                true
            }
            Ok(Ok(output)) => {
                warn!("❌ BBDown --version failed with {}", output.status);
                false
            }
            Ok(Err(e)) => {
                warn!("❌ BBDown could not be started: {}", e);
                false
            }
            Err(_) => {
                warn!("❌ BBDown --version timed out");
                false
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tokio::sync::mpsc;

    fn fake_bbdown(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("BBDown");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let SessionEvent::Line(line) = event {
                lines.push(line);
            }
        }
        lines
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let dir = tempfile::tempdir().unwrap();
        let runner = BBDownRunner::new(dir.path().join("nope"));
        let (tx, _rx) = mpsc::unbounded_channel();

        let result = runner.run(&[], &tx, &CancellationToken::new()).await;
        assert!(matches!(
            result,
            Err(DownloadError::ExecutableMissing { .. })
        ));
        assert!(!runner.check_available().await);
    }

    #[tokio::test]
    async fn test_stdout_lines_forwarded_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_bbdown(dir.path(), "echo one\necho two\nprintf 'three\\r\\n'");
        let runner = BBDownRunner::new(exe);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let outcome = runner
            .run(&[], &tx, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            RunOutcome {
                success: true,
                code: Some(0)
            }
        );
        assert_eq!(drain(&mut rx), vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_carriage_return_ends_a_line() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_bbdown(dir.path(), r"printf '10%%\r50%%\r100%%\ndone\n\nlast'");
        let runner = BBDownRunner::new(exe);
        let (tx, mut rx) = mpsc::unbounded_channel();

        runner
            .run(&[], &tx, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(drain(&mut rx), vec!["10%", "50%", "100%", "done", "", "last"]);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_bbdown(dir.path(), r"printf 'ok\377\n'");
        let runner = BBDownRunner::new(exe);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let outcome = runner
            .run(&[], &tx, &CancellationToken::new())
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(drain(&mut rx), vec!["ok\u{FFFD}"]);
    }

    #[test]
    fn test_ensure_ready() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            BBDownRunner::new(dir.path().join("BBDown")).ensure_ready(),
            Err(DownloadError::ExecutableMissing { .. })
        ));
        let exe = fake_bbdown(dir.path(), "exit 0");
        assert!(BBDownRunner::new(exe).ensure_ready().is_ok());
    }

    #[tokio::test]
    async fn test_args_are_passed_through() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_bbdown(dir.path(), r#"for a in "$@"; do echo "arg:$a"; done"#);
        let runner = BBDownRunner::new(exe);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let args: Vec<OsString> = vec!["av170001".into(), "--work-dir".into(), "/tmp/x y".into()];
        runner
            .run(&args, &tx, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            drain(&mut rx),
            vec!["arg:av170001", "arg:--work-dir", "arg:/tmp/x y"]
        );
    }

    #[tokio::test]
    async fn test_non_zero_exit_reported() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_bbdown(dir.path(), "echo oops >&2\nexit 3");
        let runner = BBDownRunner::new(exe);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let outcome = runner
            .run(&[], &tx, &CancellationToken::new())
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.code, Some(3));
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_cancel_kills_process() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_bbdown(dir.path(), "echo started\nexec sleep 30");
        let runner = BBDownRunner::new(exe);
        let (tx, _rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(Duration::from_secs(10), runner.run(&[], &tx, &cancel))
            .await
            .expect("run should return promptly after cancellation");
        assert!(matches!(result, Err(DownloadError::Cancelled)));
    }

    #[tokio::test]
    async fn test_check_available_with_fake() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_bbdown(dir.path(), "echo 'BBDown version 1.6.3'");
        assert!(BBDownRunner::new(exe).check_available().await);
    }
}
