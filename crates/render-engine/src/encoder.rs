//! Encoder backends.

use std::collections::VecDeque;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

use reelsmith_common::{ReelError, ReelResult, RenderDefaults};

use crate::probe::command_exists;

/// Lines of encoder stderr kept for diagnostics.
pub const STDERR_TAIL_LINES: usize = 20;

/// Something that can run a compiled command line to completion.
#[async_trait]
pub trait EncoderBackend: Send + Sync {
    /// Run the encoder with `args`.
    ///
    /// `on_time` receives the output timestamp (seconds) as it advances.
    /// Must stop the encoder and return [`ReelError::Cancelled`] once
    /// `cancel` fires.
    async fn encode(
        &self,
        args: &[String],
        duration: f64,
        on_time: &(dyn Fn(f64) + Send + Sync),
        cancel: &CancellationToken,
    ) -> ReelResult<()>;

    /// Whether this backend can run on this system.
    fn is_available(&self) -> bool;

    fn name(&self) -> &'static str;
}

/// Runs the `ffmpeg` binary, reading `-progress pipe:1` from stdout.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    binary: String,
    timeout: Duration,
}

impl FfmpegBackend {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn from_config(render: &RenderDefaults) -> Self {
        Self::new(
            render.ffmpeg_path.clone(),
            Duration::from_secs(render.encode_timeout_secs),
        )
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    async fn stop(&self, child: &mut Child, why: Interrupt) -> ReelError {
        if let Err(e) = child.kill().await {
            tracing::warn!(error = %e, "Failed to kill encoder");
        }
        match why {
            Interrupt::Cancelled => {
                tracing::info!("Encoder cancelled");
                ReelError::Cancelled
            }
            Interrupt::TimedOut => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "Encoder timed out");
                ReelError::timeout(format!(
                    "encoder exceeded {}s",
                    self.timeout.as_secs()
                ))
            }
        }
    }
}

enum Interrupt {
    Cancelled,
    TimedOut,
}

#[async_trait]
impl EncoderBackend for FfmpegBackend {
    async fn encode(
        &self,
        args: &[String],
        duration: f64,
        on_time: &(dyn Fn(f64) + Send + Sync),
        cancel: &CancellationToken,
    ) -> ReelResult<()> {
        tracing::debug!(args = ?args, "Running ffmpeg");
        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ReelError::encoder(format!("failed to start {}: {e}", self.binary), ""))?;

        tracing::info!(
            pid = ?child.id(),
            args_len = args.len(),
            duration,
            "ffmpeg process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::encoder("failed to capture ffmpeg stdout", ""))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::encoder("failed to capture ffmpeg stderr", ""))?;

        // Drain stderr concurrently so ffmpeg never blocks on a full pipe.
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
            while let Ok(Some(line)) = lines.next_line().await {
                push_tail(&mut tail, line);
            }
            Vec::from(tail).join("\n")
        });

        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        let mut lines = BufReader::new(stdout).lines();
        let mut state = ProgressState::default();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(Interrupt::Cancelled),
                _ = &mut deadline => Err(Interrupt::TimedOut),
                line = lines.next_line() => Ok(line),
            };
            match next {
                Err(why) => {
                    stderr_task.abort();
                    return Err(self.stop(&mut child, why).await);
                }
                Ok(Ok(Some(line))) => {
                    if let Some((key, value)) = line.trim().split_once('=') {
                        state.update(key, value);
                        if key == "progress" {
                            on_time(state.out_time_secs);
                        }
                    }
                }
                Ok(Ok(None)) => break,
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "Failed reading ffmpeg progress");
                    break;
                }
            }
        }

        let waited: Result<std::io::Result<ExitStatus>, Interrupt> = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Interrupt::Cancelled),
            _ = &mut deadline => Err(Interrupt::TimedOut),
            status = child.wait() => Ok(status),
        };
        let status = match waited {
            Ok(status) => status
                .map_err(|e| ReelError::encoder(format!("failed to wait on ffmpeg: {e}"), ""))?,
            Err(why) => {
                stderr_task.abort();
                return Err(self.stop(&mut child, why).await);
            }
        };

        let diagnostics = stderr_task
            .await
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(ReelError::encoder(
                format!("ffmpeg exited with {status}"),
                diagnostics,
            ));
        }

        tracing::info!(
            out_time_secs = state.out_time_secs,
            reached_end = state.complete,
            "ffmpeg finished"
        );
        Ok(())
    }

    fn is_available(&self) -> bool {
        command_exists(&self.binary)
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}

fn push_tail(tail: &mut VecDeque<String>, line: String) {
    if tail.len() == STDERR_TAIL_LINES {
        tail.pop_front();
    }
    tail.push_back(line);
}

/// Accumulated `-progress` key/value state.
#[derive(Debug, Clone, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // Despite the name, ffmpeg reports out_time_ms in microseconds.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_progress_state() {
        let mut state = ProgressState::default();
        state.update("frame", "10");
        state.update("out_time_us", "2500000");
        assert_eq!(state.out_time_secs, 2.5);
        state.update("out_time_ms", "4000000");
        assert_eq!(state.out_time_secs, 4.0);
        state.update("out_time_us", "N/A");
        assert_eq!(state.out_time_secs, 4.0);
        state.update("progress", "continue");
        assert!(!state.complete);
        state.update("progress", "end");
        assert!(state.complete);
    }

    #[test]
    fn test_stderr_tail_is_bounded() {
        let mut tail = VecDeque::new();
        for i in 0..50 {
            push_tail(&mut tail, format!("line {i}"));
        }
        assert_eq!(tail.len(), STDERR_TAIL_LINES);
        assert_eq!(tail.front().map(String::as_str), Some("line 30"));
    }

    fn sh_backend() -> FfmpegBackend {
        FfmpegBackend::new("sh", Duration::from_secs(30))
    }

    fn script(body: &str) -> Vec<String> {
        vec!["-c".to_string(), body.to_string()]
    }

    #[tokio::test]
    async fn test_progress_lines_reach_callback() {
        let seen = Mutex::new(Vec::new());
        let on_time = |secs: f64| seen.lock().unwrap().push(secs);
        let args = script(
            "echo out_time_us=1000000; echo progress=continue; \
             echo out_time_us=2000000; echo progress=end",
        );
        sh_backend()
            .encode(&args, 2.0, &on_time, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1.0, 2.0]);
    }

    #[tokio::test]
    async fn test_nonzero_exit_carries_stderr_tail() {
        let args = script("for i in $(seq 1 30); do echo \"err $i\" >&2; done; exit 3");
        let err = sh_backend()
            .encode(&args, 1.0, &|_: f64| {}, &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            ReelError::EncoderFailure { diagnostics, .. } => {
                assert!(diagnostics.contains("err 30"));
                assert!(!diagnostics.contains("err 10\n"));
                assert_eq!(diagnostics.lines().count(), STDERR_TAIL_LINES);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancel_kills_encoder() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });
        let err = sh_backend()
            .encode(&script("sleep 30"), 1.0, &|_: f64| {}, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ReelError::Cancelled));
    }

    #[tokio::test]
    async fn test_timeout_kills_encoder() {
        let backend = FfmpegBackend::new("sh", Duration::from_millis(100));
        let err = backend
            .encode(&script("sleep 30"), 1.0, &|_: f64| {}, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ReelError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let backend = FfmpegBackend::new("reelsmith-no-such-encoder", Duration::from_secs(1));
        assert!(!backend.is_available());
        let err = backend
            .encode(&[], 1.0, &|_: f64| {}, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ReelError::EncoderFailure { .. }));
    }
}
