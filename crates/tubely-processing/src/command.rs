//! Scoped execution of external media tools.
//!
//! A tool call captures stdout and stderr, is bounded by an explicit timeout, and does not
//! return until the child has exited. On timeout the child is killed and reaped.

use std::ffi::OsStr;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

const BYTES_PER_MB: u64 = 1024 * 1024;
/// Captured stderr kept in error messages.
const STDERR_EXCERPT_LEN: usize = 2048;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("invalid tool path: {0}")]
    InvalidPath(String),
}

/// Captured output of a successful tool run.
#[derive(Debug)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Timeout that grows with the size of the input: `base + per_mb * ceil(size / 1 MiB)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolTimeout {
    pub base: Duration,
    pub per_mb: Duration,
}

impl ToolTimeout {
    pub fn new(base: Duration, per_mb: Duration) -> Self {
        Self { base, per_mb }
    }

    pub fn fixed(timeout: Duration) -> Self {
        Self {
            base: timeout,
            per_mb: Duration::ZERO,
        }
    }

    pub fn for_size(&self, size_bytes: u64) -> Duration {
        let mb = size_bytes.div_ceil(BYTES_PER_MB);
        let scaled = self
            .per_mb
            .checked_mul(u32::try_from(mb).unwrap_or(u32::MAX))
            .unwrap_or(Duration::MAX);
        self.base.saturating_add(scaled)
    }
}

/// Reject tool paths with shell metacharacters or traversal.
pub fn validate_tool_path(path: &str) -> Result<(), ToolError> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.is_empty() || path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(ToolError::InvalidPath(path.to_string()));
    }
    if path.contains("..") {
        return Err(ToolError::InvalidPath(path.to_string()));
    }
    Ok(())
}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

fn excerpt(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= STDERR_EXCERPT_LEN {
        return text.to_string();
    }
    let mut end = STDERR_EXCERPT_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Run `program` with `args`, waiting at most `timeout` for it to exit successfully.
#[tracing::instrument(skip(args), fields(process.executable.name = %program, timeout_ms = timeout.as_millis() as u64))]
pub async fn run_tool<I, S>(program: &str, args: I, timeout: Duration) -> Result<ToolOutput, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let start = Instant::now();
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ToolError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let waited = tokio::time::timeout(timeout, async {
        tokio::try_join!(child.wait(), drain(stdout), drain(stderr))
    })
    .await;

    let (status, stdout, stderr) = match waited {
        Ok(result) => result.map_err(|source| ToolError::Spawn {
            program: program.to_string(),
            source,
        })?,
        Err(_) => {
            // kill() also waits for the child, so nothing outlives this call
            if let Err(e) = child.kill().await {
                tracing::warn!(error = %e, program = %program, "Failed to kill timed out tool");
            }
            tracing::warn!(program = %program, ?timeout, "Tool timed out");
            return Err(ToolError::TimedOut {
                program: program.to_string(),
                timeout,
            });
        }
    };

    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
    if !status.success() {
        tracing::warn!(program = %program, %status, duration_ms, "Tool exited unsuccessfully");
        return Err(ToolError::Failed {
            program: program.to_string(),
            status,
            stderr: excerpt(&stderr),
        });
    }

    tracing::debug!(program = %program, duration_ms, "Tool finished");
    Ok(ToolOutput { stdout, stderr })
}
