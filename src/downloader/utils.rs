// Process helpers shared by the expander and the supervisor

use std::ffi::OsStr;
use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio::process::{Child, Command as TokioCommand};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::errors::{DownloadError, Result};

/// Run a command to completion with a bounded wait.
/// On timeout the child is killed and reaped before returning.
pub async fn run_output_with_timeout<S: AsRef<OsStr>>(
    program: &OsStr,
    args: &[S],
    limit: Duration,
) -> Result<Output> {
    let label = program.to_string_lossy().to_string();
    let mut child = TokioCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| DownloadError::from_spawn(&label, e))?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| DownloadError::ExecutionError(format!("Failed to capture stdout from {}", label)))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| DownloadError::ExecutionError(format!("Failed to capture stderr from {}", label)))?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });

    match timeout(limit, child.wait()).await {
        Ok(status) => {
            let status = status?;
            let stdout = join_output(stdout_task).await?;
            let stderr = join_output(stderr_task).await?;
            Ok(Output { status, stdout, stderr })
        }
        Err(_) => {
            warn!(program = %label, secs = limit.as_secs(), "Command timed out, killing");
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(DownloadError::Timeout(limit.as_secs()))
        }
    }
}

async fn join_output(task: tokio::task::JoinHandle<std::io::Result<Vec<u8>>>) -> Result<Vec<u8>> {
    task.await
        .map_err(|e| DownloadError::ExecutionError(format!("Output reader failed: {}", e)))?
        .map_err(DownloadError::from)
}

/// Read one line, replacing invalid UTF-8 instead of failing.
/// `Ok(None)` means the stream is closed.
pub async fn read_line_lossy<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let read = reader.read_until(b'\n', buf).await?;
    if read == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(&buf[..]);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Ask the child to exit, then force it after `grace`. Always reaps.
pub async fn terminate_child(child: &mut Child, grace: Duration) -> std::io::Result<ExitStatus> {
    if let Some(status) = child.try_wait()? {
        return Ok(status);
    }

    send_graceful_signal(child).await;

    match timeout(grace, child.wait()).await {
        Ok(status) => status,
        Err(_) => {
            warn!(pid = ?child.id(), "Child ignored graceful stop, killing");
            child.kill().await?;
            child.wait().await
        }
    }
}

#[cfg(unix)]
async fn send_graceful_signal(child: &Child) {
    let Some(pid) = child.id() else {
        return;
    };
    debug!(pid, "Sending SIGTERM");
    let sent = TokioCommand::new("kill")
        .args(["-TERM", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    if let Err(e) = sent {
        warn!(pid, error = %e, "Could not send SIGTERM");
    }
}

#[cfg(not(unix))]
async fn send_graceful_signal(child: &mut Child) {
    // no graceful signal on this platform; the forced kill follows immediately
    let _ = child.start_kill();
}
