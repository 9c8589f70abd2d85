// Process supervisor - runs the plan one work item at a time
//
// Per run: Running -> {Finished, Stopped}. Per item: starting (spawn),
// streaming (stdout lines), settling (exit code + stderr). At most one child
// is alive at any moment and every exit path reaps it.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::BufReader;
use tokio::process::{ChildStderr, Command as TokioCommand};
use tokio::sync::Notify;
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use super::command::build_args;
use super::diagnostics::{diagnose_failure, error_excerpt, FailureReason};
use super::errors::{DownloadError, Result};
use super::models::{DownloadRequest, RunOutcome, RunSummary, StatusEvent, WorkItem};
use super::planner::build_plan;
use super::progress::ProgressTracker;
use super::tools::ToolManager;
use super::traits::{PlaylistProbe, ProgressEmitter};
use super::utils::{read_line_lossy, terminate_child};
use crate::config::EngineConfig;
use crate::ytdlp::{parse_progress_line, ToolLine};

struct CancelState {
    requested: AtomicBool,
    notify: Notify,
}

/// Shared stop switch for one run. Cloning shares the same switch.
#[derive(Clone)]
pub struct CancelHandle {
    state: Arc<CancelState>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self {
            state: Arc::new(CancelState {
                requested: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Request a stop. Returns `false` if one was already requested.
    pub fn cancel(&self) -> bool {
        if self.state.requested.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.state.notify.notify_waiters();
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.requested.load(Ordering::SeqCst)
    }

    /// Resolves once a stop has been requested
    pub async fn cancelled(&self) {
        loop {
            let notified = self.state.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    pub fn same_run(&self, other: &CancelHandle) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

enum ItemOutcome {
    Succeeded,
    Failed(String),
    Cancelled,
}

pub struct Supervisor {
    config: Arc<EngineConfig>,
    probe: Arc<dyn PlaylistProbe>,
    emitter: ProgressEmitter,
    cancel: CancelHandle,
}

impl Supervisor {
    pub fn new(
        config: Arc<EngineConfig>,
        probe: Arc<dyn PlaylistProbe>,
        emitter: ProgressEmitter,
        cancel: CancelHandle,
    ) -> Self {
        Self {
            config,
            probe,
            emitter,
            cancel,
        }
    }

    /// Plan and execute the request. Always ends with exactly one
    /// `Finished` event carrying the returned summary.
    pub async fn run(self, request: DownloadRequest) -> RunSummary {
        info!(urls = request.urls.len(), mode = ?request.mode, "Run started");

        let plan = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            plan = build_plan(&request.urls, request.expand_playlists, self.probe.as_ref(), &self.emitter) => Some(plan),
        };

        let mut tracker = ProgressTracker::new(plan.as_ref().map_or(0, |p| p.total_item_count()));
        let mut failed = 0;
        let mut stopped = plan.is_none();

        for item in plan.iter().flat_map(|p| p.items()) {
            if self.cancel.is_cancelled() {
                stopped = true;
                break;
            }

            match self.run_item(item, &request, &mut tracker).await {
                ItemOutcome::Succeeded => {
                    tracker.settle();
                    self.emitter.status(StatusEvent::success(format!(
                        "✅ Done ({}/{})",
                        tracker.completed(),
                        tracker.total()
                    )));
                }
                ItemOutcome::Failed(message) => {
                    tracker.settle();
                    failed += 1;
                    self.emitter.status(StatusEvent::error(message));
                }
                ItemOutcome::Cancelled => {
                    stopped = true;
                    break;
                }
            }
        }

        let outcome = if stopped {
            self.emitter.status(StatusEvent::warning("⏹️ Download stopped by user"));
            RunOutcome::Stopped
        } else {
            RunOutcome::Finished
        };

        let summary = RunSummary {
            outcome,
            completed_items: tracker.completed(),
            total_items: tracker.total(),
            failed_work_items: failed,
        };
        info!(
            outcome = ?summary.outcome,
            completed = summary.completed_items,
            total = summary.total_items,
            failed = summary.failed_work_items,
            "Run finished"
        );
        self.emitter.finished(summary.clone());
        summary
    }

    async fn run_item(
        &self,
        item: &WorkItem,
        request: &DownloadRequest,
        tracker: &mut ProgressTracker,
    ) -> ItemOutcome {
        let program = ToolManager::new(&self.config).resolve_program();
        let mut args: Vec<OsString> = self.config.tool_prefix_args.iter().map(OsString::from).collect();
        args.extend(build_args(item, request, &self.config).into_iter().map(OsString::from));

        match self.stream_item(&program, &args, item, tracker).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(url = %item.url, error = %e, "Work item could not run");
                ItemOutcome::Failed(format!("❌ Exception: {}", e))
            }
        }
    }

    async fn stream_item(
        &self,
        program: &Path,
        args: &[OsString],
        item: &WorkItem,
        tracker: &mut ProgressTracker,
    ) -> Result<ItemOutcome> {
        let label = program.to_string_lossy().to_string();
        let announce = tracker.begin(item);

        debug!(program = %label, ?args, "Starting work item");
        let mut child = TokioCommand::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DownloadError::from_spawn(&label, e))?;

        for event in announce {
            self.emitter.emit(event);
        }

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::ExecutionError("Failed to capture stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::ExecutionError("Failed to capture stderr".to_string()))?;
        let stderr_lines = Arc::new(Mutex::new(Vec::new()));
        let mut stderr_task = tokio::spawn(collect_stderr(stderr, stderr_lines.clone()));

        let grace = self.config.termination_grace();
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();

        loop {
            let read = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    stderr_task.abort();
                    if let Err(e) = terminate_child(&mut child, grace).await {
                        warn!(error = %e, "Failed to terminate child on stop");
                    }
                    debug!(url = %item.url, "Work item stopped while streaming");
                    return Ok(ItemOutcome::Cancelled);
                }
                read = read_line_lossy(&mut reader, &mut buf) => read,
            };

            match read {
                Ok(Some(line)) => match parse_progress_line(&line) {
                    Some(parsed) => {
                        if let ToolLine::Destination(path) = &parsed {
                            debug!(url = %item.url, path = %path, "Writing file");
                        }
                        for event in tracker.observe(&parsed) {
                            self.emitter.emit(event);
                        }
                    }
                    None => trace!(line = %line, "yt-dlp"),
                },
                Ok(None) => break,
                Err(e) => {
                    stderr_task.abort();
                    if let Err(kill_err) = terminate_child(&mut child, grace).await {
                        warn!(error = %kill_err, "Failed to terminate child after read error");
                    }
                    return Err(e.into());
                }
            }
        }

        // stdout closed; the process may still be finishing up
        let status = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                stderr_task.abort();
                if let Err(e) = terminate_child(&mut child, grace).await {
                    warn!(error = %e, "Failed to terminate child on stop");
                }
                return Ok(ItemOutcome::Cancelled);
            }
            status = child.wait() => status?,
        };
        // a grandchild can keep stderr open after the child exits
        let drained = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                stderr_task.abort();
                debug!(url = %item.url, "Work item stopped while settling");
                return Ok(ItemOutcome::Cancelled);
            }
            drained = timeout(grace, &mut stderr_task) => drained.is_ok(),
        };
        if !drained {
            warn!(url = %item.url, "stderr still open after exit, using what was read");
            stderr_task.abort();
        }
        let stderr_text = stderr_lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .join("\n");

        if self.cancel.is_cancelled() {
            return Ok(ItemOutcome::Cancelled);
        }

        if status.success() {
            debug!(url = %item.url, "Work item succeeded");
            return Ok(ItemOutcome::Succeeded);
        }

        let reason = diagnose_failure(&stderr_text);
        let excerpt = error_excerpt(&stderr_text, self.config.error_excerpt_chars);
        warn!(url = %item.url, code = ?status.code(), reason = ?reason, "Work item failed");

        let message = match reason {
            FailureReason::Unknown => format!("❌ Error: {}", excerpt),
            known => format!("❌ Error: {} | {}", known.description(), excerpt),
        };
        Ok(ItemOutcome::Failed(message))
    }
}

async fn collect_stderr(stderr: ChildStderr, lines: Arc<Mutex<Vec<String>>>) {
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();
    while let Ok(Some(line)) = read_line_lossy(&mut reader, &mut buf).await {
        lines.lock().unwrap_or_else(PoisonError::into_inner).push(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cancel_is_idempotent() {
        let handle = CancelHandle::new();
        assert!(!handle.is_cancelled());
        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_clones_share_state() {
        let handle = CancelHandle::new();
        let clone = handle.clone();
        clone.cancel();
        assert!(handle.is_cancelled());
        assert!(handle.same_run(&clone));
        assert!(!handle.same_run(&CancelHandle::new()));
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiter() {
        let handle = CancelHandle::new();
        let waiter = handle.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_returns_immediately_when_already_set() {
        let handle = CancelHandle::new();
        handle.cancel();
        tokio::time::timeout(Duration::from_millis(100), handle.cancelled())
            .await
            .expect("already cancelled");
    }
}
