// Downloader facade - accepts submissions and hands each run to a worker task

use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::errors::{DownloadError, Result};
use super::models::{DownloadRequest, EngineEvent, RunSummary};
use super::playlist::CliPlaylistProbe;
use super::supervisor::{CancelHandle, Supervisor};
use super::tools::ToolManager;
use super::traits::{PlaylistProbe, ProgressEmitter};
use crate::config::EngineConfig;

type ActiveSlot = Arc<Mutex<Option<CancelHandle>>>;

pub struct Downloader {
    config: Arc<EngineConfig>,
    probe: Arc<dyn PlaylistProbe>,
    active: ActiveSlot,
}

impl Downloader {
    pub fn new(config: EngineConfig) -> Self {
        let program = ToolManager::new(&config).resolve_program();
        let probe = Arc::new(CliPlaylistProbe::from_config(program, &config));
        Self {
            config: Arc::new(config),
            probe,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Replace the playlist enumeration backend
    pub fn with_probe(mut self, probe: Arc<dyn PlaylistProbe>) -> Self {
        debug!(probe = probe.name(), "Using custom playlist probe");
        self.probe = probe;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        lock_slot(&self.active).is_some()
    }

    /// Start a run on a background task. Must be called inside a tokio runtime.
    pub fn submit(&self, request: DownloadRequest) -> Result<RunHandle> {
        request.validate()?;

        let cancel = {
            let mut slot = lock_slot(&self.active);
            if slot.is_some() {
                return Err(DownloadError::RunInProgress);
            }
            let cancel = CancelHandle::new();
            *slot = Some(cancel.clone());
            cancel
        };

        let (emitter, events) = ProgressEmitter::channel();
        let supervisor = Supervisor::new(
            self.config.clone(),
            self.probe.clone(),
            emitter,
            cancel.clone(),
        );
        let guard = ActiveRunGuard {
            slot: self.active.clone(),
            cancel: cancel.clone(),
        };

        info!(urls = request.urls.len(), "Submitting download run");
        let worker = tokio::spawn(async move {
            let _guard = guard;
            supervisor.run(request).await
        });

        Ok(RunHandle {
            events,
            cancel,
            worker,
        })
    }

    /// Stop the active run, if any. Safe to call repeatedly.
    pub fn cancel(&self) {
        if let Some(cancel) = lock_slot(&self.active).as_ref() {
            if cancel.cancel() {
                info!("Stop requested");
            }
        }
    }
}

fn lock_slot(slot: &ActiveSlot) -> std::sync::MutexGuard<'_, Option<CancelHandle>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Frees the active-run slot when the worker ends, however it ends
struct ActiveRunGuard {
    slot: ActiveSlot,
    cancel: CancelHandle,
}

impl Drop for ActiveRunGuard {
    fn drop(&mut self) {
        let mut slot = lock_slot(&self.slot);
        if slot.as_ref().is_some_and(|active| active.same_run(&self.cancel)) {
            *slot = None;
        }
    }
}

/// Caller's side of one run
pub struct RunHandle {
    events: mpsc::UnboundedReceiver<EngineEvent>,
    cancel: CancelHandle,
    worker: JoinHandle<RunSummary>,
}

impl RunHandle {
    /// Next event, or `None` once the run is over and all events were read
    pub async fn next_event(&mut self) -> Option<EngineEvent> {
        self.events.recv().await
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Clonable stop switch, e.g. for a Ctrl-C handler
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Wait for the worker and return its summary
    pub async fn wait(self) -> Result<RunSummary> {
        self.worker
            .await
            .map_err(|e| DownloadError::ExecutionError(format!("Download worker failed: {}", e)))
    }
}
