pub mod config;
pub mod downloader;
pub mod logging;
pub mod ytdlp;

pub use config::EngineConfig;
pub use downloader::{
    CancelHandle, DownloadError, DownloadRequest, Downloader, EngineEvent, Mode, RunHandle,
    RunOutcome, RunSummary, Severity, StatusEvent,
};
