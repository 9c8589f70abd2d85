// Downloader module - planning, command building and process supervision

pub mod classifier;
pub mod command;
pub mod diagnostics;
pub mod errors;
pub mod format_selector;
pub mod models;
pub mod orchestrator;
pub mod planner;
pub mod playlist;
pub mod progress;
pub mod supervisor;
pub mod tools;
pub mod traits;
pub mod utils;

pub use errors::{DownloadError, Result};
pub use format_selector::{AudioFormat, AudioQuality, VideoQuality};
pub use models::{
    DownloadRequest, EngineEvent, ExecutionPlan, Mode, ProgressEvent, RunOutcome, RunSummary,
    Severity, StatusEvent, WorkItem, WorkKind,
};
pub use orchestrator::{Downloader, RunHandle};
pub use playlist::CliPlaylistProbe;
pub use supervisor::CancelHandle;
pub use tools::{ToolInfo, ToolManager};
pub use traits::{PlaylistCount, PlaylistProbe, ProgressEmitter};
