// Common data models for the download engine

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::errors::{DownloadError, Result};
use super::format_selector::{AudioFormat, AudioQuality, VideoQuality};

/// What the user wants out of each URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    Audio,
    #[default]
    Video,
}

/// One submission from the presentation side. Immutable once submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub urls: Vec<String>,
    pub mode: Mode,
    pub expand_playlists: bool,
    pub fetch_subtitles: bool,
    pub subtitle_language: String,
    pub audio_format: AudioFormat,
    pub audio_quality: AudioQuality,
    pub video_quality: VideoQuality,
    pub destination: PathBuf,
}

impl DownloadRequest {
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            urls,
            mode: Mode::default(),
            expand_playlists: false,
            fetch_subtitles: false,
            subtitle_language: "en".to_string(),
            audio_format: AudioFormat::default(),
            audio_quality: AudioQuality::default(),
            video_quality: VideoQuality::default(),
            destination: default_destination(),
        }
    }

    /// Build a request from a multi-line text box: one URL per line,
    /// surrounding whitespace trimmed, blank lines dropped.
    pub fn from_text(text: &str) -> Self {
        let urls = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self::new(urls)
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_expand_playlists(mut self, enabled: bool) -> Self {
        self.expand_playlists = enabled;
        self
    }

    pub fn with_subtitles(mut self, enabled: bool, language: impl Into<String>) -> Self {
        self.fetch_subtitles = enabled;
        self.subtitle_language = language.into();
        self
    }

    pub fn with_audio(mut self, format: AudioFormat, quality: AudioQuality) -> Self {
        self.audio_format = format;
        self.audio_quality = quality;
        self
    }

    pub fn with_video_quality(mut self, quality: VideoQuality) -> Self {
        self.video_quality = quality;
        self
    }

    pub fn with_destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = destination.into();
        self
    }

    /// URL list must be non-empty and contain no blank entries
    pub fn validate(&self) -> Result<()> {
        if self.urls.is_empty() {
            return Err(DownloadError::EmptyRequest);
        }
        if let Some(index) = self.urls.iter().position(|u| u.trim().is_empty()) {
            return Err(DownloadError::BlankUrl { index: index + 1 });
        }
        Ok(())
    }
}

/// Platform download directory, or the working directory when unknown
pub fn default_destination() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkKind {
    Single,
    FullPlaylist,
    PartialPlaylist,
}

impl WorkKind {
    pub fn is_multi_item(&self) -> bool {
        !matches!(self, Self::Single)
    }
}

/// One planned invocation of the external tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub url: String,
    pub kind: WorkKind,
    /// Media items this invocation is expected to produce (>= 1)
    pub item_count: usize,
    /// 1-based playlist position; only meaningful for `PartialPlaylist`
    pub start_index: usize,
}

impl WorkItem {
    pub fn single(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: WorkKind::Single,
            item_count: 1,
            start_index: 1,
        }
    }

    pub fn full_playlist(url: impl Into<String>, item_count: usize) -> Self {
        Self {
            url: url.into(),
            kind: WorkKind::FullPlaylist,
            item_count: item_count.max(1),
            start_index: 1,
        }
    }

    pub fn partial_playlist(url: impl Into<String>, item_count: usize, start_index: usize) -> Self {
        Self {
            url: url.into(),
            kind: WorkKind::PartialPlaylist,
            item_count: item_count.max(1),
            start_index: start_index.max(1),
        }
    }
}

/// Ordered work items plus the denominator used for "N of M"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    items: Vec<WorkItem>,
    total_item_count: usize,
}

impl ExecutionPlan {
    pub fn new(items: Vec<WorkItem>) -> Self {
        let total_item_count = items.iter().map(|item| item.item_count).sum();
        Self {
            items,
            total_item_count,
        }
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn total_item_count(&self) -> usize {
        self.total_item_count
    }
}

/// Percentage for the media item currently downloading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub percent: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Success,
    Error,
}

impl Severity {
    /// Colour name a UI can use for each tag
    pub fn color(&self) -> &'static str {
        match self {
            Self::Info => "white",
            Self::Warning => "orange",
            Self::Success => "green",
            Self::Error => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub message: String,
    pub severity: Severity,
}

impl StatusEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self { message: message.into(), severity: Severity::Info }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { message: message.into(), severity: Severity::Warning }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { message: message.into(), severity: Severity::Success }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { message: message.into(), severity: Severity::Error }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Finished,
    Stopped,
}

/// Carried by the terminal event of every run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub completed_items: usize,
    pub total_items: usize,
    pub failed_work_items: usize,
}

/// Everything the engine publishes to the presentation side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum EngineEvent {
    Progress(ProgressEvent),
    Status(StatusEvent),
    Finished(RunSummary),
}
