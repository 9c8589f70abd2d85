// Playlist expander - asks yt-dlp how many entries a playlist has
//
// Uses --flat-playlist so no per-entry metadata is fetched. Any failure
// (spawn, timeout, non-zero exit, unreadable output) is logged and reported
// as `PlaylistCount::Unknown`; it never aborts the run.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use super::errors::{DownloadError, Result};
use super::traits::{PlaylistCount, PlaylistProbe};
use super::utils::run_output_with_timeout;
use crate::config::EngineConfig;

/// Playlist probe backed by the yt-dlp command line
pub struct CliPlaylistProbe {
    program: PathBuf,
    prefix_args: Vec<String>,
    timeout: Duration,
}

impl CliPlaylistProbe {
    pub fn new(program: PathBuf, prefix_args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program,
            prefix_args,
            timeout,
        }
    }

    pub fn from_config(program: PathBuf, config: &EngineConfig) -> Self {
        Self::new(program, config.tool_prefix_args.clone(), config.probe_timeout())
    }

    fn build_args(&self, url: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.prefix_args.iter().map(OsString::from).collect();
        for arg in ["--flat-playlist", "-J", "--no-warnings", "--"] {
            args.push(arg.into());
        }
        args.push(url.into());
        args
    }

    async fn try_count(&self, url: &str) -> Result<usize> {
        let args = self.build_args(url);
        let output = run_output_with_timeout(self.program.as_os_str(), &args, self.timeout).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DownloadError::ExecutionError(format!(
                "exit {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        parse_playlist_count(&String::from_utf8_lossy(&output.stdout))
    }
}

#[async_trait]
impl PlaylistProbe for CliPlaylistProbe {
    fn name(&self) -> &'static str {
        "cli-yt-dlp"
    }

    async fn count_items(&self, playlist_url: &str) -> PlaylistCount {
        match self.try_count(playlist_url).await {
            Ok(count) => {
                debug!(url = playlist_url, count, "Playlist enumerated");
                PlaylistCount::Known(count)
            }
            Err(e) => {
                warn!(url = playlist_url, error = %e, "Could not get playlist count");
                PlaylistCount::Unknown
            }
        }
    }
}

/// Count entries in `--flat-playlist` output.
///
/// Accepts the single JSON document printed by `-J` (using `entries`, then
/// `playlist_count`), or one JSON object per line as printed by `-j`.
pub fn parse_playlist_count(stdout: &str) -> Result<usize> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(DownloadError::ParseError("empty output".to_string()));
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(entries) = json["entries"].as_array() {
            return Ok(entries.len());
        }
        if let Some(count) = json["playlist_count"].as_u64() {
            return Ok(count as usize);
        }
        if !trimmed.contains('\n') {
            return Err(DownloadError::ParseError("no entries in playlist JSON".to_string()));
        }
    }

    let mut count = 0;
    for line in trimmed.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match serde_json::from_str::<serde_json::Value>(line) {
            Ok(value) if value.is_object() => count += 1,
            _ => {
                return Err(DownloadError::ParseError(format!(
                    "unexpected line: {}",
                    line.chars().take(60).collect::<String>()
                )))
            }
        }
    }
    Ok(count)
}
