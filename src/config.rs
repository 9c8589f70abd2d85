//! Engine configuration.
//!
//! Precedence, lowest first: built-in defaults, an optional JSON file,
//! `MEDIA_CATCHER_*` environment variables, then explicit `with_*` calls
//! (the CLI applies its flags this way).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::downloader::errors::{DownloadError, Result};

/// Explicit tool binary, e.g. `/usr/local/bin/yt-dlp`
pub const ENV_TOOL_PATH: &str = "MEDIA_CATCHER_YTDLP";
/// Run the tool as `<python> -m yt_dlp` instead of a binary
pub const ENV_PYTHON: &str = "MEDIA_CATCHER_PYTHON";
/// Comma-separated host list accepting fine-grained format codes
pub const ENV_PRIMARY_HOSTS: &str = "MEDIA_CATCHER_PRIMARY_HOSTS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tool binary; discovered on the system when `None`
    pub tool_path: Option<PathBuf>,
    /// Arguments placed before every invocation (e.g. `-m yt_dlp`)
    pub tool_prefix_args: Vec<String>,
    /// Hosts whose format codes are stable enough to request directly
    pub primary_hosts: Vec<String>,
    /// Bounded wait for playlist enumeration
    pub probe_timeout_secs: u64,
    /// Grace between graceful and forced termination on cancel
    pub termination_grace_millis: u64,
    /// Max characters of stderr shown in an error status
    pub error_excerpt_chars: usize,
    /// Container for merged video+audio output
    pub merge_output_format: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tool_path: None,
            tool_prefix_args: Vec::new(),
            primary_hosts: vec!["youtube.com".to_string(), "youtu.be".to_string()],
            probe_timeout_secs: 60,
            termination_grace_millis: 2000,
            error_excerpt_chars: 100,
            merge_output_format: "mp4".to_string(),
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DownloadError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded engine config");
        Ok(config)
    }

    /// Apply `MEDIA_CATCHER_*` overrides from the process environment
    pub fn apply_env(self) -> Self {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(python) = lookup(ENV_PYTHON).filter(|v| !v.trim().is_empty()) {
            self = self.with_python_module(python.trim());
        }
        if let Some(path) = lookup(ENV_TOOL_PATH).filter(|v| !v.trim().is_empty()) {
            self.tool_path = Some(PathBuf::from(path.trim()));
            self.tool_prefix_args.clear();
        }
        if let Some(hosts) = lookup(ENV_PRIMARY_HOSTS) {
            self.primary_hosts = hosts
                .split(',')
                .map(|h| h.trim().to_lowercase())
                .filter(|h| !h.is_empty())
                .collect();
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.merge_output_format.trim().is_empty() {
            return Err(DownloadError::Config("merge_output_format must not be empty".to_string()));
        }
        if self.probe_timeout_secs == 0 {
            return Err(DownloadError::Config("probe_timeout_secs must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn with_tool_path(mut self, path: Option<PathBuf>) -> Self {
        self.tool_path = path;
        self
    }

    pub fn with_tool_prefix_args(mut self, args: Vec<String>) -> Self {
        self.tool_prefix_args = args;
        self
    }

    /// Use `python -m yt_dlp` as the tool
    pub fn with_python_module(mut self, python: &str) -> Self {
        self.tool_path = Some(PathBuf::from(python));
        self.tool_prefix_args = vec!["-m".to_string(), "yt_dlp".to_string()];
        self
    }

    pub fn with_primary_hosts(mut self, hosts: Vec<String>) -> Self {
        self.primary_hosts = hosts;
        self
    }

    pub fn with_probe_timeout(mut self, seconds: u64) -> Self {
        self.probe_timeout_secs = seconds;
        self
    }

    pub fn with_termination_grace(mut self, millis: u64) -> Self {
        self.termination_grace_millis = millis;
        self
    }

    pub fn with_error_excerpt_chars(mut self, chars: usize) -> Self {
        self.error_excerpt_chars = chars;
        self
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn termination_grace(&self) -> Duration {
        Duration::from_millis(self.termination_grace_millis)
    }
}
