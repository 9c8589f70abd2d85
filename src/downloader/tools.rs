// Tool discovery - where yt-dlp lives and which version it is

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::config::EngineConfig;
use crate::ytdlp::DEFAULT_BINARY;

/// Install locations checked before falling back to PATH
const COMMON_PATHS: &[&str] = &[
    "/opt/homebrew/bin/yt-dlp", // Homebrew on Apple Silicon
    "/usr/local/bin/yt-dlp",    // Homebrew on Intel Mac, pip --user installs
    "/usr/bin/yt-dlp",          // System installation
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: Option<String>,
    pub path: Option<PathBuf>,
    pub is_available: bool,
}

pub struct ToolManager<'a> {
    config: &'a EngineConfig,
}

impl<'a> ToolManager<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Program to spawn: configured path, a known install, PATH, or the bare name
    pub fn resolve_program(&self) -> PathBuf {
        self.detect_path()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY))
    }

    fn detect_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config.tool_path {
            return Some(path.clone());
        }

        for path in COMMON_PATHS {
            if Path::new(path).exists() {
                return Some(PathBuf::from(path));
            }
        }

        which::which(DEFAULT_BINARY).ok()
    }

    /// Full status including a `--version` probe
    pub fn get_tool_info(&self) -> ToolInfo {
        let path = self.detect_path();
        let version = path.as_deref().and_then(|p| self.get_version(p));
        debug!(path = ?path, version = ?version, "Tool detection finished");

        ToolInfo {
            name: DEFAULT_BINARY.to_string(),
            is_available: version.is_some(),
            version,
            path,
        }
    }

    fn get_version(&self, program: &Path) -> Option<String> {
        match Command::new(program)
            .args(&self.config.tool_prefix_args)
            .arg("--version")
            .output()
        {
            Ok(output) if output.status.success() => {
                let out = String::from_utf8_lossy(&output.stdout).trim().to_string();
                (!out.is_empty()).then_some(out)
            }
            _ => None,
        }
    }
}
