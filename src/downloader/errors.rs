// Error types for the download engine

use thiserror::Error;

/// Result alias used across the engine.
pub type Result<T> = std::result::Result<T, DownloadError>;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// The request carried no URLs at all
    #[error("Please enter at least one URL")]
    EmptyRequest,

    /// One of the submitted URL entries is blank
    #[error("URL entry #{index} is blank")]
    BlankUrl { index: usize },

    /// A run is already active on this downloader
    #[error("A download is already in progress")]
    RunInProgress,

    /// yt-dlp (or the configured interpreter) could not be started
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// A bounded tool invocation did not finish in time
    #[error("Timed out after {0}s")]
    Timeout(u64),

    /// Tool output could not be understood
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Tool ran but reported failure
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// Invalid configuration value or file
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DownloadError {
    /// Map a spawn failure to a tool-not-found error where it applies.
    pub fn from_spawn(program: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::ToolNotFound(format!("{}: {}", program, err))
        } else {
            Self::ExecutionError(format!("Failed to start {}: {}", program, err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_url_display() {
        let err = DownloadError::BlankUrl { index: 2 };
        assert_eq!(err.to_string(), "URL entry #2 is blank");
    }

    #[test]
    fn test_spawn_not_found_maps_to_tool_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = DownloadError::from_spawn("yt-dlp", io);
        assert!(matches!(err, DownloadError::ToolNotFound(_)));
        assert!(err.to_string().contains("yt-dlp"));
    }

    #[test]
    fn test_spawn_other_error_maps_to_execution_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = DownloadError::from_spawn("yt-dlp", io);
        assert!(matches!(err, DownloadError::ExecutionError(_)));
    }
}
