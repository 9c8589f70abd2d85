// FormatSelector - maps user-facing quality labels to yt-dlp selectors
//
// Handles:
// - Audio container choice (lossy vs lossless)
// - Audio quality tiers -> yt-dlp's inverted 0 (best) .. 9 (worst) scale
// - Video quality tiers -> fixed format-code pairs for fine-grained hosts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::DownloadError;

/// Format pair used when the user leaves video quality on "Best available"
pub const BEST_PAIR: &str = "bestvideo+bestaudio";

/// Generic selector for hosts that do not understand numeric format codes
pub const GENERIC_BEST: &str = "best";

/// m4a audio stream paired with a fixed video code
const AUDIO_PAIR_CODE: &str = "140";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Aac,
    M4a,
    Opus,
    Wav,
    Flac,
}

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Aac => "aac",
            Self::M4a => "m4a",
            Self::Opus => "opus",
            Self::Wav => "wav",
            Self::Flac => "flac",
        }
    }

    /// Lossless containers ignore the quality selector entirely
    pub fn is_lossless(&self) -> bool {
        matches!(self, Self::Wav | Self::Flac)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioFormat {
    type Err = DownloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "aac" => Ok(Self::Aac),
            "m4a" => Ok(Self::M4a),
            "opus" => Ok(Self::Opus),
            "wav" => Ok(Self::Wav),
            "flac" => Ok(Self::Flac),
            other => Err(DownloadError::Config(format!("Unknown audio format: {}", other))),
        }
    }
}

/// Audio bitrate tiers offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AudioQuality {
    #[serde(rename = "320K")]
    K320,
    #[default]
    #[serde(rename = "192K")]
    K192,
    #[serde(rename = "128K")]
    K128,
    #[serde(rename = "64K")]
    K64,
}

impl AudioQuality {
    pub const ALL: [AudioQuality; 4] = [Self::K320, Self::K192, Self::K128, Self::K64];

    pub fn label(&self) -> &'static str {
        match self {
            Self::K320 => "320K",
            Self::K192 => "192K",
            Self::K128 => "128K",
            Self::K64 => "64K",
        }
    }

    /// yt-dlp `--audio-quality` value. The scale is inverted: 0 is best.
    pub fn ytdlp_code(&self) -> &'static str {
        match self {
            Self::K320 => "0",
            Self::K192 => "2",
            Self::K128 => "5",
            Self::K64 => "9",
        }
    }
}

impl fmt::Display for AudioQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AudioQuality {
    type Err = DownloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        let normalized = normalized.trim_end_matches('K');
        match normalized {
            "320" => Ok(Self::K320),
            "192" => Ok(Self::K192),
            "128" => Ok(Self::K128),
            "64" => Ok(Self::K64),
            _ => Err(DownloadError::Config(format!("Unknown audio quality: {}", s.trim()))),
        }
    }
}

/// Video quality tiers; specific tiers map to fixed format codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoQuality {
    #[default]
    Best,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "360p")]
    P360,
}

impl VideoQuality {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Best => "Best available",
            Self::P1080 => "137 (1080p)",
            Self::P720 => "136 (720p)",
            Self::P480 => "135 (480p)",
            Self::P360 => "134 (360p)",
        }
    }

    /// Video-only format code, `None` for the best-available tier
    pub fn video_code(&self) -> Option<&'static str> {
        match self {
            Self::Best => None,
            Self::P1080 => Some("137"),
            Self::P720 => Some("136"),
            Self::P480 => Some("135"),
            Self::P360 => Some("134"),
        }
    }

    /// Full `-f` selector for hosts that accept format codes
    pub fn format_spec(&self) -> String {
        match self.video_code() {
            Some(code) => format!("{}+{}", code, AUDIO_PAIR_CODE),
            None => BEST_PAIR.to_string(),
        }
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for VideoQuality {
    type Err = DownloadError;

    /// Accepts "best", "Best available", "1080p", "137" or "137 (1080p)"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if lower == "best" || lower == "best available" {
            return Ok(Self::Best);
        }
        let head = lower.split_whitespace().next().unwrap_or("");
        match head {
            "137" | "1080p" => Ok(Self::P1080),
            "136" | "720p" => Ok(Self::P720),
            "135" | "480p" => Ok(Self::P480),
            "134" | "360p" => Ok(Self::P360),
            _ => Err(DownloadError::Config(format!("Unknown video quality: {}", s.trim()))),
        }
    }
}

/// Take the language code out of a label like "en (English)"
pub fn subtitle_language_code(label: &str) -> String {
    label
        .split_whitespace()
        .next()
        .unwrap_or("en")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_audio_tier_has_smallest_code() {
        let smallest = AudioQuality::ALL
            .iter()
            .map(|q| q.ytdlp_code())
            .min()
            .unwrap();
        assert_eq!(AudioQuality::K320.ytdlp_code(), smallest);
        assert_eq!(AudioQuality::K320.ytdlp_code(), "0");
        assert_eq!(AudioQuality::K64.ytdlp_code(), "9");
    }

    #[test]
    fn test_audio_quality_parsing() {
        assert_eq!("320K".parse::<AudioQuality>().unwrap(), AudioQuality::K320);
        assert_eq!("128k".parse::<AudioQuality>().unwrap(), AudioQuality::K128);
        assert_eq!("64".parse::<AudioQuality>().unwrap(), AudioQuality::K64);
        assert!("N/A (lossless)".parse::<AudioQuality>().is_err());
    }

    #[test]
    fn test_lossless_formats() {
        assert!(AudioFormat::Wav.is_lossless());
        assert!(AudioFormat::Flac.is_lossless());
        assert!(!AudioFormat::Mp3.is_lossless());
        assert!(!AudioFormat::Aac.is_lossless());
    }

    #[test]
    fn test_video_quality_labels_parse() {
        assert_eq!("Best available".parse::<VideoQuality>().unwrap(), VideoQuality::Best);
        assert_eq!("137 (1080p)".parse::<VideoQuality>().unwrap(), VideoQuality::P1080);
        assert_eq!("720p".parse::<VideoQuality>().unwrap(), VideoQuality::P720);
        assert_eq!("134".parse::<VideoQuality>().unwrap(), VideoQuality::P360);
        assert!("4k".parse::<VideoQuality>().is_err());
    }

    #[test]
    fn test_video_format_spec() {
        assert_eq!(VideoQuality::Best.format_spec(), "bestvideo+bestaudio");
        assert_eq!(VideoQuality::P1080.format_spec(), "137+140");
        assert_eq!(VideoQuality::P480.format_spec(), "135+140");
    }

    #[test]
    fn test_subtitle_language_code() {
        assert_eq!(subtitle_language_code("sk (Slovak)"), "sk");
        assert_eq!(subtitle_language_code("de"), "de");
        assert_eq!(subtitle_language_code("   "), "en");
    }
}
