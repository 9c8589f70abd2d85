// yt-dlp text contract: what the engine recognises in the tool's stdout.
//
// Every function here works on one line at a time so it can be tested
// against captured output without spawning anything.

use regex::Regex;

/// Output template placed under the destination directory
pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Default binary name when nothing better is known
pub const DEFAULT_BINARY: &str = "yt-dlp";

/// Something recognisable on a single stdout line
#[derive(Debug, Clone, PartialEq)]
pub enum ToolLine {
    /// `[download]  42.3% of ...`
    Progress(f32),
    /// `[download] Downloading item 3 of 12` (older builds say "video")
    ItemHeader { index: usize, count: usize },
    /// `[download] <file> has already been downloaded`
    AlreadyDownloaded,
    /// `[download] Destination: <path>`
    Destination(String),
    /// `[Merger] Merging formats into "<file>"`
    Merging,
}

impl ToolLine {
    /// Whether this line marks one media item as done
    pub fn is_completion(&self) -> bool {
        match self {
            Self::Progress(p) => *p >= 100.0,
            Self::AlreadyDownloaded => true,
            _ => false,
        }
    }
}

/// Parse one line of yt-dlp output, e.g.
/// [download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32 (frag 29/454)
pub fn parse_progress_line(line: &str) -> Option<ToolLine> {
    lazy_static::lazy_static! {
        static ref PROGRESS_RE: Regex = Regex::new(r"\[download\]\s+(\d{1,3}(?:\.\d+)?)%").unwrap();
        static ref ITEM_RE: Regex = Regex::new(r"\[download\]\s+Downloading (?:item|video) (\d+) of (\d+)").unwrap();
        static ref DEST_RE: Regex = Regex::new(r"\[download\]\s+Destination:\s+(.+)").unwrap();
        static ref MERGE_RE: Regex = Regex::new(r"\[Merger?\]\s+Merging").unwrap();
        static ref ALREADY_RE: Regex = Regex::new(r"has already been downloaded").unwrap();
    }

    if let Some(caps) = PROGRESS_RE.captures(line) {
        let percent: f32 = caps.get(1)?.as_str().parse().ok()?;
        if !percent.is_finite() {
            return None;
        }
        return Some(ToolLine::Progress(percent.clamp(0.0, 100.0)));
    }

    if let Some(caps) = ITEM_RE.captures(line) {
        let index = caps.get(1)?.as_str().parse().ok()?;
        let count = caps.get(2)?.as_str().parse().ok()?;
        return Some(ToolLine::ItemHeader { index, count });
    }

    if ALREADY_RE.is_match(line) {
        return Some(ToolLine::AlreadyDownloaded);
    }

    if let Some(caps) = DEST_RE.captures(line) {
        let path = caps.get(1)?.as_str().trim();
        if path.is_empty() {
            return None;
        }
        return Some(ToolLine::Destination(path.to_string()));
    }

    if MERGE_RE.is_match(line) {
        return Some(ToolLine::Merging);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_progress_line() {
        let line = "[download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32 (frag 29/454)";
        assert_eq!(parse_progress_line(line), Some(ToolLine::Progress(6.2)));
    }

    #[test]
    fn test_integer_and_full_progress() {
        assert_eq!(parse_progress_line("[download] 50%"), Some(ToolLine::Progress(50.0)));
        let done = parse_progress_line("[download] 100% of   10.00MiB in 00:00:02 at 4.51MiB/s").unwrap();
        assert_eq!(done, ToolLine::Progress(100.0));
        assert!(done.is_completion());
        assert!(!ToolLine::Progress(99.9).is_completion());
    }

    #[test]
    fn test_item_header() {
        assert_eq!(
            parse_progress_line("[download] Downloading item 3 of 12"),
            Some(ToolLine::ItemHeader { index: 3, count: 12 })
        );
        assert_eq!(
            parse_progress_line("[download] Downloading video 1 of 2"),
            Some(ToolLine::ItemHeader { index: 1, count: 2 })
        );
    }

    #[test]
    fn test_already_downloaded() {
        let line = "[download] /music/Song.mp3 has already been downloaded";
        let parsed = parse_progress_line(line).unwrap();
        assert_eq!(parsed, ToolLine::AlreadyDownloaded);
        assert!(parsed.is_completion());
    }

    #[test]
    fn test_destination_and_merge() {
        assert_eq!(
            parse_progress_line("[download] Destination: /tmp/Clip.f137.mp4"),
            Some(ToolLine::Destination("/tmp/Clip.f137.mp4".to_string()))
        );
        assert_eq!(
            parse_progress_line("[Merger] Merging formats into \"/tmp/Clip.mp4\""),
            Some(ToolLine::Merging)
        );
    }

    #[test]
    fn test_unrelated_and_malformed_lines_ignored() {
        assert_eq!(parse_progress_line(""), None);
        assert_eq!(parse_progress_line("[youtube] A1: Downloading webpage"), None);
        assert_eq!(parse_progress_line("[download] NaN% of 3MiB"), None);
        assert_eq!(parse_progress_line("[download] Destination:   "), None);
    }
}
