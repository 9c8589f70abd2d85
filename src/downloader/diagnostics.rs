// Failure diagnostics - turns captured stderr into a short, readable reason
//
// Used when a work item exits non-zero: the status line carries a
// description plus the most relevant line of the tool's error output.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// Deleted, removed or otherwise gone
    Unavailable,
    /// Private video requiring authorization
    Private,
    /// Geographic restriction
    GeoBlocked,
    /// Age gate requiring login
    AgeRestricted,
    /// 429 or similar
    RateLimited,
    /// HTTP 403 Forbidden
    Forbidden,
    /// Timeouts, refused connections, DNS
    Network,
    /// The tool has no extractor for this URL
    UnsupportedUrl,
    /// Requested format code does not exist for this item
    FormatUnavailable,
    Unknown,
}

impl FailureReason {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Unavailable => "Video unavailable",
            Self::Private => "Private video",
            Self::GeoBlocked => "Not available in your country",
            Self::AgeRestricted => "Age-restricted content",
            Self::RateLimited => "Rate limited",
            Self::Forbidden => "Access denied (HTTP 403)",
            Self::Network => "Network problem",
            Self::UnsupportedUrl => "Unsupported URL",
            Self::FormatUnavailable => "Requested quality not available",
            Self::Unknown => "Unknown error",
        }
    }
}

/// Analyze error text and return the most specific reason that matches
pub fn diagnose_failure(stderr: &str) -> FailureReason {
    let lower = stderr.to_lowercase();

    if lower.contains("unsupported url") {
        return FailureReason::UnsupportedUrl;
    }

    if lower.contains("requested format is not available") {
        return FailureReason::FormatUnavailable;
    }

    if lower.contains("private video")
        || lower.contains("video is private")
        || lower.contains("sign in if you've been granted access")
    {
        return FailureReason::Private;
    }

    if lower.contains("sign in to confirm your age") || lower.contains("age-restricted") {
        return FailureReason::AgeRestricted;
    }

    if lower.contains("video unavailable")
        || lower.contains("video has been removed")
        || lower.contains("no longer available")
    {
        return FailureReason::Unavailable;
    }

    if lower.contains("not available in your country") || lower.contains("blocked in your country") {
        return FailureReason::GeoBlocked;
    }

    if lower.contains("429") || lower.contains("too many requests") || lower.contains("rate limit") {
        return FailureReason::RateLimited;
    }

    if lower.contains("403") || lower.contains("forbidden") {
        return FailureReason::Forbidden;
    }

    if lower.contains("timed out")
        || lower.contains("timeout")
        || lower.contains("connection refused")
        || lower.contains("network is unreachable")
        || lower.contains("name or service not known")
    {
        return FailureReason::Network;
    }

    FailureReason::Unknown
}

/// Pick the line worth showing and cut it to `max_chars`.
///
/// Prefers the last `ERROR:` line; otherwise the last non-empty line.
pub fn error_excerpt(stderr: &str, max_chars: usize) -> String {
    let picked = stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| stderr.lines().rev().map(str::trim).find(|l| !l.is_empty()))
        .unwrap_or("");

    if picked.is_empty() {
        return "no error output".to_string();
    }

    let mut excerpt: String = picked.chars().take(max_chars).collect();
    if picked.chars().count() > max_chars {
        excerpt.push_str("...");
    }
    excerpt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_detection() {
        let err = "ERROR: [youtube] A1: Video unavailable. This video has been removed";
        assert_eq!(diagnose_failure(err), FailureReason::Unavailable);
    }

    #[test]
    fn test_private_detection() {
        assert_eq!(diagnose_failure("ERROR: [youtube] x: Private video"), FailureReason::Private);
    }

    #[test]
    fn test_age_detection() {
        assert_eq!(
            diagnose_failure("Sign in to confirm your age. This video may be inappropriate"),
            FailureReason::AgeRestricted
        );
    }

    #[test]
    fn test_rate_limit_and_forbidden() {
        assert_eq!(diagnose_failure("HTTP Error 429: Too Many Requests"), FailureReason::RateLimited);
        assert_eq!(diagnose_failure("ERROR: HTTP Error 403: Forbidden"), FailureReason::Forbidden);
    }

    #[test]
    fn test_unsupported_and_format() {
        assert_eq!(
            diagnose_failure("ERROR: Unsupported URL: https://example.com/"),
            FailureReason::UnsupportedUrl
        );
        assert_eq!(
            diagnose_failure("ERROR: [youtube] x: Requested format is not available"),
            FailureReason::FormatUnavailable
        );
    }

    #[test]
    fn test_unknown_fallback() {
        assert_eq!(diagnose_failure("something odd"), FailureReason::Unknown);
        assert_eq!(diagnose_failure(""), FailureReason::Unknown);
    }

    #[test]
    fn test_excerpt_prefers_error_line() {
        let stderr = "WARNING: slow\nERROR: first\nWARNING: later\nERROR: second\n\n";
        assert_eq!(error_excerpt(stderr, 100), "ERROR: second");
    }

    #[test]
    fn test_excerpt_truncates() {
        let long = format!("ERROR: {}", "x".repeat(200));
        let excerpt = error_excerpt(&long, 20);
        assert_eq!(excerpt.chars().count(), 23);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn test_excerpt_fallbacks() {
        assert_eq!(error_excerpt("last words\n", 100), "last words");
        assert_eq!(error_excerpt("   \n", 100), "no error output");
    }
}
