// Command builder - the exact yt-dlp argument vector for one work item
//
// Pure: the same (WorkItem, DownloadRequest, EngineConfig) always produces
// the same vector.

use super::classifier::{is_playlist_root, is_primary_host};
use super::format_selector::{subtitle_language_code, BEST_PAIR, GENERIC_BEST};
use super::models::{DownloadRequest, Mode, WorkItem, WorkKind};
use crate::config::EngineConfig;
use crate::ytdlp::OUTPUT_TEMPLATE;

pub fn build_args(item: &WorkItem, request: &DownloadRequest, config: &EngineConfig) -> Vec<String> {
    let output = request.destination.join(OUTPUT_TEMPLATE);
    let mut args = vec![
        "-o".to_string(),
        output.to_string_lossy().to_string(),
        // one progress line per update instead of carriage-return redraws
        "--newline".to_string(),
        // keep going past broken playlist entries
        "--ignore-errors".to_string(),
    ];

    match item.kind {
        WorkKind::Single if is_playlist_root(&item.url) => {
            args.push("--playlist-items".to_string());
            args.push("1".to_string());
        }
        WorkKind::PartialPlaylist => {
            args.push("--playlist-start".to_string());
            args.push(item.start_index.to_string());
        }
        WorkKind::Single | WorkKind::FullPlaylist => {}
    }

    match request.mode {
        Mode::Audio => push_audio_args(&mut args, request),
        Mode::Video => push_video_args(&mut args, item, request, config),
    }

    // URLs never get parsed as options
    args.push("--".to_string());
    args.push(item.url.clone());
    args
}

fn push_audio_args(args: &mut Vec<String>, request: &DownloadRequest) {
    args.extend([
        "-x".to_string(),
        "--audio-format".to_string(),
        request.audio_format.as_str().to_string(),
        "--force-overwrites".to_string(),
    ]);
    if !request.audio_format.is_lossless() {
        args.push("--audio-quality".to_string());
        args.push(request.audio_quality.ytdlp_code().to_string());
    }
}

fn push_video_args(
    args: &mut Vec<String>,
    item: &WorkItem,
    request: &DownloadRequest,
    config: &EngineConfig,
) {
    args.push("--merge-output-format".to_string());
    args.push(config.merge_output_format.clone());

    if !is_primary_host(&item.url, &config.primary_hosts) {
        // numeric format codes are not portable across providers
        args.push("-f".to_string());
        args.push(GENERIC_BEST.to_string());
        return;
    }

    if request.fetch_subtitles {
        args.extend([
            "-f".to_string(),
            BEST_PAIR.to_string(),
            "--write-auto-sub".to_string(),
            "--sub-lang".to_string(),
            subtitle_language_code(&request.subtitle_language),
            "--convert-subs".to_string(),
            "srt".to_string(),
        ]);
    } else {
        args.push("-f".to_string());
        args.push(request.video_quality.format_spec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::format_selector::{AudioFormat, AudioQuality, VideoQuality};

    fn request() -> DownloadRequest {
        DownloadRequest::new(vec!["unused".to_string()]).with_destination("/downloads")
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_common_arguments() {
        let item = WorkItem::single("https://www.youtube.com/watch?v=A1");
        let args = build_args(&item, &request(), &EngineConfig::default());
        let output = value_after(&args, "-o").unwrap();
        assert!(output.starts_with("/downloads"));
        assert!(output.ends_with("%(title)s.%(ext)s"));
        assert!(args.contains(&"--newline".to_string()));
        assert!(args.contains(&"--ignore-errors".to_string()));
        assert_eq!(args.last().unwrap(), "https://www.youtube.com/watch?v=A1");
        assert_eq!(args[args.len() - 2], "--");
    }

    #[test]
    fn test_builder_is_deterministic() {
        let item = WorkItem::partial_playlist("https://www.youtube.com/watch?v=A&list=L", 4, 2);
        let req = request().with_mode(Mode::Audio);
        let config = EngineConfig::default();
        assert_eq!(build_args(&item, &req, &config), build_args(&item, &req, &config));
    }

    #[test]
    fn test_single_playlist_root_restricted_to_first_item() {
        let item = WorkItem::single("https://www.youtube.com/playlist?list=PL1");
        let args = build_args(&item, &request(), &EngineConfig::default());
        assert_eq!(value_after(&args, "--playlist-items"), Some("1"));

        let plain = WorkItem::single("https://www.youtube.com/watch?v=A1");
        let args = build_args(&plain, &request(), &EngineConfig::default());
        assert!(value_after(&args, "--playlist-items").is_none());
    }

    #[test]
    fn test_partial_playlist_passes_start() {
        let item = WorkItem::partial_playlist("https://www.youtube.com/watch?v=A&list=L&index=5", 16, 5);
        let args = build_args(&item, &request(), &EngineConfig::default());
        assert_eq!(value_after(&args, "--playlist-start"), Some("5"));
    }

    #[test]
    fn test_audio_quality_mapping() {
        let item = WorkItem::single("https://vimeo.com/1");
        let req = request()
            .with_mode(Mode::Audio)
            .with_audio(AudioFormat::Mp3, AudioQuality::K320);
        let args = build_args(&item, &req, &EngineConfig::default());
        assert!(args.contains(&"-x".to_string()));
        assert!(args.contains(&"--force-overwrites".to_string()));
        assert_eq!(value_after(&args, "--audio-format"), Some("mp3"));
        assert_eq!(value_after(&args, "--audio-quality"), Some("0"));
        assert!(value_after(&args, "-f").is_none());
    }

    #[test]
    fn test_lossless_audio_has_no_quality() {
        let item = WorkItem::single("https://vimeo.com/1");
        let req = request()
            .with_mode(Mode::Audio)
            .with_audio(AudioFormat::Wav, AudioQuality::K64);
        let args = build_args(&item, &req, &EngineConfig::default());
        assert_eq!(value_after(&args, "--audio-format"), Some("wav"));
        assert!(value_after(&args, "--audio-quality").is_none());
    }

    #[test]
    fn test_video_on_primary_host_uses_format_codes() {
        let item = WorkItem::single("https://www.youtube.com/watch?v=A1");
        let req = request().with_video_quality(VideoQuality::P720);
        let args = build_args(&item, &req, &EngineConfig::default());
        assert_eq!(value_after(&args, "--merge-output-format"), Some("mp4"));
        assert_eq!(value_after(&args, "-f"), Some("136+140"));

        let best = build_args(&item, &request(), &EngineConfig::default());
        assert_eq!(value_after(&best, "-f"), Some("bestvideo+bestaudio"));
    }

    #[test]
    fn test_video_with_subtitles_forces_best_pair() {
        let item = WorkItem::single("https://youtu.be/A1");
        let req = request()
            .with_video_quality(VideoQuality::P360)
            .with_subtitles(true, "sk");
        let args = build_args(&item, &req, &EngineConfig::default());
        assert_eq!(value_after(&args, "-f"), Some("bestvideo+bestaudio"));
        assert!(args.contains(&"--write-auto-sub".to_string()));
        assert_eq!(value_after(&args, "--sub-lang"), Some("sk"));
        assert_eq!(value_after(&args, "--convert-subs"), Some("srt"));
    }

    #[test]
    fn test_subtitle_label_reduced_to_code() {
        let item = WorkItem::single("https://www.youtube.com/watch?v=A1");
        let req = request().with_subtitles(true, "de (German)");
        let args = build_args(&item, &req, &EngineConfig::default());
        assert_eq!(value_after(&args, "--sub-lang"), Some("de"));
    }

    #[test]
    fn test_video_on_other_host_uses_generic_best() {
        let item = WorkItem::single("https://vimeo.com/12345");
        let req = request()
            .with_video_quality(VideoQuality::P1080)
            .with_subtitles(true, "en");
        let args = build_args(&item, &req, &EngineConfig::default());
        assert_eq!(value_after(&args, "-f"), Some("best"));
        assert!(!args.contains(&"--write-auto-sub".to_string()));
    }

    #[test]
    fn test_primary_hosts_are_configurable() {
        let item = WorkItem::single("https://vimeo.com/12345");
        let config = EngineConfig::default().with_primary_hosts(vec!["vimeo.com".to_string()]);
        let req = request().with_video_quality(VideoQuality::P480);
        let args = build_args(&item, &req, &config);
        assert_eq!(value_after(&args, "-f"), Some("135+140"));
    }
}
