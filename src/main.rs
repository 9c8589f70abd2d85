use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::{debug, error};

use media_catcher_lib::config::EngineConfig;
use media_catcher_lib::downloader::{
    AudioFormat, AudioQuality, DownloadRequest, Downloader, EngineEvent, Mode, RunOutcome,
    Severity, ToolManager, VideoQuality,
};
use media_catcher_lib::logging::init_logging;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMode {
    Audio,
    Video,
}

impl From<CliMode> for Mode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Audio => Mode::Audio,
            CliMode::Video => Mode::Video,
        }
    }
}

/// Download videos, audio and playlists through yt-dlp
#[derive(Parser, Debug)]
#[command(name = "media-catcher", version, about, long_about = None)]
struct Args {
    /// URLs to download, processed in order
    urls: Vec<String>,

    /// Read URLs from a text file, one per line
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value = "video")]
    mode: CliMode,

    /// Download whole playlists instead of the first video only
    #[arg(short, long)]
    playlist: bool,

    /// Fetch auto-generated subtitles (video mode)
    #[arg(long)]
    subs: bool,

    /// Subtitle language, e.g. "en" or "de (German)"
    #[arg(long, default_value = "en")]
    sub_lang: String,

    /// mp3, aac, m4a, opus, wav or flac
    #[arg(long, default_value = "mp3")]
    audio_format: AudioFormat,

    /// 320K, 192K, 128K or 64K (ignored for lossless formats)
    #[arg(long, default_value = "192K")]
    audio_quality: AudioQuality,

    /// best, 1080p, 720p, 480p or 360p
    #[arg(long, default_value = "best")]
    video_quality: VideoQuality,

    /// Destination directory (defaults to the Downloads folder)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// JSON engine configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to the yt-dlp binary
    #[arg(long, value_name = "PATH")]
    tool: Option<PathBuf>,

    /// Run yt-dlp as a module of this Python interpreter
    #[arg(long, value_name = "PYTHON", conflicts_with = "tool")]
    python: Option<String>,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,

    /// Report where yt-dlp was found and exit
    #[arg(long)]
    check_tool: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn build_config(args: &Args) -> media_catcher_lib::downloader::Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    }
    .apply_env();

    if let Some(tool) = &args.tool {
        config = config.with_tool_path(Some(tool.clone())).with_tool_prefix_args(Vec::new());
    }
    if let Some(python) = &args.python {
        config = config.with_python_module(python);
    }
    config.validate()?;
    Ok(config)
}

fn build_request(args: &Args) -> std::io::Result<DownloadRequest> {
    let mut text = args.urls.join("\n");
    if let Some(path) = &args.input {
        text.push('\n');
        text.push_str(&std::fs::read_to_string(path)?);
    }

    let mut request = DownloadRequest::from_text(&text)
        .with_mode(args.mode.into())
        .with_expand_playlists(args.playlist)
        .with_subtitles(args.subs, args.sub_lang.clone())
        .with_audio(args.audio_format, args.audio_quality)
        .with_video_quality(args.video_quality);
    if let Some(output) = &args.output {
        request = request.with_destination(output.clone());
    }
    Ok(request)
}

fn print_event(event: &EngineEvent, json: bool) {
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => error!(error = %e, "Could not serialise event"),
        }
        return;
    }

    match event {
        EngineEvent::Progress(progress) => {
            eprint!("\r{:5.1}%", progress.percent);
            let _ = std::io::stderr().flush();
        }
        EngineEvent::Status(status) => {
            eprint!("\r");
            match status.severity {
                Severity::Error | Severity::Warning => eprintln!("{}", status.message),
                Severity::Info | Severity::Success => println!("{}", status.message),
            }
        }
        EngineEvent::Finished(summary) => {
            println!(
                "Finished: {}/{} items, {} failed{}",
                summary.completed_items,
                summary.total_items,
                summary.failed_work_items,
                if summary.outcome == RunOutcome::Stopped { " (stopped)" } else { "" }
            );
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::from(2);
        }
    };

    if args.check_tool {
        let info = ToolManager::new(&config).get_tool_info();
        if args.json {
            println!("{}", serde_json::to_string(&info).unwrap_or_default());
        } else {
            let path = info
                .path
                .as_ref()
                .map_or_else(|| "not found".to_string(), |p| p.display().to_string());
            println!("{}: {}", info.name, path);
            println!("version: {}", info.version.as_deref().unwrap_or("unavailable"));
        }
        return if info.is_available { ExitCode::SUCCESS } else { ExitCode::FAILURE };
    }

    let request = match build_request(&args) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("❌ Cannot read URL list: {}", e);
            return ExitCode::from(2);
        }
    };
    debug!(?request, "Request built");

    let downloader = Downloader::new(config);
    let mut run = match downloader.submit(request) {
        Ok(run) => run,
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::from(2);
        }
    };

    let cancel = run.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    while let Some(event) = run.next_event().await {
        print_event(&event, args.json);
    }

    match run.wait().await {
        Ok(summary) if summary.outcome == RunOutcome::Stopped => ExitCode::from(130),
        Ok(summary) if summary.failed_work_items > 0 => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Run did not complete");
            ExitCode::FAILURE
        }
    }
}
