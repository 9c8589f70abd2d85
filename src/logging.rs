//! Console logging setup.
//!
//! Logs go to stderr so stdout stays free for event output. `RUST_LOG`
//! overrides the verbosity chosen on the command line.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CRATE_TARGETS: [&str; 2] = ["media_catcher_lib", "media_catcher"];

/// Filter directives for a `-v` count: 0 = info, 1 = debug, 2+ = trace.
pub fn default_directives(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let mut directives = vec!["warn".to_string()];
    directives.extend(CRATE_TARGETS.iter().map(|target| format!("{}={}", target, level)));
    directives.join(",")
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init_logging(verbosity: u8) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity > 0);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_follow_verbosity() {
        assert_eq!(
            default_directives(0),
            "warn,media_catcher_lib=info,media_catcher=info"
        );
        assert!(default_directives(1).contains("media_catcher_lib=debug"));
        assert!(default_directives(5).contains("media_catcher=trace"));
    }

    #[test]
    fn test_second_init_is_reported() {
        init_logging(0);
        assert!(!init_logging(0));
    }
}
