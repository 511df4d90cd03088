//! Logging setup for the tile tools.
//!
//! Console output goes to stderr so a tool's stdout stays clean for its
//! summary. When the config asks for it, a JSON log file is written as well.
//! `RUST_LOG` always takes precedence over the configured level.

use std::fs::File;
use std::path::{Path, PathBuf};

use nebula_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_FILTER: &str = "info";

/// Name of the JSON log file inside the log directory.
pub const LOG_FILE_NAME: &str = "nebula-tile.log";

/// Initialize the global tracing subscriber.
///
/// `log_dir` is only used when `config.debug.log_to_file` is set. Failing to
/// create the log file falls back to console-only logging.
///
/// ```no_run
/// use nebula_config::Config;
/// use nebula_log::init_logging;
///
/// let mut config = Config::default();
/// config.debug.log_to_file = true;
/// init_logging(Some(std::path::Path::new("./logs")), Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, config: Option<&Config>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_string(config)));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    let wants_file = config.is_some_and(|c| c.debug.log_to_file);
    if wants_file
        && let Some(log_dir) = log_dir
        && let Some(log_file) = create_log_file(log_dir)
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// Filter directive taken from the config, or [`DEFAULT_FILTER`].
pub fn filter_string(config: Option<&Config>) -> String {
    config
        .map(|c| c.debug.log_level.trim())
        .filter(|level| !level.is_empty())
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

/// Path of the JSON log file for a log directory.
pub fn log_file_path(log_dir: &Path) -> PathBuf {
    log_dir.join(LOG_FILE_NAME)
}

fn create_log_file(log_dir: &Path) -> Option<File> {
    std::fs::create_dir_all(log_dir).ok()?;
    File::create(log_file_path(log_dir)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_defaults_to_info() {
        assert_eq!(filter_string(None), "info");

        let mut config = Config::default();
        config.debug.log_level = "  ".to_string();
        assert_eq!(filter_string(Some(&config)), "info");
    }

    #[test]
    fn test_filter_from_config() {
        let mut config = Config::default();
        config.debug.log_level = "warn,nebula_tile=trace".to_string();
        let filter = filter_string(Some(&config));
        assert_eq!(filter, "warn,nebula_tile=trace");
        assert!(EnvFilter::try_new(&filter).is_ok());
    }

    #[test]
    fn test_log_file_created_in_missing_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_dir = temp_dir.path().join("logs");
        assert!(create_log_file(&log_dir).is_some());
        assert!(log_file_path(&log_dir).exists());
        assert_eq!(log_file_path(&log_dir).file_name().unwrap(), "nebula-tile.log");
    }
}
