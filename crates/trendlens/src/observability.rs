//! Logging and tracing setup.
//!
//! Human-readable logs always go to stderr. When a log location is
//! configured, the same events are also written as JSON lines through a
//! non-blocking file appender.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Explicit log file path.
pub const LOG_PATH_ENV: &str = "TRENDLENS_LOG_PATH";

/// Log directory; the file inside is [`LOG_FILE_NAME`].
pub const LOG_DIR_ENV: &str = "TRENDLENS_LOG_DIR";

/// File name used when only a directory is configured.
pub const LOG_FILE_NAME: &str = "trendlens.jsonl";

/// Where logs go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// JSONL log file, if file logging is enabled.
    pub log_file: Option<PathBuf>,
}

impl ObservabilityConfig {
    /// Resolve the log file from the environment, falling back to the
    /// configured directory.
    pub fn from_env_with_overrides(config_log_dir: Option<PathBuf>) -> Self {
        let path = std::env::var_os(LOG_PATH_ENV).map(PathBuf::from);
        let dir = std::env::var_os(LOG_DIR_ENV).map(PathBuf::from);
        Self {
            log_file: resolve_log_file(path, dir, config_log_dir),
        }
    }
}

/// `TRENDLENS_LOG_PATH` > `TRENDLENS_LOG_DIR` > config `log_dir`.
fn resolve_log_file(
    path: Option<PathBuf>,
    env_dir: Option<PathBuf>,
    config_dir: Option<PathBuf>,
) -> Option<PathBuf> {
    let non_empty = |p: &PathBuf| !p.as_os_str().is_empty();
    path.filter(non_empty).or_else(|| {
        env_dir
            .filter(non_empty)
            .or(config_dir)
            .map(|dir| dir.join(LOG_FILE_NAME))
    })
}

/// Filter directive from CLI flags, `RUST_LOG` and the configured level.
///
/// `--quiet` and `-v` win over `RUST_LOG`, which wins over the config.
fn filter_directive(quiet: bool, verbose: u8, level: &str, rust_log: Option<&str>) -> String {
    if quiet {
        return "error".to_string();
    }
    match verbose {
        0 => rust_log
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(level)
            .to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Build the env filter for this run.
pub fn env_filter(quiet: bool, verbose: u8, level: &str) -> EnvFilter {
    let rust_log = std::env::var("RUST_LOG").ok();
    let directive = filter_directive(quiet, verbose, level, rust_log.as_deref());
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(level))
}

/// Keeps the file writer flushing until dropped.
#[derive(Debug)]
pub struct ObservabilityGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber.
pub fn init_observability(
    config: &ObservabilityConfig,
    filter: EnvFilter,
) -> anyhow::Result<ObservabilityGuard> {
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard) = match config.log_file.as_deref() {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(open_appender(path)?);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    Ok(ObservabilityGuard { _file: guard })
}

fn open_appender(path: &Path) -> anyhow::Result<tracing_appender::rolling::RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("log path has no file name: {}", path.display()))?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    Ok(tracing_appender::rolling::never(dir, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let file = resolve_log_file(
            Some(PathBuf::from("/var/log/t.jsonl")),
            Some(PathBuf::from("/env")),
            Some(PathBuf::from("/cfg")),
        );
        assert_eq!(file, Some(PathBuf::from("/var/log/t.jsonl")));
    }

    #[test]
    fn env_dir_beats_config_dir() {
        let file = resolve_log_file(None, Some(PathBuf::from("/env")), Some(PathBuf::from("/cfg")));
        assert_eq!(file, Some(PathBuf::from("/env").join(LOG_FILE_NAME)));
        let file = resolve_log_file(None, None, Some(PathBuf::from("/cfg")));
        assert_eq!(file, Some(PathBuf::from("/cfg").join(LOG_FILE_NAME)));
    }

    #[test]
    fn no_location_disables_file_logging() {
        assert_eq!(resolve_log_file(None, None, None), None);
        assert_eq!(resolve_log_file(Some(PathBuf::new()), None, None), None);
    }

    #[test]
    fn flags_override_rust_log() {
        assert_eq!(filter_directive(true, 2, "info", Some("trace")), "error");
        assert_eq!(filter_directive(false, 1, "info", Some("warn")), "debug");
        assert_eq!(filter_directive(false, 3, "info", None), "trace");
        assert_eq!(filter_directive(false, 0, "info", Some("trendlens=debug")), "trendlens=debug");
        assert_eq!(filter_directive(false, 0, "warn", Some("  ")), "warn");
        assert_eq!(filter_directive(false, 0, "warn", None), "warn");
    }
}
