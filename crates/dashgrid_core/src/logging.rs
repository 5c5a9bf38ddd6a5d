//! Structured logging for Dashgrid hosts.
//!
//! Console output goes to stdout or stderr (the CLI keeps stdout for JSON).
//! An optional daily-rotated file receives the same events. The filter comes
//! from an explicit directive, then `DASHGRID_LOG`, then `RUST_LOG`, then a
//! build-type default.

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "dashgrid";

/// Stream console events are written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleTarget {
    #[default]
    Stdout,
    Stderr,
}

impl ConsoleTarget {
    fn is_terminal(self) -> bool {
        match self {
            Self::Stdout => atty::is(atty::Stream::Stdout),
            Self::Stderr => atty::is(atty::Stream::Stderr),
        }
    }

    fn writer(self) -> BoxMakeWriter {
        match self {
            Self::Stdout => BoxMakeWriter::new(std::io::stdout),
            Self::Stderr => BoxMakeWriter::new(std::io::stderr),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Directory for rotated log files. `None` logs to the console only.
    pub log_dir: Option<PathBuf>,
    pub console: ConsoleTarget,
    /// Skip the log file when the console is an interactive terminal.
    pub console_only_on_tty: bool,
    /// Filter directive overriding the environment.
    pub log_filter: Option<String>,
}

impl LogConfig {
    /// Console on stdout plus a log file in `log_dir`.
    pub fn new(log_dir: PathBuf) -> Self {
        Self { log_dir: Some(log_dir), console: ConsoleTarget::Stdout, console_only_on_tty: true, log_filter: None }
    }

    /// Console output only.
    pub fn console_only() -> Self {
        Self { log_dir: None, console: ConsoleTarget::Stdout, console_only_on_tty: true, log_filter: None }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }

    pub fn with_console(mut self, console: ConsoleTarget) -> Self {
        self.console = console;
        self
    }

    fn wants_file(&self) -> bool {
        self.log_dir.is_some() && !(self.console_only_on_tty && self.console.is_terminal())
    }
}

/// Keeps the background file writer alive.
///
/// Pending file entries are flushed when this is dropped, so hold it until
/// the process exits.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _worker_guard: Option<WorkerGuard>,
}

/// Install the global subscriber.
///
/// A file appender that cannot be created degrades to console-only logging
/// with a warning on stderr.
pub fn init_logging(config: LogConfig) -> LoggingGuard {
    let filter = build_env_filter(config.log_filter.as_deref());
    let ansi = config.console.is_terminal();

    let file = match (&config.log_dir, config.wants_file()) {
        (Some(dir), true) => match file_appender(dir) {
            Ok(appender) => Some(tracing_appender::non_blocking(appender)),
            Err(e) => {
                eprintln!("warning: file logging unavailable ({e}); logging to the console only");
                None
            }
        },
        _ => None,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_thread_ids(false);
    match file {
        Some((file_writer, guard)) => {
            // Console stays at INFO and above; the file gets everything the filter allows
            let console = config.console.writer().with_max_level(tracing::Level::INFO);
            builder.with_writer(console.and(file_writer)).with_ansi(false).with_target(true).init();
            LoggingGuard { _worker_guard: Some(guard) }
        }
        None => {
            builder.with_writer(config.console.writer()).with_ansi(ansi).with_target(false).init();
            LoggingGuard { _worker_guard: None }
        }
    }
}

fn file_appender(dir: &Path) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(dir)?;
    Ok(RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(dir)?)
}

fn build_env_filter(custom_filter: Option<&str>) -> EnvFilter {
    let fallback = || EnvFilter::new(default_log_filter());
    match custom_filter {
        Some(directive) => EnvFilter::try_new(directive).unwrap_or_else(|_| fallback()),
        None => EnvFilter::try_from_env("DASHGRID_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| fallback()),
    }
}

/// Default filter for the current build type.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "debug,dashgrid=trace,dashgrid_core=trace,dashgrid_ui=trace,rusqlite=warn"
    } else {
        "info,rusqlite=warn"
    }
}

/// Log directory under the data directory.
pub fn log_dir() -> PathBuf {
    crate::services::storage::default_data_dir().join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(default_log_filter()).is_ok());
    }

    #[test]
    fn test_invalid_custom_filter_falls_back() {
        let _filter = build_env_filter(Some("dashgrid=[[["));
    }

    #[test]
    fn test_console_only_never_wants_file() {
        let config = LogConfig::console_only().with_console(ConsoleTarget::Stderr).with_filter("warn");
        assert!(!config.wants_file());
        assert_eq!(config.log_filter.as_deref(), Some("warn"));
    }

    #[test]
    fn test_file_logging_when_not_restricted_to_tty() {
        let mut config = LogConfig::new(PathBuf::from("/tmp/dashgrid-logs"));
        config.console_only_on_tty = false;
        assert!(config.wants_file());
        assert!(config.log_dir.as_deref().is_some_and(|dir| dir.ends_with("dashgrid-logs")));
    }
}
