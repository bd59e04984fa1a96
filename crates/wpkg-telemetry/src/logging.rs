//! Subscriber construction for the `wpkg` binary and embedding hosts.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    filter::Directive,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{TelemetryError, TelemetryResult};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Prefix of rolling log file names (`wpkg.2026-10-16`).
pub const LOG_FILE_PREFIX: &str = "wpkg";

/// Output style of each event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, indented.
    Pretty,
    /// One line per event.
    #[default]
    Compact,
    /// Newline-delimited JSON.
    Json,
    /// The default `tracing-subscriber` layout.
    Full,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            "full" => Ok(Self::Full),
            other => Err(TelemetryError::ConfigError(format!(
                "unknown log format '{other}' (expected pretty, compact, json or full)"
            ))),
        }
    }
}

/// How often a new log file is started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRotation {
    /// One file per day.
    #[default]
    Daily,
    /// One file per hour.
    Hourly,
    /// A single, ever-growing file.
    Never,
}

impl FromStr for FileRotation {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "hourly" => Ok(Self::Hourly),
            "never" => Ok(Self::Never),
            other => Err(TelemetryError::ConfigError(format!(
                "unknown log rotation '{other}' (expected daily, hourly or never)"
            ))),
        }
    }
}

impl From<FileRotation> for Rotation {
    fn from(rotation: FileRotation) -> Self {
        match rotation {
            FileRotation::Daily => Self::DAILY,
            FileRotation::Hourly => Self::HOURLY,
            FileRotation::Never => Self::NEVER,
        }
    }
}

/// Where events are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    /// Standard output. Collides with `--format json` command output.
    Stdout,
    /// Standard error.
    #[default]
    Stderr,
    /// Rolling files inside a directory.
    File {
        /// Directory receiving the files. Created on setup.
        dir: PathBuf,
        /// Rotation period.
        rotation: FileRotation,
    },
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Base filter, e.g. `info` or `warn,wpkg_package=debug`.
    pub level: String,
    /// Event layout.
    #[serde(default)]
    pub format: LogFormat,
    /// Output destination.
    #[serde(default)]
    pub target: LogTarget,
    /// Extra filter directives applied on top of `level`.
    #[serde(default)]
    pub directives: Vec<String>,
    /// Colorize terminal output. Always off for files.
    #[serde(default = "default_ansi")]
    pub ansi: bool,
}

fn default_ansi() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

impl LogConfig {
    /// Compact stderr logging at `level`.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: LogFormat::default(),
            target: LogTarget::default(),
            directives: Vec::new(),
            ansi: default_ansi(),
        }
    }

    /// Set the event layout.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the destination. File targets turn colors off.
    #[must_use]
    pub fn with_target(mut self, target: LogTarget) -> Self {
        if matches!(target, LogTarget::File { .. }) {
            self.ansi = false;
        }
        self.target = target;
        self
    }

    /// Add a filter directive such as `wpkg_package=trace`.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    fn build_filter(&self) -> TelemetryResult<EnvFilter> {
        self.directives
            .iter()
            .try_fold(parse_filter(&self.level)?, |filter, raw| {
                let directive = raw
                    .parse::<Directive>()
                    .map_err(|e| TelemetryError::ConfigError(format!("{raw}: {e}")))?;
                Ok(filter.add_directive(directive))
            })
    }

    fn layer<W>(&self, writer: W) -> BoxedLayer
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let base = fmt::layer().with_writer(writer).with_ansi(self.ansi);
        match self.format {
            LogFormat::Json => base.json().boxed(),
            LogFormat::Pretty => base.pretty().boxed(),
            LogFormat::Compact => base.compact().boxed(),
            LogFormat::Full => base.boxed(),
        }
    }
}

fn parse_filter(level: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(level).map_err(|e| TelemetryError::ConfigError(format!("{level}: {e}")))
}

/// Open a rolling appender writing `wpkg.*` files into `dir`.
///
/// # Errors
///
/// Returns an error if `dir` cannot be created or the first file cannot
/// be opened.
pub fn file_appender(dir: &Path, rotation: FileRotation) -> TelemetryResult<RollingFileAppender> {
    std::fs::create_dir_all(dir)?;
    RollingFileAppender::builder()
        .rotation(rotation.into())
        .filename_prefix(LOG_FILE_PREFIX)
        .build(dir)
        .map_err(|e| TelemetryError::InitError(format!("{}: {e}", dir.display())))
}

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// Returns an error if the level or a directive is invalid, the log
/// directory cannot be prepared, or a global subscriber is already set.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = config.build_filter()?;
    let layer = match &config.target {
        LogTarget::Stdout => config.layer(std::io::stdout),
        LogTarget::Stderr => config.layer(std::io::stderr),
        LogTarget::File { dir, rotation } => config.layer(file_appender(dir, *rotation)?),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .map_err(|e| TelemetryError::InitError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.target, LogTarget::Stderr);
        assert!(config.ansi);
    }

    #[test]
    fn test_file_target_disables_ansi() {
        let config = LogConfig::new("debug").with_target(LogTarget::File {
            dir: PathBuf::from("/var/log/wpkg"),
            rotation: FileRotation::Hourly,
        });
        assert!(!config.ansi);

        let config = LogConfig::new("debug").with_target(LogTarget::Stdout);
        assert!(config.ansi);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" pretty ".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());

        assert_eq!("Never".parse::<FileRotation>().unwrap(), FileRotation::Never);
        assert!("weekly".parse::<FileRotation>().is_err());
    }

    #[test]
    fn test_file_appender_writes_prefixed_file() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");

        let mut appender = file_appender(&logs, FileRotation::Never).unwrap();
        appender.write_all(b"hello\n").unwrap();
        appender.flush().unwrap();

        let names: Vec<String> = std::fs::read_dir(&logs)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![LOG_FILE_PREFIX.to_owned()]);
        assert_eq!(
            std::fs::read_to_string(logs.join(LOG_FILE_PREFIX)).unwrap(),
            "hello\n"
        );
    }

    #[test]
    fn test_file_appender_rejects_file_as_dir() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("logs");
        std::fs::write(&blocker, "").unwrap();

        assert!(matches!(
            file_appender(&blocker, FileRotation::Daily),
            Err(TelemetryError::IoError(_))
        ));
    }

    #[test]
    fn test_serde_names() {
        let config = LogConfig::new("warn")
            .with_format(LogFormat::Full)
            .with_target(LogTarget::File {
                dir: PathBuf::from("/tmp/l"),
                rotation: FileRotation::Daily,
            });
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["format"], "full");
        assert_eq!(json["target"]["file"]["rotation"], "daily");

        let parsed: LogConfig = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.target, config.target);
    }

    #[test]
    fn test_filter_directives() {
        assert!(LogConfig::new("debug").with_directive("wpkg=trace").build_filter().is_ok());
        assert!(
            LogConfig::new("debug")
                .with_directive("[invalid=syntax")
                .build_filter()
                .is_err()
        );
    }
}
