//! Process-wide log setup for the engine and its CLI.
//!
//! # Responsibility
//! - Start the `flexi_logger` backend behind the `log` facade once.
//! - Write to size-rotated `content_engine*.log` files when a directory is
//!   configured, to stderr otherwise.
//!
//! # Invariants
//! - Setup never panics; every failure is a `LoggingError`.
//! - After the first success only the identical `(level, target)` is accepted.

use flexi_logger::{
    detailed_format, Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "content_engine";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_LOG_FILES: usize = 5;
const PANIC_SUMMARY_CHARS: usize = 160;
const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

/// Where log records go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    Directory(PathBuf),
}

impl LogTarget {
    /// Parses an optional directory setting; blank or missing means stderr.
    pub fn from_setting(log_dir: Option<&str>) -> Result<Self, LoggingError> {
        let Some(raw) = log_dir.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Ok(Self::Stderr);
        };
        let path = Path::new(raw);
        if !path.is_absolute() {
            return Err(LoggingError::RelativeDirectory(raw.to_string()));
        }
        Ok(Self::Directory(path.to_path_buf()))
    }

    pub fn directory(&self) -> Option<&Path> {
        match self {
            Self::Stderr => None,
            Self::Directory(dir) => Some(dir),
        }
    }
}

impl Display for LogTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stderr => f.write_str("stderr"),
            Self::Directory(dir) => write!(f, "{}", dir.display()),
        }
    }
}

#[derive(Debug)]
pub enum LoggingError {
    UnknownLevel(String),
    RelativeDirectory(String),
    CreateDirectory { dir: PathBuf, source: std::io::Error },
    Backend(String),
    /// Logging is already running with a different level or target.
    Conflict { active: String, requested: String },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLevel(level) => write!(
                f,
                "unknown log level `{level}` (use one of {})",
                LEVELS.join("|")
            ),
            Self::RelativeDirectory(dir) => {
                write!(f, "log directory must be absolute, got `{dir}`")
            }
            Self::CreateDirectory { dir, source } => {
                write!(f, "cannot create log directory `{}`: {source}", dir.display())
            }
            Self::Backend(message) => write!(f, "log backend failed to start: {message}"),
            Self::Conflict { active, requested } => write!(
                f,
                "logging already running as {active}; cannot switch to {requested}"
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDirectory { source, .. } => Some(source),
            _ => None,
        }
    }
}

struct ActiveLogger {
    level: &'static str,
    target: LogTarget,
    _handle: LoggerHandle,
}

impl ActiveLogger {
    fn describe(&self) -> String {
        describe(self.level, &self.target)
    }
}

/// Starts logging at `level`, writing under `log_dir` when given.
///
/// Calling again with the same level and directory is a no-op.
pub fn init_logging(level: &str, log_dir: Option<&str>) -> Result<(), LoggingError> {
    let level = parse_level(level)?;
    let target = LogTarget::from_setting(log_dir)?;

    let active = ACTIVE.get_or_try_init(|| {
        let handle = start_backend(level, &target)?;
        install_panic_hook();
        info!(
            "event=logging_init module=logging status=ok level={} target={} version={} profile={}",
            level,
            target,
            env!("CARGO_PKG_VERSION"),
            if cfg!(debug_assertions) { "debug" } else { "release" }
        );
        Ok::<_, LoggingError>(ActiveLogger {
            level,
            target: target.clone(),
            _handle: handle,
        })
    })?;

    if active.level != level || active.target != target {
        return Err(LoggingError::Conflict {
            active: active.describe(),
            requested: describe(level, &target),
        });
    }
    Ok(())
}

/// Active `(level, directory)`, or `None` before `init_logging` succeeded.
pub fn logging_status() -> Option<(&'static str, Option<PathBuf>)> {
    ACTIVE.get().map(|active| {
        (
            active.level,
            active.target.directory().map(Path::to_path_buf),
        )
    })
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn parse_level(level: &str) -> Result<&'static str, LoggingError> {
    let wanted = level.trim().to_ascii_lowercase();
    let wanted = if wanted == "warning" { "warn".to_string() } else { wanted };
    LEVELS
        .iter()
        .copied()
        .find(|known| *known == wanted)
        .ok_or_else(|| LoggingError::UnknownLevel(level.trim().to_string()))
}

fn describe(level: &str, target: &LogTarget) -> String {
    format!("level={level} target={target}")
}

fn start_backend(level: &'static str, target: &LogTarget) -> Result<LoggerHandle, LoggingError> {
    let logger =
        Logger::try_with_str(level).map_err(|err| LoggingError::Backend(err.to_string()))?;

    let logger = match target {
        LogTarget::Stderr => logger.log_to_stderr().format_for_stderr(detailed_format),
        LogTarget::Directory(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDirectory {
                dir: dir.clone(),
                source,
            })?;
            logger
                .log_to_file(FileSpec::default().directory(dir).basename(LOG_FILE_BASENAME))
                .rotate(
                    Criterion::Size(ROTATE_AT_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(KEEP_LOG_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(detailed_format)
        }
    };

    logger
        .start()
        .map_err(|err| LoggingError::Backend(err.to_string()))
}

fn install_panic_hook() {
    if PANIC_HOOK.set(()).is_err() {
        return;
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Payloads may echo topics or drafts.
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        error!(
            "event=panic_captured module=logging status=error location={} payload={}",
            location,
            one_line(&payload, PANIC_SUMMARY_CHARS)
        );
        previous(panic_info);
    }));
}

fn one_line(value: &str, max_chars: usize) -> String {
    let flat = value.replace(['\n', '\r'], " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut short: String = flat.chars().take(max_chars).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
mod tests {
    use super::{init_logging, logging_status, one_line, parse_level, LogTarget, LoggingError};
    use std::path::Path;

    #[test]
    fn levels_are_case_insensitive_and_warning_is_warn() {
        assert_eq!(parse_level(" INFO ").expect("info is known"), "info");
        assert_eq!(parse_level("warning").expect("warning is known"), "warn");
        assert!(matches!(
            parse_level("loud"),
            Err(LoggingError::UnknownLevel(level)) if level == "loud"
        ));
    }

    #[test]
    fn target_setting_rules() {
        assert_eq!(LogTarget::from_setting(None).expect("none"), LogTarget::Stderr);
        assert_eq!(LogTarget::from_setting(Some("  ")).expect("blank"), LogTarget::Stderr);
        assert!(matches!(
            LogTarget::from_setting(Some("logs/dev")),
            Err(LoggingError::RelativeDirectory(_))
        ));
        let target = LogTarget::from_setting(Some("/var/log/ce")).expect("absolute");
        assert_eq!(target.directory(), Some(Path::new("/var/log/ce")));
        assert_eq!(LogTarget::Stderr.to_string(), "stderr");
    }

    #[test]
    fn one_line_flattens_and_truncates() {
        let flat = one_line("line1\nline2\rline3", 8);
        assert!(!flat.contains('\n'));
        assert!(!flat.contains('\r'));
        assert!(flat.ends_with("..."));
        assert_eq!(one_line("short", 8), "short");
    }

    #[test]
    fn second_init_must_match_the_first() {
        let log_dir = tempfile::tempdir().expect("temp dir should be created");
        let log_dir_str = log_dir
            .path()
            .to_str()
            .expect("temp dir should be valid UTF-8")
            .to_string();
        let other_dir = tempfile::tempdir().expect("temp dir should be created");
        let other_dir_str = other_dir
            .path()
            .to_str()
            .expect("temp dir should be valid UTF-8")
            .to_string();

        init_logging("info", Some(&log_dir_str)).expect("first init should succeed");
        init_logging("INFO", Some(&log_dir_str)).expect("same config should be accepted");

        for (level, dir) in [
            ("debug", Some(log_dir_str.as_str())),
            ("info", Some(other_dir_str.as_str())),
            ("info", None),
        ] {
            let err = init_logging(level, dir).expect_err("conflicting config should fail");
            assert!(matches!(err, LoggingError::Conflict { .. }));
        }

        let (level, dir) = logging_status().expect("logging should be active");
        assert_eq!(level, "info");
        assert_eq!(dir.as_deref(), Some(log_dir.path()));
    }
}
