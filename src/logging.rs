//! Tracing setup: a console layer on stderr plus one log file per run.
//!
//! Verbosity follows `RUST_LOG` and defaults to `info`. Background requests
//! run inside a `request` span carrying `pipeline` and `request_id`, so every
//! line a worker emits can be traced back to the fetch that produced it.

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::OnceLock,
};

use time::{
    OffsetDateTime, UtcOffset, format_description::FormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, util::TryInitError};

use crate::app_dirs::{AppDirError, AppDirs};

const LOG_FILE_PREFIX: &str = "exoscope_";
const LOG_FILE_SUFFIX: &str = ".log";
/// Log files kept after pruning, the current run included.
const KEEP_LOG_FILES: usize = 10;
const DEFAULT_FILTER: &str = "info,ureq=warn,rustls=warn";

struct LogSession {
    file: PathBuf,
    _guard: WorkerGuard,
}

static SESSION: OnceLock<LogSession> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error(transparent)]
    AppDir(#[from] AppDirError),
    #[error("Log file I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Could not timestamp the log file name: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error("Another tracing subscriber is already installed: {0}")]
    AlreadyInstalled(#[from] TryInitError),
}

/// Install the global subscriber. Calling it again after success is a no-op.
pub fn init() -> Result<(), LoggingError> {
    if SESSION.get().is_some() {
        return Ok(());
    }
    let dir = AppDirs::resolve()?.logs()?;
    let started = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let file = create_session_file(&dir, started)?;
    let pruned = prune_logs(&dir, KEEP_LOG_FILES)?;

    let file_name = file.file_name().unwrap_or_default();
    let (writer, guard) = tracing_appender::non_blocking(rolling::never(&dir, file_name));
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let timer = fmt::time::OffsetTime::new(offset, Rfc3339);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)))
        .with(
            fmt::layer()
                .with_target(false)
                .with_timer(timer.clone())
                .with_writer(std::io::stderr),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_thread_names(true)
                .with_timer(timer)
                .with_writer(writer),
        )
        .try_init()?;

    tracing::info!(file = %file.display(), pruned, "Logging started");
    let _ = SESSION.set(LogSession {
        file,
        _guard: guard,
    });
    Ok(())
}

/// Path of this run's log file, once [`init`] has succeeded.
pub fn log_file() -> Option<&'static Path> {
    SESSION.get().map(|session| session.file.as_path())
}

fn session_file_name(started: OffsetDateTime) -> Result<String, LoggingError> {
    const STAMP: &[FormatItem<'_>] =
        format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
    Ok(format!(
        "{LOG_FILE_PREFIX}{}{LOG_FILE_SUFFIX}",
        started.format(STAMP)?
    ))
}

fn create_session_file(dir: &Path, started: OffsetDateTime) -> Result<PathBuf, LoggingError> {
    let path = dir.join(session_file_name(started)?);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| LoggingError::Io {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}

/// Delete the oldest run logs so at most `keep` remain; returns how many went.
///
/// Names embed a sortable timestamp, so name order is age order. Files that
/// do not look like run logs are never touched.
fn prune_logs(dir: &Path, keep: usize) -> Result<usize, LoggingError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| LoggingError::Io { path, source }
    };
    let mut logs: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_err(dir))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_run_log(path))
        .collect();
    logs.sort();
    let excess = logs.len().saturating_sub(keep);
    for path in &logs[..excess] {
        fs::remove_file(path).map_err(io_err(path))?;
    }
    Ok(excess)
}

fn is_run_log(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX) && name.ends_with(LOG_FILE_SUFFIX))
}
