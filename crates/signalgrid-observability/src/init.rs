// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Unified logging initialization
//!
//! Console output is always installed. With the `file-logging` feature a
//! combined JSON log is also written into a timestamped run directory:
//!
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       └── signalgrid.log
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

const RUN_PREFIX: &str = "run_";
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Logging settings, usually taken from the `[system]` and `[logging]`
/// configuration sections
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingOptions {
    /// Level for everything without a debug flag
    pub level: String,
    pub log_dir: PathBuf,
    pub file_logging: bool,
    pub retention_days: u64,
    pub retention_runs: usize,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("./logs"),
            file_logging: false,
            retention_days: 7,
            retention_runs: 10,
        }
    }
}

/// Keeps file writers alive; logs are flushed when it is dropped
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
    run_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Directory of this run's log files, if file logging is active
    pub fn run_dir(&self) -> Option<&Path> {
        self.run_dir.as_deref()
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global tracing subscriber
///
/// # Errors
/// Fails if the filter is malformed, the run directory cannot be created,
/// or a global subscriber is already installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, options: &LoggingOptions) -> Result<LoggingGuard> {
    let filter = debug_flags.to_filter_string(&options.level);
    let env_filter = EnvFilter::try_new(&filter)
        .with_context(|| format!("Invalid log filter: {}", filter))?;

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_filter(env_filter)
        .boxed();
    layers.push(console_layer);

    let mut guard = LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guard: None,
        run_dir: None,
    };
    let file_attached = attach_file_layer(&mut layers, &mut guard, options, &filter)?;

    Registry::default()
        .with(layers)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    if options.file_logging && !file_attached {
        tracing::warn!(
            target: "signalgrid-observability",
            "File logging requested but the file-logging feature is not compiled in"
        );
    }

    Ok(guard)
}

#[cfg(feature = "file-logging")]
fn attach_file_layer(
    layers: &mut Vec<BoxedLayer>,
    guard: &mut LoggingGuard,
    options: &LoggingOptions,
    filter: &str,
) -> Result<bool> {
    if !options.file_logging {
        return Ok(false);
    }

    let run_dir = create_run_dir(&options.log_dir)?;
    cleanup_old_runs(&options.log_dir, options.retention_days, options.retention_runs)?;

    let appender = tracing_appender::rolling::never(&run_dir, "signalgrid.log");
    let (non_blocking, file_guard) = tracing_appender::non_blocking(appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .json()
        .with_filter(EnvFilter::try_new(filter)?)
        .boxed();
    layers.push(file_layer);

    guard._file_guard = Some(file_guard);
    guard.run_dir = Some(run_dir);
    Ok(true)
}

#[cfg(not(feature = "file-logging"))]
fn attach_file_layer(
    _layers: &mut Vec<BoxedLayer>,
    _guard: &mut LoggingGuard,
    _options: &LoggingOptions,
    _filter: &str,
) -> Result<bool> {
    Ok(false)
}

/// Create `run_<timestamp>` under `base_log_dir`
pub fn create_run_dir(base_log_dir: &Path) -> Result<PathBuf> {
    let run_dir = base_log_dir.join(format!(
        "{}{}",
        RUN_PREFIX,
        Utc::now().format(RUN_TIMESTAMP_FORMAT)
    ));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("Failed to create log directory: {}", run_dir.display()))?;
    Ok(run_dir)
}

fn parse_run_timestamp(dir_name: &str) -> Option<DateTime<Utc>> {
    let stamp = dir_name.strip_prefix(RUN_PREFIX)?;
    let naive = NaiveDateTime::parse_from_str(stamp, RUN_TIMESTAMP_FORMAT).ok()?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Remove run directories older than `retention_days`, then all but the
/// newest `retention_runs` (at least one is always kept)
///
/// Directories that do not look like run directories are left alone.
/// Returns the number of directories removed.
pub fn cleanup_old_runs(base_log_dir: &Path, retention_days: u64, retention_runs: usize) -> Result<usize> {
    if !base_log_dir.exists() {
        return Ok(0);
    }

    let cutoff = Utc::now() - chrono::Duration::days(retention_days.min(36_500) as i64);
    let keep = retention_runs.max(1);

    let mut runs: Vec<(PathBuf, DateTime<Utc>)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let stamp = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_run_timestamp);
        if let Some(stamp) = stamp {
            runs.push((path, stamp));
        }
    }

    // Newest first
    runs.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = 0;
    for (index, (path, stamp)) in runs.iter().enumerate() {
        if index < keep && *stamp >= cutoff {
            continue;
        }
        match std::fs::remove_dir_all(path) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!(
                "Warning: Failed to remove old log directory {}: {}",
                path.display(),
                e
            ),
        }
    }

    Ok(removed)
}
