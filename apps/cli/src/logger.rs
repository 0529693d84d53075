//! Logging for the `fulfil` command line.
//!
//! Stdout carries command output, so log lines go to stderr (colored) and to
//! a plain log file.

use crate::error::CliError;

use common::ErrorLocation;

use std::io::stderr;
use std::panic::Location;
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339;
use log::{LevelFilter, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();
static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

pub const LOG_FILE_NAME: &str = "fulfil.log";

const LOGGER_ALREADY_INITIALIZED_MESSAGE: &str = "Logger already initialized";

/// Level for the log file; stderr is raised to `Warn` unless verbose.
#[cfg(debug_assertions)]
const FILE_LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const FILE_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Install the global logger. Later calls warn and return `Ok`.
pub fn initialize(log_dir: &Path, verbose: bool) -> Result<(), CliError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("{LOGGER_ALREADY_INITIALIZED_MESSAGE}");
        return Ok(());
    }

    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = initialize_internal(log_dir, verbose);
        if result.is_ok() {
            info!("Logger initialized, writing to {}", log_dir.display());
        }
    });

    result
}

#[track_caller]
fn initialize_internal(log_dir: &Path, verbose: bool) -> Result<(), CliError> {
    let log_file_path = log_dir.join(LOG_FILE_NAME);
    let stderr_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let color_configuration = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let stderr_dispatch = Dispatch::new()
        .level(stderr_level)
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message}",
                date = format_rfc3339(SystemTime::now()),
                level = color_configuration.color(record.level()),
                message = message,
            ))
        })
        .chain(stderr());

    let file_dispatch = Dispatch::new()
        .level(FILE_LOG_LEVEL)
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message} [{file}:{line}]",
                date = format_rfc3339(SystemTime::now()),
                level = record.level(),
                message = message,
                file = record.file().unwrap_or("unknown"),
                line = record.line().unwrap_or(0)
            ))
        })
        .chain(
            fern::log_file(&log_file_path).map_err(|e| CliError::Cli {
                message: format!("Failed to create log file: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?,
        );

    Dispatch::new()
        .level(LevelFilter::Debug)
        .chain(stderr_dispatch)
        .chain(file_dispatch)
        .apply()
        .map_err(|e| CliError::Cli {
            message: format!("Failed to initialize logger: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    Ok(())
}
