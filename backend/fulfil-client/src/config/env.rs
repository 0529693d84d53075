//! Environment and `.env` handling.

use crate::error::ConfigError;

use common::ErrorLocation;

use std::env;
use std::panic::Location;
use std::path::PathBuf;

use log::{debug, info, warn};

/// Load `.env` from the working directory, then from next to the executable.
///
/// Returns the file that was loaded. Variables already set in the process
/// environment are never overwritten.
pub fn try_load_dotenv() -> Option<PathBuf> {
    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded .env from: {:?}", path);
        return Some(path);
    }

    let exe_dir = env::current_exe().ok()?.parent()?.to_path_buf();
    let env_path = exe_dir.join(".env");
    if !env_path.exists() {
        debug!("No .env found");
        return None;
    }

    match dotenvy::from_path(&env_path) {
        Ok(()) => {
            info!("Loaded .env from: {:?}", env_path);
            Some(env_path)
        }
        Err(e) => {
            warn!("Failed to parse .env at {:?}: {}", env_path, e);
            None
        }
    }
}

/// Value of `name`, or `None` when unset or blank.
#[track_caller]
pub fn read_var(name: &str) -> Result<Option<String>, ConfigError> {
    match env::var(name) {
        Ok(value) if value.trim().is_empty() => {
            warn!("Env var {name} is set but empty");
            Ok(None)
        }
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::EnvError {
            location: ErrorLocation::from(Location::caller()),
            message: format!("{name} contains invalid unicode"),
        }),
    }
}
