use common::ErrorLocation;

use fulfil_client::{ConfigError, FulfilError};

use std::panic::Location;

use thiserror::Error;

/// Errors surfaced by the `fulfil` command line.
#[derive(Debug, Error)]
pub enum CliError {
    /// Bad arguments or local setup failure.
    #[error("CLI Error: {message} {location}")]
    Cli {
        message: String,
        location: ErrorLocation,
    },

    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },

    /// The API call itself failed.
    #[error("Fulfil Error: {message} {location}")]
    Fulfil {
        message: String,
        category: &'static str,
        location: ErrorLocation,
    },
}

impl CliError {
    #[track_caller]
    pub fn cli(message: impl Into<String>) -> Self {
        CliError::Cli {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ConfigError> for CliError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        CliError::Config {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<FulfilError> for CliError {
    #[track_caller]
    fn from(error: FulfilError) -> Self {
        CliError::Fulfil {
            message: error.to_string(),
            category: error.error_category(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
