//! Failures raised when a secret is about to leave the process.

use crate::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum RedactError {
    /// A secret reached a serializer instead of going through `expose()`.
    #[error("Secret Serialization Refused: {message} {location}")]
    Serialization {
        message: String,
        location: ErrorLocation,
    },
}

impl RedactError {
    #[track_caller]
    pub fn serialization(message: impl Into<String>) -> Self {
        RedactError::Serialization {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
