//! Error type for every call made through the Fulfil client.
//!
//! Key design decisions:
//! - HTTP status codes stored directly (not parsed from strings)
//! - Transport, status and decoding failures are distinct variants
//! - All errors include ErrorLocation for debugging

use common::{ErrorLocation, HttpStatusCode};

use std::panic::Location;

use serde_json::Value;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum FulfilError {
    /// Connection failure, timeout or any other transport problem.
    #[error("HTTP Error: {message} {location}")]
    Http {
        message: String,
        is_timeout: bool,
        is_connection: bool,
        location: ErrorLocation,
    },

    #[error("URL Parse Error: {message} {location}")]
    UrlParse {
        message: String,
        location: ErrorLocation,
    },

    /// The response body was not the JSON we expected.
    #[error("JSON Error: {message} {location}")]
    Json {
        message: String,
        location: ErrorLocation,
    },

    /// Validation failure raised by the server, meant to be shown to a user.
    #[error("User Error: {message} {location}")]
    User {
        message: String,
        code: Option<String>,
        description: Option<String>,
        location: ErrorLocation,
    },

    /// Expired or invalid credentials.
    #[error("Authentication Error: HTTP {status_code} - {message} {location}")]
    Authentication {
        status_code: HttpStatusCode,
        message: String,
        body: Option<Value>,
        location: ErrorLocation,
    },

    #[error("Rate Limit Error: HTTP {status_code} - {message} {location}")]
    RateLimit {
        status_code: HttpStatusCode,
        message: String,
        body: Option<Value>,
        location: ErrorLocation,
    },

    #[error("Client Error: HTTP {status_code} - {message} {location}")]
    Client {
        status_code: HttpStatusCode,
        message: String,
        body: Option<Value>,
        location: ErrorLocation,
    },

    #[error("Server Error: HTTP {status_code} - {message} {location}")]
    Server {
        status_code: HttpStatusCode,
        message: String,
        sentry_id: Option<String>,
        location: ErrorLocation,
    },

    #[error("Validation Error: {message} {location}")]
    Validation {
        message: String,
        location: ErrorLocation,
    },

    #[error("Async Result Error: {message} {location}")]
    AsyncResult {
        message: String,
        location: ErrorLocation,
    },

    /// A query expected exactly one record and found none.
    #[error("No Result Found: {model} {location}")]
    NoResultFound {
        model: String,
        location: ErrorLocation,
    },

    /// A query expected exactly one record and found several.
    #[error("Multiple Results Found: {model} {location}")]
    MultipleResultsFound {
        model: String,
        location: ErrorLocation,
    },
}

impl FulfilError {
    #[track_caller]
    pub fn json(message: impl Into<String>) -> Self {
        FulfilError::Json {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn validation(message: impl Into<String>) -> Self {
        FulfilError::Validation {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn async_result(message: impl Into<String>) -> Self {
        FulfilError::AsyncResult {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// HTTP status code if the server answered with an error status.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FulfilError::User { .. } => Some(HttpStatusCode::BAD_REQUEST.0),
            FulfilError::Authentication { status_code, .. }
            | FulfilError::RateLimit { status_code, .. }
            | FulfilError::Client { status_code, .. }
            | FulfilError::Server { status_code, .. } => Some(status_code.0),
            _ => None,
        }
    }

    /// Decoded error body, when the server sent one.
    pub fn body(&self) -> Option<&Value> {
        match self {
            FulfilError::Authentication { body, .. }
            | FulfilError::RateLimit { body, .. }
            | FulfilError::Client { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Whether the caller may reasonably retry. The client itself never does.
    pub fn is_retryable(&self) -> bool {
        match self {
            FulfilError::Http {
                is_timeout,
                is_connection,
                ..
            } => *is_timeout || *is_connection,
            FulfilError::RateLimit { .. } => true,
            FulfilError::Server { status_code, .. } => status_code.is_retryable(),
            _ => false,
        }
    }

    /// Short stable name for the error kind, suitable for logs and metrics.
    pub fn error_category(&self) -> &'static str {
        match self {
            FulfilError::Http { is_timeout: true, .. } => "timeout",
            FulfilError::Http {
                is_connection: true,
                ..
            } => "connection",
            FulfilError::Http { .. } => "transport",
            FulfilError::UrlParse { .. } => "url_parse",
            FulfilError::Json { .. } => "decode",
            FulfilError::User { .. } => "user_error",
            FulfilError::Authentication { .. } => "authentication",
            FulfilError::RateLimit { .. } => "rate_limit",
            FulfilError::Client { .. } => "client_error",
            FulfilError::Server { .. } => "server_error",
            FulfilError::Validation { .. } => "validation",
            FulfilError::AsyncResult { .. } => "async_result",
            FulfilError::NoResultFound { .. } => "no_result",
            FulfilError::MultipleResultsFound { .. } => "multiple_results",
        }
    }
}

impl From<reqwest::Error> for FulfilError {
    #[track_caller]
    fn from(error: reqwest::Error) -> Self {
        FulfilError::Http {
            message: error.to_string(),
            is_timeout: error.is_timeout(),
            is_connection: error.is_connect(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<url::ParseError> for FulfilError {
    #[track_caller]
    fn from(error: url::ParseError) -> Self {
        FulfilError::UrlParse {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for FulfilError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        FulfilError::Json {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
