//! Shared building blocks for the Fulfil client workspace.
//!
//! Everything here is dependency-light and free of I/O so that both the
//! client library and the command line front end can use it:
//!
//! - **ErrorLocation**: file/line/column captured with `#[track_caller]`
//! - **HttpStatusCode**: status classification for error categorisation
//! - **RedactedSecret**: credentials that never reach logs or serializers

pub mod error;
pub mod http_status;
pub mod redacted_secret;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use http_status::HttpStatusCode;
pub use redacted_secret::RedactedSecret;

#[cfg(test)]
mod tests;
