//! Mapping of HTTP responses to decoded JSON or a typed [`FulfilError`].

use crate::error::FulfilError;

use common::{ErrorLocation, HttpStatusCode};

use std::panic::Location;

use log::warn;
use reqwest::Response;
use serde_json::Value;

const SENTRY_ID_HEADER: &str = "x-sentry-id";
const USER_ERROR_TYPE: &str = "UserError";

/// Decode a successful response body, or classify the failure.
pub(crate) async fn json_response(response: Response) -> Result<Value, FulfilError> {
    let status = HttpStatusCode(response.status().as_u16());
    let sentry_id = response
        .headers()
        .get(SENTRY_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let url = response.url().clone();
    let text = response.text().await?;

    if status.is_success() {
        return serde_json::from_str(&text)
            .map_err(|e| FulfilError::json(format!("Malformed response body from {url}: {e}")));
    }

    warn!("HTTP {status} from {url}");
    Err(status_error(status, &text, sentry_id))
}

/// Build the error for a non-2xx response.
///
/// The body is decoded when it is JSON; a body that is not JSON never turns
/// a status error into a decoding error.
#[track_caller]
pub(crate) fn status_error(
    status: HttpStatusCode,
    text: &str,
    sentry_id: Option<String>,
) -> FulfilError {
    let location = ErrorLocation::from(Location::caller());
    let body: Option<Value> = serde_json::from_str(text).ok();

    match status.0 {
        400 if is_user_error(body.as_ref()) => {
            let body = body.unwrap_or_default();
            FulfilError::User {
                message: string_field(&body, "message").unwrap_or_else(|| text.to_string()),
                code: string_field(&body, "code"),
                description: string_field(&body, "description"),
                location,
            }
        }
        401 => FulfilError::Authentication {
            status_code: status,
            message: error_message(body.as_ref(), text),
            body,
            location,
        },
        429 => FulfilError::RateLimit {
            status_code: status,
            message: error_message(body.as_ref(), text),
            body,
            location,
        },
        code if (400..500).contains(&code) => FulfilError::Client {
            status_code: status,
            message: error_message(body.as_ref(), text),
            body,
            location,
        },
        _ => FulfilError::Server {
            status_code: status,
            message: text.to_string(),
            sentry_id,
            location,
        },
    }
}

fn is_user_error(body: Option<&Value>) -> bool {
    body.and_then(|b| b.get("type"))
        .and_then(Value::as_str)
        .is_some_and(|t| t == USER_ERROR_TYPE)
}

/// `message` from a JSON error body, falling back to the raw text.
fn error_message(body: Option<&Value>, text: &str) -> String {
    body.and_then(|b| string_field(b, "message"))
        .unwrap_or_else(|| text.to_string())
}

fn string_field(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
