//! Credentials attached to outgoing requests.
//!
//! Fulfil accepts three schemes. Each variant knows how to decorate a
//! request and nothing else; only session login talks to the network, and
//! that lives on [`crate::Client::login`].

use common::RedactedSecret;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::RequestBuilder;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const AUTHORIZATION_HEADER: &str = "authorization";
const SESSION_SCHEME: &str = "Session";
const BEARER_SCHEME: &str = "Bearer";

/// Session credentials returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionAuth {
    pub login: String,
    pub user_id: i64,
    pub session: RedactedSecret,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    /// Static `x-api-key` header.
    ApiKey(RedactedSecret),
    /// `Authorization: Session base64(login:user_id:session)`.
    Session(SessionAuth),
    /// `Authorization: Bearer <token>`, usually from the OAuth flow.
    Bearer(RedactedSecret),
}

impl Auth {
    pub fn api_key(key: impl Into<RedactedSecret>) -> Self {
        Auth::ApiKey(key.into())
    }

    pub fn bearer(token: impl Into<RedactedSecret>) -> Self {
        Auth::Bearer(token.into())
    }

    pub fn session(login: impl Into<String>, user_id: i64, session: impl Into<RedactedSecret>) -> Self {
        Auth::Session(SessionAuth {
            login: login.into(),
            user_id,
            session: session.into(),
        })
    }

    /// Scheme name, safe to log.
    pub fn kind(&self) -> &'static str {
        match self {
            Auth::ApiKey(_) => "api_key",
            Auth::Session(_) => "session",
            Auth::Bearer(_) => "bearer",
        }
    }

    /// Header name and value carrying these credentials.
    pub(crate) fn header(&self) -> (&'static str, String) {
        match self {
            Auth::ApiKey(key) => (API_KEY_HEADER, key.expose().to_string()),
            Auth::Session(session) => {
                let raw = format!(
                    "{}:{}:{}",
                    session.login,
                    session.user_id,
                    session.session.expose()
                );
                (
                    AUTHORIZATION_HEADER,
                    format!("{SESSION_SCHEME} {}", BASE64.encode(raw)),
                )
            }
            Auth::Bearer(token) => (
                AUTHORIZATION_HEADER,
                format!("{BEARER_SCHEME} {}", token.expose()),
            ),
        }
    }

    /// Decorate an outgoing request with these credentials.
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        let (name, value) = self.header();
        request.header(name, value)
    }
}

impl From<SessionAuth> for Auth {
    fn from(session: SessionAuth) -> Self {
        Auth::Session(session)
    }
}
