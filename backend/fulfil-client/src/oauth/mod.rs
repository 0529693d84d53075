//! Authorization-code OAuth flow against a Fulfil tenant.
//!
//! Building the authorization URL is pure; only [`OAuthSession::get_token`]
//! touches the network. Use the returned token through
//! [`TokenResponse::into_auth`].

use crate::auth::Auth;
use crate::client::builder::{parse_host, resolve_host};
use crate::client::response::json_response;
use crate::client::DEFAULT_TIMEOUT;
use crate::error::FulfilError;
use crate::webhook::constant_time_eq;
use crate::FULFIL_DOMAIN;

use common::RedactedSecret;

use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

const AUTHORIZE_PATH: &str = "oauth/authorize";
const TOKEN_PATH: &str = "oauth/token";
const AUTHORIZATION_CODE_GRANT: &str = "authorization_code";

/// An authorization URL and the anti-forgery state embedded in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationUrl {
    pub url: Url,
    pub state: String,
}

impl AuthorizationUrl {
    /// Compare the `state` echoed back on the redirect with ours, in
    /// constant time.
    pub fn matches_state(&self, returned: &str) -> bool {
        constant_time_eq(&self.state, returned)
    }
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: RedactedSecret,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<RedactedSecret>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    pub fn into_auth(self) -> Auth {
        Auth::Bearer(self.access_token)
    }
}

#[derive(Debug, Clone)]
pub struct OAuthSession {
    subdomain: String,
    client_id: String,
    client_secret: RedactedSecret,
    host: Url,
    http: reqwest::Client,
}

impl OAuthSession {
    /// Session for an app registered on `subdomain` at fulfil.io.
    ///
    /// Fails when the client id or secret is empty.
    #[track_caller]
    pub fn new(
        subdomain: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<RedactedSecret>,
    ) -> Result<Self, FulfilError> {
        let host = resolve_host(subdomain, FULFIL_DOMAIN)?;
        Self::assemble(subdomain, client_id.into(), client_secret.into(), host, DEFAULT_TIMEOUT)
    }

    #[track_caller]
    pub(crate) fn assemble(
        subdomain: &str,
        client_id: String,
        client_secret: RedactedSecret,
        host: Url,
        timeout: Duration,
    ) -> Result<Self, FulfilError> {
        if client_id.trim().is_empty() || client_secret.is_blank() {
            return Err(FulfilError::validation("Missing client_id or client_secret"));
        }

        Ok(Self {
            subdomain: subdomain.to_string(),
            client_id,
            client_secret,
            host,
            http: http_client(timeout)?,
        })
    }

    /// Talk to `host` instead of the host derived from the subdomain.
    #[track_caller]
    pub fn with_host(mut self, host: &str) -> Result<Self, FulfilError> {
        self.host = parse_host(host)?;
        Ok(self)
    }

    /// Resolve the subdomain under `domain` instead of fulfil.io.
    #[track_caller]
    pub fn with_domain(mut self, domain: &str) -> Result<Self, FulfilError> {
        self.host = resolve_host(&self.subdomain, domain)?;
        Ok(self)
    }

    #[track_caller]
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, FulfilError> {
        self.http = http_client(timeout)?;
        Ok(self)
    }

    pub fn subdomain(&self) -> &str {
        &self.subdomain
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn host(&self) -> &Url {
        &self.host
    }

    /// URL to send the user to. Scopes are joined with spaces.
    pub fn create_authorization_url(
        &self,
        redirect_uri: &str,
        scope: &[&str],
    ) -> Result<AuthorizationUrl, FulfilError> {
        let state = Uuid::new_v4().simple().to_string();
        let mut url = self.host.join(AUTHORIZE_PATH)?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", &scope.join(" "))
            .append_pair("state", &state);

        debug!("Authorization URL for '{}' built", self.subdomain);
        Ok(AuthorizationUrl { url, state })
    }

    /// Exchange an authorization code for an access token.
    pub async fn get_token(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, FulfilError> {
        let url = self.host.join(TOKEN_PATH)?;
        let form = [
            ("grant_type", AUTHORIZATION_CODE_GRANT),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose()),
        ];

        let response = self.http.post(url).form(&form).send().await?;
        let body = json_response(response).await?;
        let token: TokenResponse = serde_json::from_value(body)?;

        info!("OAuth token issued for '{}'", self.subdomain);
        Ok(token)
    }
}

#[track_caller]
fn http_client(timeout: Duration) -> Result<reqwest::Client, FulfilError> {
    if timeout.is_zero() {
        return Err(FulfilError::validation("Timeout must be greater than zero"));
    }
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}
