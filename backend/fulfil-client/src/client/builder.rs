use crate::auth::Auth;
use crate::client::Client;
use crate::error::FulfilError;
use crate::{API_PATH, DEFAULT_USER_AGENT, FULFIL_DOMAIN, LOCALHOST_HOST, LOCALHOST_SUBDOMAIN};

use common::RedactedSecret;

use std::sync::OnceLock;
use std::time::Duration;

use log::debug;
use regex::Regex;
use serde_json::{Map, Value};
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const SUBDOMAIN_PATTERN: &str = r"^[A-Za-z0-9](?:[A-Za-z0-9_-]*[A-Za-z0-9])?$";

static SUBDOMAIN_REGEX: OnceLock<Regex> = OnceLock::new();

pub(crate) fn get_subdomain_regex() -> &'static Regex {
    SUBDOMAIN_REGEX.get_or_init(|| Regex::new(SUBDOMAIN_PATTERN).expect("valid regex pattern"))
}

/// Resolve the tenant host, e.g. `https://acme.fulfil.io/`.
///
/// Pure function of its inputs. `localhost` maps to a local development
/// server on port 8000.
#[track_caller]
pub fn resolve_host(subdomain: &str, domain: &str) -> Result<Url, FulfilError> {
    if subdomain == LOCALHOST_SUBDOMAIN {
        return Ok(Url::parse(LOCALHOST_HOST)?);
    }

    if !get_subdomain_regex().is_match(subdomain) {
        return Err(FulfilError::validation(format!(
            "Invalid subdomain: '{subdomain}'"
        )));
    }

    Ok(Url::parse(&format!("https://{subdomain}.{domain}/"))?)
}

/// Parse an explicit host override, normalising it to end with `/` so that
/// relative joins keep any path prefix.
#[track_caller]
pub(crate) fn parse_host(host: &str) -> Result<Url, FulfilError> {
    let mut url = Url::parse(host)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Builder for [`Client`].
///
/// Nothing here touches the network; `build` only validates and assembles
/// the HTTP client.
#[derive(Debug)]
pub struct ClientBuilder {
    subdomain: String,
    domain: String,
    host: Option<String>,
    auth: Option<Auth>,
    user_agent: String,
    context: Map<String, Value>,
    timeout: Duration,
}

impl ClientBuilder {
    pub(crate) fn new(subdomain: impl Into<String>) -> Self {
        Self {
            subdomain: subdomain.into(),
            domain: FULFIL_DOMAIN.to_string(),
            host: None,
            auth: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            context: Map::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Platform domain the subdomain lives under. Defaults to `fulfil.io`.
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Use this host verbatim instead of deriving it from the subdomain.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<RedactedSecret>) -> Self {
        self.auth = Some(Auth::ApiKey(key.into()));
        self
    }

    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[track_caller]
    pub fn build(self) -> Result<Client, FulfilError> {
        let host = match &self.host {
            Some(host) => parse_host(host)?,
            None => resolve_host(&self.subdomain, &self.domain)?,
        };
        let base_url = host.join(API_PATH)?;

        if self.timeout.is_zero() {
            return Err(FulfilError::validation("Timeout must be greater than zero"));
        }

        let http = reqwest::Client::builder().timeout(self.timeout).build()?;

        debug!(
            "Fulfil client for '{}' at {} (auth: {})",
            self.subdomain,
            base_url,
            self.auth.as_ref().map_or("none", Auth::kind)
        );

        Ok(Client {
            subdomain: self.subdomain,
            host,
            base_url,
            http,
            auth: self.auth,
            user_agent: self.user_agent,
            context: self.context,
        })
    }
}
