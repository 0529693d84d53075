pub mod env;

use crate::client::Client;
use crate::client::builder::{parse_host, resolve_host};
use crate::error::ConfigError;
use crate::oauth::OAuthSession;
use crate::{DEFAULT_USER_AGENT, FULFIL_DOMAIN};

use common::{ErrorLocation, RedactedSecret};

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::Deserialize;
use serde_json::{Map, Value};

const CONFIG_DIR_NAME: &str = "fulfil";
const CONFIG_FILE_NAME: &str = "config.toml";
const DEFAULT_API_KEY_ENV: &str = "FULFIL_API_KEY";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_TIMEOUT_SECS: u64 = 600;

/// Overrides the configured subdomain when set.
pub const SUBDOMAIN_ENV: &str = "FULFIL_SUBDOMAIN";

/// Client settings read from `config.toml`.
///
/// ```toml
/// subdomain = "acme"
/// timeout_secs = 60
///
/// [context]
/// company = 1
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FulfilConfig {
    #[serde(default)]
    pub subdomain: String,

    #[serde(default = "default_domain")]
    pub domain: String,

    /// Full host URL, bypassing subdomain resolution.
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request context sent with every model call.
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl Default for FulfilConfig {
    fn default() -> Self {
        Self {
            subdomain: String::new(),
            domain: default_domain(),
            host: None,
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            api_key_env: default_api_key_env(),
            context: Map::new(),
        }
    }
}

fn default_domain() -> String {
    FULFIL_DOMAIN.to_string()
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

impl FulfilConfig {
    /// `{config_dir}/fulfil/config.toml`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Read and parse `path`. A missing file yields the defaults.
    ///
    /// Not validated here; call [`FulfilConfig::validate`] once overrides
    /// are applied.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("Config file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            warn!("Failed to read config file: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: path.to_path_buf(),
                source: e,
            }
        })?;

        let config = Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::ParseError {
                location, reason, ..
            } => ConfigError::ParseError {
                location,
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })?;

        info!("Config loaded from {}", path.display());
        Ok(config)
    }

    #[track_caller]
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError {
            location: ErrorLocation::from(Location::caller()),
            path: PathBuf::new(),
            reason: e.to_string(),
        })
    }

    /// Apply `FULFIL_SUBDOMAIN` from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(subdomain) = env::read_var(SUBDOMAIN_ENV)? {
            info!("Subdomain overridden by {SUBDOMAIN_ENV}");
            self.subdomain = subdomain;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.subdomain.trim().is_empty() && self.host.is_none() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("No subdomain configured (set 'subdomain' or {SUBDOMAIN_ENV})"),
            });
        }

        if self.host.is_none() {
            resolve_host(&self.subdomain, &self.domain).map_err(|e| {
                ConfigError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: e.to_string(),
                }
            })?;
        }

        if self.timeout_secs == 0 || self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid timeout: {}s (must be 1-{MAX_TIMEOUT_SECS})",
                    self.timeout_secs
                ),
            });
        }

        if self.api_key_env.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "api_key_env cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// API key from the variable named by `api_key_env`, after loading `.env`.
    pub fn load_api_key(&self) -> Result<Option<RedactedSecret>, ConfigError> {
        env::try_load_dotenv();
        let key = env::read_var(&self.api_key_env)?;
        if key.is_none() {
            info!("{} not set, continuing without an API key", self.api_key_env);
        }
        Ok(key.map(RedactedSecret::new))
    }

    /// Validate and build a client, authenticated with `api_key` if given.
    pub fn build_client(&self, api_key: Option<RedactedSecret>) -> Result<Client, ConfigError> {
        self.validate()?;

        let mut builder = Client::builder(self.subdomain.clone())
            .domain(self.domain.clone())
            .user_agent(self.user_agent.clone())
            .context(self.context.clone())
            .timeout(self.timeout());
        if let Some(host) = &self.host {
            builder = builder.host(host.clone());
        }
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        Ok(builder.build()?)
    }

    /// OAuth session for an app on the configured tenant. Honours `host`,
    /// `domain` and `timeout_secs` the same way [`FulfilConfig::build_client`]
    /// does.
    pub fn oauth_session(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<OAuthSession, ConfigError> {
        self.validate()?;

        let host = match &self.host {
            Some(host) => parse_host(host)?,
            None => resolve_host(&self.subdomain, &self.domain)?,
        };
        Ok(OAuthSession::assemble(
            &self.subdomain,
            client_id.to_string(),
            RedactedSecret::from(client_secret),
            host,
            self.timeout(),
        )?)
    }
}
