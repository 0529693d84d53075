//! Async client for the Fulfil REST API.
//!
//! A [`Client`] is bound to one tenant subdomain. Remote collections are
//! addressed by their dotted model name through [`Client::model`], and every
//! verb on the returned proxy is a single HTTP round-trip:
//!
//! ```no_run
//! use fulfil_client::{Client, FulfilError, ModelApi};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), FulfilError> {
//! let client = Client::builder("acme").api_key("secret").build()?;
//! let product = client.model("product.product");
//! let ids = product.search(json!([["salable", "=", true]]), None, Some(10), None).await?;
//! let records = product.read(&ids, &["code", "list_price"]).await?;
//! # Ok(())
//! # }
//! ```

pub mod async_result;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod mock;
pub mod model;
pub mod oauth;
pub mod report;
pub mod serialization;
pub mod webhook;
pub mod wizard;

pub use async_result::{AsyncResult, TaskState};
pub use auth::{Auth, SessionAuth};
pub use client::{Client, ClientBuilder};
pub use config::FulfilConfig;
pub use error::{ConfigError, FulfilError};
pub use mock::{MockCall, MockFulfil, MockModel};
pub use model::{FindQuery, FulfilApi, Model, ModelApi, Query, Record};
pub use oauth::{AuthorizationUrl, OAuthSession, TokenResponse};
pub use report::{InteractiveReport, Report};
pub use serialization::FulfilValue;
pub use webhook::verify_webhook;
pub use wizard::{Wizard, WizardSession};

#[cfg(test)]
mod tests;

pub const FULFIL_DOMAIN: &str = "fulfil.io";
pub const LOCALHOST_SUBDOMAIN: &str = "localhost";
pub const LOCALHOST_HOST: &str = const_format::concatcp!("http://", LOCALHOST_SUBDOMAIN, ":8000/");
pub const API_PATH: &str = "api/v2/";
pub const DEFAULT_USER_AGENT: &str =
    const_format::concatcp!("fulfil-client-rs/", env!("CARGO_PKG_VERSION"));
