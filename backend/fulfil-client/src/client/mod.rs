//! The tenant-bound client and its raw request entry point.

pub mod builder;
pub(crate) mod response;

pub use builder::{ClientBuilder, DEFAULT_TIMEOUT, resolve_host};

use crate::auth::{Auth, SessionAuth};
use crate::error::FulfilError;
use crate::model::{FulfilApi, Model, ModelApi, Record};
use crate::report::{InteractiveReport, Report};
use crate::serialization::FulfilValue;
use crate::wizard::Wizard;

use common::{ErrorLocation, HttpStatusCode, RedactedSecret};

use chrono::NaiveDate;
use log::{debug, info};
use reqwest::header::USER_AGENT;
use reqwest::{Method, RequestBuilder};
use serde_json::{Map, Value, json};
use url::Url;

const LOGIN_METHOD: &str = "common.db.login";

/// Client for one Fulfil tenant.
///
/// Holds configuration only: base URL, credentials, user agent and the
/// default request context. Auth is replaced through [`Client::set_auth`],
/// which needs `&mut self`, so it cannot change under a borrowed [`Model`].
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) subdomain: String,
    pub(crate) host: Url,
    pub(crate) base_url: Url,
    pub(crate) http: reqwest::Client,
    pub(crate) auth: Option<Auth>,
    pub(crate) user_agent: String,
    pub(crate) context: Map<String, Value>,
}

impl Client {
    /// Client for `subdomain` on the default platform domain, without auth.
    #[track_caller]
    pub fn new(subdomain: &str) -> Result<Self, FulfilError> {
        ClientBuilder::new(subdomain).build()
    }

    pub fn builder(subdomain: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(subdomain)
    }

    pub fn subdomain(&self) -> &str {
        &self.subdomain
    }

    /// Tenant root, e.g. `https://acme.fulfil.io/`.
    pub fn host(&self) -> &Url {
        &self.host
    }

    /// API root, e.g. `https://acme.fulfil.io/api/v2/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn auth(&self) -> Option<&Auth> {
        self.auth.as_ref()
    }

    /// Replace the credentials used by subsequent requests.
    pub fn set_auth(&mut self, auth: Option<Auth>) {
        debug!(
            "Auth set to {}",
            auth.as_ref().map_or("none", Auth::kind)
        );
        self.auth = auth;
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) {
        self.user_agent = user_agent.into();
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    pub fn set_context(&mut self, context: Map<String, Value>) {
        self.context = context;
    }

    /// Proxy for the model with the given dotted name.
    pub fn model(&self, name: &str) -> Model<'_> {
        Model::new(self, name)
    }

    pub fn record(&self, model_name: &str, id: i64) -> Record<Model<'_>> {
        self.model(model_name).into_record(id)
    }

    pub fn report(&self, name: &str) -> Report<'_> {
        Report::new(self, name)
    }

    pub fn interactive_report(&self, model_name: &str) -> InteractiveReport<'_> {
        InteractiveReport::new(self, model_name)
    }

    pub fn wizard(&self, name: &str) -> Wizard<'_> {
        Wizard::new(self, name)
    }

    /// Issue one request against a path relative to [`Client::base_url`].
    ///
    /// Returns the decoded JSON body, or the error matching the failure:
    /// transport, HTTP status, or decoding.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, FulfilError> {
        let url = self.base_url.join(path)?;
        let request = self.http.request(method, url).query(query);
        self.send(request, body).await
    }

    pub(crate) async fn send(
        &self,
        request: RequestBuilder,
        body: Option<&Value>,
    ) -> Result<Value, FulfilError> {
        let mut request = self.prepare_request(request);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        response::json_response(response).await
    }

    fn prepare_request(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(USER_AGENT, &self.user_agent);
        match &self.auth {
            Some(auth) => auth.apply(request),
            None => request,
        }
    }

    /// JSON encoding of `context` merged over the client context.
    pub(crate) fn context_param(
        &self,
        overrides: &Map<String, Value>,
    ) -> Result<(String, String), FulfilError> {
        let mut context = self.context.clone();
        context.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok((String::from("context"), serde_json::to_string(&context)?))
    }

    /// Log in with a username and password.
    ///
    /// Performs exactly one round-trip and returns the session credentials;
    /// the client's auth is left untouched so the caller decides whether to
    /// store them with [`Client::set_auth`].
    pub async fn login(&self, login: &str, password: &str) -> Result<SessionAuth, FulfilError> {
        let body = json!({
            "method": LOGIN_METHOD,
            "params": [login, password],
        });

        let request = self.http.post(self.host.clone());
        let response = self.send(request, Some(&body)).await?;

        let result = response
            .get("result")
            .ok_or_else(|| FulfilError::json("Login response has no 'result'"))?;

        match result {
            Value::Array(pair) if pair.len() == 2 => {
                let user_id = pair[0]
                    .as_i64()
                    .ok_or_else(|| FulfilError::json("Login user id is not an integer"))?;
                let session = pair[1]
                    .as_str()
                    .ok_or_else(|| FulfilError::json("Login session is not a string"))?;

                info!("Logged in as '{login}' (user {user_id})");
                Ok(SessionAuth {
                    login: login.to_string(),
                    user_id,
                    session: RedactedSecret::new(session),
                })
            }
            Value::Null | Value::Bool(false) => Err(FulfilError::Authentication {
                status_code: HttpStatusCode::UNAUTHORIZED,
                message: format!("Login rejected for '{login}'"),
                body: Some(response.clone()),
                location: ErrorLocation::caller(),
            }),
            other => Err(FulfilError::json(format!(
                "Unexpected login result: {other}"
            ))),
        }
    }

    /// Fetch the user's preferences and store them as the default context.
    pub async fn refresh_context(&mut self) -> Result<&Map<String, Value>, FulfilError> {
        let preferences = self
            .model("res.user")
            .call("get_preferences", vec![Value::Bool(true)])
            .await?;

        match preferences {
            Value::Object(context) => {
                self.context = context;
                Ok(&self.context)
            }
            other => Err(FulfilError::json(format!(
                "Preferences are not an object: {other}"
            ))),
        }
    }

    /// Server-side current date.
    pub async fn today(&self) -> Result<NaiveDate, FulfilError> {
        let value = self.model("ir.date").call("today", Vec::new()).await?;
        match FulfilValue::from_json(&value)? {
            Some(FulfilValue::Date(date)) => Ok(date),
            _ => Err(FulfilError::json(format!("Expected a date, got {value}"))),
        }
    }

    /// `true` while the current credentials are accepted.
    ///
    /// A 401, a 403, or an error body carrying `"code": 403` means the auth
    /// is dead; any other failure is returned unchanged.
    pub async fn is_auth_alive(&self) -> Result<bool, FulfilError> {
        match self
            .model("ir.model")
            .search(Value::Array(Vec::new()), None, Some(1), None)
            .await
        {
            Ok(_) => Ok(true),
            Err(FulfilError::Authentication { .. }) => Ok(false),
            Err(e) if e.status_code() == Some(HttpStatusCode::FORBIDDEN.0) => Ok(false),
            Err(e) if error_code(&e) == Some(i64::from(HttpStatusCode::FORBIDDEN.0)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Numeric `code` from a decoded error body, e.g. `{"code": 403, ...}`.
fn error_code(error: &FulfilError) -> Option<i64> {
    error.body().and_then(|body| body.get("code")).and_then(Value::as_i64)
}

impl FulfilApi for Client {
    type Model<'a> = Model<'a>;

    fn model<'a>(&'a self, name: &str) -> Model<'a> {
        Client::model(self, name)
    }
}
