//! Multi-step server wizards.
//!
//! A wizard is a small state machine held on the server. [`Wizard::start`]
//! opens a session and runs its start state; each later
//! [`WizardSession::execute`] submits the data collected so far for one
//! state. Sessions are closed explicitly with [`WizardSession::finish`].

use crate::client::Client;
use crate::error::FulfilError;

use std::collections::BTreeMap;

use log::debug;
use reqwest::Method;
use serde_json::{Map, Value, json};

/// Form values per wizard state.
pub type StateData = BTreeMap<String, Map<String, Value>>;

#[derive(Debug, Clone)]
pub struct Wizard<'c> {
    client: &'c Client,
    name: String,
    context: Map<String, Value>,
}

impl<'c> Wizard<'c> {
    pub(crate) fn new(client: &'c Client, name: &str) -> Self {
        Self {
            client,
            name: name.to_string(),
            context: Map::new(),
        }
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    pub fn path(&self) -> String {
        format!("wizard/{}", self.name)
    }

    /// Open a server session. Returns `(session_id, start_state, end_state)`.
    pub async fn create(&self) -> Result<(i64, String, String), FulfilError> {
        debug!("Wizard {}.create", self.name);

        let query = [self.client.context_param(&self.context)?];
        let path = format!("{}/create", self.path());
        let result = self
            .client
            .request(Method::PUT, &path, &query, Some(&json!([])))
            .await?;

        serde_json::from_value(result.clone())
            .map_err(|_| FulfilError::json(format!("Unexpected wizard create result: {result}")))
    }

    pub async fn execute(
        &self,
        session_id: i64,
        data: &StateData,
        state: &str,
        context: &Map<String, Value>,
    ) -> Result<Value, FulfilError> {
        debug!("Wizard {}.execute({state})", self.name);

        let mut overrides = self.context.clone();
        overrides.extend(context.iter().map(|(k, v)| (k.clone(), v.clone())));
        let query = [self.client.context_param(&overrides)?];
        let path = format!("{}/execute", self.path());
        self.client
            .request(
                Method::PUT,
                &path,
                &query,
                Some(&json!([session_id, data, state])),
            )
            .await
    }

    pub async fn delete(&self, session_id: i64) -> Result<Value, FulfilError> {
        debug!("Wizard {}.delete", self.name);

        let path = format!("{}/delete", self.path());
        self.client
            .request(Method::PUT, &path, &[], Some(&json!([session_id])))
            .await
    }

    /// Open a session and run its start state.
    pub async fn start(&self) -> Result<WizardSession<'c>, FulfilError> {
        let (session_id, start_state, end_state) = self.create().await?;
        let mut session = WizardSession {
            wizard: self.clone(),
            session_id,
            start_state: start_state.clone(),
            end_state,
            state: start_state.clone(),
            data: StateData::new(),
            last_result: Value::Null,
        };
        session.execute(&start_state, &Map::new()).await?;
        Ok(session)
    }
}

#[derive(Debug)]
pub struct WizardSession<'c> {
    wizard: Wizard<'c>,
    session_id: i64,
    start_state: String,
    end_state: String,
    state: String,
    data: StateData,
    last_result: Value,
}

impl WizardSession<'_> {
    pub fn session_id(&self) -> i64 {
        self.session_id
    }

    pub fn start_state(&self) -> &str {
        &self.start_state
    }

    pub fn end_state(&self) -> &str {
        &self.end_state
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == self.end_state
    }

    /// Collected form data, keyed by state name.
    pub fn data(&self) -> &StateData {
        &self.data
    }

    /// Mutable form data for one state, created on first access.
    pub fn data_mut(&mut self, state: &str) -> &mut Map<String, Value> {
        self.data.entry(state.to_string()).or_default()
    }

    pub fn last_result(&self) -> &Value {
        &self.last_result
    }

    /// Run `state` on the server.
    ///
    /// A result carrying a `view` keeps the session at that view and merges
    /// the view defaults into the view state's data; any other result ends
    /// the session. Executing once the end state is reached is a no-op that
    /// returns `null`.
    pub async fn execute(
        &mut self,
        state: &str,
        context: &Map<String, Value>,
    ) -> Result<Value, FulfilError> {
        self.state = state.to_string();
        if self.is_finished() {
            return Ok(Value::Null);
        }

        let result = self
            .wizard
            .execute(self.session_id, &self.data, &self.state, context)
            .await?;

        match result.get("view") {
            Some(view) => {
                let view_state = view
                    .get("state")
                    .and_then(Value::as_str)
                    .ok_or_else(|| FulfilError::json("Wizard view has no state"))?
                    .to_string();
                if let Some(Value::Object(defaults)) = view.get("defaults") {
                    let defaults = defaults.clone();
                    self.data_mut(&view_state).extend(defaults);
                }
            }
            None => self.state = self.end_state.clone(),
        }

        self.last_result = result.clone();
        Ok(result)
    }

    /// Delete the server session.
    pub async fn finish(self) -> Result<(), FulfilError> {
        self.wizard.delete(self.session_id).await?;
        Ok(())
    }
}
