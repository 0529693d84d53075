//! Printable and interactive reports.

use crate::client::Client;
use crate::error::FulfilError;

use log::debug;
use reqwest::Method;
use serde_json::{Map, Value, json};

/// A server-rendered report, e.g. `sale.sale` invoices.
#[derive(Debug, Clone)]
pub struct Report<'c> {
    client: &'c Client,
    name: String,
}

impl<'c> Report<'c> {
    pub(crate) fn new(client: &'c Client, name: &str) -> Self {
        Self {
            client,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> String {
        format!("report/{}", self.name)
    }

    /// Render the report for `records`.
    pub async fn execute(
        &self,
        records: &[i64],
        data: Map<String, Value>,
        context: &Map<String, Value>,
    ) -> Result<Value, FulfilError> {
        debug!("Report {} for {} records", self.name, records.len());

        let body = json!({
            "objects": records,
            "data": data,
        });
        let query = [self.client.context_param(context)?];
        self.client
            .request(Method::PUT, &self.path(), &query, Some(&body))
            .await
    }
}

/// A report computed by a model's `execute` method from keyword parameters.
#[derive(Debug, Clone)]
pub struct InteractiveReport<'c> {
    client: &'c Client,
    model_name: String,
}

impl<'c> InteractiveReport<'c> {
    pub(crate) fn new(client: &'c Client, model_name: &str) -> Self {
        Self {
            client,
            model_name: model_name.to_string(),
        }
    }

    pub fn path(&self) -> String {
        format!("model/{}/execute", self.model_name)
    }

    pub async fn execute(
        &self,
        params: Map<String, Value>,
        context: &Map<String, Value>,
    ) -> Result<Value, FulfilError> {
        debug!("Interactive report {}", self.model_name);

        let body = json!([params]);
        let query = [self.client.context_param(context)?];
        self.client
            .request(Method::PUT, &self.path(), &query, Some(&body))
            .await
    }
}
