//! Chainable queries composed into `search`/`search_read` calls.
//!
//! ```
//! use fulfil_client::{FulfilApi, MockFulfil, ModelApi};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), fulfil_client::FulfilError> {
//! let fulfil = MockFulfil::new();
//! let open_orders = fulfil
//!     .model("sale.sale")
//!     .query()
//!     .filter_by("state", "processing")
//!     .order_by(json!([["sale_date", "DESC"]]))
//!     .limit(20);
//!
//! let orders = open_orders.all().await?;
//! let total = open_orders.count().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::FulfilError;
use crate::model::ModelApi;

use common::ErrorLocation;

use log::{debug, info};
use serde_json::{Map, Value, json};

const ACTIVE_TEST_KEY: &str = "active_test";

/// A domain, ordering and window over one model.
///
/// Builder methods consume the query and return the refined one; clone a
/// query to branch it. Nothing is sent until a terminal method such as
/// [`Query::all`] or [`Query::count`] runs, and each of those is one
/// round-trip (two for [`Query::delete`] and [`Query::archive`]).
///
/// Archived records are excluded unless [`Query::show_active_only`] is
/// turned off.
#[derive(Debug, Clone)]
pub struct Query<M> {
    model: M,
    domain: Vec<Value>,
    fields: Vec<String>,
    order: Option<Value>,
    limit: Option<usize>,
    offset: Option<usize>,
    active_only: bool,
}

impl<M: ModelApi> Query<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            domain: Vec::new(),
            fields: Vec::new(),
            order: None,
            limit: None,
            offset: None,
            active_only: true,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// The domain as sent to the server.
    pub fn domain(&self) -> Value {
        Value::Array(self.domain.clone())
    }

    /// Add an equality clause, `[field, "=", value]`.
    pub fn filter_by(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.domain.push(json!([field, "=", value.into()]));
        self
    }

    /// Replace the domain. A JSON array is taken as the clause list;
    /// `null` clears it.
    pub fn filter_by_domain(mut self, domain: Value) -> Self {
        self.domain = match domain {
            Value::Array(clauses) => clauses,
            Value::Null => Vec::new(),
            clause => vec![clause],
        };
        self
    }

    /// Fields to read; empty reads the server's default set.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by(mut self, order: Value) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn show_active_only(mut self, active_only: bool) -> Self {
        self.active_only = active_only;
        self
    }

    fn scoped(&self, active_only: bool) -> M {
        let mut context = Map::new();
        context.insert(ACTIVE_TEST_KEY.to_string(), Value::Bool(active_only));
        self.model.merge_context(context)
    }

    async fn read_window(
        &self,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<Value>, FulfilError> {
        let fields: Vec<&str> = self.fields.iter().map(String::as_str).collect();
        self.scoped(self.active_only)
            .search_read(self.domain(), offset, limit, self.order.clone(), &fields)
            .await
    }

    /// Every matching record within the limit and offset.
    pub async fn all(&self) -> Result<Vec<Value>, FulfilError> {
        self.read_window(self.offset, self.limit).await
    }

    pub async fn count(&self) -> Result<u64, FulfilError> {
        self.scoped(self.active_only)
            .search_count(self.domain())
            .await
    }

    pub async fn exists(&self) -> Result<bool, FulfilError> {
        Ok(self.count().await? > 0)
    }

    /// The first matching record, if any.
    pub async fn first(&self) -> Result<Option<Value>, FulfilError> {
        Ok(self.read_window(self.offset, Some(1)).await?.into_iter().next())
    }

    /// The record with `id`, archived or not. Ignores the domain.
    pub async fn get(&self, id: i64) -> Result<Option<Value>, FulfilError> {
        let fields: Vec<&str> = self.fields.iter().map(String::as_str).collect();
        let records = self
            .scoped(false)
            .search_read(json!([["id", "=", id]]), None, None, None, &fields)
            .await?;
        Ok(records.into_iter().next())
    }

    /// Exactly one matching record.
    ///
    /// Fails with [`FulfilError::NoResultFound`] or
    /// [`FulfilError::MultipleResultsFound`] otherwise.
    pub async fn one(&self) -> Result<Value, FulfilError> {
        let mut records = self.read_window(self.offset, Some(2)).await?;
        match records.len() {
            1 => Ok(records.remove(0)),
            0 => Err(FulfilError::NoResultFound {
                model: self.model.name().to_string(),
                location: ErrorLocation::caller(),
            }),
            _ => Err(FulfilError::MultipleResultsFound {
                model: self.model.name().to_string(),
                location: ErrorLocation::caller(),
            }),
        }
    }

    async fn matching_ids(&self) -> Result<Vec<i64>, FulfilError> {
        self.scoped(self.active_only)
            .search(self.domain(), None, None, None)
            .await
    }

    /// Delete every matching record, ignoring limit and offset. Returns
    /// the deleted ids.
    ///
    /// The server refuses deletion on many models or states; that refusal
    /// is returned as an error.
    pub async fn delete(&self) -> Result<Vec<i64>, FulfilError> {
        let ids = self.matching_ids().await?;
        if ids.is_empty() {
            debug!("{}: nothing to delete", self.model.name());
            return Ok(ids);
        }
        self.model.delete(&ids).await?;
        info!("{}: deleted {} records", self.model.name(), ids.len());
        Ok(ids)
    }

    /// Archive every matching record by clearing `active`. Returns the
    /// archived ids.
    pub async fn archive(&self) -> Result<Vec<i64>, FulfilError> {
        let ids = self.matching_ids().await?;
        if ids.is_empty() {
            debug!("{}: nothing to archive", self.model.name());
            return Ok(ids);
        }
        self.model.write(&ids, json!({"active": false})).await?;
        info!("{}: archived {} records", self.model.name(), ids.len());
        Ok(ids)
    }
}
