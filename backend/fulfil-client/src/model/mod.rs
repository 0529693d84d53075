//! Model proxies: one generic set of verbs for every remote collection.
//!
//! [`ModelApi`] declares three transport primitives (`call`, `get`, `find`)
//! and builds every other verb on top of `call`, so the real [`Model`] and
//! the test double in [`crate::mock`] share the same argument encoding.

pub(crate) mod pagination;
pub mod query;

pub use pagination::DEFAULT_BATCH_SIZE;
pub use query::Query;

use crate::client::Client;
use crate::error::FulfilError;

use futures_util::Stream;
use log::{debug, trace};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

const ATTACHMENT_MODEL: &str = "ir.attachment";

/// Anything that hands out model proxies by name.
///
/// Implemented by [`Client`] and by [`crate::mock::MockFulfil`]; code written
/// against this trait can be exercised without a network.
pub trait FulfilApi {
    type Model<'a>: ModelApi
    where
        Self: 'a;

    fn model<'a>(&'a self, name: &str) -> Self::Model<'a>;
}

/// Verbs available on every model.
///
/// Domains and orders are JSON values in Fulfil's syntax, e.g.
/// `json!([["state", "=", "done"]])` and `json!([["create_date", "DESC"]])`.
#[allow(async_fn_in_trait)]
pub trait ModelApi {
    /// Dotted model name, e.g. `sale.sale`.
    fn name(&self) -> &str;

    /// Invoke a remote method with positional arguments.
    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, FulfilError>;

    /// Fetch one record by id.
    async fn get(&self, id: i64) -> Result<Value, FulfilError>;

    /// Paged search through the REST listing endpoint.
    async fn find(&self, query: &FindQuery) -> Result<Vec<Value>, FulfilError>;

    /// A proxy for the same model whose calls also carry `context`, which
    /// wins over this proxy's own context on conflicting keys.
    fn merge_context(&self, context: Map<String, Value>) -> Self
    where
        Self: Sized;

    async fn search(
        &self,
        domain: Value,
        offset: Option<usize>,
        limit: Option<usize>,
        order: Option<Value>,
    ) -> Result<Vec<i64>, FulfilError> {
        let args = vec![domain, json!(offset), json!(limit), order.unwrap_or(Value::Null)];
        decode(self.call("search", args).await?)
    }

    async fn read(&self, ids: &[i64], fields: &[&str]) -> Result<Vec<Value>, FulfilError> {
        decode(self.call("read", vec![json!(ids), json!(fields)]).await?)
    }

    async fn search_read(
        &self,
        domain: Value,
        offset: Option<usize>,
        limit: Option<usize>,
        order: Option<Value>,
        fields: &[&str],
    ) -> Result<Vec<Value>, FulfilError> {
        let args = vec![
            domain,
            json!(offset),
            json!(limit),
            order.unwrap_or(Value::Null),
            json!(fields),
        ];
        decode(self.call("search_read", args).await?)
    }

    async fn search_count(&self, domain: Value) -> Result<u64, FulfilError> {
        decode(self.call("search_count", vec![domain]).await?)
    }

    /// Create records from field maps; returns the new ids in order.
    async fn create(&self, records: Vec<Value>) -> Result<Vec<i64>, FulfilError> {
        decode(self.call("create", vec![Value::Array(records)]).await?)
    }

    /// Apply the same field values to every id. `Ok(())` means the server
    /// accepted the update.
    async fn write(&self, ids: &[i64], values: Value) -> Result<(), FulfilError> {
        self.call("write", vec![json!(ids), values]).await?;
        Ok(())
    }

    async fn delete(&self, ids: &[i64]) -> Result<(), FulfilError> {
        self.call("delete", vec![json!(ids)]).await?;
        Ok(())
    }

    /// Every record matching `domain`, fetched lazily in pages.
    ///
    /// Each page is one `search_read` at the next offset; the stream ends on
    /// the first page shorter than the batch size. `batch_size` defaults to
    /// [`DEFAULT_BATCH_SIZE`]. The stream is single-pass.
    fn search_read_all<'a>(
        &'a self,
        domain: Value,
        order: Option<Value>,
        fields: Vec<String>,
        batch_size: Option<usize>,
    ) -> impl Stream<Item = Result<Value, FulfilError>> + 'a
    where
        Self: Sized,
    {
        pagination::search_read_all(self, domain, order, fields, batch_size)
    }

    /// Chainable query over this model; see [`Query`].
    fn query(self) -> Query<Self>
    where
        Self: Sized,
    {
        Query::new(self)
    }

    /// Handle on a single record of this model.
    fn into_record(self, id: i64) -> Record<Self>
    where
        Self: Sized,
    {
        Record { model: self, id }
    }
}

/// Decode a call result into the verb's return type.
///
/// Fulfil answers `null` for methods without a return value; that decodes
/// to the type's empty value.
pub(crate) fn decode<T: DeserializeOwned + Default>(value: Value) -> Result<T, FulfilError> {
    if value.is_null() {
        return Ok(T::default());
    }
    Ok(serde_json::from_value(value)?)
}

/// Parameters of the REST listing endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct FindQuery {
    pub filter: Value,
    pub page: u32,
    pub per_page: u32,
    /// Field names; relationship paths like `shipment_address.country.code`
    /// are allowed.
    pub fields: Vec<String>,
    pub order: Option<Value>,
}

impl Default for FindQuery {
    fn default() -> Self {
        Self {
            filter: Value::Array(Vec::new()),
            page: 1,
            per_page: 10,
            fields: Vec::new(),
            order: None,
        }
    }
}

impl FindQuery {
    pub fn new(filter: Value) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn order(mut self, order: Value) -> Self {
        self.order = Some(order);
        self
    }

    /// Query-string pairs, without the context.
    pub(crate) fn to_query(&self) -> Result<Vec<(String, String)>, FulfilError> {
        let mut query = vec![
            (String::from("filter"), serde_json::to_string(&self.filter)?),
            (String::from("page"), self.page.to_string()),
            (String::from("per_page"), self.per_page.to_string()),
        ];
        query.extend(
            self.fields
                .iter()
                .map(|field| (String::from("field"), field.clone())),
        );
        if let Some(order) = &self.order {
            query.push((String::from("order"), serde_json::to_string(order)?));
        }
        Ok(query)
    }
}

/// Proxy for one remote model, bound to a client.
#[derive(Debug, Clone)]
pub struct Model<'c> {
    client: &'c Client,
    name: String,
    context: Map<String, Value>,
}

impl<'c> Model<'c> {
    pub(crate) fn new(client: &'c Client, name: &str) -> Self {
        Self {
            client,
            name: name.to_string(),
            context: Map::new(),
        }
    }

    /// Context values merged over the client context for calls on this proxy.
    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    /// Resource path relative to the API root, e.g. `model/sale.sale`.
    pub fn path(&self) -> String {
        format!("model/{}", self.name)
    }

    pub fn client(&self) -> &'c Client {
        self.client
    }

    /// Attach a file, downloaded by the server from a public URL, to a record.
    pub async fn attach(&self, id: i64, filename: &str, url: &str) -> Result<Value, FulfilError> {
        self.client
            .model(ATTACHMENT_MODEL)
            .call(
                "add_attachment_from_url",
                vec![
                    json!(filename),
                    json!(url),
                    json!(format!("{},{id}", self.name)),
                ],
            )
            .await
    }
}

impl ModelApi for Model<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, FulfilError> {
        debug!("{}.{}", self.name, method);
        trace!("{}.{} args: {:?}", self.name, method, args);

        let query = [self.client.context_param(&self.context)?];
        let path = format!("{}/{method}", self.path());
        self.client
            .request(Method::PUT, &path, &query, Some(&Value::Array(args)))
            .await
    }

    async fn get(&self, id: i64) -> Result<Value, FulfilError> {
        debug!("{}.get({id})", self.name);

        let query = [self.client.context_param(&self.context)?];
        let path = format!("{}/{id}", self.path());
        self.client.request(Method::GET, &path, &query, None).await
    }

    fn merge_context(&self, context: Map<String, Value>) -> Self {
        let mut merged = self.clone();
        merged.context.extend(context);
        merged
    }

    async fn find(&self, query: &FindQuery) -> Result<Vec<Value>, FulfilError> {
        debug!("{}.find(page={}, per_page={})", self.name, query.page, query.per_page);

        let mut params = query.to_query()?;
        params.push(self.client.context_param(&self.context)?);
        decode(
            self.client
                .request(Method::GET, &self.path(), &params, None)
                .await?,
        )
    }
}

/// One record of a model.
#[derive(Debug, Clone)]
pub struct Record<M> {
    model: M,
    id: i64,
}

impl<M: ModelApi> Record<M> {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub async fn get(&self) -> Result<Value, FulfilError> {
        self.model.get(self.id).await
    }

    /// Write `values` to this record right away.
    pub async fn update(&self, values: Map<String, Value>) -> Result<(), FulfilError> {
        self.model.write(&[self.id], Value::Object(values)).await
    }
}
