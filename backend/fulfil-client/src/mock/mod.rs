//! In-memory stand-in for a Fulfil tenant, for tests.
//!
//! Write application code against [`FulfilApi`] and hand it a
//! [`MockFulfil`] in tests. Each model name maps to one shared
//! [`MockModel`] that records every verb and answers from programmed
//! values:
//!
//! ```
//! use fulfil_client::{FulfilApi, MockFulfil, ModelApi};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), fulfil_client::FulfilError> {
//! let fulfil = MockFulfil::new();
//! fulfil.model("product.product").return_value("search", json!([1, 2, 3]));
//!
//! let ids = fulfil.model("product.product").search(json!([]), None, None, None).await?;
//! assert_eq!(ids, vec![1, 2, 3]);
//! fulfil.model("product.product").assert_called("search");
//! # Ok(())
//! # }
//! ```

use crate::error::FulfilError;
use crate::model::{FindQuery, FulfilApi, ModelApi, decode, pagination};

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::stream::{self, LocalBoxStream, Stream, StreamExt};
use log::trace;
use serde_json::{Map, Value, json};

pub const MOCK_SUBDOMAIN: &str = "mock-test";

/// Programmed behaviour for one remote method, computed from its arguments.
pub type SideEffect = Arc<dyn Fn(&[Value]) -> Result<Value, FulfilError> + Send + Sync>;

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub method: String,
    pub args: Vec<Value>,
    /// Context added through [`ModelApi::merge_context`].
    pub context: Map<String, Value>,
}

#[derive(Default)]
struct MockState {
    calls: Vec<MockCall>,
    returns: HashMap<String, Value>,
    side_effects: HashMap<String, SideEffect>,
}

/// Recording stand-in for one model. Clones share state.
#[derive(Clone)]
pub struct MockModel {
    name: String,
    context: Map<String, Value>,
    state: Arc<Mutex<MockState>>,
}

impl fmt::Debug for MockModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockModel")
            .field("name", &self.name)
            .field("calls", &self.lock().calls.len())
            .finish()
    }
}

impl MockModel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            context: Map::new(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    // A panicking assertion in one test must not poison the mock for the rest.
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer every call to `method` with `value`.
    pub fn return_value(&self, method: &str, value: Value) -> &Self {
        self.lock().returns.insert(method.to_string(), value);
        self
    }

    /// Answer calls to `method` by running `effect` on the arguments.
    /// Takes precedence over [`MockModel::return_value`].
    pub fn side_effect<F>(&self, method: &str, effect: F) -> &Self
    where
        F: Fn(&[Value]) -> Result<Value, FulfilError> + Send + Sync + 'static,
    {
        self.lock()
            .side_effects
            .insert(method.to_string(), Arc::new(effect));
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Argument lists of every call to `method`, oldest first.
    pub fn calls_to(&self, method: &str) -> Vec<Vec<Value>> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.method == method)
            .map(|call| call.args.clone())
            .collect()
    }

    /// # Panics
    /// When `method` was never called.
    #[track_caller]
    pub fn assert_called(&self, method: &str) {
        assert!(
            !self.calls_to(method).is_empty(),
            "expected {}.{method} to have been called",
            self.name
        );
    }

    /// Checks the most recent call to `method`.
    ///
    /// # Panics
    /// When `method` was never called or last called with other arguments.
    #[track_caller]
    pub fn assert_called_with(&self, method: &str, args: &[Value]) {
        let calls = self.calls_to(method);
        match calls.last() {
            Some(last) => assert_eq!(
                last.as_slice(),
                args,
                "{}.{method} last called with different arguments",
                self.name
            ),
            None => panic!("expected {}.{method} to have been called", self.name),
        }
    }

    /// # Panics
    /// When `method` was called.
    #[track_caller]
    pub fn assert_not_called(&self, method: &str) {
        let calls = self.calls_to(method);
        assert!(
            calls.is_empty(),
            "expected {}.{method} not to be called, was called {} times",
            self.name,
            calls.len()
        );
    }

    /// Forget recorded calls and programmed answers.
    pub fn reset(&self) {
        *self.lock() = MockState::default();
    }

    fn is_programmed(&self, method: &str) -> bool {
        let state = self.lock();
        state.side_effects.contains_key(method) || state.returns.contains_key(method)
    }

    fn respond(&self, method: &str, args: Vec<Value>) -> Result<Value, FulfilError> {
        trace!("mock {}.{method}({args:?})", self.name);

        let (effect, value) = {
            let mut state = self.lock();
            state.calls.push(MockCall {
                method: method.to_string(),
                args: args.clone(),
                context: self.context.clone(),
            });
            (
                state.side_effects.get(method).cloned(),
                state.returns.get(method).cloned(),
            )
        };

        match effect {
            Some(effect) => effect(&args),
            None => Ok(value.unwrap_or(Value::Null)),
        }
    }
}

impl ModelApi for MockModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, FulfilError> {
        self.respond(method, args)
    }

    async fn get(&self, id: i64) -> Result<Value, FulfilError> {
        self.respond("get", vec![json!(id)])
    }

    /// Shares recorded calls and programmed answers with `self`.
    fn merge_context(&self, context: Map<String, Value>) -> Self {
        let mut merged = self.clone();
        merged.context.extend(context);
        merged
    }

    async fn find(&self, query: &FindQuery) -> Result<Vec<Value>, FulfilError> {
        let args = vec![
            query.filter.clone(),
            json!(query.page),
            json!(query.per_page),
            json!(query.fields),
            query.order.clone().unwrap_or(Value::Null),
        ];
        decode(self.respond("find", args)?)
    }

    /// Recorded as a single `search_read_all` call. When that method is
    /// programmed its answer is streamed as-is; otherwise pages are fetched
    /// through `search_read` like the real client does.
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
        let programmed = self.is_programmed("search_read_all");
        let answer = self.respond(
            "search_read_all",
            vec![
                domain.clone(),
                order.clone().unwrap_or(Value::Null),
                json!(fields),
            ],
        );

        let records: LocalBoxStream<'a, Result<Value, FulfilError>> = if programmed {
            match answer.and_then(decode::<Vec<Value>>) {
                Ok(records) => stream::iter(records.into_iter().map(Ok)).boxed_local(),
                Err(e) => stream::once(async move { Err(e) }).boxed_local(),
            }
        } else {
            pagination::search_read_all(self, domain, order, fields, batch_size).boxed_local()
        };
        records
    }
}

/// Stand-in for [`crate::Client`].
///
/// `model(name)` hands out the same [`MockModel`] for the same name until
/// [`MockFulfil::reset`]. Clones share the registry.
#[derive(Debug, Clone, Default)]
pub struct MockFulfil {
    models: Arc<Mutex<HashMap<String, MockModel>>>,
}

impl MockFulfil {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subdomain(&self) -> &str {
        MOCK_SUBDOMAIN
    }

    /// Names of every model handed out so far.
    pub fn model_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Drop every model, with its recorded calls and programmed answers.
    pub fn reset(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, MockModel>> {
        self.models.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FulfilApi for MockFulfil {
    type Model<'a> = MockModel;

    fn model<'a>(&'a self, name: &str) -> MockModel {
        self.lock()
            .entry(name.to_string())
            .or_insert_with(|| MockModel::new(name))
            .clone()
    }
}
