//! Handles for long-running server tasks.

use crate::client::Client;
use crate::error::FulfilError;

use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, warn};
use reqwest::Method;
use serde_json::{Value, json};

const ASYNC_RESULT_CLASS: &str = "AsyncResult";
const ASYNC_RESULT_PATH: &str = "async-result";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Started,
    Failure,
    Success,
    Retry,
}

impl TaskState {
    pub fn parse(state: &str) -> Option<Self> {
        match state {
            "PENDING" => Some(TaskState::Pending),
            "STARTED" => Some(TaskState::Started),
            "FAILURE" => Some(TaskState::Failure),
            "SUCCESS" => Some(TaskState::Success),
            "RETRY" => Some(TaskState::Retry),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "PENDING",
            TaskState::Started => "STARTED",
            TaskState::Failure => "FAILURE",
            TaskState::Success => "SUCCESS",
            TaskState::Retry => "RETRY",
        }
    }

    /// Still waiting on the server.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, TaskState::Pending | TaskState::Started)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task queued on the server, returned in place of a result by slow
/// methods. Poll it with [`AsyncResult::ready`].
#[derive(Debug, Clone)]
pub struct AsyncResult {
    task_id: String,
    token: String,
    state: TaskState,
    result: Option<Value>,
    started_at: Instant,
}

impl AsyncResult {
    pub fn new(task_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            token: token.into(),
            state: TaskState::Pending,
            result: None,
            started_at: Instant::now(),
        }
    }

    /// Recognise `{"__class__": "AsyncResult", "task_id": .., "token": ..}`.
    pub fn from_value(value: &Value) -> Option<Self> {
        if value.get("__class__").and_then(Value::as_str) != Some(ASYNC_RESULT_CLASS) {
            return None;
        }
        let task_id = id_string(value.get("task_id")?)?;
        let token = id_string(value.get("token")?)?;
        Some(Self::new(task_id, token))
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Time since this handle was created.
    pub fn time_lapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Poll the server unless the task has already left the pending states.
    pub async fn refresh_if_needed(&mut self, client: &Client) -> Result<(), FulfilError> {
        if !self.state.is_in_progress() {
            return Ok(());
        }

        debug!("Polling task {}", self.task_id);
        let body = json!({ "tasks": [[self.task_id, self.token]] });
        let response = client
            .request(Method::POST, ASYNC_RESULT_PATH, &[], Some(&body))
            .await?;

        let task = match response.get("tasks").and_then(Value::as_array) {
            Some(tasks) if tasks.len() == 1 => &tasks[0],
            _ => {
                return Err(FulfilError::async_result(format!(
                    "Unable to find results for task {}",
                    self.task_id
                )));
            }
        };

        if let Some(error) = task.get("error") {
            warn!("Task {} failed: {error}", self.task_id);
            self.state = TaskState::Failure;
            return Err(FulfilError::async_result(error.to_string()));
        }

        if let Some(state) = task.get("state").and_then(Value::as_str) {
            self.state = TaskState::parse(state).ok_or_else(|| {
                FulfilError::async_result(format!("Unknown task state '{state}'"))
            })?;
            self.result = task.get("result").cloned();
        }
        Ok(())
    }

    /// `true` once the task succeeded.
    pub async fn ready(&mut self, client: &Client) -> Result<bool, FulfilError> {
        self.refresh_if_needed(client).await?;
        Ok(self.state == TaskState::Success)
    }

    pub async fn failed(&mut self, client: &Client) -> Result<bool, FulfilError> {
        self.refresh_if_needed(client).await?;
        Ok(self.state == TaskState::Failure)
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
