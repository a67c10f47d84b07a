//! Job payloads exchanged with the serverless dispatch runtime.
//!
//! A job arrives as `{"id": ..., "input": {"action": ..., ...}}` and every
//! handler answers with an object carrying `status` (`success` | `error`).
//! Success payloads are flattened next to `status`; errors carry
//! `error_type` and `error`.

use std::path::PathBuf;

use serde::de::{Error as _, Unexpected};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ErrorKind, SyncError};

/// A job as delivered by the dispatch runtime. A job without `input` is
/// treated as carrying an empty object.
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default = "empty_input")]
    pub input: Value,
}

impl Default for Job {
    fn default() -> Self {
        Self {
            id: None,
            input: empty_input(),
        }
    }
}

fn empty_input() -> Value {
    Value::Object(Map::new())
}

/// Operation selected by `input.action`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    GpuInfo,
    ListFiles {
        #[serde(default)]
        path: Option<PathBuf>,
        #[serde(default)]
        recursive: bool,
    },
    SyncBucket {
        #[serde(default)]
        bucket: Option<String>,
        #[serde(default)]
        destination: Option<PathBuf>,
    },
}

impl Action {
    /// Input without an `action` selects the GPU report, which ignores its input.
    pub fn from_input(input: &Value) -> Result<Self, serde_json::Error> {
        match input {
            Value::Null => Ok(Action::GpuInfo),
            Value::Object(map) if !map.contains_key("action") => Ok(Action::GpuInfo),
            Value::Object(_) => serde_json::from_value(input.clone()),
            Value::Bool(b) => Err(not_an_object(Unexpected::Bool(*b))),
            Value::Number(_) => Err(not_an_object(Unexpected::Other("number"))),
            Value::String(s) => Err(not_an_object(Unexpected::Str(s))),
            Value::Array(_) => Err(not_an_object(Unexpected::Seq)),
        }
    }
}

fn not_an_object(found: Unexpected<'_>) -> serde_json::Error {
    serde_json::Error::invalid_type(found, &"a JSON object")
}

/// Outcome of one handler invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum HandlerResult<T> {
    Success(T),
    Error(JobError),
}

impl<T> HandlerResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, HandlerResult::Success(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> HandlerResult<U> {
        match self {
            HandlerResult::Success(v) => HandlerResult::Success(f(v)),
            HandlerResult::Error(e) => HandlerResult::Error(e),
        }
    }
}

/// Error half of a [`HandlerResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobError {
    pub error_type: ErrorKind,
    pub error: String,
    /// Captured subprocess output, when a host command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_received: Option<Value>,
}

impl JobError {
    pub fn new(error_type: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            error_type,
            error: error.into(),
            output: None,
            input_received: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_input(mut self, input: Value) -> Self {
        self.input_received = Some(input);
        self
    }
}

impl From<&SyncError> for JobError {
    fn from(e: &SyncError) -> Self {
        JobError::new(e.kind(), e.to_string())
    }
}
