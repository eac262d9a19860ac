//! Execution result wire handling.
//!
//! The service has shipped several shapes for the result payload: a `data`
//! array of `{id, data}` records, a flat `data` map of `id -> value`, and a
//! legacy top-level `outputs` map. All three are accepted and normalized
//! into [`ExecutionPayload`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    errors::PayloadError,
    http::body_preview,
    identifiers::InstanceId,
};

/// One output produced by an execution.
///
/// Multi-value outputs are preserved as a list end-to-end; use
/// [`OutputRecord::primary`] or [`OutputRecord::joined_text`] for the
/// single-value views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub id: String,
    pub values: Vec<Value>,
}

impl OutputRecord {
    pub fn new(id: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            id: id.into(),
            values,
        }
    }

    /// The first value, if any.
    pub fn primary(&self) -> Option<&Value> {
        self.values.first()
    }

    /// The first value rendered as text. Strings render without quotes;
    /// other JSON values use their serialized form.
    pub fn primary_text(&self) -> Option<String> {
        self.primary().map(render_value)
    }

    /// All values rendered as a comma-joined string.
    pub fn joined_text(&self) -> String {
        self.values
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Normalized result of a successful workflow execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExecutionPayload {
    pub outputs: Vec<OutputRecord>,
    /// Token threading state into the next execution of the same workflow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<InstanceId>,
}

impl ExecutionPayload {
    /// Look up an output record by its full `paramId_nodeId` ID.
    pub fn output(&self, id: &str) -> Option<&OutputRecord> {
        self.outputs.iter().find(|record| record.id == id)
    }
}

/// Status snapshot from the optional polling endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStatus {
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn default_status() -> String {
    "unknown".to_string()
}

fn values_from(data: Value) -> Vec<Value> {
    match data {
        Value::Array(items) => items,
        other => vec![other],
    }
}

/// Normalize a successful execution response body.
///
/// Accepts a `data` array of `{id, data}` records, a flat `data` map, or a
/// legacy top-level `outputs` map. A body with none of these still succeeds
/// with an empty output list; anything that is not a JSON object is a
/// payload error.
pub fn parse_execution_payload(body: &Value) -> Result<ExecutionPayload, PayloadError> {
    let object = body.as_object().ok_or_else(|| {
        PayloadError::new("execution response is not a JSON object")
            .with_preview(body_preview(&body.to_string()))
    })?;

    let mut outputs = Vec::new();

    match object.get("data") {
        Some(Value::Array(records)) => {
            for record in records {
                let Some(record) = record.as_object() else {
                    continue;
                };
                let Some(id) = record.get("id").and_then(|v| v.as_str()) else {
                    continue;
                };
                let values = record
                    .get("data")
                    .cloned()
                    .map(values_from)
                    .unwrap_or_default();
                outputs.push(OutputRecord::new(id, values));
            }
        }
        Some(Value::Object(map)) => {
            for (id, value) in map {
                outputs.push(OutputRecord::new(id.clone(), values_from(value.clone())));
            }
        }
        _ => {
            if let Some(Value::Object(map)) = object.get("outputs") {
                for (id, value) in map {
                    outputs.push(OutputRecord::new(id.clone(), values_from(value.clone())));
                }
            }
        }
    }

    let instance_id = object
        .get("runchat_instance_id")
        .or_else(|| object.get("instance_id"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(InstanceId::new);

    Ok(ExecutionPayload {
        outputs,
        instance_id,
    })
}
