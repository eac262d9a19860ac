//! In-memory workflow state: loaded descriptors, input values, and applied
//! outputs for one workflow across repeated executions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    classify::{classify, OutputKind},
    errors::{MissingInputsError, Result},
    execution::ExecutionPayload,
    identifiers::{InstanceId, WorkflowId},
    schema::{ParamDescriptor, WorkflowSchema},
};

/// One input parameter together with the values a user has supplied for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSlot {
    pub descriptor: ParamDescriptor,
    /// Manually typed value.
    #[serde(default)]
    pub text_value: String,
    /// Hosted URL from a prior upload; takes precedence over `text_value`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_url: Option<String>,
}

impl InputSlot {
    fn new(descriptor: ParamDescriptor) -> Self {
        Self {
            descriptor,
            text_value: String::new(),
            uploaded_url: None,
        }
    }

    /// The value this slot contributes to an execution, if any.
    pub fn resolved_value(&self) -> Option<&str> {
        if let Some(url) = self.uploaded_url.as_deref() {
            if !url.is_empty() {
                return Some(url);
            }
        }
        if !self.text_value.is_empty() {
            return Some(&self.text_value);
        }
        None
    }
}

/// One output parameter together with the values the last execution produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSlot {
    pub descriptor: ParamDescriptor,
    #[serde(default)]
    pub values: Vec<Value>,
    #[serde(default)]
    pub kind: OutputKind,
    /// Whether the last execution wrote to this slot.
    #[serde(default)]
    pub processed: bool,
}

impl OutputSlot {
    fn new(descriptor: ParamDescriptor) -> Self {
        Self {
            descriptor,
            values: Vec::new(),
            kind: OutputKind::Text,
            processed: false,
        }
    }

    /// The first value rendered as text.
    pub fn primary_text(&self) -> Option<String> {
        self.values.first().map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Session state for one workflow: schema-derived slots, the instance ID
/// threading multi-turn executions, and the last applied outputs.
///
/// Loading a new schema replaces everything wholesale, matching the remote
/// contract that schemas are never partially mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowSession {
    pub workflow_id: WorkflowId,
    pub workflow_name: String,
    pub inputs: Vec<InputSlot>,
    pub outputs: Vec<OutputSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<InstanceId>,
}

impl WorkflowSession {
    pub fn new(workflow_id: WorkflowId) -> Self {
        Self {
            workflow_id,
            ..Default::default()
        }
    }

    /// Replace the session state with a freshly loaded schema. Clears input
    /// values, outputs, and the instance ID.
    pub fn load_schema(&mut self, schema: WorkflowSchema) {
        self.workflow_name = schema.name;
        self.inputs = schema.inputs.into_iter().map(InputSlot::new).collect();
        self.outputs = schema.outputs.into_iter().map(OutputSlot::new).collect();
        self.instance_id = None;
    }

    /// Drop all workflow state, keeping only the workflow ID.
    pub fn clear(&mut self) {
        self.workflow_name.clear();
        self.inputs.clear();
        self.outputs.clear();
        self.instance_id = None;
    }

    fn input_mut(&mut self, id: &str) -> Option<&mut InputSlot> {
        self.inputs.iter_mut().find(|slot| slot.descriptor.id == id)
    }

    /// Set the typed text value for the input with the given full ID.
    /// Returns false when no such input exists.
    pub fn set_text(&mut self, id: &str, value: impl Into<String>) -> bool {
        match self.input_mut(id) {
            Some(slot) => {
                slot.text_value = value.into();
                true
            }
            None => false,
        }
    }

    /// Record the hosted URL of an uploaded file for the input with the
    /// given full ID. Returns false when no such input exists.
    pub fn set_uploaded_url(&mut self, id: &str, url: impl Into<String>) -> bool {
        match self.input_mut(id) {
            Some(slot) => {
                slot.uploaded_url = Some(url.into());
                true
            }
            None => false,
        }
    }

    /// Resolve the execution input map. Per slot, an uploaded URL wins over
    /// typed text; required slots with neither abort the whole resolution
    /// with every missing label collected.
    pub fn resolve_inputs(&self) -> Result<BTreeMap<String, Value>> {
        let mut inputs = BTreeMap::new();
        let mut missing = Vec::new();

        for slot in &self.inputs {
            match slot.resolved_value() {
                Some(value) => {
                    inputs.insert(slot.descriptor.id.clone(), Value::String(value.to_string()));
                }
                None if slot.descriptor.required => {
                    missing.push(slot.descriptor.label.clone());
                }
                None => {}
            }
        }

        if !missing.is_empty() {
            return Err(MissingInputsError::new(missing).into());
        }
        Ok(inputs)
    }

    /// Reset output slots ahead of an execution so stale values are not
    /// shown while the workflow runs.
    pub fn reset_outputs(&mut self) {
        for slot in &mut self.outputs {
            slot.values.clear();
            slot.kind = OutputKind::Text;
            slot.processed = false;
        }
    }

    /// Apply an execution payload: match each record to the output slot with
    /// the same full ID, store its values, and classify the first one.
    /// Records with no matching slot are skipped, not an error. Also adopts
    /// the payload's instance ID when present.
    pub fn apply_result(&mut self, payload: &ExecutionPayload) {
        for record in &payload.outputs {
            let Some(slot) = self
                .outputs
                .iter_mut()
                .find(|slot| slot.descriptor.id == record.id)
            else {
                #[cfg(feature = "tracing")]
                tracing::warn!(output_id = %record.id, "no matching output slot; skipping");
                continue;
            };

            slot.values = record.values.clone();
            slot.kind = record
                .primary_text()
                .map(|text| classify(&text))
                .unwrap_or(OutputKind::Text);
            slot.processed = true;
        }

        if let Some(instance_id) = &payload.instance_id {
            self.instance_id = Some(instance_id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::OutputRecord;
    use crate::schema::UiHint;
    use serde_json::json;

    fn descriptor(id: &str, label: &str, required: bool) -> ParamDescriptor {
        let (param_id, node_id) = crate::schema::split_param_id(id);
        ParamDescriptor {
            id: id.to_string(),
            param_id,
            node_id,
            label: label.to_string(),
            data_type: "string".to_string(),
            description: None,
            ui_hint: UiHint::Text,
            required,
            default_data: None,
        }
    }

    fn session() -> WorkflowSession {
        let mut session = WorkflowSession::new(WorkflowId::new("wf-123"));
        session.load_schema(WorkflowSchema {
            name: "Test".to_string(),
            inputs: vec![
                descriptor("prompt_n1", "Prompt", true),
                descriptor("style_n2", "Style", false),
            ],
            outputs: vec![
                descriptor("result_n3", "Result", false),
                descriptor("caption_n4", "Caption", false),
            ],
        });
        session
    }

    #[test]
    fn missing_required_inputs_are_collected() {
        let session = session();
        let err = session.resolve_inputs().unwrap_err();
        match err {
            crate::Error::MissingInputs(missing) => {
                assert_eq!(missing.missing, vec!["Prompt".to_string()]);
            }
            other => panic!("expected missing inputs, got {other:?}"),
        }
    }

    #[test]
    fn uploaded_url_wins_over_typed_text() {
        let mut session = session();
        assert!(session.set_text("prompt_n1", "a red cube"));
        assert!(session.set_text("style_n2", "typed"));
        assert!(session.set_uploaded_url("style_n2", "https://cdn/x.png"));

        let inputs = session.resolve_inputs().unwrap();
        assert_eq!(inputs["prompt_n1"], json!("a red cube"));
        assert_eq!(inputs["style_n2"], json!("https://cdn/x.png"));
    }

    #[test]
    fn optional_empty_inputs_are_omitted() {
        let mut session = session();
        session.set_text("prompt_n1", "hello");

        let inputs = session.resolve_inputs().unwrap();
        assert_eq!(inputs.len(), 1);
        assert!(!inputs.contains_key("style_n2"));
    }

    #[test]
    fn setting_an_unknown_input_returns_false() {
        let mut session = session();
        assert!(!session.set_text("nope_n9", "x"));
        assert!(!session.set_uploaded_url("nope_n9", "x"));
    }

    #[test]
    fn apply_result_updates_matching_slots_and_skips_others() {
        let mut session = session();
        let payload = ExecutionPayload {
            outputs: vec![
                OutputRecord::new("result_n3", vec![json!("https://x/out.png")]),
                OutputRecord::new("unmatched_n9", vec![json!("dropped")]),
            ],
            instance_id: Some(InstanceId::new("run_1")),
        };

        session.apply_result(&payload);

        let result = &session.outputs[0];
        assert!(result.processed);
        assert_eq!(result.kind, OutputKind::Image);
        assert_eq!(result.primary_text().as_deref(), Some("https://x/out.png"));

        // Caption was not in the payload.
        assert!(!session.outputs[1].processed);
        assert_eq!(session.instance_id, Some(InstanceId::new("run_1")));
    }

    #[test]
    fn multi_value_outputs_are_preserved() {
        let mut session = session();
        let payload = ExecutionPayload {
            outputs: vec![OutputRecord::new(
                "result_n3",
                vec![json!("https://x/a.mp4"), json!("https://x/b.mp4")],
            )],
            instance_id: None,
        };

        session.apply_result(&payload);
        let result = &session.outputs[0];
        assert_eq!(result.values.len(), 2);
        assert_eq!(result.kind, OutputKind::Video);
    }

    #[test]
    fn load_schema_clears_instance_id() {
        let mut session = session();
        session.instance_id = Some(InstanceId::new("run_9"));
        session.load_schema(WorkflowSchema {
            name: "Other".to_string(),
            inputs: vec![],
            outputs: vec![],
        });
        assert!(session.instance_id.is_none());
        assert_eq!(session.workflow_name, "Other");
        assert!(session.inputs.is_empty());
    }

    #[test]
    fn reset_outputs_clears_values_and_flags() {
        let mut session = session();
        session.apply_result(&ExecutionPayload {
            outputs: vec![OutputRecord::new("result_n3", vec![json!("x")])],
            instance_id: None,
        });
        session.reset_outputs();
        assert!(session.outputs.iter().all(|slot| !slot.processed));
        assert!(session.outputs.iter().all(|slot| slot.values.is_empty()));
    }
}
