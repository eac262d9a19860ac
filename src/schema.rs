//! Workflow schema parsing: wire parameter records into typed descriptors.

use serde::{Deserialize, Serialize};

/// How a parameter should be presented for input collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UiHint {
    #[default]
    Text,
    Image,
    Url,
}

/// A single input or output parameter declared by a workflow schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    /// Full wire ID in `paramId_nodeId` form; used verbatim when building
    /// execution inputs and matching execution outputs.
    pub id: String,
    pub param_id: String,
    pub node_id: String,
    pub label: String,
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub ui_hint: UiHint,
    #[serde(default)]
    pub required: bool,
    /// Default value carried by the schema, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_data: Option<serde_json::Value>,
}

/// The declared input/output parameter lists for a workflow.
///
/// Replaced wholesale on reload; never partially mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSchema {
    pub name: String,
    pub inputs: Vec<ParamDescriptor>,
    pub outputs: Vec<ParamDescriptor>,
}

/// Split a full parameter ID into `(param_id, node_id)` on the FIRST
/// underscore. An ID without an underscore gets the node ID `"unknown"`.
///
/// Known limitation: a param ID that itself contains underscores cannot be
/// recovered unambiguously; everything after the first underscore is treated
/// as the node ID.
pub fn split_param_id(full_id: &str) -> (String, String) {
    match full_id.split_once('_') {
        Some((param, node)) => (param.to_string(), node.to_string()),
        None => (full_id.to_string(), "unknown".to_string()),
    }
}

fn ui_hint_for(data_type: &str, label: &str) -> UiHint {
    let data_type = data_type.to_lowercase();
    if matches!(data_type.as_str(), "image" | "screenshot" | "file") {
        UiHint::Image
    } else if label.to_lowercase().contains("url") {
        UiHint::Url
    } else {
        UiHint::Text
    }
}

/// Raw schema body as returned by `GET {base}/{id}/schema`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawSchema {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub inputs: Vec<RawParameter>,
    #[serde(default)]
    pub outputs: Vec<RawParameter>,
}

/// Raw `BasicParameter` record: `{id, label?, type?, description?, data?}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawParameter {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "type")]
    pub data_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub required: bool,
}

impl From<RawParameter> for ParamDescriptor {
    fn from(raw: RawParameter) -> Self {
        let (param_id, node_id) = split_param_id(&raw.id);
        let data_type = raw
            .data_type
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "string".to_string());
        let label = raw
            .label
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| param_id.clone());
        let ui_hint = ui_hint_for(&data_type, &label);

        ParamDescriptor {
            id: raw.id,
            param_id,
            node_id,
            label,
            data_type,
            description: raw.description.filter(|d| !d.trim().is_empty()),
            ui_hint,
            required: raw.required,
            default_data: raw.data,
        }
    }
}

impl From<RawSchema> for WorkflowSchema {
    fn from(raw: RawSchema) -> Self {
        WorkflowSchema {
            name: raw
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Unknown Workflow".to_string()),
            inputs: raw.inputs.into_iter().map(ParamDescriptor::from).collect(),
            outputs: raw.outputs.into_iter().map(ParamDescriptor::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> WorkflowSchema {
        let raw: RawSchema = serde_json::from_value(value).unwrap();
        raw.into()
    }

    #[test]
    fn splits_on_first_underscore() {
        assert_eq!(
            split_param_id("prompt_abc123"),
            ("prompt".to_string(), "abc123".to_string())
        );
        assert_eq!(
            split_param_id("single"),
            ("single".to_string(), "unknown".to_string())
        );
    }

    #[test]
    fn underscored_param_ids_mis_split() {
        // Documented limitation: the param ID "steps_node" cannot be
        // distinguished from param "steps" on node "node_7".
        assert_eq!(
            split_param_id("steps_node_7"),
            ("steps".to_string(), "node_7".to_string())
        );
    }

    #[test]
    fn parses_basic_parameter_records() {
        let schema = parse(json!({
            "name": "Style Transfer",
            "inputs": [
                {"id": "prompt_n1", "label": "Prompt", "type": "string", "description": "What to draw", "required": true},
                {"id": "source_n2", "label": "Source Image", "type": "image"}
            ],
            "outputs": [
                {"id": "result_n3", "label": "Result", "type": "image"}
            ]
        }));

        assert_eq!(schema.name, "Style Transfer");
        assert_eq!(schema.inputs.len(), 2);
        assert_eq!(schema.outputs.len(), 1);

        let prompt = &schema.inputs[0];
        assert_eq!(prompt.param_id, "prompt");
        assert_eq!(prompt.node_id, "n1");
        assert_eq!(prompt.label, "Prompt");
        assert_eq!(prompt.ui_hint, UiHint::Text);
        assert!(prompt.required);
        assert_eq!(prompt.description.as_deref(), Some("What to draw"));

        let source = &schema.inputs[1];
        assert_eq!(source.ui_hint, UiHint::Image);
        assert!(!source.required);
    }

    #[test]
    fn unknown_type_defaults_to_string() {
        let schema = parse(json!({
            "inputs": [{"id": "x_n1"}]
        }));
        let param = &schema.inputs[0];
        assert_eq!(param.data_type, "string");
        // Label falls back to the param ID.
        assert_eq!(param.label, "x");
        assert_eq!(param.ui_hint, UiHint::Text);
    }

    #[test]
    fn url_hint_comes_from_the_label() {
        let schema = parse(json!({
            "inputs": [
                {"id": "ref_n1", "label": "Reference URL", "type": "string"},
                {"id": "shot_n2", "label": "Viewport", "type": "screenshot"}
            ]
        }));
        assert_eq!(schema.inputs[0].ui_hint, UiHint::Url);
        // Image-typed inputs win over a url-ish label.
        assert_eq!(schema.inputs[1].ui_hint, UiHint::Image);
    }

    #[test]
    fn missing_name_defaults() {
        let schema = parse(json!({}));
        assert_eq!(schema.name, "Unknown Workflow");
        assert!(schema.inputs.is_empty());
        assert!(schema.outputs.is_empty());
    }
}
