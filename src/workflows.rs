//! Workflow operations: schema loading, execution, and status polling.

use std::{collections::BTreeMap, sync::Arc};

use reqwest::Method;
use serde_json::Value;

use crate::{
    client::ClientInner,
    errors::{Error, Result, ValidationError},
    execution::{parse_execution_payload, ExecutionPayload, ExecutionStatus},
    identifiers::{InstanceId, WorkflowId},
    runner::ExecutionHandle,
    schema::{RawSchema, WorkflowSchema},
    telemetry::RequestContext,
};

#[derive(Clone)]
pub struct WorkflowsClient {
    inner: Arc<ClientInner>,
}

impl WorkflowsClient {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    fn require_id(id: &WorkflowId) -> Result<()> {
        if id.is_empty() {
            return Err(ValidationError::new("workflow id is required")
                .with_field("workflow_id")
                .into());
        }
        Ok(())
    }

    /// Fetch the declared input/output schema for a workflow.
    pub async fn schema(&self, id: &WorkflowId) -> Result<WorkflowSchema> {
        Self::require_id(id)?;

        let url = format!("{}/{}/schema", self.inner.base, id);
        let builder = self
            .inner
            .with_headers(self.inner.request(Method::GET, &url)?, true)
            .timeout(self.inner.request_timeout);
        let ctx = RequestContext::new("GET", format!("/{id}/schema"))
            .with_workflow_id(Some(id.to_string()));

        let raw: RawSchema = self.inner.execute_json(builder, ctx).await?;
        Ok(raw.into())
    }

    /// Execute a workflow with resolved inputs. The `inputs` map is keyed by
    /// full `paramId_nodeId` IDs; pass the instance ID from a previous run
    /// to thread state across executions.
    pub async fn execute(
        &self,
        id: &WorkflowId,
        inputs: &BTreeMap<String, Value>,
        instance_id: Option<&InstanceId>,
    ) -> Result<ExecutionPayload> {
        Self::require_id(id)?;

        let mut body = serde_json::Map::new();
        if !inputs.is_empty() {
            body.insert(
                "inputs".to_string(),
                Value::Object(inputs.clone().into_iter().collect()),
            );
        }
        if let Some(instance_id) = instance_id.filter(|i| !i.is_empty()) {
            body.insert(
                "runchat_instance_id".to_string(),
                Value::String(instance_id.to_string()),
            );
        }

        let url = format!("{}/{}", self.inner.base, id);
        let builder = self
            .inner
            .with_headers(self.inner.request(Method::POST, &url)?, true)
            .json(&Value::Object(body))
            .timeout(self.inner.execute_timeout);
        let ctx =
            RequestContext::new("POST", format!("/{id}")).with_workflow_id(Some(id.to_string()));

        let value: Value = self.inner.execute_json(builder, ctx).await?;
        let payload = parse_execution_payload(&value)?;
        Ok(payload)
    }

    /// Poll the optional status endpoint. A 404 means the endpoint is not
    /// implemented for this workflow and is surfaced as `Ok(None)`.
    pub async fn status(
        &self,
        id: &WorkflowId,
        instance_id: &InstanceId,
    ) -> Result<Option<ExecutionStatus>> {
        Self::require_id(id)?;
        if instance_id.is_empty() {
            return Err(ValidationError::new("instance id is required")
                .with_field("instance_id")
                .into());
        }

        let url = format!("{}/{}/status", self.inner.base, id);
        let builder = self
            .inner
            .with_headers(self.inner.request(Method::POST, &url)?, true)
            .json(&serde_json::json!({ "runchat_instance_id": instance_id }))
            .timeout(self.inner.request_timeout);
        let ctx = RequestContext::new("POST", format!("/{id}/status"))
            .with_workflow_id(Some(id.to_string()));

        match self.inner.execute_json::<ExecutionStatus>(builder, ctx).await {
            Ok(status) => Ok(Some(status)),
            Err(Error::Api(api)) if api.status == 404 => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Execute in the background, publishing progress over a watch channel.
    /// See [`ExecutionHandle`] for consuming the result.
    pub fn execute_in_background(
        &self,
        id: WorkflowId,
        inputs: BTreeMap<String, Value>,
        instance_id: Option<InstanceId>,
    ) -> ExecutionHandle {
        crate::runner::spawn_execution(self.clone(), id, inputs, instance_id)
    }
}
