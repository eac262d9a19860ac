//! Curated example workflows, filtered per plugin.

use std::sync::Arc;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    client::ClientInner,
    errors::{PayloadError, Result},
    telemetry::RequestContext,
};

/// One curated example workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleWorkflow {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct GalleryClient {
    inner: Arc<ClientInner>,
}

impl GalleryClient {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// List curated examples for a plugin, optionally pinned to a plugin
    /// version. This endpoint is public; no Authorization header is sent.
    pub async fn list(
        &self,
        plugin: &str,
        version: Option<&str>,
    ) -> Result<Vec<ExampleWorkflow>> {
        let url = format!("{}/examples", self.inner.base);
        let mut builder = self
            .inner
            .request(Method::GET, &url)?
            .query(&[("plugin", plugin)]);
        if let Some(version) = version {
            builder = builder.query(&[("version", version)]);
        }
        let builder = self
            .inner
            .with_headers(builder, false)
            .timeout(self.inner.request_timeout);
        let ctx = RequestContext::new("GET", "/examples");

        let value: Value = self.inner.execute_json(builder, ctx).await?;
        let examples = value
            .get("examples")
            .ok_or_else(|| PayloadError::new("examples response missing examples key"))?;
        serde_json::from_value(examples.clone()).map_err(|_| {
            PayloadError::new("examples list has an unexpected shape")
                .with_preview(crate::http::body_preview(&examples.to_string()))
                .into()
        })
    }
}
