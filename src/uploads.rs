//! Image upload to Runchat-hosted storage.

use std::sync::Arc;

use base64::Engine;
use reqwest::Method;
use serde_json::Value;

use crate::{
    client::ClientInner,
    errors::{PayloadError, Result, ValidationError},
    telemetry::RequestContext,
};

#[derive(Clone)]
pub struct UploadsClient {
    inner: Arc<ClientInner>,
}

impl UploadsClient {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Upload a base64-encoded image and return its hosted URL. The URL can
    /// be fed back verbatim as a workflow input; no transformation is
    /// applied on either side.
    pub async fn upload_base64(&self, base64_image: &str, filename: &str) -> Result<String> {
        if base64_image.is_empty() {
            return Err(ValidationError::new("image payload is required")
                .with_field("base64_image")
                .into());
        }
        if filename.trim().is_empty() {
            return Err(ValidationError::new("filename is required")
                .with_field("filename")
                .into());
        }

        let builder = self
            .inner
            .with_headers(
                self.inner
                    .request(Method::POST, &self.inner.upload_url)?,
                true,
            )
            .json(&serde_json::json!({
                "base64Image": base64_image,
                "filename": filename,
            }))
            .timeout(self.inner.upload_timeout);
        let ctx = RequestContext::new("POST", "/upload");

        let value: Value = self.inner.execute_json(builder, ctx).await?;
        let url = value
            .get("url")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PayloadError::new("upload response missing url"))?;

        #[cfg(feature = "tracing")]
        tracing::debug!(url, "image uploaded");
        Ok(url.to_string())
    }

    /// Encode raw image bytes and upload them.
    pub async fn upload_bytes(&self, bytes: &[u8], filename: &str) -> Result<String> {
        if bytes.is_empty() {
            return Err(ValidationError::new("image payload is required")
                .with_field("bytes")
                .into());
        }
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        self.upload_base64(&encoded, filename).await
    }
}
