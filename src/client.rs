use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use reqwest::{
    header::{ACCEPT, ACCEPT_ENCODING, CACHE_CONTROL, USER_AGENT},
    Method,
};
use serde::de::DeserializeOwned;

use crate::{
    errors::{Error, PayloadError, Result, TransportError, TransportErrorKind},
    gallery::GalleryClient,
    http::{body_preview, parse_api_error},
    media::MediaClient,
    telemetry::{HttpRequestMetrics, RequestContext, Telemetry},
    uploads::UploadsClient,
    workflows::WorkflowsClient,
    DEFAULT_BASE_URL, DEFAULT_CLIENT_HEADER, DEFAULT_CONNECT_TIMEOUT, DEFAULT_EXECUTE_TIMEOUT,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_UPLOAD_TIMEOUT, DEFAULT_UPLOAD_URL,
};

#[derive(Clone, Debug, Default)]
pub struct Config {
    /// API key for bearer authentication. Required.
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub upload_url: Option<String>,
    /// Override the User-Agent header (defaults to `runchat-rust/{version}`).
    pub user_agent: Option<String>,
    pub http_client: Option<reqwest::Client>,
    /// Override the connect timeout (defaults to 5s).
    pub connect_timeout: Option<Duration>,
    /// Override the timeout for schema/status/examples/media calls (defaults to 30s).
    pub timeout: Option<Duration>,
    /// Override the workflow execution timeout (defaults to 300s).
    pub execute_timeout: Option<Duration>,
    /// Override the upload timeout (defaults to 60s).
    pub upload_timeout: Option<Duration>,
    /// Optional metrics callbacks (HTTP latency/status).
    pub metrics: Option<crate::telemetry::MetricsCallbacks>,
}

/// Async Runchat API client. Cheap to clone; sub-clients share one
/// connection pool and configuration.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    /// Base URL with any trailing slash removed.
    pub(crate) base: String,
    pub(crate) upload_url: String,
    api_key: String,
    user_agent: String,
    http: reqwest::Client,
    pub(crate) request_timeout: Duration,
    pub(crate) execute_timeout: Duration,
    pub(crate) upload_timeout: Duration,
    telemetry: Telemetry,
}

impl Client {
    pub fn new(cfg: Config) -> Result<Self> {
        let api_key = cfg
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config("api key is required".to_string()))?;

        let base = cfg
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        reqwest::Url::parse(&base)
            .map_err(|err| Error::Config(format!("invalid base url: {err}")))?;

        let upload_url = cfg
            .upload_url
            .unwrap_or_else(|| DEFAULT_UPLOAD_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        reqwest::Url::parse(&upload_url)
            .map_err(|err| Error::Config(format!("invalid upload url: {err}")))?;

        let connect_timeout = cfg.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        let http = match cfg.http_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .connect_timeout(connect_timeout)
                .build()
                .map_err(|err| TransportError {
                    kind: TransportErrorKind::Connect,
                    message: "failed to build http client".to_string(),
                    source: Some(err),
                })?,
        };

        let user_agent = cfg
            .user_agent
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CLIENT_HEADER.to_string());

        Ok(Self {
            inner: Arc::new(ClientInner {
                base,
                upload_url,
                api_key: api_key.trim().to_string(),
                user_agent,
                http,
                request_timeout: cfg.timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
                execute_timeout: cfg.execute_timeout.unwrap_or(DEFAULT_EXECUTE_TIMEOUT),
                upload_timeout: cfg.upload_timeout.unwrap_or(DEFAULT_UPLOAD_TIMEOUT),
                telemetry: Telemetry::new(cfg.metrics),
            }),
        })
    }

    /// Workflow operations: schema loading, execution, status polling.
    pub fn workflows(&self) -> WorkflowsClient {
        WorkflowsClient::new(self.inner.clone())
    }

    /// Image upload to hosted storage.
    pub fn uploads(&self) -> UploadsClient {
        UploadsClient::new(self.inner.clone())
    }

    /// Curated example workflows (unauthenticated).
    pub fn gallery(&self) -> GalleryClient {
        GalleryClient::new(self.inner.clone())
    }

    /// Media download helpers.
    pub fn media(&self) -> MediaClient {
        MediaClient::new(self.inner.clone())
    }
}

impl ClientInner {
    pub(crate) fn request(&self, method: Method, url: &str) -> Result<reqwest::RequestBuilder> {
        let url =
            reqwest::Url::parse(url).map_err(|err| Error::Config(format!("invalid url: {err}")))?;
        Ok(self.http.request(method, url))
    }

    /// Standard headers; `authorized` controls the bearer token. The
    /// examples listing and raw media downloads go out unauthenticated.
    pub(crate) fn with_headers(
        &self,
        mut builder: reqwest::RequestBuilder,
        authorized: bool,
    ) -> reqwest::RequestBuilder {
        builder = builder
            .header(ACCEPT, "application/json")
            .header(ACCEPT_ENCODING, "gzip, deflate")
            .header(CACHE_CONTROL, "no-cache")
            .header(USER_AGENT, self.user_agent.clone());
        if authorized {
            builder = builder.bearer_auth(&self.api_key);
        }
        builder
    }

    /// Send a request and map the outcome onto the error taxonomy. Nothing
    /// is retried; a failed call surfaces once and the caller re-triggers.
    pub(crate) async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        ctx: RequestContext,
    ) -> Result<reqwest::Response> {
        let start = Instant::now();
        #[cfg(feature = "tracing")]
        let span = tracing::debug_span!(
            "runchat.http",
            method = %ctx.method,
            path = %ctx.path,
        );
        #[cfg(feature = "tracing")]
        let _guard = span.enter();

        match builder.send().await {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() {
                    if self.telemetry.http_enabled() {
                        self.telemetry.record_http(HttpRequestMetrics {
                            latency: start.elapsed(),
                            status: Some(status.as_u16()),
                            error: None,
                            context: ctx,
                        });
                    }
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        status = %status,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "request completed"
                    );
                    return Ok(resp);
                }

                if self.telemetry.http_enabled() {
                    self.telemetry.record_http(HttpRequestMetrics {
                        latency: start.elapsed(),
                        status: Some(status.as_u16()),
                        error: Some(format!("http {}", status.as_u16())),
                        context: ctx,
                    });
                }
                #[cfg(feature = "tracing")]
                tracing::warn!(status = %status, "request failed");
                let body = resp.text().await.unwrap_or_default();
                Err(parse_api_error(status.as_u16(), body))
            }
            Err(err) => {
                if self.telemetry.http_enabled() {
                    self.telemetry.record_http(HttpRequestMetrics {
                        latency: start.elapsed(),
                        status: None,
                        error: Some(err.to_string()),
                        context: ctx,
                    });
                }
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %err, "transport error");
                Err(self.to_transport_error(err))
            }
        }
    }

    /// Send and decode a JSON body. A 2xx response that is not the expected
    /// JSON shape is a payload error carrying a short body preview.
    pub(crate) async fn execute_json<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        ctx: RequestContext,
    ) -> Result<T> {
        let resp = self.send(builder, ctx).await?;
        let text = resp
            .text()
            .await
            .map_err(|err| self.to_transport_error(err))?;
        serde_json::from_str::<T>(&text).map_err(|_| {
            PayloadError::new("response body is not the expected JSON")
                .with_preview(body_preview(&text))
                .into()
        })
    }

    pub(crate) fn to_transport_error(&self, err: reqwest::Error) -> Error {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_request() {
            TransportErrorKind::Request
        } else {
            TransportErrorKind::Other
        };

        TransportError {
            kind,
            message: err.to_string(),
            source: Some(err),
        }
        .into()
    }
}
