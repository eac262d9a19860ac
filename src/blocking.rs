//! Blocking mirror of the async client surface.

use std::{
    collections::BTreeMap,
    fs,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc,
    },
    thread,
    time::Duration,
};

use reqwest::{
    blocking::{Client as HttpClient, RequestBuilder},
    header::{ACCEPT, ACCEPT_ENCODING, CACHE_CONTROL, USER_AGENT},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    classify::{classify, url_path},
    errors::{Error, PayloadError, Result, TransportError, TransportErrorKind, ValidationError},
    execution::{parse_execution_payload, ExecutionPayload, ExecutionStatus},
    gallery::ExampleWorkflow,
    http::{body_preview, parse_api_error},
    identifiers::{InstanceId, WorkflowId},
    media::{sanitize_file_name, Download},
    runner::{Progress, ProgressPhase},
    schema::{RawSchema, WorkflowSchema},
    DEFAULT_BASE_URL, DEFAULT_CLIENT_HEADER, DEFAULT_CONNECT_TIMEOUT, DEFAULT_EXECUTE_TIMEOUT,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_UPLOAD_TIMEOUT, DEFAULT_UPLOAD_URL,
};

#[derive(Clone, Debug, Default)]
pub struct BlockingConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub upload_url: Option<String>,
    pub user_agent: Option<String>,
    pub http_client: Option<HttpClient>,
    /// Override the connect timeout (defaults to 5s).
    pub connect_timeout: Option<Duration>,
    /// Override the timeout for schema/status/examples/media calls (defaults to 30s).
    pub timeout: Option<Duration>,
    /// Override the workflow execution timeout (defaults to 300s).
    pub execute_timeout: Option<Duration>,
    /// Override the upload timeout (defaults to 60s).
    pub upload_timeout: Option<Duration>,
}

#[derive(Clone)]
pub struct BlockingClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    base: String,
    upload_url: String,
    api_key: String,
    user_agent: String,
    http: HttpClient,
    request_timeout: Duration,
    execute_timeout: Duration,
    upload_timeout: Duration,
}

impl BlockingClient {
    pub fn new(cfg: BlockingConfig) -> Result<Self> {
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
            None => HttpClient::builder()
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
            }),
        })
    }

    pub fn workflows(&self) -> BlockingWorkflowsClient {
        BlockingWorkflowsClient {
            inner: self.inner.clone(),
        }
    }

    pub fn uploads(&self) -> BlockingUploadsClient {
        BlockingUploadsClient {
            inner: self.inner.clone(),
        }
    }

    pub fn gallery(&self) -> BlockingGalleryClient {
        BlockingGalleryClient {
            inner: self.inner.clone(),
        }
    }

    pub fn media(&self) -> BlockingMediaClient {
        BlockingMediaClient {
            inner: self.inner.clone(),
        }
    }
}

#[derive(Clone)]
pub struct BlockingWorkflowsClient {
    inner: Arc<ClientInner>,
}

impl BlockingWorkflowsClient {
    fn require_id(id: &WorkflowId) -> Result<()> {
        if id.is_empty() {
            return Err(ValidationError::new("workflow id is required")
                .with_field("workflow_id")
                .into());
        }
        Ok(())
    }

    pub fn schema(&self, id: &WorkflowId) -> Result<WorkflowSchema> {
        Self::require_id(id)?;
        let url = format!("{}/{}/schema", self.inner.base, id);
        let builder = self
            .inner
            .with_headers(self.inner.request(Method::GET, &url)?, true)
            .timeout(self.inner.request_timeout);
        let raw: RawSchema = self.inner.execute_json(builder)?;
        Ok(raw.into())
    }

    pub fn execute(
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

        let value: Value = self.inner.execute_json(builder)?;
        let payload = parse_execution_payload(&value)?;
        Ok(payload)
    }

    pub fn status(
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

        match self.inner.execute_json::<ExecutionStatus>(builder) {
            Ok(status) => Ok(Some(status)),
            Err(Error::Api(api)) if api.status == 404 => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Execute on a spawned thread, publishing progress over an mpsc
    /// channel. See [`BlockingExecution`].
    pub fn execute_in_background(
        &self,
        id: WorkflowId,
        inputs: BTreeMap<String, Value>,
        instance_id: Option<InstanceId>,
    ) -> BlockingExecution {
        let (tx, progress_rx) = mpsc::channel();
        let client = self.clone();
        let done = Arc::new(AtomicBool::new(false));

        let watchdog_done = done.clone();
        let watchdog_tx = tx.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(500));
            if !watchdog_done.load(Ordering::SeqCst) {
                let _ = watchdog_tx.send(Progress {
                    phase: ProgressPhase::Processing,
                    fraction: 0.6,
                    message: "Runchat is processing...".to_string(),
                });
            }
        });

        let handle = thread::spawn(move || {
            let _ = tx.send(Progress {
                phase: ProgressPhase::Sending,
                fraction: 0.1,
                message: "Sending request to Runchat...".to_string(),
            });

            let result = client.execute(&id, &inputs, instance_id.as_ref());
            done.store(true, Ordering::SeqCst);

            let progress = match &result {
                Ok(_) => Progress {
                    phase: ProgressPhase::Complete,
                    fraction: 1.0,
                    message: "Complete".to_string(),
                },
                Err(err) => Progress {
                    phase: ProgressPhase::Failed,
                    fraction: 0.0,
                    message: err.to_string(),
                },
            };
            let _ = tx.send(progress);
            result
        });

        BlockingExecution {
            handle,
            progress_rx,
        }
    }
}

/// Handle to a thread-backed execution with joinable result.
pub struct BlockingExecution {
    handle: thread::JoinHandle<Result<ExecutionPayload>>,
    progress_rx: mpsc::Receiver<Progress>,
}

impl BlockingExecution {
    /// Join the worker thread and take the result. A panicked thread
    /// surfaces as [`Error::Background`].
    pub fn wait(self) -> Result<ExecutionPayload> {
        self.handle
            .join()
            .map_err(|_| Error::Background("execution thread panicked".to_string()))?
    }

    /// Drain any progress events published since the last call.
    pub fn drain_progress(&self) -> Vec<Progress> {
        self.progress_rx.try_iter().collect()
    }

    /// Block until the next progress event, or `None` once the channel is
    /// closed.
    pub fn next_progress(&self) -> Option<Progress> {
        self.progress_rx.recv().ok()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

#[derive(Clone)]
pub struct BlockingUploadsClient {
    inner: Arc<ClientInner>,
}

impl BlockingUploadsClient {
    pub fn upload_base64(&self, base64_image: &str, filename: &str) -> Result<String> {
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
                self.inner.request(Method::POST, &self.inner.upload_url)?,
                true,
            )
            .json(&serde_json::json!({
                "base64Image": base64_image,
                "filename": filename,
            }))
            .timeout(self.inner.upload_timeout);

        let value: Value = self.inner.execute_json(builder)?;
        value
            .get("url")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .ok_or_else(|| PayloadError::new("upload response missing url").into())
    }

    pub fn upload_bytes(&self, bytes: &[u8], filename: &str) -> Result<String> {
        use base64::Engine;
        if bytes.is_empty() {
            return Err(ValidationError::new("image payload is required")
                .with_field("bytes")
                .into());
        }
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        self.upload_base64(&encoded, filename)
    }
}

#[derive(Clone)]
pub struct BlockingGalleryClient {
    inner: Arc<ClientInner>,
}

impl BlockingGalleryClient {
    pub fn list(&self, plugin: &str, version: Option<&str>) -> Result<Vec<ExampleWorkflow>> {
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

        let value: Value = self.inner.execute_json(builder)?;
        let examples = value
            .get("examples")
            .ok_or_else(|| PayloadError::new("examples response missing examples key"))?;
        serde_json::from_value(examples.clone()).map_err(|_| {
            PayloadError::new("examples list has an unexpected shape")
                .with_preview(body_preview(&examples.to_string()))
                .into()
        })
    }
}

#[derive(Clone)]
pub struct BlockingMediaClient {
    inner: Arc<ClientInner>,
}

impl BlockingMediaClient {
    pub fn download(&self, url: &str, dir: &Path, base_name: &str) -> Result<Download> {
        if !url.starts_with("http") {
            return Err(ValidationError::new("media url must be http(s)")
                .with_field("url")
                .into());
        }

        let kind = classify(url);
        let extension = extension_from_url(url)
            .unwrap_or_else(|| kind.default_extension().to_string());
        let file_name = format!("{}.{extension}", sanitize_file_name(base_name));

        let builder = self
            .inner
            .with_headers(self.inner.request(Method::GET, url)?, false)
            .timeout(self.inner.request_timeout);

        let resp = self.inner.send(builder)?;
        let bytes = resp
            .bytes()
            .map_err(|err| self.inner.to_transport_error(err))?;

        fs::create_dir_all(dir)
            .map_err(|err| Error::Config(format!("cannot create {}: {err}", dir.display())))?;
        let path = dir.join(file_name);
        fs::write(&path, &bytes)
            .map_err(|err| Error::Config(format!("cannot write {}: {err}", path.display())))?;

        Ok(Download {
            path,
            kind,
            bytes_written: bytes.len() as u64,
        })
    }
}

fn extension_from_url(url: &str) -> Option<String> {
    let path = url_path(url);
    let segment = path.rsplit('/').next()?;
    let (_, ext) = segment.rsplit_once('.')?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_lowercase())
}

impl ClientInner {
    fn request(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        let url =
            reqwest::Url::parse(url).map_err(|err| Error::Config(format!("invalid url: {err}")))?;
        Ok(self.http.request(method, url))
    }

    fn with_headers(&self, mut builder: RequestBuilder, authorized: bool) -> RequestBuilder {
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

    fn send(&self, builder: RequestBuilder) -> Result<reqwest::blocking::Response> {
        match builder.send() {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() {
                    return Ok(resp);
                }
                let body = resp.text().unwrap_or_default();
                Err(parse_api_error(status.as_u16(), body))
            }
            Err(err) => Err(self.to_transport_error(err)),
        }
    }

    fn execute_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let resp = self.send(builder)?;
        let text = resp.text().map_err(|err| self.to_transport_error(err))?;
        serde_json::from_str::<T>(&text).map_err(|_| {
            PayloadError::new("response body is not the expected JSON")
                .with_preview(body_preview(&text))
                .into()
        })
    }

    fn to_transport_error(&self, err: reqwest::Error) -> Error {
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
