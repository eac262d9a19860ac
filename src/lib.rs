//! Rust client SDK for the Runchat workflow automation API.
//!
//! Runchat workflows are remotely-hosted automation graphs identified by an ID
//! string. This crate covers the client-side contract: fetch a workflow's
//! input/output schema, resolve input values, execute the workflow, classify
//! the returned media URLs, and optionally download them.
//!
//! ```ignore
//! use runchat::{Client, Config, WorkflowId};
//!
//! let client = Client::new(Config {
//!     api_key: Some("rc_key".into()),
//!     ..Default::default()
//! })?;
//! let id = WorkflowId::new("my-workflow-id");
//! let schema = client.workflows().schema(&id).await?;
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]
// Allow large error types - refactoring to Box<Error> would be a breaking change
#![allow(clippy::result_large_err)]

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://runchat.app/api/v1";

/// Default media upload endpoint.
pub const DEFAULT_UPLOAD_URL: &str = "https://runchat.app/api/upload/supabase";

/// Default User-Agent header value.
#[cfg(feature = "client")]
pub(crate) const DEFAULT_CLIENT_HEADER: &str = concat!("runchat-rust/", env!("CARGO_PKG_VERSION"));

/// Default connection timeout (5 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Default request timeout for schema/status/examples/media calls (30 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Default timeout for workflow execution (5 minutes); remote graphs can run long.
pub const DEFAULT_EXECUTE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(300);

/// Default timeout for image uploads (60 seconds).
pub const DEFAULT_UPLOAD_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);

mod classify;
mod errors;
mod execution;
mod http;
mod identifiers;
mod schema;
mod session;

#[cfg(feature = "client")]
mod client;
#[cfg(feature = "client")]
mod gallery;
#[cfg(feature = "client")]
mod media;
#[cfg(feature = "client")]
mod runner;
#[cfg(feature = "client")]
mod telemetry;
#[cfg(feature = "client")]
mod uploads;
#[cfg(feature = "client")]
mod workflows;

pub use classify::{classify, OutputKind};
pub use errors::{ApiError, Error, MissingInputsError, PayloadError, Result, ValidationError};
#[cfg(feature = "client")]
pub use errors::{TransportError, TransportErrorKind};
pub use execution::{parse_execution_payload, ExecutionPayload, ExecutionStatus, OutputRecord};
pub use http::{credit_display_message, is_credit_message};
pub use identifiers::{InstanceId, WorkflowId};
pub use schema::{split_param_id, ParamDescriptor, UiHint, WorkflowSchema};
pub use session::{InputSlot, OutputSlot, WorkflowSession};

#[cfg(feature = "client")]
pub use client::{Client, Config};
#[cfg(feature = "client")]
pub use gallery::{ExampleWorkflow, GalleryClient};
#[cfg(feature = "client")]
pub use media::{sanitize_file_name, Download, MediaClient};
#[cfg(feature = "client")]
pub use runner::{ExecutionHandle, Progress, ProgressPhase};
#[cfg(feature = "client")]
pub use telemetry::{HttpRequestMetrics, MetricsCallbacks, RequestContext};
#[cfg(feature = "client")]
pub use uploads::UploadsClient;
#[cfg(feature = "client")]
pub use workflows::WorkflowsClient;

#[cfg(feature = "blocking")]
mod blocking;
#[cfg(feature = "blocking")]
pub use blocking::{
    BlockingClient, BlockingConfig, BlockingExecution, BlockingGalleryClient, BlockingMediaClient,
    BlockingUploadsClient, BlockingWorkflowsClient,
};
