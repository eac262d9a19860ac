//! Background workflow execution.
//!
//! The execute call runs on a spawned tokio task with progress published
//! through a watch channel and the result delivered through a single owned
//! slot (the join handle). Channel handoff replaces any shared-field
//! polling; there is exactly one writer and the consumer cannot observe a
//! torn update.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use serde_json::Value;
use tokio::{sync::watch, task::JoinHandle, time::sleep};

use crate::{
    errors::{Error, Result},
    execution::ExecutionPayload,
    identifiers::{InstanceId, WorkflowId},
    workflows::WorkflowsClient,
};

/// Coarse phase of a background execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    Queued,
    Sending,
    Processing,
    Complete,
    Failed,
}

/// Progress snapshot published while an execution runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub phase: ProgressPhase,
    /// Rough completion fraction in `0.0..=1.0`, suitable for a progress bar.
    pub fraction: f32,
    pub message: String,
}

impl Progress {
    fn new(phase: ProgressPhase, fraction: f32, message: impl Into<String>) -> Self {
        Self {
            phase,
            fraction,
            message: message.into(),
        }
    }

    fn queued() -> Self {
        Self::new(ProgressPhase::Queued, 0.0, "Queued")
    }
}

/// Handle to a background execution. Owns the single result slot: `wait`
/// consumes the handle and yields the execution result exactly once.
pub struct ExecutionHandle {
    task: JoinHandle<Result<ExecutionPayload>>,
    progress_rx: watch::Receiver<Progress>,
}

impl ExecutionHandle {
    /// Wait for the execution to finish and take its result. A panicked or
    /// aborted task surfaces as [`Error::Background`].
    pub async fn wait(self) -> Result<ExecutionPayload> {
        match self.task.await {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => {
                Err(Error::Background("execution task was aborted".to_string()))
            }
            Err(err) => Err(Error::Background(err.to_string())),
        }
    }

    /// Abort the running task. The HTTP request is dropped mid-flight; the
    /// remote workflow itself cannot be cancelled.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Current progress snapshot.
    pub fn progress(&self) -> Progress {
        self.progress_rx.borrow().clone()
    }

    /// Subscribe to progress updates.
    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.progress_rx.clone()
    }
}

/// Delay before assuming the remote graph is the bottleneck rather than the
/// request path.
const PROCESSING_AFTER: Duration = Duration::from_millis(500);

pub(crate) fn spawn_execution(
    client: WorkflowsClient,
    id: WorkflowId,
    inputs: BTreeMap<String, Value>,
    instance_id: Option<InstanceId>,
) -> ExecutionHandle {
    let (tx, progress_rx) = watch::channel(Progress::queued());
    let tx = Arc::new(tx);

    let processing_tx = tx.clone();
    let task = tokio::spawn(async move {
        let _ = tx.send(Progress::new(
            ProgressPhase::Sending,
            0.1,
            "Sending request to Runchat...",
        ));

        // Still in flight after the grace period means the graph is running.
        let watchdog = tokio::spawn(async move {
            sleep(PROCESSING_AFTER).await;
            processing_tx.send_if_modified(|progress| {
                if progress.phase == ProgressPhase::Sending {
                    *progress = Progress::new(
                        ProgressPhase::Processing,
                        0.6,
                        "Runchat is processing...",
                    );
                    true
                } else {
                    false
                }
            });
        });

        let result = client.execute(&id, &inputs, instance_id.as_ref()).await;
        watchdog.abort();

        match &result {
            Ok(_) => {
                let _ = tx.send(Progress::new(ProgressPhase::Complete, 1.0, "Complete"));
            }
            Err(err) => {
                let _ = tx.send(Progress::new(ProgressPhase::Failed, 0.0, err.to_string()));
            }
        }
        result
    });

    ExecutionHandle { task, progress_rx }
}
