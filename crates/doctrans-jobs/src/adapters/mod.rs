//! Backend adapters: one per engine execution style.
//!
//! Both adapters run one job to completion and feed the same structured
//! event log, so the rest of the system never cares which style produced a
//! result.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use doctrans_core::{Artifacts, BackendKind, ExecutionConfig, ProgressEvent, Result};

use crate::registry::JobRegistry;

mod callback;
mod streaming;

pub use callback::CallbackAdapter;
pub use streaming::StreamingAdapter;

/// How one adapter run ended. Cancellation is an outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The engine finished; the artifact paths it produced (possibly
    /// partial, possibly none).
    Completed(Artifacts),
    /// The run stopped on the job's cancellation token.
    Cancelled,
}

/// What an adapter needs besides the configuration: the job identity, the
/// event sink, and the cancellation token.
pub struct AdapterContext {
    pub job_id: Uuid,
    pub cancel: CancellationToken,
    registry: Arc<JobRegistry>,
}

impl AdapterContext {
    pub fn new(job_id: Uuid, registry: Arc<JobRegistry>, cancel: CancellationToken) -> Self {
        Self {
            job_id,
            cancel,
            registry,
        }
    }

    /// Append one event to the job's log.
    pub async fn emit(&self, event: ProgressEvent) -> Result<()> {
        self.registry.append(self.job_id, event).await
    }
}

/// One engine execution style, normalized to ordered events and a uniform
/// outcome.
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    fn backend(&self) -> BackendKind;

    async fn run(&self, ctx: &AdapterContext, config: Arc<ExecutionConfig>) -> Result<RunOutcome>;
}
