//! In-memory job registry: the only holder of mutable job state.
//!
//! The registry owns a `RwLock` map of per-job `Mutex`-guarded records.
//! Every mutation goes through its methods; records are never handed out.
//! Terminal statuses are sticky: the first terminal writer wins under the
//! per-job mutex, and later transition attempts observe the settled status
//! instead of overwriting it. That is what keeps a client-visible Cancelled
//! from reverting to Completed when the engine finishes its work afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use doctrans_core::{
    Artifacts, BackendKind, Error, JobCounts, JobSnapshot, JobStatus, ProgressEvent, Result,
};

/// One job's mutable record.
#[derive(Debug)]
pub struct JobRecord {
    pub id: Uuid,
    pub status: JobStatus,
    pub backend: BackendKind,
    pub engine: String,
    pub filename: String,
    pub logs: Vec<ProgressEvent>,
    pub artifacts: Artifacts,
    pub error: Option<String>,
    /// Cancellation handle for the task bound to this job. Never serialized,
    /// never part of a snapshot.
    cancel: CancellationToken,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn new(
        id: Uuid,
        backend: BackendKind,
        engine: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            backend,
            engine: engine.into(),
            filename: filename.into(),
            logs: Vec::new(),
            artifacts: Artifacts::default(),
            error: None,
            cancel: CancellationToken::new(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Clone of the cancellation handle, for the task that will run the job.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Outcome of a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelDisposition {
    /// The job was still live; it is now Cancelled and its token has fired.
    Cancelled,
    /// The job had already settled; nothing changed.
    AlreadyTerminal(JobStatus),
}

/// Registry of all jobs created during the life of the process.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<Uuid, Arc<Mutex<JobRecord>>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: JobRecord) {
        let mut jobs = self.jobs.write().await;
        jobs.insert(record.id, Arc::new(Mutex::new(record)));
    }

    async fn entry(&self, id: Uuid) -> Result<Arc<Mutex<JobRecord>>> {
        let jobs = self.jobs.read().await;
        jobs.get(&id).cloned().ok_or(Error::JobNotFound(id))
    }

    /// Read-consistent copy of one job, without the cancellation token or
    /// raw artifact paths.
    pub async fn snapshot(&self, id: Uuid) -> Result<JobSnapshot> {
        let entry = self.entry(id).await?;
        let record = entry.lock().await;
        Ok(JobSnapshot {
            id: record.id,
            status: record.status,
            backend: record.backend,
            engine: record.engine.clone(),
            filename: record.filename.clone(),
            logs: record.logs.clone(),
            artifacts: record.artifacts.availability(),
            error: record.error.clone(),
            created_at: record.created_at,
            started_at: record.started_at,
            completed_at: record.completed_at,
        })
    }

    /// Append one progress event to the job's log.
    pub async fn append(&self, id: Uuid, event: ProgressEvent) -> Result<()> {
        let entry = self.entry(id).await?;
        entry.lock().await.logs.push(event);
        Ok(())
    }

    /// Move the job to `next`, enforcing the lifecycle machine. A job already
    /// in a terminal state is left untouched and its current status returned;
    /// an illegal non-terminal move is an `InvalidState` error.
    ///
    /// Returns the job's status after the call, which callers must check
    /// when they need to know whether their transition actually applied.
    pub async fn transition(&self, id: Uuid, next: JobStatus) -> Result<JobStatus> {
        let entry = self.entry(id).await?;
        let mut record = entry.lock().await;
        if record.status.is_terminal() {
            return Ok(record.status);
        }
        let allowed = matches!(
            (record.status, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
                | (JobStatus::Pending | JobStatus::Processing, JobStatus::Cancelled)
        );
        if !allowed {
            return Err(Error::InvalidState(format!(
                "job {id} cannot move from {} to {}",
                record.status, next
            )));
        }
        record.status = next;
        let now = Utc::now();
        if next == JobStatus::Processing {
            record.started_at = Some(now);
        } else if next.is_terminal() {
            record.completed_at = Some(now);
        }
        Ok(next)
    }

    /// Mark a processing job Failed with the given message. Sticky like
    /// `transition`: a settled job keeps its status and its error field.
    pub async fn fail(&self, id: Uuid, message: impl Into<String>) -> Result<JobStatus> {
        let entry = self.entry(id).await?;
        let mut record = entry.lock().await;
        if record.status.is_terminal() {
            return Ok(record.status);
        }
        if record.status != JobStatus::Processing {
            return Err(Error::InvalidState(format!(
                "job {id} cannot fail from {}",
                record.status
            )));
        }
        let message = message.into();
        record.logs.push(ProgressEvent::Message {
            text: format!("translation failed: {message}"),
        });
        record.status = JobStatus::Failed;
        record.error = Some(message);
        record.completed_at = Some(Utc::now());
        Ok(JobStatus::Failed)
    }

    /// Cancel a live job: fires its token, appends a log entry and settles
    /// the status, all under the record's mutex so a concurrent completion
    /// cannot interleave. A settled job is reported back unchanged.
    pub async fn cancel(&self, id: Uuid) -> Result<CancelDisposition> {
        let entry = self.entry(id).await?;
        let mut record = entry.lock().await;
        if record.status.is_terminal() {
            return Ok(CancelDisposition::AlreadyTerminal(record.status));
        }
        record.cancel.cancel();
        record.logs.push(ProgressEvent::Message {
            text: "cancellation requested".to_string(),
        });
        record.status = JobStatus::Cancelled;
        record.completed_at = Some(Utc::now());
        Ok(CancelDisposition::Cancelled)
    }

    /// Store the artifact paths an adapter resolved. Applied regardless of
    /// status: a job cancelled mid-flight keeps whatever the engine produced,
    /// the download gate decides reachability.
    pub async fn record_artifacts(&self, id: Uuid, artifacts: Artifacts) -> Result<()> {
        let entry = self.entry(id).await?;
        entry.lock().await.artifacts = artifacts;
        Ok(())
    }

    /// Status and artifact paths together, read under one lock acquisition.
    pub async fn artifacts(&self, id: Uuid) -> Result<(JobStatus, Artifacts)> {
        let entry = self.entry(id).await?;
        let record = entry.lock().await;
        Ok((record.status, record.artifacts.clone()))
    }

    /// Jobs grouped by status.
    pub async fn counts(&self) -> JobCounts {
        let jobs = self.jobs.read().await;
        let mut counts = JobCounts::default();
        for entry in jobs.values() {
            counts.record(entry.lock().await.status);
        }
        counts
    }
}
