//! Core data model for doctrans jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

// =============================================================================
// JOB LIFECYCLE
// =============================================================================

/// Job lifecycle status.
///
/// `Pending → Processing` is the only entry into Processing. Completed,
/// Failed and Cancelled are terminal; any non-terminal status may move to
/// Cancelled. Terminal statuses accept no further transitions, so a status
/// observed as Cancelled never later reads Completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Whether this status accepts no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Lowercase wire name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution style of the backend that runs a job.
///
/// Fixed at job creation from the selected engine's catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The engine natively produces a lazy, ordered event sequence.
    Streaming,
    /// The engine is a single blocking call invoking a progress callback.
    Callback,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Streaming => "streaming",
            BackendKind::Callback => "callback",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ARTIFACTS
// =============================================================================

/// Kind of output artifact a job can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Translated-only document.
    Mono,
    /// Side-by-side original/translated document.
    Dual,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Mono => "mono",
            ArtifactKind::Dual => "dual",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ArtifactKind {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mono" => Ok(ArtifactKind::Mono),
            "dual" => Ok(ArtifactKind::Dual),
            other => Err(crate::error::Error::NotFound(format!(
                "artifact kind {other}"
            ))),
        }
    }
}

/// Output paths recorded by a finished adapter. Existence on disk is checked
/// lazily at download time, never here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artifacts {
    pub mono: Option<PathBuf>,
    pub dual: Option<PathBuf>,
}

impl Artifacts {
    pub fn get(&self, kind: ArtifactKind) -> Option<&PathBuf> {
        match kind {
            ArtifactKind::Mono => self.mono.as_ref(),
            ArtifactKind::Dual => self.dual.as_ref(),
        }
    }

    pub fn set(&mut self, kind: ArtifactKind, path: PathBuf) {
        match kind {
            ArtifactKind::Mono => self.mono = Some(path),
            ArtifactKind::Dual => self.dual = Some(path),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mono.is_none() && self.dual.is_none()
    }

    /// Client-facing availability flags (paths stay server-side).
    pub fn availability(&self) -> ArtifactAvailability {
        ArtifactAvailability {
            mono: self.mono.is_some(),
            dual: self.dual.is_some(),
        }
    }
}

/// Which artifact kinds a job has recorded, without exposing server paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactAvailability {
    pub mono: bool,
    pub dual: bool,
}

// =============================================================================
// PROGRESS EVENTS
// =============================================================================

/// One structured entry in a job's append-only progress log.
///
/// Both backend styles are normalized into this shape: the streaming engine's
/// native events map onto it directly, the callback engine's counter
/// invocations are synthesized into `Progress` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The engine entered a named stage.
    Stage { name: String },
    /// Counter update, optionally labelled with the active stage.
    Progress {
        current: u64,
        total: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        stage: Option<String>,
    },
    /// Free-form engine or orchestrator message.
    Message { text: String },
    /// The engine reported successful completion.
    Finished,
}

// =============================================================================
// SNAPSHOTS AND COUNTS
// =============================================================================

/// Read-consistent, client-facing copy of one job record.
///
/// Excludes the cancellation token and raw artifact paths; artifact presence
/// is reported as availability flags and the files themselves are served by
/// the download endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: Uuid,
    pub status: JobStatus,
    pub backend: BackendKind,
    pub engine: String,
    pub filename: String,
    pub logs: Vec<ProgressEvent>,
    pub artifacts: ArtifactAvailability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Jobs grouped by status, for the health endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounts {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl JobCounts {
    pub fn total(&self) -> usize {
        self.pending + self.processing + self.completed + self.failed + self.cancelled
    }

    pub fn record(&mut self, status: JobStatus) {
        match status {
            JobStatus::Pending => self.pending += 1,
            JobStatus::Processing => self.processing += 1,
            JobStatus::Completed => self.completed += 1,
            JobStatus::Failed => self.failed += 1,
            JobStatus::Cancelled => self.cancelled += 1,
        }
    }
}
