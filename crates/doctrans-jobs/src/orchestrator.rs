//! Job orchestrator: the single owner of job lifecycles.
//!
//! Everything the HTTP boundary does with jobs goes through this object:
//! creating a job (settings resolution included), polling its snapshot,
//! cancelling it, resolving artifact paths for download. Each job runs on
//! its own tokio task; failures are captured into the job record and never
//! unwind past the task.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use doctrans_core::{
    build_execution_config, ArtifactKind, BackendKind, BaseSettings, ConfigStore, Error,
    ExecutionConfig, JobCounts, JobSnapshot, JobStatus, RawInputs, Result, SaveMode,
};

use crate::adapters::{
    AdapterContext, BackendAdapter, CallbackAdapter, RunOutcome, StreamingAdapter,
};
use crate::engine::{EngineHealth, EngineSet};
use crate::registry::{CancelDisposition, JobRecord, JobRegistry};

/// Result of a cancellation request, as reported to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelOutcome {
    /// The job's status after the request.
    pub status: JobStatus,
    /// Present when the request was a no-op against a settled job.
    pub note: Option<String>,
}

pub struct Orchestrator {
    registry: Arc<JobRegistry>,
    engines: EngineSet,
    base: BaseSettings,
    store: ConfigStore,
    upload_dir: PathBuf,
    output_dir: PathBuf,
}

impl Orchestrator {
    pub fn new(
        base: BaseSettings,
        store: ConfigStore,
        engines: EngineSet,
        upload_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry: Arc::new(JobRegistry::new()),
            engines,
            base,
            store,
            upload_dir: upload_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// The default configuration jobs are resolved against. Loaded once at
    /// startup; persisting a new default does not hot-swap it.
    pub fn base_settings(&self) -> &BaseSettings {
        &self.base
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Probe the engine behind a backend kind, for the config endpoint.
    pub async fn backend_health(&self, kind: BackendKind) -> EngineHealth {
        self.engines.health(kind).await
    }

    /// Resolve settings, allocate the job and spawn its task. Any settings
    /// or file problem surfaces here, before a job record exists.
    #[instrument(
        skip(self, inputs),
        fields(subsystem = "jobs", component = "orchestrator", op = "create_job", file_id = %file_id)
    )]
    pub async fn create_job(
        &self,
        file_id: &str,
        inputs: &RawInputs,
        save_mode: SaveMode,
    ) -> Result<Uuid> {
        let (input_file, filename) = self.find_upload(file_id)?;

        let outcome = build_execution_config(
            &self.base,
            &input_file,
            &self.output_dir,
            save_mode,
            inputs,
        )?;
        if let Some(candidate) = outcome.persist {
            self.store.save(&candidate)?;
            debug!(path = %self.store.path().display(), "persisted updated default settings");
        }
        let config = Arc::new(outcome.config);

        let job_id = Uuid::new_v4();
        let record = JobRecord::new(job_id, config.backend, config.engine.clone(), filename);
        let token = record.cancel_token();
        self.registry.insert(record).await;

        info!(
            job_id = %job_id,
            engine = %config.engine,
            backend = %config.backend,
            "job created"
        );

        let adapter: Arc<dyn BackendAdapter> = match config.backend {
            BackendKind::Streaming => {
                Arc::new(StreamingAdapter::new(self.engines.streaming.clone()))
            }
            BackendKind::Callback => Arc::new(CallbackAdapter::new(self.engines.callback.clone())),
        };
        tokio::spawn(run_job(
            self.registry.clone(),
            adapter,
            job_id,
            token,
            config,
        ));

        Ok(job_id)
    }

    /// Read-consistent copy of the job record.
    pub async fn status(&self, job_id: Uuid) -> Result<JobSnapshot> {
        self.registry.snapshot(job_id).await
    }

    /// Cancel a live job; a settled job is reported back unchanged.
    #[instrument(
        skip(self),
        fields(subsystem = "jobs", component = "orchestrator", op = "cancel", job_id = %job_id)
    )]
    pub async fn cancel(&self, job_id: Uuid) -> Result<CancelOutcome> {
        match self.registry.cancel(job_id).await? {
            CancelDisposition::Cancelled => {
                info!("job cancelled");
                Ok(CancelOutcome {
                    status: JobStatus::Cancelled,
                    note: None,
                })
            }
            CancelDisposition::AlreadyTerminal(status) => Ok(CancelOutcome {
                status,
                note: Some(format!("job already {status}")),
            }),
        }
    }

    /// Path of a produced artifact, for download. Gated on Completed;
    /// existence on disk is rechecked on every call, never cached.
    #[instrument(
        skip(self),
        fields(subsystem = "jobs", component = "orchestrator", op = "artifact_path", job_id = %job_id)
    )]
    pub async fn artifact_path(&self, job_id: Uuid, kind: ArtifactKind) -> Result<PathBuf> {
        let (status, artifacts) = self.registry.artifacts(job_id).await?;
        if status != JobStatus::Completed {
            return Err(Error::InvalidState(format!(
                "job {job_id} is {status}; artifacts are served once completed"
            )));
        }
        let path = artifacts
            .get(kind)
            .ok_or_else(|| Error::NotFound(format!("job {job_id} produced no {kind} artifact")))?;
        if !path.is_file() {
            return Err(Error::NotFound(format!(
                "{kind} artifact for job {job_id} is missing on disk"
            )));
        }
        Ok(path.clone())
    }

    /// Jobs grouped by status, for the health endpoint.
    pub async fn counts(&self) -> JobCounts {
        self.registry.counts().await
    }

    /// Locate an upload by id: the upload handler stores files as
    /// `{file_id}_{sanitized name}`, so the id maps back to at most one
    /// file plus its original name.
    fn find_upload(&self, file_id: &str) -> Result<(PathBuf, String)> {
        let prefix = format!("{file_id}_");
        let entries = std::fs::read_dir(&self.upload_dir)
            .map_err(|_| Error::NotFound(format!("no uploaded file for id {file_id}")))?;

        let mut matches: Vec<(PathBuf, String)> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                let original = name.strip_prefix(&prefix)?;
                Some((entry.path(), original.to_string()))
            })
            .collect();
        matches.sort();
        matches
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("no uploaded file for id {file_id}")))
    }
}

/// The per-job task body. Captures every failure into the record; nothing
/// escapes into the runtime.
async fn run_job(
    registry: Arc<JobRegistry>,
    adapter: Arc<dyn BackendAdapter>,
    job_id: Uuid,
    cancel: CancellationToken,
    config: Arc<ExecutionConfig>,
) {
    let start = Instant::now();
    let status = match registry.transition(job_id, JobStatus::Processing).await {
        Ok(status) => status,
        Err(e) => {
            error!(job_id = %job_id, error = %e, "failed to start job");
            return;
        }
    };
    if status != JobStatus::Processing {
        // Cancelled between creation and task start.
        return;
    }

    let ctx = AdapterContext::new(job_id, registry.clone(), cancel);
    match adapter.run(&ctx, config).await {
        Ok(RunOutcome::Completed(artifacts)) => {
            if let Err(e) = registry.record_artifacts(job_id, artifacts).await {
                error!(job_id = %job_id, error = %e, "failed to record artifacts");
            }
            match registry.transition(job_id, JobStatus::Completed).await {
                Ok(status) => info!(
                    job_id = %job_id,
                    status = %status,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "job finished"
                ),
                Err(e) => error!(job_id = %job_id, error = %e, "failed to settle job"),
            }
        }
        Ok(RunOutcome::Cancelled) => {
            // The cancel call already settled the record.
            info!(
                job_id = %job_id,
                duration_ms = start.elapsed().as_millis() as u64,
                "job stopped on cancellation"
            );
        }
        Err(e) => {
            let message = e.to_string();
            if let Err(e) = registry.fail(job_id, message.as_str()).await {
                error!(job_id = %job_id, error = %e, "failed to mark job failed");
            }
            warn!(
                job_id = %job_id,
                error = %message,
                duration_ms = start.elapsed().as_millis() as u64,
                "job failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tempfile::TempDir;

    use doctrans_core::GuiSettings;

    use crate::engine::{
        CallbackEngine, ScriptedCallbackEngine, ScriptedStreamingEngine, StreamingEngine,
        TranslateEvent,
    };

    struct Harness {
        orchestrator: Orchestrator,
        uploads: TempDir,
        outputs: TempDir,
        config_dir: TempDir,
    }

    impl Harness {
        fn new(
            base: BaseSettings,
            streaming: Arc<dyn StreamingEngine>,
            callback: Arc<dyn CallbackEngine>,
        ) -> Self {
            let uploads = tempfile::tempdir().unwrap();
            let outputs = tempfile::tempdir().unwrap();
            let config_dir = tempfile::tempdir().unwrap();
            let store = ConfigStore::new(config_dir.path().join("doctrans.config.json"));
            let orchestrator = Orchestrator::new(
                base,
                store,
                EngineSet::new(streaming, callback),
                uploads.path(),
                outputs.path(),
            );
            Self {
                orchestrator,
                uploads,
                outputs,
                config_dir,
            }
        }

        fn with_callback(callback: Arc<dyn CallbackEngine>) -> Self {
            Self::new(
                BaseSettings::default(),
                Arc::new(ScriptedStreamingEngine::completing(None, None)),
                callback,
            )
        }

        fn upload(&self, file_id: &str, name: &str) {
            std::fs::write(
                self.uploads.path().join(format!("{file_id}_{name}")),
                b"%PDF-1.4 test",
            )
            .unwrap();
        }

        fn config_file(&self) -> PathBuf {
            self.config_dir.path().join("doctrans.config.json")
        }

        async fn wait_terminal(&self, job_id: Uuid) -> JobSnapshot {
            for _ in 0..300 {
                let snapshot = self.orchestrator.status(job_id).await.unwrap();
                if snapshot.status.is_terminal() {
                    return snapshot;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            panic!("job {job_id} never settled");
        }
    }

    fn google_inputs() -> RawInputs {
        [
            ("service", "Google"),
            ("lang_from", "English"),
            ("lang_to", "Simplified Chinese"),
            ("page_range", "All"),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn test_callback_job_end_to_end() {
        let harness = Harness::with_callback(Arc::new(ScriptedCallbackEngine::new(3)));
        harness.upload("f1", "paper.pdf");

        let job_id = harness
            .orchestrator
            .create_job("f1", &google_inputs(), SaveMode::Never)
            .await
            .unwrap();

        let snapshot = harness.wait_terminal(job_id).await;
        assert_eq!(snapshot.status, JobStatus::Completed);
        assert_eq!(snapshot.engine, "Google");
        assert_eq!(snapshot.backend, BackendKind::Callback);
        assert!(snapshot.artifacts.mono);
        assert!(!snapshot.artifacts.dual);
        assert!(snapshot.started_at.is_some());
        assert!(snapshot.completed_at.is_some());

        let mono = harness
            .orchestrator
            .artifact_path(job_id, ArtifactKind::Mono)
            .await
            .unwrap();
        assert!(mono.is_file());
        // The engine names outputs after the stored upload, id prefix included.
        assert_eq!(mono, harness.outputs.path().join("f1_paper-mono.pdf"));

        let err = harness
            .orchestrator
            .artifact_path(job_id, ArtifactKind::Dual)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_streaming_job_end_to_end() {
        let outputs = tempfile::tempdir().unwrap();
        let mono = outputs.path().join("paper-mono.pdf");
        std::fs::write(&mono, b"%PDF-1.4 translated").unwrap();

        let harness = Harness::new(
            BaseSettings::default(),
            Arc::new(ScriptedStreamingEngine::completing(Some(mono.clone()), None)),
            Arc::new(ScriptedCallbackEngine::new(1)),
        );
        harness.upload("f1", "paper.pdf");

        let inputs: RawInputs = [("service", "OpenAI"), ("rate_limit_mode", "RPM"), ("rpm", "240")]
            .into_iter()
            .collect();
        let job_id = harness
            .orchestrator
            .create_job("f1", &inputs, SaveMode::Never)
            .await
            .unwrap();

        let snapshot = harness.wait_terminal(job_id).await;
        assert_eq!(snapshot.status, JobStatus::Completed);
        assert_eq!(snapshot.backend, BackendKind::Streaming);
        assert!(snapshot
            .logs
            .iter()
            .any(|e| matches!(e, doctrans_core::ProgressEvent::Progress { .. })));

        let path = harness
            .orchestrator
            .artifact_path(job_id, ArtifactKind::Mono)
            .await
            .unwrap();
        assert_eq!(path, mono);
    }

    #[tokio::test]
    async fn test_unknown_engine_creates_no_job() {
        let harness = Harness::with_callback(Arc::new(ScriptedCallbackEngine::new(1)));
        harness.upload("f1", "paper.pdf");

        let inputs: RawInputs = [("service", "Altavista")].into_iter().collect();
        let err = harness
            .orchestrator
            .create_job("f1", &inputs, SaveMode::Never)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidSettings(_)));
        assert_eq!(harness.orchestrator.counts().await.total(), 0);
    }

    #[tokio::test]
    async fn test_missing_upload_is_not_found() {
        let harness = Harness::with_callback(Arc::new(ScriptedCallbackEngine::new(1)));

        let err = harness
            .orchestrator
            .create_job("missing", &google_inputs(), SaveMode::Never)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(harness.orchestrator.counts().await.total(), 0);
    }

    #[tokio::test]
    async fn test_cancel_processing_job_sticks() {
        let harness = Harness::new(
            BaseSettings::default(),
            Arc::new(
                ScriptedStreamingEngine::completing(None, None)
                    .with_step_delay(Duration::from_millis(50)),
            ),
            Arc::new(ScriptedCallbackEngine::new(1)),
        );
        harness.upload("f1", "paper.pdf");

        let inputs: RawInputs = [("service", "OpenAI")].into_iter().collect();
        let job_id = harness
            .orchestrator
            .create_job("f1", &inputs, SaveMode::Never)
            .await
            .unwrap();

        // Wait for the task to pick the job up, then cancel mid-run.
        for _ in 0..100 {
            if harness.orchestrator.status(job_id).await.unwrap().status
                == JobStatus::Processing
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let outcome = harness.orchestrator.cancel(job_id).await.unwrap();
        assert_eq!(outcome.status, JobStatus::Cancelled);
        assert!(outcome.note.is_none());

        // The engine's nominal finish time passes; the settled status holds.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let snapshot = harness.orchestrator.status(job_id).await.unwrap();
        assert_eq!(snapshot.status, JobStatus::Cancelled);

        let err = harness
            .orchestrator
            .artifact_path(job_id, ArtifactKind::Mono)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_cancel_on_completed_is_a_noop() {
        let harness = Harness::with_callback(Arc::new(ScriptedCallbackEngine::new(1)));
        harness.upload("f1", "paper.pdf");

        let job_id = harness
            .orchestrator
            .create_job("f1", &google_inputs(), SaveMode::Never)
            .await
            .unwrap();
        let before = harness.wait_terminal(job_id).await;
        assert_eq!(before.status, JobStatus::Completed);

        let outcome = harness.orchestrator.cancel(job_id).await.unwrap();
        assert_eq!(outcome.status, JobStatus::Completed);
        assert_eq!(outcome.note.as_deref(), Some("job already completed"));

        let after = harness.orchestrator.status(job_id).await.unwrap();
        assert_eq!(after.status, JobStatus::Completed);
        assert_eq!(after.logs, before.logs);
    }

    #[tokio::test]
    async fn test_cancelled_callback_job_keeps_late_artifacts_unreachable() {
        // An engine that ignores the flag: the work finishes after the
        // client already saw Cancelled.
        let harness = Harness::with_callback(Arc::new(
            ScriptedCallbackEngine::new(40).with_step_delay(Duration::from_millis(5)),
        ));
        harness.upload("f1", "paper.pdf");

        let job_id = harness
            .orchestrator
            .create_job("f1", &google_inputs(), SaveMode::Never)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        let outcome = harness.orchestrator.cancel(job_id).await.unwrap();
        assert_eq!(outcome.status, JobStatus::Cancelled);

        // Give the ignored blocking run time to finish and write its output.
        tokio::time::sleep(Duration::from_millis(400)).await;
        let snapshot = harness.orchestrator.status(job_id).await.unwrap();
        assert_eq!(snapshot.status, JobStatus::Cancelled, "first writer wins");
        assert!(
            snapshot.artifacts.mono,
            "late artifacts are recorded on the job"
        );

        let err = harness
            .orchestrator
            .artifact_path(job_id, ArtifactKind::Mono)
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::InvalidState(_)),
            "but unreachable for download"
        );
    }

    #[tokio::test]
    async fn test_cancel_unknown_job() {
        let harness = Harness::with_callback(Arc::new(ScriptedCallbackEngine::new(1)));
        let err = harness.orchestrator.cancel(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::JobNotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_job_records_error() {
        let harness =
            Harness::with_callback(Arc::new(ScriptedCallbackEngine::failing("quota exceeded")));
        harness.upload("f1", "paper.pdf");

        let job_id = harness
            .orchestrator
            .create_job("f1", &google_inputs(), SaveMode::Never)
            .await
            .unwrap();

        let snapshot = harness.wait_terminal(job_id).await;
        assert_eq!(snapshot.status, JobStatus::Failed);
        assert!(snapshot.error.as_deref().unwrap().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_save_mode_never_leaves_config_untouched() {
        let harness = Harness::with_callback(Arc::new(ScriptedCallbackEngine::new(1)));
        harness.upload("f1", "paper.pdf");

        harness
            .orchestrator
            .create_job("f1", &google_inputs(), SaveMode::Never)
            .await
            .unwrap();
        assert!(!harness.config_file().exists());
    }

    #[tokio::test]
    async fn test_save_mode_always_persists_restored_defaults() {
        let harness = Harness::with_callback(Arc::new(ScriptedCallbackEngine::new(1)));
        harness.upload("f1", "paper.pdf");

        let mut inputs = google_inputs();
        inputs.insert("page_range", "First");
        harness
            .orchestrator
            .create_job("f1", &inputs, SaveMode::Always)
            .await
            .unwrap();

        assert!(harness.config_file().exists());
        let persisted = ConfigStore::new(harness.config_file()).load().unwrap();
        // Job transients never leak into the persisted defaults.
        assert_eq!(persisted.pdf.pages, None);
        assert_eq!(persisted.translation.output, None);
    }

    #[tokio::test]
    async fn test_save_mode_follow_respects_disabled_auto_save() {
        let base = BaseSettings {
            gui: GuiSettings {
                disable_gui_sensitive_input: false,
                disable_config_auto_save: true,
            },
            ..BaseSettings::default()
        };
        let harness = Harness::new(
            base,
            Arc::new(ScriptedStreamingEngine::completing(None, None)),
            Arc::new(ScriptedCallbackEngine::new(1)),
        );
        harness.upload("f1", "paper.pdf");

        harness
            .orchestrator
            .create_job("f1", &google_inputs(), SaveMode::FollowGlobalSetting)
            .await
            .unwrap();
        assert!(!harness.config_file().exists());
    }

    #[tokio::test]
    async fn test_streaming_engine_failure_event() {
        let harness = Harness::new(
            BaseSettings::default(),
            Arc::new(ScriptedStreamingEngine::failing("model unavailable")),
            Arc::new(ScriptedCallbackEngine::new(1)),
        );
        harness.upload("f1", "paper.pdf");

        let inputs: RawInputs = [("service", "OpenAI")].into_iter().collect();
        let job_id = harness
            .orchestrator
            .create_job("f1", &inputs, SaveMode::Never)
            .await
            .unwrap();

        let snapshot = harness.wait_terminal(job_id).await;
        assert_eq!(snapshot.status, JobStatus::Failed);
        assert!(snapshot
            .error
            .as_deref()
            .unwrap()
            .contains("model unavailable"));
    }

    #[tokio::test]
    async fn test_artifact_path_rechecks_disk() {
        let harness = Harness::with_callback(Arc::new(ScriptedCallbackEngine::new(1)));
        harness.upload("f1", "paper.pdf");

        let job_id = harness
            .orchestrator
            .create_job("f1", &google_inputs(), SaveMode::Never)
            .await
            .unwrap();
        harness.wait_terminal(job_id).await;

        let path = harness
            .orchestrator
            .artifact_path(job_id, ArtifactKind::Mono)
            .await
            .unwrap();
        std::fs::remove_file(&path).unwrap();

        // The recorded path is rechecked on every request.
        let err = harness
            .orchestrator
            .artifact_path(job_id, ArtifactKind::Mono)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_streaming_finish_event_with_unknown_artifact() {
        // The engine names a path that was never written: the job completes
        // and the availability flag is set, but download rechecks fail.
        let harness = Harness::new(
            BaseSettings::default(),
            Arc::new(ScriptedStreamingEngine::completing(
                Some("/nonexistent/paper-mono.pdf".into()),
                None,
            )),
            Arc::new(ScriptedCallbackEngine::new(1)),
        );
        harness.upload("f1", "paper.pdf");

        let inputs: RawInputs = [("service", "OpenAI")].into_iter().collect();
        let job_id = harness
            .orchestrator
            .create_job("f1", &inputs, SaveMode::Never)
            .await
            .unwrap();
        let snapshot = harness.wait_terminal(job_id).await;
        assert_eq!(snapshot.status, JobStatus::Completed);

        let err = harness
            .orchestrator
            .artifact_path(job_id, ArtifactKind::Mono)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
