//! Callback adapter: wraps a blocking engine call behind the event log.
//!
//! The engine reports progress through a callback and writes its outputs as
//! a side effect, so this adapter synthesizes the structured events itself
//! and resolves artifact paths afterwards by convention. Cancellation is
//! best-effort only: the blocking call cannot be interrupted, the job is
//! settled client-side while the work may run to completion.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::instrument;

use doctrans_core::{Artifacts, BackendKind, Error, ExecutionConfig, ProgressEvent, Result};

use crate::adapters::{AdapterContext, BackendAdapter, RunOutcome};
use crate::engine::CallbackEngine;

pub struct CallbackAdapter {
    engine: Arc<dyn CallbackEngine>,
}

impl CallbackAdapter {
    pub fn new(engine: Arc<dyn CallbackEngine>) -> Self {
        Self { engine }
    }
}

/// Resolve output paths for an engine that reports nothing back, in bounded
/// order: the exact `<stem>-mono.pdf` / `<stem>-dual.pdf` names first, then
/// any `<stem>*.pdf` carrying a `.mono.` / `.dual.` marker, and as a last
/// resort the most recently modified `<stem>*.pdf` taken as the mono output.
fn discover_artifacts(input_file: &Path, output_dir: &Path) -> Artifacts {
    let stem = match input_file.file_stem() {
        Some(stem) => stem.to_string_lossy().into_owned(),
        None => return Artifacts::default(),
    };

    let mut artifacts = Artifacts::default();
    let exact_mono = output_dir.join(format!("{stem}-mono.pdf"));
    if exact_mono.is_file() {
        artifacts.mono = Some(exact_mono);
    }
    let exact_dual = output_dir.join(format!("{stem}-dual.pdf"));
    if exact_dual.is_file() {
        artifacts.dual = Some(exact_dual);
    }
    if !artifacts.is_empty() {
        return artifacts;
    }

    let entries = match std::fs::read_dir(output_dir) {
        Ok(entries) => entries,
        Err(_) => return artifacts,
    };
    let mut candidates: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with(&stem) && name.ends_with(".pdf")
        })
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    candidates.sort();

    for path in &candidates {
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };
        if artifacts.mono.is_none() && name.contains(".mono.") {
            artifacts.mono = Some(path.clone());
        } else if artifacts.dual.is_none() && name.contains(".dual.") {
            artifacts.dual = Some(path.clone());
        }
    }
    if !artifacts.is_empty() {
        return artifacts;
    }

    artifacts.mono = candidates
        .into_iter()
        .max_by_key(|path| std::fs::metadata(path).and_then(|meta| meta.modified()).ok());
    artifacts
}

#[async_trait]
impl BackendAdapter for CallbackAdapter {
    fn backend(&self) -> BackendKind {
        BackendKind::Callback
    }

    #[instrument(
        skip(self, ctx, config),
        fields(subsystem = "jobs", component = "callback", op = "run", job_id = %ctx.job_id)
    )]
    async fn run(&self, ctx: &AdapterContext, config: Arc<ExecutionConfig>) -> Result<RunOutcome> {
        let cancel_flag = Arc::new(AtomicBool::new(false));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let engine = self.engine.clone();
        let task_config = config.clone();
        let task_flag = cancel_flag.clone();
        let task = tokio::task::spawn_blocking(move || {
            let progress = move |current: u64, total: u64, stage: Option<&str>| {
                let _ = tx.send(ProgressEvent::Progress {
                    current,
                    total,
                    stage: stage.map(str::to_string),
                });
            };
            engine.translate(&task_config, &progress, &task_flag)
        });

        // Pump synthesized events until the blocking call returns (the
        // sender drops with the progress closure). The cancel branch arms
        // once, then the loop keeps draining.
        let mut signalled = false;
        loop {
            tokio::select! {
                maybe = rx.recv() => match maybe {
                    Some(event) => ctx.emit(event).await?,
                    None => break,
                },
                _ = ctx.cancel.cancelled(), if !signalled => {
                    cancel_flag.store(true, Ordering::SeqCst);
                    signalled = true;
                }
            }
        }

        let result = task
            .await
            .map_err(|e| Error::BackendFailure(format!("translation task panicked: {e}")))?;

        match result {
            Ok(()) => {
                let artifacts = discover_artifacts(&config.input_file, &config.output_dir);
                if !ctx.cancel.is_cancelled() {
                    ctx.emit(ProgressEvent::Finished).await?;
                }
                Ok(RunOutcome::Completed(artifacts))
            }
            // An engine error after the token fired is the cancellation
            // surfacing through the flag, not a real failure.
            Err(_) if ctx.cancel.is_cancelled() => Ok(RunOutcome::Cancelled),
            Err(e) => Err(e),
        }
    }
}
