//! # doctrans-jobs
//!
//! Job orchestration for doctrans: per-job async tasks around pluggable
//! translation engines.
//!
//! This crate provides:
//! - An in-memory job registry with a strict status state machine
//! - Streaming and callback engine seams, plus subprocess implementations
//! - Backend adapters that normalize engine progress into job logs
//! - Cooperative cancellation with sticky terminal states
//!
//! ## Example
//!
//! ```ignore
//! use doctrans_jobs::{CommandCallbackEngine, CommandStreamingEngine, EngineSet, Orchestrator};
//! use doctrans_core::{ConfigStore, RawInputs, SaveMode};
//! use std::sync::Arc;
//!
//! let store = ConfigStore::from_env();
//! let base = store.load()?;
//! let engines = EngineSet::new(
//!     Arc::new(CommandStreamingEngine::from_env()),
//!     Arc::new(CommandCallbackEngine::from_env()),
//! );
//! let orchestrator = Orchestrator::new(base, store, engines, "uploads", "outputs");
//!
//! let inputs: RawInputs = [("service", "Google"), ("lang_to", "Simplified Chinese")]
//!     .into_iter()
//!     .collect();
//! let job_id = orchestrator.create_job("file-id", &inputs, SaveMode::Never).await?;
//!
//! // Poll until terminal, then fetch artifacts.
//! let snapshot = orchestrator.status(job_id).await?;
//! println!("{:?}", snapshot.status);
//! ```

pub mod adapters;
pub mod engine;
pub mod orchestrator;
pub mod process;
pub mod registry;

// Re-export core types
pub use doctrans_core::*;

// Re-export orchestration types
pub use orchestrator::{CancelOutcome, Orchestrator};
pub use registry::{CancelDisposition, JobRecord, JobRegistry};

// Re-export engine seams and implementations
pub use engine::{
    CallbackEngine, EngineHealth, EngineRun, EngineSet, ScriptedCallbackEngine,
    ScriptedStreamingEngine, StreamingEngine, TranslateEvent,
};
pub use process::{CommandCallbackEngine, CommandStreamingEngine};

// Re-export adapter types
pub use adapters::{AdapterContext, BackendAdapter, CallbackAdapter, RunOutcome, StreamingAdapter};
