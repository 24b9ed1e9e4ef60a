//! # doctrans-core
//!
//! Core types and settings resolution for the doctrans document-translation
//! service.
//!
//! This crate provides the job/configuration data model, the engine metadata
//! catalog, rate-limit resolution and the per-job settings builder that the
//! orchestration and HTTP crates depend on.

pub mod catalog;
pub mod config;
pub mod defaults;
pub mod error;
pub mod files;
pub mod inputs;
pub mod language;
pub mod logging;
pub mod models;
pub mod rate_limit;
pub mod settings;

// Re-export commonly used types at crate root
pub use catalog::{EngineMetadata, FieldKind, FieldSpec, FOLLOW_MAIN_ENGINE};
pub use config::ConfigStore;
pub use error::{Error, Result};
pub use files::{sanitize_filename, validate_upload, UploadCheck};
pub use inputs::RawInputs;
pub use models::*;
pub use rate_limit::{RateLimitMode, ResolvedRateLimit};
pub use settings::{
    build_execution_config, BaseSettings, BuildOutcome, ExecutionConfig, FieldValue, GuiSettings,
    PdfSettings, SaveMode, TranslationSettings, WatermarkMode,
};
