//! HTTP request handlers.

pub mod config;
pub mod files;
pub mod jobs;

pub use config::{get_config, health_check};
pub use files::{download_artifact, upload_file};
pub use jobs::{cancel_job, create_translation, job_status};
