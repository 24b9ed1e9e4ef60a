//! Centralized default constants for the doctrans system.
//!
//! **This module is the single source of truth** for all shared default values.
//! All crates should reference these constants instead of defining their own
//! magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 8000;

/// Default bind host.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default CORS max-age in seconds (1 hour).
pub const CORS_MAX_AGE_SECS: u64 = 3600;

/// Maximum upload body size in bytes (200 MB; scanned PDFs run large).
pub const MAX_UPLOAD_SIZE_BYTES: usize = 200 * 1024 * 1024;

/// Maximum filename length (ext4/NTFS compatible).
pub const FILENAME_MAX_LENGTH: usize = 255;

// =============================================================================
// DIRECTORIES
// =============================================================================

/// Environment variable for the upload directory.
pub const ENV_UPLOAD_DIR: &str = "UPLOAD_DIR";

/// Default directory for uploaded source documents.
pub const UPLOAD_DIR: &str = "uploads";

/// Environment variable for the output directory.
pub const ENV_OUTPUT_DIR: &str = "OUTPUT_DIR";

/// Default directory translated artifacts are written to.
pub const OUTPUT_DIR: &str = "outputs";

/// Environment variable for the persisted default-settings file.
pub const ENV_CONFIG_FILE: &str = "CONFIG_FILE";

/// Default path of the persisted default-settings file.
pub const CONFIG_FILE: &str = "doctrans.config.json";

// =============================================================================
// RATE LIMITS
// =============================================================================

/// Default queries-per-second toward a translation engine when neither the
/// base configuration nor the request supplies one.
pub const DEFAULT_QPS: u32 = 4;

/// Upper bound on the engine worker pool; derivation rules clamp here.
pub const POOL_WORKERS_MAX: u32 = 1000;

/// Requests-per-minute to qps divisor.
pub const SECONDS_PER_MINUTE: u32 = 60;

/// Pool size multiplier for the RPM derivation rule.
pub const RPM_POOL_FACTOR: u32 = 10;

/// Fraction of the headroom-limited thread count the pool derivation keeps.
pub const THREADS_POOL_FRACTION: f64 = 0.9;

/// Threads reserved away from the pool in the thread-count derivation.
pub const THREADS_POOL_HEADROOM: i64 = 20;

// =============================================================================
// TRANSLATION
// =============================================================================

/// Progress report interval handed to the engines, in seconds.
pub const REPORT_INTERVAL_SECS: f64 = 0.2;

/// Fallback source language when a label cannot be resolved.
pub const FALLBACK_SOURCE_LANG: &str = "auto";

/// Fallback target language when a label cannot be resolved.
pub const FALLBACK_TARGET_LANG: &str = "zh";

// =============================================================================
// ENGINES
// =============================================================================

/// Environment variable for the streaming engine command line.
pub const ENV_ENGINE_COMMAND: &str = "ENGINE_COMMAND";

/// Default streaming engine command.
pub const ENGINE_COMMAND: &str = "doctrans-engine";

/// Environment variable for the classic (callback) engine command line.
pub const ENV_CLASSIC_ENGINE_COMMAND: &str = "CLASSIC_ENGINE_COMMAND";

/// Default classic engine command.
pub const CLASSIC_ENGINE_COMMAND: &str = "doctrans-engine-classic";

/// Timeout for engine availability/version probes (seconds).
pub const ENGINE_PROBE_TIMEOUT_SECS: u64 = 5;
