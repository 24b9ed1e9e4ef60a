//! Rate-limit resolution.
//!
//! Turns a user-facing rate-limit mode plus raw inputs into the two
//! primitives the execution layer actually needs: queries-per-second and an
//! optional worker-pool size. RPM and thread-count are user-friendly proxies;
//! Custom is the direct escape hatch. Validation always precedes derivation.

use serde::{Deserialize, Serialize};

use crate::defaults::{
    POOL_WORKERS_MAX, RPM_POOL_FACTOR, SECONDS_PER_MINUTE, THREADS_POOL_FRACTION,
    THREADS_POOL_HEADROOM,
};
use crate::error::{Error, Result};
use crate::inputs::RawInputs;

/// Input key for the RPM mode.
pub const KEY_RPM: &str = "rpm";
/// Input key for the concurrent-threads mode.
pub const KEY_CONCURRENT_THREADS: &str = "concurrent_threads";
/// Input key for the custom mode's qps.
pub const KEY_CUSTOM_QPS: &str = "custom_qps";
/// Input key for the custom mode's pool size.
pub const KEY_CUSTOM_POOL_WORKERS: &str = "custom_pool_workers";

/// How the client expressed its rate limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateLimitMode {
    /// Requests per minute, converted to qps.
    Rpm,
    /// Desired engine thread count, converted to a pool size.
    ConcurrentThreads,
    /// Direct (qps, pool) control.
    Custom,
}

impl RateLimitMode {
    /// Parse the UI label; the label set is closed.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "RPM" => Some(RateLimitMode::Rpm),
            "Concurrent Threads" => Some(RateLimitMode::ConcurrentThreads),
            "Custom" => Some(RateLimitMode::Custom),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RateLimitMode::Rpm => "RPM",
            RateLimitMode::ConcurrentThreads => "Concurrent Threads",
            RateLimitMode::Custom => "Custom",
        }
    }
}

/// Resolver output: `qps >= 1`; `pool_workers` unset or `1..=1000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRateLimit {
    pub qps: u32,
    pub pool_workers: Option<u32>,
}

/// Check the mode's required inputs without computing anything.
///
/// Non-positive, non-integer and missing required values all fail with the
/// mode-specific message; a blank optional pool size is expected, not an
/// error.
pub fn validate(mode: RateLimitMode, inputs: &RawInputs) -> Result<()> {
    match mode {
        RateLimitMode::Rpm => {
            positive_int(inputs, KEY_RPM)
                .ok_or_else(|| Error::InvalidSettings("RPM must be a positive integer".into()))?;
        }
        RateLimitMode::ConcurrentThreads => {
            positive_int(inputs, KEY_CONCURRENT_THREADS).ok_or_else(|| {
                Error::InvalidSettings("Concurrent threads must be a positive integer".into())
            })?;
        }
        RateLimitMode::Custom => {
            positive_int(inputs, KEY_CUSTOM_QPS)
                .ok_or_else(|| Error::InvalidSettings("QPS must be a positive integer".into()))?;
            if inputs.contains(KEY_CUSTOM_POOL_WORKERS)
                && non_negative_int(inputs, KEY_CUSTOM_POOL_WORKERS).is_none()
            {
                return Err(Error::InvalidSettings(
                    "Pool workers must be a non-negative integer".into(),
                ));
            }
        }
    }
    Ok(())
}

/// Validate, then derive the (qps, pool) pair for the mode.
pub fn resolve(mode: RateLimitMode, inputs: &RawInputs) -> Result<ResolvedRateLimit> {
    validate(mode, inputs)?;

    let resolved = match mode {
        RateLimitMode::Rpm => {
            let rpm = positive_int(inputs, KEY_RPM).unwrap_or(1);
            let qps = (rpm / SECONDS_PER_MINUTE).max(1);
            let pool_workers = (qps.saturating_mul(RPM_POOL_FACTOR)).min(POOL_WORKERS_MAX);
            ResolvedRateLimit {
                qps,
                pool_workers: Some(pool_workers),
            }
        }
        RateLimitMode::ConcurrentThreads => {
            let threads = positive_int(inputs, KEY_CONCURRENT_THREADS).unwrap_or(1) as i64;
            // Reserve headroom off the requested count, then keep 90% of the
            // remainder for the pool.
            let headroom = (threads - THREADS_POOL_HEADROOM).max(1);
            let kept = (headroom as f64 * THREADS_POOL_FRACTION).round() as i64;
            let pool_workers = kept.max(1).min(POOL_WORKERS_MAX as i64) as u32;
            ResolvedRateLimit {
                qps: pool_workers.max(1),
                pool_workers: Some(pool_workers),
            }
        }
        RateLimitMode::Custom => {
            let qps = positive_int(inputs, KEY_CUSTOM_QPS).unwrap_or(1);
            // 0 means "let the execution layer pick"; normalized to unset.
            let pool_workers =
                non_negative_int(inputs, KEY_CUSTOM_POOL_WORKERS).filter(|&w| w > 0);
            ResolvedRateLimit { qps, pool_workers }
        }
    };

    Ok(resolved)
}

fn positive_int(inputs: &RawInputs, key: &str) -> Option<u32> {
    inputs
        .get(key)
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|&v| v > 0)
}

fn non_negative_int(inputs: &RawInputs, key: &str) -> Option<u32> {
    inputs.get(key).and_then(|v| v.parse::<u32>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(pairs: &[(&str, &str)]) -> RawInputs {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_mode_labels_round_trip() {
        for mode in [
            RateLimitMode::Rpm,
            RateLimitMode::ConcurrentThreads,
            RateLimitMode::Custom,
        ] {
            assert_eq!(RateLimitMode::from_label(mode.label()), Some(mode));
        }
        assert_eq!(RateLimitMode::from_label("rpm"), None);
        assert_eq!(RateLimitMode::from_label("Tokens"), None);
    }

    #[test]
    fn test_rpm_240_resolves_to_4_and_40() {
        let resolved = resolve(RateLimitMode::Rpm, &inputs(&[("rpm", "240")])).unwrap();
        assert_eq!(resolved.qps, 4);
        assert_eq!(resolved.pool_workers, Some(40));
    }

    #[test]
    fn test_rpm_below_60_floors_at_1_qps() {
        let resolved = resolve(RateLimitMode::Rpm, &inputs(&[("rpm", "30")])).unwrap();
        assert_eq!(resolved.qps, 1);
        assert_eq!(resolved.pool_workers, Some(10));
    }

    #[test]
    fn test_rpm_pool_clamps_at_1000() {
        let resolved = resolve(RateLimitMode::Rpm, &inputs(&[("rpm", "60000")])).unwrap();
        assert_eq!(resolved.qps, 1000);
        assert_eq!(resolved.pool_workers, Some(1000));
    }

    #[test]
    fn test_concurrent_threads_40_resolves_to_18_18() {
        // round(0.9 * (40 - 20)) = 18
        let resolved = resolve(
            RateLimitMode::ConcurrentThreads,
            &inputs(&[("concurrent_threads", "40")]),
        )
        .unwrap();
        assert_eq!(resolved.pool_workers, Some(18));
        assert_eq!(resolved.qps, 18);
    }

    #[test]
    fn test_concurrent_threads_small_counts_floor_at_1() {
        let resolved = resolve(
            RateLimitMode::ConcurrentThreads,
            &inputs(&[("concurrent_threads", "1")]),
        )
        .unwrap();
        assert_eq!(resolved.pool_workers, Some(1));
        assert_eq!(resolved.qps, 1);
    }

    #[test]
    fn test_concurrent_threads_large_counts_clamp_at_1000() {
        let resolved = resolve(
            RateLimitMode::ConcurrentThreads,
            &inputs(&[("concurrent_threads", "5000")]),
        )
        .unwrap();
        assert_eq!(resolved.pool_workers, Some(1000));
        assert_eq!(resolved.qps, 1000);
    }

    #[test]
    fn test_custom_takes_values_directly() {
        let resolved = resolve(
            RateLimitMode::Custom,
            &inputs(&[("custom_qps", "7"), ("custom_pool_workers", "12")]),
        )
        .unwrap();
        assert_eq!(resolved.qps, 7);
        assert_eq!(resolved.pool_workers, Some(12));
    }

    #[test]
    fn test_custom_zero_pool_normalizes_to_unset() {
        let resolved = resolve(
            RateLimitMode::Custom,
            &inputs(&[("custom_qps", "7"), ("custom_pool_workers", "0")]),
        )
        .unwrap();
        assert_eq!(resolved.pool_workers, None);

        let resolved = resolve(RateLimitMode::Custom, &inputs(&[("custom_qps", "7")])).unwrap();
        assert_eq!(resolved.pool_workers, None);
    }

    #[test]
    fn test_validate_rejects_zero_negative_and_fractional_rpm() {
        for bad in ["0", "-5", "2.5"] {
            let err = validate(RateLimitMode::Rpm, &inputs(&[("rpm", bad)])).unwrap_err();
            assert_eq!(err.to_string(), "Invalid settings: RPM must be a positive integer");
        }
    }

    #[test]
    fn test_validate_rejects_missing_required_fields() {
        assert!(validate(RateLimitMode::Rpm, &inputs(&[])).is_err());
        assert!(validate(RateLimitMode::ConcurrentThreads, &inputs(&[])).is_err());
        assert!(validate(RateLimitMode::Custom, &inputs(&[])).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_threads_and_pool() {
        assert!(validate(
            RateLimitMode::ConcurrentThreads,
            &inputs(&[("concurrent_threads", "1.5")])
        )
        .is_err());
        let err = validate(
            RateLimitMode::Custom,
            &inputs(&[("custom_qps", "4"), ("custom_pool_workers", "-1")]),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid settings: Pool workers must be a non-negative integer"
        );
    }

    #[test]
    fn test_resolved_bounds_hold_across_modes() {
        let cases = [
            (RateLimitMode::Rpm, inputs(&[("rpm", "1")])),
            (RateLimitMode::Rpm, inputs(&[("rpm", "100000")])),
            (
                RateLimitMode::ConcurrentThreads,
                inputs(&[("concurrent_threads", "3")]),
            ),
            (
                RateLimitMode::ConcurrentThreads,
                inputs(&[("concurrent_threads", "2000")]),
            ),
            (
                RateLimitMode::Custom,
                inputs(&[("custom_qps", "9"), ("custom_pool_workers", "500")]),
            ),
        ];
        for (mode, raw) in cases {
            let resolved = resolve(mode, &raw).unwrap();
            assert!(resolved.qps >= 1);
            if let Some(pool) = resolved.pool_workers {
                assert!((1..=1000).contains(&pool));
            }
        }
    }
}
