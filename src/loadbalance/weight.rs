//! Effective-weight resolution with linear warm-up.
//!
//! A just-registered instance starts at effective weight 1 and ramps
//! linearly to its configured weight over the warm-up window, protecting
//! cold caches and lazily-compiled hot paths on the provider side.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::{context::Invocation, discovery::Instance};

pub(crate) const WEIGHT_KEY: &str = "weight";
pub(crate) const WARMUP_KEY: &str = "warmup";

pub(crate) const DEFAULT_WEIGHT: i64 = 100;
pub(crate) const DEFAULT_WARMUP_MS: i64 = 600_000;

pub(crate) fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Effective weight of `instance` for this invocation, in
/// `[0, configured_weight]`.
///
/// A configured weight `<= 0` yields 0 and excludes the instance from
/// weighted selection. Once uptime reaches the warm-up window the result
/// equals the configured weight.
pub fn resolve_weight(instance: &Instance, invocation: &Invocation) -> u32 {
    resolve_weight_at(instance, &invocation.method, now_ms())
}

pub(crate) fn resolve_weight_at(instance: &Instance, method: &str, now_ms: i64) -> u32 {
    let weight = instance
        .method_param_i64(method, WEIGHT_KEY, DEFAULT_WEIGHT)
        .min(i32::MAX as i64);
    if weight <= 0 {
        return 0;
    }

    let start_at = instance.start_at_ms;
    if start_at <= 0 {
        return weight as u32;
    }
    let uptime = now_ms - start_at;
    // A timestamp in the future means clock skew, not a cold instance.
    if uptime <= 0 {
        return weight as u32;
    }

    let warmup = instance.method_param_i64(method, WARMUP_KEY, DEFAULT_WARMUP_MS);
    if warmup <= 0 || uptime >= warmup {
        return weight as u32;
    }

    let ramped = (uptime as f64 / (warmup as f64 / weight as f64)) as i64;
    ramped.clamp(1, weight) as u32
}
