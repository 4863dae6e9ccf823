//! Metrics collection.
//!
//! # Responsibilities
//! - Define router metrics (navigations, matches, loaders, cache)
//! - Record them through the `metrics` facade
//!
//! # Metrics
//! - `waymark_navigations_total` (counter): navigations by outcome
//! - `waymark_navigation_duration_seconds` (histogram): start to settle
//! - `waymark_match_total` (counter): resolutions by result (hit, miss, fallback)
//! - `waymark_suspensions_total` (counter): navigation restarts after suspense
//! - `waymark_loader_duration_seconds` (histogram): per route and outcome
//! - `waymark_cache_lookups_total` (counter): cache hits and misses
//! - `waymark_cache_evictions_total` / `waymark_cache_expirations_total` (counters)
//! - `waymark_cache_entries` (gauge): current cache size
//!
//! # Design Decisions
//! - No exporter is installed by the library; without a recorder every call
//!   is a no-op
//! - `set_enabled(false)` short-circuits recording entirely
//! - Labels stay low-cardinality: outcomes and route patterns, never URLs

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use metrics::{counter, gauge, histogram};

static ENABLED: AtomicBool = AtomicBool::new(true);

/// Turn recording on or off process-wide.
pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

pub fn record_navigation(outcome: &'static str, duration: Duration) {
    if !is_enabled() {
        return;
    }
    counter!("waymark_navigations_total", "outcome" => outcome).increment(1);
    histogram!("waymark_navigation_duration_seconds", "outcome" => outcome)
        .record(duration.as_secs_f64());
}

pub fn record_match(result: &'static str) {
    if !is_enabled() {
        return;
    }
    counter!("waymark_match_total", "result" => result).increment(1);
}

pub fn record_suspension() {
    if !is_enabled() {
        return;
    }
    counter!("waymark_suspensions_total").increment(1);
}

pub fn record_loader(route: &str, outcome: &'static str, duration: Duration) {
    if !is_enabled() {
        return;
    }
    histogram!(
        "waymark_loader_duration_seconds",
        "route" => route.to_string(),
        "outcome" => outcome
    )
    .record(duration.as_secs_f64());
}

pub fn record_cache_lookup(hit: bool) {
    if !is_enabled() {
        return;
    }
    let result = if hit { "hit" } else { "miss" };
    counter!("waymark_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_cache_eviction() {
    if !is_enabled() {
        return;
    }
    counter!("waymark_cache_evictions_total").increment(1);
}

pub fn record_cache_expiration() {
    if !is_enabled() {
        return;
    }
    counter!("waymark_cache_expirations_total").increment(1);
}

pub fn record_cache_size(entries: usize) {
    if !is_enabled() {
        return;
    }
    gauge!("waymark_cache_entries").set(entries as f64);
}
