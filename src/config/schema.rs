//! Configuration schema definitions.
//!
//! This module defines the router manifest: navigation limits, cache sizing,
//! observability settings and the declarative route table. All types derive
//! Serde traits for deserialization from TOML.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resource::cache::{EntryOptions, Priority};

/// Root configuration for a router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Navigation lifecycle limits.
    pub navigation: NavigationConfig,

    /// Loader cache sizing.
    pub cache: CacheConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Declarative route table, in registry order.
    pub routes: Vec<RouteConfig>,

    /// Name of the route substituted when nothing matches.
    pub fallback: Option<String>,
}

/// Navigation lifecycle limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Guard redirects followed before giving up.
    pub max_redirects: u32,

    /// Times a navigation may restart after a loader suspends.
    pub max_suspense_retries: u32,

    /// Longest wait on one pending resource, in milliseconds.
    pub suspense_timeout_ms: u64,

    /// Longest wait on the transition backend, in milliseconds.
    pub transition_timeout_ms: u64,
}

impl NavigationConfig {
    pub fn suspense_timeout(&self) -> Duration {
        Duration::from_millis(self.suspense_timeout_ms)
    }

    pub fn transition_timeout(&self) -> Duration {
        Duration::from_millis(self.transition_timeout_ms)
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            max_redirects: 10,
            max_suspense_retries: 5,
            suspense_timeout_ms: 10_000,
            transition_timeout_ms: 5_000,
        }
    }
}

/// Loader cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries.
    pub capacity: usize,

    /// TTL for entries stored without one, in milliseconds.
    pub default_ttl_ms: Option<u64>,

    /// Janitor sweep interval in seconds (0 disables the janitor).
    pub cleanup_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            default_ttl_ms: Some(5 * 60 * 1000),
            cleanup_interval_secs: 60,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Record metrics through the `metrics` facade.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
        }
    }
}

/// One declarative route.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route name, used by `build` and as fallback reference.
    pub name: String,

    /// Textual pattern, e.g. `/users/:id<integer>?[tab]`.
    pub pattern: String,

    /// Optional cache policy for the route's loader data.
    #[serde(default)]
    pub cache: Option<CachePolicyConfig>,

    /// Free-form metadata copied into the route's `extra` map.
    #[serde(default)]
    pub meta: BTreeMap<String, serde_json::Value>,
}

/// Cache policy for one route.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CachePolicyConfig {
    /// Entry TTL in milliseconds (cache default when unset).
    pub ttl_ms: Option<u64>,

    /// Eviction tier.
    pub priority: Priority,

    /// Invalidation tags.
    pub tags: Vec<String>,
}

impl CachePolicyConfig {
    pub fn to_entry_options(&self) -> EntryOptions {
        EntryOptions {
            ttl: self.ttl_ms.map(Duration::from_millis),
            priority: self.priority,
            tags: self.tags.clone(),
        }
    }
}
