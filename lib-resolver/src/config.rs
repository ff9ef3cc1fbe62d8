//! Resolver configuration

use std::time::Duration;

/// Tuning knobs for the universal resolver's cache layer
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Maximum number of cached resolutions
    pub cache_size: usize,
    /// TTL for cached resolutions that bound at least one record
    pub default_ttl: Duration,
    /// Shorter TTL for names that bound nothing (likely unregistered)
    pub negative_ttl: Duration,
    /// Whether to track hit/miss metrics
    pub enable_metrics: bool,
    /// Emit debug logs on every cache decision
    pub debug_cache: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_size: 1024,
            default_ttl: Duration::from_secs(300),
            negative_ttl: Duration::from_secs(30),
            enable_metrics: true,
            debug_cache: false,
        }
    }
}
