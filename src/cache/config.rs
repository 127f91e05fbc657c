//! Cache configuration.
//!
//! Resolved from the `[cache]` section of `quire.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

const DEFAULT_DURATION_SECONDS: i64 = 3600;
const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Lifetime of every entry. `None` disables caching entirely.
    pub ttl: Option<Duration>,
    /// Maximum number of entries held by the in-memory store.
    pub capacity: NonZeroUsize,
    /// Run a full warm pass before the server starts accepting requests.
    pub warm_on_startup: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: ttl_from_seconds(DEFAULT_DURATION_SECONDS),
            capacity: NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            warm_on_startup: false,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            ttl: ttl_from_seconds(settings.duration_seconds),
            capacity: settings.capacity,
            warm_on_startup: settings.warm_on_startup,
        }
    }
}

impl CacheConfig {
    pub fn is_enabled(&self) -> bool {
        self.ttl.is_some()
    }
}

/// Zero or negative durations disable caching instead of storing entries that expire immediately.
pub fn ttl_from_seconds(seconds: i64) -> Option<Duration> {
    u64::try_from(seconds)
        .ok()
        .filter(|seconds| *seconds > 0)
        .map(Duration::from_secs)
}
