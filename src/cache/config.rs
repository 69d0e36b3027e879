use std::time::Duration;

use serde::Deserialize;

/// Configuration for cache freshness and eviction.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a fetched list counts as fresh, in milliseconds (default: 0).
    ///
    /// Fresh lists are served from the cache when a new view subscribes.
    /// Once stale, the next subscription refetches while still showing the
    /// cached rows.
    pub stale_time_ms: u64,

    /// How long a list with no subscribers is retained, in milliseconds
    /// (default: 300000). Zero evicts on the last unsubscribe.
    pub gc_time_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time_ms: 0,         // immediately stale
            gc_time_ms: 5 * 60 * 1000, // 5 minutes
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn new(stale_time: Duration, gc_time: Duration) -> Self {
        Self {
            stale_time_ms: stale_time.as_millis() as u64,
            gc_time_ms: gc_time.as_millis() as u64,
        }
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_millis(self.stale_time_ms)
    }

    pub fn gc_time(&self) -> Duration {
        Duration::from_millis(self.gc_time_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.stale_time(), Duration::from_secs(0));
        assert_eq!(config.gc_time(), Duration::from_secs(5 * 60));
    }

    #[test]
    fn test_new_config() {
        let config = CacheConfig::new(Duration::from_secs(30), Duration::from_millis(1500));
        assert_eq!(config.stale_time_ms, 30_000);
        assert_eq!(config.gc_time(), Duration::from_millis(1500));
    }
}
