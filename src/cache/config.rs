//! Cache configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

use super::keys::Resource;

const DEFAULT_CAPACITY: usize = 256;
const DEFAULT_STALE_SECONDS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of keys kept before LRU eviction.
    pub capacity: usize,
    /// Freshness window for resources without their own.
    pub default_stale: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            default_stale: Duration::from_secs(DEFAULT_STALE_SECONDS),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            capacity: settings.capacity,
            default_stale: Duration::from_secs(settings.default_stale_seconds),
        }
    }
}

impl CacheConfig {
    /// Capacity as `NonZeroUsize`, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn stale_window(&self, resource: Resource) -> Duration {
        resource.stale_window().unwrap_or(self.default_stale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_clamps_to_one() {
        let config = CacheConfig {
            capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.capacity_non_zero().get(), 1);
    }

    #[test]
    fn resources_without_window_use_default() {
        let config = CacheConfig {
            default_stale: Duration::from_secs(7),
            ..Default::default()
        };
        assert_eq!(config.stale_window(Resource::BuyerCart), Duration::from_secs(7));
        assert_eq!(
            config.stale_window(Resource::ProductsSearch),
            Duration::from_secs(120)
        );
    }
}
