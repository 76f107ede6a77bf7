//! Bazaar query cache.
//!
//! Read results are cached per [`CacheKey`] with a resource-specific
//! freshness window. Identical concurrent reads share a single load, writes
//! invalidate by key or by resource prefix, and subscribers are notified of
//! every change to the keys they watch.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! capacity = 256
//! default_stale_seconds = 300
//! ```

mod config;
mod events;
mod keys;
mod store;

pub use config::CacheConfig;
pub use events::{CacheEvent, Epoch, EventKind, Subscription};
pub use keys::{CacheKey, KeyPattern, Resource};
pub use store::{EntryStatus, QueryCache};
