//! Cache namespaces.
//!
//! Captured responses live in named namespaces ("caches"), one of which is current at any time:
//! the one named by [`WorkerConfig::cache_name`][crate::WorkerConfig::cache_name], which embeds
//! the deployed version. Older namespaces are deleted when a new version activates.
//!
//! ## Storage boundary
//!
//! [`CacheStorage`] and [`Cache`] are the interface to the host's cache store. Each operation is
//! expected to be atomic per key; nothing here needs cross-key transactions, so concurrent fetches
//! may share one namespace without further coordination.
//!
//! [`MemoryCacheStorage`] is a complete in-memory implementation for native hosts and tests.
//!
//! ## Keys
//!
//! A [`CacheKey`] identifies a request: its method, its URL without fragment, and optionally the
//! values of selected request headers.

mod key;
mod memory;
mod storage;

pub use self::key::{CacheKey, CacheKeyBuilder};
pub use self::memory::{MemoryCache, MemoryCacheStorage};
pub use self::storage::{Cache, CacheStorage, CachedResponse};

/// Errors arising from cache operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CacheError {
    /// The host's cache store cannot be used, e.g. storage access is disabled.
    #[error("cache storage is unavailable")]
    Unavailable,
    /// Operation failed due to a storage quota.
    #[error("cache storage quota exceeded")]
    QuotaExceeded,
    /// The response could not be captured for storage.
    #[error("response body could not be captured: {0}")]
    Body(#[from] crate::http::BodyError),
    /// An unknown error occurred.
    #[error("unknown cache operation error: {0}")]
    Other(String),
}
