//! Blob cache
//!
//! In-memory cache of downloaded item content, keyed by item id. Bounded by
//! total byte weight; entries may be evicted under memory pressure at any
//! time, so presence is advisory and correctness never depends on it.

use std::sync::Arc;

use moka::sync::Cache;
use tracing::{debug, trace};

/// Total cache capacity: 256 MiB of content.
/// Stands in for the unbounded platform-evicted cache of the original.
const MAX_CACHE_BYTES: u64 = 256 * 1024 * 1024;

/// In-memory cache for downloaded item content
pub struct BlobCache {
    blobs: Cache<String, Arc<Vec<u8>>>,
}

impl BlobCache {
    /// Create a cache with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(MAX_CACHE_BYTES)
    }

    /// Create a cache bounded to `max_bytes` of content
    pub fn with_capacity(max_bytes: u64) -> Self {
        let blobs = Cache::builder()
            .max_capacity(max_bytes)
            .weigher(|_id: &String, data: &Arc<Vec<u8>>| {
                data.len().try_into().unwrap_or(u32::MAX)
            })
            .name("blob_cache")
            .build();
        Self { blobs }
    }

    /// Cached bytes for an item, if present
    pub fn load(&self, id: &str) -> Option<Arc<Vec<u8>>> {
        match self.blobs.get(id) {
            Some(data) => {
                trace!(id = id, "Blob cache HIT");
                Some(data)
            }
            None => {
                trace!(id = id, "Blob cache MISS");
                None
            }
        }
    }

    /// Insert or overwrite the bytes for an item
    pub fn store(&self, id: &str, data: Arc<Vec<u8>>) {
        debug!(id = id, size = data.len(), "Stored blob");
        self.blobs.insert(id.to_string(), data);
    }

    /// Remove an item's bytes; a no-op when absent
    pub fn remove(&self, id: &str) {
        self.blobs.invalidate(id);
        debug!(id = id, "Removed blob");
    }

    /// Drop every entry; used when the session ends
    pub fn clear_all(&self) {
        self.blobs.invalidate_all();
        debug!("Cleared all blobs");
    }
}

impl Default for BlobCache {
    fn default() -> Self {
        Self::new()
    }
}
