//! Trait contracts for the external collaborators this crate only consumes:
//! the preference/favorites/watchlist store and the persistent scheduled
//! cache. Both are out of scope per spec.md §1; only the interfaces live here.

use crate::error::Result;
use crate::types::{ScheduledCacheItem, UserBundle};
use async_trait::async_trait;

/// Read-only view over a user's preferences, favorites, and watchlist.
///
/// Implementations MAY issue the three reads in parallel; on an individual
/// failure they should return partial (empty) data rather than failing the
/// whole bundle, per §4.4.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn load_user_bundle(&self, user_id: &str) -> Result<UserBundle>;
}

/// Point/batch write access to the persistent, 7-day-TTL scheduled cache.
/// Secondary access by `contentId + contentType` is referenced in spec.md §6
/// but its index schema is left unspecified (§9) and is not implemented here.
#[async_trait]
pub trait PersistentCache: Send + Sync {
    async fn put(&self, item: ScheduledCacheItem) -> Result<()>;

    /// Batch-writes up to 25 items at a time with at-most-once semantics per
    /// item. Implementations should fall back to per-item `put` calls when a
    /// batch write fails, per §4.11.
    async fn batch_put(&self, items: Vec<ScheduledCacheItem>) -> Result<()>;

    async fn get_by_key(&self, cache_key: &str) -> Result<Option<ScheduledCacheItem>>;
}
