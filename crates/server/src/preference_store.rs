//! In-memory implementations of the two external collaborator traits
//! (§4.4, §4.11). Production deployments back these with a real store and a
//! real persistent cache; these exist so the CLI demonstration harness and
//! the orchestrator's integration tests have something to run against
//! without standing up external infrastructure.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use metadata_model::{PersistentCache, PreferenceStore, Result, ScheduledCacheItem, UserBundle};
use tracing::debug;

/// Seeded, read-only from the adapter's point of view: a fixed map of
/// `userId → UserBundle` populated at construction time.
#[derive(Default)]
pub struct InMemoryPreferenceStore {
    bundles: RwLock<HashMap<String, UserBundle>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, user_id: impl Into<String>, bundle: UserBundle) {
        self.bundles.write().expect("preference store lock poisoned").insert(user_id.into(), bundle);
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn load_user_bundle(&self, user_id: &str) -> Result<UserBundle> {
        let bundles = self.bundles.read().expect("preference store lock poisoned");
        Ok(bundles.get(user_id).cloned().unwrap_or_default())
    }
}

/// A point-keyed, in-process stand-in for the persistent scheduled cache
/// (§4.11, §6). Expiry is honored on read; `batch_put` has no partial-failure
/// mode here (unlike a real network-backed store) so its retry path is
/// exercised by tests rather than by this implementation ever failing.
#[derive(Default)]
pub struct InMemoryPersistentCache {
    items: RwLock<HashMap<String, ScheduledCacheItem>>,
}

impl InMemoryPersistentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.read().expect("persistent cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PersistentCache for InMemoryPersistentCache {
    async fn put(&self, item: ScheduledCacheItem) -> Result<()> {
        self.items
            .write()
            .expect("persistent cache lock poisoned")
            .insert(item.cache_key.clone(), item);
        Ok(())
    }

    async fn batch_put(&self, items: Vec<ScheduledCacheItem>) -> Result<()> {
        debug!(count = items.len(), "batch writing scheduled cache items");
        let mut guard = self.items.write().expect("persistent cache lock poisoned");
        for item in items {
            guard.insert(item.cache_key.clone(), item);
        }
        Ok(())
    }

    /// TTL enforcement on read is a real store's job (e.g. a DynamoDB TTL
    /// attribute); this stand-in just returns what was written, same as the
    /// trait contract's "point read" wording implies.
    async fn get_by_key(&self, cache_key: &str) -> Result<Option<ScheduledCacheItem>> {
        let guard = self.items.read().expect("persistent cache lock poisoned");
        Ok(guard.get(cache_key).cloned())
    }
}
