/*!
 * Access Context
 * Explicit dependency bundle for the engine
 *
 * Everything the resolution and decision paths need — storage, content
 * lookups, configuration, the decision cache, the type registry — rides
 * in one shared context instead of ambient globals.
 */

use crate::cache::{AccessCache, CacheOp};
use crate::config::AccessConfig;
use crate::providers::{CacheStore, ContentProvider, GroupStore};
use crate::registry::ObjectTypeRegistry;
use std::sync::Arc;

pub struct AccessContext {
    store: Arc<dyn GroupStore>,
    content: Arc<dyn ContentProvider>,
    cache: AccessCache,
    config: AccessConfig,
    registry: ObjectTypeRegistry,
}

impl AccessContext {
    pub fn new(
        store: Arc<dyn GroupStore>,
        content: Arc<dyn ContentProvider>,
        config: AccessConfig,
    ) -> Arc<Self> {
        let registry = ObjectTypeRegistry::new(Arc::clone(&content));
        Arc::new(Self {
            store,
            content,
            cache: AccessCache::new(),
            config,
            registry,
        })
    }

    /// Context whose decision cache persists across requests through an
    /// external store
    pub fn with_cache_store(
        store: Arc<dyn GroupStore>,
        content: Arc<dyn ContentProvider>,
        config: AccessConfig,
        cache_store: Arc<dyn CacheStore>,
    ) -> Arc<Self> {
        let registry = ObjectTypeRegistry::new(Arc::clone(&content));
        Arc::new(Self {
            store,
            content,
            cache: AccessCache::with_store(cache_store),
            config,
            registry,
        })
    }

    pub fn store(&self) -> &Arc<dyn GroupStore> {
        &self.store
    }

    pub fn content(&self) -> &Arc<dyn ContentProvider> {
        &self.content
    }

    pub fn cache(&self) -> &AccessCache {
        &self.cache
    }

    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    pub fn registry(&self) -> &ObjectTypeRegistry {
        &self.registry
    }

    /// Drop every memoized group list, decision, and exclusion set.
    /// Group mutations call this; a stale entry would leak or hide
    /// access across the whole engine.
    pub fn invalidate_decisions(&self) {
        self.cache.invalidate(CacheOp::GroupsForObject);
        self.cache.invalidate(CacheOp::ObjectAccess);
        self.cache.invalidate(CacheOp::ExcludedPosts);
        self.cache.invalidate(CacheOp::ExcludedTerms);
    }
}
