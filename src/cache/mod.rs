/*!
 * Decision Cache
 * Structured-key memoization for group lookups and access decisions
 *
 * Keys are typed tuples, serialized deterministically for the external
 * store; there is no delimiter-collision surface. Entries never expire
 * on their own: every write path invalidates synchronously, so a TTL
 * would only mask invalidation bugs.
 */

use crate::core::{AccessAction, GroupId, ObjectId, ObjectType, UserId};
use crate::groups::Membership;
use crate::providers::CacheStore;
use dashmap::DashMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Which group listing a cached entry belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "view", content = "subject")]
pub enum GroupView {
    All,
    /// Author-filtered view; distinct per evaluating subject
    Filtered(Option<UserId>),
}

/// Composite cache key: operation, object type, view/subject, object id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum CacheKey {
    GroupsForObject {
        object_type: ObjectType,
        view: GroupView,
        object_id: ObjectId,
    },
    ObjectAccess {
        action: AccessAction,
        subject: Option<UserId>,
        object_type: ObjectType,
        object_id: ObjectId,
    },
    ExcludedPosts {
        action: AccessAction,
        subject: Option<UserId>,
    },
    ExcludedTerms {
        action: AccessAction,
        subject: Option<UserId>,
    },
}

impl CacheKey {
    pub fn op(&self) -> CacheOp {
        match self {
            CacheKey::GroupsForObject { .. } => CacheOp::GroupsForObject,
            CacheKey::ObjectAccess { .. } => CacheOp::ObjectAccess,
            CacheKey::ExcludedPosts { .. } => CacheOp::ExcludedPosts,
            CacheKey::ExcludedTerms { .. } => CacheOp::ExcludedTerms,
        }
    }

    /// Deterministic rendering for the external store. Type names are
    /// normalized to a delimiter-safe alphabet, so the colon cannot
    /// collide.
    pub fn render(&self) -> String {
        fn subject(id: &Option<UserId>) -> String {
            match id {
                Some(id) => format!("u{id}"),
                None => "anon".to_string(),
            }
        }

        match self {
            CacheKey::GroupsForObject {
                object_type,
                view,
                object_id,
            } => {
                let view = match view {
                    GroupView::All => "all".to_string(),
                    GroupView::Filtered(id) => format!("filtered:{}", subject(id)),
                };
                format!("groups_for_object:{object_type}:{view}:{object_id}")
            }
            CacheKey::ObjectAccess {
                action,
                subject: id,
                object_type,
                object_id,
            } => format!(
                "object_access:{}:{}:{object_type}:{object_id}",
                action.as_str(),
                subject(id)
            ),
            CacheKey::ExcludedPosts { action, subject: id } => {
                format!("excluded_posts:{}:{}", action.as_str(), subject(id))
            }
            CacheKey::ExcludedTerms { action, subject: id } => {
                format!("excluded_terms:{}:{}", action.as_str(), subject(id))
            }
        }
    }
}

/// Operation families, the granularity of invalidation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOp {
    GroupsForObject,
    ObjectAccess,
    ExcludedPosts,
    ExcludedTerms,
}

/// A memoized computation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CachedValue {
    /// Groups connected to an object, with how each connection holds
    Groups(Vec<(GroupId, Membership)>),
    Access(bool),
    Objects(Vec<ObjectId>),
}

/// Process-local decision cache with optional write-through to a
/// cross-request store
pub struct AccessCache {
    local: DashMap<CacheKey, CachedValue, ahash::RandomState>,
    external: Option<Arc<dyn CacheStore>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl AccessCache {
    pub fn new() -> Self {
        Self {
            local: DashMap::with_hasher(ahash::RandomState::new()),
            external: None,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cache that also persists entries across requests through the
    /// given store
    pub fn with_store(store: Arc<dyn CacheStore>) -> Self {
        Self {
            external: Some(store),
            ..Self::new()
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        if let Some(entry) = self.local.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Some(entry.value().clone());
        }

        if let Some(store) = &self.external {
            if let Some(encoded) = store.get(&key.render()) {
                if let Ok(value) = bincode::deserialize::<CachedValue>(&encoded) {
                    // Promote so the next lookup stays in-process
                    self.local.insert(key.clone(), value.clone());
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(value);
                }
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn put(&self, key: CacheKey, value: CachedValue) {
        if let Some(store) = &self.external {
            if let Ok(encoded) = bincode::serialize(&value) {
                store.put(&key.render(), encoded);
            }
        }
        self.local.insert(key, value);
    }

    /// Drop every entry of one operation family. The external store is
    /// flushed wholesale; its contract is get/put/flush.
    pub fn invalidate(&self, op: CacheOp) {
        debug!("Invalidating cache op {op:?}");
        self.local.retain(|key, _| key.op() != op);
        if let Some(store) = &self.external {
            store.flush();
        }
    }

    pub fn flush(&self) {
        self.local.clear();
        if let Some(store) = &self.external {
            store.flush();
        }
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            size: self.local.len(),
            hits,
            misses,
            hit_rate,
        }
    }
}

impl Default for AccessCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MemoryCacheStore;

    fn access_key(id: ObjectId) -> CacheKey {
        CacheKey::ObjectAccess {
            action: AccessAction::Read,
            subject: Some(1),
            object_type: ObjectType::post(),
            object_id: id,
        }
    }

    #[test]
    fn test_hit_and_miss_accounting() {
        let cache = AccessCache::new();
        assert!(cache.get(&access_key(1)).is_none());

        cache.put(access_key(1), CachedValue::Access(true));
        assert_eq!(cache.get(&access_key(1)), Some(CachedValue::Access(true)));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!(stats.hit_rate > 0.0);
    }

    #[test]
    fn test_invalidate_is_scoped_to_op() {
        let cache = AccessCache::new();
        cache.put(access_key(1), CachedValue::Access(true));
        cache.put(
            CacheKey::ExcludedTerms {
                action: AccessAction::Read,
                subject: Some(1),
            },
            CachedValue::Objects(vec![3]),
        );

        cache.invalidate(CacheOp::ObjectAccess);

        assert!(cache.get(&access_key(1)).is_none());
        assert!(cache
            .get(&CacheKey::ExcludedTerms {
                action: AccessAction::Read,
                subject: Some(1),
            })
            .is_some());
    }

    #[test]
    fn test_external_promotion() {
        let store = Arc::new(MemoryCacheStore::new());
        let first = AccessCache::with_store(Arc::clone(&store) as Arc<dyn CacheStore>);
        first.put(access_key(9), CachedValue::Access(false));

        // A fresh process-local cache finds the entry in the store
        let second = AccessCache::with_store(store as Arc<dyn CacheStore>);
        assert_eq!(second.get(&access_key(9)), Some(CachedValue::Access(false)));
        assert_eq!(second.stats().hits, 1);
    }

    #[test]
    fn test_render_is_stable() {
        assert_eq!(
            access_key(42).render(),
            "object_access:read:u1:post:42"
        );
        assert_eq!(
            CacheKey::GroupsForObject {
                object_type: ObjectType::term(),
                view: GroupView::Filtered(None),
                object_id: 7,
            }
            .render(),
            "groups_for_object:term:filtered:anon:7"
        );
    }
}
