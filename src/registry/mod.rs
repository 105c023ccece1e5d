/*!
 * Object Type Registry
 * The universe of object-type identifiers the engine will gate
 */

mod pluggable;

pub use pluggable::PluggableObject;

use crate::core::{ObjectType, RegistryError};
use crate::providers::ContentProvider;
use ahash::AHashSet;
use dashmap::DashMap;
use log::debug;
use parking_lot::RwLock;
use std::sync::Arc;

/// Defines and validates object-type identifiers: built-in types, the
/// platform's registered post types, and pluggable types contributed at
/// runtime. Type sets are computed lazily and cached until an
/// invalidation trigger fires (post-type announcement, pluggable
/// registration).
pub struct ObjectTypeRegistry {
    content: Arc<dyn ContentProvider>,
    pluggables: DashMap<ObjectType, Arc<dyn PluggableObject>>,
    postable: RwLock<Option<Arc<AHashSet<ObjectType>>>>,
    term_kinds: RwLock<Option<Arc<AHashSet<ObjectType>>>>,
    all: RwLock<Option<Arc<AHashSet<ObjectType>>>>,
    valid_memo: DashMap<ObjectType, bool>,
}

impl ObjectTypeRegistry {
    pub fn new(content: Arc<dyn ContentProvider>) -> Self {
        Self {
            content,
            pluggables: DashMap::new(),
            postable: RwLock::new(None),
            term_kinds: RwLock::new(None),
            all: RwLock::new(None),
            valid_memo: DashMap::new(),
        }
    }

    /// Built-in non-postable types: role, user, term, category
    pub fn builtin_types(&self) -> AHashSet<ObjectType> {
        [
            ObjectType::role(),
            ObjectType::user(),
            ObjectType::term(),
            ObjectType::category(),
        ]
        .into_iter()
        .collect()
    }

    /// Post, page, attachment, plus every publicly-queryable post type
    /// the platform has registered
    pub fn postable_types(&self) -> Arc<AHashSet<ObjectType>> {
        if let Some(types) = self.postable.read().as_ref() {
            return Arc::clone(types);
        }
        let mut types: AHashSet<ObjectType> = [
            ObjectType::post(),
            ObjectType::page(),
            ObjectType::attachment(),
        ]
        .into_iter()
        .collect();
        types.extend(self.content.registered_post_types());

        let types = Arc::new(types);
        *self.postable.write() = Some(Arc::clone(&types));
        types
    }

    /// Term, category, and every taxonomy the platform has registered.
    /// All of them share taxonomy recursion semantics; whether a
    /// taxonomy hides empty terms rides on its hierarchy flag, not on
    /// its name.
    pub fn term_types(&self) -> Arc<AHashSet<ObjectType>> {
        if let Some(types) = self.term_kinds.read().as_ref() {
            return Arc::clone(types);
        }
        let mut types: AHashSet<ObjectType> = [ObjectType::term(), ObjectType::category()]
            .into_iter()
            .collect();
        types.extend(
            self.content
                .taxonomies()
                .into_iter()
                .map(|taxonomy| ObjectType::new(&taxonomy.name)),
        );

        let types = Arc::new(types);
        *self.term_kinds.write() = Some(Arc::clone(&types));
        types
    }

    /// Built-ins ∪ taxonomies ∪ postable ∪ pluggable names
    pub fn all_object_types(&self) -> Arc<AHashSet<ObjectType>> {
        if let Some(types) = self.all.read().as_ref() {
            return Arc::clone(types);
        }
        let mut types = self.builtin_types();
        types.extend(self.term_types().iter().cloned());
        types.extend(self.postable_types().iter().cloned());
        types.extend(self.pluggables.iter().map(|entry| entry.key().clone()));

        let types = Arc::new(types);
        *self.all.write() = Some(Arc::clone(&types));
        types
    }

    pub fn is_postable(&self, object_type: &ObjectType) -> bool {
        self.postable_types().contains(object_type)
    }

    pub fn is_term_type(&self, object_type: &ObjectType) -> bool {
        self.term_types().contains(object_type)
    }

    pub fn is_valid(&self, object_type: &ObjectType) -> bool {
        if let Some(valid) = self.valid_memo.get(object_type) {
            return *valid;
        }
        let valid = self.all_object_types().contains(object_type);
        self.valid_memo.insert(object_type.clone(), valid);
        valid
    }

    /// Register an externally-owned object type. Blank and duplicate
    /// names are rejected; built-in and postable names are reserved.
    pub fn register_pluggable(
        &self,
        object: Arc<dyn PluggableObject>,
    ) -> Result<(), RegistryError> {
        let name = object.name().trim();
        if name.is_empty() {
            return Err(RegistryError::BlankName);
        }
        let object_type = ObjectType::new(name);
        if self.all_object_types().contains(&object_type) {
            return Err(RegistryError::Duplicate(object_type.to_string()));
        }

        debug!(
            "Registering pluggable object type '{}' (reference '{}')",
            object_type,
            object.reference()
        );
        self.pluggables.insert(object_type, object);
        self.invalidate();
        Ok(())
    }

    pub fn pluggable(&self, object_type: &ObjectType) -> Option<Arc<dyn PluggableObject>> {
        self.pluggables
            .get(object_type)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn pluggables(&self) -> Vec<Arc<dyn PluggableObject>> {
        self.pluggables
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// The platform registered a new post type at runtime; recompute the
    /// type sets on next query.
    pub fn announce_post_type(&self) {
        debug!("Post type announced, invalidating object-type caches");
        self.invalidate();
    }

    /// Same trigger for runtime-registered taxonomies.
    pub fn announce_taxonomy(&self) {
        debug!("Taxonomy announced, invalidating object-type caches");
        self.invalidate();
    }

    fn invalidate(&self) {
        *self.postable.write() = None;
        *self.term_kinds.write() = None;
        *self.all.write() = None;
        self.valid_memo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::{AssignedObject, Membership, UserGroup};
    use crate::providers::MemoryContentProvider;
    use crate::ObjectId;

    struct EventObject;

    impl PluggableObject for EventObject {
        fn name(&self) -> &str {
            "event"
        }

        fn reference(&self) -> &str {
            "events-plugin"
        }

        fn resolve_single(&self, _object_id: ObjectId, _group: &UserGroup) -> Membership {
            Membership::None
        }

        fn resolve_batch(
            &self,
            real: &[AssignedObject],
            _group: &UserGroup,
        ) -> Vec<AssignedObject> {
            real.to_vec()
        }
    }

    struct BlankObject;

    impl PluggableObject for BlankObject {
        fn name(&self) -> &str {
            "  "
        }

        fn reference(&self) -> &str {
            "broken"
        }

        fn resolve_single(&self, _object_id: ObjectId, _group: &UserGroup) -> Membership {
            Membership::None
        }

        fn resolve_batch(
            &self,
            real: &[AssignedObject],
            _group: &UserGroup,
        ) -> Vec<AssignedObject> {
            real.to_vec()
        }
    }

    fn registry() -> ObjectTypeRegistry {
        ObjectTypeRegistry::new(Arc::new(MemoryContentProvider::new()))
    }

    #[test]
    fn test_builtin_and_postable_validity() {
        let registry = registry();
        assert!(registry.is_valid(&ObjectType::role()));
        assert!(registry.is_valid(&ObjectType::category()));
        assert!(registry.is_valid(&ObjectType::attachment()));
        assert!(registry.is_postable(&ObjectType::page()));
        assert!(!registry.is_postable(&ObjectType::role()));
        assert!(!registry.is_valid(&ObjectType::new("definitely-unregistered-type")));
    }

    #[test]
    fn test_register_pluggable() {
        let registry = registry();
        let event = ObjectType::new("event");
        assert!(!registry.is_valid(&event));

        registry.register_pluggable(Arc::new(EventObject)).unwrap();

        assert!(registry.is_valid(&event));
        assert!(registry.pluggable(&event).is_some());
        assert_eq!(
            registry.register_pluggable(Arc::new(EventObject)),
            Err(RegistryError::Duplicate("event".into()))
        );
    }

    #[test]
    fn test_register_blank_name_rejected() {
        let registry = registry();
        assert_eq!(
            registry.register_pluggable(Arc::new(BlankObject)),
            Err(RegistryError::BlankName)
        );
    }

    #[test]
    fn test_registered_taxonomy_is_term_kind() {
        let content = Arc::new(MemoryContentProvider::new());
        let registry = ObjectTypeRegistry::new(Arc::clone(&content) as Arc<dyn ContentProvider>);

        let tags = ObjectType::new("post_tag");
        assert!(!registry.is_valid(&tags));

        content.register_taxonomy(crate::providers::Taxonomy {
            name: "post_tag".into(),
            hierarchical: false,
        });
        registry.announce_taxonomy();

        assert!(registry.is_valid(&tags));
        assert!(registry.is_term_type(&tags));
        assert!(!registry.is_postable(&tags));
    }

    #[test]
    fn test_announced_post_type_invalidates() {
        let content = Arc::new(MemoryContentProvider::new());
        let registry = ObjectTypeRegistry::new(Arc::clone(&content) as Arc<dyn ContentProvider>);

        let events = ObjectType::new("events");
        assert!(!registry.is_valid(&events));

        content.register_post_type(events.clone());
        // Stale until the announcement lands
        assert!(!registry.is_valid(&events));

        registry.announce_post_type();
        assert!(registry.is_valid(&events));
        assert!(registry.is_postable(&events));
    }
}
