/*!
 * In-Memory Providers
 * Complete provider implementations backed by process memory
 *
 * Used by tests and by embedders that have no database of their own;
 * they honor every contract the traits state, including assignment
 * upsert semantics.
 */

use super::records::{GroupRecord, Post, Role, Taxonomy, Term, User};
use super::{CacheStore, ContentProvider, GroupStore};
use crate::core::{GroupId, ObjectId, ObjectType, StorageError, StorageResult, UserId};
use ahash::{AHashMap, AHashSet};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};

/// Group and assignment storage held in process memory
pub struct MemoryGroupStore {
    groups: DashMap<GroupId, GroupRecord>,
    assignments: DashMap<GroupId, AHashMap<ObjectType, AHashSet<ObjectId>>>,
    next_id: AtomicU64,
}

impl Default for MemoryGroupStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGroupStore {
    pub fn new() -> Self {
        Self {
            groups: DashMap::new(),
            assignments: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Total assignment rows, across all groups and types
    pub fn assignment_rows(&self) -> usize {
        self.assignments
            .iter()
            .map(|entry| entry.value().values().map(|s| s.len()).sum::<usize>())
            .sum()
    }
}

impl GroupStore for MemoryGroupStore {
    fn load_groups(&self) -> StorageResult<Vec<GroupRecord>> {
        Ok(self.groups.iter().map(|entry| entry.value().clone()).collect())
    }

    fn load_group(&self, id: GroupId) -> StorageResult<Option<GroupRecord>> {
        Ok(self.groups.get(&id).map(|entry| entry.value().clone()))
    }

    fn insert_group(&self, record: &GroupRecord) -> StorageResult<GroupId> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut stored = record.clone();
        stored.id = Some(id);
        self.groups.insert(id, stored);
        Ok(id)
    }

    fn update_group(&self, record: &GroupRecord) -> StorageResult<()> {
        let id = record
            .id
            .ok_or_else(|| StorageError::Backend("update without id".into()))?;
        if !self.groups.contains_key(&id) {
            return Err(StorageError::GroupNotFound(id));
        }
        self.groups.insert(id, record.clone());
        Ok(())
    }

    fn delete_group(&self, id: GroupId) -> StorageResult<()> {
        self.groups.remove(&id);
        self.assignments.remove(&id);
        Ok(())
    }

    fn load_assignments(
        &self,
        group: GroupId,
        object_type: &ObjectType,
    ) -> StorageResult<Vec<ObjectId>> {
        Ok(self
            .assignments
            .get(&group)
            .and_then(|types| types.get(object_type).map(|ids| ids.iter().copied().collect()))
            .unwrap_or_default())
    }

    fn insert_assignment(
        &self,
        group: GroupId,
        object_type: &ObjectType,
        object: ObjectId,
    ) -> StorageResult<()> {
        self.assignments
            .entry(group)
            .or_default()
            .entry(object_type.clone())
            .or_default()
            .insert(object);
        Ok(())
    }

    fn clear_assignments(&self, group: GroupId) -> StorageResult<()> {
        self.assignments.remove(&group);
        Ok(())
    }
}

/// Content graph held in process memory
#[derive(Default)]
pub struct MemoryContentProvider {
    posts: DashMap<ObjectId, Post>,
    terms: DashMap<ObjectId, Term>,
    users: DashMap<UserId, User>,
    roles: DashMap<ObjectId, Role>,
    post_term_links: DashMap<ObjectId, Vec<ObjectId>>,
    page_for_posts: Mutex<Option<ObjectId>>,
    extra_post_types: RwLock<Vec<ObjectType>>,
    taxonomy_list: RwLock<Vec<Taxonomy>>,
}

impl MemoryContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_post(&self, post: Post) {
        self.posts.insert(post.id, post);
    }

    pub fn add_term(&self, term: Term) {
        self.terms.insert(term.id, term);
    }

    pub fn add_user(&self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn add_role(&self, role: Role) {
        self.roles.insert(role.id, role);
    }

    /// Attach a term to a post
    pub fn link(&self, post: ObjectId, term: ObjectId) {
        self.post_term_links.entry(post).or_default().push(term);
    }

    pub fn set_page_for_posts(&self, page: Option<ObjectId>) {
        *self.page_for_posts.lock() = page;
    }

    pub fn register_post_type(&self, post_type: ObjectType) {
        self.extra_post_types.write().push(post_type);
    }

    pub fn register_taxonomy(&self, taxonomy: Taxonomy) {
        self.taxonomy_list.write().push(taxonomy);
    }
}

impl ContentProvider for MemoryContentProvider {
    fn post(&self, id: ObjectId) -> Option<Post> {
        self.posts.get(&id).map(|entry| entry.value().clone())
    }

    fn term(&self, id: ObjectId) -> Option<Term> {
        self.terms.get(&id).map(|entry| entry.value().clone())
    }

    fn user(&self, id: UserId) -> Option<User> {
        self.users.get(&id).map(|entry| entry.value().clone())
    }

    fn role(&self, id: ObjectId) -> Option<Role> {
        self.roles.get(&id).map(|entry| entry.value().clone())
    }

    fn post_terms(&self, post: ObjectId) -> Vec<ObjectId> {
        self.post_term_links
            .get(&post)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    fn posts_with_term(&self, term: ObjectId) -> Vec<ObjectId> {
        let mut posts: Vec<ObjectId> = self
            .post_term_links
            .iter()
            .filter(|entry| entry.value().contains(&term))
            .map(|entry| *entry.key())
            .collect();
        posts.sort_unstable();
        posts
    }

    fn post_children(&self, post: ObjectId) -> Vec<ObjectId> {
        let mut children: Vec<ObjectId> = self
            .posts
            .iter()
            .filter(|entry| entry.value().parent == Some(post))
            .map(|entry| *entry.key())
            .collect();
        children.sort_unstable();
        children
    }

    fn term_children(&self, term: ObjectId) -> Vec<ObjectId> {
        let mut children: Vec<ObjectId> = self
            .terms
            .iter()
            .filter(|entry| entry.value().parent == Some(term))
            .map(|entry| *entry.key())
            .collect();
        children.sort_unstable();
        children
    }

    fn posts_of_type(&self, post_type: &ObjectType) -> Vec<ObjectId> {
        let mut posts: Vec<ObjectId> = self
            .posts
            .iter()
            .filter(|entry| entry.value().post_type.as_str() == post_type.as_str())
            .map(|entry| *entry.key())
            .collect();
        posts.sort_unstable();
        posts
    }

    fn users_with_role(&self, role: &str) -> Vec<UserId> {
        let mut users: Vec<UserId> = self
            .users
            .iter()
            .filter(|entry| entry.value().roles.iter().any(|r| r == role))
            .map(|entry| *entry.key())
            .collect();
        users.sort_unstable();
        users
    }

    fn page_for_posts(&self) -> Option<ObjectId> {
        *self.page_for_posts.lock()
    }

    fn registered_post_types(&self) -> Vec<ObjectType> {
        self.extra_post_types.read().clone()
    }

    fn taxonomies(&self) -> Vec<Taxonomy> {
        self.taxonomy_list.read().clone()
    }
}

/// Cross-request cache held in process memory
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn put(&self, key: &str, value: Vec<u8>) {
        self.entries.insert(key.to_string(), value);
    }

    fn flush(&self) {
        self.entries.clear();
    }
}
