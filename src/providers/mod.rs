/*!
 * Collaborator Interfaces
 * Seams to the host platform: storage, content lookups, external caching
 */

mod memory;
mod records;

pub use memory::{MemoryCacheStore, MemoryContentProvider, MemoryGroupStore};
pub use records::{GroupRecord, Post, Role, Taxonomy, Term, User};

use crate::core::{GroupId, ObjectId, ObjectType, StorageResult, UserId};

/// Persistence for the two engine-owned tables: the groups table and the
/// group-to-object assignment table. The assignment table carries a
/// composite uniqueness constraint on (object id, object type, group id),
/// so re-inserting an existing assignment is a no-op, not an error.
pub trait GroupStore: Send + Sync {
    /// All persisted groups. Order is not significant; callers sort by id.
    fn load_groups(&self) -> StorageResult<Vec<GroupRecord>>;

    fn load_group(&self, id: GroupId) -> StorageResult<Option<GroupRecord>>;

    /// Insert a new group row and return its assigned id.
    fn insert_group(&self, record: &GroupRecord) -> StorageResult<GroupId>;

    fn update_group(&self, record: &GroupRecord) -> StorageResult<()>;

    /// Delete the group row and every assignment row that references it.
    fn delete_group(&self, id: GroupId) -> StorageResult<()>;

    /// Directly-assigned object ids for one group and object type.
    fn load_assignments(
        &self,
        group: GroupId,
        object_type: &ObjectType,
    ) -> StorageResult<Vec<ObjectId>>;

    /// Upsert one assignment row.
    fn insert_assignment(
        &self,
        group: GroupId,
        object_type: &ObjectType,
        object: ObjectId,
    ) -> StorageResult<()>;

    /// Remove every assignment row of a group, across all object types.
    fn clear_assignments(&self, group: GroupId) -> StorageResult<()>;
}

/// Read-only view of the host platform's content graph. Lookups that miss
/// return `None`/empty: during recursive resolution a missing object ends
/// the chain, it is never an error.
pub trait ContentProvider: Send + Sync {
    fn post(&self, id: ObjectId) -> Option<Post>;

    fn term(&self, id: ObjectId) -> Option<Term>;

    fn user(&self, id: UserId) -> Option<User>;

    fn role(&self, id: ObjectId) -> Option<Role>;

    /// Term ids attached to a post.
    fn post_terms(&self, post: ObjectId) -> Vec<ObjectId>;

    /// Post ids attached to a term, any post type.
    fn posts_with_term(&self, term: ObjectId) -> Vec<ObjectId>;

    /// Immediate child posts.
    fn post_children(&self, post: ObjectId) -> Vec<ObjectId>;

    /// Immediate child terms.
    fn term_children(&self, term: ObjectId) -> Vec<ObjectId>;

    /// All post ids of one post type.
    fn posts_of_type(&self, post_type: &ObjectType) -> Vec<ObjectId>;

    /// Users holding a role, by role name.
    fn users_with_role(&self, role: &str) -> Vec<UserId>;

    /// The page designated as the blog's post index, if any. Substitutes
    /// for the missing parent of top-level blog posts.
    fn page_for_posts(&self) -> Option<ObjectId>;

    /// Publicly-queryable post types registered by the platform, beyond
    /// the built-in post/page/attachment.
    fn registered_post_types(&self) -> Vec<ObjectType>;

    /// Registered taxonomies with their hierarchy flags.
    fn taxonomies(&self) -> Vec<Taxonomy>;
}

/// Optional cross-request cache. Entries are opaque encoded payloads; the
/// engine invalidates synchronously on every write, so implementations
/// need no expiry of their own.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    fn put(&self, key: &str, value: Vec<u8>);

    /// Drop every entry.
    fn flush(&self);
}
