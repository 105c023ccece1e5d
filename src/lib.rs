/*!
 * Content Gate
 * Group-membership resolution and access-decision engine for content
 * management platforms
 *
 * The engine decides, per subject and per object, whether a read or a
 * write may proceed, and computes the id sets listing queries must
 * exclude. Objects belong to named user groups directly or through
 * type-specific relations (term trees, post parent chains, role
 * membership); decisions fold group membership, IP ranges, and
 * author/administrative overrides into one cached boolean.
 *
 * ## Usage
 * ```ignore
 * use content_gate::{
 *     AccessAction, AccessConfig, AccessContext, AccessHandler, ObjectType, Subject, UserGroup,
 * };
 *
 * let ctx = AccessContext::new(store, content, AccessConfig::default());
 * let handler = AccessHandler::new(ctx.clone());
 *
 * let group = UserGroup::new(ctx, "editorial");
 * group.add_object(&ObjectType::term(), 5)?;
 * handler.add_user_group(group)?;
 *
 * let subject = Subject::user(7).with_role("author");
 * if handler.check_object_access(&subject, AccessAction::Read, &ObjectType::post(), 42)? {
 *     // Render the post
 * }
 * ```
 */

pub mod access;
pub mod cache;
pub mod config;
pub mod context;
pub mod core;
pub mod groups;
pub mod providers;
pub mod registry;

// Re-exports
pub use access::{AccessDecision, AccessHandler, GroupMembership, ObjectAccessCheck};
pub use cache::{AccessCache, CacheStats};
pub use config::AccessConfig;
pub use context::AccessContext;
pub use crate::core::{
    AccessAction, AccessError, AccessPolicy, AccessResult, GroupId, ObjectId, ObjectType,
    RegistryError, StorageError, Subject, UserId, MANAGE_USER_GROUPS,
};
pub use groups::{AncestorRef, AssignedObject, Membership, ObjectScope, UserGroup};
pub use providers::{
    CacheStore, ContentProvider, GroupRecord, GroupStore, MemoryCacheStore, MemoryContentProvider,
    MemoryGroupStore, Post, Role, Taxonomy, Term, User,
};
pub use registry::{ObjectTypeRegistry, PluggableObject};
