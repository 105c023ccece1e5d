/*!
 * Core Module
 * Shared types and error handling
 */

pub mod errors;
pub mod types;

pub use errors::{AccessError, AccessResult, RegistryError, StorageError, StorageResult};
pub use types::{
    AccessAction, AccessPolicy, GroupId, ObjectId, ObjectType, Subject, UserId,
    MANAGE_USER_GROUPS,
};
