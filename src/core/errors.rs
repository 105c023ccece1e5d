/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use crate::core::types::GroupId;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for access-engine operations
pub type AccessResult<T> = Result<T, AccessError>;

/// Result type for group-store operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage-layer errors. These propagate untouched: the engine defines
/// no retry policy and no partial-failure recovery.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum StorageError {
    #[error("Group {0} not found")]
    #[diagnostic(
        code(storage::group_not_found),
        help("The group may have been deleted by a concurrent administrator.")
    )]
    GroupNotFound(GroupId),

    #[error("Storage backend failure: {0}")]
    #[diagnostic(
        code(storage::backend),
        help("Check database connectivity. The current access computation was aborted.")
    )]
    Backend(String),
}

/// Access-engine errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum AccessError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Storage(#[from] StorageError),

    #[error("Group has not been saved yet")]
    #[diagnostic(
        code(access::unsaved_group),
        help("Call save() before operations that require a persisted group id.")
    )]
    UnsavedGroup,
}

/// Object-type registry errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum RegistryError {
    #[error("Pluggable object type name is empty")]
    #[diagnostic(
        code(registry::blank_name),
        help("Pluggable objects must declare a unique, non-empty type name.")
    )]
    BlankName,

    #[error("Object type '{0}' is already registered")]
    #[diagnostic(
        code(registry::duplicate),
        help("Each pluggable object type may be registered once; built-in names are reserved.")
    )]
    Duplicate(String),
}
