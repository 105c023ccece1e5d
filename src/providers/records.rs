/*!
 * Content Records
 * Data carried across the provider seams
 */

use crate::core::{AccessPolicy, GroupId, ObjectId, UserId};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use smartstring::alias::String as SmartString;

/// Persisted shape of a user group, one row of the groups table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: Option<GroupId>,
    pub name: String,
    pub description: String,
    pub read_access: AccessPolicy,
    pub write_access: AccessPolicy,
    /// Ordered range entries, `"a.b.c.d"` or `"a.b.c.d-e.f.g.h"`
    pub ip_ranges: Vec<String>,
}

impl GroupRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            read_access: AccessPolicy::Group,
            write_access: AccessPolicy::Group,
            ip_ranges: Vec::new(),
        }
    }
}

/// A postable content object (post, page, attachment, custom type)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: ObjectId,
    pub post_type: SmartString,
    pub parent: Option<ObjectId>,
    pub author: Option<UserId>,
    pub title: SmartString,
}

/// A taxonomy term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub id: ObjectId,
    pub taxonomy: SmartString,
    pub parent: Option<ObjectId>,
    pub name: SmartString,
}

/// A platform user with their roles and capabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub login: SmartString,
    /// Role names, in the platform's order; the first role matching a
    /// group's role set wins during membership resolution
    pub roles: Vec<SmartString>,
    pub capabilities: AHashSet<String>,
}

/// A role. Roles are addressed by numeric id in the assignment table;
/// the name is what user records and configuration refer to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: ObjectId,
    pub name: SmartString,
}

/// A registered taxonomy. Whether hiding applies to empty terms depends
/// on the hierarchy flag, not on the taxonomy's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub name: SmartString,
    pub hierarchical: bool,
}
