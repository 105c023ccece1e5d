/*!
 * Core Types
 * Identifiers, object types, and subjects shared across the engine
 */

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use smartstring::alias::String as SmartString;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Group identifier, assigned by storage on first save
pub type GroupId = u64;

/// Content object identifier (post, term, user, role, pluggable)
pub type ObjectId = u64;

/// User identifier
pub type UserId = u64;

/// Capability required to administer user groups
pub const MANAGE_USER_GROUPS: &str = "manage_user_groups";

/// A named category of content the engine can gate.
///
/// The set of valid names is open: built-in types, CMS-registered post
/// types and pluggable types all flow through here. Names are normalized
/// on construction (trimmed, lowercased, delimiter-safe) so they can be
/// used directly as cache key components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectType(SmartString);

impl ObjectType {
    pub fn new(name: impl AsRef<str>) -> Self {
        let normalized: SmartString = name
            .as_ref()
            .trim()
            .chars()
            .map(|c| match c.to_ascii_lowercase() {
                c @ ('a'..='z' | '0'..='9' | '_' | '-') => c,
                _ => '_',
            })
            .collect();
        Self(normalized)
    }

    /// Role object type (terminal, never recurses)
    pub fn role() -> Self {
        Self("role".into())
    }

    /// User object type
    pub fn user() -> Self {
        Self("user".into())
    }

    /// Taxonomy term object type
    pub fn term() -> Self {
        Self("term".into())
    }

    /// Hierarchical taxonomy alias for terms
    pub fn category() -> Self {
        Self("category".into())
    }

    pub fn post() -> Self {
        Self("post".into())
    }

    pub fn page() -> Self {
        Self("page".into())
    }

    pub fn attachment() -> Self {
        Self("attachment".into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// The kind of access being evaluated: reads gate public display,
/// writes gate authoring/editing contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessAction {
    Read,
    Write,
}

impl AccessAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessAction::Read => "read",
            AccessAction::Write => "write",
        }
    }
}

/// Per-group access policy: open to everyone, or gated by membership
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessPolicy {
    All,
    #[default]
    Group,
}

impl FromStr for AccessPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(AccessPolicy::All),
            "group" => Ok(AccessPolicy::Group),
            other => Err(format!("unknown access policy '{other}'")),
        }
    }
}

impl fmt::Display for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AccessPolicy::All => "all",
            AccessPolicy::Group => "group",
        })
    }
}

/// The evaluating subject of an access check: the current user (if any),
/// their roles and capabilities, and the request IP.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subject {
    pub user_id: Option<UserId>,
    pub roles: Vec<SmartString>,
    pub capabilities: AHashSet<String>,
    pub ip: Option<Ipv4Addr>,
    /// Network super-admin flag, granted outside the role system
    pub super_admin: bool,
}

impl Subject {
    /// Visitor with no account
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn with_role(mut self, role: impl AsRef<str>) -> Self {
        self.roles.push(role.as_ref().into());
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    pub fn with_ip(mut self, ip: Ipv4Addr) -> Self {
        self.ip = Some(ip);
        self
    }

    pub fn with_super_admin(mut self) -> Self {
        self.super_admin = true;
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_type_normalization() {
        assert_eq!(ObjectType::new("  Post ").as_str(), "post");
        assert_eq!(ObjectType::new("my:type").as_str(), "my_type");
        assert_eq!(
            ObjectType::new("Custom-Type_2"),
            ObjectType::new("custom-type_2")
        );
    }

    #[test]
    fn test_access_policy_parse() {
        assert_eq!("all".parse::<AccessPolicy>().unwrap(), AccessPolicy::All);
        assert_eq!(" Group ".parse::<AccessPolicy>().unwrap(), AccessPolicy::Group);
        assert!("open".parse::<AccessPolicy>().is_err());
    }

    #[test]
    fn test_subject_builder() {
        let subject = Subject::user(7)
            .with_role("editor")
            .with_capability("edit_posts")
            .with_ip(Ipv4Addr::new(10, 0, 0, 1));
        assert!(subject.has_role("editor"));
        assert!(subject.has_capability("edit_posts"));
        assert!(!subject.is_anonymous());
        assert!(Subject::anonymous().is_anonymous());
    }
}
