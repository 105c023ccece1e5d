/*!
 * Engine Configuration
 * Read-only tunables supplied by the host platform
 */

use serde::{Deserialize, Serialize};
use smartstring::alias::String as SmartString;

/// Behavioral switches for membership resolution and access decisions.
///
/// The host platform owns these values; the engine only reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Propagate group membership through term trees and post parent
    /// chains. When off, only direct assignments (and role-derived user
    /// membership) count.
    pub lock_recursive: bool,

    /// Authors always keep access to content they wrote, even when a
    /// group they do not belong to gates it.
    pub authors_has_access_to_own: bool,

    /// Restrict authors (users without the group-management capability)
    /// to assigning content only to groups they are themselves members of.
    pub authors_can_add_posts_to_groups: bool,

    /// Role granted unconditional access to everything this engine gates.
    /// Any role ranking at or above it is treated the same.
    pub full_access_role: SmartString,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            lock_recursive: true,
            authors_has_access_to_own: false,
            authors_can_add_posts_to_groups: false,
            full_access_role: "administrator".into(),
        }
    }
}

impl AccessConfig {
    /// Parse from a JSON document; absent fields keep their defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
