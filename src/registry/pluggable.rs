/*!
 * Pluggable Objects
 * Membership resolution contributed by external collaborators
 */

use crate::core::ObjectId;
use crate::groups::{AssignedObject, Membership, UserGroup};

/// An externally-owned object type that plugs into membership
/// resolution without the engine knowing its storage details.
pub trait PluggableObject: Send + Sync {
    /// Unique type name; normalized and validated at registration
    fn name(&self) -> &str;

    /// Handle identifying the owning collaborator, for diagnostics
    fn reference(&self) -> &str;

    /// Resolve recursive membership of one object in a group. The group
    /// is passed for context (its real assignments, its policies).
    fn resolve_single(&self, object_id: ObjectId, group: &UserGroup) -> Membership;

    /// Expand a group's directly-assigned objects of this type into the
    /// full membership table.
    fn resolve_batch(&self, real: &[AssignedObject], group: &UserGroup) -> Vec<AssignedObject>;
}
