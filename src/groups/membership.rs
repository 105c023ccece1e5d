/*!
 * Membership Results
 * Immutable per-lookup membership records
 *
 * Every (group, object) lookup yields its own value, so visiting the
 * same ancestor through two paths can never alias state.
 */

use crate::core::{ObjectId, ObjectType};
use serde::{Deserialize, Serialize};
use smartstring::alias::String as SmartString;

/// How (and whether) an object belongs to a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "membership", content = "detail")]
pub enum Membership {
    /// Not a member
    None,
    /// Explicitly assigned
    Direct,
    /// Included through a type-specific relation; the chain lists the
    /// objects that caused the inclusion, nearest first
    Recursive { chain: Vec<AncestorRef> },
}

impl Membership {
    pub fn recursive(chain: Vec<AncestorRef>) -> Self {
        Membership::Recursive { chain }
    }

    /// Recursive membership through a single cause
    pub fn via(ancestor: AncestorRef) -> Self {
        Membership::Recursive {
            chain: vec![ancestor],
        }
    }

    pub fn is_member(&self) -> bool {
        !matches!(self, Membership::None)
    }

    pub fn is_recursive(&self) -> bool {
        matches!(self, Membership::Recursive { .. })
    }

    /// The inclusion chain; empty unless recursive
    pub fn chain(&self) -> &[AncestorRef] {
        match self {
            Membership::Recursive { chain } => chain,
            _ => &[],
        }
    }
}

/// One link in a recursive-inclusion chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestorRef {
    pub object_type: ObjectType,
    pub object_id: ObjectId,
    /// Display name, where the provider knows one (term names, role
    /// names); surfaced by admin UIs as "locked by X"
    pub name: Option<SmartString>,
}

impl AncestorRef {
    pub fn new(object_type: ObjectType, object_id: ObjectId) -> Self {
        Self {
            object_type,
            object_id,
            name: None,
        }
    }

    pub fn named(object_type: ObjectType, object_id: ObjectId, name: impl AsRef<str>) -> Self {
        Self {
            object_type,
            object_id,
            name: Some(name.as_ref().into()),
        }
    }
}

/// Which assignment table a query addresses: persisted direct
/// assignments only, or the recursively-expanded view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectScope {
    Real,
    Full,
}

/// One object row in a group's real or full table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedObject {
    pub id: ObjectId,
    pub membership: Membership,
}

impl AssignedObject {
    pub fn direct(id: ObjectId) -> Self {
        Self {
            id,
            membership: Membership::Direct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_predicates() {
        assert!(!Membership::None.is_member());
        assert!(Membership::Direct.is_member());

        let recursive = Membership::via(AncestorRef::new(ObjectType::term(), 5));
        assert!(recursive.is_member());
        assert!(recursive.is_recursive());
        assert_eq!(recursive.chain().len(), 1);
        assert!(Membership::Direct.chain().is_empty());
    }
}
