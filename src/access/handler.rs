/*!
 * Access Handler
 * The single source of truth for access decisions
 *
 * Folds group membership, IP ranges, and author/administrative override
 * rules into one boolean per (subject, action, object), with caching in
 * front of every expensive path.
 */

use super::roles;
use crate::cache::{CacheKey, CacheOp, CacheStats, CachedValue, GroupView};
use crate::context::AccessContext;
use crate::core::{
    AccessAction, AccessPolicy, AccessResult, GroupId, ObjectId, ObjectType, RegistryError,
    Subject, MANAGE_USER_GROUPS,
};
use crate::groups::{ip_range, Membership, UserGroup};
use crate::registry::PluggableObject;
use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// One group connected to an object, and how the connection holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group_id: GroupId,
    pub membership: Membership,
}

/// An access decision with its reasoning, in the shape presentation
/// layers can log or display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: String,
    /// Whether the boolean came from the decision cache
    #[serde(default)]
    pub cached: bool,
}

impl AccessDecision {
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
            cached: false,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            cached: false,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Boolean access checking interface
pub trait ObjectAccessCheck: Send + Sync {
    fn check(
        &self,
        subject: &Subject,
        action: AccessAction,
        object_type: &ObjectType,
        object_id: ObjectId,
    ) -> AccessResult<bool>;

    /// Check several objects under one action
    fn check_batch(
        &self,
        subject: &Subject,
        action: AccessAction,
        objects: &[(ObjectType, ObjectId)],
    ) -> AccessResult<Vec<bool>> {
        objects
            .iter()
            .map(|(object_type, object_id)| self.check(subject, action, object_type, *object_id))
            .collect()
    }
}

/// Central access orchestrator. Loads the persisted groups lazily, once,
/// and answers every "may this subject touch that object" question.
pub struct AccessHandler {
    ctx: Arc<AccessContext>,
    groups: RwLock<Option<BTreeMap<GroupId, Arc<UserGroup>>>>,
}

impl AccessHandler {
    pub fn new(ctx: Arc<AccessContext>) -> Self {
        Self {
            ctx,
            groups: RwLock::new(None),
        }
    }

    pub fn context(&self) -> &Arc<AccessContext> {
        &self.ctx
    }

    /// All persisted groups, ascending by id. Loaded from storage once;
    /// group add/delete resets the view.
    pub fn user_groups(&self) -> AccessResult<Vec<Arc<UserGroup>>> {
        Ok(self.loaded_groups()?.into_values().collect())
    }

    pub fn user_group(&self, id: GroupId) -> AccessResult<Option<Arc<UserGroup>>> {
        Ok(self.loaded_groups()?.get(&id).cloned())
    }

    /// The author-filtered group view: when authors are restricted to
    /// their own groups and the subject cannot manage groups, only
    /// groups the subject belongs to remain.
    pub fn filtered_groups(&self, subject: &Subject) -> AccessResult<Vec<Arc<UserGroup>>> {
        let groups = self.user_groups()?;
        if !self.ctx.config().authors_can_add_posts_to_groups
            || self.check_user_access(subject, Some(MANAGE_USER_GROUPS))
        {
            return Ok(groups);
        }

        let Some(user_id) = subject.user_id else {
            return Ok(Vec::new());
        };
        let mut filtered = Vec::new();
        for group in groups {
            if group.user_membership(user_id)?.is_member() {
                filtered.push(group);
            }
        }
        Ok(filtered)
    }

    /// Persist a group and track it. Returns the shared handle; further
    /// mutations must go through it (or through [`Self::user_group`]) so
    /// the handler observes them.
    pub fn add_user_group(&self, group: UserGroup) -> AccessResult<Arc<UserGroup>> {
        let id = group.save(true)?;
        let group = Arc::new(group);
        let mut map = self.loaded_groups()?;
        map.insert(id, Arc::clone(&group));
        *self.groups.write() = Some(map);
        self.ctx.invalidate_decisions();
        Ok(group)
    }

    /// Delete a group and every assignment row it owns. Objects gated
    /// only by this group fall back to "no groups", i.e. open access.
    pub fn delete_user_group(&self, id: GroupId) -> AccessResult<bool> {
        let Some(group) = self.user_group(id)? else {
            return Ok(false);
        };
        let deleted = group.delete()?;
        if deleted {
            if let Some(map) = self.groups.write().as_mut() {
                map.remove(&id);
            }
            self.ctx.invalidate_decisions();
        }
        Ok(deleted)
    }

    /// The groups an object belongs to, directly or recursively.
    /// Membership of `user` objects is never author-filtered: a user
    /// must not be able to hide their own access.
    pub fn groups_for_object(
        &self,
        object_type: &ObjectType,
        object_id: ObjectId,
        filter: bool,
        subject: &Subject,
    ) -> AccessResult<Vec<GroupMembership>> {
        if !self.ctx.registry().is_valid(object_type) {
            return Ok(Vec::new());
        }

        let filter = filter && *object_type != ObjectType::user();
        let view = if filter {
            GroupView::Filtered(subject.user_id)
        } else {
            GroupView::All
        };
        let key = CacheKey::GroupsForObject {
            object_type: object_type.clone(),
            view,
            object_id,
        };
        if let Some(CachedValue::Groups(entries)) = self.ctx.cache().get(&key) {
            return Ok(entries
                .into_iter()
                .map(|(group_id, membership)| GroupMembership {
                    group_id,
                    membership,
                })
                .collect());
        }

        let groups = if filter {
            self.filtered_groups(subject)?
        } else {
            self.user_groups()?
        };
        let mut memberships = Vec::new();
        for group in groups {
            let Some(group_id) = group.id() else { continue };
            let membership = group.object_membership(object_type, object_id)?;
            if membership.is_member() {
                memberships.push(GroupMembership {
                    group_id,
                    membership,
                });
            }
        }

        self.ctx.cache().put(
            key,
            CachedValue::Groups(
                memberships
                    .iter()
                    .map(|gm| (gm.group_id, gm.membership.clone()))
                    .collect(),
            ),
        );
        Ok(memberships)
    }

    /// Cached boolean access check. Unknown object types are not
    /// access-controlled: fail open.
    pub fn check_object_access(
        &self,
        subject: &Subject,
        action: AccessAction,
        object_type: &ObjectType,
        object_id: ObjectId,
    ) -> AccessResult<bool> {
        if !self.ctx.registry().is_valid(object_type) {
            return Ok(true);
        }

        let key = CacheKey::ObjectAccess {
            action,
            subject: subject.user_id,
            object_type: object_type.clone(),
            object_id,
        };
        if let Some(CachedValue::Access(allowed)) = self.ctx.cache().get(&key) {
            return Ok(allowed);
        }

        let decision = self.decide(subject, action, object_type, object_id)?;
        debug!(
            "Access {} for {}:{} ({}): {}",
            if decision.allowed { "granted" } else { "denied" },
            object_type,
            object_id,
            action.as_str(),
            decision.reason
        );
        self.ctx
            .cache()
            .put(key, CachedValue::Access(decision.allowed));
        Ok(decision.allowed)
    }

    /// Uncached decision with its reasoning; the diagnostic face of
    /// [`Self::check_object_access`].
    pub fn decide(
        &self,
        subject: &Subject,
        action: AccessAction,
        object_type: &ObjectType,
        object_id: ObjectId,
    ) -> AccessResult<AccessDecision> {
        if !self.ctx.registry().is_valid(object_type) {
            return Ok(AccessDecision::allow(format!(
                "object type '{object_type}' is not access-controlled"
            )));
        }

        let memberships = self.groups_for_object(object_type, object_id, false, subject)?;
        if memberships.is_empty() {
            return Ok(AccessDecision::allow("object has no assigned groups"));
        }
        if self.check_user_access(subject, Some(MANAGE_USER_GROUPS)) {
            return Ok(AccessDecision::allow("subject may manage user groups"));
        }
        if self.authored_by(subject, object_type, object_id) {
            return Ok(AccessDecision::allow("author exemption"));
        }

        // Walk the object's groups: an IP or membership match grants
        // outright; groups whose applicable policy is open to everyone
        // are pruned from the working list. An object left gated only by
        // open groups is accessible.
        let mut remaining = 0usize;
        for gm in &memberships {
            let Some(group) = self.user_group(gm.group_id)? else {
                continue;
            };
            if let Some(ip) = subject.ip {
                if group.matches_ip(ip) {
                    return Ok(AccessDecision::allow(format!(
                        "ip range match on group '{}'",
                        group.name()
                    )));
                }
            }
            if group.access_policy(action) == AccessPolicy::All {
                continue;
            }
            if let Some(user_id) = subject.user_id {
                if group.user_membership(user_id)?.is_member() {
                    return Ok(AccessDecision::allow(format!(
                        "member of group '{}'",
                        group.name()
                    )));
                }
            }
            remaining += 1;
        }

        if remaining == 0 {
            Ok(AccessDecision::allow(
                "gated only by groups open to everyone",
            ))
        } else {
            Ok(AccessDecision::deny(format!(
                "gated by {remaining} group(s) the subject does not satisfy"
            )))
        }
    }

    /// Role-rank authorization: full-access role (or above), the literal
    /// administrator role, super-admins, or an explicitly held
    /// capability.
    pub fn check_user_access(&self, subject: &Subject, capability: Option<&str>) -> bool {
        let rank = roles::highest_rank(&subject.roles);
        let full_access_rank = roles::role_rank(&self.ctx.config().full_access_role);

        rank >= full_access_rank
            || subject.has_role("administrator")
            || subject.super_admin
            || capability.is_some_and(|capability| subject.has_capability(capability))
    }

    /// True when the address falls inside any of the given ranges;
    /// malformed entries are skipped individually.
    pub fn check_user_ip(ip: Ipv4Addr, ranges: &[String]) -> bool {
        ip_range::ip_matches(ip, ranges)
    }

    /// Drop the object→groups and decision caches. Called whenever any
    /// group's object assignment changes; the persisted group list is
    /// untouched.
    pub fn unset_user_groups_for_object(&self) {
        self.ctx.cache().invalidate(CacheOp::GroupsForObject);
        self.ctx.cache().invalidate(CacheOp::ObjectAccess);
    }

    pub fn register_pluggable(&self, object: Arc<dyn PluggableObject>) -> Result<(), RegistryError> {
        self.ctx.registry().register_pluggable(object)
    }

    pub fn pluggable(&self, object_type: &ObjectType) -> Option<Arc<dyn PluggableObject>> {
        self.ctx.registry().pluggable(object_type)
    }

    pub fn pluggables(&self) -> Vec<Arc<dyn PluggableObject>> {
        self.ctx.registry().pluggables()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.ctx.cache().stats()
    }

    pub(crate) fn authored_by(
        &self,
        subject: &Subject,
        object_type: &ObjectType,
        object_id: ObjectId,
    ) -> bool {
        if !self.ctx.config().authors_has_access_to_own {
            return false;
        }
        let Some(user_id) = subject.user_id else {
            return false;
        };
        if !self.ctx.registry().is_postable(object_type) {
            return false;
        }
        self.ctx
            .content()
            .post(object_id)
            .is_some_and(|post| post.author == Some(user_id))
    }

    fn loaded_groups(&self) -> AccessResult<BTreeMap<GroupId, Arc<UserGroup>>> {
        if let Some(groups) = self.groups.read().as_ref() {
            return Ok(groups.clone());
        }

        let records = self.ctx.store().load_groups()?;
        let mut map = BTreeMap::new();
        for record in records {
            let Some(id) = record.id else { continue };
            map.insert(
                id,
                Arc::new(UserGroup::from_record(Arc::clone(&self.ctx), record)),
            );
        }
        debug!("Loaded {} user group(s)", map.len());
        *self.groups.write() = Some(map.clone());
        Ok(map)
    }
}

impl ObjectAccessCheck for AccessHandler {
    fn check(
        &self,
        subject: &Subject,
        action: AccessAction,
        object_type: &ObjectType,
        object_id: ObjectId,
    ) -> AccessResult<bool> {
        self.check_object_access(subject, action, object_type, object_id)
    }
}
