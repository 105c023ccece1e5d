/*!
 * Exclusion Sets
 * Bulk id sets that listing queries must filter out
 *
 * The contract: an id is excluded iff it is reachable only through
 * groups that deny the subject the given access type, and is not
 * exempted by a satisfying group or by authorship. Hierarchy expansion
 * rides on the groups' full tables.
 */

use super::handler::AccessHandler;
use crate::cache::{CacheKey, CachedValue};
use crate::core::{AccessAction, AccessPolicy, AccessResult, ObjectId, Subject, MANAGE_USER_GROUPS};
use crate::groups::{ObjectScope, UserGroup};
use ahash::AHashSet;

impl AccessHandler {
    /// Term ids the subject must not see in listings, ascending.
    /// Managers see everything.
    pub fn excluded_terms(
        &self,
        subject: &Subject,
        action: AccessAction,
    ) -> AccessResult<Vec<ObjectId>> {
        if self.check_user_access(subject, Some(MANAGE_USER_GROUPS)) {
            return Ok(Vec::new());
        }

        let key = CacheKey::ExcludedTerms {
            action,
            subject: subject.user_id,
        };
        if let Some(CachedValue::Objects(ids)) = self.context().cache().get(&key) {
            return Ok(ids);
        }

        let mut denying = AHashSet::new();
        let mut granting = AHashSet::new();
        for group in self.user_groups()? {
            let exempt = group.access_policy(action) == AccessPolicy::All
                || self.subject_satisfies(subject, &group)?;
            for term_kind in self.context().registry().term_types().iter() {
                for object in group.objects_from_type(term_kind, ObjectScope::Full)? {
                    if exempt {
                        granting.insert(object.id);
                    } else {
                        denying.insert(object.id);
                    }
                }
            }
        }

        let mut excluded: Vec<ObjectId> = denying.difference(&granting).copied().collect();
        excluded.sort_unstable();
        self.context()
            .cache()
            .put(key, CachedValue::Objects(excluded.clone()));
        Ok(excluded)
    }

    /// Postable object ids the subject must not see in listings,
    /// ascending, across every postable type. Managers see everything;
    /// authors keep their own content when so configured.
    pub fn excluded_posts(
        &self,
        subject: &Subject,
        action: AccessAction,
    ) -> AccessResult<Vec<ObjectId>> {
        if self.check_user_access(subject, Some(MANAGE_USER_GROUPS)) {
            return Ok(Vec::new());
        }

        let key = CacheKey::ExcludedPosts {
            action,
            subject: subject.user_id,
        };
        if let Some(CachedValue::Objects(ids)) = self.context().cache().get(&key) {
            return Ok(ids);
        }

        let postable_types = self.context().registry().postable_types();
        let mut denying = AHashSet::new();
        let mut granting = AHashSet::new();
        for group in self.user_groups()? {
            let exempt = group.access_policy(action) == AccessPolicy::All
                || self.subject_satisfies(subject, &group)?;
            for post_type in postable_types.iter() {
                for object in group.objects_from_type(post_type, ObjectScope::Full)? {
                    if exempt {
                        granting.insert(object.id);
                    } else {
                        denying.insert(object.id);
                    }
                }
            }
        }

        let mut excluded: Vec<ObjectId> = denying
            .difference(&granting)
            .copied()
            .filter(|&id| !self.authored_exempt(subject, id))
            .collect();
        excluded.sort_unstable();
        self.context()
            .cache()
            .put(key, CachedValue::Objects(excluded.clone()));
        Ok(excluded)
    }

    /// IP match or user membership lifts a group's gate for the subject
    fn subject_satisfies(&self, subject: &Subject, group: &UserGroup) -> AccessResult<bool> {
        if let Some(ip) = subject.ip {
            if group.matches_ip(ip) {
                return Ok(true);
            }
        }
        if let Some(user_id) = subject.user_id {
            return Ok(group.user_membership(user_id)?.is_member());
        }
        Ok(false)
    }

    fn authored_exempt(&self, subject: &Subject, post_id: ObjectId) -> bool {
        if !self.context().config().authors_has_access_to_own {
            return false;
        }
        let Some(user_id) = subject.user_id else {
            return false;
        };
        self.context()
            .content()
            .post(post_id)
            .is_some_and(|post| post.author == Some(user_id))
    }
}
