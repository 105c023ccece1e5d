/*!
 * User Group
 * One access-control group: policy, IP ranges, and object membership
 */

use super::ip_range::ip_matches;
use super::membership::{AncestorRef, AssignedObject, Membership, ObjectScope};
use crate::context::AccessContext;
use crate::core::{AccessAction, AccessPolicy, AccessResult, GroupId, ObjectId, ObjectType, UserId};
use crate::providers::{GroupRecord, Post};
use ahash::{AHashMap, AHashSet};
use dashmap::DashMap;
use log::debug;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Mutable group attributes, persisted as one row of the groups table
struct GroupState {
    id: Option<GroupId>,
    name: String,
    description: String,
    read_access: AccessPolicy,
    write_access: AccessPolicy,
    ip_ranges: Vec<String>,
}

/// A named access-control group.
///
/// Holds the persisted "real" assignment sets per object type and
/// derives, lazily, the recursively-expanded "full" view. Membership
/// lookups are memoized for the lifetime of the instance; any mutation
/// drops the derived state and the engine-wide decision caches.
pub struct UserGroup {
    ctx: Arc<AccessContext>,
    state: RwLock<GroupState>,
    /// Ground truth: directly-assigned ids per object type
    assignments: RwLock<AHashMap<ObjectType, AHashSet<ObjectId>>>,
    /// Object types whose persisted assignments have been pulled
    loaded: Mutex<AHashSet<ObjectType>>,
    full_tables: DashMap<ObjectType, Arc<AHashMap<ObjectId, Membership>>>,
    membership_memo: DashMap<(ObjectType, ObjectId), Membership>,
    /// Recursive-inclusion detail kept for UI display
    recursive_detail: DashMap<(ObjectType, ObjectId), Vec<AncestorRef>>,
}

impl UserGroup {
    /// Fresh, unpersisted group with empty assignment sets
    pub fn new(ctx: Arc<AccessContext>, name: impl Into<String>) -> Self {
        Self::from_record(ctx, GroupRecord::new(name))
    }

    pub fn from_record(ctx: Arc<AccessContext>, record: GroupRecord) -> Self {
        Self {
            ctx,
            state: RwLock::new(GroupState {
                id: record.id,
                name: record.name,
                description: record.description,
                read_access: record.read_access,
                write_access: record.write_access,
                ip_ranges: record.ip_ranges,
            }),
            assignments: RwLock::new(AHashMap::new()),
            loaded: Mutex::new(AHashSet::new()),
            full_tables: DashMap::new(),
            membership_memo: DashMap::new(),
            recursive_detail: DashMap::new(),
        }
    }

    /// Hydrate a persisted group by id
    pub fn load(ctx: Arc<AccessContext>, id: GroupId) -> AccessResult<Option<Self>> {
        let record = ctx.store().load_group(id)?;
        Ok(record.map(|record| Self::from_record(ctx, record)))
    }

    pub fn id(&self) -> Option<GroupId> {
        self.state.read().id
    }

    pub fn name(&self) -> String {
        self.state.read().name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.state.write().name = name.into();
    }

    pub fn description(&self) -> String {
        self.state.read().description.clone()
    }

    pub fn set_description(&self, description: impl Into<String>) {
        self.state.write().description = description.into();
    }

    pub fn read_access(&self) -> AccessPolicy {
        self.state.read().read_access
    }

    pub fn set_read_access(&self, policy: AccessPolicy) {
        self.state.write().read_access = policy;
    }

    pub fn write_access(&self) -> AccessPolicy {
        self.state.read().write_access
    }

    pub fn set_write_access(&self, policy: AccessPolicy) {
        self.state.write().write_access = policy;
    }

    /// The policy gating the given kind of access
    pub fn access_policy(&self, action: AccessAction) -> AccessPolicy {
        match action {
            AccessAction::Read => self.read_access(),
            AccessAction::Write => self.write_access(),
        }
    }

    pub fn ip_ranges(&self) -> Vec<String> {
        self.state.read().ip_ranges.clone()
    }

    pub fn set_ip_ranges(&self, ranges: Vec<String>) {
        self.state.write().ip_ranges = ranges;
    }

    /// True when the address falls inside any of the group's ranges
    pub fn matches_ip(&self, ip: Ipv4Addr) -> bool {
        ip_matches(ip, &self.state.read().ip_ranges)
    }

    /// Snapshot of the persistable attributes
    pub fn record(&self) -> GroupRecord {
        let state = self.state.read();
        GroupRecord {
            id: state.id,
            name: state.name.clone(),
            description: state.description.clone(),
            read_access: state.read_access,
            write_access: state.write_access,
            ip_ranges: state.ip_ranges.clone(),
        }
    }

    /// Assign an object directly. Invalid object types are ignored.
    pub fn add_object(&self, object_type: &ObjectType, object_id: ObjectId) -> AccessResult<()> {
        if !self.ctx.registry().is_valid(object_type) {
            debug!("Ignoring assignment of invalid object type '{object_type}'");
            return Ok(());
        }
        self.ensure_loaded(object_type)?;
        self.assignments
            .write()
            .entry(object_type.clone())
            .or_default()
            .insert(object_id);
        self.invalidate_derived();
        Ok(())
    }

    /// Withdraw a direct assignment. Invalid object types are ignored.
    pub fn remove_object(&self, object_type: &ObjectType, object_id: ObjectId) -> AccessResult<()> {
        if !self.ctx.registry().is_valid(object_type) {
            debug!("Ignoring removal of invalid object type '{object_type}'");
            return Ok(());
        }
        self.ensure_loaded(object_type)?;
        if let Some(set) = self.assignments.write().get_mut(object_type) {
            set.remove(&object_id);
        }
        self.invalidate_derived();
        Ok(())
    }

    /// Directly-assigned ids of one type, ascending
    pub fn assigned_ids(&self, object_type: &ObjectType) -> AccessResult<Vec<ObjectId>> {
        if !self.ctx.registry().is_valid(object_type) {
            return Ok(Vec::new());
        }
        self.ensure_loaded(object_type)?;
        let mut ids: Vec<ObjectId> = self
            .assignments
            .read()
            .get(object_type)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        Ok(ids)
    }

    /// The group's object table for one type: direct assignments only
    /// (`Real`) or the recursively-expanded view (`Full`), ascending by
    /// object id.
    pub fn objects_from_type(
        &self,
        object_type: &ObjectType,
        scope: ObjectScope,
    ) -> AccessResult<Vec<AssignedObject>> {
        if !self.ctx.registry().is_valid(object_type) {
            return Ok(Vec::new());
        }
        let mut objects: Vec<AssignedObject> = match scope {
            ObjectScope::Real => self
                .assigned_ids(object_type)?
                .into_iter()
                .map(AssignedObject::direct)
                .collect(),
            ObjectScope::Full => self
                .full_table(object_type)?
                .iter()
                .map(|(&id, membership)| AssignedObject {
                    id,
                    membership: membership.clone(),
                })
                .collect(),
        };
        objects.sort_unstable_by_key(|object| object.id);
        Ok(objects)
    }

    /// Whether (and how) an object belongs to this group. Memoized per
    /// (type, id) for the lifetime of the instance; invalid types are
    /// never members.
    pub fn object_membership(
        &self,
        object_type: &ObjectType,
        object_id: ObjectId,
    ) -> AccessResult<Membership> {
        if !self.ctx.registry().is_valid(object_type) {
            return Ok(Membership::None);
        }
        let key = (object_type.clone(), object_id);
        if let Some(memoized) = self.membership_memo.get(&key) {
            return Ok(memoized.clone());
        }

        let membership = self.resolve(object_type, object_id)?;
        if membership.is_recursive() {
            self.recursive_detail
                .insert(key.clone(), membership.chain().to_vec());
        }
        self.membership_memo.insert(key, membership.clone());
        Ok(membership)
    }

    /// Boolean convenience over [`Self::object_membership`]
    pub fn object_is_member(
        &self,
        object_type: &ObjectType,
        object_id: ObjectId,
    ) -> AccessResult<bool> {
        Ok(self.object_membership(object_type, object_id)?.is_member())
    }

    /// Membership of a platform user (direct, or through a role)
    pub fn user_membership(&self, user_id: UserId) -> AccessResult<Membership> {
        self.object_membership(&ObjectType::user(), user_id)
    }

    /// Why an object was included recursively, if it was; surfaced by
    /// admin UIs ("locked because parent category X is restricted")
    pub fn recursive_membership(
        &self,
        object_type: &ObjectType,
        object_id: ObjectId,
    ) -> Option<Vec<AncestorRef>> {
        self.recursive_detail
            .get(&(object_type.clone(), object_id))
            .map(|entry| entry.value().clone())
    }

    /// Persist the group and its full assignment set. Inserts assign the
    /// id; updates optionally drop prior assignment rows first, giving
    /// idempotent upsert semantics either way.
    pub fn save(&self, remove_old_assignments: bool) -> AccessResult<GroupId> {
        let record = self.record();
        let id = match record.id {
            None => {
                let id = self.ctx.store().insert_group(&record)?;
                self.state.write().id = Some(id);
                id
            }
            Some(id) => {
                self.ctx.store().update_group(&record)?;
                if remove_old_assignments {
                    // Pull every persisted type before dropping rows so
                    // the re-insert below covers the complete set
                    for object_type in self.ctx.registry().all_object_types().iter() {
                        self.ensure_loaded(object_type)?;
                    }
                    self.ctx.store().clear_assignments(id)?;
                }
                id
            }
        };

        let assignments = self.assignments.read().clone();
        for (object_type, ids) in &assignments {
            let mut sorted: Vec<ObjectId> = ids.iter().copied().collect();
            sorted.sort_unstable();
            for object_id in sorted {
                self.ctx.store().insert_assignment(id, object_type, object_id)?;
            }
        }

        self.ctx.invalidate_decisions();
        debug!("Saved group {id} ('{}')", record.name);
        Ok(id)
    }

    /// Delete the persisted group row and all its assignment rows.
    /// Returns `Ok(false)` (no side effects) for an unsaved group.
    pub fn delete(&self) -> AccessResult<bool> {
        let id = match self.state.read().id {
            Some(id) => id,
            None => return Ok(false),
        };
        self.ctx.store().delete_group(id)?;
        self.state.write().id = None;
        self.loaded.lock().clear();
        self.invalidate_derived();
        debug!("Deleted group {id}");
        Ok(true)
    }

    /// Pull persisted assignments for one type, once per group+type
    fn ensure_loaded(&self, object_type: &ObjectType) -> AccessResult<()> {
        let id = match self.state.read().id {
            Some(id) => id,
            None => return Ok(()),
        };
        if self.loaded.lock().contains(object_type) {
            return Ok(());
        }

        let persisted = self.ctx.store().load_assignments(id, object_type)?;
        self.assignments
            .write()
            .entry(object_type.clone())
            .or_default()
            .extend(persisted);
        self.loaded.lock().insert(object_type.clone());
        Ok(())
    }

    fn real_contains(&self, object_type: &ObjectType, object_id: ObjectId) -> AccessResult<bool> {
        self.ensure_loaded(object_type)?;
        Ok(self
            .assignments
            .read()
            .get(object_type)
            .is_some_and(|set| set.contains(&object_id)))
    }

    fn invalidate_derived(&self) {
        self.full_tables.clear();
        self.membership_memo.clear();
        self.recursive_detail.clear();
        self.ctx.invalidate_decisions();
    }

    /// Upward membership resolution for a single object
    fn resolve(&self, object_type: &ObjectType, object_id: ObjectId) -> AccessResult<Membership> {
        let registry = self.ctx.registry();

        if registry.is_term_type(object_type) {
            let mut visited = AHashSet::new();
            return self.resolve_term(object_id, &mut visited);
        }
        if self.real_contains(object_type, object_id)? {
            return Ok(Membership::Direct);
        }
        if *object_type == ObjectType::role() {
            // Roles are terminal
            return Ok(Membership::None);
        }
        if *object_type == ObjectType::user() {
            return self.resolve_user(object_id);
        }
        if registry.is_postable(object_type) {
            if !self.ctx.config().lock_recursive {
                return Ok(Membership::None);
            }
            let mut visited = AHashSet::new();
            return self.resolve_post(object_type, object_id, &mut visited);
        }
        if let Some(pluggable) = registry.pluggable(object_type) {
            return Ok(pluggable.resolve_single(object_id, self));
        }
        Ok(Membership::None)
    }

    /// A term is a member when directly assigned (under any term-kind
    /// table) or, with recursive locking on, when any ancestor is.
    fn resolve_term(
        &self,
        term_id: ObjectId,
        visited: &mut AHashSet<ObjectId>,
    ) -> AccessResult<Membership> {
        for term_kind in self.ctx.registry().term_types().iter() {
            if self.real_contains(term_kind, term_id)? {
                return Ok(Membership::Direct);
            }
        }
        if !self.ctx.config().lock_recursive {
            return Ok(Membership::None);
        }
        if !visited.insert(term_id) {
            // Parent cycle; stop extending the chain
            return Ok(Membership::None);
        }

        let Some(term) = self.ctx.content().term(term_id) else {
            return Ok(Membership::None);
        };
        let Some(parent_id) = term.parent else {
            return Ok(Membership::None);
        };

        let parent_membership = self.resolve_term(parent_id, visited)?;
        if parent_membership.is_member() {
            let ancestor = match self.ctx.content().term(parent_id) {
                Some(parent) => AncestorRef::named(ObjectType::term(), parent_id, parent.name),
                None => AncestorRef::new(ObjectType::term(), parent_id),
            };
            let mut chain = vec![ancestor];
            chain.extend(parent_membership.chain().iter().cloned());
            return Ok(Membership::recursive(chain));
        }
        Ok(Membership::None)
    }

    /// A user is a member through the first of their roles found in the
    /// group's role set.
    fn resolve_user(&self, user_id: UserId) -> AccessResult<Membership> {
        let Some(user) = self.ctx.content().user(user_id) else {
            return Ok(Membership::None);
        };

        self.ensure_loaded(&ObjectType::role())?;
        let role_ids: Vec<ObjectId> = self
            .assignments
            .read()
            .get(&ObjectType::role())
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();

        let mut assigned_roles = AHashMap::new();
        for role_id in role_ids {
            if let Some(role) = self.ctx.content().role(role_id) {
                assigned_roles.insert(role.name, role_id);
            }
        }
        for role_name in &user.roles {
            if let Some(&role_id) = assigned_roles.get(role_name) {
                return Ok(Membership::via(AncestorRef::named(
                    ObjectType::role(),
                    role_id,
                    role_name,
                )));
            }
        }
        Ok(Membership::None)
    }

    /// A postable object is a member through a member term it carries,
    /// or through its effective parent chain. Callers have already
    /// checked direct assignment and the recursive-locking flag.
    fn resolve_post(
        &self,
        object_type: &ObjectType,
        post_id: ObjectId,
        visited: &mut AHashSet<ObjectId>,
    ) -> AccessResult<Membership> {
        if !visited.insert(post_id) {
            return Ok(Membership::None);
        }
        let Some(post) = self.ctx.content().post(post_id) else {
            return Ok(Membership::None);
        };

        for term_id in self.ctx.content().post_terms(post_id) {
            let mut term_visited = AHashSet::new();
            let term_membership = self.resolve_term(term_id, &mut term_visited)?;
            if term_membership.is_member() {
                let ancestor = match self.ctx.content().term(term_id) {
                    Some(term) => AncestorRef::named(ObjectType::term(), term_id, term.name),
                    None => AncestorRef::new(ObjectType::term(), term_id),
                };
                let mut chain = vec![ancestor];
                chain.extend(term_membership.chain().iter().cloned());
                return Ok(Membership::recursive(chain));
            }
        }

        if let Some(parent_id) = self.effective_parent(&post) {
            if let Some(parent) = self.ctx.content().post(parent_id) {
                let parent_type = ObjectType::new(parent.post_type.as_str());
                let parent_membership = if self.real_contains(&parent_type, parent_id)? {
                    Membership::Direct
                } else {
                    self.resolve_post(&parent_type, parent_id, visited)?
                };
                if parent_membership.is_member() {
                    let mut chain = vec![AncestorRef::named(
                        parent_type,
                        parent_id,
                        parent.title,
                    )];
                    chain.extend(parent_membership.chain().iter().cloned());
                    return Ok(Membership::recursive(chain));
                }
            }
        }
        Ok(Membership::None)
    }

    /// Literal parent, except that top-level blog posts hang off the
    /// designated posts page when one is configured.
    fn effective_parent(&self, post: &Post) -> Option<ObjectId> {
        match post.parent {
            Some(parent) => Some(parent),
            None if post.post_type == "post" => self
                .ctx
                .content()
                .page_for_posts()
                .filter(|&page| page != post.id),
            None => None,
        }
    }

    /// The recursively-expanded membership table for one type
    fn full_table(
        &self,
        object_type: &ObjectType,
    ) -> AccessResult<Arc<AHashMap<ObjectId, Membership>>> {
        if let Some(table) = self.full_tables.get(object_type) {
            return Ok(Arc::clone(table.value()));
        }
        let table = Arc::new(self.compute_full(object_type)?);
        for (id, membership) in table.iter() {
            if membership.is_recursive() {
                self.recursive_detail
                    .insert((object_type.clone(), *id), membership.chain().to_vec());
            }
        }
        self.full_tables
            .insert(object_type.clone(), Arc::clone(&table));
        Ok(table)
    }

    fn compute_full(&self, object_type: &ObjectType) -> AccessResult<AHashMap<ObjectId, Membership>> {
        self.ensure_loaded(object_type)?;
        let real: Vec<ObjectId> = self.assigned_ids(object_type)?;
        let mut table: AHashMap<ObjectId, Membership> =
            real.iter().map(|&id| (id, Membership::Direct)).collect();

        let registry = self.ctx.registry();

        if registry.is_term_type(object_type) {
            if self.ctx.config().lock_recursive {
                self.expand_term_descendants(&real, &mut table);
            }
        } else if *object_type == ObjectType::user() {
            self.expand_users_by_role(&mut table)?;
        } else if registry.is_postable(object_type) {
            if self.ctx.config().lock_recursive {
                self.expand_posts(object_type, &mut table)?;
            }
        } else if let Some(pluggable) = registry.pluggable(object_type) {
            let real_objects: Vec<AssignedObject> =
                real.into_iter().map(AssignedObject::direct).collect();
            for object in pluggable.resolve_batch(&real_objects, self) {
                table.entry(object.id).or_insert(object.membership);
            }
        }
        // Roles never expand

        Ok(table)
    }

    /// Every descendant of a directly-assigned term is a recursive
    /// member, pointing back at its assigned ancestor.
    fn expand_term_descendants(
        &self,
        roots: &[ObjectId],
        table: &mut AHashMap<ObjectId, Membership>,
    ) {
        let content = self.ctx.content();
        for &root in roots {
            let ancestor = match content.term(root) {
                Some(term) => AncestorRef::named(ObjectType::term(), root, term.name),
                None => AncestorRef::new(ObjectType::term(), root),
            };
            let mut guard = AHashSet::new();
            guard.insert(root);
            let mut stack = content.term_children(root);
            while let Some(child) = stack.pop() {
                if !guard.insert(child) {
                    continue;
                }
                table
                    .entry(child)
                    .or_insert_with(|| Membership::via(ancestor.clone()));
                stack.extend(content.term_children(child));
            }
        }
    }

    /// Users holding any directly-assigned role are recursive members.
    fn expand_users_by_role(
        &self,
        table: &mut AHashMap<ObjectId, Membership>,
    ) -> AccessResult<()> {
        let content = self.ctx.content();
        for role_id in self.assigned_ids(&ObjectType::role())? {
            let Some(role) = content.role(role_id) else {
                continue;
            };
            let ancestor = AncestorRef::named(ObjectType::role(), role_id, &role.name);
            for user_id in content.users_with_role(&role.name) {
                table
                    .entry(user_id)
                    .or_insert_with(|| Membership::via(ancestor.clone()));
            }
        }
        Ok(())
    }

    /// Posts of member terms, blog posts under a member posts-page, and
    /// the recursive children of member posts.
    fn expand_posts(
        &self,
        object_type: &ObjectType,
        table: &mut AHashMap<ObjectId, Membership>,
    ) -> AccessResult<()> {
        let content = self.ctx.content();

        for term_kind in self.ctx.registry().term_types().iter() {
            for (term_id, _) in self.full_table(term_kind)?.iter() {
                let ancestor = match content.term(*term_id) {
                    Some(term) => AncestorRef::named(ObjectType::term(), *term_id, term.name),
                    None => AncestorRef::new(ObjectType::term(), *term_id),
                };
                for post_id in content.posts_with_term(*term_id) {
                    let matches_type = content
                        .post(post_id)
                        .is_some_and(|post| post.post_type.as_str() == object_type.as_str());
                    if matches_type {
                        table
                            .entry(post_id)
                            .or_insert_with(|| Membership::via(ancestor.clone()));
                    }
                }
            }
        }

        if *object_type == ObjectType::post() {
            if let Some(page_id) = content.page_for_posts() {
                let page_membership = self
                    .full_table(&ObjectType::page())?
                    .get(&page_id)
                    .cloned()
                    .unwrap_or(Membership::None);
                if page_membership.is_member() {
                    let ancestor = match content.post(page_id) {
                        Some(page) => AncestorRef::named(ObjectType::page(), page_id, page.title),
                        None => AncestorRef::new(ObjectType::page(), page_id),
                    };
                    for post_id in content.posts_of_type(&ObjectType::post()) {
                        let top_level = content
                            .post(post_id)
                            .is_some_and(|post| post.parent.is_none() && post.id != page_id);
                        if top_level {
                            table
                                .entry(post_id)
                                .or_insert_with(|| Membership::via(ancestor.clone()));
                        }
                    }
                }
            }
        }

        // Descend through child posts of every member collected so far
        let mut stack: Vec<ObjectId> = table.keys().copied().collect();
        let mut guard: AHashSet<ObjectId> = stack.iter().copied().collect();
        while let Some(member) = stack.pop() {
            let parent_ref = match content.post(member) {
                Some(parent) => AncestorRef::named(
                    ObjectType::new(parent.post_type.as_str()),
                    member,
                    parent.title,
                ),
                None => continue,
            };
            for child in content.post_children(member) {
                if !guard.insert(child) {
                    continue;
                }
                let matches_type = content
                    .post(child)
                    .is_some_and(|post| post.post_type.as_str() == object_type.as_str());
                if matches_type {
                    table
                        .entry(child)
                        .or_insert_with(|| Membership::via(parent_ref.clone()));
                }
                stack.push(child);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for UserGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("UserGroup")
            .field("id", &state.id)
            .field("name", &state.name)
            .field("read_access", &state.read_access)
            .field("write_access", &state.write_access)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccessConfig;
    use crate::providers::{MemoryContentProvider, MemoryGroupStore, Role, Term, User};
    use pretty_assertions::assert_eq;

    fn context(lock_recursive: bool) -> (Arc<AccessContext>, Arc<MemoryContentProvider>) {
        let content = Arc::new(MemoryContentProvider::new());
        let ctx = AccessContext::new(
            Arc::new(MemoryGroupStore::new()),
            Arc::clone(&content) as Arc<dyn crate::providers::ContentProvider>,
            AccessConfig {
                lock_recursive,
                ..AccessConfig::default()
            },
        );
        (ctx, content)
    }

    fn term(id: ObjectId, parent: Option<ObjectId>, name: &str) -> Term {
        Term {
            id,
            taxonomy: "category".into(),
            parent,
            name: name.into(),
        }
    }

    #[test]
    fn test_invalid_type_is_noop() {
        let (ctx, _) = context(true);
        let group = UserGroup::new(ctx, "g");
        let bogus = ObjectType::new("definitely-unregistered-type");

        group.add_object(&bogus, 1).unwrap();

        assert!(group.assigned_ids(&bogus).unwrap().is_empty());
        assert_eq!(group.object_membership(&bogus, 1).unwrap(), Membership::None);
    }

    #[test]
    fn test_direct_membership() {
        let (ctx, _) = context(true);
        let group = UserGroup::new(ctx, "g");
        group.add_object(&ObjectType::post(), 42).unwrap();

        assert_eq!(
            group.object_membership(&ObjectType::post(), 42).unwrap(),
            Membership::Direct
        );
        assert_eq!(group.object_membership(&ObjectType::post(), 43).unwrap(), Membership::None);
    }

    #[test]
    fn test_term_parent_recursion_gated_by_config() {
        for (lock_recursive, expected_member) in [(true, true), (false, false)] {
            let (ctx, content) = context(lock_recursive);
            content.add_term(term(5, None, "parent"));
            content.add_term(term(6, Some(5), "child"));

            let group = UserGroup::new(ctx, "g");
            group.add_object(&ObjectType::term(), 5).unwrap();

            let membership = group.object_membership(&ObjectType::term(), 6).unwrap();
            assert_eq!(membership.is_member(), expected_member);
            if expected_member {
                assert_eq!(membership.chain()[0].object_id, 5);
            }
        }
    }

    #[test]
    fn test_full_terms_include_descendants() {
        let (ctx, content) = context(true);
        content.add_term(term(1, None, "root"));
        content.add_term(term(2, Some(1), "child"));
        content.add_term(term(3, Some(2), "grandchild"));

        let group = UserGroup::new(ctx, "g");
        group.add_object(&ObjectType::term(), 1).unwrap();

        let full = group
            .objects_from_type(&ObjectType::term(), ObjectScope::Full)
            .unwrap();
        let ids: Vec<ObjectId> = full.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(full[0].membership, Membership::Direct);
        assert!(full[2].membership.is_recursive());
    }

    #[test]
    fn test_user_membership_through_role() {
        let (ctx, content) = context(true);
        content.add_role(Role {
            id: 1,
            name: "editor".into(),
        });
        content.add_user(User {
            id: 9,
            login: "pat".into(),
            roles: vec!["editor".into()],
            capabilities: Default::default(),
        });

        let group = UserGroup::new(ctx, "g");
        group.add_object(&ObjectType::role(), 1).unwrap();

        let membership = group.user_membership(9).unwrap();
        assert!(membership.is_recursive());
        assert_eq!(membership.chain()[0].name.as_deref(), Some("editor"));
        assert_eq!(group.user_membership(10).unwrap(), Membership::None);
    }

    #[test]
    fn test_mutation_drops_memoized_membership() {
        let (ctx, _) = context(true);
        let group = UserGroup::new(ctx, "g");

        assert_eq!(group.object_membership(&ObjectType::post(), 7).unwrap(), Membership::None);
        group.add_object(&ObjectType::post(), 7).unwrap();
        assert_eq!(
            group.object_membership(&ObjectType::post(), 7).unwrap(),
            Membership::Direct
        );

        group.remove_object(&ObjectType::post(), 7).unwrap();
        assert_eq!(group.object_membership(&ObjectType::post(), 7).unwrap(), Membership::None);
    }

    #[test]
    fn test_delete_unsaved_group() {
        let (ctx, _) = context(true);
        let group = UserGroup::new(ctx, "g");
        assert!(!group.delete().unwrap());
    }
}
