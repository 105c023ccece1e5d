/*!
 * Listing Exclusion Integration Tests
 */

use content_gate::{
    AccessAction, AccessConfig, AccessContext, AccessHandler, AccessPolicy, ContentProvider,
    MemoryContentProvider, MemoryGroupStore, ObjectType, Post, Subject, Term, UserGroup,
};
use std::net::Ipv4Addr;
use std::sync::Arc;

fn engine(config: AccessConfig) -> (Arc<AccessContext>, AccessHandler, Arc<MemoryContentProvider>) {
    let content = Arc::new(MemoryContentProvider::new());
    let ctx = AccessContext::new(
        Arc::new(MemoryGroupStore::new()),
        Arc::clone(&content) as Arc<dyn ContentProvider>,
        config,
    );
    let handler = AccessHandler::new(Arc::clone(&ctx));
    (ctx, handler, content)
}

fn post(id: u64, author: Option<u64>) -> Post {
    Post {
        id,
        post_type: "post".into(),
        parent: None,
        author,
        title: format!("post {id}").into(),
    }
}

#[test]
fn test_excluded_terms_cover_descendants() {
    let (ctx, handler, content) = engine(AccessConfig::default());
    content.add_term(Term {
        id: 1,
        taxonomy: "category".into(),
        parent: None,
        name: "private".into(),
    });
    content.add_term(Term {
        id: 2,
        taxonomy: "category".into(),
        parent: Some(1),
        name: "private-child".into(),
    });
    content.add_term(Term {
        id: 3,
        taxonomy: "category".into(),
        parent: None,
        name: "public".into(),
    });

    let group = UserGroup::new(Arc::clone(&ctx), "g");
    group.add_object(&ObjectType::term(), 1).unwrap();
    handler.add_user_group(group).unwrap();

    let excluded = handler
        .excluded_terms(&Subject::anonymous(), AccessAction::Read)
        .unwrap();
    assert_eq!(excluded, vec![1, 2], "Parent and descendant are hidden, unrelated term is not");
}

#[test]
fn test_excluded_posts_respect_membership_and_ip() {
    let (ctx, handler, content) = engine(AccessConfig::default());
    content.add_post(post(1, None));
    content.add_post(post(2, None));

    let gated = UserGroup::new(Arc::clone(&ctx), "gated");
    gated.set_ip_ranges(vec!["10.0.0.1-10.0.0.5".to_string()]);
    gated.add_object(&ObjectType::post(), 1).unwrap();
    handler.add_user_group(gated).unwrap();

    let visitor = Subject::anonymous();
    assert_eq!(
        handler.excluded_posts(&visitor, AccessAction::Read).unwrap(),
        vec![1]
    );

    // An IP inside the group's range lifts the gate
    let trusted = Subject::anonymous().with_ip(Ipv4Addr::new(10, 0, 0, 3));
    assert!(handler
        .excluded_posts(&trusted, AccessAction::Read)
        .unwrap()
        .is_empty());
}

#[test]
fn test_open_read_policy_excludes_nothing() {
    let (ctx, handler, content) = engine(AccessConfig::default());
    content.add_post(post(1, None));

    let open = UserGroup::new(Arc::clone(&ctx), "open");
    open.set_read_access(AccessPolicy::All);
    open.add_object(&ObjectType::post(), 1).unwrap();
    handler.add_user_group(open).unwrap();

    assert!(handler
        .excluded_posts(&Subject::anonymous(), AccessAction::Read)
        .unwrap()
        .is_empty());
    // The write side still hides the post from authoring listings
    assert_eq!(
        handler
            .excluded_posts(&Subject::anonymous(), AccessAction::Write)
            .unwrap(),
        vec![1]
    );
}

#[test]
fn test_satisfying_group_overrides_denying_group() {
    let (ctx, handler, content) = engine(AccessConfig::default());
    content.add_post(post(1, None));
    content.add_role(content_gate::Role {
        id: 1,
        name: "editor".into(),
    });
    content.add_user(content_gate::User {
        id: 7,
        login: "pat".into(),
        roles: vec!["editor".into()],
        capabilities: Default::default(),
    });

    // Post 1 sits in a group the user cannot satisfy...
    let denying = UserGroup::new(Arc::clone(&ctx), "denying");
    denying.add_object(&ObjectType::post(), 1).unwrap();
    handler.add_user_group(denying).unwrap();

    // ...and in one the user belongs to through their role
    let granting = UserGroup::new(Arc::clone(&ctx), "granting");
    granting.add_object(&ObjectType::role(), 1).unwrap();
    granting.add_object(&ObjectType::post(), 1).unwrap();
    handler.add_user_group(granting).unwrap();

    let editor = Subject::user(7).with_role("editor");
    assert!(handler
        .excluded_posts(&editor, AccessAction::Read)
        .unwrap()
        .is_empty());
    assert_eq!(
        handler
            .excluded_posts(&Subject::user(8), AccessAction::Read)
            .unwrap(),
        vec![1]
    );
}

#[test]
fn test_author_keeps_own_posts_in_listings() {
    let (ctx, handler, content) = engine(AccessConfig {
        authors_has_access_to_own: true,
        ..AccessConfig::default()
    });
    content.add_post(post(1, Some(7)));
    content.add_post(post(2, Some(8)));

    let group = UserGroup::new(Arc::clone(&ctx), "g");
    group.add_object(&ObjectType::post(), 1).unwrap();
    group.add_object(&ObjectType::post(), 2).unwrap();
    handler.add_user_group(group).unwrap();

    let author = Subject::user(7).with_role("author");
    assert_eq!(
        handler.excluded_posts(&author, AccessAction::Read).unwrap(),
        vec![2],
        "Authorship exempts only the subject's own post"
    );
}

#[test]
fn test_managers_are_never_filtered() {
    let (ctx, handler, content) = engine(AccessConfig::default());
    content.add_post(post(1, None));

    let group = UserGroup::new(Arc::clone(&ctx), "g");
    group.add_object(&ObjectType::post(), 1).unwrap();
    handler.add_user_group(group).unwrap();

    let admin = Subject::user(1).with_role("administrator");
    assert!(handler.excluded_posts(&admin, AccessAction::Read).unwrap().is_empty());
    assert!(handler.excluded_terms(&admin, AccessAction::Read).unwrap().is_empty());
}

#[test]
fn test_exclusion_sets_are_cached_per_subject() {
    let (ctx, handler, content) = engine(AccessConfig::default());
    content.add_post(post(1, None));

    let group = UserGroup::new(Arc::clone(&ctx), "g");
    group.add_object(&ObjectType::post(), 1).unwrap();
    let group = handler.add_user_group(group).unwrap();

    let visitor = Subject::anonymous();
    assert_eq!(handler.excluded_posts(&visitor, AccessAction::Read).unwrap(), vec![1]);
    let hits_before = handler.cache_stats().hits;
    assert_eq!(handler.excluded_posts(&visitor, AccessAction::Read).unwrap(), vec![1]);
    assert!(handler.cache_stats().hits > hits_before);

    // A group mutation rebuilds the set
    group.remove_object(&ObjectType::post(), 1).unwrap();
    group.save(true).unwrap();
    assert!(handler
        .excluded_posts(&visitor, AccessAction::Read)
        .unwrap()
        .is_empty());
}
