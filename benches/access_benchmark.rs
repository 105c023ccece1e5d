/*!
 * Access Check Benchmarks
 * Cached vs recomputed decision paths
 */

use content_gate::{
    AccessAction, AccessConfig, AccessContext, AccessHandler, ContentProvider,
    MemoryContentProvider, MemoryGroupStore, ObjectType, Post, Subject, Term, UserGroup,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

fn setup() -> (AccessHandler, Subject) {
    let content = Arc::new(MemoryContentProvider::new());

    // A small category tree with gated posts hanging off it
    for term_id in 1..=20u64 {
        content.add_term(Term {
            id: term_id,
            taxonomy: "category".into(),
            parent: (term_id > 1).then(|| term_id - 1),
            name: format!("term {term_id}").into(),
        });
    }
    for post_id in 100..=200u64 {
        content.add_post(Post {
            id: post_id,
            post_type: "post".into(),
            parent: None,
            author: None,
            title: format!("post {post_id}").into(),
        });
        content.link(post_id, post_id % 20 + 1);
    }

    let ctx = AccessContext::new(
        Arc::new(MemoryGroupStore::new()),
        Arc::clone(&content) as Arc<dyn ContentProvider>,
        AccessConfig::default(),
    );
    let handler = AccessHandler::new(Arc::clone(&ctx));

    let group = UserGroup::new(Arc::clone(&ctx), "gated");
    group.add_object(&ObjectType::term(), 1).unwrap();
    handler.add_user_group(group).unwrap();

    (handler, Subject::user(7).with_role("author"))
}

fn bench_cached_check(c: &mut Criterion) {
    let (handler, subject) = setup();
    let post = ObjectType::post();
    // Warm the decision cache
    handler
        .check_object_access(&subject, AccessAction::Read, &post, 150)
        .unwrap();

    c.bench_function("cached_access_check", |b| {
        b.iter(|| {
            handler
                .check_object_access(black_box(&subject), AccessAction::Read, &post, 150)
                .unwrap()
        })
    });
}

fn bench_decision_fold(c: &mut Criterion) {
    let (handler, subject) = setup();
    let post = ObjectType::post();

    c.bench_function("decision_fold", |b| {
        b.iter(|| {
            handler
                .decide(black_box(&subject), AccessAction::Read, &post, 150)
                .unwrap()
        })
    });
}

fn bench_excluded_posts(c: &mut Criterion) {
    let (handler, subject) = setup();

    c.bench_function("excluded_posts", |b| {
        b.iter(|| handler.excluded_posts(black_box(&subject), AccessAction::Read).unwrap())
    });
}

criterion_group!(
    benches,
    bench_cached_check,
    bench_decision_fold,
    bench_excluded_posts
);
criterion_main!(benches);
