//! Property-based tests for placement and scoping guarantees

use pagetype::behavior::DefaultBehavior;
use pagetype::config::PageTypeConfig;
use pagetype::schema::BasicSchemaGateway;
use pagetype::slug::{join_path, slugify};
use pagetype::store::{MemoryPageStore, PageStore};
use pagetype::{Criteria, Page, PageType, PutOptions, QueryOptions, RequestContext};
use proptest::prelude::*;
use std::sync::Arc;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

fn page_type(store: Arc<MemoryPageStore>, name: &str) -> PageType {
    let schemas = Arc::new(BasicSchemaGateway::new(store.clone()));
    PageType::new(
        &PageTypeConfig::new(name, name.to_uppercase()),
        store,
        schemas,
        Arc::new(DefaultBehavior),
    )
    .unwrap()
}

/// Sibling ranks are strictly increasing in call order, whatever the titles
#[test]
fn test_sibling_ranks_monotonic_property() {
    let mut runner = proptest::test_runner::TestRunner::new(ProptestConfig::with_cases(32));
    let rt = runtime();

    runner
        .run(
            &proptest::collection::vec("[A-Za-z][A-Za-z ]{0,15}", 1..12),
            |titles| {
                let store = Arc::new(MemoryPageStore::new());
                let events = page_type(store.clone(), "event");
                let parent = Page::tree_node("/fun", "/fun", 1);
                let ctx = RequestContext::task();

                let mut last = None;
                for (i, title) in titles.iter().enumerate() {
                    // Index suffix keeps generated slugs unique
                    let hint = format!("/fun/{}-{}", slugify(title), i);
                    let saved = rt
                        .block_on(events.put_one(
                            &ctx,
                            Some(&hint),
                            &PutOptions::under(parent.clone()),
                            Page::new(title.clone()),
                        ))
                        .unwrap();
                    let rank = saved.rank.unwrap();
                    if let Some(previous) = last {
                        prop_assert!(rank > previous);
                    }
                    last = Some(rank);
                    prop_assert_eq!(saved.level, Some(2));
                    prop_assert_eq!(saved.path, Some(join_path("/fun", &slugify(title))));
                }
                Ok(())
            },
        )
        .unwrap();
}

/// Whatever the caller asks for, a type only ever sees its own pages
#[test]
fn test_type_scoping_property() {
    let mut runner = proptest::test_runner::TestRunner::new(ProptestConfig::with_cases(32));
    let rt = runtime();
    let kinds = ["event", "blog", "place"];

    runner
        .run(
            &(
                proptest::collection::vec(0usize..3, 0..10),
                0usize..3,
                prop::bool::ANY,
            ),
            |(layout, asked, negate)| {
                let store = Arc::new(MemoryPageStore::new());
                for (i, kind) in layout.iter().enumerate() {
                    let mut page = Page::new(format!("Page {}", i)).with_slug(format!("/p{}", i));
                    page.page_type = kinds[*kind].to_string();
                    rt.block_on(store.write(None, &PutOptions::default(), page))
                        .unwrap();
                }

                let events = page_type(store.clone(), "event");
                let criteria = if negate {
                    Criteria::ne("type", kinds[asked])
                } else {
                    Criteria::eq("type", kinds[asked])
                };
                let ctx = RequestContext::task();
                let result = rt
                    .block_on(events.get(&ctx, criteria, QueryOptions::default()))
                    .unwrap();

                prop_assert!(result.pages().iter().all(|p| p.page_type == "event"));
                let expected = layout
                    .iter()
                    .filter(|&&k| k == 0)
                    .count();
                let asked_event = kinds[asked] == "event";
                let expected = if asked_event != negate { expected } else { 0 };
                prop_assert_eq!(result.pages().len(), expected);
                Ok(())
            },
        )
        .unwrap();
}

/// Slug components are never empty and contain only [a-z0-9-]
#[test]
fn test_slugify_charset_property() {
    proptest!(|(title in ".{0,40}")| {
        let slug = slugify(&title);
        prop_assert!(!slug.is_empty());
        prop_assert!(slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        prop_assert!(!slug.starts_with('-'));
        prop_assert!(!slug.ends_with('-'));
    });
}
