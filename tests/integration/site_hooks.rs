//! Integration tests for diff and index listeners wired through the site

use pagetype::hooks::HookRegistryBuilder;
use pagetype::{Criteria, Page, QueryOptions, RequestContext, SearchText};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::test_utils::seeded_site;

async fn page_at(fixture: &super::test_utils::SiteFixture, type_name: &str) -> Page {
    fixture
        .page_type(type_name)
        .get_one(
            &RequestContext::task(),
            Criteria::All,
            QueryOptions::default(),
        )
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn test_index_texts_come_from_schema_and_behavior() {
    let fixture = seeded_site().await;

    let park = page_at(&fixture, "place").await;
    let texts = fixture.site.search_texts(&park);
    assert_eq!(texts, vec![SearchText::new(20, "1 Lake Road")]);
    assert!(texts[0].is_strong());

    let events = page_at(&fixture, "event").await;
    let texts = fixture.site.search_texts(&events);
    assert_eq!(texts.len(), 2);
    assert_eq!(texts[0].text, "2024-06-01");
    assert!(texts[0].silent);
    assert_eq!(texts[1].text, "outdoor family");

    let news = page_at(&fixture, "blog").await;
    let texts = fixture.site.search_texts(&news);
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].text.trim(), "Hello world");
}

#[tokio::test]
async fn test_diff_lines_only_from_matching_type() {
    let fixture = seeded_site().await;

    let events = page_at(&fixture, "event").await;
    assert_eq!(fixture.site.diff_lines(&events), vec!["Starts: 2024-06-01"]);

    // Same fields, different type: the event listener must not fire
    let mut disguised = events.clone();
    disguised.page_type = "blog".to_string();
    assert!(fixture.site.diff_lines(&disguised).is_empty());

    disguised.page_type = "unregistered".to_string();
    assert!(fixture.site.diff_lines(&disguised).is_empty());
    assert!(fixture.site.search_texts(&disguised).is_empty());
}

#[test]
fn test_listeners_fire_per_type() {
    let a_calls = Arc::new(AtomicUsize::new(0));
    let b_calls = Arc::new(AtomicUsize::new(0));

    let mut builder = HookRegistryBuilder::new();
    let counter = a_calls.clone();
    builder.on_diff("a", move |_, lines| {
        counter.fetch_add(1, Ordering::SeqCst);
        lines.push("from a".to_string());
    });
    let counter = b_calls.clone();
    builder.on_diff("b", move |_, lines| {
        counter.fetch_add(1, Ordering::SeqCst);
        lines.push("from b".to_string());
    });
    let hooks = builder.build();

    let mut page = Page::new("Typed");
    page.page_type = "a".to_string();
    assert_eq!(hooks.diff_lines(&page), vec!["from a"]);
    assert_eq!(a_calls.load(Ordering::SeqCst), 1);
    assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    assert_eq!(hooks.registered_types(), vec!["a", "b"]);
}

#[tokio::test]
async fn test_registry_exposes_types_in_order() {
    let fixture = seeded_site().await;
    let names: Vec<_> = fixture
        .site
        .registry()
        .iter()
        .map(|t| t.name().to_string())
        .collect();
    assert_eq!(names, vec!["home", "place", "event", "blog"]);
    assert_eq!(
        fixture.site.hooks().registered_types(),
        vec!["blog", "event", "home", "place"]
    );
}
