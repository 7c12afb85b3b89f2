//! Integration tests for the page stores
//!
//! The sled and in-memory backends must agree on placement-relevant
//! behavior: rank assignment, slug conflicts and criteria evaluation.

use pagetype::store::{MemoryPageStore, PageStore, PutOptions, SledPageStore};
use pagetype::{Criteria, Page, QueryOptions, StorageError};
use serde_json::json;
use tempfile::TempDir;

fn child(title: &str, slug: &str, kind: &str, rank: i64) -> Page {
    let mut page = Page::tree_node(slug, slug, 1);
    page.title = title.to_string();
    page.page_type = kind.to_string();
    page.rank = Some(rank);
    page
}

async fn exercise(store: &dyn PageStore) -> (Vec<i64>, bool, Vec<String>) {
    let home = Page::tree_node("/", "/", 0);
    store
        .write(None, &PutOptions::default(), child("Blog", "/blog", "blog", 4))
        .await
        .unwrap();

    let mut ranks = Vec::new();
    for _ in 0..3 {
        ranks.push(store.next_sibling_rank(&home).await.unwrap());
    }

    let conflict = matches!(
        store
            .write(None, &PutOptions::default(), child("Other", "/blog", "event", 9))
            .await,
        Err(StorageError::SlugConflict(_))
    );

    store
        .write(
            None,
            &PutOptions::default(),
            child("Zoo", "/zoo", "place", 5).with_field("tags", json!(["animals"])),
        )
        .await
        .unwrap();

    let criteria = Criteria::from_json(&json!({
        "$or": [{"type": "blog"}, {"tags": {"$in": ["animals"]}}]
    }))
    .unwrap();
    let found = store
        .query(&criteria, &QueryOptions::default())
        .await
        .unwrap();
    let mut slugs: Vec<String> = found
        .into_pages()
        .into_iter()
        .filter_map(|p| p.slug)
        .collect();
    slugs.sort();

    (ranks, conflict, slugs)
}

#[tokio::test]
async fn test_backends_agree() {
    let memory = MemoryPageStore::new();
    let dir = TempDir::new().unwrap();
    let sled = SledPageStore::new(dir.path().join("pages")).unwrap();

    let from_memory = exercise(&memory).await;
    let from_sled = exercise(&sled).await;

    assert_eq!(from_memory, from_sled);
    assert_eq!(from_memory.0, vec![5, 6, 7]);
    assert!(from_memory.1);
    assert_eq!(from_memory.2, vec!["/blog", "/zoo"]);
}

#[tokio::test]
async fn test_sled_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pages");
    let home = Page::tree_node("/", "/", 0);

    let id = {
        let store = SledPageStore::new(&path).unwrap();
        let saved = store
            .write(None, &PutOptions::default(), child("Blog", "/blog", "blog", 0))
            .await
            .unwrap();
        assert_eq!(store.next_sibling_rank(&home).await.unwrap(), 1);
        store.flush().unwrap();
        saved.id.unwrap()
    };

    let store = SledPageStore::new(&path).unwrap();
    let page = store.get(&id).unwrap().unwrap();
    assert_eq!(page.slug.as_deref(), Some("/blog"));
    assert_eq!(page.sort_title.as_deref(), Some("blog"));
    assert_eq!(store.next_sibling_rank(&home).await.unwrap(), 2);
}

#[tokio::test]
async fn test_slug_hint_updates_existing_page() {
    let dir = TempDir::new().unwrap();
    let store = SledPageStore::new(dir.path().join("pages")).unwrap();

    let first = store
        .write(None, &PutOptions::default(), child("Blog", "/blog", "blog", 0))
        .await
        .unwrap();
    let second = store
        .write(
            Some("/blog"),
            &PutOptions::default(),
            child("Weblog", "/blog", "blog", 0),
        )
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    let all = store
        .query(&Criteria::All, &QueryOptions::default())
        .await
        .unwrap();
    assert_eq!(all.pages().len(), 1);
    assert_eq!(all.pages()[0].title, "Weblog");
}
