//! In-memory page store

use crate::error::StorageError;
use crate::page::{Page, PageId};
use crate::store::{
    max_child_rank, prepare_for_write, run_query, Criteria, PageStore, PutOptions, QueryOptions,
    QueryResult,
};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};

/// Page store held entirely in memory
///
/// Used by tests and by hosts that load their pages from elsewhere.
#[derive(Default)]
pub struct MemoryPageStore {
    pages: RwLock<BTreeMap<PageId, Page>>,
    next_ranks: Mutex<HashMap<String, i64>>,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored pages
    pub fn len(&self) -> usize {
        self.pages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.read().is_empty()
    }

    fn id_for_slug(&self, slug: &str) -> Option<PageId> {
        self.pages
            .read()
            .values()
            .find(|page| page.slug.as_deref() == Some(slug))
            .and_then(|page| page.id.clone())
    }
}

#[async_trait]
impl PageStore for MemoryPageStore {
    async fn query(
        &self,
        criteria: &Criteria,
        options: &QueryOptions,
    ) -> Result<QueryResult, StorageError> {
        let pages: Vec<Page> = self.pages.read().values().cloned().collect();
        Ok(run_query(pages, criteria, options))
    }

    async fn write(
        &self,
        slug_hint: Option<&str>,
        _options: &PutOptions,
        page: Page,
    ) -> Result<Page, StorageError> {
        let existing_id = match (&page.id, slug_hint) {
            (None, Some(hint)) => self.id_for_slug(hint),
            _ => None,
        };
        let page = prepare_for_write(existing_id, page);

        let mut pages = self.pages.write();
        if let Some(slug) = &page.slug {
            let taken = pages
                .values()
                .any(|other| other.slug.as_ref() == Some(slug) && other.id != page.id);
            if taken {
                return Err(StorageError::SlugConflict(slug.clone()));
            }
        }
        if let Some(id) = &page.id {
            pages.insert(id.clone(), page.clone());
        }
        Ok(page)
    }

    async fn next_sibling_rank(&self, parent: &Page) -> Result<i64, StorageError> {
        let floor = max_child_rank(self.pages.read().values(), parent)
            .map(|rank| rank + 1)
            .unwrap_or(0);
        let key = parent.path.clone().unwrap_or_default();

        let mut next_ranks = self.next_ranks.lock();
        let next = next_ranks.entry(key).or_insert(0);
        let rank = (*next).max(floor);
        *next = rank + 1;
        Ok(rank)
    }
}
