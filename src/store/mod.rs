//! Page Store
//!
//! Persistence boundary for pages. The page type core only ever talks to
//! the `PageStore` trait; the in-memory and sled backends here are the
//! two implementations the crate ships.

pub mod criteria;
pub mod memory;
pub mod persistence;

pub use criteria::Criteria;
pub use memory::MemoryPageStore;
pub use persistence::SledPageStore;

use crate::error::StorageError;
use crate::page::{lookup, Page, PageId};
use crate::schema::JoinSelector;
use crate::slug::sortify;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sort direction for one sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Options for a page query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// Sort keys, applied in order. `None` lets the caller pick a default.
    pub sort: Option<Vec<SortKey>>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
    /// Which schema joins to resolve on the results
    pub with_joins: JoinSelector,
    /// Return the distinct values of this field instead of pages
    pub distinct: Option<String>,
}

impl QueryOptions {
    pub fn sorted_by(mut self, keys: Vec<SortKey>) -> Self {
        self.sort = Some(keys);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn with_joins(mut self, selector: JoinSelector) -> Self {
        self.with_joins = selector;
        self
    }

    pub fn distinct(mut self, field: impl Into<String>) -> Self {
        self.distinct = Some(field.into());
        self
    }
}

/// Pages returned by a query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSet {
    pub pages: Vec<Page>,
}

/// Result of a query: either full pages or distinct field values
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Pages(PageSet),
    Distinct(Vec<Value>),
}

impl QueryResult {
    pub fn pages(&self) -> &[Page] {
        match self {
            QueryResult::Pages(set) => &set.pages,
            QueryResult::Distinct(_) => &[],
        }
    }

    pub fn into_pages(self) -> Vec<Page> {
        match self {
            QueryResult::Pages(set) => set.pages,
            QueryResult::Distinct(_) => Vec::new(),
        }
    }
}

/// Options for a page write
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PutOptions {
    /// Parent page; required when a new page is placed in the tree
    pub parent: Option<Page>,
}

impl PutOptions {
    pub fn under(parent: Page) -> Self {
        Self {
            parent: Some(parent),
        }
    }
}

/// Page Store interface
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Fetch pages matching `criteria`, honoring sort, skip, limit and distinct
    async fn query(
        &self,
        criteria: &Criteria,
        options: &QueryOptions,
    ) -> Result<QueryResult, StorageError>;

    /// Insert or replace a page
    ///
    /// A page without `_id` replaces the page currently stored under
    /// `slug_hint`, if any; otherwise it is inserted with a fresh id.
    async fn write(
        &self,
        slug_hint: Option<&str>,
        options: &PutOptions,
        page: Page,
    ) -> Result<Page, StorageError>;

    /// Next free rank among the children of `parent`
    ///
    /// Ranks handed out for one parent are unique and strictly increasing.
    async fn next_sibling_rank(&self, parent: &Page) -> Result<i64, StorageError>;
}

/// Apply criteria, distinct, sort, skip and limit to a set of pages
pub(crate) fn run_query(
    pages: Vec<Page>,
    criteria: &Criteria,
    options: &QueryOptions,
) -> QueryResult {
    let mut matched: Vec<(Value, Page)> = pages
        .into_iter()
        .map(|page| (page.to_document(), page))
        .filter(|(doc, _)| criteria.matches(doc))
        .collect();

    if let Some(field) = &options.distinct {
        let mut values: Vec<Value> = Vec::new();
        for (doc, _) in &matched {
            let found = match lookup(doc, field) {
                Some(Value::Array(items)) => items.clone(),
                Some(Value::Null) | None => continue,
                Some(value) => vec![value.clone()],
            };
            for value in found {
                if !values.contains(&value) {
                    values.push(value);
                }
            }
        }
        return QueryResult::Distinct(values);
    }

    if let Some(keys) = &options.sort {
        matched.sort_by(|(a, _), (b, _)| {
            keys.iter()
                .map(|key| {
                    let ordering =
                        criteria::compare_values(lookup(a, &key.field), lookup(b, &key.field));
                    match key.direction {
                        SortDirection::Ascending => ordering,
                        SortDirection::Descending => ordering.reverse(),
                    }
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    let pages = matched
        .into_iter()
        .map(|(_, page)| page)
        .skip(options.skip.unwrap_or(0))
        .take(options.limit.unwrap_or(usize::MAX))
        .collect();

    QueryResult::Pages(PageSet { pages })
}

/// Fill in the storage-owned properties of a page about to be written
pub(crate) fn prepare_for_write(existing_id: Option<PageId>, mut page: Page) -> Page {
    if page.id.is_none() {
        page.id = Some(existing_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()));
    }
    page.sort_title = Some(sortify(&page.title));
    page.updated_at = Some(Utc::now());
    page.url = None;
    page
}

/// Path prefix shared by all children of a page path
pub(crate) fn child_prefix(parent_path: &str) -> String {
    if parent_path.ends_with('/') {
        parent_path.to_string()
    } else {
        format!("{}/", parent_path)
    }
}

/// Highest rank currently held by a direct child of `parent`
pub(crate) fn max_child_rank<'a>(
    pages: impl Iterator<Item = &'a Page>,
    parent: &Page,
) -> Option<i64> {
    let prefix = child_prefix(parent.path.as_deref().unwrap_or(""));
    let child_level = parent.level.unwrap_or(0) + 1;
    pages
        .filter(|page| page.level == Some(child_level))
        .filter(|page| {
            page.path
                .as_deref()
                .map(|path| path.starts_with(&prefix))
                .unwrap_or(false)
        })
        .filter_map(|page| page.rank)
        .max()
}
