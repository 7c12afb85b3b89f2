//! Persistence layer for the Page Store

use crate::error::StorageError;
use crate::page::{Page, PageId};
use crate::store::{
    max_child_rank, prepare_for_write, run_query, Criteria, PageStore, PutOptions, QueryOptions,
    QueryResult,
};
use async_trait::async_trait;
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
    TransactionResult,
};
use sled::{IVec, Transactional};
use std::path::Path;
use tracing::debug;

const PAGES_TREE: &str = "pages";
const SLUGS_TREE: &str = "slugs";
const RANKS_TREE: &str = "ranks";

fn io_error(context: &str, e: impl std::fmt::Display) -> StorageError {
    StorageError::IoError(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("{}: {}", context, e),
    ))
}

fn decode_id(bytes: IVec) -> PageId {
    String::from_utf8_lossy(&bytes).into_owned()
}

fn abort<T>(err: StorageError) -> ConflictableTransactionResult<T, StorageError> {
    Err(ConflictableTransactionError::Abort(err))
}

/// Sled-based implementation of PageStore
///
/// Pages are stored as JSON under their id. A second tree maps slugs to
/// ids, and a third holds the next sibling rank per parent path.
pub struct SledPageStore {
    db: sled::Db,
    pages: sled::Tree,
    slugs: sled::Tree,
    ranks: sled::Tree,
}

impl SledPageStore {
    /// Open (or create) a SledPageStore at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| io_error("Failed to open sled database", e))?;
        let pages = db
            .open_tree(PAGES_TREE)
            .map_err(|e| io_error("Failed to open pages tree", e))?;
        let slugs = db
            .open_tree(SLUGS_TREE)
            .map_err(|e| io_error("Failed to open slugs tree", e))?;
        let ranks = db
            .open_tree(RANKS_TREE)
            .map_err(|e| io_error("Failed to open ranks tree", e))?;
        Ok(Self {
            db,
            pages,
            slugs,
            ranks,
        })
    }

    /// Get the underlying sled database (for advanced operations)
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    /// Load a single page by id
    pub fn get(&self, id: &str) -> Result<Option<Page>, StorageError> {
        match self
            .pages
            .get(id.as_bytes())
            .map_err(|e| io_error("Failed to get page", e))?
        {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn list_all(&self) -> Result<Vec<Page>, StorageError> {
        let mut pages = Vec::new();
        for item in self.pages.iter() {
            let (_, value) = item.map_err(|e| io_error("Failed to iterate pages", e))?;
            pages.push(serde_json::from_slice(&value)?);
        }
        Ok(pages)
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db
            .flush()
            .map_err(|e| io_error("Failed to flush database", e))?;
        Ok(())
    }
}

#[async_trait]
impl PageStore for SledPageStore {
    async fn query(
        &self,
        criteria: &Criteria,
        options: &QueryOptions,
    ) -> Result<QueryResult, StorageError> {
        Ok(run_query(self.list_all()?, criteria, options))
    }

    async fn write(
        &self,
        slug_hint: Option<&str>,
        _options: &PutOptions,
        page: Page,
    ) -> Result<Page, StorageError> {
        // Slug ownership check and both index updates commit together, so
        // concurrent writers cannot both claim one slug.
        let stored: TransactionResult<Page, StorageError> =
            (&self.pages, &self.slugs).transaction(|(pages, slugs)| {
                let existing_id = match (&page.id, slug_hint) {
                    (None, Some(hint)) => slugs.get(hint.as_bytes())?.map(decode_id),
                    _ => None,
                };
                let page = prepare_for_write(existing_id, page.clone());
                let id = page.id.clone().unwrap_or_default();

                if let Some(slug) = &page.slug {
                    if let Some(owner) = slugs.get(slug.as_bytes())? {
                        if &owner[..] != id.as_bytes() {
                            return abort(StorageError::SlugConflict(slug.clone()));
                        }
                    }
                }

                // Drop the old slug mapping when the slug changed
                if let Some(previous) = pages.get(id.as_bytes())? {
                    let previous: Page = match serde_json::from_slice(&previous) {
                        Ok(previous) => previous,
                        Err(e) => return abort(e.into()),
                    };
                    let old_slug = previous.slug.filter(|old| Some(old) != page.slug.as_ref());
                    if let Some(old_slug) = old_slug {
                        slugs.remove(old_slug.as_bytes())?;
                    }
                }

                let value = match serde_json::to_vec(&page) {
                    Ok(value) => value,
                    Err(e) => return abort(e.into()),
                };
                pages.insert(id.as_bytes(), value)?;
                if let Some(slug) = &page.slug {
                    slugs.insert(slug.as_bytes(), id.as_bytes())?;
                }
                Ok(page)
            });

        let page = stored.map_err(|e| match e {
            TransactionError::Abort(err) => err,
            TransactionError::Storage(err) => StorageError::from(err),
        })?;
        debug!(page_id = ?page.id, slug = ?page.slug, "Stored page");
        Ok(page)
    }

    async fn next_sibling_rank(&self, parent: &Page) -> Result<i64, StorageError> {
        let pages = self.list_all()?;
        let floor = max_child_rank(pages.iter(), parent)
            .map(|rank| rank + 1)
            .unwrap_or(0);
        let key = parent.path.clone().unwrap_or_default();

        let decode = |bytes: &[u8]| -> i64 {
            let mut buf = [0u8; 8];
            if bytes.len() == 8 {
                buf.copy_from_slice(bytes);
            }
            i64::from_be_bytes(buf)
        };

        // fetch_and_update retries the closure on contention, so the rank
        // handed out stays unique across concurrent writers.
        let previous = self
            .ranks
            .fetch_and_update(key.as_bytes(), |old| {
                let current = old.map(decode).unwrap_or(0).max(floor);
                Some((current + 1).to_be_bytes().to_vec())
            })
            .map_err(|e| io_error("Failed to update rank counter", e))?;

        Ok(previous.as_deref().map(decode).unwrap_or(0).max(floor))
    }
}
