//! Hook Registry
//!
//! Per-type listener tables for the two host events page types take part
//! in: computing version diffs and building the search index. Listeners
//! are registered while the site is being built; once frozen the table is
//! shared read-only between requests.

use crate::page::Page;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Texts weighted above this rank ahead of everything else in search
pub const STRONG_MATCH_WEIGHT: u32 = 10;

/// One searchable text for a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchText {
    pub weight: u32,
    pub text: String,
    /// Searchable but left out of result summaries
    #[serde(default)]
    pub silent: bool,
}

impl SearchText {
    pub fn new(weight: u32, text: impl Into<String>) -> Self {
        Self {
            weight,
            text: text.into(),
            silent: false,
        }
    }

    pub fn is_strong(&self) -> bool {
        self.weight > STRONG_MATCH_WEIGHT
    }
}

/// Contributes diff-friendly lines describing a page
pub type DiffListener = Arc<dyn Fn(&Page, &mut Vec<String>) + Send + Sync>;

/// Contributes search texts for a page
pub type IndexListener = Arc<dyn Fn(&Page, &mut Vec<SearchText>) + Send + Sync>;

/// Collects listeners during startup
#[derive(Default)]
pub struct HookRegistryBuilder {
    diff: HashMap<String, Vec<DiffListener>>,
    index: HashMap<String, Vec<IndexListener>>,
}

impl HookRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a diff listener for pages of `page_type`
    pub fn on_diff<F>(&mut self, page_type: impl Into<String>, listener: F) -> &mut Self
    where
        F: Fn(&Page, &mut Vec<String>) + Send + Sync + 'static,
    {
        self.diff
            .entry(page_type.into())
            .or_default()
            .push(Arc::new(listener));
        self
    }

    /// Register an index listener for pages of `page_type`
    pub fn on_index<F>(&mut self, page_type: impl Into<String>, listener: F) -> &mut Self
    where
        F: Fn(&Page, &mut Vec<SearchText>) + Send + Sync + 'static,
    {
        self.index
            .entry(page_type.into())
            .or_default()
            .push(Arc::new(listener));
        self
    }

    /// Freeze the tables; no listener can be added afterwards
    pub fn build(self) -> HookRegistry {
        HookRegistry {
            diff: self.diff,
            index: self.index,
        }
    }
}

/// Frozen listener tables
#[derive(Default)]
pub struct HookRegistry {
    diff: HashMap<String, Vec<DiffListener>>,
    index: HashMap<String, Vec<IndexListener>>,
}

impl HookRegistry {
    /// Fire the diff event for one page, appending to `lines`
    pub fn diff(&self, page: &Page, lines: &mut Vec<String>) {
        if let Some(listeners) = self.diff.get(&page.page_type) {
            trace!(
                page_type = %page.page_type,
                listeners = listeners.len(),
                "Firing diff listeners"
            );
            for listener in listeners {
                listener(page, lines);
            }
        }
    }

    /// Fire the index event for one page, appending to `texts`
    pub fn index(&self, page: &Page, texts: &mut Vec<SearchText>) {
        if let Some(listeners) = self.index.get(&page.page_type) {
            trace!(
                page_type = %page.page_type,
                listeners = listeners.len(),
                "Firing index listeners"
            );
            for listener in listeners {
                listener(page, texts);
            }
        }
    }

    pub fn diff_lines(&self, page: &Page) -> Vec<String> {
        let mut lines = Vec::new();
        self.diff(page, &mut lines);
        lines
    }

    pub fn search_texts(&self, page: &Page) -> Vec<SearchText> {
        let mut texts = Vec::new();
        self.index(page, &mut texts);
        texts
    }

    /// Types with at least one listener
    pub fn registered_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self
            .diff
            .keys()
            .chain(self.index.keys())
            .map(String::as_str)
            .collect();
        types.sort_unstable();
        types.dedup();
        types
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("types", &self.registered_types())
            .finish()
    }
}
