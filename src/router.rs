//! Host-side request routing.
//!
//! Locates the page for a URL path and gives every registered page type a
//! chance to handle it through its loader.

use crate::error::PageTypeError;
use crate::page::Page;
use crate::registry::PageTypeRegistry;
use crate::request::{Actor, DispatchOutcome, RequestContext};
use crate::store::{Criteria, PageStore, QueryOptions};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct Router {
    registry: Arc<PageTypeRegistry>,
    store: Arc<dyn PageStore>,
}

/// Strip the query string and any trailing slash; the home page stays "/"
fn normalize(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// The path itself and every `/`-bounded prefix of it, longest first
fn slug_candidates(path: &str) -> Vec<String> {
    let mut candidates = vec![path.to_string()];
    let mut rest = path;
    while let Some(pos) = rest.rfind('/') {
        rest = &rest[..pos];
        if rest.is_empty() {
            break;
        }
        candidates.push(rest.to_string());
    }
    if path != "/" {
        candidates.push("/".to_string());
    }
    candidates
}

/// Part of `path` after `slug`, always starting with '/' unless empty
fn remainder(path: &str, slug: &str) -> String {
    if slug == "/" {
        if path == "/" {
            String::new()
        } else {
            path.to_string()
        }
    } else {
        path[slug.len()..].to_string()
    }
}

impl Router {
    pub fn new(registry: Arc<PageTypeRegistry>, store: Arc<dyn PageStore>) -> Self {
        Self { registry, store }
    }

    /// Page with the longest slug among the candidates for `path`
    async fn best_page(&self, path: &str) -> Result<Option<Page>, PageTypeError> {
        let candidates = slug_candidates(path);
        let criteria = Criteria::any_of(
            "slug",
            candidates.iter().cloned().map(Value::String).collect(),
        );
        let result = self.store.query(&criteria, &QueryOptions::default()).await?;
        Ok(result
            .into_pages()
            .into_iter()
            .max_by_key(|page| page.slug.as_ref().map(String::len).unwrap_or(0)))
    }

    /// Answer a request for `path`
    ///
    /// Loaders run in registration order until one settles an outcome.
    /// A request nobody settles is answered with `NotFound`.
    #[instrument(skip(self, actor))]
    pub async fn serve(
        &self,
        path: &str,
        actor: Option<Actor>,
    ) -> Result<RequestContext, PageTypeError> {
        let path = normalize(path);
        let mut ctx = RequestContext::new(path.clone());
        ctx.actor = actor;

        if let Some(best) = self.best_page(&path).await? {
            let slug = best.slug.clone().unwrap_or_default();
            if slug == path {
                ctx.page = Some(best.clone());
            }
            ctx.remainder = remainder(&path, &slug);
            ctx.best_page = Some(best);
        }

        for page_type in self.registry.iter() {
            let state = page_type.loader(&mut ctx).await?;
            if !state.is_skip() {
                debug!(page_type = %page_type.name(), "Request handled");
                break;
            }
        }

        if ctx.outcome.is_none() {
            ctx.outcome = Some(DispatchOutcome::NotFound);
        }
        Ok(ctx)
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("types", &self.registry.len())
            .finish()
    }
}
