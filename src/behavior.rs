//! Page type behavior
//!
//! Every override point a page type offers lives on `PageTypeBehavior`.
//! A type is constructed with one behavior object; methods it does not
//! implement fall back to the defaults documented here.

use crate::error::PageTypeError;
use crate::hooks::SearchText;
use crate::page::Page;
use crate::page_type::PageType;
use crate::request::{ContextMenuItem, DispatchOutcome, RequestContext};
use async_trait::async_trait;

#[async_trait]
pub trait PageTypeBehavior: Send + Sync {
    /// Append diff-friendly lines describing type-specific metadata.
    ///
    /// Title, slug and the other common page properties are already
    /// covered by the host. Default: nothing.
    fn add_diff_lines(&self, _page: &Page, _lines: &mut Vec<String>) {}

    /// Append custom search texts, e.g. `SearchText::new(20, address)`.
    ///
    /// Schema fields are indexed before this runs, so only metadata the
    /// schema does not cover belongs here. Default: nothing.
    fn add_search_texts(&self, _page: &Page, _texts: &mut Vec<SearchText>) {}

    /// Context menu installed when an editor views a page of this type.
    /// Default: none, the host's standard menu applies.
    fn context_menu(
        &self,
        _page_type: &PageType,
        _page: &Page,
    ) -> Option<Vec<ContextMenuItem>> {
        None
    }

    /// Decide the response for a page of this type.
    ///
    /// `ctx.page` holds the joined page and `ctx.remainder` whatever part
    /// of the URL followed its slug. Default: render the template named
    /// after the type, whatever the remainder.
    async fn dispatch(
        &self,
        page_type: &PageType,
        _ctx: &RequestContext,
    ) -> Result<DispatchOutcome, PageTypeError> {
        Ok(DispatchOutcome::Render {
            template: page_type.name().to_string(),
        })
    }

    /// Runs after tree placement, right before the page is stored.
    async fn before_put_one(
        &self,
        _ctx: &RequestContext,
        _page: &mut Page,
    ) -> Result<(), PageTypeError> {
        Ok(())
    }

    /// Runs after the page is stored.
    async fn after_put_one(
        &self,
        _ctx: &RequestContext,
        _page: &Page,
    ) -> Result<(), PageTypeError> {
        Ok(())
    }
}

/// Behavior with every default in place
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBehavior;

#[async_trait]
impl PageTypeBehavior for DefaultBehavior {}
