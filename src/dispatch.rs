//! Dispatch Loader
//!
//! Runs once per request after the host located the best-matching page
//! for the URL. Decides whether this type handles the request, resolves
//! the page's joins and lets the behavior's dispatch policy settle the
//! outcome.

use crate::error::PageTypeError;
use crate::page::Page;
use crate::page_type::PageType;
use crate::request::{DispatchOutcome, RequestContext};
use crate::schema::JoinSelector;
use tracing::{debug, trace, warn};

/// Why a loader left a request alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No page matched the whole URL and the type is not greedy
    NoPage,
    /// The host found no candidate page at all
    NoCandidate,
    /// The candidate belongs to another type
    OtherType,
}

/// Loader state machine
#[derive(Debug, Clone, PartialEq)]
pub enum LoaderState {
    Skip(SkipReason),
    /// Candidate accepted; joins not yet resolved
    JoinPending(Box<Page>),
    /// Joined page bound to the request; waiting on the dispatch policy
    Dispatching,
    Done(DispatchOutcome),
}

impl LoaderState {
    pub fn is_skip(&self) -> bool {
        matches!(self, LoaderState::Skip(_))
    }

    pub fn outcome(&self) -> Option<&DispatchOutcome> {
        match self {
            LoaderState::Done(outcome) => Some(outcome),
            _ => None,
        }
    }
}

impl PageType {
    /// Loader entry point
    ///
    /// Returns `Skip` when the request is not for this type, `Done` with
    /// the settled outcome otherwise. On a dispatch policy error the
    /// request is settled as not found before the error is returned.
    pub async fn loader(&self, ctx: &mut RequestContext) -> Result<LoaderState, PageTypeError> {
        let mut state = self.accept_candidate(ctx);
        loop {
            state = match state {
                LoaderState::Skip(reason) => {
                    trace!(page_type = %self.name, path = %ctx.path, ?reason, "Loader skipped");
                    return Ok(LoaderState::Skip(reason));
                }
                LoaderState::JoinPending(candidate) => {
                    let mut pages = vec![*candidate];
                    self.schemas
                        .resolve_joins(ctx, &self.schema, &mut pages, &JoinSelector::All)
                        .await?;
                    ctx.page = pages.pop();
                    LoaderState::Dispatching
                }
                LoaderState::Dispatching => match self.behavior.dispatch(self, ctx).await {
                    Ok(outcome) => {
                        debug!(page_type = %self.name, path = %ctx.path, ?outcome, "Dispatched");
                        ctx.outcome = Some(outcome.clone());
                        LoaderState::Done(outcome)
                    }
                    Err(e) => {
                        warn!(
                            page_type = %self.name,
                            path = %ctx.path,
                            error = %e,
                            "Dispatch failed"
                        );
                        ctx.outcome = Some(DispatchOutcome::NotFound);
                        return Err(e);
                    }
                },
                done @ LoaderState::Done(_) => return Ok(done),
            };
        }
    }

    /// First transition: decide whether the candidate page is ours
    fn accept_candidate(&self, ctx: &mut RequestContext) -> LoaderState {
        if !self.greedy && ctx.page.is_none() {
            return LoaderState::Skip(SkipReason::NoPage);
        }
        let candidate = match &ctx.best_page {
            Some(candidate) => candidate,
            None => return LoaderState::Skip(SkipReason::NoCandidate),
        };
        if candidate.page_type != self.name {
            return LoaderState::Skip(SkipReason::OtherType);
        }

        let candidate = candidate.clone();
        if ctx.can_edit() {
            if let Some(menu) = self.behavior.context_menu(self, &candidate) {
                ctx.context_menu = Some(menu);
            }
        }
        LoaderState::JoinPending(Box::new(candidate))
    }
}
