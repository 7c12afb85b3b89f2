//! Query Composer
//!
//! Fetches pages of one type: scopes caller criteria to the type, then
//! runs the fetch, join and permalink stages in order.

use crate::error::PageTypeError;
use crate::page::Page;
use crate::page_type::PageType;
use crate::pipeline::{advance, Flow};
use crate::request::RequestContext;
use crate::store::{Criteria, QueryOptions, QueryResult, SortKey};

pub use crate::store::PageSet;

/// Sort applied when the caller does not choose one
pub const DEFAULT_SORT_FIELD: &str = "sortTitle";

#[derive(Debug, Clone, Copy)]
enum QueryStage {
    Fetch,
    Join,
    Permalink,
}

const QUERY_STAGES: [QueryStage; 3] = [QueryStage::Fetch, QueryStage::Join, QueryStage::Permalink];

struct QueryRun {
    criteria: Criteria,
    options: QueryOptions,
    result: Option<QueryResult>,
}

impl PageType {
    /// Criteria actually sent to storage: the caller's criteria AND the type filter
    pub fn scoped_criteria(&self, user_criteria: Criteria) -> Criteria {
        Criteria::and(vec![user_criteria, Criteria::eq("type", self.name.as_str())])
    }

    /// Fetch pages of this type
    ///
    /// Results are sorted by title unless `options.sort` is set. Joins
    /// named by `options.with_joins` are resolved and every page's `url`
    /// is set from its slug. A distinct-values query returns the values
    /// untouched. Any failure aborts the whole call.
    pub async fn get(
        &self,
        ctx: &RequestContext,
        user_criteria: Criteria,
        mut options: QueryOptions,
    ) -> Result<QueryResult, PageTypeError> {
        if options.sort.is_none() {
            options.sort = Some(vec![SortKey::ascending(DEFAULT_SORT_FIELD)]);
        }

        let mut run = QueryRun {
            criteria: self.scoped_criteria(user_criteria),
            options,
            result: None,
        };

        for stage in QUERY_STAGES {
            let outcome = self.run_query_stage(stage, ctx, &mut run).await;
            if !advance("query", &self.name, stage, outcome)? {
                break;
            }
        }

        Ok(run
            .result
            .unwrap_or_else(|| QueryResult::Pages(PageSet::default())))
    }

    /// Fetch the first matching page of this type, or `None`
    pub async fn get_one(
        &self,
        ctx: &RequestContext,
        criteria: Criteria,
        mut options: QueryOptions,
    ) -> Result<Option<Page>, PageTypeError> {
        options.limit = Some(1);
        if options.skip.is_none() {
            options.skip = Some(0);
        }
        let result = self.get(ctx, criteria, options).await?;
        Ok(result.into_pages().into_iter().next())
    }

    async fn run_query_stage(
        &self,
        stage: QueryStage,
        ctx: &RequestContext,
        run: &mut QueryRun,
    ) -> Result<Flow, PageTypeError> {
        match stage {
            QueryStage::Fetch => {
                let result = self.store.query(&run.criteria, &run.options).await?;
                run.result = Some(result);
                Ok(Flow::Continue)
            }
            QueryStage::Join => match run.result.as_mut() {
                Some(QueryResult::Pages(set)) => {
                    self.schemas
                        .resolve_joins(ctx, &self.schema, &mut set.pages, &run.options.with_joins)
                        .await?;
                    Ok(Flow::Continue)
                }
                // Distinct values are never join-expanded or permalinked
                _ => Ok(Flow::Finish),
            },
            QueryStage::Permalink => {
                if let Some(QueryResult::Pages(set)) = run.result.as_mut() {
                    for page in &mut set.pages {
                        page.url = page.slug.clone();
                    }
                }
                Ok(Flow::Continue)
            }
        }
    }
}
