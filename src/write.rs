//! Write Pipeline
//!
//! Stores one page of a type. New pages are placed in the tree below
//! their parent (slug, path, level, rank) before the behavior hooks and
//! the actual write run.

use crate::error::PageTypeError;
use crate::page::Page;
use crate::page_type::PageType;
use crate::pipeline::{advance, Flow};
use crate::request::RequestContext;
use crate::slug::{join_path, slugify};
use crate::store::PutOptions;
use tracing::info;

#[derive(Debug, Clone, Copy)]
enum WriteStage {
    ForceType,
    Place,
    AssignRank,
    BeforeWrite,
    Write,
    AfterWrite,
}

const WRITE_STAGES: [WriteStage; 6] = [
    WriteStage::ForceType,
    WriteStage::Place,
    WriteStage::AssignRank,
    WriteStage::BeforeWrite,
    WriteStage::Write,
    WriteStage::AfterWrite,
];

struct WriteRun<'a> {
    slug_hint: Option<&'a str>,
    options: &'a PutOptions,
    page: Page,
    /// Set once the page is known to be new and needs a tree position
    placing: bool,
}

fn required<'p, T>(value: &'p Option<T>, what: &str) -> Result<&'p T, PageTypeError> {
    value
        .as_ref()
        .ok_or_else(|| PageTypeError::Configuration(format!("parent page has no {}", what)))
}

impl PageType {
    /// Store a page of this type
    ///
    /// A page with neither `_id` nor `rank` is treated as new and needs
    /// `options.parent`; its slug, path, level and rank are derived from
    /// the parent. Stages run in order and the first failure stops the
    /// rest.
    pub async fn put_one(
        &self,
        ctx: &RequestContext,
        slug_hint: Option<&str>,
        options: &PutOptions,
        page: Page,
    ) -> Result<Page, PageTypeError> {
        let mut run = WriteRun {
            slug_hint,
            options,
            page,
            placing: false,
        };

        for stage in WRITE_STAGES {
            let outcome = self.run_write_stage(stage, ctx, &mut run).await;
            if !advance("put_one", &self.name, stage, outcome)? {
                break;
            }
        }

        info!(
            page_type = %self.name,
            page_id = ?run.page.id,
            slug = ?run.page.slug,
            "Stored page"
        );
        Ok(run.page)
    }

    async fn run_write_stage(
        &self,
        stage: WriteStage,
        ctx: &RequestContext,
        run: &mut WriteRun<'_>,
    ) -> Result<Flow, PageTypeError> {
        match stage {
            WriteStage::ForceType => {
                run.page.page_type = self.name.clone();
            }
            WriteStage::Place => {
                // An id or explicit rank means the caller owns placement
                if run.page.id.is_some() || run.page.rank.is_some() {
                    return Ok(Flow::Continue);
                }
                let parent = run.options.parent.as_ref().ok_or_else(|| {
                    PageTypeError::Configuration(format!(
                        "creating a new '{}' page requires the parent option",
                        self.name
                    ))
                })?;
                let component = slugify(&run.page.title);

                let slug = match (run.slug_hint, run.page.slug.take()) {
                    (Some(hint), _) => hint.to_string(),
                    (None, Some(existing)) => existing,
                    (None, None) => join_path(required(&parent.slug, "slug")?, &component),
                };
                if run.page.path.is_none() {
                    run.page.path = Some(join_path(required(&parent.path, "path")?, &component));
                }
                run.page.slug = Some(slug);
                run.page.level = Some(required(&parent.level, "level")? + 1);
                run.placing = true;
            }
            WriteStage::AssignRank => {
                if run.placing && run.page.rank.is_none() {
                    if let Some(parent) = &run.options.parent {
                        run.page.rank = Some(self.store.next_sibling_rank(parent).await?);
                    }
                }
            }
            WriteStage::BeforeWrite => {
                self.behavior.before_put_one(ctx, &mut run.page).await?;
            }
            WriteStage::Write => {
                // A placed page is always inserted; its hinted slug must be free
                let upsert_key = if run.placing { None } else { run.slug_hint };
                let page = std::mem::take(&mut run.page);
                run.page = self.store.write(upsert_key, run.options, page).await?;
            }
            WriteStage::AfterWrite => {
                self.behavior.after_put_one(ctx, &run.page).await?;
            }
        }
        Ok(Flow::Continue)
    }
}
