//! CLI route: single route table and run context. Dispatches to the site and presentation.

use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_created, format_diff_lines, format_outcome, format_pages, format_search_texts,
    format_types,
};
use crate::config::{ConfigLoader, SiteConfig};
use crate::error::{PageTypeError, StorageError};
use crate::page::Page;
use crate::registry::{Site, SiteBuilder};
use crate::request::{Actor, RequestContext};
use crate::schema::BasicSchemaGateway;
use crate::store::{Criteria, PageStore, PutOptions, QueryOptions, SledPageStore};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

/// Type given to the home page when the site has none yet
const HOME_TYPE: &str = "home";

/// Runtime context for CLI execution: site root, config and the assembled site.
/// Built from the site root and optional config path using ConfigLoader only.
pub struct RunContext {
    site_root: PathBuf,
    config: SiteConfig,
    store: Arc<SledPageStore>,
    site: Site,
    runtime: Runtime,
}

/// Split `key=value`; the value is read as JSON when it parses, else as a string
fn parse_field(raw: &str) -> Result<(String, Value), PageTypeError> {
    let (key, value) = raw.split_once('=').ok_or_else(|| {
        PageTypeError::validation(raw, "expected KEY=VALUE")
    })?;
    let key = key.trim();
    if key.is_empty() {
        return Err(PageTypeError::validation(raw, "field name is empty"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

impl RunContext {
    /// Create run context from site root and optional config path.
    pub fn new(site_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, PageTypeError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&site_root)?
        };

        let store_path = config.store_path(&site_root);
        std::fs::create_dir_all(&store_path).map_err(StorageError::IoError)?;
        let store = Arc::new(SledPageStore::new(&store_path)?);
        let schemas = Arc::new(BasicSchemaGateway::new(store.clone()));

        let mut builder = SiteBuilder::new(store.clone(), schemas);
        builder.add_configured_types(&config.page_types)?;
        let site = builder.build();

        let runtime = Runtime::new().map_err(|e| {
            PageTypeError::Configuration(format!("Failed to start async runtime: {}", e))
        })?;

        debug!(root = %site_root.display(), store = %store_path.display(), "Site opened");
        Ok(Self {
            site_root,
            config,
            store,
            site,
            runtime,
        })
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn site_root(&self) -> &PathBuf {
        &self.site_root
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, PageTypeError> {
        let started = Instant::now();
        let result = self.execute_inner(command);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => info!(command = command.name(), elapsed_ms, "Command finished"),
            Err(e) => warn!(command = command.name(), elapsed_ms, error = %e, "Command failed"),
        }
        if matches!(command, Commands::Create { .. }) {
            self.store.flush()?;
        }
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, PageTypeError> {
        match command {
            Commands::Types { format } => {
                let types: Vec<_> = self.site.registry().iter().cloned().collect();
                format_types(&types, format)
            }
            Commands::List {
                page_type,
                limit,
                format,
            } => self.handle_list(page_type, *limit, format),
            Commands::Create {
                page_type,
                title,
                parent,
                slug,
                fields,
            } => self.handle_create(page_type, title, parent, slug.as_deref(), fields),
            Commands::Serve {
                path,
                editor,
                format,
            } => {
                let actor = if *editor {
                    Actor::editor("cli")
                } else {
                    Actor::visitor("cli")
                };
                let ctx = self
                    .runtime
                    .block_on(self.site.router().serve(path, Some(actor)))?;
                format_outcome(&ctx, format)
            }
            Commands::Index { slug } => Ok(match self.find_by_slug(slug)? {
                Some(page) => format_search_texts(&self.site.search_texts(&page)),
                None => format!("No page at {}", slug),
            }),
            Commands::Diff { slug } => Ok(match self.find_by_slug(slug)? {
                Some(page) => format_diff_lines(&self.site.diff_lines(&page)),
                None => format!("No page at {}", slug),
            }),
            Commands::Config => toml::to_string_pretty(&self.config).map_err(|e| {
                PageTypeError::Configuration(format!("Failed to render configuration: {}", e))
            }),
        }
    }

    fn handle_list(
        &self,
        page_type: &str,
        limit: Option<usize>,
        format: &str,
    ) -> Result<String, PageTypeError> {
        let page_type = self.site.registry().get_or_error(page_type)?;
        let options = QueryOptions {
            limit,
            ..QueryOptions::default()
        };
        let result = self.runtime.block_on(page_type.get(
            &RequestContext::task(),
            Criteria::All,
            options,
        ))?;
        format_pages(result.pages(), format)
    }

    fn handle_create(
        &self,
        type_name: &str,
        title: &str,
        parent_slug: &str,
        slug: Option<&str>,
        raw_fields: &[String],
    ) -> Result<String, PageTypeError> {
        let page_type = self.site.registry().get_or_error(type_name)?;
        let ctx = RequestContext::task();

        let parent = match self.find_by_slug(parent_slug)? {
            Some(parent) => parent,
            None if parent_slug == "/" => self.ensure_home(&ctx)?,
            None => {
                return Err(PageTypeError::Configuration(format!(
                    "Parent page not found: {}",
                    parent_slug
                )))
            }
        };
        if let Some(parent_type) = self.site.page_type(&parent.page_type) {
            if !parent_type.allows_child(type_name) {
                return Err(PageTypeError::Configuration(format!(
                    "'{}' pages cannot be created below '{}' pages",
                    type_name, parent.page_type
                )));
            }
        }

        let mut raw = Map::new();
        for field in raw_fields {
            let (key, value) = parse_field(field)?;
            raw.insert(key, value);
        }
        let mut page = Page::new(title);
        page.fields = page_type.sanitize_settings(&ctx, &raw)?;

        let saved = self.runtime.block_on(page_type.put_one(
            &ctx,
            slug,
            &PutOptions::under(parent),
            page,
        ))?;
        Ok(format_created(&saved))
    }

    /// Create the home page on first use, through the registered home type
    fn ensure_home(&self, ctx: &RequestContext) -> Result<Page, PageTypeError> {
        let home_type = self.site.page_type(HOME_TYPE).ok_or_else(|| {
            PageTypeError::Configuration(format!(
                "No page at / and no '{}' page type to create one",
                HOME_TYPE
            ))
        })?;
        let mut home = Page::tree_node("/", "/", 0);
        home.title = "Home".to_string();
        home.rank = Some(0);
        info!("Creating home page");
        self.runtime
            .block_on(home_type.put_one(ctx, None, &PutOptions::default(), home))
    }

    fn find_by_slug(&self, slug: &str) -> Result<Option<Page>, PageTypeError> {
        let options = QueryOptions::default().limit(1);
        let result = self
            .runtime
            .block_on(self.store.query(&Criteria::eq("slug", slug), &options))?;
        Ok(result.into_pages().into_iter().next())
    }
}
