//! Page type registry and site assembly.
//!
//! `SiteBuilder` registers page types and their hook listeners at
//! startup. `build` freezes both tables into a `Site`, which is then
//! shared read-only between requests.

use crate::behavior::{DefaultBehavior, PageTypeBehavior};
use crate::config::PageTypeConfig;
use crate::error::PageTypeError;
use crate::hooks::{HookRegistry, HookRegistryBuilder, SearchText};
use crate::page::Page;
use crate::page_type::PageType;
use crate::router::Router;
use crate::schema::SchemaGateway;
use crate::store::PageStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Registered page types, in registration order
#[derive(Debug, Default)]
pub struct PageTypeRegistry {
    types: Vec<Arc<PageType>>,
    by_name: HashMap<String, usize>,
}

impl PageTypeRegistry {
    fn register(&mut self, page_type: Arc<PageType>) -> Result<(), PageTypeError> {
        if self.by_name.contains_key(page_type.name()) {
            return Err(PageTypeError::Configuration(format!(
                "page type '{}' is already registered",
                page_type.name()
            )));
        }
        self.by_name
            .insert(page_type.name().to_string(), self.types.len());
        self.types.push(page_type);
        Ok(())
    }

    /// Look up a page type by name
    pub fn get(&self, name: &str) -> Option<&Arc<PageType>> {
        self.by_name.get(name).map(|&i| &self.types[i])
    }

    pub fn get_or_error(&self, name: &str) -> Result<&Arc<PageType>, PageTypeError> {
        self.get(name)
            .ok_or_else(|| PageTypeError::Configuration(format!("Unknown page type: {}", name)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PageType>> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Startup-time assembly of a site
pub struct SiteBuilder {
    store: Arc<dyn PageStore>,
    schemas: Arc<dyn SchemaGateway>,
    registry: PageTypeRegistry,
    hooks: HookRegistryBuilder,
    behaviors: HashMap<String, Arc<dyn PageTypeBehavior>>,
}

impl SiteBuilder {
    pub fn new(store: Arc<dyn PageStore>, schemas: Arc<dyn SchemaGateway>) -> Self {
        Self {
            store,
            schemas,
            registry: PageTypeRegistry::default(),
            hooks: HookRegistryBuilder::new(),
            behaviors: HashMap::new(),
        }
    }

    /// Behavior used for the configured type `name` instead of the defaults
    pub fn behavior(
        mut self,
        name: impl Into<String>,
        behavior: Arc<dyn PageTypeBehavior>,
    ) -> Self {
        self.behaviors.insert(name.into(), behavior);
        self
    }

    /// Construct and register one page type along with its hook listeners
    pub fn add_type(
        &mut self,
        config: &PageTypeConfig,
        behavior: Arc<dyn PageTypeBehavior>,
    ) -> Result<Arc<PageType>, PageTypeError> {
        let page_type = Arc::new(PageType::new(
            config,
            self.store.clone(),
            self.schemas.clone(),
            behavior,
        )?);
        self.registry.register(page_type.clone())?;
        page_type.register_hooks(&mut self.hooks);
        info!(page_type = %page_type.name(), "Registered page type");
        Ok(page_type)
    }

    /// Register every declared type, using the behavior set for its name if any
    pub fn add_configured_types(
        &mut self,
        configs: &[PageTypeConfig],
    ) -> Result<(), PageTypeError> {
        for config in configs {
            let behavior = self
                .behaviors
                .get(&config.name)
                .cloned()
                .unwrap_or_else(|| Arc::new(DefaultBehavior) as Arc<dyn PageTypeBehavior>);
            self.add_type(config, behavior)?;
        }
        Ok(())
    }

    pub fn build(self) -> Site {
        Site {
            registry: Arc::new(self.registry),
            hooks: Arc::new(self.hooks.build()),
            store: self.store,
        }
    }
}

/// Frozen registry and hook tables plus the store they work against
#[derive(Clone)]
pub struct Site {
    registry: Arc<PageTypeRegistry>,
    hooks: Arc<HookRegistry>,
    store: Arc<dyn PageStore>,
}

impl Site {
    pub fn registry(&self) -> &PageTypeRegistry {
        &self.registry
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn store(&self) -> &Arc<dyn PageStore> {
        &self.store
    }

    pub fn page_type(&self, name: &str) -> Option<&Arc<PageType>> {
        self.registry.get(name)
    }

    /// Diff lines contributed by the listeners of the page's type
    pub fn diff_lines(&self, page: &Page) -> Vec<String> {
        self.hooks.diff_lines(page)
    }

    /// Search texts contributed by the listeners of the page's type
    pub fn search_texts(&self, page: &Page) -> Vec<SearchText> {
        self.hooks.search_texts(page)
    }

    pub fn router(&self) -> Router {
        Router::new(self.registry.clone(), self.store.clone())
    }
}

impl std::fmt::Debug for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Site")
            .field("types", &self.registry.len())
            .field("hooks", &self.hooks)
            .finish()
    }
}
