//! Page Type
//!
//! One category of page: its identity, its composed schema, the
//! collaborators it stores and indexes through, and the behavior object
//! that customizes it. The query, write and dispatch flows live in their
//! own modules as further `impl PageType` blocks.

use crate::behavior::PageTypeBehavior;
use crate::config::PageTypeConfig;
use crate::error::PageTypeError;
use crate::hooks::HookRegistryBuilder;
use crate::request::RequestContext;
use crate::schema::{Field, SchemaGateway};
use crate::slug::css_name;
use crate::store::PageStore;
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

pub struct PageType {
    pub(crate) name: String,
    pub(crate) label: String,
    pub(crate) plural_label: String,
    pub(crate) css_name: String,
    pub(crate) action: String,
    pub(crate) schema: Vec<Field>,
    pub(crate) orphan: bool,
    pub(crate) greedy: bool,
    pub(crate) child_types: Option<Vec<String>>,
    pub(crate) descendant_types: Option<Vec<String>>,
    pub(crate) renderer_globals: Map<String, Value>,
    pub(crate) store: Arc<dyn PageStore>,
    pub(crate) schemas: Arc<dyn SchemaGateway>,
    pub(crate) behavior: Arc<dyn PageTypeBehavior>,
}

impl PageType {
    /// Build a page type from its declaration
    ///
    /// Fails when `name` or `label` is missing or the schema cannot be
    /// composed.
    pub fn new(
        config: &PageTypeConfig,
        store: Arc<dyn PageStore>,
        schemas: Arc<dyn SchemaGateway>,
        behavior: Arc<dyn PageTypeBehavior>,
    ) -> Result<Self, PageTypeError> {
        if config.name.trim().is_empty() {
            return Err(PageTypeError::Configuration(
                "page type requires a name".to_string(),
            ));
        }
        if config.label.trim().is_empty() {
            return Err(PageTypeError::Configuration(format!(
                "page type '{}' requires a label",
                config.name
            )));
        }

        let schema = schemas.compose_schema(&config.schema)?;
        let css_name = css_name(&config.name);
        let action = format!("/apos-{}", css_name);

        let mut renderer_globals = config.renderer_globals.clone();
        renderer_globals.insert(
            "type".to_string(),
            json!({
                "name": config.name,
                "label": config.label,
                "action": action,
            }),
        );

        debug!(
            page_type = %config.name,
            fields = schema.len(),
            "Constructed page type"
        );

        Ok(Self {
            name: config.name.clone(),
            label: config.label.clone(),
            plural_label: config
                .plural_label
                .clone()
                .unwrap_or_else(|| format!("{}s", config.label)),
            css_name,
            action,
            schema,
            orphan: config.orphan,
            greedy: config.greedy,
            child_types: config.child_types.clone(),
            descendant_types: config.descendant_types.clone(),
            renderer_globals,
            store,
            schemas,
            behavior,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn plural_label(&self) -> &str {
        &self.plural_label
    }

    /// CSS class fragment derived from the name
    pub fn css_name(&self) -> &str {
        &self.css_name
    }

    /// Base path for this type's editing actions
    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn schema(&self) -> &[Field] {
        &self.schema
    }

    pub fn is_orphan(&self) -> bool {
        self.orphan
    }

    pub fn is_greedy(&self) -> bool {
        self.greedy
    }

    pub fn child_types(&self) -> Option<&[String]> {
        self.child_types.as_deref()
    }

    pub fn descendant_types(&self) -> Option<&[String]> {
        self.descendant_types.as_deref()
    }

    /// Whether a page of `child_type` may be created directly below this type
    pub fn allows_child(&self, child_type: &str) -> bool {
        self.child_types
            .as_ref()
            .map(|types| types.iter().any(|t| t == child_type))
            .unwrap_or(true)
    }

    /// Values visible to every template rendered for this type
    pub fn renderer_globals(&self) -> &Map<String, Value> {
        &self.renderer_globals
    }

    /// Sanitize submitted page settings; never trusts raw input
    pub fn sanitize_settings(
        &self,
        ctx: &RequestContext,
        raw: &Map<String, Value>,
    ) -> Result<Map<String, Value>, PageTypeError> {
        self.schemas
            .convert_submitted_fields(ctx, &self.schema, raw)
    }

    /// Attach this type's diff and index listeners
    pub(crate) fn register_hooks(self: &Arc<Self>, hooks: &mut HookRegistryBuilder) {
        let this = Arc::clone(self);
        hooks.on_diff(self.name.clone(), move |page, lines| {
            this.behavior.add_diff_lines(page, lines);
        });

        let this = Arc::clone(self);
        hooks.on_index(self.name.clone(), move |page, texts| {
            this.schemas.index_fields(&this.schema, page, texts);
            this.behavior.add_search_texts(page, texts);
        });
    }
}

impl fmt::Debug for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageType")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("action", &self.action)
            .field("fields", &self.schema.len())
            .field("greedy", &self.greedy)
            .finish()
    }
}
