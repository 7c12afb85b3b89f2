//! Configuration System
//!
//! Layered site configuration: built-in defaults, the user's global file,
//! the site's own files, then `PAGETYPE__*` environment variables. Page
//! types are declared here and built into a `Site` at startup.

use crate::error::PageTypeError;
use crate::logging::LoggingConfig;
use crate::schema::SchemaConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

mod merge;
mod sources;

pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Page type declarations, in registration order
    #[serde(default, alias = "pageTypes")]
    pub page_types: Vec<PageTypeConfig>,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory of the sled page database, relative to the site root
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".pagetype/pages")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Declaration of one page type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageTypeConfig {
    /// Unique type name stored in each page's `type`
    #[serde(default)]
    pub name: String,

    /// Human-readable label
    #[serde(default)]
    pub label: String,

    #[serde(default, alias = "pluralLabel", skip_serializing_if = "Option::is_none")]
    pub plural_label: Option<String>,

    /// Leave pages of this type out of navigation
    #[serde(default)]
    pub orphan: bool,

    /// Run the loader even when no page matched the whole URL
    #[serde(default)]
    pub greedy: bool,

    #[serde(default, alias = "childTypes", skip_serializing_if = "Option::is_none")]
    pub child_types: Option<Vec<String>>,

    #[serde(
        default,
        alias = "descendantTypes",
        skip_serializing_if = "Option::is_none"
    )]
    pub descendant_types: Option<Vec<String>>,

    /// Extra values visible to every template rendered for this type
    #[serde(default, alias = "rendererGlobals", skip_serializing_if = "Map::is_empty")]
    pub renderer_globals: Map<String, Value>,

    #[serde(flatten)]
    pub schema: SchemaConfig,
}

impl PageTypeConfig {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must be set".to_string());
        }
        if self.label.trim().is_empty() {
            return Err("label must be set".to_string());
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    PageType(String, String),
    Storage(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::PageType(name, msg) => {
                write!(f, "Page type '{}': {}", name, msg)
            }
            ValidationError::Storage(msg) => {
                write!(f, "Storage: {}", msg)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl SiteConfig {
    /// Validate the entire configuration, collecting every problem
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.storage.path.as_os_str().is_empty() {
            errors.push(ValidationError::Storage(
                "Store path cannot be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for (index, page_type) in self.page_types.iter().enumerate() {
            let display_name = if page_type.name.is_empty() {
                format!("#{}", index)
            } else {
                page_type.name.clone()
            };
            if let Err(e) = page_type.validate() {
                errors.push(ValidationError::PageType(display_name.clone(), e));
            }
            if !page_type.name.is_empty() && !seen.insert(page_type.name.as_str()) {
                errors.push(ValidationError::PageType(
                    display_name,
                    "Duplicate page type name".to_string(),
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Store path resolved against the site root
    pub fn store_path(&self, site_root: &Path) -> PathBuf {
        if self.storage.path.is_absolute() {
            self.storage.path.clone()
        } else {
            site_root.join(&self.storage.path)
        }
    }
}

/// Loads `SiteConfig` from layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the site rooted at `site_root`
    ///
    /// Precedence (highest last): defaults, global file, `config/pagetype.toml`,
    /// `config/{PAGETYPE_ENV}.toml`, `PAGETYPE__*` environment variables.
    pub fn load(site_root: &Path) -> Result<SiteConfig, PageTypeError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::site_file::add_to_builder(builder, site_root)?;
        let builder = sources::environment::add_to_builder(builder);
        Self::finish(builder)
    }

    /// Load configuration from a single explicit file (plus environment)
    pub fn load_from_file(path: &Path) -> Result<SiteConfig, PageTypeError> {
        if !path.exists() {
            return Err(PageTypeError::Configuration(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let builder = merge::merge_policy::builder_with_defaults()?
            .add_source(config::File::from(path.to_path_buf()).required(true));
        let builder = sources::environment::add_to_builder(builder);
        Self::finish(builder)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<SiteConfig, PageTypeError> {
        let config: SiteConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            PageTypeError::Configuration(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(config)
    }
}
