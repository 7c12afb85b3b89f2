//! Page documents
//!
//! A page is a persisted document with a fixed set of tree and identity
//! properties plus whatever fields its type's schema defines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Page identity as assigned by the persistence layer
pub type PageId = String;

/// Persisted page document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PageId>,

    /// Name of the page type that owns this page
    #[serde(rename = "type", default)]
    pub page_type: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    /// Tree path; the parent's path plus one component
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Depth in the page tree (home page is 0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,

    /// Order among siblings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<i64>,

    #[serde(
        rename = "sortTitle",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sort_title: Option<String>,

    /// Permalink, filled in by queries; not meaningful in storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(
        rename = "updatedAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,

    /// Schema-defined fields
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Page {
    /// Create an unsaved page with a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Build a tree node usable as a parent: slug, path and level set
    pub fn tree_node(slug: impl Into<String>, path: impl Into<String>, level: u32) -> Self {
        Self {
            slug: Some(slug.into()),
            path: Some(path.into()),
            level: Some(level),
            ..Self::default()
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// JSON form of the page, as criteria and sorts see it
    pub fn to_document(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn from_document(doc: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(doc)
    }
}

/// Look up a dotted path (`address.city`) inside a JSON document
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(doc, |current, key| current.as_object()?.get(key))
}
