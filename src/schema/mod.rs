//! Schema Gateway
//!
//! Field schemas describe the type-specific properties of a page. The
//! page type core never interprets fields itself; it hands the schema to a
//! `SchemaGateway` to compose, sanitize, join and index.

pub mod basic;

pub use basic::BasicSchemaGateway;

use crate::error::PageTypeError;
use crate::hooks::SearchText;
use crate::page::Page;
use crate::request::RequestContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field kinds understood by the schema gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Select,
    Tags,
    Url,
    Area,
    JoinByOne,
    JoinByArray,
}

impl FieldType {
    pub fn is_join(self) -> bool {
        matches!(self, FieldType::JoinByOne | FieldType::JoinByArray)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub value: String,
    #[serde(default)]
    pub label: String,
}

/// One field descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,

    #[serde(default)]
    pub label: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default)]
    pub required: bool,

    /// Default value used when submitted data is missing or unusable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub def: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,

    /// Search weight for indexed text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,

    /// Indexed but not shown in search summaries
    #[serde(default)]
    pub silent: bool,

    /// Page type a join points at
    #[serde(default, alias = "with_type", skip_serializing_if = "Option::is_none")]
    pub with_type: Option<String>,

    /// Property holding the joined id (joinByOne)
    #[serde(default, alias = "id_field", skip_serializing_if = "Option::is_none")]
    pub id_field: Option<String>,

    /// Property holding the joined ids (joinByArray)
    #[serde(default, alias = "ids_field", skip_serializing_if = "Option::is_none")]
    pub ids_field: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            field_type,
            required: false,
            def: None,
            choices: Vec::new(),
            weight: None,
            silent: false,
            with_type: None,
            id_field: None,
            ids_field: None,
        }
    }

    pub fn join_by_one(
        name: impl Into<String>,
        with_type: impl Into<String>,
        id_field: impl Into<String>,
    ) -> Self {
        let mut field = Self::new(name, FieldType::JoinByOne);
        field.with_type = Some(with_type.into());
        field.id_field = Some(id_field.into());
        field
    }

    pub fn join_by_array(
        name: impl Into<String>,
        with_type: impl Into<String>,
        ids_field: impl Into<String>,
    ) -> Self {
        let mut field = Self::new(name, FieldType::JoinByArray);
        field.with_type = Some(with_type.into());
        field.ids_field = Some(ids_field.into());
        field
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn def(mut self, value: Value) -> Self {
        self.def = Some(value);
        self
    }

    pub fn weight(mut self, weight: u32) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    pub fn choices(mut self, values: &[&str]) -> Self {
        self.choices = values
            .iter()
            .map(|v| Choice {
                value: v.to_string(),
                label: v.to_string(),
            })
            .collect();
        self
    }
}

/// Schema-related part of a page type's configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaConfig {
    #[serde(default, alias = "add_fields")]
    pub add_fields: Vec<Field>,

    #[serde(default, alias = "remove_fields")]
    pub remove_fields: Vec<String>,
}

/// Which joins a query should resolve
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum JoinSelector {
    /// Every join in the schema
    #[default]
    All,
    /// Only the named join fields
    Only(Vec<String>),
    /// No joins at all
    None,
}

impl JoinSelector {
    pub fn includes(&self, field: &str) -> bool {
        match self {
            JoinSelector::All => true,
            JoinSelector::Only(names) => names.iter().any(|n| n == field),
            JoinSelector::None => false,
        }
    }
}

/// Schema engine consumed by page types
#[async_trait]
pub trait SchemaGateway: Send + Sync {
    /// Build the ordered field list for a page type
    fn compose_schema(&self, config: &SchemaConfig) -> Result<Vec<Field>, PageTypeError>;

    /// Load joined pages into the join fields of `pages`
    async fn resolve_joins(
        &self,
        ctx: &RequestContext,
        schema: &[Field],
        pages: &mut [Page],
        selector: &JoinSelector,
    ) -> Result<(), PageTypeError>;

    /// Sanitize submitted form data into schema fields
    fn convert_submitted_fields(
        &self,
        ctx: &RequestContext,
        schema: &[Field],
        raw: &Map<String, Value>,
    ) -> Result<Map<String, Value>, PageTypeError>;

    /// Append search texts for the page's schema fields
    fn index_fields(&self, schema: &[Field], page: &Page, texts: &mut Vec<SearchText>);
}
