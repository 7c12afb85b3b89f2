//! Reference schema gateway
//!
//! Small, self-contained implementation of the schema engine: enough for
//! hosts that have no schema engine of their own, and for tests.

use crate::error::PageTypeError;
use crate::hooks::SearchText;
use crate::page::Page;
use crate::request::RequestContext;
use crate::schema::{Field, FieldType, JoinSelector, SchemaConfig, SchemaGateway};
use crate::store::{Criteria, PageStore, QueryOptions};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Weight given to indexed field text when the field sets none
pub const DEFAULT_FIELD_WEIGHT: u32 = 15;

pub struct BasicSchemaGateway {
    store: Arc<dyn PageStore>,
}

impl BasicSchemaGateway {
    /// Joins are resolved against `store`
    pub fn new(store: Arc<dyn PageStore>) -> Self {
        Self { store }
    }

    async fn load_joined(
        &self,
        with_type: &str,
        ids: Vec<Value>,
    ) -> Result<HashMap<String, Page>, PageTypeError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let criteria = Criteria::and(vec![
            Criteria::eq("type", with_type),
            Criteria::any_of("_id", ids),
        ]);
        let result = self
            .store
            .query(&criteria, &QueryOptions::default())
            .await
            .map_err(|e| PageTypeError::Join(e.to_string()))?;
        Ok(result
            .into_pages()
            .into_iter()
            .filter_map(|page| page.id.clone().map(|id| (id, page)))
            .collect())
    }
}

fn join_target<'a>(field: &'a Field) -> Result<(&'a str, &'a str), PageTypeError> {
    let with_type = field.with_type.as_deref().ok_or_else(|| {
        PageTypeError::Join(format!("join field '{}' has no withType", field.name))
    })?;
    let key = match field.field_type {
        FieldType::JoinByOne => field.id_field.as_deref(),
        _ => field.ids_field.as_deref(),
    }
    .ok_or_else(|| {
        PageTypeError::Join(format!("join field '{}' has no id property", field.name))
    })?;
    Ok((with_type, key))
}

/// Ids referenced by one page through a join property
fn referenced_ids(page: &Page, key: &str) -> Vec<String> {
    match page.field(key) {
        Some(Value::String(id)) => vec![id.clone()],
        Some(Value::Array(ids)) => ids
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

#[async_trait]
impl SchemaGateway for BasicSchemaGateway {
    fn compose_schema(&self, config: &SchemaConfig) -> Result<Vec<Field>, PageTypeError> {
        let mut schema: Vec<Field> = Vec::new();
        for field in &config.add_fields {
            if field.name.is_empty() {
                return Err(PageTypeError::Configuration(
                    "schema field without a name".to_string(),
                ));
            }
            match schema.iter_mut().find(|f| f.name == field.name) {
                Some(existing) => *existing = field.clone(),
                None => schema.push(field.clone()),
            }
        }
        schema.retain(|f| !config.remove_fields.contains(&f.name));
        Ok(schema)
    }

    async fn resolve_joins(
        &self,
        _ctx: &RequestContext,
        schema: &[Field],
        pages: &mut [Page],
        selector: &JoinSelector,
    ) -> Result<(), PageTypeError> {
        for field in schema.iter().filter(|f| f.field_type.is_join()) {
            if !selector.includes(&field.name) {
                continue;
            }
            let (with_type, key) = join_target(field)?;

            let mut ids: Vec<Value> = Vec::new();
            for page in pages.iter() {
                for id in referenced_ids(page, key) {
                    let id = Value::String(id);
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
            }
            debug!(field = %field.name, with_type, ids = ids.len(), "Resolving join");
            let joined = self.load_joined(with_type, ids).await?;

            for page in pages.iter_mut() {
                let found: Vec<Value> = referenced_ids(page, key)
                    .iter()
                    .filter_map(|id| joined.get(id))
                    .map(Page::to_document)
                    .collect();
                let value = match field.field_type {
                    FieldType::JoinByOne => found.into_iter().next().unwrap_or(Value::Null),
                    _ => Value::Array(found),
                };
                page.fields.insert(field.name.clone(), value);
            }
        }
        Ok(())
    }

    fn convert_submitted_fields(
        &self,
        _ctx: &RequestContext,
        schema: &[Field],
        raw: &Map<String, Value>,
    ) -> Result<Map<String, Value>, PageTypeError> {
        let mut out = Map::new();
        for field in schema {
            match field.field_type {
                FieldType::JoinByOne => {
                    if let Some(key) = &field.id_field {
                        let id = raw.get(key).and_then(Value::as_str).map(str::trim);
                        let value = match id {
                            Some(id) if !id.is_empty() => Value::String(id.to_string()),
                            _ => Value::Null,
                        };
                        out.insert(key.clone(), value);
                    }
                }
                FieldType::JoinByArray => {
                    if let Some(key) = &field.ids_field {
                        let ids = raw
                            .get(key)
                            .and_then(Value::as_array)
                            .map(|ids| {
                                ids.iter()
                                    .filter_map(Value::as_str)
                                    .map(|id| Value::String(id.trim().to_string()))
                                    .collect()
                            })
                            .unwrap_or_default();
                        out.insert(key.clone(), Value::Array(ids));
                    }
                }
                _ => {
                    let value = convert_value(field, raw.get(&field.name));
                    if field.required && is_blank(&value) {
                        return Err(PageTypeError::validation(&field.name, "required"));
                    }
                    out.insert(field.name.clone(), value);
                }
            }
        }
        Ok(out)
    }

    fn index_fields(&self, schema: &[Field], page: &Page, texts: &mut Vec<SearchText>) {
        for field in schema {
            let text = match (field.field_type, page.field(&field.name)) {
                (FieldType::String | FieldType::Select, Some(Value::String(s))) => s.clone(),
                (FieldType::Tags, Some(Value::Array(tags))) => tags
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(" "),
                (FieldType::Area, Some(area)) => area_text(area),
                _ => continue,
            };
            if text.trim().is_empty() {
                continue;
            }
            texts.push(SearchText {
                weight: field.weight.unwrap_or(DEFAULT_FIELD_WEIGHT),
                text,
                silent: field.silent,
            });
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn default_or(field: &Field, fallback: Value) -> Value {
    field.def.clone().unwrap_or(fallback)
}

/// Coerce one submitted value to the field's type; unusable input falls
/// back to the field default
fn convert_value(field: &Field, raw: Option<&Value>) -> Value {
    match field.field_type {
        FieldType::String => match raw {
            Some(Value::String(s)) => Value::String(s.trim().to_string()),
            Some(Value::Number(n)) => Value::String(n.to_string()),
            Some(Value::Bool(b)) => Value::String(b.to_string()),
            _ => default_or(field, Value::String(String::new())),
        },
        FieldType::Url => match raw.and_then(Value::as_str).map(str::trim) {
            Some(url)
                if url.starts_with("http://")
                    || url.starts_with("https://")
                    || url.starts_with('/') =>
            {
                Value::String(url.to_string())
            }
            _ => default_or(field, Value::String(String::new())),
        },
        FieldType::Integer => {
            let parsed = match raw {
                Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
                Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            parsed
                .map(Value::from)
                .unwrap_or_else(|| default_or(field, Value::Null))
        }
        FieldType::Float => {
            let parsed = match raw {
                Some(Value::Number(n)) => n.as_f64(),
                Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            parsed
                .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
                .unwrap_or_else(|| default_or(field, Value::Null))
        }
        FieldType::Boolean => match raw {
            Some(Value::Bool(b)) => Value::Bool(*b),
            Some(Value::Number(n)) => Value::Bool(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
            Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => Value::Bool(true),
                "false" | "0" | "off" | "no" | "" => Value::Bool(false),
                _ => default_or(field, Value::Bool(false)),
            },
            _ => default_or(field, Value::Bool(false)),
        },
        FieldType::Select => {
            let chosen = raw
                .and_then(Value::as_str)
                .filter(|v| field.choices.iter().any(|c| c.value == *v));
            match chosen {
                Some(v) => Value::String(v.to_string()),
                None => field.def.clone().unwrap_or_else(|| {
                    field
                        .choices
                        .first()
                        .map(|c| Value::String(c.value.clone()))
                        .unwrap_or(Value::Null)
                }),
            }
        }
        FieldType::Tags => {
            let items: Vec<String> = match raw {
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
                Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
                _ => Vec::new(),
            };
            let mut tags: Vec<Value> = Vec::new();
            for tag in items {
                let tag = Value::String(tag.trim().to_lowercase());
                if !is_blank(&tag) && !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
            Value::Array(tags)
        }
        FieldType::Area => match raw {
            Some(Value::Object(area))
                if area.get("items").map(Value::is_array).unwrap_or(false) =>
            {
                Value::Object(area.clone())
            }
            _ => serde_json::json!({"type": "area", "items": []}),
        },
        FieldType::JoinByOne | FieldType::JoinByArray => Value::Null,
    }
}

/// Plain text of an area: every `content` string in its items, tags stripped
fn area_text(area: &Value) -> String {
    let items = match area.get("items").and_then(Value::as_array) {
        Some(items) => items,
        None => return String::new(),
    };
    items
        .iter()
        .filter_map(|item| item.get("content").and_then(Value::as_str))
        .map(strip_tags)
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
