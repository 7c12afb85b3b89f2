//! Query criteria
//!
//! A small predicate language over page documents. Stores evaluate it
//! directly; callers may build it in code or parse it from the
//! Mongo-style JSON the host application already speaks.

use crate::error::StorageError;
use crate::page::lookup;
use serde_json::{Map, Value};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub enum Criteria {
    /// Matches every document
    All,
    Eq(String, Value),
    Ne(String, Value),
    In(String, Vec<Value>),
    Exists(String, bool),
    And(Vec<Criteria>),
    Or(Vec<Criteria>),
}

impl Default for Criteria {
    fn default() -> Self {
        Criteria::All
    }
}

impl Criteria {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Criteria::Eq(field.into(), value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Criteria::Ne(field.into(), value.into())
    }

    pub fn any_of(field: impl Into<String>, values: Vec<Value>) -> Self {
        Criteria::In(field.into(), values)
    }

    pub fn and(clauses: Vec<Criteria>) -> Self {
        Criteria::And(clauses)
    }

    pub fn or(clauses: Vec<Criteria>) -> Self {
        Criteria::Or(clauses)
    }

    /// Evaluate against a JSON document
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Criteria::All => true,
            Criteria::Eq(field, value) => field_equals(lookup(doc, field), value),
            Criteria::Ne(field, value) => !field_equals(lookup(doc, field), value),
            Criteria::In(field, values) => {
                let actual = lookup(doc, field);
                values.iter().any(|value| field_equals(actual, value))
            }
            Criteria::Exists(field, wanted) => {
                let present = !matches!(lookup(doc, field), None | Some(Value::Null));
                present == *wanted
            }
            Criteria::And(clauses) => clauses.iter().all(|c| c.matches(doc)),
            Criteria::Or(clauses) => clauses.iter().any(|c| c.matches(doc)),
        }
    }

    /// Parse Mongo-style criteria: `{"type": "event", "$or": [...]}`
    ///
    /// Supported operators: `$and`, `$or`, `$eq`, `$ne`, `$in`, `$exists`.
    /// Several keys in one object are combined with AND.
    pub fn from_json(value: &Value) -> Result<Self, StorageError> {
        let object = value.as_object().ok_or_else(|| {
            StorageError::InvalidCriteria(format!("criteria must be an object, got {}", value))
        })?;

        let mut clauses = Vec::new();
        for (key, operand) in object {
            match key.as_str() {
                "$and" => clauses.push(Criteria::And(parse_list(key, operand)?)),
                "$or" => clauses.push(Criteria::Or(parse_list(key, operand)?)),
                op if op.starts_with('$') => {
                    return Err(StorageError::InvalidCriteria(format!(
                        "unsupported operator '{}'",
                        op
                    )));
                }
                field => clauses.extend(parse_field(field, operand)?),
            }
        }

        Ok(match clauses.len() {
            0 => Criteria::All,
            1 => clauses.remove(0),
            _ => Criteria::And(clauses),
        })
    }
}

fn parse_list(key: &str, operand: &Value) -> Result<Vec<Criteria>, StorageError> {
    operand
        .as_array()
        .ok_or_else(|| StorageError::InvalidCriteria(format!("{} expects an array", key)))?
        .iter()
        .map(Criteria::from_json)
        .collect()
}

fn parse_field(field: &str, operand: &Value) -> Result<Vec<Criteria>, StorageError> {
    let operators = match operand {
        Value::Object(map) if is_operator_object(map) => map,
        _ => return Ok(vec![Criteria::eq(field, operand.clone())]),
    };

    let mut clauses = Vec::new();
    for (op, arg) in operators {
        let clause = match op.as_str() {
            "$eq" => Criteria::eq(field, arg.clone()),
            "$ne" => Criteria::ne(field, arg.clone()),
            "$in" => {
                let values = arg.as_array().ok_or_else(|| {
                    StorageError::InvalidCriteria(format!("$in on '{}' expects an array", field))
                })?;
                Criteria::any_of(field, values.clone())
            }
            "$exists" => Criteria::Exists(field.to_string(), arg.as_bool().unwrap_or(true)),
            other => {
                return Err(StorageError::InvalidCriteria(format!(
                    "unsupported operator '{}' on '{}'",
                    other, field
                )));
            }
        };
        clauses.push(clause);
    }
    Ok(clauses)
}

fn is_operator_object(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.keys().all(|k| k.starts_with('$'))
}

/// Equality with array membership: a scalar matches an array field containing it
fn field_equals(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        None => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => items.contains(expected),
        Some(value) => value == expected,
    }
}

/// Total order over JSON values used for sorting
///
/// Missing and null sort first, then booleans, numbers, strings, and
/// anything else by its serialized form.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn class(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => match class(a).cmp(&class(b)) {
            Ordering::Equal => a.map(|v| v.to_string()).cmp(&b.map(|v| v.to_string())),
            other => other,
        },
    }
}
