//! Request parsing and validation against declared schemas.
//!
//! The [`RequestParser`] trait is the validation capability the middleware
//! drives. [`JsonSchemaParser`] collects the raw data for a location,
//! coerces string inputs to each field's kind and validates the result with
//! `jsonschema`.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use jsonschema::Validator;
use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::error::{SchemaError, ValidateError};
use crate::request::Request;
use crate::schema::{Field, FieldKind, Schema};
use crate::types::{json_type_name, Location};

/// Validates one location of a request against a schema.
pub trait RequestParser: Send + Sync {
    /// Parse `location` of `request` into typed data.
    ///
    /// # Errors
    ///
    /// Returns `ValidateError::Invalid` when the data does not match
    /// `schema`.
    fn parse(
        &self,
        schema: &Arc<Schema>,
        request: &Request,
        location: Location,
    ) -> Result<Value, ValidateError>;
}

/// Default [`RequestParser`] backed by `jsonschema`.
///
/// Each schema instance is compiled once and reused for the parser's
/// lifetime; clones of a middleware share the parser and its cache.
#[derive(Debug, Default)]
pub struct JsonSchemaParser {
    cache: ValidatorCache,
}

impl JsonSchemaParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RequestParser for JsonSchemaParser {
    fn parse(
        &self,
        schema: &Arc<Schema>,
        request: &Request,
        location: Location,
    ) -> Result<Value, ValidateError> {
        let data = match location {
            Location::Body | Location::Json => parse_body(request.body.as_deref(), location)?,
            Location::Query | Location::Querystring => {
                collect_pairs(schema, &request.query, false, location)?
            }
            Location::Form | Location::Files => {
                collect_pairs(schema, &request.form, false, location)?
            }
            Location::Headers => collect_pairs(schema, &request.headers, true, location)?,
            Location::Cookies => collect_map(schema, request.cookies.iter(), location)?,
            Location::Path | Location::MatchInfo => {
                collect_map(schema, request.match_info.iter(), location)?
            }
        };

        let validator = self.cache.get_or_compile(schema)?;
        check(&validator, &data, location)?;
        Ok(data)
    }
}

/// Compiled validators keyed by schema instance.
///
/// Entries hold a [`Weak`] to their schema, which keeps the allocation (and
/// so the address used as key) from being reused while the entry exists.
#[derive(Default)]
struct ValidatorCache {
    entries: RwLock<HashMap<(usize, bool), CachedValidator>>,
}

struct CachedValidator {
    schema: Weak<Schema>,
    validator: Arc<Validator>,
}

impl ValidatorCache {
    fn get_or_compile(&self, schema: &Arc<Schema>) -> Result<Arc<Validator>, ValidateError> {
        let key = (Arc::as_ptr(schema) as usize, schema.is_partial());
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = entries.get(&key) {
                if entry.schema.strong_count() > 0 {
                    return Ok(entry.validator.clone());
                }
            }
        }

        let validator = Arc::new(compile(&schema.to_json_schema())?);
        debug!(schema = %schema.name(), partial = schema.is_partial(), "compiled request validator");
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                key,
                CachedValidator {
                    schema: Arc::downgrade(schema),
                    validator: validator.clone(),
                },
            );
        Ok(validator)
    }

    fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl fmt::Debug for ValidatorCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorCache")
            .field("entries", &self.len())
            .finish()
    }
}

/// Validate a payload against a JSON Schema, collecting every error.
pub fn validate_against_schema(
    schema: &Value,
    payload: &Value,
    location: Location,
) -> Result<(), ValidateError> {
    check(&compile(schema)?, payload, location)
}

fn compile(schema: &Value) -> Result<Validator, ValidateError> {
    jsonschema::validator_for(schema).map_err(|e| ValidateError::InvalidSchema {
        message: e.to_string(),
    })
}

fn check(validator: &Validator, payload: &Value, location: Location) -> Result<(), ValidateError> {
    let errors: Vec<SchemaError> = validator
        .iter_errors(payload)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { location, errors })
    }
}

fn parse_body(body: Option<&str>, location: Location) -> Result<Value, ValidateError> {
    match body.map(str::trim) {
        None | Some("") => Ok(Value::Object(Map::new())),
        Some(text) => serde_json::from_str(text)
            .map_err(|source| ValidateError::MalformedBody { location, source }),
    }
}

fn collect_pairs(
    schema: &Schema,
    pairs: &[(String, String)],
    case_insensitive: bool,
    location: Location,
) -> Result<Value, ValidateError> {
    let key_matches = |key: &str, name: &str| {
        if case_insensitive {
            key.eq_ignore_ascii_case(name)
        } else {
            key == name
        }
    };

    let mut data = Map::new();
    let mut errors = Vec::new();
    for field in schema.fields() {
        let values: Vec<&str> = pairs
            .iter()
            .filter(|(key, _)| key_matches(key, &field.name))
            .map(|(_, value)| value.as_str())
            .collect();
        if values.is_empty() {
            continue;
        }
        if let Some(value) = coerce_field(field, &values, &mut errors) {
            data.insert(field.name.clone(), value);
        }
    }

    finish(data, errors, location)
}

fn collect_map<'a>(
    schema: &Schema,
    entries: impl Iterator<Item = (&'a String, &'a String)> + Clone,
    location: Location,
) -> Result<Value, ValidateError> {
    let mut data = Map::new();
    let mut errors = Vec::new();
    for field in schema.fields() {
        let Some((_, raw)) = entries.clone().find(|(key, _)| **key == field.name) else {
            continue;
        };
        if let Some(value) = coerce_field(field, &[raw.as_str()], &mut errors) {
            data.insert(field.name.clone(), value);
        }
    }

    finish(data, errors, location)
}

fn finish(
    data: Map<String, Value>,
    errors: Vec<SchemaError>,
    location: Location,
) -> Result<Value, ValidateError> {
    if errors.is_empty() {
        Ok(Value::Object(data))
    } else {
        Err(ValidateError::Invalid { location, errors })
    }
}

/// Lists take every value; other kinds take the first.
fn coerce_field(field: &Field, values: &[&str], errors: &mut Vec<SchemaError>) -> Option<Value> {
    let path = format!("/{}", field.name);
    match &field.kind {
        FieldKind::List(items) => {
            let mut out = Vec::with_capacity(values.len());
            for (i, raw) in values.iter().enumerate() {
                match coerce(items, raw) {
                    Ok(value) => out.push(value),
                    Err(message) => errors.push(SchemaError {
                        path: format!("{path}/{i}"),
                        message,
                    }),
                }
            }
            Some(Value::Array(out))
        }
        kind => match coerce(kind, values[0]) {
            Ok(value) => Some(value),
            Err(message) => {
                errors.push(SchemaError { path, message });
                None
            }
        },
    }
}

fn coerce(kind: &FieldKind, raw: &str) -> Result<Value, String> {
    match kind {
        FieldKind::String | FieldKind::DateTime => Ok(Value::String(raw.to_string())),
        FieldKind::Integer => raw
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| "Not a valid integer.".to_string()),
        FieldKind::Number => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| "Not a valid number.".to_string()),
        FieldKind::Boolean => parse_bool(raw)
            .map(Value::Bool)
            .ok_or_else(|| "Not a valid boolean.".to_string()),
        FieldKind::Dict | FieldKind::Nested(_) => match serde_json::from_str::<Value>(raw) {
            Ok(value @ Value::Object(_)) => Ok(value),
            Ok(other) => Err(format!(
                "Not a valid mapping type, got {}.",
                json_type_name(&other)
            )),
            Err(_) => Err("Not a valid mapping type.".to_string()),
        },
        FieldKind::List(items) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(values)) => values
                .iter()
                .map(|v| match v {
                    Value::String(s) => coerce(items, s),
                    other => Ok(other.clone()),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            _ => Err("Not a valid list.".to_string()),
        },
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" | "on" => Some(true),
        "false" | "f" | "0" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
