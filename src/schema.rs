//! Declarative request/response schemas.
//!
//! A [`Schema`] is an ordered set of typed fields. It is the unit the
//! [`SchemaCatalog`](crate::SchemaCatalog) names and emits as a reusable
//! definition, and the unit the validation capability checks request data
//! against.
//!
//! ```
//! use route_apispec::{Field, Schema};
//!
//! let schema = Schema::new("UserSchema")
//!     .field(Field::integer("id").required())
//!     .field(Field::string("name").description("display name"));
//!
//! assert_eq!(schema.fields().len(), 2);
//! assert!(!schema.is_partial());
//! assert!(schema.clone().partial().is_partial());
//! ```

use std::sync::Arc;

use serde_json::{json, Map, Value};

/// Maps a schema to the name of its document-level definition.
pub type SchemaNameResolver = Arc<dyn Fn(&Schema) -> String + Send + Sync>;

/// Identity of a schema within one document build.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaKey {
    pub name: String,
    pub partial: bool,
}

/// Derives a definition name from the schema's type name.
///
/// Partial schemas are prefixed with `Partial-`, and a trailing `Schema`
/// suffix is dropped unless nothing would be left.
pub fn default_resolver(schema: &Schema) -> String {
    let prefix = if schema.is_partial() { "Partial-" } else { "" };
    let name = format!("{}{}", prefix, schema.name());
    match name.strip_suffix("Schema") {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => name,
    }
}

/// Wraps [`default_resolver`] for places that need a [`SchemaNameResolver`].
pub fn default_name_resolver() -> SchemaNameResolver {
    Arc::new(default_resolver)
}

/// The value type of a field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Boolean,
    Integer,
    Number,
    String,
    DateTime,
    /// Free-form JSON object.
    Dict,
    List(Box<FieldKind>),
    Nested(Arc<Schema>),
}

impl FieldKind {
    /// JSON Schema fragment for primitive kinds. Nested schemas are handled
    /// by the caller since they need a reference or inlining decision.
    pub(crate) fn primitive_property(&self) -> Option<Value> {
        match self {
            FieldKind::Boolean => Some(json!({ "type": "boolean" })),
            FieldKind::Integer => Some(json!({ "type": "integer" })),
            FieldKind::Number => Some(json!({ "type": "number" })),
            FieldKind::String => Some(json!({ "type": "string" })),
            FieldKind::DateTime => Some(json!({ "type": "string", "format": "date-time" })),
            FieldKind::Dict => Some(json!({ "type": "object", "additionalProperties": {} })),
            FieldKind::List(_) | FieldKind::Nested(_) => None,
        }
    }
}

/// A single named field of a [`Schema`].
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub description: Option<String>,
    pub enum_values: Vec<Value>,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: None,
            enum_values: Vec::new(),
        }
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::DateTime)
    }

    pub fn dict(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Dict)
    }

    pub fn list(name: impl Into<String>, items: FieldKind) -> Self {
        Self::new(name, FieldKind::List(Box::new(items)))
    }

    pub fn nested(name: impl Into<String>, schema: Arc<Schema>) -> Self {
        Self::new(name, FieldKind::Nested(schema))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Restrict the field to a fixed set of values.
    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_list(&self) -> bool {
        matches!(self.kind, FieldKind::List(_))
    }
}

/// An ordered collection of fields with a type name.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
    partial: bool,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            partial: false,
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// The relaxed variant: no field is required.
    pub fn partial(mut self) -> Self {
        self.partial = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn is_partial(&self) -> bool {
        self.partial
    }

    pub fn key(&self) -> SchemaKey {
        SchemaKey {
            name: self.name.clone(),
            partial: self.partial,
        }
    }

    /// Whether `field` must be present in input for this schema.
    pub fn requires(&self, field: &Field) -> bool {
        field.required && !self.partial
    }

    /// Self-contained JSON Schema with nested schemas inlined.
    ///
    /// Used for validation, where definitions are not available. Undeclared
    /// properties are rejected at every level.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &self.fields {
            properties.insert(field.name.clone(), inline_field(field, &field.kind));
            if self.requires(field) {
                required.push(Value::String(field.name.clone()));
            }
        }

        let mut out = Map::new();
        out.insert("type".into(), json!("object"));
        out.insert("properties".into(), Value::Object(properties));
        out.insert("additionalProperties".into(), json!(false));
        if !required.is_empty() {
            out.insert("required".into(), Value::Array(required));
        }
        Value::Object(out)
    }
}

fn inline_field(field: &Field, kind: &FieldKind) -> Value {
    let mut prop = inline_kind(kind);
    if !field.enum_values.is_empty() {
        if let Value::Object(map) = &mut prop {
            map.insert("enum".into(), Value::Array(field.enum_values.clone()));
        }
    }
    prop
}

fn inline_kind(kind: &FieldKind) -> Value {
    match kind {
        FieldKind::List(items) => json!({ "type": "array", "items": inline_kind(items) }),
        FieldKind::Nested(schema) => schema.to_json_schema(),
        other => other
            .primitive_property()
            .unwrap_or_else(|| json!({})),
    }
}
