//! Per-handler documentation and validation metadata.
//!
//! Metadata lives in a [`HandlerTable`] keyed by [`HandlerId`] rather than
//! on the handlers themselves. Annotating a handler inserts its descriptor
//! on first touch and merges into it afterwards.
//!
//! ```
//! use route_apispec::{Field, HandlerTable, RequestSchema, Schema};
//! use route_apispec::types::Location;
//! use serde_json::json;
//!
//! let mut table = HandlerTable::new();
//! table
//!     .docs("index", json!({ "tags": ["users"], "summary": "List users" }))
//!     .request_schema(
//!         "index",
//!         RequestSchema::new(Schema::new("Query").field(Field::integer("page")))
//!             .location(Location::Query),
//!     )
//!     .unwrap();
//!
//! let descriptor = table.get(&"index".into()).unwrap();
//! assert_eq!(descriptor.schemas.len(), 1);
//! assert_eq!(descriptor.fields["summary"], "List users");
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::AnnotateError;
use crate::example::Example;
use crate::schema::Schema;
use crate::types::Location;

/// Keys of a descriptor that are not copied verbatim onto the operation.
pub const RESERVED_KEYS: &[&str] = &["schemas", "responses", "parameters"];

/// Identity of a request handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerId(String);

impl HandlerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HandlerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for HandlerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A schema declared for one request location.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    pub schema: Arc<Schema>,
    pub location: Location,
    /// Extra fields for the body encoding (`required`, `name`, ...).
    pub options: Map<String, Value>,
    pub example: Option<Example>,
    /// Request slot the validated value is stored under instead of the
    /// shared one.
    pub put_into: Option<String>,
}

/// A response documented by schema.
#[derive(Debug, Clone)]
pub struct SchemaResponse {
    pub schema: Arc<Schema>,
    pub required: bool,
    pub description: String,
    pub headers: Option<Value>,
    pub examples: Option<Value>,
}

impl SchemaResponse {
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            schema: schema.into(),
            required: false,
            description: String::new(),
            headers: None,
            examples: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn headers(mut self, headers: Value) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn examples(mut self, examples: Value) -> Self {
        self.examples = Some(examples);
        self
    }
}

/// One entry of a handler's response map.
#[derive(Debug, Clone)]
pub enum ResponseDescriptor {
    Schema(SchemaResponse),
    /// An already-final response object.
    Raw(Value),
}

/// Everything known about one handler.
#[derive(Debug, Clone, Default)]
pub struct HandlerDescriptor {
    pub schemas: Vec<SchemaDescriptor>,
    pub responses: IndexMap<String, ResponseDescriptor>,
    pub parameters: Vec<Value>,
    /// Free-form operation fields (tags, summary, description, ...).
    pub fields: Map<String, Value>,
}

impl HandlerDescriptor {
    pub fn has_body(&self) -> bool {
        self.schemas.iter().any(|s| s.location.is_body())
    }
}

/// Arguments of [`HandlerTable::request_schema`].
#[derive(Debug, Clone)]
pub struct RequestSchema {
    schema: Arc<Schema>,
    location: Location,
    put_into: Option<String>,
    example: Option<Value>,
    add_to_refs: bool,
    required: bool,
}

impl RequestSchema {
    /// A JSON body schema; change the location with [`RequestSchema::location`].
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            schema: schema.into(),
            location: Location::Json,
            put_into: None,
            example: None,
            add_to_refs: false,
            required: false,
        }
    }

    pub fn location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    pub fn put_into(mut self, slot: impl Into<String>) -> Self {
        self.put_into = Some(slot.into());
        self
    }

    pub fn example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }

    pub fn add_to_refs(mut self, add_to_refs: bool) -> Self {
        self.add_to_refs = add_to_refs;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    fn into_descriptor(self) -> SchemaDescriptor {
        let mut options = Map::new();
        options.insert("required".into(), json!(self.required));
        let add_to_refs = self.add_to_refs;
        SchemaDescriptor {
            schema: self.schema,
            location: self.location,
            options,
            example: self.example.map(|value| {
                let example = Example::from_payload(value);
                let add_to_refs = example.add_to_refs || add_to_refs;
                example.add_to_refs(add_to_refs)
            }),
            put_into: self.put_into,
        }
    }
}

/// Side table from handler identity to its descriptor.
#[derive(Debug, Clone, Default)]
pub struct HandlerTable {
    handlers: IndexMap<HandlerId, HandlerDescriptor>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, handler: &HandlerId) -> Option<&HandlerDescriptor> {
        self.handlers.get(handler)
    }

    pub fn contains(&self, handler: &HandlerId) -> bool {
        self.handlers.contains_key(handler)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// The handler's descriptor, created empty on first access.
    pub fn entry(&mut self, handler: impl Into<HandlerId>) -> &mut HandlerDescriptor {
        self.handlers.entry(handler.into()).or_default()
    }

    /// Merge free-form operation fields into the handler.
    ///
    /// `parameters` extends the explicit parameter list and `responses`
    /// merges raw response objects; every other key overwrites. `produces`
    /// defaults to `["application/json"]`.
    pub fn docs(&mut self, handler: impl Into<HandlerId>, fields: Value) -> &mut Self {
        let mut fields = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let has_produces = fields
            .get("produces")
            .map(|v| !v.is_null() && v.as_array().map_or(true, |a| !a.is_empty()))
            .unwrap_or(false);
        if !has_produces {
            fields.insert("produces".into(), json!(["application/json"]));
        }

        let descriptor = self.entry(handler);
        if let Some(Value::Array(parameters)) = fields.remove("parameters") {
            descriptor.parameters.extend(parameters);
        }
        if let Some(Value::Object(responses)) = fields.remove("responses") {
            for (code, response) in responses {
                descriptor
                    .responses
                    .insert(code, ResponseDescriptor::Raw(response));
            }
        }
        fields.remove("schemas");
        for (key, value) in fields {
            descriptor.fields.insert(key, value);
        }
        self
    }

    /// Declare a schema for one request location.
    ///
    /// # Errors
    ///
    /// Returns `AnnotateError::MultipleBodyLocations` if the handler already
    /// has a body/json schema and `request` declares another.
    pub fn request_schema(
        &mut self,
        handler: impl Into<HandlerId>,
        request: RequestSchema,
    ) -> Result<&mut Self, AnnotateError> {
        let handler = handler.into();
        let descriptor = self.entry(handler.clone());
        if request.location.is_body() && descriptor.has_body() {
            return Err(AnnotateError::MultipleBodyLocations {
                handler: handler.to_string(),
            });
        }
        descriptor.schemas.push(request.into_descriptor());
        Ok(self)
    }

    pub fn json_schema(
        &mut self,
        handler: impl Into<HandlerId>,
        schema: impl Into<Arc<Schema>>,
    ) -> Result<&mut Self, AnnotateError> {
        self.request_schema(handler, RequestSchema::new(schema))
    }

    pub fn querystring_schema(
        &mut self,
        handler: impl Into<HandlerId>,
        schema: impl Into<Arc<Schema>>,
    ) -> Result<&mut Self, AnnotateError> {
        self.request_schema(
            handler,
            RequestSchema::new(schema).location(Location::Querystring),
        )
    }

    pub fn form_schema(
        &mut self,
        handler: impl Into<HandlerId>,
        schema: impl Into<Arc<Schema>>,
    ) -> Result<&mut Self, AnnotateError> {
        self.request_schema(handler, RequestSchema::new(schema).location(Location::Form))
    }

    pub fn headers_schema(
        &mut self,
        handler: impl Into<HandlerId>,
        schema: impl Into<Arc<Schema>>,
    ) -> Result<&mut Self, AnnotateError> {
        self.request_schema(
            handler,
            RequestSchema::new(schema).location(Location::Headers),
        )
    }

    pub fn match_info_schema(
        &mut self,
        handler: impl Into<HandlerId>,
        schema: impl Into<Arc<Schema>>,
    ) -> Result<&mut Self, AnnotateError> {
        self.request_schema(
            handler,
            RequestSchema::new(schema).location(Location::MatchInfo),
        )
    }

    pub fn cookies_schema(
        &mut self,
        handler: impl Into<HandlerId>,
        schema: impl Into<Arc<Schema>>,
    ) -> Result<&mut Self, AnnotateError> {
        self.request_schema(
            handler,
            RequestSchema::new(schema).location(Location::Cookies),
        )
    }

    /// Document a response for `code`, replacing any earlier one.
    pub fn response(
        &mut self,
        handler: impl Into<HandlerId>,
        code: impl ToString,
        response: ResponseDescriptor,
    ) -> &mut Self {
        self.entry(handler)
            .responses
            .insert(code.to_string(), response);
        self
    }

    /// Document a response by schema.
    pub fn response_schema(
        &mut self,
        handler: impl Into<HandlerId>,
        code: u16,
        schema: impl Into<Arc<Schema>>,
        description: Option<&str>,
    ) -> &mut Self {
        let response = SchemaResponse::new(schema).description(description.unwrap_or_default());
        self.response(handler, code, ResponseDescriptor::Schema(response))
    }
}
