//! JSON description of an application: configuration, schemas, handler
//! metadata and the route table.
//!
//! ```json
//! {
//!   "config": { "title": "Pets", "openapi_version": "3.0.2" },
//!   "schemas": {
//!     "PetSchema": { "fields": { "id": { "type": "integer", "required": true } } }
//!   },
//!   "handlers": {
//!     "create_pet": {
//!       "docs": { "tags": ["pets"] },
//!       "schemas": [{ "schema": "PetSchema", "location": "json" }],
//!       "responses": { "201": { "schema": "PetSchema", "description": "Created" } }
//!     }
//!   },
//!   "routes": [{ "path": "/pets", "method": "POST", "handler": "create_pet" }]
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::SpecConfig;
use crate::descriptor::{HandlerTable, RequestSchema, ResponseDescriptor, SchemaResponse};
use crate::error::ManifestError;
use crate::route::{Endpoint, Route, ViewHandlers};
use crate::schema::{Field, FieldKind, Schema};
use crate::types::Location;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub config: ConfigSpec,
    pub schemas: IndexMap<String, SchemaSpec>,
    pub handlers: IndexMap<String, HandlerSpec>,
    pub routes: Vec<RouteSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigSpec {
    pub title: Option<String>,
    pub version: Option<String>,
    pub openapi_version: Option<String>,
    /// Empty string disables the document endpoint.
    pub url: Option<String>,
    pub request_data_name: Option<String>,
    pub prefix: Option<String>,
    pub info: Map<String, Value>,
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SchemaSpec {
    pub partial: bool,
    pub fields: IndexMap<String, FieldSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    #[serde(flatten)]
    pub kind: KindSpec,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "enum")]
    pub enum_values: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KindSpec {
    Boolean,
    Integer,
    Number,
    String,
    #[serde(rename = "datetime")]
    DateTime,
    Dict,
    List { items: Box<KindSpec> },
    Nested { schema: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HandlerSpec {
    pub docs: Option<Value>,
    pub schemas: Vec<SchemaRefSpec>,
    pub responses: IndexMap<String, ResponseSpec>,
    pub parameters: Vec<Value>,
}

impl HandlerSpec {
    /// A handler listed without any metadata stays undocumented.
    fn is_documented(&self) -> bool {
        self.docs.is_some()
            || !self.schemas.is_empty()
            || !self.responses.is_empty()
            || !self.parameters.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaRefSpec {
    pub schema: String,
    #[serde(default)]
    pub partial: bool,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default)]
    pub put_into: Option<String>,
    #[serde(default)]
    pub example: Option<Value>,
    #[serde(default)]
    pub add_to_refs: bool,
    #[serde(default)]
    pub required: bool,
}

fn default_location() -> String {
    Location::Json.as_str().to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ResponseSpec {
    Schema {
        schema: String,
        #[serde(default)]
        partial: bool,
        #[serde(default)]
        description: String,
        #[serde(default)]
        required: bool,
        #[serde(default)]
        headers: Option<Value>,
        #[serde(default)]
        examples: Option<Value>,
    },
    Raw(Value),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RouteSpec {
    View {
        path: Option<String>,
        view: IndexMap<String, String>,
    },
    Function {
        path: Option<String>,
        method: String,
        handler: String,
    },
}

/// Everything needed to build an [`ApiSpec`](crate::ApiSpec) and its
/// middleware.
#[derive(Debug, Clone)]
pub struct ManifestParts {
    pub config: SpecConfig,
    pub handlers: HandlerTable,
    pub routes: Vec<Route>,
}

impl Manifest {
    /// Resolve schema names and build the typed model.
    ///
    /// # Errors
    ///
    /// Fails on unknown schema or handler names, nesting cycles, invalid
    /// locations or versions, and handlers with two body schemas.
    pub fn into_parts(self) -> Result<ManifestParts, ManifestError> {
        let config = self.config.into_config()?;
        let schemas = SchemaResolver::new(&self.schemas).resolve_all()?;

        let mut handlers = HandlerTable::new();
        for (id, spec) in &self.handlers {
            if spec.is_documented() {
                register_handler(&mut handlers, &schemas, id, spec)?;
            }
        }

        let routes = self
            .routes
            .into_iter()
            .map(|route| route.into_route(&self.handlers))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ManifestParts {
            config,
            handlers,
            routes,
        })
    }
}

impl ConfigSpec {
    fn into_config(self) -> Result<SpecConfig, ManifestError> {
        let mut config = SpecConfig::default();
        if let Some(title) = self.title {
            config.title = title;
        }
        if let Some(version) = self.version {
            config.version = version;
        }
        if let Some(version) = self.openapi_version {
            config = config.openapi_version(&version)?;
        }
        if let Some(url) = self.url {
            config.url = Some(url).filter(|u| !u.is_empty());
        }
        if let Some(name) = self.request_data_name {
            config.request_data_name = name;
        }
        if let Some(prefix) = self.prefix {
            config.prefix = prefix;
        }
        config.info = self.info;
        config.extra = self.extra;
        Ok(config)
    }
}

impl RouteSpec {
    fn into_route(self, handlers: &IndexMap<String, HandlerSpec>) -> Result<Route, ManifestError> {
        let check = |path: &Option<String>, handler: &str| {
            if handlers.contains_key(handler) {
                Ok(())
            } else {
                Err(ManifestError::UnknownHandler {
                    path: path.clone().unwrap_or_default(),
                    handler: handler.to_string(),
                })
            }
        };

        match self {
            RouteSpec::Function {
                path,
                method,
                handler,
            } => {
                check(&path, &handler)?;
                Ok(Route {
                    path,
                    endpoint: Endpoint::Function {
                        method,
                        handler: handler.into(),
                    },
                })
            }
            RouteSpec::View { path, view } => {
                let mut methods = ViewHandlers::new();
                for (method, handler) in view {
                    check(&path, &handler)?;
                    methods = methods.method(&method, handler);
                }
                Ok(Route {
                    path,
                    endpoint: Endpoint::View(methods),
                })
            }
        }
    }
}

fn register_handler(
    table: &mut HandlerTable,
    schemas: &HashMap<String, Arc<Schema>>,
    id: &str,
    spec: &HandlerSpec,
) -> Result<(), ManifestError> {
    let context = || format!("handler '{id}'");

    if let Some(docs) = &spec.docs {
        table.docs(id, docs.clone());
    }

    for declared in &spec.schemas {
        let schema = lookup(schemas, &declared.schema, declared.partial, context)?;
        let location: Location = declared.location.parse()?;
        let mut request = RequestSchema::new(schema)
            .location(location)
            .add_to_refs(declared.add_to_refs)
            .required(declared.required);
        if let Some(slot) = &declared.put_into {
            request = request.put_into(slot.clone());
        }
        if let Some(example) = &declared.example {
            request = request.example(example.clone());
        }
        table.request_schema(id, request)?;
    }

    for (code, response) in &spec.responses {
        let descriptor = match response {
            ResponseSpec::Schema {
                schema,
                partial,
                description,
                required,
                headers,
                examples,
            } => {
                let schema = lookup(schemas, schema, *partial, context)?;
                let mut response = SchemaResponse::new(schema)
                    .description(description.clone())
                    .required(*required);
                if let Some(headers) = headers {
                    response = response.headers(headers.clone());
                }
                if let Some(examples) = examples {
                    response = response.examples(examples.clone());
                }
                ResponseDescriptor::Schema(response)
            }
            ResponseSpec::Raw(value) => ResponseDescriptor::Raw(value.clone()),
        };
        table.response(id, code, descriptor);
    }

    table.entry(id).parameters.extend(spec.parameters.iter().cloned());
    Ok(())
}

fn lookup(
    schemas: &HashMap<String, Arc<Schema>>,
    name: &str,
    partial: bool,
    context: impl Fn() -> String,
) -> Result<Arc<Schema>, ManifestError> {
    let schema = schemas
        .get(name)
        .ok_or_else(|| ManifestError::UnknownSchema {
            name: name.to_string(),
            context: context(),
        })?;
    if partial && !schema.is_partial() {
        Ok(Arc::new(Schema::clone(schema).partial()))
    } else {
        Ok(schema.clone())
    }
}

/// Builds schemas in dependency order so nested fields share one `Arc`.
struct SchemaResolver<'a> {
    specs: &'a IndexMap<String, SchemaSpec>,
    resolved: HashMap<String, Arc<Schema>>,
    in_progress: HashSet<String>,
}

impl<'a> SchemaResolver<'a> {
    fn new(specs: &'a IndexMap<String, SchemaSpec>) -> Self {
        Self {
            specs,
            resolved: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    fn resolve_all(mut self) -> Result<HashMap<String, Arc<Schema>>, ManifestError> {
        for name in self.specs.keys() {
            self.resolve(name, "schemas")?;
        }
        Ok(self.resolved)
    }

    fn resolve(&mut self, name: &str, context: &str) -> Result<Arc<Schema>, ManifestError> {
        if let Some(schema) = self.resolved.get(name) {
            return Ok(schema.clone());
        }
        let spec = self
            .specs
            .get(name)
            .ok_or_else(|| ManifestError::UnknownSchema {
                name: name.to_string(),
                context: context.to_string(),
            })?;
        if !self.in_progress.insert(name.to_string()) {
            return Err(ManifestError::SchemaCycle {
                name: name.to_string(),
            });
        }

        let context = format!("schema '{name}'");
        let mut schema = Schema::new(name);
        for (field_name, field) in &spec.fields {
            let kind = self.kind(&field.kind, &context)?;
            let mut built = Field::new(field_name.clone(), kind);
            built.required = field.required;
            built.description = field.description.clone();
            built.enum_values = field.enum_values.clone();
            schema = schema.field(built);
        }
        if spec.partial {
            schema = schema.partial();
        }

        self.in_progress.remove(name);
        let schema = Arc::new(schema);
        self.resolved.insert(name.to_string(), schema.clone());
        Ok(schema)
    }

    fn kind(&mut self, spec: &KindSpec, context: &str) -> Result<FieldKind, ManifestError> {
        Ok(match spec {
            KindSpec::Boolean => FieldKind::Boolean,
            KindSpec::Integer => FieldKind::Integer,
            KindSpec::Number => FieldKind::Number,
            KindSpec::String => FieldKind::String,
            KindSpec::DateTime => FieldKind::DateTime,
            KindSpec::Dict => FieldKind::Dict,
            KindSpec::List { items } => FieldKind::List(Box::new(self.kind(items, context)?)),
            KindSpec::Nested { schema } => FieldKind::Nested(self.resolve(schema, context)?),
        })
    }
}
