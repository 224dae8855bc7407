//! Route API spec
//!
//! Builds an OpenAPI 2.0 / 3.0.x document from handler metadata and a route
//! table, and validates incoming requests against the same metadata.
//!
//! Handlers are annotated in a [`HandlerTable`]; routes bind paths and
//! methods to handler identities. [`ApiSpec::register`] walks the route table
//! once and produces a frozen [`Document`]; [`ValidationMiddleware`] parses
//! each request's declared locations and stores the validated data on the
//! request.
//!
//! # Example
//!
//! ```
//! use route_apispec::{
//!     default_name_resolver, ApiSpec, Field, HandlerTable, Route, Schema, SpecConfig,
//! };
//! use serde_json::json;
//!
//! let user = Schema::new("UserSchema")
//!     .field(Field::integer("id").required())
//!     .field(Field::string("name"));
//!
//! let mut handlers = HandlerTable::new();
//! handlers
//!     .docs("create_user", json!({ "tags": ["users"] }))
//!     .json_schema("create_user", user)
//!     .unwrap();
//!
//! let mut spec = ApiSpec::new(SpecConfig::default(), default_name_resolver());
//! spec.register(&[Route::new("POST", "/users", "create_user")], &handlers);
//!
//! let doc = spec.swagger_dict().unwrap();
//! let body = &doc["paths"]["/users"]["post"]["parameters"][0];
//! assert_eq!(body["in"], "body");
//! assert_eq!(body["schema"]["$ref"], "#/definitions/User");
//! assert!(doc["definitions"].get("User").is_some());
//! ```
//!
//! # Dialects
//!
//! | | 2.0 | 3.0.x |
//! |---|---|---|
//! | Definitions | `#/definitions/` | `#/components/schemas/` |
//! | Request body | `in: body` parameter | `requestBody` |
//! | Responses | `schema` | `content.application/json.schema` |
//! | Methods | no `trace` | adds `trace` |
//! | `produces`/`consumes` | kept on the operation (`docs` defaults `produces` to JSON) | dropped |
//! | Empty schema set | `definitions` omitted | `components` omitted |

mod assembler;
mod catalog;
mod config;
mod converter;
mod descriptor;
mod dialect;
mod error;
mod example;
mod loader;
mod manifest;
mod middleware;
mod operation;
mod request;
mod route;
mod schema;
mod spec;
pub mod types;
mod validator;

pub use assembler::{Document, DocumentAssembler};
pub use catalog::SchemaCatalog;
pub use config::{
    SpecConfig, DEFAULT_REQUEST_DATA_NAME, DEFAULT_TITLE, DEFAULT_URL, DEFAULT_VERSION,
};
pub use converter::{resolve_reference, schema_to_definition, schema_to_parameters};
pub use descriptor::{
    HandlerDescriptor, HandlerId, HandlerTable, RequestSchema, ResponseDescriptor,
    SchemaDescriptor, SchemaResponse, RESERVED_KEYS,
};
pub use dialect::{BodyEncoding, Dialect};
pub use error::{
    AnnotateError, ConfigError, ManifestError, SchemaError, SpecError, ValidateError,
};
pub use example::{collapse_ref, Example, ExampleInjector};
pub use loader::{load_json, load_manifest, load_manifest_str, load_text};
pub use manifest::{Manifest, ManifestParts};
pub use middleware::{ErrorCallback, Rejection, ValidationMiddleware};
pub use operation::OperationBuilder;
pub use request::Request;
pub use route::{path_keys, Endpoint, Route, ViewHandlers};
pub use schema::{
    default_name_resolver, default_resolver, Field, FieldKind, Schema, SchemaKey,
    SchemaNameResolver,
};
pub use spec::{ApiSpec, SpecEndpoint};
pub use validator::{validate_against_schema, JsonSchemaParser, RequestParser};
