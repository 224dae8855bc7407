//! Encoding rules that differ between OpenAPI 2.0 and 3.x.
//!
//! Every other component talks in terms of "add a path parameter" or
//! "add a body"; [`Dialect`] decides what that looks like in the active
//! document version.
//!
//! | Concern          | 2.0                               | 3.x                                      |
//! |------------------|-----------------------------------|------------------------------------------|
//! | Definitions      | `#/definitions/`                  | `#/components/schemas/`                  |
//! | Path parameter   | `type: string` inline             | `schema: {type: string}`                 |
//! | Response schema  | `schema`                          | `content.application/json.schema`        |
//! | Request body     | `in: body` parameter              | `requestBody`                            |
//! | Media type lists | `produces`/`consumes`             | dropped                                  |

use serde_json::{json, Map, Value};

use crate::catalog::SchemaCatalog;
use crate::converter::{resolve_reference, schema_to_parameters};
use crate::descriptor::SchemaDescriptor;
use crate::types::{OpenApiVersion, V2_METHODS, V3_METHODS};

const V2_DEFINITIONS: &str = "#/definitions/";
const V3_DEFINITIONS: &str = "#/components/schemas/";

/// Operation fields with no 3.x counterpart; media types live in `content`.
const V2_ONLY_OPERATION_FIELDS: &[&str] = &["produces", "consumes"];

/// The document dialect, selected once from the configured version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Swagger2,
    OpenApi3,
}

/// Where a body schema ends up in the operation.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyEncoding {
    /// Parameters to append to the operation's list.
    Parameters(Vec<Value>),
    /// The operation's single `requestBody` object.
    RequestBody(Value),
}

impl BodyEncoding {
    /// The schema node an endpoint-level example is attached to.
    pub fn example_target(&mut self) -> Option<&mut Map<String, Value>> {
        match self {
            BodyEncoding::Parameters(params) => params
                .first_mut()
                .and_then(|p| p.get_mut("schema"))
                .and_then(Value::as_object_mut),
            BodyEncoding::RequestBody(body) => body
                .pointer_mut("/content/application~1json/schema")
                .and_then(Value::as_object_mut),
        }
    }
}

impl Dialect {
    pub fn for_version(version: OpenApiVersion) -> Self {
        if version.major() < 3 {
            Dialect::Swagger2
        } else {
            Dialect::OpenApi3
        }
    }

    /// Prefix of every `$ref` pointing at a named definition.
    pub fn definitions_prefix(&self) -> &'static str {
        match self {
            Dialect::Swagger2 => V2_DEFINITIONS,
            Dialect::OpenApi3 => V3_DEFINITIONS,
        }
    }

    /// `{"$ref": ...}` for a definition name.
    pub fn reference(&self, name: &str) -> Value {
        json!({ "$ref": format!("{}{}", self.definitions_prefix(), name) })
    }

    pub fn valid_methods(&self) -> &'static [&'static str] {
        match self {
            Dialect::Swagger2 => V2_METHODS,
            Dialect::OpenApi3 => V3_METHODS,
        }
    }

    pub fn is_valid_method(&self, method: &str) -> bool {
        self.valid_methods().contains(&method)
    }

    /// Examples are only attached to definitions already emitted in 2.0.
    pub fn example_requires_definition(&self) -> bool {
        matches!(self, Dialect::Swagger2)
    }

    /// Whether a free-form operation field is valid in this dialect.
    pub fn allows_operation_field(&self, key: &str) -> bool {
        match self {
            Dialect::Swagger2 => true,
            Dialect::OpenApi3 => !V2_ONLY_OPERATION_FIELDS.contains(&key),
        }
    }

    /// Parameter for a placeholder found in the path template.
    pub fn path_parameter(&self, name: &str) -> Value {
        match self {
            Dialect::Swagger2 => {
                json!({ "in": "path", "name": name, "required": true, "type": "string" })
            }
            Dialect::OpenApi3 => json!({
                "in": "path",
                "name": name,
                "required": true,
                "schema": { "type": "string" },
            }),
        }
    }

    /// Response object skeleton carrying `schema`.
    pub fn response_parameters(&self, schema: Value) -> Map<String, Value> {
        let mut out = Map::new();
        match self {
            Dialect::Swagger2 => {
                out.insert("schema".into(), schema);
            }
            Dialect::OpenApi3 => {
                out.insert(
                    "content".into(),
                    json!({ "application/json": { "schema": schema } }),
                );
            }
        }
        out
    }

    /// Encode a body/json schema descriptor.
    pub fn request_body(
        &self,
        catalog: &mut SchemaCatalog,
        descriptor: &SchemaDescriptor,
    ) -> BodyEncoding {
        match self {
            Dialect::Swagger2 => BodyEncoding::Parameters(schema_to_parameters(
                catalog,
                *self,
                &descriptor.schema,
                descriptor.location,
                &descriptor.options,
            )),
            Dialect::OpenApi3 => {
                let schema = resolve_reference(catalog, *self, &descriptor.schema);
                let mut body = Map::new();
                body.insert(
                    "content".into(),
                    json!({ "application/json": { "schema": schema } }),
                );
                for (key, value) in &descriptor.options {
                    body.insert(key.clone(), value.clone());
                }
                BodyEncoding::RequestBody(Value::Object(body))
            }
        }
    }

    /// One non-body parameter built from a field property.
    pub(crate) fn field_parameter(
        &self,
        location: &str,
        name: &str,
        required: bool,
        property: Value,
        multiple: bool,
    ) -> Value {
        let mut param = Map::new();
        param.insert("in".into(), json!(location));
        param.insert("name".into(), json!(name));
        param.insert("required".into(), json!(required));

        match self {
            Dialect::Swagger2 => {
                if multiple {
                    param.insert("collectionFormat".into(), json!("multi"));
                }
                if let Value::Object(prop) = property {
                    for (key, value) in prop {
                        param.insert(key, value);
                    }
                }
            }
            Dialect::OpenApi3 => {
                let mut property = property;
                if let Some(prop) = property.as_object_mut() {
                    if let Some(description) = prop.remove("description") {
                        param.insert("description".into(), description);
                    }
                }
                if multiple {
                    param.insert("style".into(), json!("form"));
                    param.insert("explode".into(), json!(true));
                }
                param.insert("schema".into(), property);
            }
        }
        Value::Object(param)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{default_name_resolver, Field, Schema};
    use crate::types::Location;
    use std::sync::Arc;

    fn body_descriptor(options: Map<String, Value>) -> SchemaDescriptor {
        let schema = Arc::new(Schema::new("RequestSchema").field(Field::integer("id")));
        SchemaDescriptor {
            schema,
            location: Location::Json,
            options,
            example: None,
            put_into: None,
        }
    }

    #[test]
    fn selects_dialect_by_major_version() {
        assert_eq!(Dialect::for_version(OpenApiVersion::V20), Dialect::Swagger2);
        assert_eq!(Dialect::for_version(OpenApiVersion::V303), Dialect::OpenApi3);
    }

    #[test]
    fn media_type_fields_only_in_v2() {
        assert!(Dialect::Swagger2.allows_operation_field("produces"));
        assert!(!Dialect::OpenApi3.allows_operation_field("produces"));
        assert!(!Dialect::OpenApi3.allows_operation_field("consumes"));
        assert!(Dialect::OpenApi3.allows_operation_field("tags"));
    }

    #[test]
    fn path_parameter_v2() {
        assert_eq!(
            Dialect::Swagger2.path_parameter("id"),
            json!({ "in": "path", "name": "id", "required": true, "type": "string" })
        );
    }

    #[test]
    fn path_parameter_v3() {
        assert_eq!(
            Dialect::OpenApi3.path_parameter("id"),
            json!({ "in": "path", "name": "id", "required": true, "schema": { "type": "string" } })
        );
    }

    #[test]
    fn response_parameters_v2() {
        let out = Dialect::Swagger2.response_parameters(json!({ "$ref": "#/definitions/A" }));
        assert_eq!(Value::Object(out), json!({ "schema": { "$ref": "#/definitions/A" } }));
    }

    #[test]
    fn response_parameters_v3() {
        let out =
            Dialect::OpenApi3.response_parameters(json!({ "$ref": "#/components/schemas/A" }));
        assert_eq!(
            Value::Object(out),
            json!({ "content": { "application/json": { "schema": { "$ref": "#/components/schemas/A" } } } })
        );
    }

    #[test]
    fn trace_only_valid_in_v3() {
        assert!(!Dialect::Swagger2.is_valid_method("trace"));
        assert!(Dialect::OpenApi3.is_valid_method("trace"));
        assert!(!Dialect::OpenApi3.is_valid_method("connect"));
    }

    #[test]
    fn request_body_v2_is_body_parameter() {
        let mut catalog = SchemaCatalog::new(default_name_resolver());
        let encoding = Dialect::Swagger2.request_body(&mut catalog, &body_descriptor(Map::new()));
        assert_eq!(
            encoding,
            BodyEncoding::Parameters(vec![json!({
                "in": "body",
                "required": false,
                "name": "body",
                "schema": { "$ref": "#/definitions/Request" },
            })])
        );
        assert!(catalog.contains("Request"));
    }

    #[test]
    fn request_body_v3_spreads_options() {
        let mut catalog = SchemaCatalog::new(default_name_resolver());
        let mut options = Map::new();
        options.insert("required".into(), json!(true));
        let encoding = Dialect::OpenApi3.request_body(&mut catalog, &body_descriptor(options));
        assert_eq!(
            encoding,
            BodyEncoding::RequestBody(json!({
                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Request" } } },
                "required": true,
            }))
        );
    }

    #[test]
    fn example_target_points_at_schema_node() {
        let mut encoding = BodyEncoding::RequestBody(json!({
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/A" } } }
        }));
        let target = encoding.example_target().unwrap();
        assert!(target.contains_key("$ref"));

        let mut encoding = BodyEncoding::Parameters(vec![]);
        assert!(encoding.example_target().is_none());
    }

    #[test]
    fn field_parameter_v3_hoists_description() {
        let param = Dialect::OpenApi3.field_parameter(
            "query",
            "name",
            false,
            json!({ "type": "string", "description": "name" }),
            false,
        );
        assert_eq!(
            param,
            json!({
                "in": "query",
                "name": "name",
                "required": false,
                "description": "name",
                "schema": { "type": "string" },
            })
        );
    }

    #[test]
    fn field_parameter_lists() {
        let prop = json!({ "type": "array", "items": { "type": "integer" } });
        let v2 = Dialect::Swagger2.field_parameter("query", "ids", false, prop.clone(), true);
        assert_eq!(v2["collectionFormat"], "multi");
        assert_eq!(v2["type"], "array");

        let v3 = Dialect::OpenApi3.field_parameter("query", "ids", false, prop, true);
        assert_eq!(v3["style"], "form");
        assert_eq!(v3["explode"], true);
        assert_eq!(v3["schema"]["items"]["type"], "integer");
    }
}
