//! Schema to OpenAPI conversion.
//!
//! Turns [`Schema`] values into definition bodies, `$ref` objects and
//! parameter lists. Nested schemas are registered in the catalog the first
//! time they are referenced.

use serde_json::{json, Map, Value};

use crate::catalog::SchemaCatalog;
use crate::dialect::Dialect;
use crate::schema::{Field, FieldKind, Schema};
use crate::types::Location;

/// `$ref` to the definition of `schema`, registering it on first use.
pub fn resolve_reference(catalog: &mut SchemaCatalog, dialect: Dialect, schema: &Schema) -> Value {
    let name = catalog.name_of(schema);
    if !catalog.contains(&name) {
        let body = schema_to_definition(catalog, dialect, schema);
        catalog.register(&name, body);
    }
    dialect.reference(&name)
}

/// Definition body for `schema`. Nested schemas become references.
pub fn schema_to_definition(
    catalog: &mut SchemaCatalog,
    dialect: Dialect,
    schema: &Schema,
) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in schema.fields() {
        properties.insert(field.name.clone(), field_property(catalog, dialect, field));
        if schema.requires(field) {
            required.push(json!(field.name));
        }
    }

    let mut body = Map::new();
    body.insert("type".into(), json!("object"));
    body.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        body.insert("required".into(), Value::Array(required));
    }
    Value::Object(body)
}

/// Parameter objects describing `schema` carried in `location`.
///
/// Body locations yield a single `in: body` parameter whose `name`,
/// `required` and `description` come from `options`. Every other location
/// yields one parameter per field.
pub fn schema_to_parameters(
    catalog: &mut SchemaCatalog,
    dialect: Dialect,
    schema: &Schema,
    location: Location,
    options: &Map<String, Value>,
) -> Vec<Value> {
    if location.is_body() {
        let mut param = Map::new();
        param.insert("in".into(), json!(location.parameter_in()));
        param.insert(
            "required".into(),
            options.get("required").cloned().unwrap_or(json!(false)),
        );
        param.insert(
            "name".into(),
            options.get("name").cloned().unwrap_or(json!("body")),
        );
        if let Some(description) = options.get("description") {
            param.insert("description".into(), description.clone());
        }
        param.insert("schema".into(), resolve_reference(catalog, dialect, schema));
        return vec![Value::Object(param)];
    }

    let param_in = location.parameter_in();
    schema
        .fields()
        .iter()
        .map(|field| {
            let required = param_in == "path" || schema.requires(field);
            let property = field_property(catalog, dialect, field);
            dialect.field_parameter(param_in, &field.name, required, property, field.is_list())
        })
        .collect()
}

fn field_property(catalog: &mut SchemaCatalog, dialect: Dialect, field: &Field) -> Value {
    let mut property = kind_property(catalog, dialect, &field.kind);
    if let Value::Object(map) = &mut property {
        if !field.enum_values.is_empty() {
            map.insert("enum".into(), Value::Array(field.enum_values.clone()));
        }
        if let Some(description) = &field.description {
            map.insert("description".into(), json!(description));
        }
    }
    property
}

fn kind_property(catalog: &mut SchemaCatalog, dialect: Dialect, kind: &FieldKind) -> Value {
    match kind {
        FieldKind::List(items) => {
            json!({ "type": "array", "items": kind_property(catalog, dialect, items) })
        }
        FieldKind::Nested(schema) => resolve_reference(catalog, dialect, schema),
        other => other.primitive_property().unwrap_or_else(|| json!({})),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::default_name_resolver;
    use std::sync::Arc;

    fn nested() -> Arc<Schema> {
        Arc::new(Schema::new("MyNestedSchema").field(Field::integer("i")))
    }

    fn request_schema() -> Schema {
        Schema::new("RequestSchema")
            .field(Field::integer("id"))
            .field(Field::string("name").description("name"))
            .field(Field::boolean("bool_field"))
            .field(Field::list("list_field", FieldKind::Integer))
            .field(Field::nested("nested_field", nested()))
    }

    #[test]
    fn query_parameters_v2() {
        let mut catalog = SchemaCatalog::new(default_name_resolver());
        let params = schema_to_parameters(
            &mut catalog,
            Dialect::Swagger2,
            &request_schema(),
            Location::Query,
            &Map::new(),
        );

        assert_eq!(
            params,
            vec![
                json!({ "in": "query", "name": "id", "required": false, "type": "integer" }),
                json!({ "in": "query", "name": "name", "required": false, "type": "string", "description": "name" }),
                json!({ "in": "query", "name": "bool_field", "required": false, "type": "boolean" }),
                json!({
                    "in": "query",
                    "name": "list_field",
                    "required": false,
                    "collectionFormat": "multi",
                    "type": "array",
                    "items": { "type": "integer" },
                }),
                json!({ "in": "query", "name": "nested_field", "required": false, "$ref": "#/definitions/MyNested" }),
            ]
        );
        // Nested schemas are emitted as definitions, the outer one is not.
        assert!(catalog.contains("MyNested"));
        assert!(!catalog.contains("Request"));
    }

    #[test]
    fn description_only_when_declared() {
        let mut catalog = SchemaCatalog::new(default_name_resolver());
        let params = schema_to_parameters(
            &mut catalog,
            Dialect::Swagger2,
            &request_schema(),
            Location::Query,
            &Map::new(),
        );
        let with_description: Vec<_> = params
            .iter()
            .filter(|p| p.get("description").is_some())
            .map(|p| p["name"].clone())
            .collect();
        assert_eq!(with_description, vec![json!("name")]);
    }

    #[test]
    fn required_follows_field_and_partial() {
        let schema = Schema::new("User")
            .field(Field::integer("id").required())
            .field(Field::string("name"));
        let mut catalog = SchemaCatalog::new(default_name_resolver());

        let params = schema_to_parameters(
            &mut catalog,
            Dialect::OpenApi3,
            &schema,
            Location::Query,
            &Map::new(),
        );
        assert_eq!(params[0]["required"], true);
        assert_eq!(params[1]["required"], false);

        let params = schema_to_parameters(
            &mut catalog,
            Dialect::OpenApi3,
            &schema.partial(),
            Location::Query,
            &Map::new(),
        );
        assert_eq!(params[0]["required"], false);
    }

    #[test]
    fn path_location_always_required() {
        let schema = Schema::new("Ids").field(Field::integer("id"));
        let mut catalog = SchemaCatalog::new(default_name_resolver());
        let params = schema_to_parameters(
            &mut catalog,
            Dialect::Swagger2,
            &schema,
            Location::MatchInfo,
            &Map::new(),
        );
        assert_eq!(params[0]["in"], "path");
        assert_eq!(params[0]["required"], true);
    }

    #[test]
    fn body_parameter_honours_options() {
        let mut options = Map::new();
        options.insert("required".into(), json!(true));
        options.insert("name".into(), json!("payload"));
        options.insert("description".into(), json!("the payload"));
        let mut catalog = SchemaCatalog::new(default_name_resolver());
        let params = schema_to_parameters(
            &mut catalog,
            Dialect::Swagger2,
            &request_schema(),
            Location::Json,
            &options,
        );
        assert_eq!(
            params,
            vec![json!({
                "in": "body",
                "required": true,
                "name": "payload",
                "description": "the payload",
                "schema": { "$ref": "#/definitions/Request" },
            })]
        );
    }

    #[test]
    fn definition_uses_references_for_nested() {
        let mut catalog = SchemaCatalog::new(default_name_resolver());
        resolve_reference(&mut catalog, Dialect::Swagger2, &request_schema());
        assert_eq!(
            catalog.get("Request").unwrap()["properties"]["nested_field"],
            json!({ "$ref": "#/definitions/MyNested" })
        );
        assert_eq!(
            catalog.get("MyNested").unwrap(),
            &json!({ "type": "object", "properties": { "i": { "type": "integer" } } })
        );
    }

    #[test]
    fn definition_required_list() {
        let schema = Schema::new("UserSchema")
            .field(Field::integer("id").required())
            .field(Field::string("gender").one_of(["f", "m"]));
        let mut catalog = SchemaCatalog::new(default_name_resolver());
        let body = schema_to_definition(&mut catalog, Dialect::OpenApi3, &schema);
        assert_eq!(body["required"], json!(["id"]));
        assert_eq!(body["properties"]["gender"]["enum"], json!(["f", "m"]));
    }

    #[test]
    fn v3_references_use_components() {
        let mut catalog = SchemaCatalog::new(default_name_resolver());
        let reference = resolve_reference(&mut catalog, Dialect::OpenApi3, &request_schema());
        assert_eq!(reference, json!({ "$ref": "#/components/schemas/Request" }));
        assert_eq!(
            catalog.get("Request").unwrap()["properties"]["nested_field"],
            json!({ "$ref": "#/components/schemas/MyNested" })
        );
    }

    #[test]
    fn list_of_nested_references_items() {
        let schema = Schema::new("UsersListSchema").field(Field::list(
            "users",
            FieldKind::Nested(Arc::new(Schema::new("User"))),
        ));
        let mut catalog = SchemaCatalog::new(default_name_resolver());
        resolve_reference(&mut catalog, Dialect::Swagger2, &schema);
        assert_eq!(
            catalog.get("UsersList").unwrap()["properties"]["users"],
            json!({ "type": "array", "items": { "$ref": "#/definitions/User" } })
        );
    }
}
