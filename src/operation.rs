//! Builds one operation object from a handler descriptor.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::catalog::SchemaCatalog;
use crate::converter::{resolve_reference, schema_to_parameters};
use crate::descriptor::{HandlerDescriptor, ResponseDescriptor, RESERVED_KEYS};
use crate::dialect::{BodyEncoding, Dialect};
use crate::example::ExampleInjector;
use crate::route::path_keys;

/// Merges a descriptor's parameters, schemas, path placeholders and
/// responses into an operation object.
#[derive(Debug, Clone, Copy)]
pub struct OperationBuilder {
    dialect: Dialect,
    injector: ExampleInjector,
}

impl OperationBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            injector: ExampleInjector::new(dialect),
        }
    }

    /// Build the operation for `descriptor` served at `path`.
    ///
    /// The descriptor is only read; the same descriptor can be built again
    /// for another method or another document.
    pub fn build(
        &self,
        catalog: &mut SchemaCatalog,
        descriptor: &HandlerDescriptor,
        path: &str,
    ) -> Map<String, Value> {
        let mut parameters = descriptor.parameters.clone();
        let mut request_body = None;

        for schema in &descriptor.schemas {
            if schema.location.is_body() {
                let mut encoding = self.dialect.request_body(catalog, schema);
                self.injector.attach(
                    catalog,
                    &schema.schema,
                    schema.example.as_ref(),
                    encoding.example_target(),
                );
                match encoding {
                    BodyEncoding::Parameters(params) => parameters.extend(params),
                    BodyEncoding::RequestBody(body) => request_body = Some(body),
                }
            } else {
                let mut params = schema_to_parameters(
                    catalog,
                    self.dialect,
                    &schema.schema,
                    schema.location,
                    &schema.options,
                );
                let target = params
                    .first_mut()
                    .and_then(|p| p.get_mut("schema"))
                    .and_then(Value::as_object_mut);
                self.injector
                    .attach(catalog, &schema.schema, schema.example.as_ref(), target);
                parameters.extend(params);
            }
        }

        self.add_path_parameters(path, &mut parameters);

        let mut operation = Map::new();
        operation.insert("parameters".into(), Value::Array(parameters));
        if let Some(body) = request_body {
            operation.insert("requestBody".into(), body);
        }
        operation.insert(
            "responses".into(),
            Value::Object(self.responses(catalog, descriptor)),
        );

        for (key, value) in &descriptor.fields {
            if !RESERVED_KEYS.contains(&key.as_str())
                && self.dialect.allows_operation_field(key)
            {
                operation.insert(key.clone(), value.clone());
            }
        }
        operation
    }

    fn add_path_parameters(&self, path: &str, parameters: &mut Vec<Value>) {
        let mut existing: HashSet<String> = parameters
            .iter()
            .filter(|p| p.get("in").and_then(Value::as_str) == Some("path"))
            .filter_map(|p| p.get("name").and_then(Value::as_str).map(str::to_string))
            .collect();

        for key in path_keys(path) {
            if existing.insert(key.clone()) {
                parameters.push(self.dialect.path_parameter(&key));
            }
        }
    }

    fn responses(
        &self,
        catalog: &mut SchemaCatalog,
        descriptor: &HandlerDescriptor,
    ) -> Map<String, Value> {
        let mut responses = Map::new();
        for (code, response) in &descriptor.responses {
            let value = match response {
                ResponseDescriptor::Schema(response) => {
                    let reference = resolve_reference(catalog, self.dialect, &response.schema);
                    let mut out = self.dialect.response_parameters(reference);
                    out.insert("description".into(), Value::String(response.description.clone()));
                    if let Some(headers) = &response.headers {
                        out.insert("headers".into(), headers.clone());
                    }
                    if let Some(examples) = &response.examples {
                        out.insert("examples".into(), examples.clone());
                    }
                    Value::Object(out)
                }
                ResponseDescriptor::Raw(raw) => raw.clone(),
            };
            responses.insert(code.clone(), value);
        }
        responses
    }
}
