//! Walks the route table and accumulates operations into a document.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::catalog::SchemaCatalog;
use crate::config::SpecConfig;
use crate::descriptor::HandlerTable;
use crate::dialect::Dialect;
use crate::operation::OperationBuilder;
use crate::route::Route;
use crate::schema::SchemaNameResolver;
use crate::types::OpenApiVersion;

/// A finished, read-only API document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    version: OpenApiVersion,
    info: Map<String, Value>,
    paths: Map<String, Value>,
    definitions: Map<String, Value>,
    extra: Map<String, Value>,
}

impl Document {
    pub fn version(&self) -> OpenApiVersion {
        self.version
    }

    pub fn paths(&self) -> &Map<String, Value> {
        &self.paths
    }

    pub fn definitions(&self) -> &Map<String, Value> {
        &self.definitions
    }

    /// Operation documented for `path` and (lowercase) `method`.
    pub fn operation(&self, path: &str, method: &str) -> Option<&Value> {
        self.paths.get(path)?.get(method)
    }

    /// Render the document in its dialect's layout.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        match Dialect::for_version(self.version) {
            Dialect::Swagger2 => {
                out.insert("swagger".into(), json!(self.version.as_str()));
                out.insert("info".into(), Value::Object(self.info.clone()));
                out.insert("paths".into(), Value::Object(self.paths.clone()));
                if !self.definitions.is_empty() {
                    out.insert(
                        "definitions".into(),
                        Value::Object(self.definitions.clone()),
                    );
                }
            }
            Dialect::OpenApi3 => {
                out.insert("openapi".into(), json!(self.version.as_str()));
                out.insert("info".into(), Value::Object(self.info.clone()));
                out.insert("paths".into(), Value::Object(self.paths.clone()));
                if !self.definitions.is_empty() {
                    out.insert(
                        "components".into(),
                        json!({ "schemas": Value::Object(self.definitions.clone()) }),
                    );
                }
            }
        }
        merge_missing(&mut out, &self.extra);
        Value::Object(out)
    }
}

/// Merge `extra` into `target`, recursing into objects; existing scalar
/// values win.
fn merge_missing(target: &mut Map<String, Value>, extra: &Map<String, Value>) {
    for (key, value) in extra {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_missing(existing, incoming);
            }
            (Some(_), _) => {}
            (None, _) => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Builds the document once from a route table.
pub struct DocumentAssembler {
    config: SpecConfig,
    dialect: Dialect,
    builder: OperationBuilder,
    catalog: SchemaCatalog,
    paths: Map<String, Value>,
    document: Option<Arc<Document>>,
}

impl DocumentAssembler {
    pub fn new(config: SpecConfig, resolver: SchemaNameResolver) -> Self {
        let dialect = Dialect::for_version(config.openapi_version);
        Self {
            config,
            dialect,
            builder: OperationBuilder::new(dialect),
            catalog: SchemaCatalog::new(resolver),
            paths: Map::new(),
            document: None,
        }
    }

    pub fn is_assembled(&self) -> bool {
        self.document.is_some()
    }

    pub fn document(&self) -> Option<&Arc<Document>> {
        self.document.as_ref()
    }

    /// Document every route, then freeze the result.
    ///
    /// A second call returns the existing document unchanged.
    pub fn assemble(&mut self, routes: &[Route], handlers: &HandlerTable) -> Arc<Document> {
        if let Some(document) = &self.document {
            warn!("API spec is already registered, skipping registration");
            return document.clone();
        }

        for route in routes {
            self.add_route(route, handlers);
        }

        let mut info = Map::new();
        info.insert("title".into(), json!(self.config.title));
        info.insert("version".into(), json!(self.config.version));
        for (key, value) in &self.config.info {
            info.insert(key.clone(), value.clone());
        }

        let document = Arc::new(Document {
            version: self.config.openapi_version,
            info,
            paths: std::mem::take(&mut self.paths),
            definitions: self.catalog.definitions().clone(),
            extra: self.config.extra.clone(),
        });
        self.document = Some(document.clone());
        document
    }

    fn add_route(&mut self, route: &Route, handlers: &HandlerTable) {
        let Some(path) = route.path.as_deref().filter(|p| !p.is_empty()) else {
            debug!("route has no path, skipping");
            return;
        };
        let full_path = format!("{}{}", self.config.prefix, path);

        for (method, handler) in route.endpoint.operations() {
            let Some(descriptor) = handlers.get(handler) else {
                debug!(path = %full_path, %method, %handler, "handler is not documented");
                continue;
            };
            if !self.dialect.is_valid_method(&method) {
                debug!(path = %full_path, %method, "method not supported by dialect");
                continue;
            }

            let operation = self.builder.build(&mut self.catalog, descriptor, &full_path);
            let entry = self
                .paths
                .entry(full_path.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(methods) = entry {
                methods.insert(method, Value::Object(operation));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::ViewHandlers;
    use crate::schema::{default_name_resolver, Field, Schema};

    fn assembler(version: &str) -> DocumentAssembler {
        let config = SpecConfig::default().openapi_version(version).unwrap();
        DocumentAssembler::new(config, default_name_resolver())
    }

    fn documented(table: &mut HandlerTable, id: &str) {
        table.docs(id, json!({ "summary": id }));
    }

    #[test]
    fn skips_undocumented_handlers() {
        let table = HandlerTable::new();
        let mut asm = assembler("2.0");
        let doc = asm.assemble(&[Route::new("GET", "/a", "nobody")], &table);
        assert!(doc.paths().is_empty());
    }

    #[test]
    fn skips_routes_without_path() {
        let mut table = HandlerTable::new();
        documented(&mut table, "h");
        let mut route = Route::new("GET", "/a", "h");
        route.path = None;
        let doc = assembler("2.0").assemble(&[route], &table);
        assert!(doc.paths().is_empty());
    }

    #[test]
    fn skips_invalid_methods() {
        let mut table = HandlerTable::new();
        documented(&mut table, "h");
        let routes = [Route::new("TRACE", "/a", "h"), Route::new("*", "/b", "h")];
        let doc = assembler("2.0").assemble(&routes, &table);
        assert!(doc.paths().is_empty());

        let doc = assembler("3.0.0").assemble(&routes, &table);
        assert!(doc.operation("/a", "trace").is_some());
        assert!(doc.operation("/b", "*").is_none());
    }

    #[test]
    fn view_expands_per_method() {
        let mut table = HandlerTable::new();
        documented(&mut table, "View.get");
        documented(&mut table, "View.post");
        let view = ViewHandlers::new()
            .method("get", "View.get")
            .method("post", "View.post")
            .method("delete", "View.delete");
        let doc = assembler("2.0").assemble(&[Route::view("/items", view)], &table);
        assert_eq!(doc.operation("/items", "get").unwrap()["summary"], "View.get");
        assert_eq!(doc.operation("/items", "post").unwrap()["summary"], "View.post");
        assert!(doc.operation("/items", "delete").is_none());
    }

    #[test]
    fn prefix_applied() {
        let mut table = HandlerTable::new();
        documented(&mut table, "h");
        let config = SpecConfig::default().prefix("/v1");
        let doc = DocumentAssembler::new(config, default_name_resolver())
            .assemble(&[Route::new("GET", "/users/{id}", "h")], &table);
        let op = doc.operation("/v1/users/{id}", "get").unwrap();
        assert_eq!(op["parameters"][0]["name"], "id");
    }

    #[test]
    fn second_assembly_is_noop() {
        let mut table = HandlerTable::new();
        documented(&mut table, "h");
        let mut asm = assembler("2.0");
        let first = asm.assemble(&[Route::new("GET", "/a", "h")], &table);
        let second = asm.assemble(
            &[Route::new("GET", "/a", "h"), Route::new("POST", "/b", "h")],
            &table,
        );
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.paths().len(), 1);
        assert!(asm.is_assembled());
    }

    #[test]
    fn v2_layout() {
        let mut table = HandlerTable::new();
        table
            .json_schema("h", Schema::new("UserSchema").field(Field::integer("id")))
            .unwrap();
        let config = SpecConfig::default().extra_field("basePath", json!("/api"));
        let doc = DocumentAssembler::new(config, default_name_resolver())
            .assemble(&[Route::new("POST", "/users", "h")], &table);
        let out = doc.to_json();
        assert_eq!(out["swagger"], "2.0");
        assert_eq!(out["info"], json!({ "title": "API documentation", "version": "0.0.1" }));
        assert_eq!(out["basePath"], "/api");
        assert!(out["definitions"].get("User").is_some());
        assert!(out.get("components").is_none());
    }

    #[test]
    fn v2_without_definitions_omits_key() {
        let doc = assembler("2.0").assemble(&[], &HandlerTable::new());
        assert!(doc.to_json().get("definitions").is_none());
    }

    #[test]
    fn v3_without_schemas_omits_components() {
        let doc = assembler("3.0.0").assemble(&[], &HandlerTable::new());
        let out = doc.to_json();
        assert_eq!(out["openapi"], "3.0.0");
        assert!(out.get("components").is_none());
    }

    #[test]
    fn v3_layout_merges_extra_components() {
        let mut table = HandlerTable::new();
        table
            .json_schema("h", Schema::new("UserSchema").field(Field::integer("id")))
            .unwrap();
        let config = SpecConfig::default()
            .openapi_version("3.0.3")
            .unwrap()
            .extra_field(
                "components",
                json!({ "securitySchemes": { "bearer": { "type": "http", "scheme": "bearer" } } }),
            );
        let doc = DocumentAssembler::new(config, default_name_resolver())
            .assemble(&[Route::new("POST", "/users", "h")], &table);
        let out = doc.to_json();
        assert_eq!(out["openapi"], "3.0.3");
        assert!(out["components"]["schemas"].get("User").is_some());
        assert_eq!(out["components"]["securitySchemes"]["bearer"]["scheme"], "bearer");
        assert!(out.get("definitions").is_none());
    }

    #[test]
    fn extra_does_not_override_core_fields() {
        let config = SpecConfig::default().extra_field("swagger", json!("1.2"));
        let doc = DocumentAssembler::new(config, default_name_resolver())
            .assemble(&[], &HandlerTable::new());
        assert_eq!(doc.to_json()["swagger"], "2.0");
    }
}
