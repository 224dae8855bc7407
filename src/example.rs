//! User-supplied examples for request schemas.
//!
//! An example either lands on the shared definition (`add_to_refs`) or on
//! the operation's own reference, which is rewritten to
//! `{"allOf": [{"$ref": ...}], "example": ...}` so the definition stays
//! untouched.

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::catalog::SchemaCatalog;
use crate::dialect::Dialect;
use crate::schema::Schema;

const ADD_TO_REFS: &str = "add_to_refs";

/// An example payload and where it should be attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub value: Value,
    pub add_to_refs: bool,
}

impl Example {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            add_to_refs: false,
        }
    }

    pub fn add_to_refs(mut self, add_to_refs: bool) -> Self {
        self.add_to_refs = add_to_refs;
        self
    }

    /// Split an `add_to_refs` flag out of a raw example object.
    ///
    /// ```
    /// use route_apispec::Example;
    /// use serde_json::json;
    ///
    /// let example = Example::from_payload(json!({ "id": 1, "add_to_refs": true }));
    /// assert!(example.add_to_refs);
    /// assert_eq!(example.value, json!({ "id": 1 }));
    /// ```
    pub fn from_payload(mut value: Value) -> Self {
        let add_to_refs = value
            .as_object_mut()
            .and_then(|obj| obj.remove(ADD_TO_REFS))
            .and_then(|flag| flag.as_bool())
            .unwrap_or(false);
        Self { value, add_to_refs }
    }
}

/// Collapse a doubled definitions prefix (`#/definitions/#/definitions/X`).
pub fn collapse_ref(path: &str, prefix: &str) -> String {
    let doubled = format!("{prefix}{prefix}");
    let mut out = path.to_string();
    while out.contains(&doubled) {
        out = out.replace(&doubled, prefix);
    }
    out
}

/// Attaches examples according to the active dialect's rules.
#[derive(Debug, Clone, Copy)]
pub struct ExampleInjector {
    dialect: Dialect,
}

impl ExampleInjector {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// Attach `example` for `schema`.
    ///
    /// `target` is the schema node of the first generated parameter (or of
    /// the request body); it must hold the `$ref` being decorated.
    pub fn attach(
        &self,
        catalog: &mut SchemaCatalog,
        schema: &Schema,
        example: Option<&Example>,
        target: Option<&mut Map<String, Value>>,
    ) {
        let Some(example) = example else {
            return;
        };

        let name = catalog.name_of(schema);
        if self.dialect.example_requires_definition() && !catalog.contains(&name) {
            debug!(schema = %name, "no definition emitted, skipping example");
            return;
        }

        if example.add_to_refs {
            match catalog.get_mut(&name).and_then(Value::as_object_mut) {
                Some(definition) => {
                    definition.insert("example".into(), example.value.clone());
                }
                None => debug!(schema = %name, "no definition to carry example"),
            }
            return;
        }

        let Some(target) = target else {
            return;
        };
        match target.remove("$ref") {
            Some(Value::String(path)) => {
                let path = collapse_ref(&path, self.dialect.definitions_prefix());
                target.insert("allOf".into(), json!([{ "$ref": path }]));
                target.insert("example".into(), example.value.clone());
            }
            Some(other) => {
                target.insert("$ref".into(), other);
            }
            None => debug!(schema = %name, "parameter schema holds no reference, skipping example"),
        }
    }
}
