//! Named schema definitions shared across a document.

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};
use tracing::warn;

use crate::schema::{Schema, SchemaKey, SchemaNameResolver};

/// Tracks named schema definitions for one document build.
///
/// Names are derived through the resolver once per schema identity and
/// then reused, so every reference to the same schema points at the same
/// definition.
pub struct SchemaCatalog {
    resolver: SchemaNameResolver,
    names: HashMap<SchemaKey, String>,
    owners: HashMap<String, SchemaKey>,
    definitions: Map<String, Value>,
}

impl SchemaCatalog {
    pub fn new(resolver: SchemaNameResolver) -> Self {
        Self {
            resolver,
            names: HashMap::new(),
            owners: HashMap::new(),
            definitions: Map::new(),
        }
    }

    /// Definition name for `schema`, stable for the catalog's lifetime.
    pub fn name_of(&mut self, schema: &Schema) -> String {
        let key = schema.key();
        if let Some(name) = self.names.get(&key) {
            return name.clone();
        }

        let name = (self.resolver)(schema);
        match self.owners.get(&name) {
            Some(owner) if *owner != key => {
                warn!(
                    name = %name,
                    schema = %key.name,
                    partial = key.partial,
                    "multiple schemas resolved to the same definition name"
                );
            }
            Some(_) => {}
            None => {
                self.owners.insert(name.clone(), key.clone());
            }
        }
        self.names.insert(key, name.clone());
        name
    }

    /// Store a definition body. An existing body under `name` is kept.
    pub fn register(&mut self, name: &str, body: Value) {
        if !self.definitions.contains_key(name) {
            self.definitions.insert(name.to_string(), body);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.definitions.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.definitions.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn definitions(&self) -> &Map<String, Value> {
        &self.definitions
    }

    pub fn into_definitions(self) -> Map<String, Value> {
        self.definitions
    }
}

impl fmt::Debug for SchemaCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaCatalog")
            .field("names", &self.names)
            .field("definitions", &self.definitions)
            .finish_non_exhaustive()
    }
}
