//! Framework-neutral view of an incoming request.

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// The parts of a request the validation capability reads, plus the
/// request-scoped slots validated data is stored in.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub method: String,
    pub match_info: IndexMap<String, String>,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub cookies: IndexMap<String, String>,
    pub form: Vec<(String, String)>,
    pub body: Option<String>,
    slots: Map<String, Value>,
}

impl Request {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    /// Append every pair of an urlencoded query string.
    pub fn query_string(mut self, query: &str) -> Self {
        self.query.extend(
            form_urlencoded::parse(query.trim_start_matches('?').as_bytes()).into_owned(),
        );
        self
    }

    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn cookie(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(key.into(), value.into());
        self
    }

    pub fn match_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.match_info.insert(key.into(), value.into());
        self
    }

    pub fn form_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Value stored under `slot`, if any.
    pub fn get(&self, slot: &str) -> Option<&Value> {
        self.slots.get(slot)
    }

    pub fn insert(&mut self, slot: impl Into<String>, value: Value) {
        self.slots.insert(slot.into(), value);
    }

    pub fn slots(&self) -> &Map<String, Value> {
        &self.slots
    }
}
