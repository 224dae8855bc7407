//! Route table entries handed to the assembler and the middleware.

use indexmap::IndexMap;

use crate::descriptor::HandlerId;

/// Sub-handlers of a multi-method endpoint, keyed by lowercase method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewHandlers {
    methods: IndexMap<String, HandlerId>,
}

impl ViewHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: &str, handler: impl Into<HandlerId>) -> Self {
        self.methods.insert(method.to_lowercase(), handler.into());
        self
    }

    /// Sub-handler for `method` (any case).
    pub fn get(&self, method: &str) -> Option<&HandlerId> {
        self.methods.get(&method.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HandlerId)> {
        self.methods.iter().map(|(m, h)| (m.as_str(), h))
    }
}

/// What a route dispatches to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A single handler bound to one method.
    Function { method: String, handler: HandlerId },
    /// One handler per declared method.
    View(ViewHandlers),
}

impl Endpoint {
    /// Every (lowercase method, handler) pair served by this endpoint.
    pub fn operations(&self) -> Vec<(String, &HandlerId)> {
        match self {
            Endpoint::Function { method, handler } => vec![(method.to_lowercase(), handler)],
            Endpoint::View(view) => view.iter().map(|(m, h)| (m.to_string(), h)).collect(),
        }
    }

    /// Handler that serves a request with `method`.
    pub fn handler_for(&self, method: &str) -> Option<&HandlerId> {
        match self {
            Endpoint::Function { handler, .. } => Some(handler),
            Endpoint::View(view) => view.get(method),
        }
    }
}

/// One entry of the framework's route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Canonical path template; `None` when the route has no resolvable path.
    pub path: Option<String>,
    pub endpoint: Endpoint,
}

impl Route {
    pub fn new(method: &str, path: impl Into<String>, handler: impl Into<HandlerId>) -> Self {
        Self {
            path: Some(path.into()),
            endpoint: Endpoint::Function {
                method: method.to_string(),
                handler: handler.into(),
            },
        }
    }

    pub fn view(path: impl Into<String>, view: ViewHandlers) -> Self {
        Self {
            path: Some(path.into()),
            endpoint: Endpoint::View(view),
        }
    }

    /// Whether this route serves `method` at all.
    pub fn serves(&self, method: &str) -> bool {
        match &self.endpoint {
            Endpoint::Function { method: own, .. } => own.eq_ignore_ascii_case(method),
            Endpoint::View(view) => view.get(method).is_some(),
        }
    }

    /// Match a concrete request path, capturing placeholder segments.
    ///
    /// Only whole-segment placeholders capture; their patterns are not
    /// enforced.
    pub fn match_path(&self, path: &str) -> Option<IndexMap<String, String>> {
        let template = self.path.as_deref()?;
        let mut captures = IndexMap::new();
        let mut actual = path.split('/');
        for segment in template.split('/') {
            let value = actual.next()?;
            match placeholder(segment) {
                Some(name) if !value.is_empty() => {
                    captures.insert(name.to_string(), value.to_string());
                }
                Some(_) => return None,
                None if segment.replace("{{", "{").replace("}}", "}") == value => {}
                None => return None,
            }
        }
        if actual.next().is_some() {
            return None;
        }
        Some(captures)
    }
}

fn placeholder(segment: &str) -> Option<&str> {
    let body = segment.strip_prefix('{')?.strip_suffix('}')?;
    if body.starts_with('{') {
        return None;
    }
    let name = body.split([':', '!']).next().unwrap_or_default();
    (!name.is_empty()).then_some(name)
}

/// Placeholder names in a path template, in order of appearance.
///
/// Placeholders are `{name}` or `{name:pattern}`; doubled braces are
/// literal.
pub fn path_keys(path: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
            }
            '{' => {
                let mut depth = 1;
                let mut body = String::new();
                for inner in chars.by_ref() {
                    match inner {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    body.push(inner);
                }
                let name = body.split([':', '!']).next().unwrap_or_default();
                if !name.is_empty() {
                    keys.push(name.to_string());
                }
            }
            _ => {}
        }
    }
    keys
}
