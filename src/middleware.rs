//! Per-request validation driven by handler descriptors.
//!
//! The middleware never touches the assembled document; it only reads the
//! shared [`HandlerTable`], so concurrent requests are independent.

use std::fmt;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::SpecConfig;
use crate::descriptor::HandlerTable;
use crate::error::ValidateError;
use crate::request::Request;
use crate::route::Endpoint;
use crate::validator::{JsonSchemaParser, RequestParser};

/// Custom mapping from a validation failure to the client response.
pub type ErrorCallback = Arc<dyn Fn(&ValidateError) -> Rejection + Send + Sync>;

/// Response returned instead of calling the handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub status: u16,
    pub body: Value,
}

impl Rejection {
    /// Default client error for a validation failure.
    ///
    /// Field errors become `422` with messages grouped by location and
    /// field; a malformed body is `400`; a broken schema is `500`.
    pub fn from_error(err: &ValidateError) -> Self {
        match err {
            ValidateError::Invalid { location, errors } => {
                let mut fields = Map::new();
                for error in errors {
                    let key = match error.path.trim_start_matches('/') {
                        "" => "_schema",
                        path => path,
                    };
                    let messages = fields
                        .entry(key.to_string())
                        .or_insert_with(|| Value::Array(Vec::new()));
                    if let Value::Array(messages) = messages {
                        messages.push(json!(error.message));
                    }
                }
                let mut body = Map::new();
                body.insert(location.to_string(), Value::Object(fields));
                Self {
                    status: 422,
                    body: Value::Object(body),
                }
            }
            ValidateError::MalformedBody { location, .. } => {
                let mut body = Map::new();
                body.insert(
                    location.to_string(),
                    json!({ "_schema": ["Invalid JSON body."] }),
                );
                Self {
                    status: 400,
                    body: Value::Object(body),
                }
            }
            ValidateError::InvalidSchema { message } => Self {
                status: 500,
                body: json!({ "error": message }),
            },
        }
    }
}

/// Validates requests against the schemas declared on their handler.
#[derive(Clone)]
pub struct ValidationMiddleware {
    handlers: Arc<HandlerTable>,
    parser: Arc<dyn RequestParser>,
    request_data_name: String,
    error_callback: Option<ErrorCallback>,
}

impl ValidationMiddleware {
    pub fn new(handlers: Arc<HandlerTable>, request_data_name: impl Into<String>) -> Self {
        Self {
            handlers,
            parser: Arc::new(JsonSchemaParser::new()),
            request_data_name: request_data_name.into(),
            error_callback: None,
        }
    }

    pub fn from_config(handlers: Arc<HandlerTable>, config: &SpecConfig) -> Self {
        Self::new(handlers, config.request_data_name.clone())
    }

    /// Replace the validation capability.
    pub fn with_parser(mut self, parser: impl RequestParser + 'static) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    pub fn with_error_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ValidateError) -> Rejection + Send + Sync + 'static,
    {
        self.error_callback = Some(Arc::new(callback));
        self
    }

    pub fn request_data_name(&self) -> &str {
        &self.request_data_name
    }

    /// Validate `request` for the matched `endpoint`.
    ///
    /// Requests whose handler has no descriptor pass through untouched.
    /// Otherwise each declared schema is parsed in order: values with a
    /// `put_into` slot are stored there, the rest are merged and stored
    /// under [`request_data_name`](Self::request_data_name).
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] to send instead of calling the handler.
    pub fn handle(&self, endpoint: &Endpoint, request: &mut Request) -> Result<(), Rejection> {
        let Some(handler) = endpoint.handler_for(&request.method) else {
            debug!(method = %request.method, "no handler for method, skipping validation");
            return Ok(());
        };
        let Some(descriptor) = self.handlers.get(handler) else {
            return Ok(());
        };

        let mut result = Value::Array(Vec::new());
        for schema in &descriptor.schemas {
            let data = self
                .parser
                .parse(&schema.schema, request, schema.location)
                .map_err(|err| {
                    debug!(%handler, location = %schema.location, error = %err, "request rejected");
                    self.reject(&err)
                })?;

            if let Some(slot) = &schema.put_into {
                request.insert(slot.clone(), data);
                continue;
            }
            if is_empty(&data) {
                continue;
            }
            match data {
                Value::Array(items) => match &mut result {
                    Value::Array(acc) => acc.extend(items),
                    _ => {
                        result = Value::Array(items);
                        break;
                    }
                },
                other => result = other,
            }
        }

        request.insert(self.request_data_name.clone(), result);
        Ok(())
    }

    fn reject(&self, err: &ValidateError) -> Rejection {
        match &self.error_callback {
            Some(callback) => callback(err),
            None => Rejection::from_error(err),
        }
    }
}

impl fmt::Debug for ValidationMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationMiddleware")
            .field("handlers", &self.handlers.len())
            .field("request_data_name", &self.request_data_name)
            .field("error_callback", &self.error_callback.is_some())
            .finish_non_exhaustive()
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
