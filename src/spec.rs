//! Application-facing entry point tying configuration, assembly and serving
//! together.

use std::sync::Arc;

use serde_json::Value;

use crate::assembler::{Document, DocumentAssembler};
use crate::config::SpecConfig;
use crate::descriptor::HandlerTable;
use crate::error::SpecError;
use crate::middleware::ValidationMiddleware;
use crate::route::Route;
use crate::schema::SchemaNameResolver;

/// One API document for one application.
///
/// ```
/// use route_apispec::{default_name_resolver, ApiSpec, HandlerTable, Route, SpecConfig};
/// use serde_json::json;
///
/// let mut handlers = HandlerTable::new();
/// handlers.docs("index", json!({ "summary": "Index" }));
///
/// let mut spec = ApiSpec::new(SpecConfig::default(), default_name_resolver());
/// assert!(spec.document().is_err());
///
/// spec.register(&[Route::new("GET", "/", "index")], &handlers);
/// let doc = spec.swagger_dict().unwrap();
/// assert_eq!(doc["paths"]["/"]["get"]["summary"], "Index");
/// assert_eq!(spec.endpoint().unwrap().path(), "/api/docs/swagger.json");
/// ```
pub struct ApiSpec {
    config: SpecConfig,
    assembler: DocumentAssembler,
}

impl ApiSpec {
    pub fn new(config: SpecConfig, resolver: SchemaNameResolver) -> Self {
        let assembler = DocumentAssembler::new(config.clone(), resolver);
        Self { config, assembler }
    }

    pub fn config(&self) -> &SpecConfig {
        &self.config
    }

    /// Document the route table. Only the first call has any effect.
    pub fn register(&mut self, routes: &[Route], handlers: &HandlerTable) -> Arc<Document> {
        self.assembler.assemble(routes, handlers)
    }

    /// The assembled document.
    ///
    /// # Errors
    ///
    /// Returns `SpecError::NotAssembled` before [`register`](Self::register).
    pub fn document(&self) -> Result<&Arc<Document>, SpecError> {
        self.assembler.document().ok_or(SpecError::NotAssembled)
    }

    /// The assembled document as a JSON value.
    pub fn swagger_dict(&self) -> Result<Value, SpecError> {
        Ok(self.document()?.to_json())
    }

    /// Route serving the document, if a url is configured.
    pub fn endpoint(&self) -> Option<SpecEndpoint> {
        SpecEndpoint::from_url(self.config.url.as_deref())
    }

    /// Validation middleware sharing this spec's request data slot name.
    pub fn middleware(&self, handlers: Arc<HandlerTable>) -> ValidationMiddleware {
        ValidationMiddleware::from_config(handlers, &self.config)
    }
}

/// GET route returning the document as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecEndpoint {
    path: String,
}

impl SpecEndpoint {
    /// `None` when `url` is missing or empty; relative urls are rooted.
    pub fn from_url(url: Option<&str>) -> Option<Self> {
        let url = url.filter(|u| !u.is_empty())?;
        let path = if url.starts_with('/') {
            url.to_string()
        } else {
            format!("/{url}")
        };
        Some(Self { path })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &'static str {
        "GET"
    }

    /// JSON response body.
    pub fn render(&self, document: &Document) -> Result<String, SpecError> {
        serde_json::to_string(&document.to_json()).map_err(|source| SpecError::Serialize { source })
    }
}
