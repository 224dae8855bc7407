//! Document and middleware configuration.

use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::types::OpenApiVersion;

pub const DEFAULT_TITLE: &str = "API documentation";
pub const DEFAULT_VERSION: &str = "0.0.1";
pub const DEFAULT_URL: &str = "/api/docs/swagger.json";
pub const DEFAULT_REQUEST_DATA_NAME: &str = "data";

/// Configuration for one [`ApiSpec`](crate::ApiSpec).
///
/// ```
/// use route_apispec::SpecConfig;
///
/// let config = SpecConfig::new("Pets", "1.0.0")
///     .openapi_version("3.0.2")
///     .unwrap()
///     .prefix("/v1");
/// assert_eq!(config.openapi_version.as_str(), "3.0.2");
///
/// assert!(SpecConfig::default().openapi_version("4.0").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct SpecConfig {
    pub title: String,
    pub version: String,
    pub openapi_version: OpenApiVersion,
    /// Path of the document endpoint. `None` or empty disables it.
    pub url: Option<String>,
    /// Request slot the merged validated data is stored under.
    pub request_data_name: String,
    /// Prepended to every documented path.
    pub prefix: String,
    /// Extra fields of the `info` object.
    pub info: Map<String, Value>,
    /// Extra top-level document fields (`host`, `basePath`, `tags`, ...).
    pub extra: Map<String, Value>,
}

impl Default for SpecConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            version: DEFAULT_VERSION.to_string(),
            openapi_version: OpenApiVersion::default(),
            url: Some(DEFAULT_URL.to_string()),
            request_data_name: DEFAULT_REQUEST_DATA_NAME.to_string(),
            prefix: String::new(),
            info: Map::new(),
            extra: Map::new(),
        }
    }
}

impl SpecConfig {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Select the document dialect.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidOpenApiVersion` for unsupported versions.
    pub fn openapi_version(mut self, version: &str) -> Result<Self, ConfigError> {
        self.openapi_version = version.parse()?;
        Ok(self)
    }

    pub fn url(mut self, url: Option<&str>) -> Self {
        self.url = url.map(str::to_string);
        self
    }

    pub fn request_data_name(mut self, name: impl Into<String>) -> Self {
        self.request_data_name = name.into();
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn info_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.info.insert(key.into(), value);
        self
    }

    pub fn extra_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults() {
        let config = SpecConfig::default();
        assert_eq!(config.title, "API documentation");
        assert_eq!(config.version, "0.0.1");
        assert_eq!(config.openapi_version, OpenApiVersion::V20);
        assert_eq!(config.url.as_deref(), Some("/api/docs/swagger.json"));
        assert_eq!(config.request_data_name, "data");
        assert!(config.prefix.is_empty());
    }

    #[test]
    fn invalid_version_rejected() {
        let err = SpecConfig::default().openapi_version("3.1").unwrap_err();
        assert_eq!(err.to_string(), "invalid `openapi_version`: \"3.1\"");
    }

    #[test]
    fn builder_fields() {
        let config = SpecConfig::new("T", "2")
            .url(None)
            .request_data_name("validated")
            .info_field("description", json!("d"))
            .extra_field("basePath", json!("/api"));
        assert!(config.url.is_none());
        assert_eq!(config.request_data_name, "validated");
        assert_eq!(config.info["description"], "d");
        assert_eq!(config.extra["basePath"], "/api");
    }
}
