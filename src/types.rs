//! Core types shared by assembly and validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AnnotateError, ConfigError};

/// HTTP methods an OpenAPI 2.0 operation may be keyed by.
pub const V2_METHODS: &[&str] = &["get", "put", "post", "delete", "options", "head", "patch"];

/// HTTP methods an OpenAPI 3.x operation may be keyed by.
pub const V3_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Where a piece of request data is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Body,
    Cookies,
    Files,
    Form,
    Headers,
    Json,
    MatchInfo,
    Path,
    Query,
    Querystring,
}

impl Location {
    /// Every location a schema may be declared for.
    pub const ALL: &'static [Location] = &[
        Location::Body,
        Location::Cookies,
        Location::Files,
        Location::Form,
        Location::Headers,
        Location::Json,
        Location::MatchInfo,
        Location::Path,
        Location::Query,
        Location::Querystring,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Body => "body",
            Location::Cookies => "cookies",
            Location::Files => "files",
            Location::Form => "form",
            Location::Headers => "headers",
            Location::Json => "json",
            Location::MatchInfo => "match_info",
            Location::Path => "path",
            Location::Query => "query",
            Location::Querystring => "querystring",
        }
    }

    /// Body locations are encoded as a request body, never as parameters.
    pub fn is_body(&self) -> bool {
        matches!(self, Location::Body | Location::Json)
    }

    /// The value of the parameter object's `in` field for this location.
    pub fn parameter_in(&self) -> &'static str {
        match self {
            Location::Query | Location::Querystring => "query",
            Location::Path | Location::MatchInfo => "path",
            Location::Headers => "header",
            Location::Cookies => "cookie",
            Location::Form | Location::Files => "formData",
            Location::Body | Location::Json => "body",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Location {
    type Err = AnnotateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Location::ALL
            .iter()
            .copied()
            .find(|loc| loc.as_str() == s)
            .ok_or_else(|| AnnotateError::InvalidLocation {
                location: s.to_string(),
            })
    }
}

/// Supported document dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OpenApiVersion {
    #[default]
    V20,
    V300,
    V301,
    V302,
    V303,
}

impl OpenApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpenApiVersion::V20 => "2.0",
            OpenApiVersion::V300 => "3.0.0",
            OpenApiVersion::V301 => "3.0.1",
            OpenApiVersion::V302 => "3.0.2",
            OpenApiVersion::V303 => "3.0.3",
        }
    }

    pub fn major(&self) -> u8 {
        match self {
            OpenApiVersion::V20 => 2,
            _ => 3,
        }
    }
}

impl fmt::Display for OpenApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OpenApiVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2.0" => Ok(OpenApiVersion::V20),
            "3.0.0" => Ok(OpenApiVersion::V300),
            "3.0.1" => Ok(OpenApiVersion::V301),
            "3.0.2" => Ok(OpenApiVersion::V302),
            "3.0.3" => Ok(OpenApiVersion::V303),
            _ => Err(ConfigError::InvalidOpenApiVersion {
                value: s.to_string(),
            }),
        }
    }
}
