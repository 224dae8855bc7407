//! Error types for document assembly, annotation and request validation.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::Location;

/// Errors raised while building a [`SpecConfig`](crate::SpecConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid `openapi_version`: {value:?}")]
    InvalidOpenApiVersion { value: String },
}

/// Errors raised while attaching metadata to a handler.
#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("invalid schema location {location:?}")]
    InvalidLocation { location: String },

    #[error("handler '{handler}' declares more than one body location")]
    MultipleBodyLocations { handler: String },
}

/// Errors raised by the [`ApiSpec`](crate::ApiSpec) facade.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("the API document has not been assembled yet")]
    NotAssembled,

    #[error("failed to render document: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },
}

/// Errors while loading a route manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown schema '{name}' referenced from {context}")]
    UnknownSchema { name: String, context: String },

    #[error("schema '{name}' is part of a nesting cycle")]
    SchemaCycle { name: String },

    #[error("route {path} references unknown handler '{handler}'")]
    UnknownHandler { path: String, handler: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Annotate(#[from] AnnotateError),
}

/// Errors during request validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("validation failed for {location} with {} error(s)", errors.len())]
    Invalid {
        location: Location,
        errors: Vec<SchemaError>,
    },

    #[error("malformed JSON body for {location}: {source}")]
    MalformedBody {
        location: Location,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },
}

/// Single validation error with path context.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid field.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl ConfigError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

impl AnnotateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

impl SpecError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

impl ManifestError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ManifestError::FileNotFound { .. } | ManifestError::ReadError { .. } => 3,
            _ => 2,
        }
    }
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Invalid { .. } | ValidateError::MalformedBody { .. } => 1,
            ValidateError::InvalidSchema { .. } => 2,
        }
    }
}
