//! Manifest and payload loading from files and strings.

use std::path::Path;

use serde_json::Value;

use crate::error::ManifestError;
use crate::manifest::Manifest;

/// Load a JSON document from a file path.
///
/// # Errors
///
/// Returns `ManifestError::FileNotFound` if the file doesn't exist,
/// or `ManifestError::InvalidJson` if the file isn't valid JSON.
pub fn load_json(path: &Path) -> Result<Value, ManifestError> {
    let content = read(path)?;
    serde_json::from_str(&content).map_err(|source| ManifestError::InvalidJson { source })
}

/// Load a route manifest from a file path.
///
/// # Errors
///
/// Same as [`load_json`], plus `InvalidJson` when the document doesn't
/// have the manifest shape.
pub fn load_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let content = read(path)?;
    load_manifest_str(&content)
}

/// Load a route manifest from a JSON string.
///
/// # Errors
///
/// Returns `ManifestError::InvalidJson` if the string isn't a valid manifest.
pub fn load_manifest_str(content: &str) -> Result<Manifest, ManifestError> {
    serde_json::from_str(content).map_err(|source| ManifestError::InvalidJson { source })
}

/// Read a file's raw contents, e.g. a request body that may not be valid
/// JSON.
///
/// # Errors
///
/// Returns `ManifestError::FileNotFound` or `ManifestError::ReadError`.
pub fn load_text(path: &Path) -> Result<String, ManifestError> {
    read(path)
}

fn read(path: &Path) -> Result<String, ManifestError> {
    if !path.exists() {
        return Err(ManifestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    std::fs::read_to_string(path).map_err(|source| ManifestError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_json_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"id": 1}}"#).unwrap();

        let value = load_json(file.path()).unwrap();
        assert_eq!(value["id"], 1);
    }

    #[test]
    fn load_json_file_not_found() {
        let result = load_json(Path::new("/nonexistent/body.json"));
        assert!(matches!(result, Err(ManifestError::FileNotFound { .. })));
    }

    #[test]
    fn load_json_invalid() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let result = load_json(file.path());
        assert!(matches!(result, Err(ManifestError::InvalidJson { .. })));
    }

    #[test]
    fn load_manifest_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"routes": [{{"path": "/", "method": "GET", "handler": "index"}}]}}"#
        )
        .unwrap();

        let manifest = load_manifest(file.path()).unwrap();
        assert_eq!(manifest.routes.len(), 1);
    }

    #[test]
    fn load_manifest_str_empty_object() {
        let manifest = load_manifest_str("{}").unwrap();
        assert!(manifest.routes.is_empty());
        assert!(manifest.handlers.is_empty());
    }

    #[test]
    fn load_manifest_str_wrong_shape() {
        let result = load_manifest_str(r#"{"routes": 5}"#);
        assert!(matches!(result, Err(ManifestError::InvalidJson { .. })));
    }
}
