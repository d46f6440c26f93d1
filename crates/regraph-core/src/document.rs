//! Reconstruction-history documents and their discovery.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde_json::Value;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{RegraphError, Result};

/// A document as listed for the batch, before its contents are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSource {
    /// Stable identifier: the source file name.
    pub id: String,
    pub path: PathBuf,
}

impl DocumentSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let id = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| RegraphError::InvalidDocumentPath(path.clone()))?
            .to_string();
        Ok(Self { id, path })
    }
}

/// A loaded reconstruction history.
///
/// `body` keeps the authoring order of every object's keys; the importer
/// replays sketch and extrude operations in that order.
#[derive(Debug, Clone)]
pub struct Document {
    pub source: DocumentSource,
    pub body: Value,
}

impl Document {
    pub async fn load(source: &DocumentSource) -> Result<Self> {
        let content = tokio::fs::read_to_string(&source.path)
            .await
            .map_err(|e| RegraphError::DocumentRead {
                path: source.path.clone(),
                source: e,
            })?;
        let body = serde_json::from_str(&content).map_err(|e| RegraphError::DocumentParse {
            path: source.path.clone(),
            message: e.to_string(),
        })?;
        Ok(Self {
            source: source.clone(),
            body,
        })
    }

    pub fn id(&self) -> &str {
        &self.source.id
    }

    /// Top-level keys in document order.
    pub fn keys(&self) -> Vec<&str> {
        self.body
            .as_object()
            .map(|obj| obj.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// List `.json` files under `input_dir` whose file name matches `pattern`.
///
/// Results are sorted by path so the listed order is stable across runs.
pub fn discover_documents(
    input_dir: &Path,
    pattern: &str,
    recursive: bool,
) -> Result<Vec<PathBuf>> {
    let matcher = Regex::new(pattern).map_err(|e| {
        RegraphError::Config(format!("invalid document pattern '{}': {}", pattern, e))
    })?;

    if !input_dir.is_dir() {
        return Err(RegraphError::Discovery(format!(
            "input directory {} does not exist",
            input_dir.display()
        )));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut found = Vec::new();
    for entry in WalkDir::new(input_dir).max_depth(max_depth) {
        let entry = entry.map_err(|e| RegraphError::Discovery(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if matcher.is_match(name) {
            found.push(path.to_path_buf());
        }
    }
    found.sort();

    debug!(
        input_dir = %input_dir.display(),
        count = found.len(),
        "Discovered documents"
    );
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_is_file_name() {
        let source = DocumentSource::from_path("/data/testdata/Couch.json").unwrap();
        assert_eq!(source.id, "Couch.json");
    }

    #[test]
    fn test_source_without_file_name_is_invalid() {
        assert!(matches!(
            DocumentSource::from_path("/"),
            Err(RegraphError::InvalidDocumentPath(_))
        ));
    }

    #[tokio::test]
    async fn test_load_preserves_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Order.json");
        std::fs::write(&path, r#"{"timeline": [], "entities": {}, "bounding_box": {}}"#).unwrap();

        let source = DocumentSource::from_path(&path).unwrap();
        let doc = Document::load(&source).await.unwrap();
        assert_eq!(doc.keys(), vec!["timeline", "entities", "bounding_box"]);
    }

    #[tokio::test]
    async fn test_load_malformed_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Broken.json");
        std::fs::write(&path, "{ \"timeline\": ").unwrap();

        let source = DocumentSource::from_path(&path).unwrap();
        let err = Document::load(&source).await.unwrap_err();
        assert_eq!(err.kind(), "DocumentParse");
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir_all(&nested).unwrap();
        for name in ["b_0001.json", "a_0000.json", "notes.txt", "a_results.json"] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }
        std::fs::write(nested.join("c_0002.json"), "{}").unwrap();

        let found = discover_documents(dir.path(), r"_\d{4}\.json$", true).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a_0000.json", "b_0001.json", "c_0002.json"]);

        let shallow = discover_documents(dir.path(), r"_\d{4}\.json$", false).unwrap();
        assert_eq!(shallow.len(), 2);
    }

    #[test]
    fn test_discover_rejects_bad_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_documents(dir.path(), "([", true).unwrap_err();
        assert_eq!(err.kind(), "Config");
    }
}
