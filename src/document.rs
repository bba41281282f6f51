use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::error::LoadError;

const RECORD_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&content, path)
}

/// `.json` files go through serde_json, everything else through serde_yaml.
pub fn parse_document<T: DeserializeOwned>(content: &str, path: &Path) -> Result<T, LoadError> {
    if has_extension(path, "json") {
        serde_json::from_str(content).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_yaml::from_str(content).map_err(|source| LoadError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub fn is_record_file(path: &Path) -> bool {
    RECORD_EXTENSIONS.iter().any(|ext| has_extension(path, ext))
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case(ext))
}
