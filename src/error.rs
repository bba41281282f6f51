use std::path::PathBuf;

use crate::record::RowError;

/// Failure to turn a file on disk into records or a query.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{}: {source}", path.display())]
    Row {
        path: PathBuf,
        #[source]
        source: RowError,
    },

    #[error("duplicate record id `{0}`")]
    DuplicateId(String),
}
