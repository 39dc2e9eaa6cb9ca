use std::path::PathBuf;
use thiserror::Error;

/// Fatal error for a whole project scan.
///
/// Everything below the top-level manifest is absorbed into the result tree
/// (unresolved leaves, skipped entries, warnings). Only the variants here stop a
/// project from producing a module.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read manifest at {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest at {path}: {message}")]
    ManifestParse { path: PathBuf, message: String },

    #[error("Failed to materialize lockfile in {dir}: {message}")]
    Materialize { dir: PathBuf, message: String },

    #[error("Invalid repository '{url}': {message}")]
    Repository { url: String, message: String },

    #[error("Scan cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl Error {
    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create a repository setup error.
    #[must_use]
    pub fn repository(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Repository {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a manifest parse error.
    #[must_use]
    pub fn manifest_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ManifestParse {
            path: path.into(),
            message: message.into(),
        }
    }
}
