// components/tag_sources/src/error.rs
use lofty::LoftyError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures raised by the tag I/O collaborator. These are propagated
/// unchanged to the caller; nothing here is retried.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lofty error on {path}: {source}")]
    Lofty {
        path: PathBuf,
        #[source]
        source: LoftyError,
    },

    #[error("Unsupported tag version {version} in {path}")]
    UnsupportedVersion { path: PathBuf, version: String },

    #[error("Scan cache error: {0}")]
    Cache(#[from] serde_json::Error),
}

impl SourceError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn lofty(path: impl AsRef<Path>, source: LoftyError) -> Self {
        Self::Lofty {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn unsupported(path: impl AsRef<Path>, version: impl Into<String>) -> Self {
        Self::UnsupportedVersion {
            path: path.as_ref().to_path_buf(),
            version: version.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;
