// components/catalog/src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Per-track failures. They never abort aggregation of the other tracks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Cannot resolve {field} for {path}")]
    DataAmbiguity { path: PathBuf, field: &'static str },

    #[error("Disc {disc} already has a track {sequence}, rejecting {path}")]
    DuplicatePosition {
        path: PathBuf,
        disc: u32,
        sequence: u32,
    },
}

impl CatalogError {
    pub fn ambiguous(path: impl Into<PathBuf>, field: &'static str) -> Self {
        Self::DataAmbiguity {
            path: path.into(),
            field,
        }
    }

    pub fn path(&self) -> &PathBuf {
        match self {
            Self::DataAmbiguity { path, .. } | Self::DuplicatePosition { path, .. } => path,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
