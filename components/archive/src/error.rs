// components/archive/src/error.rs
use catalog::AlbumKey;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Album already archived at {path}")]
    AlreadyArchived { path: PathBuf },

    #[error("Refusing to overwrite {path}")]
    Collision { path: PathBuf },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Album {key} is already queued for archiving")]
    AlreadyQueued { key: AlbumKey },

    #[error("Archive queue is full, could not queue {key}")]
    QueueFull { key: AlbumKey },

    #[error("Archive queue is closed")]
    QueueClosed,

    #[error("A background worker owns this queue")]
    WorkerRunning,

    #[error("Archiving {key} panicked")]
    WorkerPanicked { key: AlbumKey },

    #[error("Failed to start archive worker: {0}")]
    Spawn(#[source] std::io::Error),
}

impl ArchiveError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
