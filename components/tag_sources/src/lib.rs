//! Best-effort metadata sources for one audio file: the directory it lives
//! in, its filename, and its embedded tag. None of them is authoritative;
//! reconciling them is left to the catalog. Canonical values go back
//! through a `TagWriter`.

mod cache;
mod error;
mod filename;
mod genre;
mod path;
mod reader;
mod tag;
mod writer;

pub use cache::{changed_paths, CacheKey, JsonScanCache, ScanCache};
pub use error::{Result, SourceError};
pub use filename::FilenameMetadata;
pub use genre::{resolve_genre, GENRES};
pub use path::{split_disc_marker, PathMetadata, VARIOUS_ARTISTS};
pub use reader::{detect_version, LoftyTagReader, TagReader};
pub use tag::{
    parse_position, EmbeddedImage, FieldConflict, FrameValue, MusicBrainzIds, RawFrame, RawTag,
    Schema, TagMetadata, TagVersion, FEATURED_PERFORMER, MUSICBRAINZ_OWNER,
};
pub use writer::{LoftyTagWriter, TagUpdate, TagWriter};

use std::path::{Path, PathBuf};

/// Everything the three sources say about one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSet {
    pub path: PathBuf,
    pub from_path: PathMetadata,
    pub from_filename: FilenameMetadata,
    pub from_tag: Option<TagMetadata>,
}

impl SourceSet {
    /// Build the set from path and filename alone plus an already-read tag.
    pub fn new(path: &Path, raw_tag: Option<&RawTag>) -> Self {
        Self {
            path: path.to_path_buf(),
            from_path: PathMetadata::from_path(path),
            from_filename: FilenameMetadata::from_path(path),
            from_tag: raw_tag.map(|raw| TagMetadata::from_raw(path, raw)),
        }
    }
}

/// Read all three sources for `path`. Tag I/O failures propagate unchanged.
pub fn read_sources<R: TagReader + ?Sized>(path: &Path, reader: &R) -> Result<SourceSet> {
    let raw = reader.read_tag(path)?;
    Ok(SourceSet::new(path, raw.as_ref()))
}
