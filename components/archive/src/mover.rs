// components/archive/src/mover.rs
use crate::cleanup::{clean_vacated, CleanupWarning};
use crate::error::{ArchiveError, Result};
use crate::naming::{album_segment, artist_segment, disc_segment, TrackLocation};
use catalog::Album;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Copy `source` to `destination` without ever overwriting.
///
/// The bytes land in a hidden `.<name>-new` file beside the destination
/// first and are renamed into place only if the destination is still free.
pub fn safe_copy(source: &Path, destination: &Path) -> Result<()> {
    let directory = destination
        .parent()
        .ok_or_else(|| ArchiveError::Collision {
            path: destination.to_path_buf(),
        })?;
    let file_name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temporary = directory.join(format!(".{}-new", file_name));

    fs::create_dir_all(directory).map_err(|e| ArchiveError::io(directory, e))?;

    if let Err(e) = fs::copy(source, &temporary) {
        let _ = fs::remove_file(&temporary);
        return Err(ArchiveError::io(source, e));
    }

    if destination.exists() {
        let _ = fs::remove_file(&temporary);
        return Err(ArchiveError::Collision {
            path: destination.to_path_buf(),
        });
    }

    fs::rename(&temporary, destination).map_err(|e| {
        let _ = fs::remove_file(&temporary);
        ArchiveError::io(destination, e)
    })
}

/// One file to relocate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Moves albums into `<root>/<artist>/<album>[ disc N]/`.
#[derive(Debug, Clone)]
pub struct Archiver {
    root: PathBuf,
    source_root: Option<PathBuf>,
}

impl Archiver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            source_root: None,
        }
    }

    /// Never prune vacated directories at or above `source_root`.
    pub fn with_source_root(mut self, source_root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(source_root.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directories a copy into `moves` would create, deepest first.
    fn missing_directories(moves: &[PlannedMove]) -> Vec<PathBuf> {
        let mut missing = BTreeSet::new();
        for planned in moves {
            let ancestors = planned.destination.ancestors().skip(1);
            for dir in ancestors.take_while(|dir| !dir.as_os_str().is_empty() && !dir.exists()) {
                missing.insert(dir.to_path_buf());
            }
        }
        let mut missing: Vec<PathBuf> = missing.into_iter().collect();
        missing.sort_by_key(|dir| std::cmp::Reverse(dir.components().count()));
        missing
    }

    /// Existing archive directory for this album, checking the canonical
    /// names and their `The `-prefixed variants.
    pub fn existing_archive(&self, album: &Album) -> Option<PathBuf> {
        let artist = artist_segment(album);
        let mut albums: BTreeSet<String> = album
            .discs()
            .map(|disc| disc_segment(album, disc.number))
            .collect();
        albums.insert(album_segment(album));

        let variants = |name: &str| [name.to_string(), format!("The {}", name)];
        variants(&artist).into_iter().find_map(|artist| {
            albums
                .iter()
                .flat_map(|name| variants(name))
                .map(|name| self.root.join(&artist).join(name))
                .find(|candidate| candidate.exists())
        })
    }

    /// Every source and destination, tracks first, then non-audio files.
    pub fn plan(&self, album: &Album) -> Vec<PlannedMove> {
        let mut moves = Vec::new();
        let mut directories: Vec<(PathBuf, PathBuf)> = Vec::new();

        for track in album.tracks() {
            let location = TrackLocation::for_track(album, track);
            if let Some(dir) = track.directory() {
                if !directories.iter().any(|(from, _)| from == dir) {
                    directories.push((dir.to_path_buf(), location.directory(&self.root)));
                }
            }
            moves.push(PlannedMove {
                source: track.path.clone(),
                destination: location.to_path(&self.root),
            });
        }

        for file in &album.non_audio_files {
            let target_dir = file
                .parent()
                .and_then(|dir| directories.iter().find(|(from, _)| from == dir))
                .or_else(|| directories.first())
                .map(|(_, to)| to.clone());
            if let (Some(target_dir), Some(name)) = (target_dir, file.file_name()) {
                moves.push(PlannedMove {
                    source: file.clone(),
                    destination: target_dir.join(name),
                });
            }
        }
        moves
    }

    /// Move the whole album or nothing. Sources are only deleted once every
    /// file has a copy in place; on success the album points at the new
    /// locations.
    pub fn archive_album(&self, album: &mut Album) -> Result<Vec<CleanupWarning>> {
        if let Some(path) = self.existing_archive(album) {
            return Err(ArchiveError::AlreadyArchived { path });
        }

        let moves = self.plan(album);
        let mut seen = HashSet::new();
        for planned in &moves {
            if !seen.insert(&planned.destination) || planned.destination.exists() {
                return Err(ArchiveError::Collision {
                    path: planned.destination.clone(),
                });
            }
        }

        let created = Self::missing_directories(&moves);
        let mut placed: Vec<&Path> = Vec::with_capacity(moves.len());
        for planned in &moves {
            debug!(from = %planned.source.display(), to = %planned.destination.display(), "Copying");
            if let Err(e) = safe_copy(&planned.source, &planned.destination) {
                warn!(error = %e, "Copy failed, rolling back {} placed files", placed.len());
                for path in placed {
                    if let Err(e) = fs::remove_file(path) {
                        warn!(path = %path.display(), error = %e, "Rollback could not remove copy");
                    }
                }
                // Left in place, these would read as an existing archive.
                for dir in &created {
                    if let Err(e) = fs::remove_dir(dir) {
                        if dir.exists() {
                            warn!(directory = %dir.display(), error = %e, "Rollback could not remove directory");
                        }
                    }
                }
                return Err(e);
            }
            placed.push(&planned.destination);
        }

        let mut vacated = BTreeSet::new();
        for planned in &moves {
            if let Err(e) = fs::remove_file(&planned.source) {
                warn!(path = %planned.source.display(), error = %e, "Could not remove archived source");
            }
            if let Some(dir) = planned.source.parent() {
                vacated.insert(dir.to_path_buf());
            }
        }

        for (track, planned) in album.tracks_mut().zip(&moves) {
            track.path = planned.destination.clone();
        }
        let track_count = album.number_of_tracks_loaded() as usize;
        album.non_audio_files = moves[track_count..]
            .iter()
            .map(|m| m.destination.clone())
            .collect();

        info!(
            album = %album.reconstituted_name(),
            files = moves.len(),
            root = %self.root.display(),
            "Archived album"
        );

        Ok(clean_vacated(vacated, self.source_root.as_deref()))
    }
}
