use any_ascii::any_ascii;
use catalog::{Album, Track};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const UNKNOWN_ARTIST: &str = "Unknown Artist";
const UNKNOWN_ALBUM: &str = "Unknown Album";
const UNKNOWN_TRACK: &str = "Unknown Track";
const DEFAULT_EXTENSION: &str = "mp3";

/// Transliterate to ASCII, then keep only letters, digits and spaces.
pub fn sanitize_segment(text: &str) -> String {
    any_ascii(text)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string()
}

fn segment_or(text: Option<&str>, fallback: &str) -> String {
    let cleaned = text.map(sanitize_segment).unwrap_or_default();
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

/// Canonical artist directory of an album.
pub fn artist_segment(album: &Album) -> String {
    segment_or(album.artist_name.as_deref(), UNKNOWN_ARTIST)
}

/// Canonical album directory, without any disc suffix.
pub fn album_segment(album: &Album) -> String {
    segment_or(Some(album.reconstituted_name().as_str()), UNKNOWN_ALBUM)
}

/// Directory for one disc. The ` disc N` suffix only appears when the
/// album spans several discs and this disc holds more than one track.
pub fn disc_segment(album: &Album, disc_number: u32) -> String {
    let base = album_segment(album);
    let multi_track = album
        .disc(disc_number)
        .is_some_and(|disc| disc.number_of_tracks() > 1);
    if album.number_of_discs() > 1 && multi_track {
        format!("{} disc {}", base, disc_number)
    } else {
        base
    }
}

/// Where a track lives once archived, relative to the archive root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackLocation {
    pub artist_dir: String,
    pub album_dir: String,
    pub file_name: String,
}

impl TrackLocation {
    pub fn for_track(album: &Album, track: &Track) -> Self {
        let file_artist = track
            .artist_name
            .as_deref()
            .or(album.artist_name.as_deref());
        let file_name = format!(
            "{} - {} - {:02} - {}.{}",
            segment_or(file_artist, UNKNOWN_ARTIST),
            album_segment(album),
            track.sequence,
            segment_or(Some(track.reconstituted_name().as_str()), UNKNOWN_TRACK),
            track
                .file_extension()
                .unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
        );

        Self {
            artist_dir: artist_segment(album),
            album_dir: disc_segment(album, track.disc_number),
            file_name,
        }
    }

    pub fn directory(&self, archive_root: impl AsRef<Path>) -> PathBuf {
        archive_root
            .as_ref()
            .join(&self.artist_dir)
            .join(&self.album_dir)
    }

    pub fn to_path(&self, archive_root: impl AsRef<Path>) -> PathBuf {
        self.directory(archive_root).join(&self.file_name)
    }
}
