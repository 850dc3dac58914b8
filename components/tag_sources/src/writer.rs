// components/tag_sources/src/writer.rs
use crate::error::{Result, SourceError};
use crate::tag::MusicBrainzIds;
use lofty::{Accessor, ItemKey, Probe, Tag, TagExt, TaggedFileExt};
use std::path::Path;
use tracing::debug;

/// Canonical values to store in one file's tag. `None` clears the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagUpdate {
    /// Track name with featured artists folded in.
    pub title: Option<String>,
    pub remix_name: Option<String>,
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
    pub album_artist: Option<String>,
    pub disc_number: u32,
    pub disc_total: Option<u32>,
    pub sequence: u32,
    pub sequence_total: Option<u32>,
    pub genre: Option<String>,
    pub release_date: Option<String>,
    pub comment: Option<String>,
    pub encoders: Vec<String>,
    pub compilation: bool,
    pub album_sort_order: Option<String>,
    pub artist_sort_order: Option<String>,
    pub track_sort_order: Option<String>,
    pub unique_id: Option<String>,
    pub musicbrainz: MusicBrainzIds,
}

/// The tag write collaborator, the counterpart of `TagReader`.
pub trait TagWriter {
    fn write_tag(&self, path: &Path, update: &TagUpdate) -> Result<()>;
}

/// Writes tags through lofty, in the file's native tag format.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTagWriter;

impl TagWriter for LoftyTagWriter {
    fn write_tag(&self, path: &Path, update: &TagUpdate) -> Result<()> {
        let mut tagged_file = Probe::open(path)
            .map_err(|e| SourceError::lofty(path, e))?
            .read()
            .map_err(|e| SourceError::lofty(path, e))?;

        if tagged_file.primary_tag().is_none() {
            let tag_type = tagged_file.primary_tag_type();
            debug!(path = %path.display(), ?tag_type, "Creating tag");
            tagged_file.insert_tag(Tag::new(tag_type));
        }
        let Some(tag) = tagged_file.primary_tag_mut() else {
            return Err(SourceError::unsupported(path, "untaggable file"));
        };

        apply(tag, update);
        tag.save_to_path(path)
            .map_err(|e| SourceError::lofty(path, e))?;

        debug!(path = %path.display(), "Wrote tag");
        Ok(())
    }
}

fn apply(tag: &mut Tag, update: &TagUpdate) {
    match &update.title {
        Some(title) => tag.set_title(title.clone()),
        None => tag.remove_title(),
    }
    match &update.artist_name {
        Some(artist) => tag.set_artist(artist.clone()),
        None => tag.remove_artist(),
    }
    match &update.album_name {
        Some(album) => tag.set_album(album.clone()),
        None => tag.remove_album(),
    }
    match &update.genre {
        Some(genre) => tag.set_genre(genre.clone()),
        None => tag.remove_genre(),
    }
    match &update.comment {
        Some(comment) => tag.set_comment(comment.clone()),
        None => tag.remove_comment(),
    }

    tag.set_track(update.sequence);
    match update.sequence_total {
        Some(total) => tag.set_track_total(total),
        None => tag.remove_track_total(),
    }
    tag.set_disk(update.disc_number);
    match update.disc_total {
        Some(total) => tag.set_disk_total(total),
        None => tag.remove_disk_total(),
    }

    let encoders = (!update.encoders.is_empty()).then(|| update.encoders.join(" / "));
    let compilation = update.compilation.then(|| "1".to_string());
    let text_fields = [
        (ItemKey::TrackSubtitle, &update.remix_name),
        (ItemKey::AlbumArtist, &update.album_artist),
        (ItemKey::RecordingDate, &update.release_date),
        (ItemKey::EncoderSoftware, &encoders),
        (ItemKey::FlagCompilation, &compilation),
        (ItemKey::AlbumTitleSortOrder, &update.album_sort_order),
        (ItemKey::TrackArtistSortOrder, &update.artist_sort_order),
        (ItemKey::TrackTitleSortOrder, &update.track_sort_order),
        (ItemKey::MusicBrainzRecordingId, &update.unique_id),
        (ItemKey::MusicBrainzArtistId, &update.musicbrainz.artist_id),
        (ItemKey::MusicBrainzReleaseId, &update.musicbrainz.album_id),
        (ItemKey::MusicBrainzReleaseArtistId, &update.musicbrainz.album_artist_id),
    ];
    for (key, value) in text_fields {
        match value {
            Some(value) => {
                tag.insert_text(key, value.clone());
            }
            None => tag.remove_key(&key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{LoftyTagReader, TagReader};
    use crate::tag::{TagMetadata, TagVersion};
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::TempDir;

    /// Ten silent MPEG-1 Layer III frames, 128 kbit/s at 44.1 kHz.
    fn silent_mp3() -> Vec<u8> {
        let mut frame = vec![0u8; 417];
        frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x90, 0x00]);
        frame.repeat(10)
    }

    fn canonical() -> TagUpdate {
        TagUpdate {
            title: Some("Killer (feat. He-Man)".to_string()),
            remix_name: None,
            artist_name: Some("Razor X Productions".to_string()),
            album_name: Some("Killing Sound".to_string()),
            album_artist: Some("Razor X Productions".to_string()),
            disc_number: 1,
            disc_total: Some(2),
            sequence: 1,
            sequence_total: Some(10),
            genre: Some("Dancehall".to_string()),
            release_date: Some("2005".to_string()),
            comment: None,
            encoders: vec!["Exact Audio Copy".to_string(), "lame 3.97 -V0".to_string()],
            compilation: false,
            album_sort_order: None,
            artist_sort_order: None,
            track_sort_order: None,
            unique_id: None,
            musicbrainz: MusicBrainzIds {
                album_id: Some("0c0de0b1-c0a7-4f43-8e1b-7e6d2a3a0f11".to_string()),
                ..MusicBrainzIds::default()
            },
        }
    }

    fn read_back(path: &Path) -> TagMetadata {
        let raw = LoftyTagReader.read_tag(path).unwrap().unwrap();
        TagMetadata::from_raw(path, &raw)
    }

    #[test]
    fn test_canonical_fields_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("01.mp3");
        fs::write(&path, silent_mp3()).unwrap();

        LoftyTagWriter.write_tag(&path, &canonical()).unwrap();
        let meta = read_back(&path);

        assert_eq!(meta.version, TagVersion::V24);
        assert_eq!(meta.track_name.as_deref(), Some("Killer (feat. He-Man)"));
        assert_eq!(meta.artist_name.as_deref(), Some("Razor X Productions"));
        assert_eq!(meta.album_name.as_deref(), Some("Killing Sound"));
        assert_eq!((meta.disc_number, meta.disc_total), (Some(1), Some(2)));
        assert_eq!((meta.sequence, meta.sequence_total), (Some(1), Some(10)));
        assert_eq!(meta.genre.as_deref(), Some("Dancehall"));
        assert_eq!(meta.release_date.as_deref(), Some("2005"));
        assert_eq!(meta.encoders, vec!["Exact Audio Copy / lame 3.97 -V0"]);
        assert_eq!(
            meta.musicbrainz.album_id.as_deref(),
            Some("0c0de0b1-c0a7-4f43-8e1b-7e6d2a3a0f11")
        );
    }

    #[test]
    fn test_rewrite_replaces_and_clears_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("01.mp3");
        fs::write(&path, silent_mp3()).unwrap();
        let mut update = canonical();
        update.comment = Some("Track 1".to_string());
        LoftyTagWriter.write_tag(&path, &update).unwrap();

        update.comment = None;
        update.title = Some("Killer".to_string());
        update.artist_sort_order = Some("Razor X Productions".to_string());
        LoftyTagWriter.write_tag(&path, &update).unwrap();
        let meta = read_back(&path);

        assert_eq!(meta.comment, None);
        assert_eq!(meta.track_name.as_deref(), Some("Killer"));
        assert_eq!(meta.artist_sort_order.as_deref(), Some("Razor X Productions"));
    }

    #[test]
    fn test_unreadable_file_is_lofty_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.mp3");
        fs::write(&path, b"not audio at all").unwrap();

        let result = LoftyTagWriter.write_tag(&path, &canonical());

        assert_matches!(result, Err(SourceError::Lofty { .. }));
    }
}
