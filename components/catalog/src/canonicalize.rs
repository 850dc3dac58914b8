use crate::error::{CatalogError, Result};
use crate::heuristics::{parse_artist_name, parse_track_name};
use crate::model::{AlbumKey, AlbumMusicBrainzIds, Track};
use crate::text::{capitalize_remix, dedupe, explode_names, mixed_case, sort_key};
use once_cell::sync::Lazy;
use regex::Regex;
use tag_sources::SourceSet;
use tracing::debug;

/// Signature of this archiving pipeline, appended to every encoder list.
pub const ENCODER_SIGNATURE: &str = "::AOAIOXXYSZ:: encoding services, v1";
pub const RIPPING_TOOL: &str = "RIPT with GRIP";
/// Encoder assumed when a file only names the ripping tool.
pub const DEFAULT_ENCODER: &str = "lame 3.97 -V1";
pub const EXACT_AUDIO_COPY: &str = "Exact Audio Copy (secure mode)";

static TRACK_NUMBER_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Track\s+[0-9]+$").expect("valid regex"));
static NORMALIZATION_FINGERPRINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[0-9A-Fa-f]{8}\s+){9,}[0-9A-Fa-f]{8}$").expect("valid regex")
});

fn is_exact_audio_copy(entry: &str) -> bool {
    let collapsed = entry.split_whitespace().collect::<Vec<_>>().join(" ");
    entry.eq_ignore_ascii_case("EAC") || collapsed.eq_ignore_ascii_case(EXACT_AUDIO_COPY)
}

/// Flatten, fix known misspellings, dedupe, complete a lone ripping tool
/// entry and append the pipeline signature. Running it twice changes nothing.
pub fn canonicalize_encoders(entries: &[String]) -> Vec<String> {
    let flattened = entries
        .iter()
        .flat_map(|entry| entry.split(" / "))
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            if is_exact_audio_copy(entry) {
                EXACT_AUDIO_COPY.to_string()
            } else {
                entry.to_string()
            }
        })
        .collect();
    let mut encoders = dedupe(flattened);

    let tools: Vec<&String> = encoders.iter().filter(|e| *e != ENCODER_SIGNATURE).collect();
    if tools.len() == 1 && tools[0] == RIPPING_TOOL {
        let position = encoders
            .iter()
            .position(|e| e == RIPPING_TOOL)
            .map_or(encoders.len(), |p| p + 1);
        encoders.insert(position, DEFAULT_ENCODER.to_string());
    }

    if !encoders.iter().any(|e| e == ENCODER_SIGNATURE) {
        encoders.push(ENCODER_SIGNATURE.to_string());
    }
    encoders
}

/// What to do with a track comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentFix {
    Keep(String),
    Drop,
    MoveToEncoders(String),
}

pub fn canonicalize_comment(comment: &str) -> CommentFix {
    let comment = comment.trim();
    if comment.is_empty()
        || TRACK_NUMBER_COMMENT.is_match(comment)
        || NORMALIZATION_FINGERPRINT.is_match(comment)
    {
        CommentFix::Drop
    } else if comment == RIPPING_TOOL {
        CommentFix::MoveToEncoders(comment.to_string())
    } else {
        CommentFix::Keep(comment.to_string())
    }
}

impl Track {
    /// Clean up the comment and encoder list.
    pub fn canonicalize(&mut self) {
        if let Some(comment) = self.comment.take() {
            match canonicalize_comment(&comment) {
                CommentFix::Keep(comment) => self.comment = Some(comment),
                CommentFix::Drop => debug!(path = %self.path.display(), %comment, "Dropping comment"),
                CommentFix::MoveToEncoders(tool) => self.encoders.push(tool),
            }
        }
        self.encoders = canonicalize_encoders(&self.encoders);
    }

    pub fn capitalize_names(&mut self) {
        self.name = self.name.as_deref().map(mixed_case);
        self.artist_name = self.artist_name.as_deref().map(mixed_case);
        self.genre = self.genre.as_deref().map(mixed_case);
        self.remix_name = self.remix_name.as_deref().map(capitalize_remix);
        self.featured_artists = dedupe(self.featured_artists.iter().map(|a| mixed_case(a)).collect());
    }

    /// Fill sort keys from leading articles, never replacing given ones.
    pub fn derive_sort_keys(&mut self) {
        if self.sort_order.is_none() {
            self.sort_order = self.name.as_deref().and_then(sort_key);
        }
        if self.artist_sort_order.is_none() {
            self.artist_sort_order = self.artist_name.as_deref().and_then(sort_key);
        }
    }
}

/// One reconciled track plus the album-level hints its sources carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRecord {
    pub track: Track,
    pub bucket: Option<AlbumKey>,
    pub sequence_total: Option<u32>,
    pub disc_total: Option<u32>,
    pub compilation: bool,
    pub album_sort_order: Option<String>,
    pub album_musicbrainz: AlbumMusicBrainzIds,
}

/// Merge the three sources of one file into a track.
///
/// Tag beats filename beats path for every field except the disc number,
/// where an explicit marker in the directory name wins.
pub fn reconcile_track(sources: &SourceSet) -> Result<TrackRecord> {
    let tag = sources.from_tag.as_ref();
    let file = &sources.from_filename;
    let dir = &sources.from_path;

    // Positions are 1-based; a zero falls through to the next source.
    let positive = |n: &u32| *n > 0;
    let sequence = tag
        .and_then(|t| t.sequence)
        .filter(positive)
        .or(file.sequence.filter(positive))
        .ok_or_else(|| CatalogError::ambiguous(&sources.path, "sequence"))?;
    let disc_number = dir
        .disc_number
        .filter(positive)
        .or_else(|| tag.and_then(|t| t.disc_number).filter(positive))
        .or(file.disc_number.filter(positive))
        .unwrap_or(1);

    let mut track = Track::new(&sources.path, disc_number, sequence);
    let mut featured = Vec::new();

    let raw_name = tag
        .and_then(|t| t.track_name.clone())
        .or_else(|| file.track_name.clone());
    if let Some(raw_name) = raw_name {
        let (name, extraction) = parse_track_name(&raw_name);
        track.name = Some(name);
        track.remix_name = extraction.remix;
        featured.extend(extraction.featured);
    }
    if let Some(remix) = tag.and_then(|t| t.remix_name.clone()) {
        track.remix_name = Some(remix);
    }

    let raw_artist = tag
        .and_then(|t| t.artist_name.clone())
        .or_else(|| file.artist_name.clone())
        .or_else(|| dir.artist_name.clone());
    if let Some(raw_artist) = raw_artist {
        let (artist, extraction) = parse_artist_name(&raw_artist);
        track.artist_name = Some(artist);
        featured.extend(extraction.featured);
    }

    if let Some(tag) = tag {
        featured.extend(tag.featured_artists.iter().cloned());
        track.genre = tag.genre.clone();
        track.comment = tag.comment.clone();
        track.encoders = tag.encoders.clone();
        track.release_date = tag.release_date.clone();
        track.sort_order = tag.track_sort_order.clone();
        track.artist_sort_order = tag.artist_sort_order.clone();
        track.unique_id = tag.unique_id.clone();
        track.musicbrainz_artist_id = tag.musicbrainz.artist_id.clone();
        track.image = tag.image.clone();
    }
    track.featured_artists = explode_names(&featured);

    track.album_name = tag
        .and_then(|t| t.album_name.clone())
        .or_else(|| file.album_name.clone())
        .or_else(|| dir.album_name.clone());

    let bucket = AlbumKey::new(format!(
        "{}|{}|{}",
        track.album_name.as_deref().unwrap_or_default(),
        dir.artist_name.as_deref().unwrap_or_default(),
        dir.parent_signature.as_deref().unwrap_or_default(),
    ));

    let album_musicbrainz = tag
        .map(|t| AlbumMusicBrainzIds {
            album_id: t.musicbrainz.album_id.clone(),
            album_artist_id: t.musicbrainz.album_artist_id.clone(),
            album_type: t.musicbrainz.album_type.clone(),
            album_status: t.musicbrainz.album_status.clone(),
            album_release_country: t.musicbrainz.album_release_country.clone(),
        })
        .unwrap_or_default();

    debug!(path = %sources.path.display(), disc_number, sequence, "Reconciled track");

    Ok(TrackRecord {
        track,
        bucket: Some(bucket),
        sequence_total: tag.and_then(|t| t.sequence_total),
        disc_total: tag.and_then(|t| t.disc_total),
        compilation: dir.is_compilation() || tag.and_then(|t| t.compilation).unwrap_or(false),
        album_sort_order: tag.and_then(|t| t.album_sort_order.clone()),
        album_musicbrainz,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::path::Path;
    use tag_sources::{RawFrame, RawTag, TagVersion};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_encoders_flattened_and_signed() {
        let encoders = canonicalize_encoders(&strings(&["Exact Audio Copy (secure mode) / lame 3.97 -V1"]));
        assert_eq!(
            encoders,
            vec![EXACT_AUDIO_COPY, DEFAULT_ENCODER, ENCODER_SIGNATURE]
        );
    }

    #[test]
    fn test_encoders_misspelled_tool_rewritten() {
        let encoders = canonicalize_encoders(&strings(&["Exact Audio Copy   (Secure Mode)", "EAC", "lame 3.97 -V1"]));
        assert_eq!(
            encoders,
            vec![EXACT_AUDIO_COPY, DEFAULT_ENCODER, ENCODER_SIGNATURE]
        );
    }

    #[test]
    fn test_lone_ripping_tool_gets_default_encoder() {
        let encoders = canonicalize_encoders(&strings(&[RIPPING_TOOL]));
        assert_eq!(encoders, vec![RIPPING_TOOL, DEFAULT_ENCODER, ENCODER_SIGNATURE]);
    }

    #[test]
    fn test_encoder_canonicalization_is_idempotent() {
        for input in [
            strings(&[RIPPING_TOOL]),
            strings(&["EAC / lame 3.97 -V1"]),
            strings(&[]),
            strings(&[ENCODER_SIGNATURE, RIPPING_TOOL]),
        ] {
            let once = canonicalize_encoders(&input);
            assert_eq!(canonicalize_encoders(&once), once);
        }
    }

    #[test]
    fn test_comment_fixes() {
        assert_eq!(canonicalize_comment("Track 7"), CommentFix::Drop);
        assert_eq!(
            canonicalize_comment(
                "00000A2B 00000B3C 0000F1E2 0000E3D4 00024CA5 00024CA5 00007FFF 00007FFF 00012345 00012345"
            ),
            CommentFix::Drop
        );
        assert_eq!(
            canonicalize_comment(RIPPING_TOOL),
            CommentFix::MoveToEncoders(RIPPING_TOOL.to_string())
        );
        assert_eq!(
            canonicalize_comment("Bought at Honest Jon's"),
            CommentFix::Keep("Bought at Honest Jon's".to_string())
        );
    }

    #[test]
    fn test_ripping_tool_comment_moves_into_encoders() {
        let mut track = Track::new("/a/b/c.mp3", 1, 1);
        track.comment = Some(RIPPING_TOOL.to_string());

        track.canonicalize();

        assert_eq!(track.comment, None);
        assert_eq!(track.encoders, vec![RIPPING_TOOL, DEFAULT_ENCODER, ENCODER_SIGNATURE]);
    }

    #[test]
    fn test_capitalize_names() {
        let mut track = Track::new("/a/b/c.mp3", 1, 1);
        track.name = Some("ventolin".into());
        track.remix_name = Some("Salbutamol Mix".into());
        track.featured_artists = vec!["cutty ranks".into()];

        track.capitalize_names();

        assert_eq!(track.name.as_deref(), Some("Ventolin"));
        assert_eq!(track.remix_name.as_deref(), Some("Salbutamol mix"));
        assert_eq!(track.featured_artists, vec!["Cutty Ranks"]);
    }

    #[test]
    fn test_sort_keys_do_not_overwrite() {
        let mut track = Track::new("/a/b/c.mp3", 1, 1);
        track.name = Some("The Crow".into());
        track.artist_name = Some("The Cure".into());
        track.artist_sort_order = Some("Cure".into());

        track.derive_sort_keys();

        assert_eq!(track.sort_order.as_deref(), Some("Crow, The"));
        assert_eq!(track.artist_sort_order.as_deref(), Some("Cure"));
    }

    fn sources(path: &str, tag: Option<RawTag>) -> SourceSet {
        SourceSet::new(Path::new(path), tag.as_ref())
    }

    #[test]
    fn test_tag_wins_over_filename_and_path() {
        let tag = RawTag::new(TagVersion::V23)
            .with_frame(RawFrame::text("TIT2", "Boom Boom Claat (feat. Cutty Ranks)"))
            .with_frame(RawFrame::text("TPE1", "The Bug"))
            .with_frame(RawFrame::text("TRCK", "4/12"))
            .with_frame(RawFrame::described("TXXX", "Featured Performer", "Flowdan"));
        let set = sources("/music/Bug/London Zoo/Bug - London Zoo - 09 - Boom.mp3", Some(tag));

        let record = reconcile_track(&set).unwrap();

        assert_eq!(record.track.sequence, 4);
        assert_eq!(record.sequence_total, Some(12));
        assert_eq!(record.track.name.as_deref(), Some("Boom Boom Claat"));
        assert_eq!(record.track.artist_name.as_deref(), Some("The Bug"));
        assert_eq!(record.track.album_name.as_deref(), Some("London Zoo"));
        assert_eq!(record.track.featured_artists, vec!["Cutty Ranks", "Flowdan"]);
    }

    #[test]
    fn test_path_disc_marker_beats_tag() {
        let tag = RawTag::new(TagVersion::V24)
            .with_frame(RawFrame::text("TRCK", "1"))
            .with_frame(RawFrame::text("TPOS", "1/2"));
        let set = sources("/music/Razor X Productions/Killing Sound disc 2/01.mp3", Some(tag));

        let record = reconcile_track(&set).unwrap();

        assert_eq!(record.track.disc_number, 2);
        assert_eq!(record.disc_total, Some(2));
    }

    #[test]
    fn test_tag_disc_used_without_path_marker() {
        let tag = RawTag::new(TagVersion::V24)
            .with_frame(RawFrame::text("TRCK", "1"))
            .with_frame(RawFrame::text("TPOS", "3"));
        let set = sources("/music/Stevie/Songs/01.mp3", Some(tag));

        assert_eq!(reconcile_track(&set).unwrap().track.disc_number, 3);
    }

    #[test]
    fn test_untagged_file_falls_back_to_filename() {
        let set = sources(
            "/music/Razor X Productions/Killing Sound/Razor X Productions - Killing Sound - 01 - Killer feat HeMan.mp3",
            None,
        );

        let record = reconcile_track(&set).unwrap();

        assert_eq!(record.track.disc_number, 1);
        assert_eq!(record.track.sequence, 1);
        assert_eq!(record.track.name.as_deref(), Some("Killer"));
        assert_eq!(record.track.featured_artists, vec!["HeMan"]);
    }

    #[test]
    fn test_zero_tag_positions_fall_back_to_filename() {
        let tag = RawTag::new(TagVersion::V24)
            .with_frame(RawFrame::text("TRCK", "0"))
            .with_frame(RawFrame::text("TPOS", "0/0"));
        let set = sources("/music/RAC/Doublejointed/RAC - Doublejointed - 07 - Intro.mp3", Some(tag));

        let record = reconcile_track(&set).unwrap();

        assert_eq!(record.track.sequence, 7);
        assert_eq!(record.track.disc_number, 1);
        assert_eq!(record.disc_total, None);
    }

    #[test]
    fn test_zero_everywhere_is_ambiguous() {
        let tag = RawTag::new(TagVersion::V24).with_frame(RawFrame::text("TRCK", "0"));
        let set = sources("/music/RAC/Doublejointed/RAC - Doublejointed - 00 - Intro.mp3", Some(tag));

        assert_matches!(
            reconcile_track(&set),
            Err(CatalogError::DataAmbiguity { field: "sequence", .. })
        );
    }

    #[test]
    fn test_unresolvable_sequence_is_ambiguous() {
        let set = sources("/music/Artist/Album/no sequence here.mp3", None);

        let result = reconcile_track(&set);

        assert_matches!(result, Err(CatalogError::DataAmbiguity { field: "sequence", .. }));
    }

    #[test]
    fn test_various_artists_path_marks_compilation() {
        let set = sources("/music/Various Artists/Dub Echoes/VA - Dub Echoes - 01 - Skank.mp3", None);
        assert!(reconcile_track(&set).unwrap().compilation);
    }
}
