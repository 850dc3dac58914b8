// components/catalog/src/aggregate.rs
use crate::canonicalize::{reconcile_track, TrackRecord};
use crate::error::CatalogError;
use crate::heuristics::parse_album_name;
use crate::model::{Album, AlbumKey, AlbumMusicBrainzIds, ReviewFlag};
use crate::text::{mixed_case, sort_key};
use std::collections::HashMap;
use std::path::PathBuf;
use tag_sources::{SourceSet, VARIOUS_ARTISTS};
use tracing::{debug, info, warn};

/// Albums built from one pass, plus the tracks that could not be placed.
#[derive(Debug, Default)]
pub struct Aggregation {
    pub albums: Vec<Album>,
    pub errors: Vec<CatalogError>,
}

/// Reconcile every file and aggregate the survivors into albums.
pub fn catalog_files(sources: &[SourceSet], non_audio: &[PathBuf]) -> Aggregation {
    let mut errors = Vec::new();
    let mut records = Vec::with_capacity(sources.len());
    for set in sources {
        match reconcile_track(set) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(error = %e, "Skipping track");
                errors.push(e);
            }
        }
    }

    let mut aggregation = aggregate(records, non_audio);
    errors.append(&mut aggregation.errors);
    aggregation.errors = errors;
    aggregation
}

/// Group reconciled tracks into albums and settle album-level fields.
///
/// Groups keep the order in which their first track arrived. Inconsistent
/// data is resolved by the rules below and never fails; only a duplicate
/// (disc, sequence) rejects a track.
pub fn aggregate(records: Vec<TrackRecord>, non_audio: &[PathBuf]) -> Aggregation {
    let mut groups: Vec<(AlbumKey, Vec<TrackRecord>)> = Vec::new();
    let mut index: HashMap<AlbumKey, usize> = HashMap::new();

    for record in records {
        let key = record.bucket.clone().unwrap_or_else(|| {
            AlbumKey::new(record.track.album_name.clone().unwrap_or_default())
        });
        match index.get(&key) {
            Some(&i) => groups[i].1.push(record),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![record]));
            }
        }
    }

    let mut aggregation = Aggregation::default();
    for (key, records) in groups {
        let album = assemble(key, records, non_audio, &mut aggregation.errors);
        info!(
            album = %album.reconstituted_name(),
            artist = album.artist_name.as_deref().unwrap_or("?"),
            tracks = album.number_of_tracks_loaded(),
            "Aggregated album"
        );
        aggregation.albums.push(album);
    }
    aggregation
}

fn assemble(
    key: AlbumKey,
    records: Vec<TrackRecord>,
    non_audio: &[PathBuf],
    errors: &mut Vec<CatalogError>,
) -> Album {
    let mut album = Album::new(key);
    album.name = records.iter().find_map(|r| r.track.album_name.clone());
    album.sort_order = records.iter().find_map(|r| r.album_sort_order.clone());

    let compilation_hint = records.iter().any(|r| r.compilation);
    let declared_discs = records.iter().filter_map(|r| r.disc_total).max();
    let ids: Vec<AlbumMusicBrainzIds> = records.iter().map(|r| r.album_musicbrainz.clone()).collect();

    let mut track_counts: HashMap<u32, u32> = HashMap::new();
    for record in records {
        let disc = record.track.disc_number;
        if let Some(total) = record.sequence_total {
            let count = track_counts.entry(disc).or_insert(0);
            *count = (*count).max(total);
        }
        if let Err(e) = album.add_track(record.track) {
            warn!(error = %e, "Rejecting track");
            errors.push(e);
        }
    }
    for (disc, count) in track_counts {
        if let Some(disc) = album.disc_mut(disc) {
            disc.expected_tracks = Some(count);
        }
    }

    settle_artist(&mut album, compilation_hint);
    settle_genre(&mut album);
    settle_release_date(&mut album);
    settle_musicbrainz(&mut album, &ids);

    // Expected disc count never trails what was found.
    let observed = album.number_of_discs_loaded();
    album.expected_discs = Some(declared_discs.unwrap_or(0).max(observed));

    share_image(&mut album);
    attach_non_audio(&mut album, non_audio);
    flag_missing_tracks(&mut album);
    finish(&mut album);
    album
}

fn distinct<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::new();
    for value in values.flatten() {
        if !value.is_empty() && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

fn settle_artist(album: &mut Album, compilation_hint: bool) {
    let tracks = album.tracks();
    let artists: Vec<String> = distinct(tracks.iter().map(|t| t.artist_name.as_deref()))
        .into_iter()
        .map(str::to_string)
        .collect();

    match artists.as_slice() {
        [] => {}
        [only] if !compilation_hint => {
            album.artist_name = Some(only.clone());
            album.compilation = false;
        }
        _ => {
            let album_name = album.name.clone().unwrap_or_default();
            let named = artists.iter().any(|a| album_name.contains(a.as_str()));
            if named && !compilation_hint {
                debug!(album = %album_name, "Album name names one of its artists, using it as artist");
                album.artist_name = Some(album_name);
                album.review_flags.push(ReviewFlag::AlbumNameAsArtist {
                    artists: artists.clone(),
                });
            } else {
                album.artist_name = Some(VARIOUS_ARTISTS.to_string());
                album.compilation = true;
            }
        }
    }

    // Non-compilations lend their artist to tracks that have none.
    if !album.compilation {
        if let Some(artist) = album.artist_name.clone() {
            for track in album.tracks_mut() {
                track.artist_name.get_or_insert_with(|| artist.clone());
            }
        }
    }
}

fn settle_genre(album: &mut Album) {
    let tracks = album.tracks();
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for genre in tracks.iter().filter_map(|t| t.genre.as_deref()) {
        if genre.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|(g, _)| *g == genre) {
            Some((_, n)) => *n += 1,
            None => counts.push((genre, 1)),
        }
    }
    // Ties go to the genre seen first.
    let winner = counts
        .iter()
        .fold(None::<(&str, usize)>, |best, &(genre, n)| match best {
            Some((_, best_n)) if best_n >= n => best,
            _ => Some((genre, n)),
        })
        .map(|(genre, _)| genre.to_string());

    if let Some(genre) = winner {
        for track in album.tracks_mut() {
            track.genre.get_or_insert_with(|| genre.clone());
        }
        album.genre = Some(genre);
    }
}

/// Year-first ordering so `"2006"` and `"2006-05-01"` compare sensibly.
fn date_order(date: &str) -> (u32, &str) {
    let year = date.get(..4).and_then(|y| y.parse().ok()).unwrap_or(0);
    (year, date)
}

fn settle_release_date(album: &mut Album) {
    let tracks = album.tracks();
    let dates = distinct(tracks.iter().map(|t| t.release_date.as_deref()));
    album.release_date = dates
        .into_iter()
        .max_by(|a, b| date_order(a).cmp(&date_order(b)))
        .map(str::to_string);
}

fn agreed<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Option<String> {
    match distinct(values).as_slice() {
        [only] => Some(only.to_string()),
        _ => None,
    }
}

fn settle_musicbrainz(album: &mut Album, ids: &[AlbumMusicBrainzIds]) {
    let mb = &mut album.musicbrainz;
    let fill = |field: &mut Option<String>, value: Option<String>| {
        if field.is_none() {
            *field = value;
        }
    };
    fill(&mut mb.album_id, agreed(ids.iter().map(|i| i.album_id.as_deref())));
    fill(&mut mb.album_artist_id, agreed(ids.iter().map(|i| i.album_artist_id.as_deref())));
    fill(&mut mb.album_type, agreed(ids.iter().map(|i| i.album_type.as_deref())));
    fill(&mut mb.album_status, agreed(ids.iter().map(|i| i.album_status.as_deref())));
    fill(
        &mut mb.album_release_country,
        agreed(ids.iter().map(|i| i.album_release_country.as_deref())),
    );
}

fn share_image(album: &mut Album) {
    let image = album.tracks().iter().find_map(|t| t.image.clone());
    if let Some(image) = image {
        for track in album.tracks_mut() {
            track.image.get_or_insert_with(|| image.clone());
        }
    }
}

fn attach_non_audio(album: &mut Album, non_audio: &[PathBuf]) {
    let directories: Vec<PathBuf> = album
        .tracks()
        .iter()
        .filter_map(|t| t.directory().map(PathBuf::from))
        .collect();
    album.non_audio_files = non_audio
        .iter()
        .filter(|p| p.parent().is_some_and(|dir| directories.iter().any(|d| d == dir)))
        .cloned()
        .collect();
}

fn flag_missing_tracks(album: &mut Album) {
    let flags: Vec<ReviewFlag> = album
        .discs()
        .filter(|d| d.number_of_tracks_loaded() < d.number_of_tracks())
        .map(|d| ReviewFlag::MissingTracks {
            disc: d.number,
            expected: d.number_of_tracks(),
            loaded: d.number_of_tracks_loaded(),
        })
        .collect();
    album.review_flags.extend(flags);
}

/// Album-name heuristics, then sort keys, then capitalization, then
/// per-track cleanup.
fn finish(album: &mut Album) {
    if let Some(raw) = album.name.take() {
        let (name, extraction) = parse_album_name(&raw);
        album.name = Some(name);
        album.mixer = extraction.mixer.or(album.mixer.take());
        album.subtitle = extraction.subtitle.or(album.subtitle.take());
        album.version_name = extraction.version.or(album.version_name.take());
        if let Some(genre) = extraction.genre {
            album.set_genre(genre);
        }
    }

    album.name = album.name.as_deref().map(mixed_case);
    album.subtitle = album.subtitle.as_deref().map(mixed_case);
    album.artist_name = album.artist_name.as_deref().map(mixed_case);
    album.genre = album.genre.as_deref().map(mixed_case);
    album.mixer = album.mixer.as_deref().map(mixed_case);

    // Articles only match once capitalized.
    if album.sort_order.is_none() {
        album.sort_order = album.name.as_deref().and_then(sort_key);
    }
    if album.artist_sort_order.is_none() {
        album.artist_sort_order = album.artist_name.as_deref().and_then(sort_key);
    }
    for track in album.tracks_mut() {
        track.capitalize_names();
        track.canonicalize();
        track.derive_sort_keys();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonicalize::ENCODER_SIGNATURE;
    use crate::model::Track;
    use crate::heuristics::SOUNDTRACK;
    use assert_matches::assert_matches;
    use tag_sources::EmbeddedImage;

    fn record(bucket: &str, disc: u32, sequence: u32, artist: &str) -> TrackRecord {
        let mut track = Track::new(
            format!("/music/{}/{}/{:02}.mp3", artist, bucket, sequence),
            disc,
            sequence,
        );
        track.name = Some(format!("Track {}", sequence));
        track.artist_name = Some(artist.to_string());
        track.album_name = Some(bucket.to_string());
        TrackRecord {
            track,
            bucket: Some(AlbumKey::new(bucket)),
            sequence_total: None,
            disc_total: None,
            compilation: false,
            album_sort_order: None,
            album_musicbrainz: AlbumMusicBrainzIds::default(),
        }
    }

    fn single(records: Vec<TrackRecord>) -> Album {
        let mut aggregation = aggregate(records, &[]);
        assert_eq!(aggregation.albums.len(), 1);
        aggregation.albums.remove(0)
    }

    #[test]
    fn test_single_artist_album() {
        let album = single(vec![
            record("Killing Sound", 1, 1, "Razor X Productions"),
            record("Killing Sound", 1, 2, "Razor X Productions"),
        ]);

        assert_eq!(album.artist_name.as_deref(), Some("Razor X Productions"));
        assert!(!album.compilation);
        assert_eq!(album.number_of_tracks_loaded(), 2);
    }

    #[test]
    fn test_distinct_artists_make_a_compilation() {
        let album = single(vec![
            record("Dub Echoes", 1, 1, "King Tubby"),
            record("Dub Echoes", 1, 2, "Scientist"),
        ]);

        assert_eq!(album.artist_name.as_deref(), Some(VARIOUS_ARTISTS));
        assert!(album.compilation);
        assert_eq!(album.tracks()[1].artist_name.as_deref(), Some("Scientist"));
    }

    #[test]
    fn test_album_name_containing_an_artist_is_flagged() {
        let album = single(vec![
            record("324 Dispersed", 1, 1, "324"),
            record("324 Dispersed", 1, 2, "Kodan"),
        ]);

        assert_eq!(album.artist_name.as_deref(), Some("324 Dispersed"));
        assert!(!album.compilation);
        assert_matches!(album.review_flags.as_slice(), [ReviewFlag::AlbumNameAsArtist { .. }]);
    }

    #[test]
    fn test_compilation_hint_forces_various_artists() {
        let mut a = record("Dub Echoes", 1, 1, "King Tubby");
        a.compilation = true;
        let album = single(vec![a, record("Dub Echoes", 1, 2, "King Tubby")]);

        assert_eq!(album.artist_name.as_deref(), Some(VARIOUS_ARTISTS));
        assert!(album.compilation);
    }

    #[test]
    fn test_same_name_different_buckets_stay_apart() {
        let mut a = record("Greatest Hits", 1, 1, "Queen");
        a.bucket = Some(AlbumKey::new("Greatest Hits|Queen|/music"));
        let mut b = record("Greatest Hits", 1, 1, "ABBA");
        b.bucket = Some(AlbumKey::new("Greatest Hits|ABBA|/music"));

        let aggregation = aggregate(vec![a, b], &[]);

        assert_eq!(aggregation.albums.len(), 2);
        assert!(aggregation.errors.is_empty());
    }

    #[test]
    fn test_duplicate_position_reported_and_rest_aggregates() {
        let aggregation = aggregate(
            vec![
                record("Killing Sound", 1, 1, "Razor X"),
                record("Killing Sound", 1, 1, "Razor X"),
                record("Killing Sound", 1, 2, "Razor X"),
            ],
            &[],
        );

        assert_eq!(aggregation.albums[0].number_of_tracks_loaded(), 2);
        assert_matches!(
            aggregation.errors.as_slice(),
            [CatalogError::DuplicatePosition { disc: 1, sequence: 1, .. }]
        );
    }

    #[test]
    fn test_most_frequent_genre_wins_ties_by_first_seen() {
        let mut records = vec![
            record("A", 1, 1, "X"),
            record("A", 1, 2, "X"),
            record("A", 1, 3, "X"),
            record("A", 1, 4, "X"),
        ];
        records[0].track.genre = Some("Dub".into());
        records[1].track.genre = Some("Dancehall".into());
        records[2].track.genre = Some("Dancehall".into());
        records[3].track.genre = Some("Dub".into());

        let album = single(records);

        assert_eq!(album.genre.as_deref(), Some("Dub"));
    }

    #[test]
    fn test_latest_release_date_wins() {
        let mut records = vec![record("A", 1, 1, "X"), record("A", 1, 2, "X")];
        records[0].track.release_date = Some("2006".into());
        records[1].track.release_date = Some("2008-03-01".into());

        assert_eq!(single(records).release_date.as_deref(), Some("2008-03-01"));
    }

    #[test]
    fn test_musicbrainz_ids_need_agreement() {
        let mut records = vec![record("A", 1, 1, "X"), record("A", 1, 2, "X")];
        records[0].album_musicbrainz.album_id = Some("r1".into());
        records[1].album_musicbrainz.album_id = Some("r1".into());
        records[0].album_musicbrainz.album_type = Some("album".into());
        records[1].album_musicbrainz.album_type = Some("single".into());

        let album = single(records);

        assert_eq!(album.musicbrainz.album_id.as_deref(), Some("r1"));
        assert_eq!(album.musicbrainz.album_type, None);
    }

    #[test]
    fn test_expected_discs_corrected_upward() {
        let mut records = vec![record("A", 1, 1, "X"), record("A", 2, 1, "X"), record("A", 3, 1, "X")];
        records[0].disc_total = Some(2);

        assert_eq!(single(records).expected_discs, Some(3));
    }

    #[test]
    fn test_track_count_hint_and_missing_tracks_flag() {
        let mut records = vec![record("A", 1, 1, "X")];
        records[0].sequence_total = Some(10);

        let album = single(records);

        assert_eq!(album.disc(1).unwrap().number_of_tracks(), 10);
        assert_matches!(
            album.review_flags.as_slice(),
            [ReviewFlag::MissingTracks { disc: 1, expected: 10, loaded: 1 }]
        );
    }

    #[test]
    fn test_image_shared_with_imageless_tracks() {
        let image = EmbeddedImage {
            mime_type: Some("image/png".into()),
            description: None,
            data: vec![1, 2, 3],
        };
        let mut records = vec![record("A", 1, 1, "X"), record("A", 1, 2, "X")];
        records[1].track.image = Some(image.clone());

        let album = single(records);

        assert!(album.tracks().iter().all(|t| t.image.as_ref() == Some(&image)));
    }

    #[test]
    fn test_soundtrack_cascades_and_sort_key_derived() {
        let mut records = vec![record("The Crow OST", 1, 1, "The Cure"), record("The Crow OST", 1, 2, "Pantera")];
        records[0].track.genre = Some("Goth".into());

        let album = single(records);

        assert_eq!(album.name.as_deref(), Some("The Crow"));
        assert_eq!(album.sort_order.as_deref(), Some("Crow, The"));
        assert_eq!(album.genre.as_deref(), Some(SOUNDTRACK));
        assert!(album.tracks().iter().all(|t| t.genre.as_deref() == Some(SOUNDTRACK)));
        assert_eq!(album.tracks()[0].artist_sort_order.as_deref(), Some("Cure, The"));
    }

    #[test]
    fn test_lowercase_names_still_get_sort_keys() {
        let mut records = vec![record("the frenz experiment", 1, 1, "the fall")];
        records[0].track.name = Some("the steak place".to_string());

        let album = single(records);

        assert_eq!(album.artist_name.as_deref(), Some("The Fall"));
        assert_eq!(album.artist_sort_order.as_deref(), Some("Fall, The"));
        assert_eq!(album.sort_order.as_deref(), Some("Frenz Experiment, The"));
        assert_eq!(album.tracks()[0].sort_order.as_deref(), Some("Steak Place, The"));
        assert_eq!(album.tracks()[0].artist_sort_order.as_deref(), Some("Fall, The"));
    }

    #[test]
    fn test_album_capitalized_and_tracks_signed() {
        let album = single(vec![record("too much acid? NO SUCH THING!", 1, 1, "x")]);

        assert_eq!(album.name.as_deref(), Some("Too Much Acid? NO SUCH THING!"));
        assert_eq!(album.tracks()[0].encoders, vec![ENCODER_SIGNATURE]);
    }

    #[test]
    fn test_non_audio_files_follow_their_directory() {
        let records = vec![record("A", 1, 1, "X")];
        let non_audio = vec![
            PathBuf::from("/music/X/A/cover.jpg"),
            PathBuf::from("/music/Y/B/cover.jpg"),
        ];

        let aggregation = aggregate(records, &non_audio);

        assert_eq!(
            aggregation.albums[0].non_audio_files,
            vec![PathBuf::from("/music/X/A/cover.jpg")]
        );
    }

    #[test]
    fn test_catalog_files_collects_ambiguity_errors() {
        let sources = vec![
            SourceSet::new(std::path::Path::new("/music/X/A/X - A - 01 - One.mp3"), None),
            SourceSet::new(std::path::Path::new("/music/X/A/liner notes.mp3"), None),
        ];

        let aggregation = catalog_files(&sources, &[]);

        assert_eq!(aggregation.albums.len(), 1);
        assert_matches!(aggregation.errors.as_slice(), [CatalogError::DataAmbiguity { .. }]);
    }
}
