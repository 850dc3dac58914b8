use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tag_sources::EmbeddedImage;

/// Identity of an album across edits: derived once from the bucket its
/// tracks were grouped by, never from the (editable) display fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AlbumKey(String);

impl AlbumKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlbumKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub path: PathBuf,
    pub name: Option<String>,
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
    pub disc_number: u32,
    pub sequence: u32,
    pub remix_name: Option<String>,
    pub featured_artists: Vec<String>,
    pub genre: Option<String>,
    pub comment: Option<String>,
    pub encoders: Vec<String>,
    pub release_date: Option<String>,
    pub sort_order: Option<String>,
    pub artist_sort_order: Option<String>,
    pub unique_id: Option<String>,
    pub musicbrainz_artist_id: Option<String>,
    pub image: Option<EmbeddedImage>,
}

impl Track {
    pub fn new(path: impl Into<PathBuf>, disc_number: u32, sequence: u32) -> Self {
        Self {
            path: path.into(),
            name: None,
            artist_name: None,
            album_name: None,
            disc_number,
            sequence,
            remix_name: None,
            featured_artists: Vec::new(),
            genre: None,
            comment: None,
            encoders: Vec::new(),
            release_date: None,
            sort_order: None,
            artist_sort_order: None,
            unique_id: None,
            musicbrainz_artist_id: None,
            image: None,
        }
    }

    /// Name with featured artists and remix folded back in:
    /// `Name (feat. A & B) [Remix]`.
    pub fn reconstituted_name(&self) -> String {
        let mut out = self.name.clone().unwrap_or_default();
        if !self.featured_artists.is_empty() {
            out.push_str(&format!(" (feat. {})", self.featured_artists.join(" & ")));
        }
        if let Some(remix) = &self.remix_name {
            out.push_str(&format!(" [{}]", remix));
        }
        out
    }

    pub fn file_extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
    }

    pub fn directory(&self) -> Option<&Path> {
        self.path.parent()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disc {
    pub number: u32,
    /// Declared track count, may differ from what was found on disk.
    pub expected_tracks: Option<u32>,
    tracks: Vec<Track>,
}

impl Disc {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            expected_tracks: None,
            tracks: Vec::new(),
        }
    }

    pub fn number_of_tracks(&self) -> u32 {
        self.expected_tracks
            .unwrap_or(self.number_of_tracks_loaded())
    }

    pub fn number_of_tracks_loaded(&self) -> u32 {
        self.tracks.len() as u32
    }

    pub fn track(&self, sequence: u32) -> Option<&Track> {
        self.tracks.iter().find(|t| t.sequence == sequence)
    }

    pub fn tracks_sorted(&self) -> Vec<&Track> {
        let mut tracks: Vec<&Track> = self.tracks.iter().collect();
        tracks.sort_by_key(|t| t.sequence);
        tracks
    }

    fn tracks_sorted_mut(&mut self) -> impl Iterator<Item = &mut Track> {
        self.tracks.sort_by_key(|t| t.sequence);
        self.tracks.iter_mut()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumMusicBrainzIds {
    pub album_id: Option<String>,
    pub album_artist_id: Option<String>,
    pub album_type: Option<String>,
    pub album_status: Option<String>,
    pub album_release_country: Option<String>,
}

/// Decisions the aggregation made on weak evidence, for an operator to check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewFlag {
    /// Several artists and the album name contains one of them, so the
    /// album name was taken as the album artist.
    AlbumNameAsArtist { artists: Vec<String> },
    /// Fewer tracks were found than the disc declares.
    MissingTracks { disc: u32, expected: u32, loaded: u32 },
}

impl fmt::Display for ReviewFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlbumNameAsArtist { artists } => write!(
                f,
                "album name used as artist; track artists were {}",
                artists.join(", ")
            ),
            Self::MissingTracks {
                disc,
                expected,
                loaded,
            } => write!(f, "disc {} has {} of {} tracks", disc, loaded, expected),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub key: AlbumKey,
    pub name: Option<String>,
    pub subtitle: Option<String>,
    pub version_name: Option<String>,
    pub artist_name: Option<String>,
    pub compilation: bool,
    pub genre: Option<String>,
    pub release_date: Option<String>,
    pub mixer: Option<String>,
    pub sort_order: Option<String>,
    pub artist_sort_order: Option<String>,
    pub musicbrainz: AlbumMusicBrainzIds,
    /// Declared disc count, corrected upward to what was found.
    pub expected_discs: Option<u32>,
    pub non_audio_files: Vec<PathBuf>,
    pub review_flags: Vec<ReviewFlag>,
    discs: BTreeMap<u32, Disc>,
}

impl Album {
    pub fn new(key: AlbumKey) -> Self {
        Self {
            key,
            name: None,
            subtitle: None,
            version_name: None,
            artist_name: None,
            compilation: false,
            genre: None,
            release_date: None,
            mixer: None,
            sort_order: None,
            artist_sort_order: None,
            musicbrainz: AlbumMusicBrainzIds::default(),
            expected_discs: None,
            non_audio_files: Vec::new(),
            review_flags: Vec::new(),
            discs: BTreeMap::new(),
        }
    }

    /// Insert a track on its disc, creating the disc when needed.
    pub fn add_track(&mut self, track: Track) -> Result<()> {
        let disc = self
            .discs
            .entry(track.disc_number)
            .or_insert_with(|| Disc::new(track.disc_number));
        if disc.track(track.sequence).is_some() {
            return Err(CatalogError::DuplicatePosition {
                path: track.path,
                disc: track.disc_number,
                sequence: track.sequence,
            });
        }
        disc.tracks.push(track);
        Ok(())
    }

    pub fn disc(&self, number: u32) -> Option<&Disc> {
        self.discs.get(&number)
    }

    pub fn disc_mut(&mut self, number: u32) -> Option<&mut Disc> {
        self.discs.get_mut(&number)
    }

    pub fn discs(&self) -> impl Iterator<Item = &Disc> {
        self.discs.values()
    }

    /// All tracks ordered by (disc, sequence).
    pub fn tracks(&self) -> Vec<&Track> {
        self.discs.values().flat_map(Disc::tracks_sorted).collect()
    }

    pub fn tracks_mut(&mut self) -> impl Iterator<Item = &mut Track> {
        self.discs.values_mut().flat_map(|disc| disc.tracks_sorted_mut())
    }

    pub fn number_of_tracks(&self) -> u32 {
        self.discs.values().map(Disc::number_of_tracks).sum()
    }

    pub fn number_of_tracks_loaded(&self) -> u32 {
        self.discs.values().map(Disc::number_of_tracks_loaded).sum()
    }

    pub fn number_of_discs_loaded(&self) -> u32 {
        self.discs.len() as u32
    }

    pub fn number_of_discs(&self) -> u32 {
        self.expected_discs
            .unwrap_or(0)
            .max(self.number_of_discs_loaded())
    }

    /// `Name: Subtitle [Version]`, the album name as it was before parsing.
    pub fn reconstituted_name(&self) -> String {
        let mut out = self.name.clone().unwrap_or_default();
        if let Some(subtitle) = &self.subtitle {
            out.push_str(&format!(": {}", subtitle));
        }
        if let Some(version) = &self.version_name {
            out.push_str(&format!(" [{}]", version));
        }
        out
    }

    /// Encoders across all tracks, first-seen order. Identical lists collapse
    /// to one naturally.
    pub fn encoders(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for track in self.tracks() {
            for encoder in &track.encoders {
                if !out.contains(encoder) {
                    out.push(encoder.clone());
                }
            }
        }
        out
    }

    /// Set the album genre and every track's genre with it.
    pub fn set_genre(&mut self, genre: impl Into<String>) {
        let genre = genre.into();
        for track in self.tracks_mut() {
            track.genre = Some(genre.clone());
        }
        self.genre = Some(genre);
    }

    pub fn year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .map(|date| date.get(..4).unwrap_or(date))
    }
}
