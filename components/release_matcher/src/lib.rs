//! Matching cataloged albums against a remote release database.
//!
//! The database itself sits behind [`ReleaseSource`]; this crate owns the
//! search heuristics and the per-session lookup cache.

use catalog::Album;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

/// Release country preferred when several candidates fit.
pub const PREFERRED_COUNTRY: &str = "US";

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Album has no {0} to search for")]
    MissingField(&'static str),

    #[error("Release lookup failed: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Release has {candidate} tracks but the album has {album}")]
    TrackCountMismatch { candidate: usize, album: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReleaseQuery {
    pub artist: String,
    pub album: String,
    /// Exact name match rather than a loosened search.
    pub exact: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseArtist {
    pub id: String,
    pub name: String,
    pub sort_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseEvent {
    pub country: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTrack {
    pub id: String,
    pub name: String,
    pub duration_ms: Option<u64>,
    pub artist: ReleaseArtist,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseCandidate {
    pub id: String,
    pub name: String,
    pub release_type: Option<String>,
    pub status: Option<String>,
    pub artist: ReleaseArtist,
    pub release_events: Vec<ReleaseEvent>,
    pub tracks: Vec<CandidateTrack>,
}

impl ReleaseCandidate {
    pub fn released_in(&self, country: &str) -> bool {
        self.release_events
            .iter()
            .any(|event| event.country.as_deref() == Some(country))
    }
}

/// The remote release database.
pub trait ReleaseSource {
    type Error: std::error::Error + Send + Sync + 'static;

    fn search(&self, query: &ReleaseQuery) -> Result<Vec<ReleaseCandidate>, Self::Error>;
}

/// A matching session. Search results are cached for the lifetime of the
/// session only; dropping it forgets them.
pub struct MatchSession<S> {
    source: S,
    cache: HashMap<ReleaseQuery, Vec<ReleaseCandidate>>,
}

impl<S: ReleaseSource> MatchSession<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: HashMap::new(),
        }
    }

    pub fn cached_queries(&self) -> usize {
        self.cache.len()
    }

    fn search(&mut self, query: ReleaseQuery) -> Result<&[ReleaseCandidate], MatchError> {
        if !self.cache.contains_key(&query) {
            debug!(artist = %query.artist, album = %query.album, exact = query.exact, "Searching releases");
            let found = self
                .source
                .search(&query)
                .map_err(|e| MatchError::Source(Box::new(e)))?;
            self.cache.insert(query.clone(), found);
        }
        Ok(self.cache.get(&query).map(Vec::as_slice).unwrap_or_default())
    }

    /// Releases with as many tracks as the album: exact name search first,
    /// a loosened search only when that finds none.
    pub fn find_album_matches(&mut self, album: &Album) -> Result<Vec<ReleaseCandidate>, MatchError> {
        let artist = album
            .artist_name
            .clone()
            .ok_or(MatchError::MissingField("artist"))?;
        let name = album.name.clone().ok_or(MatchError::MissingField("name"))?;
        let track_count = album.number_of_tracks_loaded() as usize;

        for exact in [true, false] {
            let query = ReleaseQuery {
                artist: artist.clone(),
                album: name.clone(),
                exact,
            };
            let candidates: Vec<ReleaseCandidate> = self
                .search(query)?
                .iter()
                .filter(|c| c.tracks.len() == track_count)
                .cloned()
                .collect();
            if !candidates.is_empty() {
                info!(album = %name, exact, found = candidates.len(), "Found release candidates");
                return Ok(candidates);
            }
        }
        Ok(Vec::new())
    }
}

/// Prefer a release in [`PREFERRED_COUNTRY`], else the first one.
pub fn choose_candidate(candidates: &[ReleaseCandidate]) -> Option<&ReleaseCandidate> {
    candidates
        .iter()
        .find(|c| c.released_in(PREFERRED_COUNTRY))
        .or_else(|| candidates.first())
}

/// Copy release ids onto the album and track ids onto tracks by position.
pub fn populate_album_from_match(
    album: &mut Album,
    candidate: &ReleaseCandidate,
) -> Result<(), MatchError> {
    let album_tracks = album.number_of_tracks_loaded() as usize;
    if candidate.tracks.len() != album_tracks {
        return Err(MatchError::TrackCountMismatch {
            candidate: candidate.tracks.len(),
            album: album_tracks,
        });
    }

    let mb = &mut album.musicbrainz;
    mb.album_id = Some(candidate.id.clone());
    mb.album_type = candidate.release_type.clone();
    mb.album_status = candidate.status.clone();
    mb.album_release_country = candidate
        .release_events
        .first()
        .and_then(|event| event.country.clone());
    mb.album_artist_id = Some(candidate.artist.id.clone());
    if album.artist_sort_order.is_none() {
        album.artist_sort_order = candidate.artist.sort_name.clone();
    }

    for (track, matched) in album.tracks_mut().zip(&candidate.tracks) {
        track.unique_id = Some(matched.id.clone());
        track.musicbrainz_artist_id = Some(matched.artist.id.clone());
        if track.artist_sort_order.is_none() {
            track.artist_sort_order = matched.artist.sort_name.clone();
        }
    }
    Ok(())
}
