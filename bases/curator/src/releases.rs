use catalog::Album;
use release_matcher::{
    choose_candidate, populate_album_from_match, MatchError, MatchSession, ReleaseCandidate,
    ReleaseQuery, ReleaseSource,
};
use std::convert::Infallible;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ReleaseFileError {
    #[error("Failed to read release file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed release file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Releases listed in a local JSON file, searched the way a remote
/// database would be.
#[derive(Debug, Default)]
pub struct JsonReleaseSource {
    releases: Vec<ReleaseCandidate>,
}

impl JsonReleaseSource {
    pub fn load(path: &Path) -> Result<Self, ReleaseFileError> {
        let contents = fs::read_to_string(path).map_err(|source| ReleaseFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let releases = serde_json::from_str(&contents).map_err(|source| ReleaseFileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_releases(releases))
    }

    pub fn from_releases(releases: Vec<ReleaseCandidate>) -> Self {
        Self { releases }
    }
}

fn loose(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

impl ReleaseSource for JsonReleaseSource {
    type Error = Infallible;

    fn search(&self, query: &ReleaseQuery) -> Result<Vec<ReleaseCandidate>, Infallible> {
        let matches = |release: &ReleaseCandidate| {
            if query.exact {
                release.name.eq_ignore_ascii_case(&query.album)
                    && release.artist.name.eq_ignore_ascii_case(&query.artist)
            } else {
                loose(&release.name).contains(&loose(&query.album))
                    && loose(&release.artist.name).contains(&loose(&query.artist))
            }
        };
        Ok(self.releases.iter().filter(|r| matches(r)).cloned().collect())
    }
}

/// Match every album and copy ids from the preferred release.
/// Returns how many albums were matched.
pub fn match_albums<S: ReleaseSource>(session: &mut MatchSession<S>, albums: &mut [Album]) -> usize {
    let mut matched = 0;
    for album in albums.iter_mut() {
        let candidates = match session.find_album_matches(album) {
            Ok(candidates) => candidates,
            Err(MatchError::MissingField(field)) => {
                debug!(album = %album.key, field, "Not enough to search releases");
                continue;
            }
            Err(e) => {
                warn!(album = %album.key, error = %e, "Release lookup failed");
                continue;
            }
        };
        let Some(candidate) = choose_candidate(&candidates) else {
            debug!(album = %album.key, "No matching release");
            continue;
        };
        match populate_album_from_match(album, candidate) {
            Ok(()) => {
                info!(album = %album.key, release = %candidate.id, "Matched release");
                matched += 1;
            }
            Err(e) => warn!(album = %album.key, error = %e, "Could not apply release"),
        }
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use catalog::{AlbumKey, Track};
    use release_matcher::{CandidateTrack, ReleaseArtist, ReleaseEvent};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn release(id: &str, name: &str, tracks: usize) -> ReleaseCandidate {
        let artist = ReleaseArtist {
            id: "a1".to_string(),
            name: "Portishead".to_string(),
            sort_name: Some("Portishead".to_string()),
        };
        ReleaseCandidate {
            id: id.to_string(),
            name: name.to_string(),
            release_type: Some("Album".to_string()),
            status: Some("Official".to_string()),
            artist: artist.clone(),
            release_events: vec![ReleaseEvent {
                country: Some("GB".to_string()),
                date: Some("1994".to_string()),
            }],
            tracks: (1..=tracks)
                .map(|n| CandidateTrack {
                    id: format!("{}-{}", id, n),
                    name: format!("Track {}", n),
                    duration_ms: None,
                    artist: artist.clone(),
                })
                .collect(),
        }
    }

    fn album(name: &str, tracks: u32) -> Album {
        let mut album = Album::new(AlbumKey::new(name));
        album.artist_name = Some("Portishead".to_string());
        album.name = Some(name.to_string());
        for n in 1..=tracks {
            album.add_track(Track::new(format!("/m/{}.mp3", n), 1, n)).unwrap();
        }
        album
    }

    #[test]
    fn test_exact_search_ignores_case() {
        let source = JsonReleaseSource::from_releases(vec![release("r1", "Dummy", 2)]);
        let query = ReleaseQuery {
            artist: "portishead".to_string(),
            album: "DUMMY".to_string(),
            exact: true,
        };
        assert_eq!(source.search(&query).unwrap().len(), 1);
    }

    #[test]
    fn test_loose_search_ignores_punctuation() {
        let source = JsonReleaseSource::from_releases(vec![release("r1", "Dummy (Remastered)", 2)]);
        let query = ReleaseQuery {
            artist: "Portishead".to_string(),
            album: "dummy".to_string(),
            exact: false,
        };
        assert_eq!(source.search(&query).unwrap().len(), 1);
    }

    #[test]
    fn test_match_albums_populates_ids() {
        let source = JsonReleaseSource::from_releases(vec![release("r1", "Dummy", 2)]);
        let mut session = MatchSession::new(source);
        let mut albums = vec![album("Dummy", 2), album("Third", 1)];

        let matched = match_albums(&mut session, &mut albums);

        assert_eq!(matched, 1);
        assert_eq!(albums[0].musicbrainz.album_id.as_deref(), Some("r1"));
        assert_eq!(albums[1].musicbrainz.album_id, None);
    }

    #[test]
    fn test_load_reads_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&vec![release("r1", "Dummy", 1)]).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let source = JsonReleaseSource::load(file.path()).unwrap();

        assert_eq!(source.releases.len(), 1);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();

        assert_matches!(
            JsonReleaseSource::load(file.path()),
            Err(ReleaseFileError::Parse { .. })
        );
    }
}
