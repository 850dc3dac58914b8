use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

static DISC_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.+?)\s*(?:\[disc\s+([0-9]+)\]|\bdisc\s+([0-9]+))$").expect("valid regex")
});

pub const VARIOUS_ARTISTS: &str = "Various Artists";

/// Split a trailing `disc N` or `[disc N]` marker off an album name.
///
/// ```
/// use tag_sources::split_disc_marker;
/// assert_eq!(split_disc_marker("Killing Sound disc 2"), ("Killing Sound".to_string(), Some(2)));
/// assert_eq!(split_disc_marker("Killing Sound"), ("Killing Sound".to_string(), None));
/// ```
pub fn split_disc_marker(name: &str) -> (String, Option<u32>) {
    match DISC_SUFFIX.captures(name) {
        Some(caps) => {
            let number = caps
                .get(2)
                .or_else(|| caps.get(3))
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .filter(|n| *n > 0);
            match number {
                Some(number) => (caps[1].trim().to_string(), Some(number)),
                None => (name.to_string(), None),
            }
        }
        None => (name.to_string(), None),
    }
}

/// Metadata implied by where a file lives: `.../<artist>/<album>/<file>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMetadata {
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
    /// Only set when the album directory carried an explicit disc marker.
    pub disc_number: Option<u32>,
    /// The directory above the artist directory, used to keep
    /// same-named releases from different trees apart.
    pub parent_signature: Option<String>,
}

impl PathMetadata {
    pub fn from_path(path: &Path) -> Self {
        let album_dir = path.parent();
        let artist_dir = album_dir.and_then(Path::parent);

        let dir_name = |dir: Option<&Path>| {
            dir.and_then(Path::file_name)
                .and_then(|s| s.to_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let (album_name, disc_number) = match dir_name(album_dir) {
            Some(raw) => {
                let (name, disc) = split_disc_marker(&raw);
                (Some(name), disc)
            }
            None => (None, None),
        };

        Self {
            artist_name: dir_name(artist_dir),
            album_name,
            disc_number,
            parent_signature: artist_dir
                .and_then(Path::parent)
                .map(|p| p.to_string_lossy().into_owned()),
        }
    }

    /// A `Various Artists` directory marks the album as a compilation.
    pub fn is_compilation(&self) -> bool {
        self.artist_name.as_deref() == Some(VARIOUS_ARTISTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_artist_and_album_from_directories() {
        let meta = PathMetadata::from_path(Path::new(
            "/music/Razor X Productions/Killing Sound/01 - Killer.mp3",
        ));

        assert_eq!(meta.artist_name.as_deref(), Some("Razor X Productions"));
        assert_eq!(meta.album_name.as_deref(), Some("Killing Sound"));
        assert_eq!(meta.disc_number, None);
        assert_eq!(meta.parent_signature.as_deref(), Some("/music"));
    }

    #[rstest]
    #[case("Killing Sound disc 1", "Killing Sound", Some(1))]
    #[case("Killing Sound disc 2", "Killing Sound", Some(2))]
    #[case("Killing Sound [disc 3]", "Killing Sound", Some(3))]
    #[case("Killing Sound", "Killing Sound", None)]
    #[case("Discipline", "Discipline", None)]
    #[case("Killing Sound disc 0", "Killing Sound disc 0", None)]
    fn test_disc_marker(
        #[case] directory: &str,
        #[case] album: &str,
        #[case] disc: Option<u32>,
    ) {
        let path = format!("/music/Razor X Productions/{}/track.mp3", directory);
        let meta = PathMetadata::from_path(Path::new(&path));

        assert_eq!(meta.album_name.as_deref(), Some(album));
        assert_eq!(meta.disc_number, disc);
    }

    #[test]
    fn test_shallow_path_leaves_fields_unset() {
        let meta = PathMetadata::from_path(Path::new("track.mp3"));

        assert_eq!(meta.artist_name, None);
        assert_eq!(meta.album_name, None);
    }

    #[test]
    fn test_various_artists_is_compilation() {
        let meta = PathMetadata::from_path(Path::new("/music/Various Artists/Dub Echoes/01.mp3"));
        assert!(meta.is_compilation());
    }
}
