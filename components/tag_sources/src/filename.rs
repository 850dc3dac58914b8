use crate::path::split_disc_marker;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metadata implied by the canonical file naming convention
/// `<artist> - <album> - <sequence> - <track>.<ext>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilenameMetadata {
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
    pub disc_number: Option<u32>,
    pub sequence: Option<u32>,
    pub track_name: Option<String>,
}

impl FilenameMetadata {
    pub fn from_path(path: &Path) -> Self {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            return Self::default();
        };

        // The track name may itself contain " - ", so only split off three fields.
        let mut parts = stem.splitn(4, " - ").map(str::trim);
        let artist_name = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
        let (album_name, disc_number) = match parts.next().filter(|s| !s.is_empty()) {
            Some(raw) => {
                let (name, disc) = split_disc_marker(raw);
                (Some(name), disc)
            }
            None => (None, None),
        };
        let sequence = parts
            .next()
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|n| *n > 0);
        let track_name = parts.next().filter(|s| !s.is_empty()).map(str::to_string);

        Self {
            artist_name,
            album_name,
            disc_number,
            sequence,
            track_name,
        }
    }
}
