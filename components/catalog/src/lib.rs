//! The in-memory catalog: tracks reconciled from their metadata sources,
//! grouped into discs and albums, cleaned up for archiving.

mod aggregate;
mod canonicalize;
mod display;
mod error;
mod heuristics;
mod model;
mod tagging;
mod text;

pub use aggregate::{aggregate, catalog_files, Aggregation};
pub use canonicalize::{
    canonicalize_comment, canonicalize_encoders, reconcile_track, CommentFix, TrackRecord,
    DEFAULT_ENCODER, ENCODER_SIGNATURE, EXACT_AUDIO_COPY, RIPPING_TOOL,
};
pub use error::{CatalogError, Result};
pub use heuristics::{
    apply_rules, parse_album_name, parse_artist_name, parse_track_name, Extraction, Rule,
    ALBUM_NAME_RULES, ARTIST_NAME_RULES, SOUNDTRACK, TRACK_NAME_RULES,
};
pub use model::{Album, AlbumKey, AlbumMusicBrainzIds, Disc, ReviewFlag, Track};
pub use tagging::tag_updates;
pub use text::{capitalize_remix, explode_names, mixed_case, sort_key, REMIX_STOPWORDS};
