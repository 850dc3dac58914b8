//! Moves cataloged albums into the canonical archive layout without ever
//! overwriting or losing a file.

mod cleanup;
mod error;
mod mover;
mod naming;
mod queue;

pub use cleanup::{clean_vacated, is_housekeeping, CleanupWarning, HOUSEKEEPING_FILES};
pub use error::{ArchiveError, Result};
pub use mover::{safe_copy, Archiver, PlannedMove};
pub use naming::{album_segment, artist_segment, disc_segment, sanitize_segment, TrackLocation};
pub use queue::{AlbumArchiver, ArchiveOutcome, ArchiveQueue, OutcomeObserver};
