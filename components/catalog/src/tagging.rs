use crate::model::{Album, Track};
use std::path::PathBuf;
use tag_sources::{MusicBrainzIds, TagUpdate};

/// Title as stored in a tag: the name with featured artists folded back in.
/// The remix goes to its own field.
fn tag_title(track: &Track) -> Option<String> {
    let name = track.name.as_deref()?;
    Some(match track.featured_artists.as_slice() {
        [] => name.to_string(),
        featured => format!("{} (feat. {})", name, featured.join(" & ")),
    })
}

/// The canonical tag for every track, keyed by the track's current path.
pub fn tag_updates(album: &Album) -> Vec<(PathBuf, TagUpdate)> {
    let disc_total = Some(album.number_of_discs());
    let album_name = album.name.as_ref().map(|_| album.reconstituted_name());

    album
        .discs()
        .flat_map(|disc| {
            let sequence_total = Some(disc.number_of_tracks());
            disc.tracks_sorted().into_iter().map(move |track| (sequence_total, track))
        })
        .map(|(sequence_total, track)| {
            let update = TagUpdate {
                title: tag_title(track),
                remix_name: track.remix_name.clone(),
                artist_name: track.artist_name.clone().or_else(|| album.artist_name.clone()),
                album_name: album_name.clone(),
                album_artist: album.artist_name.clone(),
                disc_number: track.disc_number,
                disc_total,
                sequence: track.sequence,
                sequence_total,
                genre: track.genre.clone().or_else(|| album.genre.clone()),
                release_date: track.release_date.clone().or_else(|| album.release_date.clone()),
                comment: track.comment.clone(),
                encoders: track.encoders.clone(),
                compilation: album.compilation,
                album_sort_order: album.sort_order.clone(),
                artist_sort_order: track.artist_sort_order.clone(),
                track_sort_order: track.sort_order.clone(),
                unique_id: track.unique_id.clone(),
                musicbrainz: MusicBrainzIds {
                    artist_id: track.musicbrainz_artist_id.clone(),
                    album_id: album.musicbrainz.album_id.clone(),
                    album_artist_id: album.musicbrainz.album_artist_id.clone(),
                    album_type: album.musicbrainz.album_type.clone(),
                    album_status: album.musicbrainz.album_status.clone(),
                    album_release_country: album.musicbrainz.album_release_country.clone(),
                },
            };
            (track.path.clone(), update)
        })
        .collect()
}
