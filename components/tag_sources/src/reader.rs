// components/tag_sources/src/reader.rs
use crate::error::{Result, SourceError};
use crate::tag::{EmbeddedImage, RawFrame, RawTag, TagVersion, MUSICBRAINZ_OWNER};
use lofty::{ItemKey, Probe, TaggedFileExt};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// The tag I/O collaborator. `Ok(None)` means the file has no tag.
pub trait TagReader {
    fn read_tag(&self, path: &Path) -> Result<Option<RawTag>>;
}

/// Reads tags through lofty, exposing them with ID3v2.4 frame ids.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTagReader;

impl TagReader for LoftyTagReader {
    fn read_tag(&self, path: &Path) -> Result<Option<RawTag>> {
        let detected = detect_version(path)?;

        let tagged_file = Probe::open(path)
            .map_err(|e| SourceError::lofty(path, e))?
            .read()
            .map_err(|e| SourceError::lofty(path, e))?;

        let Some(tag) = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag())
        else {
            debug!(path = %path.display(), "No tag present");
            return Ok(None);
        };

        // Non-ID3 containers are read through the latest schema.
        let version = detected.unwrap_or(TagVersion::V24);
        debug!(path = %path.display(), %version, tag_type = ?tag.tag_type(), "Reading tag");

        let mut raw = RawTag::new(version);
        let mut track = (None, None);
        let mut disc = (None, None);

        for item in tag.items() {
            let Some(text) = item.value().text() else {
                continue;
            };
            match item.key() {
                ItemKey::TrackNumber => track.0 = Some(text.to_string()),
                ItemKey::TrackTotal => track.1 = Some(text.to_string()),
                ItemKey::DiscNumber => disc.0 = Some(text.to_string()),
                ItemKey::DiscTotal => disc.1 = Some(text.to_string()),
                key => {
                    if let Some(frame) = frame_for(key, text) {
                        raw.frames.push(frame);
                    }
                }
            }
        }

        if let Some(position) = join_position(track) {
            raw.frames.push(RawFrame::text("TRCK", position));
        }
        if let Some(position) = join_position(disc) {
            raw.frames.push(RawFrame::text("TPOS", position));
        }

        for picture in tag.pictures() {
            raw.frames.push(RawFrame::picture(
                "APIC",
                EmbeddedImage {
                    mime_type: sniff_mime_type(picture.data()).map(str::to_string),
                    description: picture.description().map(str::to_string),
                    data: picture.data().to_vec(),
                },
            ));
        }

        Ok(Some(raw))
    }
}

fn frame_for(key: &ItemKey, text: &str) -> Option<RawFrame> {
    let frame = match key {
        ItemKey::TrackTitle => RawFrame::text("TIT2", text),
        ItemKey::TrackSubtitle => RawFrame::text("TIT3", text),
        ItemKey::AlbumTitle => RawFrame::text("TALB", text),
        ItemKey::TrackArtist => RawFrame::text("TPE1", text),
        ItemKey::Genre => RawFrame::text("TCON", text),
        ItemKey::RecordingDate => RawFrame::text("TDRC", text),
        ItemKey::Year => RawFrame::text("TYER", text),
        ItemKey::Comment => RawFrame::text("COMM", text),
        ItemKey::EncoderSoftware => RawFrame::text("TSSE", text),
        ItemKey::EncodedBy => RawFrame::text("TENC", text),
        ItemKey::FlagCompilation => RawFrame::text("TCMP", text),
        ItemKey::AlbumTitleSortOrder => RawFrame::text("TSOA", text),
        ItemKey::TrackArtistSortOrder => RawFrame::text("TSOP", text),
        ItemKey::TrackTitleSortOrder => RawFrame::text("TSOT", text),
        ItemKey::MusicBrainzRecordingId => RawFrame::described("UFID", MUSICBRAINZ_OWNER, text),
        ItemKey::MusicBrainzArtistId => {
            RawFrame::described("TXXX", "MusicBrainz Artist Id", text)
        }
        ItemKey::MusicBrainzReleaseId => RawFrame::described("TXXX", "MusicBrainz Album Id", text),
        ItemKey::MusicBrainzReleaseArtistId => {
            RawFrame::described("TXXX", "MusicBrainz Album Artist Id", text)
        }
        ItemKey::Unknown(name) if is_frame_id(name) => RawFrame::text(name.as_str(), text),
        ItemKey::Unknown(name) => RawFrame::described("TXXX", name.as_str(), text),
        _ => return None,
    };
    Some(frame)
}

fn sniff_mime_type(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if data.starts_with(b"\x89PNG") {
        Some("image/png")
    } else if data.starts_with(b"GIF8") {
        Some("image/gif")
    } else {
        None
    }
}

fn is_frame_id(name: &str) -> bool {
    (3..=4).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

fn join_position((position, total): (Option<String>, Option<String>)) -> Option<String> {
    match (position, total) {
        (Some(position), Some(total)) => Some(format!("{}/{}", position, total)),
        (Some(position), None) => Some(position),
        (None, _) => None,
    }
}

/// Detect the ID3 flavour from the raw file bytes: an `ID3` header with
/// its major version, or a `TAG` block in the last 128 bytes.
/// `Ok(None)` means neither is present.
pub fn detect_version(path: &Path) -> Result<Option<TagVersion>> {
    let mut file = File::open(path).map_err(|e| SourceError::io(path, e))?;

    let mut header = [0u8; 10];
    let read = read_up_to(&mut file, &mut header).map_err(|e| SourceError::io(path, e))?;
    if read >= 4 && &header[..3] == b"ID3" {
        let major = header[3];
        return TagVersion::from_id3v2_major(major)
            .map(Some)
            .ok_or_else(|| SourceError::unsupported(path, format!("ID3v2.{}", major)));
    }

    let len = file
        .metadata()
        .map_err(|e| SourceError::io(path, e))?
        .len();
    if len >= 128 {
        let mut trailer = [0u8; 3];
        file.seek(SeekFrom::Start(len - 128))
            .and_then(|_| file.read_exact(&mut trailer))
            .map_err(|e| SourceError::io(path, e))?;
        if &trailer == b"TAG" {
            return Ok(Some(TagVersion::Legacy));
        }
    }

    Ok(None)
}

fn read_up_to(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}
