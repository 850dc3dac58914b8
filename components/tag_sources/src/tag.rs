use crate::genre::resolve_genre;
use crate::path::split_disc_marker;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::warn;

pub const FEATURED_PERFORMER: &str = "Featured Performer";
pub const MUSICBRAINZ_OWNER: &str = "http://musicbrainz.org";

/// Tag schema version detected on a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagVersion {
    /// ID3v1, title/artist/album/year/comment/track/genre only.
    Legacy,
    V22,
    V23,
    V24,
}

impl TagVersion {
    /// Map an ID3v2 major version byte onto a schema.
    pub fn from_id3v2_major(major: u8) -> Option<Self> {
        match major {
            2 => Some(Self::V22),
            3 => Some(Self::V23),
            4 => Some(Self::V24),
            _ => None,
        }
    }

    pub fn schema(self) -> &'static Schema {
        match self {
            Self::Legacy => &LEGACY,
            Self::V22 => &V22,
            Self::V23 => &V23,
            Self::V24 => &V24,
        }
    }
}

impl fmt::Display for TagVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Legacy => "ID3v1",
            Self::V22 => "ID3v2.2",
            Self::V23 => "ID3v2.3",
            Self::V24 => "ID3v2.4",
        };
        f.write_str(name)
    }
}

/// Frame identifiers backing each uniform field, in lookup order.
/// An empty list means the version has no such field.
#[derive(Debug)]
pub struct Schema {
    pub track_name: &'static [&'static str],
    pub remix_name: &'static [&'static str],
    pub album_name: &'static [&'static str],
    pub artist_name: &'static [&'static str],
    pub disc_set: &'static [&'static str],
    pub sequence: &'static [&'static str],
    pub genre: &'static [&'static str],
    pub release_date: &'static [&'static str],
    pub comment: &'static [&'static str],
    pub encoder: &'static [&'static str],
    pub compilation: &'static [&'static str],
    pub album_sort: &'static [&'static str],
    pub artist_sort: &'static [&'static str],
    pub track_sort: &'static [&'static str],
    pub unique_id: &'static [&'static str],
    pub user_text: &'static [&'static str],
    pub involved_people: &'static [&'static str],
    pub image: &'static [&'static str],
}

static LEGACY: Schema = Schema {
    track_name: &["TIT2"],
    remix_name: &[],
    album_name: &["TALB"],
    artist_name: &["TPE1"],
    disc_set: &[],
    sequence: &["TRCK"],
    genre: &["TCON"],
    release_date: &["TDRC", "TYER"],
    comment: &["COMM"],
    encoder: &[],
    compilation: &[],
    album_sort: &[],
    artist_sort: &[],
    track_sort: &[],
    unique_id: &[],
    user_text: &[],
    involved_people: &[],
    image: &[],
};

static V22: Schema = Schema {
    track_name: &["TT2", "TIT2"],
    remix_name: &["TT3", "TIT3"],
    album_name: &["TAL", "TALB"],
    artist_name: &["TP1", "TPE1"],
    disc_set: &["TPA", "TPOS"],
    sequence: &["TRK", "TRCK"],
    genre: &["TCO", "TCON"],
    release_date: &["TYE", "TDRC"],
    comment: &["COM", "COMM"],
    encoder: &["TEN", "TSSE", "TENC"],
    compilation: &[],
    album_sort: &[],
    artist_sort: &["XSP", "TSOP"],
    track_sort: &[],
    unique_id: &["UFI", "UFID"],
    user_text: &["TXX", "TXXX"],
    involved_people: &[],
    image: &["PIC", "APIC"],
};

static V23: Schema = Schema {
    track_name: &["TIT2"],
    remix_name: &["TIT3"],
    album_name: &["TALB"],
    artist_name: &["TPE1"],
    disc_set: &["TPOS"],
    sequence: &["TRCK"],
    genre: &["TCON"],
    release_date: &["TYER", "TDRC"],
    comment: &["COMM"],
    encoder: &["TSSE", "TENC"],
    compilation: &["TCMP"],
    album_sort: &["XSOA", "TSOA"],
    artist_sort: &["XSOP", "TSOP"],
    track_sort: &["XSOT", "TSOT"],
    unique_id: &["UFID"],
    user_text: &["TXXX"],
    involved_people: &[],
    image: &["APIC"],
};

static V24: Schema = Schema {
    track_name: &["TIT2"],
    remix_name: &["TIT3"],
    album_name: &["TALB"],
    artist_name: &["TPE1"],
    disc_set: &["TPOS"],
    sequence: &["TRCK"],
    genre: &["TCON"],
    release_date: &["TDRC", "TYER"],
    comment: &["COMM"],
    encoder: &["TSSE", "TENC"],
    compilation: &["TCMP"],
    album_sort: &["TSOA"],
    artist_sort: &["TSOP"],
    track_sort: &["TSOT"],
    unique_id: &["UFID"],
    user_text: &["TXXX"],
    involved_people: &["TIPL"],
    image: &["APIC"],
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedImage {
    pub mime_type: Option<String>,
    pub description: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameValue {
    Text(String),
    Picture(EmbeddedImage),
}

/// One frame as read from the file. User-text, comment and unique-id
/// frames carry their description (or owner) alongside the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub id: String,
    pub description: Option<String>,
    pub value: FrameValue,
}

impl RawFrame {
    pub fn text(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            value: FrameValue::Text(value.into()),
        }
    }

    pub fn described(
        id: impl Into<String>,
        description: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: Some(description.into()),
            value: FrameValue::Text(value.into()),
        }
    }

    pub fn picture(id: impl Into<String>, image: EmbeddedImage) -> Self {
        Self {
            id: id.into(),
            description: None,
            value: FrameValue::Picture(image),
        }
    }

    fn as_text(&self) -> Option<&str> {
        match &self.value {
            FrameValue::Text(text) => Some(text.trim()).filter(|t| !t.is_empty()),
            FrameValue::Picture(_) => None,
        }
    }
}

/// A tag as handed over by the tag I/O collaborator: the detected
/// version plus frames in file order. Ids may repeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTag {
    pub version: TagVersion,
    pub frames: Vec<RawFrame>,
}

impl RawTag {
    pub fn new(version: TagVersion) -> Self {
        Self {
            version,
            frames: Vec::new(),
        }
    }

    pub fn with_frame(mut self, frame: RawFrame) -> Self {
        self.frames.push(frame);
        self
    }

    /// Text values of the first candidate id that has any.
    fn values(&self, ids: &[&str]) -> Vec<&str> {
        for id in ids {
            let found: Vec<&str> = self
                .frames
                .iter()
                .filter(|f| f.id == *id)
                .filter_map(RawFrame::as_text)
                .collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    /// Like `values`, but prefers frames without a description. Comment
    /// frames often carry player bookkeeping under a description.
    fn plain_values(&self, ids: &[&str]) -> Vec<&str> {
        for id in ids {
            let frames: Vec<&RawFrame> = self.frames.iter().filter(|f| f.id == *id).collect();
            let plain: Vec<&str> = frames
                .iter()
                .filter(|f| f.description.as_deref().map_or(true, str::is_empty))
                .filter_map(|f| f.as_text())
                .collect();
            if !plain.is_empty() {
                return plain;
            }
            let any: Vec<&str> = frames.iter().filter_map(|f| f.as_text()).collect();
            if !any.is_empty() {
                return any;
            }
        }
        Vec::new()
    }

    fn described_values(&self, ids: &[&str], description: &str) -> Vec<&str> {
        for id in ids {
            let found: Vec<&str> = self
                .frames
                .iter()
                .filter(|f| f.id == *id)
                .filter(|f| {
                    f.description
                        .as_deref()
                        .is_some_and(|d| d.eq_ignore_ascii_case(description))
                })
                .filter_map(RawFrame::as_text)
                .collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    fn first_picture(&self, ids: &[&str]) -> Option<&EmbeddedImage> {
        ids.iter().find_map(|id| {
            self.frames.iter().find_map(|f| match &f.value {
                FrameValue::Picture(image) if f.id == *id => Some(image),
                _ => None,
            })
        })
    }
}

/// Two or more distinct values found for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConflict {
    pub field: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicBrainzIds {
    pub artist_id: Option<String>,
    pub album_id: Option<String>,
    pub album_artist_id: Option<String>,
    pub album_type: Option<String>,
    pub album_status: Option<String>,
    pub album_release_country: Option<String>,
}

/// The uniform field view over whatever tag version a file carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagMetadata {
    pub version: TagVersion,
    pub track_name: Option<String>,
    pub remix_name: Option<String>,
    pub album_name: Option<String>,
    pub artist_name: Option<String>,
    pub featured_artists: Vec<String>,
    pub disc_number: Option<u32>,
    pub disc_total: Option<u32>,
    pub sequence: Option<u32>,
    pub sequence_total: Option<u32>,
    pub genre: Option<String>,
    pub release_date: Option<String>,
    pub comment: Option<String>,
    pub encoders: Vec<String>,
    pub compilation: Option<bool>,
    pub album_sort_order: Option<String>,
    pub artist_sort_order: Option<String>,
    pub track_sort_order: Option<String>,
    pub unique_id: Option<String>,
    pub musicbrainz: MusicBrainzIds,
    pub image: Option<EmbeddedImage>,
    pub conflicts: Vec<FieldConflict>,
}

impl TagMetadata {
    pub fn from_raw(path: &Path, raw: &RawTag) -> Self {
        let schema = raw.version.schema();
        let mut conflicts = Vec::new();
        let mut pick = |field: &str, values: Vec<&str>| reconcile(path, field, values, &mut conflicts);

        let track_name = pick("track name", raw.values(schema.track_name));
        let remix_name = pick("remix name", raw.values(schema.remix_name));
        let album_raw = pick("album name", raw.values(schema.album_name));
        let artist_name = pick("artist name", raw.values(schema.artist_name));
        let disc_raw = pick("disc", raw.values(schema.disc_set));
        let sequence_raw = pick("sequence", raw.values(schema.sequence));
        let genre = pick("genre", raw.values(schema.genre)).map(|g| resolve_genre(&g));
        let release_date = pick("release date", raw.values(schema.release_date));
        let comment = pick("comment", raw.plain_values(schema.comment));
        let compilation = pick("compilation", raw.values(schema.compilation));
        let album_sort_order = pick("album sort order", raw.values(schema.album_sort));
        let artist_sort_order = pick("artist sort order", raw.values(schema.artist_sort));
        let track_sort_order = pick("track sort order", raw.values(schema.track_sort));
        let unique_id = pick("unique id", unique_id_values(raw, schema.unique_id));

        let mut musicbrainz_field = |name: &str| {
            let description = format!("MusicBrainz {}", name);
            pick(&description, raw.described_values(schema.user_text, &description))
        };
        let musicbrainz = MusicBrainzIds {
            artist_id: musicbrainz_field("Artist Id"),
            album_id: musicbrainz_field("Album Id"),
            album_artist_id: musicbrainz_field("Album Artist Id"),
            album_type: musicbrainz_field("Album Type"),
            album_status: musicbrainz_field("Album Status"),
            album_release_country: musicbrainz_field("Album Release Country"),
        };

        // Encoders are a list field, every value is kept.
        let encoders = raw
            .values(schema.encoder)
            .into_iter()
            .map(str::to_string)
            .collect();

        let (disc_number, disc_total) = disc_raw.as_deref().map_or((None, None), parse_position);
        let (sequence, sequence_total) =
            sequence_raw.as_deref().map_or((None, None), parse_position);

        let (album_name, album_disc) = match album_raw {
            Some(raw_name) => {
                let (name, disc) = split_disc_marker(&raw_name);
                (Some(name), disc)
            }
            None => (None, None),
        };

        Self {
            version: raw.version,
            track_name,
            remix_name,
            album_name,
            artist_name,
            featured_artists: featured_artists(path, raw, schema),
            disc_number: disc_number.or(album_disc),
            disc_total,
            sequence,
            sequence_total,
            genre,
            release_date,
            comment,
            encoders,
            compilation: compilation.as_deref().and_then(parse_flag),
            album_sort_order,
            artist_sort_order,
            track_sort_order,
            unique_id,
            musicbrainz,
            image: raw.first_picture(schema.image).cloned(),
            conflicts,
        }
    }
}

fn reconcile(
    path: &Path,
    field: &str,
    values: Vec<&str>,
    conflicts: &mut Vec<FieldConflict>,
) -> Option<String> {
    let first = values.first()?.to_string();
    let mut distinct: Vec<String> = Vec::new();
    for value in values {
        if !distinct.iter().any(|d| d == value) {
            distinct.push(value.to_string());
        }
    }
    if distinct.len() > 1 {
        warn!(path = %path.display(), field, values = ?distinct, "Conflicting tag values, keeping first");
        conflicts.push(FieldConflict {
            field: field.to_string(),
            values: distinct,
        });
    }
    Some(first)
}

/// Unique ids prefer the MusicBrainz owner, then any owner.
fn unique_id_values<'a>(raw: &'a RawTag, ids: &[&str]) -> Vec<&'a str> {
    let owned = raw.described_values(ids, MUSICBRAINZ_OWNER);
    if owned.is_empty() {
        raw.values(ids)
    } else {
        owned
    }
}

fn featured_artists(path: &Path, raw: &RawTag, schema: &Schema) -> Vec<String> {
    let mut featured: Vec<String> = Vec::new();

    for value in raw.values(schema.involved_people) {
        let mut entries = value.split('\0').map(str::trim);
        while let Some(role) = entries.next() {
            if role != FEATURED_PERFORMER {
                continue;
            }
            match entries.next().filter(|p| !p.is_empty() && *p != FEATURED_PERFORMER) {
                Some(performer) => featured.push(performer.to_string()),
                None => {
                    warn!(path = %path.display(), "Badly formatted involved-people list, ignoring rest");
                    break;
                }
            }
        }
    }

    for value in raw.described_values(schema.user_text, FEATURED_PERFORMER) {
        if !featured.iter().any(|f| f == value) {
            featured.push(value.to_string());
        }
    }
    featured
}

/// Split `"N/M"` into position and total.
pub fn parse_position(raw: &str) -> (Option<u32>, Option<u32>) {
    let mut parts = raw.splitn(2, '/');
    let mut number = || {
        parts
            .next()
            .and_then(|n| n.trim().parse::<u32>().ok())
            .filter(|n| *n > 0)
    };
    let position = number();
    let total = number();
    (position, total)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" => Some(true),
        "0" => Some(false),
        other if other.eq_ignore_ascii_case("true") => Some(true),
        other if other.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}
