use crate::model::{Album, Track};
use std::fmt::Write;

const ENCODED_BY: &str = "Encoded by ";
const FEATURED_INDENT: &str = "                     ";

impl Album {
    /// Operator summary of the album. `simple` folds featured artists into
    /// the track line and leaves out the encoder block.
    pub fn display_formatted(&self, simple: bool) -> String {
        let mut out = String::new();

        if let Some(year) = self.year() {
            let _ = write!(out, "[{}] ", year);
        }
        if let Some(artist) = &self.artist_name {
            let _ = write!(out, "{}: ", artist);
        }
        out.push_str(&self.reconstituted_name());
        if let Some(genre) = &self.genre {
            let _ = write!(out, " ({})", genre);
        }
        out.push_str("\n\n");

        let multi_disc = self.number_of_discs_loaded() > 1;
        for disc in self.discs() {
            if multi_disc {
                let _ = writeln!(out, "  Disc {}:", disc.number);
            }
            for track in disc.tracks_sorted() {
                let position = if multi_disc {
                    format!("{}.{}", disc.number, track.sequence)
                } else {
                    track.sequence.to_string()
                };
                let _ = writeln!(out, "    {}: {}", position, self.track_line(track, simple));
                if !simple && !track.featured_artists.is_empty() {
                    let _ = writeln!(
                        out,
                        "{}Featured: {}",
                        FEATURED_INDENT,
                        track.featured_artists.join(", ")
                    );
                }
            }
        }

        if !simple {
            let encoders = self.encoders();
            if !encoders.is_empty() {
                out.push('\n');
                for (i, encoder) in encoders.iter().enumerate() {
                    let lead = if i == 0 {
                        ENCODED_BY.to_string()
                    } else {
                        " ".repeat(ENCODED_BY.len())
                    };
                    let _ = writeln!(out, "{}{}", lead, encoder);
                }
                out.push('\n');
            }
        }
        out
    }

    fn track_line(&self, track: &Track, simple: bool) -> String {
        let mut line = String::new();
        if self.compilation {
            if let Some(artist) = &track.artist_name {
                let _ = write!(line, "{} - ", artist);
            }
        }
        line.push_str(track.name.as_deref().unwrap_or_default());
        if simple && !track.featured_artists.is_empty() {
            let _ = write!(line, " (feat. {})", track.featured_artists.join(" & "));
        }
        if let Some(remix) = &track.remix_name {
            let _ = write!(line, " [{}]", remix);
        }
        line
    }
}
