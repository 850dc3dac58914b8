//! Title parsing. Each parser is an ordered list of named rules; a rule
//! takes the current title and what has been extracted so far and returns
//! both, possibly changed. A rule that does not match hands them back as is.

use crate::text::explode_names;
use once_cell::sync::Lazy;
use regex::Regex;

/// Side values pulled out of a title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub remix: Option<String>,
    pub featured: Vec<String>,
    pub mixer: Option<String>,
    pub genre: Option<String>,
    pub version: Option<String>,
    pub subtitle: Option<String>,
}

pub type Rule = fn(String, Extraction) -> (String, Extraction);

pub const SOUNDTRACK: &str = "Soundtrack";

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("valid regex")
}

static BRACKETED: Lazy<Regex> = Lazy::new(|| pattern(r"^(.+?)\s*\[([^\]]+)\]\s*$"));
static REMIX_PAREN: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"(?i)^(.+?)\s*\(([^()]*\b(?:remix|mix|edit|version|demo|live|instrumental|vocal|original)\b[^()]*)\)\s*(.*)$",
    )
});
static FEAT_PAREN: Lazy<Regex> =
    Lazy::new(|| pattern(r"(?i)^(.+?)\s*\((?:feat\.?|featuring|ft\.)\s+([^)]+)\)\s*(.*)$"));
static FEAT_BARE: Lazy<Regex> =
    Lazy::new(|| pattern(r"(?i)^(.+?)\s+(?:feat\.?|featuring|ft\.)\s+(.+)$"));
static WITH: Lazy<Regex> = Lazy::new(|| pattern(r"^(.+?)\s+with\s+(.+)$"));
static MIXED_BY_PAREN: Lazy<Regex> =
    Lazy::new(|| pattern(r"(?i)^(.+?)\s*\(mixed by\s+([^)]+)\)\s*$"));
static MIXED_BY_BARE: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)^(.+?)\s+mixed by\s+(.+)$"));
static OST: Lazy<Regex> = Lazy::new(|| pattern(r"^(.+?)\s+OST$"));
static SUBTITLE: Lazy<Regex> = Lazy::new(|| pattern(r"^([^:]+?):\s+(.+)$"));

/// Join the text before and after a removed marker.
fn rejoin(before: &str, after: &str) -> String {
    let after = after.trim();
    if after.is_empty() {
        before.trim().to_string()
    } else {
        format!("{} {}", before.trim(), after)
    }
}

fn set_remix(extraction: &mut Extraction, remix: &str) {
    let remix = remix.trim().to_string();
    extraction.remix = Some(match extraction.remix.take() {
        Some(existing) => format!("{} - {}", remix, existing),
        None => remix,
    });
}

fn bracketed_version(title: String, mut ex: Extraction) -> (String, Extraction) {
    match BRACKETED.captures(&title) {
        Some(caps) => {
            set_remix(&mut ex, &caps[2]);
            (caps[1].trim().to_string(), ex)
        }
        None => (title, ex),
    }
}

fn parenthetical_remix(title: String, mut ex: Extraction) -> (String, Extraction) {
    match REMIX_PAREN.captures(&title) {
        Some(caps) => {
            set_remix(&mut ex, &caps[2]);
            (rejoin(&caps[1], &caps[3]), ex)
        }
        None => (title, ex),
    }
}

fn featuring(title: String, mut ex: Extraction) -> (String, Extraction) {
    if let Some(caps) = FEAT_PAREN.captures(&title) {
        ex.featured.push(caps[2].trim().to_string());
        return (rejoin(&caps[1], &caps[3]), ex);
    }
    if let Some(caps) = FEAT_BARE.captures(&title) {
        ex.featured.push(caps[2].trim().to_string());
        return (caps[1].trim().to_string(), ex);
    }
    (title, ex)
}

fn with_collaborator(title: String, mut ex: Extraction) -> (String, Extraction) {
    match WITH.captures(&title) {
        Some(caps) => {
            ex.featured.push(caps[2].trim().to_string());
            (caps[1].trim().to_string(), ex)
        }
        None => (title, ex),
    }
}

fn mixed_by(title: String, mut ex: Extraction) -> (String, Extraction) {
    let caps = MIXED_BY_PAREN
        .captures(&title)
        .or_else(|| MIXED_BY_BARE.captures(&title));
    match caps {
        Some(caps) => {
            ex.mixer = Some(caps[2].trim().to_string());
            (caps[1].trim().to_string(), ex)
        }
        None => (title, ex),
    }
}

fn soundtrack(title: String, mut ex: Extraction) -> (String, Extraction) {
    match OST.captures(&title) {
        Some(caps) => {
            ex.genre = Some(SOUNDTRACK.to_string());
            (caps[1].trim().to_string(), ex)
        }
        None => (title, ex),
    }
}

fn album_version(title: String, mut ex: Extraction) -> (String, Extraction) {
    match BRACKETED.captures(&title) {
        Some(caps) => {
            ex.version = Some(caps[2].trim().to_string());
            (caps[1].trim().to_string(), ex)
        }
        None => (title, ex),
    }
}

fn subtitle(title: String, mut ex: Extraction) -> (String, Extraction) {
    match SUBTITLE.captures(&title) {
        Some(caps) => {
            ex.subtitle = Some(caps[2].trim().to_string());
            (caps[1].trim().to_string(), ex)
        }
        None => (title, ex),
    }
}

pub const TRACK_NAME_RULES: &[(&str, Rule)] = &[
    ("bracketed version", bracketed_version),
    ("parenthetical remix", parenthetical_remix),
    ("featuring", featuring),
];

pub const ARTIST_NAME_RULES: &[(&str, Rule)] = &[
    ("featuring", featuring),
    ("with collaborator", with_collaborator),
];

pub const ALBUM_NAME_RULES: &[(&str, Rule)] = &[
    ("mixed by", mixed_by),
    ("soundtrack", soundtrack),
    ("version", album_version),
    ("subtitle", subtitle),
];

/// Run `rules` in order, then explode and dedupe the featured list.
pub fn apply_rules(rules: &[(&str, Rule)], title: &str) -> (String, Extraction) {
    let (title, mut extraction) = rules
        .iter()
        .fold((title.trim().to_string(), Extraction::default()), |(title, ex), (name, rule)| {
            let (next, ex) = rule(title.clone(), ex);
            if next != title {
                tracing::trace!(rule = *name, from = %title, to = %next, "Title rule matched");
            }
            (next, ex)
        });
    extraction.featured = explode_names(&extraction.featured);
    (title, extraction)
}

pub fn parse_track_name(name: &str) -> (String, Extraction) {
    apply_rules(TRACK_NAME_RULES, name)
}

pub fn parse_artist_name(name: &str) -> (String, Extraction) {
    apply_rules(ARTIST_NAME_RULES, name)
}

pub fn parse_album_name(name: &str) -> (String, Extraction) {
    apply_rules(ALBUM_NAME_RULES, name)
}
