use archive::is_housekeeping;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub const AUDIO_EXTENSIONS: [&str; 4] = ["mp3", "flac", "ogg", "m4a"];

pub fn is_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Files found under the library, in walk order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LibraryScan {
    pub audio: Vec<PathBuf>,
    pub non_audio: Vec<PathBuf>,
}

impl LibraryScan {
    /// Keep only directories that hold at least one of `changed`, so
    /// albums are always rebuilt from every file they contain.
    pub fn restrict_to(self, changed: &[PathBuf]) -> Self {
        let dirty: HashSet<&Path> = changed.iter().filter_map(|p| p.parent()).collect();
        let keep = |path: &PathBuf| path.parent().map(|d| dirty.contains(d)).unwrap_or(false);
        Self {
            audio: self.audio.iter().filter(|p| keep(p)).cloned().collect(),
            non_audio: self.non_audio.iter().filter(|p| keep(p)).cloned().collect(),
        }
    }
}

/// Walk `root`, skipping housekeeping files and the `exclude` subtree.
pub fn scan_library(root: &Path, exclude: Option<&Path>) -> Result<LibraryScan, walkdir::Error> {
    let mut scan = LibraryScan::default();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| exclude.map_or(true, |excluded| entry.path() != excluded));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if is_housekeeping(&name) {
            debug!(path = %entry.path().display(), "Skipping housekeeping file");
            continue;
        }
        let path = entry.into_path();
        if is_audio(&path) {
            scan.audio.push(path);
        } else {
            scan.non_audio.push(path);
        }
    }
    Ok(scan)
}
