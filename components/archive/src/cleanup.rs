use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Files operating systems drop into directories on their own.
pub const HOUSEKEEPING_FILES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini"];

pub fn is_housekeeping(name: &str) -> bool {
    HOUSEKEEPING_FILES.contains(&name) || name.starts_with("._")
}

/// A vacated directory that could not be removed. Reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupWarning {
    pub directory: PathBuf,
    pub leftovers: Vec<String>,
    pub error: Option<String>,
}

impl fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(error) => write!(f, "could not clean {}: {}", self.directory.display(), error),
            None => write!(
                f,
                "{} still contains {}",
                self.directory.display(),
                self.leftovers.join(", ")
            ),
        }
    }
}

enum Pruned {
    Removed,
    Left(Vec<String>),
}

/// Remove `dir` if nothing but housekeeping files remain in it. With
/// `sweep`, housekeeping files are deleted even when the directory stays.
fn prune(dir: &Path, sweep: bool) -> io::Result<Pruned> {
    let mut housekeeping = Vec::new();
    let mut others = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_housekeeping(&name) && entry.file_type()?.is_file() {
            housekeeping.push(entry.path());
        } else {
            others.push(name);
        }
    }

    if others.is_empty() || sweep {
        for file in &housekeeping {
            debug!(file = %file.display(), "Removing housekeeping file");
            fs::remove_file(file)?;
        }
    }
    if others.is_empty() {
        fs::remove_dir(dir)?;
        return Ok(Pruned::Removed);
    }
    others.sort();
    Ok(Pruned::Left(others))
}

/// Whether `dir` may be removed: strictly below `boundary`, when there is one.
fn removable(dir: &Path, boundary: Option<&Path>) -> bool {
    match boundary {
        Some(boundary) => dir != boundary && dir.starts_with(boundary),
        None => true,
    }
}

/// Clean every directory an archived album was moved out of, then its
/// parent when that empties too. Leftovers come back as warnings.
///
/// Nothing at or above `boundary` is ever removed.
pub fn clean_vacated<I>(directories: I, boundary: Option<&Path>) -> Vec<CleanupWarning>
where
    I: IntoIterator<Item = PathBuf>,
{
    let directories: BTreeSet<PathBuf> = directories.into_iter().collect();
    let mut warnings = Vec::new();

    for dir in directories {
        if !dir.is_dir() {
            continue;
        }
        if !removable(&dir, boundary) {
            debug!(directory = %dir.display(), "Leaving source root in place");
            continue;
        }
        match prune(&dir, true) {
            Ok(Pruned::Removed) => {
                debug!(directory = %dir.display(), "Removed vacated directory");
                if let Some(parent) = dir.parent().filter(|p| removable(p, boundary)) {
                    match prune(parent, false) {
                        Ok(Pruned::Removed) => {
                            debug!(directory = %parent.display(), "Removed empty artist directory")
                        }
                        Ok(Pruned::Left(_)) => {}
                        Err(e) => warn!(directory = %parent.display(), error = %e, "Could not prune artist directory"),
                    }
                }
            }
            Ok(Pruned::Left(leftovers)) => {
                warn!(directory = %dir.display(), ?leftovers, "Files left behind after archiving");
                warnings.push(CleanupWarning {
                    directory: dir,
                    leftovers,
                    error: None,
                });
            }
            Err(e) => {
                warn!(directory = %dir.display(), error = %e, "Cleanup failed");
                warnings.push(CleanupWarning {
                    directory: dir,
                    leftovers: Vec::new(),
                    error: Some(e.to_string()),
                });
            }
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_housekeeping_names() {
        assert!(is_housekeeping(".DS_Store"));
        assert!(is_housekeeping("Thumbs.db"));
        assert!(is_housekeeping("._01 Killer.mp3"));
        assert!(!is_housekeeping("cover.jpg"));
    }

    #[test]
    fn test_empty_album_and_artist_directories_removed() {
        let root = TempDir::new().unwrap();
        let album = root.path().join("Artist").join("Album");
        fs::create_dir_all(&album).unwrap();
        fs::write(album.join(".DS_Store"), b"x").unwrap();
        fs::write(album.join("._track.mp3"), b"x").unwrap();

        let warnings = clean_vacated(vec![album.clone()], None);

        assert!(warnings.is_empty());
        assert!(!album.exists());
        assert!(!root.path().join("Artist").exists());
        assert!(root.path().exists());
    }

    #[test]
    fn test_artist_directory_with_other_albums_stays() {
        let root = TempDir::new().unwrap();
        let artist = root.path().join("Artist");
        let vacated = artist.join("Album");
        fs::create_dir_all(&vacated).unwrap();
        fs::create_dir_all(artist.join("Other Album")).unwrap();
        fs::write(artist.join("Thumbs.db"), b"x").unwrap();

        let warnings = clean_vacated(vec![vacated.clone()], None);

        assert!(warnings.is_empty());
        assert!(!vacated.exists());
        assert!(artist.join("Thumbs.db").exists());
    }

    #[test]
    fn test_leftovers_produce_warning() {
        let root = TempDir::new().unwrap();
        let album = root.path().join("Artist").join("Album");
        fs::create_dir_all(&album).unwrap();
        fs::write(album.join("notes.txt"), b"x").unwrap();
        fs::write(album.join(".DS_Store"), b"x").unwrap();

        let warnings = clean_vacated(vec![album.clone()], None);

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].leftovers, vec!["notes.txt"]);
        assert!(warnings[0].to_string().contains("notes.txt"));
        assert!(!album.join(".DS_Store").exists());
    }

    #[test]
    fn test_two_discs_empty_the_artist_directory() {
        let root = TempDir::new().unwrap();
        let artist = root.path().join("Artist");
        let disc1 = artist.join("Album disc 1");
        let disc2 = artist.join("Album disc 2");
        fs::create_dir_all(&disc1).unwrap();
        fs::create_dir_all(&disc2).unwrap();

        let warnings = clean_vacated(vec![disc1, disc2], None);

        assert!(warnings.is_empty());
        assert!(!artist.exists());
    }

    #[test]
    fn test_boundary_directory_is_never_removed() {
        let root = TempDir::new().unwrap();
        let incoming = root.path().join("incoming");
        let album = incoming.join("Album");
        fs::create_dir_all(&album).unwrap();

        let warnings = clean_vacated(vec![album.clone()], Some(incoming.as_path()));

        assert!(warnings.is_empty());
        assert!(!album.exists());
        assert!(incoming.exists());
    }

    #[test]
    fn test_files_directly_in_boundary_leave_it_alone() {
        let root = TempDir::new().unwrap();
        let incoming = root.path().join("incoming");
        fs::create_dir_all(&incoming).unwrap();
        fs::write(incoming.join(".DS_Store"), b"x").unwrap();

        let warnings = clean_vacated(vec![incoming.clone()], Some(incoming.as_path()));

        assert!(warnings.is_empty());
        assert!(incoming.join(".DS_Store").exists());
    }
}
