// components/tag_sources/src/cache.rs
use crate::error::{Result, SourceError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Identity of one scanned file: where it is and when it last changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
}

impl CacheKey {
    pub fn for_path(path: &Path) -> Result<Self> {
        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|e| SourceError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            modified: DateTime::<Utc>::from(modified),
        })
    }
}

/// Answers whether a file has been seen unchanged since the last scan.
pub trait ScanCache {
    fn is_cached(&self, key: &CacheKey) -> bool;
}

/// Keep only the paths the cache has not seen in their current state.
pub fn changed_paths<C: ScanCache + ?Sized>(paths: &[PathBuf], cache: &C) -> Result<Vec<PathBuf>> {
    let mut changed = Vec::new();
    for path in paths {
        let key = CacheKey::for_path(path)?;
        if cache.is_cached(&key) {
            debug!(path = %path.display(), "Unchanged since last scan");
        } else {
            changed.push(path.clone());
        }
    }
    Ok(changed)
}

/// A scan cache persisted as a JSON map of path to modification time.
#[derive(Debug, Default)]
pub struct JsonScanCache {
    location: PathBuf,
    entries: HashMap<PathBuf, DateTime<Utc>>,
}

impl JsonScanCache {
    /// Load the cache file, starting empty when it does not exist yet.
    pub fn load(location: impl Into<PathBuf>) -> Result<Self> {
        let location = location.into();
        let entries = match fs::read_to_string(&location) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(SourceError::io(&location, e)),
        };
        Ok(Self { location, entries })
    }

    pub fn record(&mut self, key: CacheKey) {
        self.entries.insert(key.path, key.modified);
    }

    pub fn forget(&mut self, path: &Path) {
        self.entries.remove(path);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.location, json).map_err(|e| SourceError::io(&self.location, e))
    }
}

impl ScanCache for JsonScanCache {
    fn is_cached(&self, key: &CacheKey) -> bool {
        self.entries.get(&key.path) == Some(&key.modified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_files_are_changed() {
        let dir = TempDir::new().unwrap();
        let song = dir.path().join("song.mp3");
        fs::write(&song, b"audio").unwrap();
        let cache = JsonScanCache::load(dir.path().join("cache.json")).unwrap();

        let changed = changed_paths(&[song.clone()], &cache).unwrap();

        assert_eq!(changed, vec![song]);
    }

    #[test]
    fn test_recorded_files_are_skipped_after_reload() {
        let dir = TempDir::new().unwrap();
        let song = dir.path().join("song.mp3");
        fs::write(&song, b"audio").unwrap();
        let cache_file = dir.path().join("cache.json");

        let mut cache = JsonScanCache::load(&cache_file).unwrap();
        cache.record(CacheKey::for_path(&song).unwrap());
        cache.save().unwrap();

        let reloaded = JsonScanCache::load(&cache_file).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(changed_paths(&[song], &reloaded).unwrap().is_empty());
    }

    #[test]
    fn test_modified_time_mismatch_is_changed() {
        let dir = TempDir::new().unwrap();
        let song = dir.path().join("song.mp3");
        fs::write(&song, b"audio").unwrap();

        let mut cache = JsonScanCache::default();
        let mut key = CacheKey::for_path(&song).unwrap();
        key.modified -= chrono::Duration::seconds(60);
        cache.record(key);

        assert_eq!(changed_paths(&[song.clone()], &cache).unwrap(), vec![song]);
    }

    #[test]
    fn test_corrupt_cache_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let cache_file = dir.path().join("cache.json");
        fs::write(&cache_file, b"not json").unwrap();

        assert!(matches!(JsonScanCache::load(&cache_file), Err(SourceError::Cache(_))));
    }
}
