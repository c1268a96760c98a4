use std::collections::VecDeque;
use std::path::PathBuf;

use tracing::{debug, warn};

use super::ArtworkInfo;
use crate::error::CoreError;
use crate::models::TrackInfo;

/// Bounded lookup cache, oldest entry evicted first, optionally persisted
/// as JSON.
#[derive(Debug, Default)]
pub struct ArtworkCache {
    entries: VecDeque<(String, ArtworkInfo)>,
    limit: usize,
    path: Option<PathBuf>,
}

impl ArtworkCache {
    pub fn in_memory(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit,
            path: None,
        }
    }

    /// Open a cache file, starting empty if it is missing or unreadable.
    pub fn open(path: impl Into<PathBuf>, limit: usize) -> Result<Self, CoreError> {
        let path = path.into();
        let mut cache = Self {
            entries: VecDeque::new(),
            limit,
            path: None,
        };

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<VecDeque<(String, ArtworkInfo)>>(&content) {
                Ok(entries) => {
                    for (key, info) in entries {
                        cache.insert(key, info);
                    }
                    debug!(path = %path.display(), entries = cache.len(), "Loaded artwork cache");
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring corrupt artwork cache");
                }
            }
        }

        cache.path = Some(path);
        Ok(cache)
    }

    /// Cache key for a track. Position and duration are not part of it.
    pub fn key(track: &TrackInfo) -> String {
        format!("{}\u{1f}{}\u{1f}{}", track.artist, track.title, track.album)
    }

    pub fn get(&self, key: &str) -> Option<&ArtworkInfo> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn insert(&mut self, key: String, info: ArtworkInfo) {
        if self.limit == 0 {
            return;
        }
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = info;
            return;
        }
        while self.entries.len() >= self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back((key, info));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the cache to its file. In-memory caches do nothing.
    pub fn save(&self) -> Result<(), CoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(url: &str) -> ArtworkInfo {
        ArtworkInfo {
            artwork_url: Some(url.to_string()),
            collection_url: None,
        }
    }

    #[test]
    fn test_evicts_oldest() {
        let mut cache = ArtworkCache::in_memory(2);
        cache.insert("a".into(), info("1"));
        cache.insert("b".into(), info("2"));
        cache.insert("c".into(), info("3"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert_eq!(cache.get("c"), Some(&info("3")));
    }

    #[test]
    fn test_replace_does_not_evict() {
        let mut cache = ArtworkCache::in_memory(2);
        cache.insert("a".into(), info("1"));
        cache.insert("b".into(), info("2"));
        cache.insert("a".into(), info("updated"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(&info("updated")));
        assert!(cache.get("b").is_some());
    }

    #[test]
    fn test_zero_limit_stores_nothing() {
        let mut cache = ArtworkCache::in_memory(0);
        cache.insert("a".into(), info("1"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("artwork.json");

        let mut cache = ArtworkCache::open(&path, 10).unwrap();
        assert!(cache.is_empty());
        cache.insert("a".into(), info("1"));
        cache.insert("b".into(), ArtworkInfo::default());
        cache.save().unwrap();

        let reopened = ArtworkCache::open(&path, 10).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.get("a"), Some(&info("1")));
        assert_eq!(reopened.get("b"), Some(&ArtworkInfo::default()));
    }

    #[test]
    fn test_reopen_with_smaller_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artwork.json");

        let mut cache = ArtworkCache::open(&path, 10).unwrap();
        for key in ["a", "b", "c"] {
            cache.insert(key.into(), info(key));
        }
        cache.save().unwrap();

        let reopened = ArtworkCache::open(&path, 2).unwrap();
        assert_eq!(reopened.len(), 2);
        assert!(reopened.get("a").is_none());
    }

    #[test]
    fn test_corrupt_file_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artwork.json");
        std::fs::write(&path, "not json").unwrap();

        let cache = ArtworkCache::open(&path, 10).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_key_ignores_timing() {
        let a = TrackInfo::from_fields(&["t", "ar", "al", "0", "100", "1"]).unwrap();
        let b = TrackInfo::from_fields(&["t", "ar", "al", "0", "100", "50"]).unwrap();
        assert_eq!(ArtworkCache::key(&a), ArtworkCache::key(&b));
    }
}
