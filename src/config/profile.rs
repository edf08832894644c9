//! Tracker profiles
//!
//! A profile lives in `<config_dir>/<name>.json`:
//!
//! ```json
//! {
//!   "torrent": {
//!     "announce_urls": ["https://tracker.example/announce/KEY"],
//!     "source": "EXAMPLE",
//!     "is_private": true
//!   },
//!   "format": "compact"
//! }
//! ```

use crate::error::{RelprepError, Result};
use crate::export::ReportFormat;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Announce list, source tag and privacy flag used to build descriptors
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackerProfile {
    pub announce_urls: Vec<String>,
    pub source: String,
    pub is_private: bool,
}

/// On-disk layout of a profile file
#[derive(Debug, Deserialize)]
struct ProfileFile {
    torrent: TrackerProfile,
    #[serde(default)]
    format: Option<ReportFormat>,
}

/// Name-addressed, read-only store of tracker profiles
#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File backing the named profile
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    /// Load a profile, failing on absence, malformed JSON or missing keys
    pub fn load(&self, name: &str) -> Result<TrackerProfile> {
        Ok(self.read(name)?.torrent)
    }

    /// Output format preference stored with the profile, if any
    pub fn default_format(&self, name: &str) -> Result<Option<ReportFormat>> {
        Ok(self.read(name)?.format)
    }

    fn read(&self, name: &str) -> Result<ProfileFile> {
        let path = self.path_for(name);

        if name.trim().is_empty() || name.contains(|c: char| c == '/' || c == '\\') {
            return Err(RelprepError::config_error(
                path,
                format!("invalid profile name {:?}", name),
            ));
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            let reason = match e.kind() {
                std::io::ErrorKind::NotFound => "profile file not found".to_string(),
                _ => format!("cannot read profile: {}", e),
            };
            RelprepError::config_error(&path, reason)
        })?;

        let file: ProfileFile = serde_json::from_str(&content)
            .map_err(|e| {
                RelprepError::config_error(
                    &path,
                    format!("{} (expected a \"torrent\" object with announce_urls, source and is_private)", e),
                )
            })?;

        validate(&path, &file.torrent)?;
        debug!(
            "Loaded profile '{}' ({} announce URLs, private={})",
            name,
            file.torrent.announce_urls.len(),
            file.torrent.is_private
        );

        Ok(file)
    }
}

fn validate(path: &Path, profile: &TrackerProfile) -> Result<()> {
    if profile.announce_urls.is_empty() {
        return Err(RelprepError::config_error(path, "announce_urls is empty"));
    }
    if profile.announce_urls.iter().any(|url| url.trim().is_empty()) {
        return Err(RelprepError::config_error(path, "announce_urls contains a blank URL"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with(name: &str, content: &str) -> (TempDir, ProfileStore) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(format!("{}.json", name)), content).unwrap();
        let store = ProfileStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_loads_complete_profile() {
        let (_dir, store) = store_with(
            "red",
            r#"{"torrent": {"announce_urls": ["https://a/announce", "https://b/announce"],
                "source": "RED", "is_private": true}, "format": "compact"}"#,
        );

        let profile = store.load("red").unwrap();
        assert_eq!(profile.announce_urls.len(), 2);
        assert_eq!(profile.source, "RED");
        assert!(profile.is_private);
        assert_eq!(store.default_format("red").unwrap(), Some(ReportFormat::Compact));
    }

    #[test]
    fn test_empty_source_is_allowed() {
        let (_dir, store) = store_with(
            "open",
            r#"{"torrent": {"announce_urls": ["udp://t/announce"], "source": "", "is_private": false}}"#,
        );
        let profile = store.load("open").unwrap();
        assert!(profile.source.is_empty());
        assert_eq!(store.default_format("open").unwrap(), None);
    }

    #[test]
    fn test_missing_profile_is_config_error() {
        let dir = TempDir::new().unwrap();
        let store = ProfileStore::new(dir.path());
        let err = store.load("nope").unwrap_err();
        assert!(matches!(err, RelprepError::ConfigError { .. }));
        assert!(err.to_string().contains("nope.json"));
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let (_dir, store) = store_with(
            "partial",
            r#"{"torrent": {"announce_urls": ["https://a/announce"], "source": "X"}}"#,
        );
        let err = store.load("partial").unwrap_err();
        assert!(matches!(err, RelprepError::ConfigError { .. }));
        assert!(err.to_string().contains("is_private"));
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let (_dir, store) = store_with("broken", "{ not json");
        assert!(matches!(store.load("broken"), Err(RelprepError::ConfigError { .. })));
    }

    #[test]
    fn test_empty_announce_list_is_config_error() {
        let (_dir, store) = store_with(
            "empty",
            r#"{"torrent": {"announce_urls": [], "source": "", "is_private": true}}"#,
        );
        assert!(matches!(store.load("empty"), Err(RelprepError::ConfigError { .. })));
    }

    #[test]
    fn test_rejects_path_like_names() {
        let dir = TempDir::new().unwrap();
        let store = ProfileStore::new(dir.path());
        assert!(matches!(store.load("../etc/x"), Err(RelprepError::ConfigError { .. })));
    }
}
