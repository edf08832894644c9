//! BitTorrent v1 descriptor building
//!
//! Content is read once, front to back, as one concatenated stream; every
//! `piece length` bytes contribute a 20-byte SHA-1 to `pieces`.

use super::bencode::Value;
use crate::config::TrackerProfile;
use crate::error::{RelprepError, Result};
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Smallest piece length chosen automatically
pub const MIN_PIECE_LENGTH: u64 = 32 * 1024;

/// Largest piece length chosen automatically
pub const MAX_PIECE_LENGTH: u64 = 16 * 1024 * 1024;

/// Piece count the automatic piece length aims for
const TARGET_PIECES: u64 = 1500;

/// Read buffer for hashing
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// A built descriptor
#[derive(Debug, Clone)]
pub struct EncodedTorrent {
    /// Complete bencoded `.torrent` file
    pub bytes: Vec<u8>,
    /// Hex SHA-1 of the bencoded info dictionary
    pub info_hash: String,
    pub piece_length: u64,
    pub total_length: u64,
}

/// Descriptor builder
pub trait TorrentEncoder {
    /// Build a descriptor for a file or directory
    fn encode(&self, content: &Path, profile: &TrackerProfile) -> Result<EncodedTorrent>;

    /// Get the name of this encoder (for logging)
    fn name(&self) -> &'static str;
}

/// BitTorrent v1 (BEP-3) encoder with BEP-12 multitracker and BEP-27 private flag
#[derive(Debug, Clone)]
pub struct V1TorrentEncoder {
    created_by: String,
    /// Fixed timestamp instead of the current time
    creation_date: Option<i64>,
}

impl V1TorrentEncoder {
    pub fn new() -> Self {
        Self {
            created_by: format!("relprep {}", env!("CARGO_PKG_VERSION")),
            creation_date: None,
        }
    }

    /// Stamp every descriptor with this Unix time
    pub fn with_creation_date(mut self, timestamp: i64) -> Self {
        self.creation_date = Some(timestamp);
        self
    }
}

impl Default for V1TorrentEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TorrentEncoder for V1TorrentEncoder {
    fn encode(&self, content: &Path, profile: &TrackerProfile) -> Result<EncodedTorrent> {
        let torrent_error = |reason: String| RelprepError::TorrentError {
            path: content.to_path_buf(),
            reason,
        };

        let name = content_name(content).ok_or_else(|| torrent_error("cannot determine content name".into()))?;
        let files = collect_files(content).map_err(|e| torrent_error(format!("Failed to list content: {}", e)))?;
        if files.is_empty() {
            return Err(torrent_error("no files to share".into()));
        }

        let total_length: u64 = files.iter().map(|f| f.length).sum();
        if total_length == 0 {
            return Err(torrent_error("content is empty".into()));
        }

        let piece_length = piece_length_for(total_length);
        let paths: Vec<&Path> = files.iter().map(|f| f.path.as_path()).collect();
        let pieces = hash_pieces(&paths, piece_length as usize)
            .map_err(|e| torrent_error(format!("Failed to read content: {}", e)))?;

        let mut info = Value::dict();
        info.insert("name", name);
        info.insert("piece length", piece_length);
        info.insert("pieces", pieces);
        if content.is_file() {
            info.insert("length", total_length);
        } else {
            let entries: Vec<Value> = files
                .iter()
                .map(|f| {
                    let mut entry = Value::dict();
                    entry.insert("length", f.length);
                    entry.insert(
                        "path",
                        f.components.iter().cloned().map(Value::from).collect::<Vec<_>>(),
                    );
                    entry
                })
                .collect();
            info.insert("files", entries);
        }
        if profile.is_private {
            info.insert("private", 1i64);
        }
        if !profile.source.is_empty() {
            info.insert("source", profile.source.as_str());
        }

        let info_bytes = info.encode();
        let info_hash = hex::encode(Sha1::digest(&info_bytes));

        let mut root = Value::dict();
        if let Some(first) = profile.announce_urls.first() {
            root.insert("announce", first.as_str());
        }
        if profile.announce_urls.len() > 1 {
            let tiers: Vec<Value> = profile
                .announce_urls
                .iter()
                .map(|url| Value::from(vec![Value::from(url.as_str())]))
                .collect();
            root.insert("announce-list", tiers);
        }
        root.insert("created by", self.created_by.as_str());
        root.insert(
            "creation date",
            self.creation_date.unwrap_or_else(|| chrono::Utc::now().timestamp()),
        );
        root.insert("info", info);

        debug!(
            "Encoded {} ({} files, {} bytes, {} KiB pieces, info hash {})",
            content.display(),
            files.len(),
            total_length,
            piece_length / 1024,
            info_hash
        );

        Ok(EncodedTorrent {
            bytes: root.encode(),
            info_hash,
            piece_length,
            total_length,
        })
    }

    fn name(&self) -> &'static str {
        "bittorrent-v1"
    }
}

/// Power-of-two piece length for a payload size, aiming at ~1500 pieces
pub fn piece_length_for(total_length: u64) -> u64 {
    (total_length / TARGET_PIECES)
        .max(1)
        .next_power_of_two()
        .clamp(MIN_PIECE_LENGTH, MAX_PIECE_LENGTH)
}

/// Base name of a content path, resolving `.` and trailing `..`
pub fn content_name(content: &Path) -> Option<String> {
    match content.file_name() {
        Some(name) => Some(name.to_string_lossy().into_owned()),
        None => content
            .canonicalize()
            .ok()?
            .file_name()
            .map(|n| n.to_string_lossy().into_owned()),
    }
}

struct ContentFile {
    path: PathBuf,
    /// Path components relative to the content root
    components: Vec<String>,
    length: u64,
}

/// Regular files of the content in sorted relative-path order, hidden entries skipped
///
/// Symlinks are followed, so a linked track is hashed as the file it points to.
fn collect_files(content: &Path) -> std::io::Result<Vec<ContentFile>> {
    if content.is_file() {
        let length = std::fs::metadata(content)?.len();
        return Ok(vec![ContentFile {
            path: content.to_path_buf(),
            components: Vec::new(),
            length,
        }]);
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(content)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(content).unwrap_or(entry.path());
        let components = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();

        files.push(ContentFile {
            path: entry.path().to_path_buf(),
            components,
            length: entry.metadata().map_err(std::io::Error::from)?.len(),
        });
    }

    Ok(files)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// SHA-1 of every `piece_length` slice of the concatenated files
fn hash_pieces(files: &[&Path], piece_length: usize) -> std::io::Result<Vec<u8>> {
    let mut pieces = Vec::new();
    let mut hasher = Sha1::new();
    let mut filled = 0usize;
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    for path in files {
        let mut file = File::open(path)?;
        loop {
            let bytes_read = file.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }

            let mut chunk = &buffer[..bytes_read];
            while !chunk.is_empty() {
                let take = (piece_length - filled).min(chunk.len());
                hasher.update(&chunk[..take]);
                filled += take;
                chunk = &chunk[take..];

                if filled == piece_length {
                    pieces.extend_from_slice(&hasher.finalize_reset());
                    filled = 0;
                }
            }
        }
    }

    if filled > 0 {
        pieces.extend_from_slice(&hasher.finalize());
    }

    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::torrent::bencode::{self, Value};
    use std::fs;
    use tempfile::TempDir;

    fn profile(urls: &[&str], source: &str, is_private: bool) -> TrackerProfile {
        TrackerProfile {
            announce_urls: urls.iter().map(|s| s.to_string()).collect(),
            source: source.to_string(),
            is_private,
        }
    }

    fn encoder() -> V1TorrentEncoder {
        V1TorrentEncoder::new().with_creation_date(1_700_000_000)
    }

    #[test]
    fn test_piece_length_bounds() {
        assert_eq!(piece_length_for(0), MIN_PIECE_LENGTH);
        assert_eq!(piece_length_for(1024), MIN_PIECE_LENGTH);
        // 300 MB album: 200 KB ideal rounds up to 256 KiB
        assert_eq!(piece_length_for(300_000_000), 256 * 1024);
        assert_eq!(piece_length_for(u64::MAX / 2), MAX_PIECE_LENGTH);
    }

    #[test]
    fn test_single_file_descriptor() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("track.flac");
        fs::write(&file, vec![7u8; 100]).unwrap();

        let encoded = encoder()
            .encode(&file, &profile(&["https://t/announce"], "RED", true))
            .unwrap();
        let root = bencode::decode(&encoded.bytes).unwrap();

        assert_eq!(root.get("announce").and_then(Value::as_str), Some("https://t/announce"));
        assert!(root.get("announce-list").is_none());
        assert_eq!(root.get("creation date").and_then(Value::as_integer), Some(1_700_000_000));

        let info = root.get("info").unwrap();
        assert_eq!(info.get("name").and_then(Value::as_str), Some("track.flac"));
        assert_eq!(info.get("length").and_then(Value::as_integer), Some(100));
        assert_eq!(info.get("private").and_then(Value::as_integer), Some(1));
        assert_eq!(info.get("source").and_then(Value::as_str), Some("RED"));

        let expected = Sha1::digest(vec![7u8; 100]);
        assert_eq!(info.get("pieces").and_then(Value::as_bytes), Some(expected.as_slice()));
        assert_eq!(encoded.info_hash, hex::encode(Sha1::digest(info.encode())));
    }

    #[test]
    fn test_directory_descriptor() {
        let dir = TempDir::new().unwrap();
        let album = dir.path().join("Album");
        fs::create_dir_all(album.join("Scans")).unwrap();
        fs::write(album.join("02.flac"), b"bb").unwrap();
        fs::write(album.join("01.flac"), b"a").unwrap();
        fs::write(album.join("Scans/front.jpg"), b"ccc").unwrap();
        fs::write(album.join(".DS_Store"), b"junk").unwrap();

        let urls = ["https://a/announce", "https://b/announce"];
        let encoded = encoder().encode(&album, &profile(&urls, "", false)).unwrap();
        let root = bencode::decode(&encoded.bytes).unwrap();

        let tiers = root.get("announce-list").and_then(Value::as_list).unwrap();
        assert_eq!(tiers.len(), 2);
        assert_eq!(tiers[1].as_list().unwrap()[0].as_str(), Some("https://b/announce"));

        let info = root.get("info").unwrap();
        assert!(info.get("private").is_none());
        assert!(info.get("source").is_none());
        assert!(info.get("length").is_none());

        let files = info.get("files").and_then(Value::as_list).unwrap();
        let paths: Vec<Vec<&str>> = files
            .iter()
            .map(|f| {
                f.get("path")
                    .and_then(Value::as_list)
                    .unwrap()
                    .iter()
                    .map(|c| c.as_str().unwrap())
                    .collect()
            })
            .collect();
        assert_eq!(paths, vec![vec!["01.flac"], vec!["02.flac"], vec!["Scans", "front.jpg"]]);
        assert_eq!(encoded.total_length, 6);

        // Concatenated stream "a" + "bb" + "ccc" fits in one piece
        let pieces = info.get("pieces").and_then(Value::as_bytes).unwrap();
        assert_eq!(pieces, Sha1::digest(b"abbccc").as_slice());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_files_are_included() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        let album = dir.path().join("Album");
        fs::create_dir_all(&album).unwrap();
        fs::write(dir.path().join("outside.flac"), b"bb").unwrap();
        fs::write(album.join("01.flac"), b"a").unwrap();
        symlink(dir.path().join("outside.flac"), album.join("02.flac")).unwrap();

        let files = collect_files(&album).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.components[0].as_str()).collect();
        assert_eq!(names, vec!["01.flac", "02.flac"]);
        assert_eq!(files[1].length, 2);

        let encoded = encoder().encode(&album, &profile(&["u"], "", true)).unwrap();
        assert_eq!(encoded.total_length, 3);
    }

    #[test]
    fn test_pieces_span_file_boundaries() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, vec![1u8; 5]).unwrap();
        fs::write(&b, vec![2u8; 6]).unwrap();

        let pieces = hash_pieces(&[a.as_path(), b.as_path()], 4).unwrap();
        let mut stream = vec![1u8; 5];
        stream.extend(vec![2u8; 6]);
        let expected: Vec<u8> = stream.chunks(4).flat_map(|c| Sha1::digest(c).to_vec()).collect();
        assert_eq!(pieces, expected);
        assert_eq!(pieces.len(), 3 * 20);
    }

    #[test]
    fn test_empty_content_is_rejected() {
        let dir = TempDir::new().unwrap();
        let album = dir.path().join("Empty");
        fs::create_dir(&album).unwrap();
        let err = encoder().encode(&album, &profile(&["u"], "", true)).unwrap_err();
        assert!(matches!(err, RelprepError::TorrentError { .. }));
    }

    #[test]
    fn test_content_name_of_dot() {
        let dir = TempDir::new().unwrap();
        let name = content_name(&dir.path().join(".")).unwrap();
        assert_eq!(Some(name.as_str()), dir.path().file_name().and_then(|n| n.to_str()));
    }
}
