//! Whole-file content digests

use md5::{Digest, Md5};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// MD5 of the raw file bytes as lowercase hex
///
/// Hashes the container as stored on disk (tags and all), matching what
/// other release tools publish for the same file.
pub fn file_md5(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
