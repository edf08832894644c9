//! Album directory discovery and listing

use crate::error::{RelprepError, Result};
use crate::types::EntryKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};
use walkdir::WalkDir;

/// List the `.flac` files directly inside an album directory
///
/// Entries come back in file-name order, which is the album's encounter
/// order. Other audio formats, images, sidecars (cue, log, playlists, notes)
/// and sub-directories are skipped without a warning; anything else is skipped
/// with one.
pub fn list_album(dir: &Path) -> Result<Vec<PathBuf>> {
    ensure_directory(dir)?;

    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // Dangling link inside the album
            Err(e) if e.depth() > 0 => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
            Err(e) => return Err(RelprepError::invalid_input(dir, format!("cannot list directory: {}", e))),
        };
        let path = entry.path();

        if entry.file_type().is_dir() {
            continue;
        }

        match EntryKind::from_path(path) {
            EntryKind::Flac => {
                debug!("Discovered: {}", path.display());
                files.push(path.to_path_buf());
            }
            EntryKind::Audio => debug!("Skipping non-FLAC audio file: {}", path.display()),
            EntryKind::Image | EntryKind::Sidecar => trace!("Ignoring {}", path.display()),
            EntryKind::Other => warn!("Skipping non-audio file: {}", path.display()),
        }
    }

    if files.is_empty() {
        warn!("No .flac files found in {}", dir.display());
    }

    Ok(files)
}

/// Find album directories under a root
///
/// With `recursive`, every directory in the tree (root included) holding at
/// least one `.flac` file is an album, in walk order. Without it the root
/// itself is the album.
pub fn find_album_dirs(root: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    ensure_directory(root)?;

    if !recursive {
        return Ok(vec![root.to_path_buf()]);
    }

    let albums: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .filter(|dir| contains_flac(dir))
        .collect();

    info!("Found {} album directories under {}", albums.len(), root.display());
    Ok(albums)
}

/// Find album directories under several roots
///
/// A bad root is reported and does not stop the others.
pub fn find_album_dirs_in(roots: &[PathBuf], recursive: bool) -> (Vec<PathBuf>, Vec<RelprepError>) {
    let mut albums = Vec::new();
    let mut failures = Vec::new();

    for root in roots {
        match find_album_dirs(root, recursive) {
            Ok(found) => albums.extend(found),
            Err(e) => {
                warn!("{}", e);
                failures.push(e);
            }
        }
    }

    (albums, failures)
}

fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(RelprepError::invalid_input(path, "path does not exist"));
    }
    if !path.is_dir() {
        return Err(RelprepError::invalid_input(path, "not a directory"));
    }
    Ok(())
}

fn contains_flac(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .any(|path| EntryKind::is_flac_path(&path) && path.is_file())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"x").unwrap();
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_list_album_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in ["02 b.flac", "01 a.FLAC", "cover.jpg", "rip.log", "album.cue", "notes.pdf", "01 a.mp3", "bonus.wav"] {
            touch(&dir.path().join(name));
        }
        touch(&dir.path().join("Scans/back.flac"));

        let files = list_album(dir.path()).unwrap();
        assert_eq!(names(&files), vec!["01 a.FLAC", "02 b.flac"]);
    }

    #[test]
    fn test_list_album_rejects_missing_and_files() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(list_album(&missing), Err(RelprepError::InvalidInput { .. })));

        let file = dir.path().join("a.flac");
        touch(&file);
        assert!(matches!(list_album(&file), Err(RelprepError::InvalidInput { .. })));
    }

    #[test]
    fn test_find_album_dirs_recursive() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("B Album/CD1/01.flac"));
        touch(&dir.path().join("B Album/CD2/01.flac"));
        touch(&dir.path().join("A Album/01.flac"));
        touch(&dir.path().join("Artwork/front.jpg"));

        let albums = find_album_dirs(dir.path(), true).unwrap();
        let rel: Vec<PathBuf> = albums
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from("A Album"),
                PathBuf::from("B Album/CD1"),
                PathBuf::from("B Album/CD2"),
            ]
        );
    }

    #[test]
    fn test_find_album_dirs_non_recursive_uses_root() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("sub/01.flac"));
        assert_eq!(find_album_dirs(dir.path(), false).unwrap(), vec![dir.path().to_path_buf()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_tracks_form_an_album() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("store/01.flac"));
        touch(&dir.path().join("store/02.flac"));
        let album = dir.path().join("library/Linked Album");
        fs::create_dir_all(&album).unwrap();
        symlink(dir.path().join("store/01.flac"), album.join("01.flac")).unwrap();
        symlink(dir.path().join("store/02.flac"), album.join("02.flac")).unwrap();
        symlink(dir.path().join("store/gone.flac"), album.join("03.flac")).unwrap();

        let albums = find_album_dirs(&dir.path().join("library"), true).unwrap();
        assert_eq!(albums, vec![album.clone()]);

        // Recursive and non-recursive discovery agree on the tracks
        let files = list_album(&album).unwrap();
        assert_eq!(names(&files), vec!["01.flac", "02.flac"]);
        assert_eq!(find_album_dirs(&album, false).unwrap(), vec![album]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_album_directory_is_walked() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("store/Album/01.flac"));
        fs::create_dir(dir.path().join("library")).unwrap();
        symlink(dir.path().join("store/Album"), dir.path().join("library/Album")).unwrap();

        let albums = find_album_dirs(&dir.path().join("library"), true).unwrap();
        assert_eq!(albums, vec![dir.path().join("library/Album")]);
    }

    #[test]
    fn test_bad_root_does_not_stop_batch() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("Album/01.flac"));

        let roots = vec![dir.path().join("missing"), dir.path().to_path_buf()];
        let (albums, failures) = find_album_dirs_in(&roots, true);
        assert_eq!(albums.len(), 1);
        assert_eq!(failures.len(), 1);
        assert!(failures[0].to_string().contains("missing"));
    }
}
