//! Torrent packaging
//!
//! Loads a tracker profile once, then writes one descriptor per content path.
//! An existing descriptor is never replaced: the collision resolver either
//! skips the content or picks the first free `<name>_N.torrent`.

use super::encoder::{content_name, TorrentEncoder, V1TorrentEncoder};
use crate::config::{CollisionPolicy, ProfileStore};
use crate::error::{RelprepError, Result};
use std::collections::HashSet;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

// =============================================================================
// Collision handling
// =============================================================================

/// What to do when the target descriptor already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionDecision {
    /// Leave the existing file and skip this content
    Skip,
    /// Write under the first free `<name>_N.torrent`
    Disambiguate,
}

/// Decides how to handle an existing descriptor
pub trait CollisionResolver {
    fn resolve(&self, existing: &Path) -> CollisionDecision;
}

/// Same decision for every collision
#[derive(Debug, Clone, Copy)]
pub struct FixedPolicy(pub CollisionDecision);

impl CollisionResolver for FixedPolicy {
    fn resolve(&self, _existing: &Path) -> CollisionDecision {
        self.0
    }
}

/// Asks on the terminal; anything but yes skips
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptResolver;

impl PromptResolver {
    /// Interpret a typed answer
    pub fn parse_answer(answer: &str) -> CollisionDecision {
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => CollisionDecision::Disambiguate,
            _ => CollisionDecision::Skip,
        }
    }
}

impl CollisionResolver for PromptResolver {
    fn resolve(&self, existing: &Path) -> CollisionDecision {
        let mut stderr = std::io::stderr().lock();
        let _ = write!(
            stderr,
            "'{}' already exists. Write a numbered copy instead? (y/n): ",
            existing.display()
        );
        let _ = stderr.flush();

        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => CollisionDecision::Skip,
            Ok(_) => Self::parse_answer(&answer),
        }
    }
}

impl CollisionResolver for CollisionPolicy {
    fn resolve(&self, existing: &Path) -> CollisionDecision {
        match self {
            CollisionPolicy::Prompt => PromptResolver.resolve(existing),
            CollisionPolicy::Skip => CollisionDecision::Skip,
            CollisionPolicy::Rename => CollisionDecision::Disambiguate,
        }
    }
}

// =============================================================================
// Packager
// =============================================================================

/// Outcome of one packaging run
#[derive(Debug, Clone, Default)]
pub struct PackagingReport {
    /// Descriptors written, in content order
    pub written: Vec<PathBuf>,
    /// Content paths that produced no descriptor, with the reason
    pub skipped: Vec<(PathBuf, String)>,
}

impl PackagingReport {
    /// True when at least one descriptor was written
    pub fn succeeded(&self) -> bool {
        !self.written.is_empty()
    }
}

/// Writes `.torrent` descriptors for content paths
pub struct TorrentPackager<E = V1TorrentEncoder, C = PromptResolver> {
    profiles: ProfileStore,
    encoder: E,
    resolver: C,
}

impl<E: TorrentEncoder, C: CollisionResolver> TorrentPackager<E, C> {
    pub fn new(profiles: ProfileStore, encoder: E, resolver: C) -> Self {
        Self {
            profiles,
            encoder,
            resolver,
        }
    }

    /// Write one descriptor per content path into `save_path`
    ///
    /// A profile that cannot be loaded fails the whole call before anything
    /// is written. Per-content problems (missing path, declined collision,
    /// build or write failure) are recorded in the report and the run moves on.
    pub fn create(&self, contents: &[PathBuf], save_path: &Path, profile_name: &str) -> Result<PackagingReport> {
        let profile = self.profiles.load(profile_name)?;
        debug!("Packaging {} content paths with {}", contents.len(), self.encoder.name());

        let mut report = PackagingReport::default();
        let mut claimed: HashSet<PathBuf> = HashSet::new();

        for content in contents {
            if !content.exists() {
                warn!("Content path does not exist: {}", content.display());
                report
                    .skipped
                    .push((content.clone(), "content path does not exist".to_string()));
                continue;
            }

            let Some(name) = content_name(content) else {
                warn!("Cannot determine a name for {}", content.display());
                report
                    .skipped
                    .push((content.clone(), "cannot determine content name".to_string()));
                continue;
            };

            let target = match self.resolve_target(save_path, &name, &claimed) {
                Ok(target) => target,
                Err(e) => {
                    warn!("Skipping '{}': {}", name, e);
                    report.skipped.push((content.clone(), e.to_string()));
                    continue;
                }
            };

            match self.write_descriptor(content, &profile, save_path, &target) {
                Ok(()) => {
                    info!("Torrent file created: {}", target.display());
                    claimed.insert(target.clone());
                    report.written.push(target);
                }
                Err(e) => {
                    warn!("{}", e);
                    report.skipped.push((content.clone(), e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Descriptor path for `name`, consulting the resolver on collision
    fn resolve_target(&self, save_path: &Path, name: &str, claimed: &HashSet<PathBuf>) -> Result<PathBuf> {
        let taken = |path: &Path| path.exists() || claimed.contains(path);

        let target = save_path.join(format!("{}.torrent", name));
        if !taken(&target) {
            return Ok(target);
        }

        match self.resolver.resolve(&target) {
            CollisionDecision::Skip => Err(RelprepError::Collision { path: target }),
            CollisionDecision::Disambiguate => {
                let free = (1u32..)
                    .map(|n| save_path.join(format!("{}_{}.torrent", name, n)))
                    .find(|candidate| !taken(candidate));
                free.ok_or(RelprepError::Collision { path: target })
            }
        }
    }

    /// Build and atomically write one descriptor
    fn write_descriptor(
        &self,
        content: &Path,
        profile: &crate::config::TrackerProfile,
        save_path: &Path,
        target: &Path,
    ) -> Result<()> {
        let encoded = self.encoder.encode(content, profile)?;

        std::fs::create_dir_all(save_path).map_err(|e| RelprepError::output_error(save_path, e))?;

        let mut temp = NamedTempFile::new_in(save_path).map_err(|e| RelprepError::output_error(save_path, e))?;
        temp.write_all(&encoded.bytes)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| RelprepError::output_error(target, e))?;

        // Fails instead of replacing a file that appeared since the check
        temp.persist_noclobber(target)
            .map_err(|e| RelprepError::output_error(target, e.error))?;

        debug!(
            "Wrote {} ({} bytes, info hash {})",
            target.display(),
            encoded.bytes.len(),
            encoded.info_hash
        );
        Ok(())
    }
}
