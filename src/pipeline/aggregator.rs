//! Album aggregation
//!
//! Drives metadata extraction and the spectrogram stage over every `.flac`
//! file of an album directory and assembles the ordered [`AlbumRecord`].

use crate::analysis::traits::{AudioDecoder, ImageHost, MetadataReader, SpectrogramRenderer};
use crate::analysis::{LoftyMetadataReader, MetadataExtractor, SpectrogramSelection, SpectrogramStage, StftRenderer};
use crate::audio::SymphoniaDecoder;
use crate::discovery;
use crate::error::Result;
use crate::types::{AlbumCollection, AlbumRecord, Spectrogram};
use crate::upload::FreeImageHost;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Albums found under a set of roots, plus what could not be analyzed
#[derive(Debug, Default)]
pub struct AlbumBatch {
    pub albums: AlbumCollection,
    /// Roots that were missing or not directories
    pub root_failures: usize,
    /// Album directories that could not be listed
    pub album_failures: usize,
}

impl AlbumBatch {
    /// Tracks present across all albums
    pub fn tracks(&self) -> usize {
        self.albums.iter().map(AlbumRecord::len).sum()
    }

    /// Roots, albums and individual files that failed
    pub fn failed(&self) -> usize {
        let file_failures: usize = self.albums.iter().map(|a| a.failures().len()).sum();
        self.root_failures + self.album_failures + file_failures
    }
}

/// Builds album records from directories
pub struct AlbumAggregator<
    R = LoftyMetadataReader,
    D = SymphoniaDecoder,
    S = StftRenderer,
    H = FreeImageHost,
> {
    extractor: MetadataExtractor<R>,
    spectrograms: Option<(SpectrogramStage<D, S, H>, SpectrogramSelection)>,
    show_progress: bool,
}

impl<R, D, S, H> AlbumAggregator<R, D, S, H>
where
    R: MetadataReader,
    D: AudioDecoder,
    S: SpectrogramRenderer,
    H: ImageHost,
{
    /// Aggregator without a spectrogram stage
    pub fn new(extractor: MetadataExtractor<R>) -> Self {
        Self {
            extractor,
            spectrograms: None,
            show_progress: false,
        }
    }

    /// Render spectrograms for the tracks picked by `selection`
    pub fn with_spectrograms(mut self, stage: SpectrogramStage<D, S, H>, selection: SpectrogramSelection) -> Self {
        self.spectrograms = match selection {
            SpectrogramSelection::Nothing => None,
            selection => Some((stage, selection)),
        };
        self
    }

    /// Show a per-album progress bar on stderr
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Analyze one album directory
    ///
    /// Only an unreadable or missing directory fails the call. A file that
    /// cannot be analyzed is logged, recorded in the album's failures and
    /// left out of the record.
    pub fn analyze(&self, album_dir: &Path) -> Result<AlbumRecord> {
        let files = discovery::list_album(album_dir)?;
        let mut album = AlbumRecord::new(album_dir);

        let progress_bar = self.progress_bar(files.len(), album_dir);

        for file in &files {
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string());

            if let Some(ref pb) = progress_bar {
                pb.set_message(file_name.clone());
            }

            match self.extractor.extract(file) {
                Ok(record) => {
                    let spectrogram = match &self.spectrograms {
                        Some((stage, selection)) => {
                            stage.maybe_render(file, selection.includes(record.ordinal.number()))
                        }
                        None => Spectrogram::NotRequested,
                    };
                    album.insert(file_name, record.with_spectrogram(spectrogram));
                }
                Err(e) => {
                    warn!("Skipping {}: {}", file.display(), e);
                    album.record_failure(e.to_string());
                }
            }

            if let Some(ref pb) = progress_bar {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress_bar {
            pb.finish_and_clear();
        }

        let sorted = album.apply_release_order();
        if !sorted && !album.is_empty() {
            debug!(
                "Kept listing order for {} (disc or track number missing or not numeric)",
                album_dir.display()
            );
        }

        info!(
            "Analyzed {}: {} tracks, {} failed",
            album_dir.display(),
            album.len(),
            album.failures().len()
        );

        Ok(album)
    }

    /// Analyze every album directory found under the given roots
    ///
    /// A bad root or unreadable album is reported, counted and skipped. The
    /// call only fails when every root was unusable.
    pub fn analyze_many(&self, roots: &[PathBuf], recursive: bool) -> Result<AlbumBatch> {
        let (album_dirs, mut root_failures) = discovery::find_album_dirs_in(roots, recursive);

        if album_dirs.is_empty() && root_failures.len() == roots.len() && !root_failures.is_empty() {
            return Err(root_failures.remove(0));
        }

        let mut batch = AlbumBatch {
            albums: AlbumCollection::with_capacity(album_dirs.len()),
            root_failures: root_failures.len(),
            album_failures: 0,
        };
        for dir in &album_dirs {
            match self.analyze(dir) {
                Ok(album) => batch.albums.push(album),
                Err(e) => {
                    warn!("Skipping album {}: {}", dir.display(), e);
                    batch.album_failures += 1;
                }
            }
        }

        Ok(batch)
    }

    fn progress_bar(&self, len: usize, album_dir: &Path) -> Option<ProgressBar> {
        if !self.show_progress || len == 0 {
            return None;
        }

        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {prefix} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_prefix(
            album_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        Some(pb)
    }
}

impl Default for AlbumAggregator {
    fn default() -> Self {
        Self::new(MetadataExtractor::default())
    }
}
