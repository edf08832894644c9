//! Pipeline orchestration
//!
//! Coordinates album discovery, analysis, torrent packaging and report output.
//! Everything runs on the calling thread, one file at a time.

use super::aggregator::AlbumAggregator;
use crate::analysis::SpectrogramStage;
use crate::config::{ProfileStore, Settings};
use crate::error::{RelprepError, Result};
use crate::export::{self, ReportFormat};
use crate::torrent::{TorrentPackager, V1TorrentEncoder};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Pipeline result summary
#[derive(Debug, Default)]
pub struct PipelineResult {
    /// Album directories analyzed
    pub albums: usize,
    /// Tracks present in the report
    pub tracks: usize,
    /// Roots, albums and files that could not be analyzed
    pub failed: usize,
    /// Descriptors written
    pub torrents_written: Vec<PathBuf>,
    /// Content paths that produced no descriptor
    pub torrents_skipped: usize,
}

impl PipelineResult {
    /// True when any input or content path was reported and skipped
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.torrents_skipped > 0
    }
}

/// Run the full release-prep pipeline
///
/// Fatal problems (bad profile, missing image host key, no usable input root,
/// unwritable report) are returned as errors before or instead of output.
/// Per-item problems are counted in the result.
pub fn run(settings: &Settings) -> Result<PipelineResult> {
    let pipeline_start = Instant::now();

    // Phase 0: configuration that must be valid before any work starts
    let image_host_key = if settings.spectrograms_requested() {
        let key = settings.image_host_key.clone().ok_or_else(|| {
            RelprepError::config_error(
                "--image-host-key",
                "spectrograms were requested but no FreeImage.host API key is set (FREEIMAGE_API_KEY)",
            )
        })?;
        Some(key)
    } else {
        None
    };

    let profiles = ProfileStore::new(&settings.config_dir);
    let format = resolve_format(settings, &profiles)?;
    debug!("Report format: {:?}", format);

    // Phase 1: Discovery and analysis
    let mut aggregator = AlbumAggregator::default().with_progress(settings.show_progress);
    if let Some(key) = image_host_key {
        aggregator = aggregator.with_spectrograms(
            SpectrogramStage::with_image_host_key(key),
            settings.spectrograms.clone(),
        );
    }

    let analysis_start = Instant::now();
    info!("Scanning {} input paths for albums...", settings.inputs.len());
    let batch = aggregator.analyze_many(&settings.inputs, settings.recursive)?;

    let mut result = PipelineResult {
        albums: batch.albums.len(),
        tracks: batch.tracks(),
        failed: batch.failed(),
        ..PipelineResult::default()
    };
    info!(
        "Analysis completed in {:.2}s ({} tracks in {} albums, {} failed)",
        analysis_start.elapsed().as_secs_f64(),
        result.tracks,
        result.albums,
        result.failed
    );

    // Phase 2: Packaging
    if let Some(profile_name) = &settings.profile {
        let packager = TorrentPackager::new(profiles.clone(), V1TorrentEncoder::new(), settings.on_collision);
        let report = packager.create(&settings.inputs, &settings.torrent_dir, profile_name)?;

        for (content, reason) in &report.skipped {
            debug!("No torrent for {}: {}", content.display(), reason);
        }
        if !report.succeeded() {
            warn!("No torrent files were written");
        }
        result.torrents_skipped = report.skipped.len();
        result.torrents_written = report.written;
    }

    // Phase 3: Report
    let text = export::render_many(&batch.albums, format)?;
    export::write_report(&text, settings.report_path.as_deref())?;

    info!(
        "Total pipeline time: {:.2}s",
        pipeline_start.elapsed().as_secs_f64()
    );

    Ok(result)
}

/// Explicit format, then the profile's preference, then BBCode
///
/// Also loads the profile so a broken one fails before analysis starts.
fn resolve_format(settings: &Settings, profiles: &ProfileStore) -> Result<ReportFormat> {
    let Some(name) = &settings.profile else {
        return Ok(settings.format.unwrap_or_default());
    };

    profiles.load(name)?;
    match settings.format {
        Some(format) => Ok(format),
        None => Ok(profiles.default_format(name)?.unwrap_or_default()),
    }
}
