//! Runtime configuration settings

use super::cli::CollisionPolicy;
use crate::analysis::spectrogram::SpectrogramSelection;
use crate::export::ReportFormat;
use std::path::PathBuf;

/// Runtime settings for the release pipeline
#[derive(Debug, Clone)]
pub struct Settings {
    /// Album directories or scan roots
    pub inputs: Vec<PathBuf>,
    /// Scan roots recursively for album directories
    pub recursive: bool,
    /// Which tracks get a spectrogram
    pub spectrograms: SpectrogramSelection,
    /// Image host API key (required when spectrograms are requested)
    pub image_host_key: Option<String>,
    /// Explicit report format
    pub format: Option<ReportFormat>,
    /// Tracker profile name; packaging runs only when set
    pub profile: Option<String>,
    /// Output directory for .torrent files
    pub torrent_dir: PathBuf,
    /// Existing .torrent handling
    pub on_collision: CollisionPolicy,
    /// Tracker profile directory
    pub config_dir: PathBuf,
    /// Report destination (stdout when unset)
    pub report_path: Option<PathBuf>,
    /// Show progress bars
    pub show_progress: bool,
}

impl Settings {
    /// Create settings from CLI arguments
    pub fn from_cli(cli: &super::cli::Cli) -> Self {
        Self {
            inputs: cli.paths.clone(),
            recursive: cli.recursive,
            spectrograms: cli.spectrogram_selection(),
            image_host_key: cli.image_host_key.clone().filter(|k| !k.trim().is_empty()),
            format: cli.format,
            profile: cli.profile.clone(),
            torrent_dir: cli.torrent_dir.clone(),
            on_collision: cli.on_collision,
            config_dir: cli.config_dir.clone(),
            report_path: cli.report.clone(),
            show_progress: !cli.quiet,
        }
    }

    /// Whether any track could need a spectrogram
    pub fn spectrograms_requested(&self) -> bool {
        self.spectrograms != SpectrogramSelection::Nothing
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            inputs: vec![PathBuf::from(".")],
            recursive: true,
            spectrograms: SpectrogramSelection::Nothing,
            image_host_key: None,
            format: None,
            profile: None,
            torrent_dir: PathBuf::from("."),
            on_collision: CollisionPolicy::Prompt,
            config_dir: PathBuf::from("conf"),
            report_path: None,
            show_progress: true,
        }
    }
}
