//! CLI argument parsing and configuration

use crate::analysis::spectrogram::SpectrogramSelection;
use crate::export::ReportFormat;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// relprep - Prepare FLAC releases for posting
///
/// Analyzes album folders, optionally publishes spectrograms, builds
/// .torrent files for a tracker profile and prints a BBCode or Markdown
/// track table.
#[derive(Parser, Debug)]
#[command(name = "relprep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Album directories, or roots to scan for album directories
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Render and upload a spectrogram for every track
    #[arg(short, long, default_value = "false")]
    pub spectrograms: bool,

    /// Only render spectrograms for these track numbers ("*" for all, or e.g. "1,3,07")
    #[arg(long, value_name = "LIST")]
    pub spectrogram_tracks: Option<SpectrogramSelection>,

    /// FreeImage.host API key used to publish spectrograms
    #[arg(long, value_name = "KEY", env = "FREEIMAGE_API_KEY", hide_env_values = true)]
    pub image_host_key: Option<String>,

    /// Report format (defaults to the profile's preference, then bbcode)
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Scan subdirectories for album folders
    #[arg(short, long, default_value = "true", action = clap::ArgAction::Set)]
    pub recursive: bool,

    /// Tracker profile to build .torrent files with (enables packaging)
    #[arg(short, long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Directory to write .torrent files to
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub torrent_dir: PathBuf,

    /// What to do when a .torrent file of the same name already exists
    #[arg(long, value_enum, default_value_t = CollisionPolicy::Prompt)]
    pub on_collision: CollisionPolicy,

    /// Directory holding tracker profiles (<name>.json)
    #[arg(long, value_name = "DIR", env = "RELPREP_CONFIG_DIR", default_value = "conf")]
    pub config_dir: PathBuf,

    /// Write the report to a file instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress progress bars)
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

/// Collision handling for existing .torrent files
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CollisionPolicy {
    /// Ask on the terminal for every collision
    Prompt,
    /// Leave the existing file alone and skip that content
    Skip,
    /// Write under the next free `_N` name
    Rename,
}

impl Cli {
    /// Spectrogram selection implied by the flags
    pub fn spectrogram_selection(&self) -> SpectrogramSelection {
        match (&self.spectrogram_tracks, self.spectrograms) {
            (Some(selection), _) => selection.clone(),
            (None, true) => SpectrogramSelection::All,
            (None, false) => SpectrogramSelection::Nothing,
        }
    }
}
