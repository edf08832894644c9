//! Optional spectrogram side-channel
//!
//! Decodes a track to mono, plots it, publishes the image and hands back the
//! public URL. Every failure along the way degrades to
//! [`Spectrogram::Failed`] so the album keeps going.

pub mod render;
pub mod stft;

pub use render::StftRenderer;

use crate::analysis::traits::{AudioDecoder, ImageHost, SpectrogramRenderer};
use crate::audio::SymphoniaDecoder;
use crate::error::{RelprepError, Result};
use crate::types::{parse_ordinal_number, Spectrogram};
use crate::upload::FreeImageHost;
use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

// =============================================================================
// Track selection
// =============================================================================

/// Which tracks of an album get a spectrogram
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpectrogramSelection {
    /// Every track (`*`)
    All,
    /// Tracks whose ordinal number is in the set
    Ordinals(BTreeSet<u32>),
    /// No track
    Nothing,
}

impl SpectrogramSelection {
    /// Whether a track with this ordinal number is selected
    ///
    /// Tracks without a numeric ordinal only match [`SpectrogramSelection::All`].
    pub fn includes(&self, ordinal: Option<u32>) -> bool {
        match self {
            SpectrogramSelection::All => true,
            SpectrogramSelection::Ordinals(set) => ordinal.is_some_and(|n| set.contains(&n)),
            SpectrogramSelection::Nothing => false,
        }
    }
}

impl FromStr for SpectrogramSelection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s == "*" {
            return Ok(SpectrogramSelection::All);
        }

        let mut ordinals = BTreeSet::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let number = parse_ordinal_number(part)
                .ok_or_else(|| format!("'{}' is not a track number", part))?;
            ordinals.insert(number);
        }

        if ordinals.is_empty() {
            return Err("expected \"*\" or a comma-separated list of track numbers".to_string());
        }
        Ok(SpectrogramSelection::Ordinals(ordinals))
    }
}

// =============================================================================
// Stage
// =============================================================================

/// Render-and-publish stage
pub struct SpectrogramStage<D = SymphoniaDecoder, R = StftRenderer, H = FreeImageHost> {
    decoder: D,
    renderer: R,
    host: H,
}

impl SpectrogramStage {
    /// Symphonia decoding, STFT plots and FreeImage.host publishing
    pub fn with_image_host_key(api_key: impl Into<String>) -> Self {
        Self::new(SymphoniaDecoder, StftRenderer::default(), FreeImageHost::new(api_key))
    }
}

impl<D: AudioDecoder, R: SpectrogramRenderer, H: ImageHost> SpectrogramStage<D, R, H> {
    pub fn new(decoder: D, renderer: R, host: H) -> Self {
        debug!(
            "Spectrogram stage: decoder={}, renderer={}, host={}",
            decoder.name(),
            renderer.name(),
            host.name()
        );
        Self {
            decoder,
            renderer,
            host,
        }
    }

    /// Produce the spectrogram field for one track
    ///
    /// When `enabled` is false nothing is decoded, rendered or uploaded.
    pub fn maybe_render(&self, path: &Path, enabled: bool) -> Spectrogram {
        if !enabled {
            return Spectrogram::NotRequested;
        }

        match self.render_and_publish(path) {
            Ok(url) => {
                info!("Published spectrogram for {}: {}", path.display(), url);
                Spectrogram::Hosted(url)
            }
            Err(e) => {
                warn!("{}", e);
                Spectrogram::Failed(e.to_string())
            }
        }
    }

    fn render_and_publish(&self, path: &Path) -> Result<String> {
        let buffer = self
            .decoder
            .decode_mono(path)
            .map_err(|e| e.into_render_error(path))?;

        if buffer.sample_rate == 0 {
            return Err(RelprepError::render_error(path, "sample rate is 0"));
        }

        // Removed when `scratch` drops, after the upload has read the image
        let scratch = tempfile::Builder::new()
            .prefix("relprep-spectrogram-")
            .tempdir()
            .map_err(|e| RelprepError::render_error(path, format!("Failed to create scratch directory: {}", e)))?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "track".to_string());
        let image_path = scratch.path().join(format!("{}_spectrogram.png", stem));
        let title = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| stem.clone());

        self.renderer
            .render(&buffer, &title, &image_path)
            .map_err(|e| e.into_render_error(path))?;

        self.host
            .upload(&image_path)
            .map_err(|e| e.into_render_error(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AudioBuffer;
    use std::cell::{Cell, RefCell};
    use std::path::PathBuf;

    struct StubDecoder {
        sample_rate: u32,
        calls: Cell<usize>,
    }

    impl StubDecoder {
        fn at(sample_rate: u32) -> Self {
            Self {
                sample_rate,
                calls: Cell::new(0),
            }
        }
    }

    impl AudioDecoder for StubDecoder {
        fn decode_mono(&self, path: &Path) -> Result<AudioBuffer> {
            self.calls.set(self.calls.get() + 1);
            if path.ends_with("broken.flac") {
                return Err(RelprepError::DecodeError {
                    path: path.to_path_buf(),
                    reason: "bad frame header".into(),
                });
            }
            Ok(AudioBuffer::new(vec![0.0; 4096], self.sample_rate))
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    /// Writes a marker file instead of a plot
    struct TouchRenderer;

    impl SpectrogramRenderer for TouchRenderer {
        fn render(&self, _buffer: &AudioBuffer, _title: &str, output: &Path) -> Result<()> {
            std::fs::write(output, b"png").map_err(|e| RelprepError::render_error(output, e.to_string()))
        }

        fn name(&self) -> &'static str {
            "touch"
        }
    }

    /// Records uploaded paths; fails when `fail` is set
    #[derive(Default)]
    struct RecordingHost {
        uploads: RefCell<Vec<PathBuf>>,
        fail: bool,
    }

    impl ImageHost for RecordingHost {
        fn upload(&self, image: &Path) -> Result<String> {
            assert!(image.exists(), "scratch image must exist during upload");
            self.uploads.borrow_mut().push(image.to_path_buf());
            if self.fail {
                return Err(RelprepError::render_error(image, "HTTP 503"));
            }
            Ok("https://iili.io/abc.png".to_string())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    #[test]
    fn test_disabled_touches_nothing() {
        let stage = SpectrogramStage::new(StubDecoder::at(44100), TouchRenderer, RecordingHost::default());
        let result = stage.maybe_render(Path::new("/music/01.flac"), false);

        assert_eq!(result, Spectrogram::NotRequested);
        assert_eq!(stage.decoder.calls.get(), 0);
        assert!(stage.host.uploads.borrow().is_empty());
    }

    #[test]
    fn test_enabled_publishes_and_cleans_scratch() {
        let stage = SpectrogramStage::new(StubDecoder::at(44100), TouchRenderer, RecordingHost::default());
        let result = stage.maybe_render(Path::new("/music/01 Intro.flac"), true);

        assert_eq!(result, Spectrogram::Hosted("https://iili.io/abc.png".into()));
        let uploads = stage.host.uploads.borrow();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].ends_with("01 Intro_spectrogram.png"));
        assert!(!uploads[0].exists());
    }

    #[test]
    fn test_zero_sample_rate_fails_without_upload() {
        let stage = SpectrogramStage::new(StubDecoder::at(0), TouchRenderer, RecordingHost::default());
        let result = stage.maybe_render(Path::new("/music/01.flac"), true);

        assert!(matches!(result, Spectrogram::Failed(ref reason) if reason.contains("sample rate is 0")));
        assert!(stage.host.uploads.borrow().is_empty());
    }

    #[test]
    fn test_decode_failure_degrades_to_failed() {
        let stage = SpectrogramStage::new(StubDecoder::at(44100), TouchRenderer, RecordingHost::default());
        match stage.maybe_render(Path::new("/music/broken.flac"), true) {
            Spectrogram::Failed(reason) => {
                assert!(reason.contains("broken.flac"));
                assert!(reason.contains("bad frame header"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_upload_failure_names_the_track() {
        let host = RecordingHost {
            fail: true,
            ..Default::default()
        };
        let stage = SpectrogramStage::new(StubDecoder::at(44100), TouchRenderer, host);
        match stage.maybe_render(Path::new("/music/02.flac"), true) {
            Spectrogram::Failed(reason) => assert!(reason.contains("/music/02.flac")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_selection_parsing() {
        assert_eq!("*".parse::<SpectrogramSelection>().unwrap(), SpectrogramSelection::All);

        let picked: SpectrogramSelection = "1, 03,12".parse().unwrap();
        assert!(picked.includes(Some(1)));
        assert!(picked.includes(Some(3)));
        assert!(picked.includes(Some(12)));
        assert!(!picked.includes(Some(2)));
        assert!(!picked.includes(None));

        assert!("".parse::<SpectrogramSelection>().is_err());
        assert!("1,x".parse::<SpectrogramSelection>().is_err());
    }

    #[test]
    fn test_nothing_and_all() {
        assert!(!SpectrogramSelection::Nothing.includes(Some(1)));
        assert!(SpectrogramSelection::All.includes(None));
    }
}
