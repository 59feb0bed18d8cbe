//! Capture controller.
//!
//! Acquires the image that accompanies a submission, either as a snapshot of a
//! live preview or as a user-selected file. The two modes are mutually exclusive:
//!
//! - **LiveFeed**: [`acquire_live_feed`](CaptureController::acquire_live_feed) asks the
//!   environment for a preview, then [`snapshot`](CaptureController::snapshot) samples
//!   the current frame into a JPEG artifact.
//! - **FileSelect**: [`select`](CaptureController::select) wraps any non-empty bytes.
//!
//! The controller owns the live-feed resource. Switching mode, re-acquiring and
//! dropping the controller all release it first.
//!
//! Producing an artifact has session-wide side effects (clearing the previous
//! result). Those are applied by [`ScreeningFlow`](crate::ScreeningFlow), which
//! installs the artifacts this controller returns.

mod artifact;
mod live_feed;

pub use artifact::{ArtifactSource, CaptureArtifact};
pub use live_feed::{
    Frame, FrameFileProvider, LiveFeed, LiveFeedHandle, LiveFeedProvider, NoCameraProvider,
};

use crate::{ScreeningError, ScreeningResult};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureMode {
    #[default]
    LiveFeed,
    FileSelect,
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureMode::LiveFeed => f.write_str("live feed"),
            CaptureMode::FileSelect => f.write_str("file select"),
        }
    }
}

impl std::str::FromStr for CaptureMode {
    type Err = ScreeningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" | "webcam" | "camera" | "live-feed" => Ok(CaptureMode::LiveFeed),
            "file" | "upload" | "file-select" => Ok(CaptureMode::FileSelect),
            other => Err(ScreeningError::InvalidInput(format!(
                "unknown capture mode '{}' (expected live or file)",
                other
            ))),
        }
    }
}

/// Observable state of the live preview.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreviewState {
    /// No acquisition has been attempted in the current mode.
    #[default]
    Inactive,
    /// A feed was granted and is updating.
    Active,
    /// The environment refused or failed the last acquisition. No retry is made.
    Denied { reason: String },
}

pub struct CaptureController {
    provider: Arc<dyn LiveFeedProvider>,
    mode: CaptureMode,
    feed: LiveFeedHandle,
    preview: PreviewState,
    jpeg_quality: u8,
}

impl fmt::Debug for CaptureController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureController")
            .field("mode", &self.mode)
            .field("feed", &self.feed)
            .field("preview", &self.preview)
            .finish_non_exhaustive()
    }
}

impl CaptureController {
    /// Creates a controller in `LiveFeed` mode with no preview yet.
    pub fn new(provider: Arc<dyn LiveFeedProvider>, jpeg_quality: u8) -> Self {
        Self {
            provider,
            mode: CaptureMode::LiveFeed,
            feed: LiveFeedHandle::default(),
            preview: PreviewState::Inactive,
            jpeg_quality,
        }
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn preview(&self) -> &PreviewState {
        &self.preview
    }

    /// Switches mode, releasing any live feed. Re-entering the current mode also
    /// releases the feed.
    pub fn enter_mode(&mut self, mode: CaptureMode) {
        self.release();
        self.mode = mode;
        tracing::info!("capture mode set to {}", mode);
    }

    /// Requests a live preview from the environment.
    ///
    /// Any existing acquisition is released before the new request. Denial is
    /// not an error: the preview becomes [`PreviewState::Denied`] and the mode stays
    /// `LiveFeed`.
    ///
    /// # Errors
    ///
    /// Returns `ScreeningError::WrongMode` outside `LiveFeed` mode.
    pub async fn acquire_live_feed(&mut self) -> ScreeningResult<&PreviewState> {
        self.require_mode(CaptureMode::LiveFeed)?;
        self.release();

        match self.provider.acquire().await {
            Ok(feed) => {
                self.feed = LiveFeedHandle::new(feed);
                self.preview = PreviewState::Active;
                tracing::info!("live feed granted");
            }
            Err(e) => {
                let reason = match e {
                    ScreeningError::LiveFeedDenied(reason)
                    | ScreeningError::LiveFeedUnavailable(reason) => reason,
                    other => other.to_string(),
                };
                tracing::warn!("live feed not available: {}", reason);
                self.preview = PreviewState::Denied { reason };
            }
        }

        Ok(&self.preview)
    }

    /// Samples the current preview frame into a JPEG artifact.
    ///
    /// # Errors
    ///
    /// - `ScreeningError::WrongMode` outside `LiveFeed` mode
    /// - `ScreeningError::NoPreview` if no preview is active
    /// - `ScreeningError::NoFrame` if the preview has not produced a frame yet
    pub fn snapshot(&mut self) -> ScreeningResult<CaptureArtifact> {
        self.require_mode(CaptureMode::LiveFeed)?;
        if self.preview != PreviewState::Active {
            return Err(ScreeningError::NoPreview);
        }

        let frame = self.feed.current_frame()?.ok_or(ScreeningError::NoFrame)?;
        let artifact = CaptureArtifact::from_frame(&frame, self.jpeg_quality)?;
        tracing::info!(
            "snapshot captured: {}x{} -> {} bytes",
            frame.width(),
            frame.height(),
            artifact.bytes().len()
        );
        Ok(artifact)
    }

    /// Wraps a selected file as an artifact. No format validation is performed.
    ///
    /// # Errors
    ///
    /// - `ScreeningError::WrongMode` outside `FileSelect` mode
    /// - `ScreeningError::Types` if `bytes` is empty
    pub fn select(
        &self,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> ScreeningResult<CaptureArtifact> {
        self.require_mode(CaptureMode::FileSelect)?;
        let artifact = CaptureArtifact::from_file(file_name, bytes)?;
        tracing::info!("file selected: {}", artifact.describe());
        Ok(artifact)
    }

    /// Reads `path` from disk and selects it.
    pub fn select_path(&self, path: &Path) -> ScreeningResult<CaptureArtifact> {
        self.require_mode(CaptureMode::FileSelect)?;
        let bytes = std::fs::read(path).map_err(ScreeningError::FileRead)?;
        let file_name = path
            .file_name()
            .and_then(|os| os.to_str())
            .unwrap_or("image")
            .to_string();
        self.select(file_name, bytes)
    }

    /// Stops the live feed, if one is held, and resets the preview.
    pub fn release(&mut self) {
        self.feed.release();
        self.preview = PreviewState::Inactive;
    }

    fn require_mode(&self, expected: CaptureMode) -> ScreeningResult<()> {
        if self.mode != expected {
            return Err(ScreeningError::WrongMode {
                expected,
                actual: self.mode,
            });
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::ScriptedProvider;
    use super::*;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    fn controller(provider: Arc<ScriptedProvider>) -> CaptureController {
        CaptureController::new(provider, 90)
    }

    #[tokio::test]
    async fn test_denied_acquisition_keeps_live_mode_with_empty_preview() {
        let provider = Arc::new(ScriptedProvider::denying());
        let mut capture = controller(provider.clone());

        let preview = capture.acquire_live_feed().await.unwrap().clone();
        assert!(matches!(preview, PreviewState::Denied { ref reason } if reason == "user refused"));
        assert_eq!(capture.mode(), CaptureMode::LiveFeed);
        assert!(matches!(capture.snapshot(), Err(ScreeningError::NoPreview)));
        assert_eq!(provider.acquisitions.load(Ordering::SeqCst), 1, "no retry");
    }

    #[tokio::test]
    async fn test_snapshot_after_grant_yields_jpeg() {
        let provider = Arc::new(ScriptedProvider::default());
        let mut capture = controller(provider);

        assert_eq!(capture.acquire_live_feed().await.unwrap(), &PreviewState::Active);
        let artifact = capture.snapshot().expect("snapshot should succeed");
        assert_eq!(artifact.media_type(), "image/jpeg");
        assert_eq!(artifact.source(), &ArtifactSource::Snapshot);
    }

    #[tokio::test]
    async fn test_snapshot_without_frame_fails() {
        let provider = Arc::new(ScriptedProvider::default());
        provider.blank.store(true, Ordering::SeqCst);
        let mut capture = controller(provider);

        capture.acquire_live_feed().await.unwrap();
        assert!(matches!(capture.snapshot(), Err(ScreeningError::NoFrame)));
    }

    #[tokio::test]
    async fn test_reacquire_releases_previous_feed_first() {
        let provider = Arc::new(ScriptedProvider::default());
        let mut capture = controller(provider.clone());

        capture.acquire_live_feed().await.unwrap();
        capture.acquire_live_feed().await.unwrap();
        assert_eq!(provider.stops.load(Ordering::SeqCst), 1);

        drop(capture);
        assert_eq!(provider.stops.load(Ordering::SeqCst), 2, "teardown releases");
    }

    #[tokio::test]
    async fn test_enter_mode_releases_feed_and_resets_preview() {
        let provider = Arc::new(ScriptedProvider::default());
        let mut capture = controller(provider.clone());

        capture.acquire_live_feed().await.unwrap();
        capture.enter_mode(CaptureMode::FileSelect);

        assert_eq!(provider.stops.load(Ordering::SeqCst), 1);
        assert_eq!(capture.preview(), &PreviewState::Inactive);
        assert!(matches!(
            capture.acquire_live_feed().await,
            Err(ScreeningError::WrongMode { .. })
        ));
    }

    #[test]
    fn test_select_requires_file_mode() {
        let capture = controller(Arc::new(ScriptedProvider::default()));
        let err = capture.select("a.jpg", vec![1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            ScreeningError::WrongMode {
                expected: CaptureMode::FileSelect,
                actual: CaptureMode::LiveFeed
            }
        ));
    }

    #[test]
    fn test_select_path_reads_file_from_disk() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("lesion.jpg");
        std::fs::write(&path, [0xff, 0xd8, 0xff, 0xe0, 0, 0x10]).unwrap();

        let mut capture = controller(Arc::new(ScriptedProvider::default()));
        capture.enter_mode(CaptureMode::FileSelect);
        let artifact = capture.select_path(&path).unwrap();

        assert_eq!(artifact.bytes().len(), 6);
        assert_eq!(
            artifact.source(),
            &ArtifactSource::Selected {
                file_name: "lesion.jpg".into()
            }
        );
    }

    #[test]
    fn test_capture_mode_parses_aliases() {
        assert_eq!("webcam".parse::<CaptureMode>().unwrap(), CaptureMode::LiveFeed);
        assert_eq!("Upload".parse::<CaptureMode>().unwrap(), CaptureMode::FileSelect);
        assert!("scanner".parse::<CaptureMode>().is_err());
    }
}
