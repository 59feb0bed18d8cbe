//! Live-feed capability boundary.
//!
//! The environment (a camera, a frame grabber, a test double) is reached through
//! [`LiveFeedProvider`]. A granted acquisition yields a [`LiveFeed`], which the
//! capture controller wraps in a [`LiveFeedHandle`] so the feed is stopped exactly
//! once on every exit path, including drop.

use crate::{ScreeningError, ScreeningResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// One raw preview frame: tightly packed 8-bit RGB, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
}

impl Frame {
    /// Wraps an RGB buffer, checking it matches the dimensions.
    pub fn from_rgb(width: u32, height: u32, rgb: Vec<u8>) -> ScreeningResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|px| px.checked_mul(3));
        if width == 0 || height == 0 || expected != Some(rgb.len()) {
            return Err(ScreeningError::InvalidFrame { width, height });
        }
        Ok(Self { width, height, rgb })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgb(&self) -> &[u8] {
        &self.rgb
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frame({}x{})", self.width, self.height)
    }
}

/// A granted, continuously updating preview.
pub trait LiveFeed: Send {
    /// Samples the most recent frame. `Ok(None)` means no frame has arrived yet.
    fn current_frame(&mut self) -> ScreeningResult<Option<Frame>>;

    /// Stops every acquired track. Called once by [`LiveFeedHandle`].
    fn stop(&mut self) -> ScreeningResult<()>;
}

/// Source of live-feed acquisitions.
///
/// `acquire` is the suspension point where the environment may prompt the user for
/// permission. Denial is reported as `ScreeningError::LiveFeedDenied`, a missing
/// or broken device as `ScreeningError::LiveFeedUnavailable`.
#[async_trait]
pub trait LiveFeedProvider: Send + Sync {
    async fn acquire(&self) -> ScreeningResult<Box<dyn LiveFeed>>;
}

/// Exclusive owner of at most one acquired feed.
#[derive(Default)]
pub struct LiveFeedHandle {
    feed: Option<Box<dyn LiveFeed>>,
}

impl LiveFeedHandle {
    pub fn new(feed: Box<dyn LiveFeed>) -> Self {
        Self { feed: Some(feed) }
    }

    pub fn is_active(&self) -> bool {
        self.feed.is_some()
    }

    pub fn current_frame(&mut self) -> ScreeningResult<Option<Frame>> {
        match self.feed.as_mut() {
            Some(feed) => feed.current_frame(),
            None => Err(ScreeningError::NoPreview),
        }
    }

    /// Stops and drops the feed, if any. A failed stop is logged and swallowed: the
    /// tracks may leak, but the session carries on.
    pub fn release(&mut self) {
        if let Some(mut feed) = self.feed.take() {
            match feed.stop() {
                Ok(()) => tracing::debug!("live feed released"),
                Err(e) => tracing::warn!("failed to stop live feed tracks: {}", e),
            }
        }
    }
}

impl Drop for LiveFeedHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for LiveFeedHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveFeedHandle")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Provider for environments without a camera. Every acquisition is denied.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCameraProvider;

#[async_trait]
impl LiveFeedProvider for NoCameraProvider {
    async fn acquire(&self) -> ScreeningResult<Box<dyn LiveFeed>> {
        Err(ScreeningError::LiveFeedDenied(
            "no camera is available in this environment".into(),
        ))
    }
}

/// Treats an image file on disk as a live preview.
///
/// An external grabber keeps overwriting the file; every sample re-decodes it, so
/// a snapshot picks up whatever frame was written last. Acquisition is granted only
/// if the file exists.
#[derive(Clone, Debug)]
pub struct FrameFileProvider {
    path: PathBuf,
}

impl FrameFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LiveFeedProvider for FrameFileProvider {
    async fn acquire(&self) -> ScreeningResult<Box<dyn LiveFeed>> {
        if !self.path.is_file() {
            return Err(ScreeningError::LiveFeedDenied(format!(
                "frame source {} does not exist",
                self.path.display()
            )));
        }
        Ok(Box::new(FrameFileFeed {
            path: self.path.clone(),
            stopped: false,
        }))
    }
}

struct FrameFileFeed {
    path: PathBuf,
    stopped: bool,
}

impl LiveFeed for FrameFileFeed {
    fn current_frame(&mut self) -> ScreeningResult<Option<Frame>> {
        if self.stopped || !self.path.is_file() {
            return Ok(None);
        }
        let rgb = image::open(&self.path)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        Frame::from_rgb(width, height, rgb.into_raw()).map(Some)
    }

    fn stop(&mut self) -> ScreeningResult<()> {
        self.stopped = true;
        Ok(())
    }
}
