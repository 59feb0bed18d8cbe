use super::live_feed::Frame;
use crate::constants::{FALLBACK_MEDIA_TYPE, JPEG_MEDIA_TYPE};
use crate::ScreeningResult;
use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use oralscan_types::ImageBytes;

/// Where the current image came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    /// A frame sampled from the live preview.
    Snapshot,
    /// A file chosen by the user.
    Selected { file_name: String },
}

/// The single candidate image awaiting, or having undergone, diagnosis.
#[derive(Debug, Clone)]
pub struct CaptureArtifact {
    source: ArtifactSource,
    bytes: ImageBytes,
    media_type: String,
    captured_at: DateTime<Utc>,
}

impl CaptureArtifact {
    /// Encodes a preview frame as JPEG.
    pub fn from_frame(frame: &Frame, jpeg_quality: u8) -> ScreeningResult<Self> {
        let mut jpeg = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, jpeg_quality);
        encoder.encode(
            frame.rgb(),
            frame.width(),
            frame.height(),
            ExtendedColorType::Rgb8,
        )?;

        Ok(Self {
            source: ArtifactSource::Snapshot,
            bytes: ImageBytes::new(jpeg)?,
            media_type: JPEG_MEDIA_TYPE.to_owned(),
            captured_at: Utc::now(),
        })
    }

    /// Wraps a user-selected file.
    ///
    /// The bytes are not validated as an image. The media type is sniffed from the
    /// leading bytes for the multipart header only, falling back to
    /// `application/octet-stream`.
    pub fn from_file(file_name: impl Into<String>, bytes: Vec<u8>) -> ScreeningResult<Self> {
        let bytes = ImageBytes::new(bytes)?;
        let media_type = infer::get(bytes.as_slice())
            .map(|kind| kind.mime_type().to_owned())
            .unwrap_or_else(|| FALLBACK_MEDIA_TYPE.to_owned());

        Ok(Self {
            source: ArtifactSource::Selected {
                file_name: file_name.into(),
            },
            bytes,
            media_type,
            captured_at: Utc::now(),
        })
    }

    pub fn source(&self) -> &ArtifactSource {
        &self.source
    }

    pub fn bytes(&self) -> &ImageBytes {
        &self.bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Short human description, e.g. `snapshot (12840 bytes)`.
    pub fn describe(&self) -> String {
        match &self.source {
            ArtifactSource::Snapshot => format!("snapshot ({} bytes)", self.bytes.len()),
            ArtifactSource::Selected { file_name } => {
                format!("{} ({} bytes, {})", file_name, self.bytes.len(), self.media_type)
            }
        }
    }
}
