//! Core types for image-to-video generation.

use crate::credential::Credential;
use crate::error::{GenLabError, Result};
use crate::media::InlineImage;
use serde::{Deserialize, Serialize};

/// Prompt sent when the caller leaves it empty.
pub const DEFAULT_VIDEO_PROMPT: &str = "Animate this image";

/// Resolution tier requested for every video.
pub const VIDEO_RESOLUTION: &str = "720p";

/// Number of videos requested per job.
pub const VIDEO_COUNT: u32 = 1;

/// Aspect ratios supported for video output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoAspectRatio {
    /// 16:9 landscape.
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16 portrait.
    #[serde(rename = "9:16")]
    Portrait,
}

impl VideoAspectRatio {
    /// Returns the aspect ratio as a string (e.g., "16:9").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
        }
    }
}

impl std::fmt::Display for VideoAspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to animate a still image.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoRequest {
    /// The text prompt describing the motion.
    pub prompt: String,
    /// First frame.
    pub image: InlineImage,
    /// Output aspect ratio.
    pub aspect_ratio: VideoAspectRatio,
    /// Resolution tier, e.g. "720p".
    pub resolution: String,
    /// Number of videos to generate.
    pub number_of_videos: u32,
}

impl VideoRequest {
    /// Creates an image-to-video request with the fixed count and resolution.
    ///
    /// An empty or blank prompt becomes [`DEFAULT_VIDEO_PROMPT`].
    pub fn new(image: InlineImage, prompt: &str, aspect_ratio: VideoAspectRatio) -> Self {
        let prompt = if prompt.trim().is_empty() {
            DEFAULT_VIDEO_PROMPT
        } else {
            prompt
        };
        Self {
            prompt: prompt.to_string(),
            image,
            aspect_ratio,
            resolution: VIDEO_RESOLUTION.to_string(),
            number_of_videos: VIDEO_COUNT,
        }
    }
}

/// Snapshot of a long-running video job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoJob {
    /// Operation name used to query status.
    pub name: String,
    /// Whether the service reports the job finished.
    pub done: bool,
    /// Location of the first generated video, once done.
    pub location: Option<String>,
    /// Error reported by the service, if the job failed.
    pub error: Option<String>,
    /// Number of results removed by safety filters.
    pub filtered_count: u32,
}

impl VideoJob {
    /// Creates a job that has not finished yet.
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Creates a finished job with the given result location.
    pub fn completed(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: true,
            location: Some(location.into()),
            ..Default::default()
        }
    }

    /// Extracts the result location from a finished job.
    pub fn into_location(self) -> Result<String> {
        if let Some(message) = self.error {
            return Err(GenLabError::VideoGeneration(message));
        }
        match self.location {
            Some(location) => Ok(location),
            None if self.filtered_count > 0 => Err(GenLabError::ContentBlocked(
                "video was filtered by Veo safety filters".into(),
            )),
            None => Err(GenLabError::VideoGeneration(
                "no video location in completed job".into(),
            )),
        }
    }
}

/// Appends the credential as a `key` query parameter so a media player can
/// fetch the video directly.
pub fn playable_uri(location: &str, credential: &Credential) -> String {
    let separator = if location.contains('?') { '&' } else { '?' };
    format!("{location}{separator}key={}", credential.expose())
}
