//! Core types for image generation and editing.

use crate::media::{to_data_uri, InlineImage};
use serde::{Deserialize, Serialize};

/// Output resolution class for generated images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageSize {
    /// About 1024 pixels on the long edge.
    #[default]
    #[serde(rename = "1K")]
    OneK,
    /// About 2048 pixels on the long edge.
    #[serde(rename = "2K")]
    TwoK,
    /// About 4096 pixels on the long edge.
    #[serde(rename = "4K")]
    FourK,
}

impl ImageSize {
    /// Returns the size tag sent to the API (e.g., "1K").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneK => "1K",
            Self::TwoK => "2K",
            Self::FourK => "4K",
        }
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to generate or edit an image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    /// The text prompt or edit instruction.
    pub prompt: String,
    /// Output resolution class.
    pub size: Option<ImageSize>,
    /// Source image for instruction-guided editing.
    pub input_image: Option<InlineImage>,
}

impl ImageRequest {
    /// Creates a new request with the given prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            size: None,
            input_image: None,
        }
    }

    /// Sets the output resolution class.
    pub fn with_size(mut self, size: ImageSize) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets an input image to edit.
    pub fn with_input_image(mut self, image: InlineImage) -> Self {
        self.input_image = Some(image);
        self
    }

    /// Returns true if this is an editing request.
    pub fn is_edit(&self) -> bool {
        self.input_image.is_some()
    }
}

/// A `generateContent` response, as returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    /// Candidates in service order.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Present when the prompt itself was rejected.
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// One response candidate.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Candidate content; absent when generation stopped early.
    #[serde(default)]
    pub content: Option<CandidateContent>,
    /// Why generation stopped (e.g. `STOP`, `IMAGE_SAFETY`).
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Content of a candidate.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CandidateContent {
    /// Parts in service order.
    #[serde(default)]
    pub parts: Vec<ContentPart>,
}

/// A single text or inline-media part.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPart {
    /// Text output, if any.
    #[serde(default)]
    pub text: Option<String>,
    /// Inline media payload, if any.
    #[serde(default)]
    pub inline_data: Option<InlineImage>,
}

/// Prompt-level block information.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Block reason code, e.g. `SAFETY`.
    #[serde(default)]
    pub block_reason: Option<String>,
    /// Human-readable block message.
    #[serde(default)]
    pub block_reason_message: Option<String>,
}

impl GenerationResponse {
    /// Returns the first inline payload across all candidates and parts.
    pub fn first_inline_data(&self) -> Option<&InlineImage> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|content| content.parts.iter())
            .find_map(|part| part.inline_data.as_ref())
    }

    /// Returns the first inline payload as a `data:` URI.
    pub fn first_inline_data_uri(&self) -> Option<String> {
        self.first_inline_data()
            .map(|inline| to_data_uri(&inline.mime_type, &inline.data))
    }

    /// Explains why no media came back, when the service said so.
    pub fn block_message(&self) -> Option<String> {
        if let Some(feedback) = &self.prompt_feedback {
            if let Some(reason) = &feedback.block_reason {
                return Some(
                    feedback
                        .block_reason_message
                        .clone()
                        .unwrap_or_else(|| format!("prompt blocked: {reason}")),
                );
            }
        }
        self.candidates
            .iter()
            .filter_map(|c| c.finish_reason.as_deref())
            .find(|reason| is_safety_finish_reason(reason))
            .map(|reason| format!("blocked by safety filter: {reason}"))
    }
}

fn is_safety_finish_reason(reason: &str) -> bool {
    matches!(
        reason,
        "SAFETY"
            | "IMAGE_SAFETY"
            | "IMAGE_PROHIBITED_CONTENT"
            | "IMAGE_RECITATION"
            | "RECITATION"
            | "PROHIBITED_CONTENT"
            | "BLOCKLIST"
    )
}
