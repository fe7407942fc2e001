//! Image generation and editing.

mod provider;
pub mod providers;
mod types;

pub use provider::ImageProvider;
pub use types::{
    Candidate, CandidateContent, ContentPart, GenerationResponse, ImageRequest, ImageSize,
    PromptFeedback,
};
