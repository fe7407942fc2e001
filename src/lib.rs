#![warn(missing_docs)]
//! GenLab - image generation, image editing and image-to-video on Google's
//! Gemini and Veo APIs.
//!
//! # Quick Start
//!
//! ```no_run
//! use genlab::{Credential, ImageSize, Lab, VideoAspectRatio};
//!
//! #[tokio::main]
//! async fn main() -> genlab::Result<()> {
//!     let key = Credential::from_env()?;
//!     let lab = Lab::builder().build()?;
//!
//!     let image = lab.generate_image(&key, "A red cube", ImageSize::OneK).await?;
//!     let edited = lab.edit_image(&key, &image, "Make it glass").await?;
//!     let video = lab
//!         .generate_video(&key, &edited, "Slowly rotate", VideoAspectRatio::Landscape, None)
//!         .await?;
//!     println!("{video}");
//!     Ok(())
//! }
//! ```
//!
//! Images are returned as `data:<mime>;base64,<payload>` URIs. Videos are
//! returned as a URL with the API key attached, ready for a media player.

mod error;

pub mod credential;
pub mod image;
pub mod lab;
pub mod media;
pub mod session;
pub mod video;

/// Root of the Gemini Developer API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// Re-export error types at crate root
pub use error::{GenLabError, Result};

pub use credential::{Credential, CredentialGate, CredentialHost, EnvCredentialHost};
pub use image::providers::{GeminiImageModel, GeminiImageProvider, GeminiImageProviderBuilder};
pub use image::{GenerationResponse, ImageProvider, ImageRequest, ImageSize};
pub use lab::{Lab, LabBuilder};
pub use media::{ImageFormat, InlineImage};
pub use session::{Form, FormState, Session, Tool};
pub use video::providers::{VeoModel, VeoProvider, VeoProviderBuilder};
pub use video::{
    JobPhase, PollOptions, VideoAspectRatio, VideoJob, VideoProvider, VideoRequest,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::credential::{Credential, CredentialGate, CredentialHost};
    pub use crate::error::{GenLabError, Result};
    pub use crate::image::{ImageProvider, ImageSize};
    pub use crate::lab::Lab;
    pub use crate::video::{VideoAspectRatio, VideoProvider};
}
