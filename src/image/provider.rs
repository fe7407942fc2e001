//! Image provider trait.

use crate::credential::Credential;
use crate::error::Result;
use crate::image::types::{GenerationResponse, ImageRequest};
use async_trait::async_trait;

/// Trait for services that answer image generation and edit requests.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Sends one request and returns the raw candidate list.
    async fn generate_content(
        &self,
        credential: &Credential,
        request: &ImageRequest,
    ) -> Result<GenerationResponse>;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str;

    /// Checks if the provider is reachable and the credential is accepted.
    async fn health_check(&self, credential: &Credential) -> Result<()>;
}
