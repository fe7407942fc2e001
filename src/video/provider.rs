//! Video provider trait.

use crate::credential::Credential;
use crate::error::Result;
use crate::video::types::{VideoJob, VideoRequest};
use async_trait::async_trait;

/// Trait for services that run video generation as a long-running job.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Submits a job and returns its first status snapshot.
    async fn submit(&self, credential: &Credential, request: &VideoRequest) -> Result<VideoJob>;

    /// Re-queries the status of a submitted job.
    async fn refresh(&self, credential: &Credential, job: &VideoJob) -> Result<VideoJob>;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str;
}
