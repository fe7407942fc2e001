//! Veo (Google) image-to-video provider.

use crate::credential::Credential;
use crate::error::{check_response, Result};
use crate::media::InlineImage;
use crate::video::provider::VideoProvider;
use crate::video::types::{VideoJob, VideoRequest};
use crate::DEFAULT_BASE_URL;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Veo model variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VeoModel {
    /// Veo 3.1 Fast Preview.
    #[default]
    Veo31FastPreview,
    /// Veo 3.1 Preview - higher quality, slower.
    Veo31Preview,
    /// Any other model identifier.
    Custom(String),
}

impl VeoModel {
    /// Returns the API model identifier string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Veo31FastPreview => "veo-3.1-fast-generate-preview",
            Self::Veo31Preview => "veo-3.1-generate-preview",
            Self::Custom(id) => id,
        }
    }
}

/// Builder for [`VeoProvider`].
#[derive(Debug, Clone)]
pub struct VeoProviderBuilder {
    base_url: String,
    model: VeoModel,
}

impl Default for VeoProviderBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: VeoModel::default(),
        }
    }
}

impl VeoProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the API root (useful for proxies and tests).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the Veo model variant.
    pub fn model(mut self, model: VeoModel) -> Self {
        self.model = model;
        self
    }

    /// Builds the provider.
    pub fn build(self) -> Result<VeoProvider> {
        let client = reqwest::Client::builder().build()?;
        Ok(VeoProvider {
            client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            model: self.model,
        })
    }
}

/// Veo provider on the Gemini Developer API (`predictLongRunning`).
pub struct VeoProvider {
    client: reqwest::Client,
    base_url: String,
    model: VeoModel,
}

impl VeoProvider {
    /// Creates a new `VeoProviderBuilder`.
    pub fn builder() -> VeoProviderBuilder {
        VeoProviderBuilder::new()
    }

    /// Returns the configured model.
    pub fn model(&self) -> &VeoModel {
        &self.model
    }
}

#[async_trait]
impl VideoProvider for VeoProvider {
    async fn submit(&self, credential: &Credential, request: &VideoRequest) -> Result<VideoJob> {
        let url = format!(
            "{}/models/{}:predictLongRunning",
            self.base_url,
            self.model.as_str()
        );
        let body = VeoRequest::from_video_request(request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", credential.expose())
            .json(&body)
            .send()
            .await?;
        let response = check_response(response).await?;

        let operation: VeoOperationResponse = serde_json::from_str(&response.text().await?)?;
        tracing::debug!(
            operation = %operation.name,
            model = self.model.as_str(),
            aspect_ratio = %request.aspect_ratio,
            "submitted video generation request"
        );
        Ok(operation.into())
    }

    async fn refresh(&self, credential: &Credential, job: &VideoJob) -> Result<VideoJob> {
        let url = format!("{}/{}", self.base_url, job.name.trim_start_matches('/'));

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", credential.expose())
            .send()
            .await?;
        let response = check_response(response).await?;

        let operation: VeoOperationResponse = serde_json::from_str(&response.text().await?)?;
        Ok(operation.into())
    }

    fn name(&self) -> &str {
        "Veo (Google)"
    }
}

// Request types
#[derive(Debug, Serialize)]
struct VeoRequest {
    instances: Vec<VeoInstance>,
    parameters: VeoParameters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoMediaData {
    inline_data: InlineImage,
}

#[derive(Debug, Serialize)]
struct VeoInstance {
    prompt: String,
    image: VeoMediaData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoParameters {
    aspect_ratio: &'static str,
    resolution: String,
    number_of_videos: u32,
}

impl VeoRequest {
    fn from_video_request(req: &VideoRequest) -> Self {
        Self {
            instances: vec![VeoInstance {
                prompt: req.prompt.clone(),
                image: VeoMediaData {
                    inline_data: req.image.clone(),
                },
            }],
            parameters: VeoParameters {
                aspect_ratio: req.aspect_ratio.as_str(),
                resolution: req.resolution.clone(),
                number_of_videos: req.number_of_videos,
            },
        }
    }
}

// Response types
#[derive(Debug, Deserialize)]
struct VeoOperationResponse {
    name: String,
    #[serde(default)]
    done: Option<bool>,
    #[serde(default)]
    response: Option<VeoVideoResponse>,
    #[serde(default)]
    error: Option<VeoError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VeoVideoResponse {
    #[serde(default)]
    generate_video_response: Option<VeoGenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VeoGenerateVideoResponse {
    #[serde(default)]
    generated_samples: Option<Vec<VeoGeneratedSample>>,
    #[serde(default)]
    rai_media_filtered_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct VeoGeneratedSample {
    #[serde(default)]
    video: Option<VeoVideo>,
}

#[derive(Debug, Deserialize)]
struct VeoVideo {
    #[serde(default)]
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VeoError {
    #[serde(default)]
    message: Option<String>,
}

impl From<VeoOperationResponse> for VideoJob {
    fn from(op: VeoOperationResponse) -> Self {
        let generated = op.response.and_then(|r| r.generate_video_response);
        let filtered_count = generated
            .as_ref()
            .and_then(|g| g.rai_media_filtered_count)
            .unwrap_or(0);
        let location = generated
            .and_then(|g| g.generated_samples)
            .and_then(|samples| samples.into_iter().next())
            .and_then(|sample| sample.video)
            .and_then(|video| video.uri);

        VideoJob {
            name: op.name,
            done: op.done.unwrap_or(false),
            location,
            error: op
                .error
                .map(|e| e.message.unwrap_or_else(|| "Unknown error".into())),
            filtered_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenLabError;
    use crate::video::types::VideoAspectRatio;
    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;
    use serde_json::json;

    fn credential() -> Credential {
        Credential::new("test-key").unwrap()
    }

    fn parse(json: &str) -> VideoJob {
        serde_json::from_str::<VeoOperationResponse>(json).unwrap().into()
    }

    #[test]
    fn test_veo_model_as_str() {
        assert_eq!(VeoModel::default().as_str(), "veo-3.1-fast-generate-preview");
        assert_eq!(VeoModel::Veo31Preview.as_str(), "veo-3.1-generate-preview");
    }

    #[test]
    fn test_request_wire_format() {
        let req = VideoRequest::new(
            InlineImage::new("image/jpeg", "/9j/"),
            "",
            VideoAspectRatio::Portrait,
        );
        let json = serde_json::to_value(VeoRequest::from_video_request(&req)).unwrap();

        assert_eq!(
            json,
            json!({
                "instances": [{
                    "prompt": "Animate this image",
                    "image": {"inlineData": {"mimeType": "image/jpeg", "data": "/9j/"}}
                }],
                "parameters": {"aspectRatio": "9:16", "resolution": "720p", "numberOfVideos": 1}
            })
        );
    }

    #[test]
    fn test_operation_not_done() {
        let job = parse(r#"{"name": "operations/123", "done": false}"#);
        assert_eq!(job, VideoJob::pending("operations/123"));

        let job = parse(r#"{"name": "operations/123"}"#);
        assert!(!job.done);
    }

    #[test]
    fn test_operation_done_with_video() {
        let job = parse(
            r#"{
                "name": "operations/123",
                "done": true,
                "response": {
                    "generateVideoResponse": {
                        "generatedSamples": [
                            {"video": {"uri": "https://example.com/first?alt=media"}},
                            {"video": {"uri": "https://example.com/second?alt=media"}}
                        ]
                    }
                }
            }"#,
        );
        assert!(job.done);
        assert_eq!(
            job.location.as_deref(),
            Some("https://example.com/first?alt=media")
        );
    }

    #[test]
    fn test_operation_filtered() {
        let job = parse(
            r#"{
                "name": "operations/123",
                "done": true,
                "response": {"generateVideoResponse": {"raiMediaFilteredCount": 1}}
            }"#,
        );
        assert_eq!(job.filtered_count, 1);
        assert!(matches!(
            job.into_location(),
            Err(GenLabError::ContentBlocked(_))
        ));
    }

    #[test]
    fn test_operation_with_error() {
        let job = parse(
            r#"{"name": "operations/123", "done": true, "error": {"message": "Quota exceeded"}}"#,
        );
        assert_eq!(job.error.as_deref(), Some("Quota exceeded"));
    }

    #[tokio::test]
    async fn test_submit_and_refresh_over_http() -> Result<()> {
        let server = MockServer::start_async().await;
        let submit = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/veo-3.1-fast-generate-preview:predictLongRunning")
                    .header("x-goog-api-key", "test-key")
                    .body_includes("\"aspectRatio\":\"16:9\"");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(json!({"name": "models/veo/operations/op1"}).to_string());
            })
            .await;
        let poll = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v1beta/models/veo/operations/op1")
                    .header("x-goog-api-key", "test-key");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(
                        json!({
                            "name": "models/veo/operations/op1",
                            "done": true,
                            "response": {"generateVideoResponse": {"generatedSamples": [
                                {"video": {"uri": "https://files/v1:download?alt=media"}}
                            ]}}
                        })
                        .to_string(),
                    );
            })
            .await;

        let provider = VeoProvider::builder()
            .base_url(server.url("/v1beta"))
            .build()?;
        let request = VideoRequest::new(
            InlineImage::new("image/png", "QQ=="),
            "waves",
            VideoAspectRatio::Landscape,
        );

        let job = provider.submit(&credential(), &request).await?;
        assert_eq!(job.name, "models/veo/operations/op1");
        assert!(!job.done);

        let job = provider.refresh(&credential(), &job).await?;
        submit.assert_async().await;
        poll.assert_async().await;
        assert_eq!(
            job.into_location()?,
            "https://files/v1:download?alt=media"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_maps_billing_error() -> Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(402).body("payment required");
            })
            .await;

        let provider = VeoProvider::builder()
            .base_url(server.url("/v1beta"))
            .build()?;
        let request = VideoRequest::new(
            InlineImage::new("image/png", "QQ=="),
            "waves",
            VideoAspectRatio::Landscape,
        );
        let err = provider.submit(&credential(), &request).await.unwrap_err();
        assert!(matches!(err, GenLabError::Billing(_)));
        Ok(())
    }
}
