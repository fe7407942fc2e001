//! Gemini (Google) image generation and editing provider.

use crate::credential::Credential;
use crate::error::{check_response, GenLabError, Result};
use crate::image::provider::ImageProvider;
use crate::image::types::{GenerationResponse, ImageRequest};
use crate::media::InlineImage;
use crate::DEFAULT_BASE_URL;
use async_trait::async_trait;
use serde::Serialize;

/// Aspect ratio requested for generated images. Edits keep the source framing.
const GENERATE_ASPECT_RATIO: &str = "1:1";

/// Gemini image model variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeminiImageModel {
    /// Nano Banana - Gemini 2.5 Flash Image (fast, economical).
    NanoBanana,
    /// Nano Banana Pro - Gemini 3 Pro Image (highest quality).
    NanoBananaPro,
    /// Any other model identifier.
    Custom(String),
}

impl GeminiImageModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &str {
        match self {
            Self::NanoBanana => "gemini-2.5-flash-image",
            Self::NanoBananaPro => "gemini-3-pro-image-preview",
            Self::Custom(id) => id,
        }
    }
}

/// Builder for [`GeminiImageProvider`].
#[derive(Debug, Clone)]
pub struct GeminiImageProviderBuilder {
    base_url: String,
    generate_model: GeminiImageModel,
    edit_model: GeminiImageModel,
}

impl Default for GeminiImageProviderBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            generate_model: GeminiImageModel::NanoBananaPro,
            edit_model: GeminiImageModel::NanoBanana,
        }
    }
}

impl GeminiImageProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the API root (useful for proxies and tests).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the model used for text-to-image requests.
    pub fn generate_model(mut self, model: GeminiImageModel) -> Self {
        self.generate_model = model;
        self
    }

    /// Sets the model used for edit requests.
    pub fn edit_model(mut self, model: GeminiImageModel) -> Self {
        self.edit_model = model;
        self
    }

    /// Builds the provider.
    pub fn build(self) -> Result<GeminiImageProvider> {
        let client = reqwest::Client::builder().build()?;
        Ok(GeminiImageProvider {
            client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            generate_model: self.generate_model,
            edit_model: self.edit_model,
        })
    }
}

/// Gemini `generateContent` provider.
pub struct GeminiImageProvider {
    client: reqwest::Client,
    base_url: String,
    generate_model: GeminiImageModel,
    edit_model: GeminiImageModel,
}

impl GeminiImageProvider {
    /// Creates a new `GeminiImageProviderBuilder`.
    pub fn builder() -> GeminiImageProviderBuilder {
        GeminiImageProviderBuilder::new()
    }

    /// Returns the model a request will be sent to.
    pub fn model_for(&self, request: &ImageRequest) -> &GeminiImageModel {
        if request.is_edit() {
            &self.edit_model
        } else {
            &self.generate_model
        }
    }
}

#[async_trait]
impl ImageProvider for GeminiImageProvider {
    async fn generate_content(
        &self,
        credential: &Credential,
        request: &ImageRequest,
    ) -> Result<GenerationResponse> {
        let model = self.model_for(request);
        let url = format!("{}/models/{}:generateContent", self.base_url, model.as_str());
        let body = GeminiRequest::from_image_request(request);

        tracing::debug!(model = model.as_str(), edit = request.is_edit(), "sending image request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", credential.expose())
            .json(&body)
            .send()
            .await?;
        let response = check_response(response).await?;

        let text = response.text().await?;
        let parsed: GenerationResponse = serde_json::from_str(&text)?;
        Ok(parsed)
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }

    async fn health_check(&self, credential: &Credential) -> Result<()> {
        let url = format!("{}/models/{}", self.base_url, self.generate_model.as_str());

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", credential.expose())
            .send()
            .await?;

        match response.status().as_u16() {
            401 | 403 => Err(GenLabError::Auth("Invalid API key".into())),
            404 => Err(GenLabError::InvalidRequest(
                "Model not found. Verify the model name is correct.".into(),
            )),
            s if !(200..300).contains(&s) => Err(GenLabError::Api {
                status: s,
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

// Request types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    InlineData {
        inline_data: InlineImage,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    image_config: ImageConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    image_size: Option<&'static str>,
    aspect_ratio: &'static str,
}

impl GeminiRequest {
    fn from_image_request(req: &ImageRequest) -> Self {
        let mut parts = Vec::with_capacity(2);

        // Source image goes before the instruction
        if let Some(image) = &req.input_image {
            parts.push(GeminiRequestPart::InlineData {
                inline_data: image.clone(),
            });
        }
        parts.push(GeminiRequestPart::Text {
            text: req.prompt.clone(),
        });

        let generation_config = (!req.is_edit()).then(|| GeminiConfig {
            image_config: ImageConfig {
                image_size: req.size.map(|s| s.as_str()),
                aspect_ratio: GENERATE_ASPECT_RATIO,
            },
        });

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::types::ImageSize;
    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;
    use serde_json::json;

    fn credential() -> Credential {
        Credential::new("test-key").unwrap()
    }

    #[test]
    fn test_gemini_model_as_str() {
        assert_eq!(GeminiImageModel::NanoBanana.as_str(), "gemini-2.5-flash-image");
        assert_eq!(
            GeminiImageModel::NanoBananaPro.as_str(),
            "gemini-3-pro-image-preview"
        );
        assert_eq!(GeminiImageModel::Custom("x".into()).as_str(), "x");
    }

    #[test]
    fn test_model_selection_by_request_kind() {
        let provider = GeminiImageProvider::builder().build().unwrap();
        let generate = ImageRequest::new("cube");
        let edit = ImageRequest::new("cube").with_input_image(InlineImage::new("image/png", "QQ=="));
        assert_eq!(provider.model_for(&generate), &GeminiImageModel::NanoBananaPro);
        assert_eq!(provider.model_for(&edit), &GeminiImageModel::NanoBanana);
    }

    #[test]
    fn test_generate_request_wire_format() {
        let req = ImageRequest::new("a red cube").with_size(ImageSize::OneK);
        let json = serde_json::to_value(GeminiRequest::from_image_request(&req)).unwrap();

        assert_eq!(
            json,
            json!({
                "contents": [{"parts": [{"text": "a red cube"}]}],
                "generationConfig": {"imageConfig": {"imageSize": "1K", "aspectRatio": "1:1"}}
            })
        );
    }

    #[test]
    fn test_edit_request_puts_image_first_and_omits_config() {
        let req = ImageRequest::new("make it blue")
            .with_input_image(InlineImage::new("image/jpeg", "/9j/"));
        let json = serde_json::to_value(GeminiRequest::from_image_request(&req)).unwrap();

        assert_eq!(
            json,
            json!({
                "contents": [{"parts": [
                    {"inlineData": {"mimeType": "image/jpeg", "data": "/9j/"}},
                    {"text": "make it blue"}
                ]}]
            })
        );
    }

    #[tokio::test]
    async fn test_generate_content_posts_with_key_header() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-3-pro-image-preview:generateContent")
                    .header("x-goog-api-key", "test-key")
                    .body_includes("\"imageSize\":\"2K\"");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(
                        json!({
                            "candidates": [{
                                "content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": "QQ=="}}]},
                                "finishReason": "STOP"
                            }]
                        })
                        .to_string(),
                    );
            })
            .await;

        let provider = GeminiImageProvider::builder()
            .base_url(server.url("/v1beta/"))
            .build()?;
        let resp = provider
            .generate_content(&credential(), &ImageRequest::new("cube").with_size(ImageSize::TwoK))
            .await?;
        mock.assert_async().await;

        assert_eq!(
            resp.first_inline_data_uri().as_deref(),
            Some("data:image/png;base64,QQ==")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_content_maps_http_errors() -> Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(403).body(r#"{"error": {"message": "API key not valid"}}"#);
            })
            .await;

        let provider = GeminiImageProvider::builder()
            .base_url(server.url("/v1beta"))
            .build()?;
        let err = provider
            .generate_content(&credential(), &ImageRequest::new("cube"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenLabError::Auth(ref msg) if msg.contains("API key not valid")));
        Ok(())
    }

    #[tokio::test]
    async fn test_health_check() -> Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1beta/models/gemini-3-pro-image-preview");
                then.status(200).body("{}");
            })
            .await;

        let provider = GeminiImageProvider::builder()
            .base_url(server.url("/v1beta"))
            .build()?;
        provider.health_check(&credential()).await?;
        Ok(())
    }
}
