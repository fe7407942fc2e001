//! The three user-facing operations: generate, edit and animate.

use crate::credential::Credential;
use crate::error::{GenLabError, Result};
use crate::image::providers::GeminiImageProvider;
use crate::image::{ImageProvider, ImageRequest, ImageSize};
use crate::media::InlineImage;
use crate::video::providers::VeoProvider;
use crate::video::{
    playable_uri, submit_and_wait, PollOptions, VideoAspectRatio, VideoProvider, VideoRequest,
    DEFAULT_POLL_INTERVAL,
};
use crate::DEFAULT_BASE_URL;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Builder for [`Lab`].
pub struct LabBuilder {
    base_url: String,
    image_provider: Option<Arc<dyn ImageProvider>>,
    video_provider: Option<Arc<dyn VideoProvider>>,
    poll_interval: Duration,
    max_wait: Option<Duration>,
}

impl Default for LabBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            image_provider: None,
            video_provider: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: None,
        }
    }
}

impl LabBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the API root used by the default providers.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Uses a custom image provider instead of Gemini.
    pub fn image_provider(mut self, provider: Arc<dyn ImageProvider>) -> Self {
        self.image_provider = Some(provider);
        self
    }

    /// Uses a custom video provider instead of Veo.
    pub fn video_provider(mut self, provider: Arc<dyn VideoProvider>) -> Self {
        self.video_provider = Some(provider);
        self
    }

    /// Sets the delay between video job status queries.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the maximum time to wait for a video job. Unbounded by default.
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Builds the lab, creating default providers where none were given.
    pub fn build(self) -> Result<Lab> {
        let image = match self.image_provider {
            Some(provider) => provider,
            None => Arc::new(
                GeminiImageProvider::builder()
                    .base_url(&self.base_url)
                    .build()?,
            ),
        };
        let video = match self.video_provider {
            Some(provider) => provider,
            None => Arc::new(VeoProvider::builder().base_url(&self.base_url).build()?),
        };

        Ok(Lab {
            image,
            video,
            poll_interval: self.poll_interval,
            max_wait: self.max_wait,
        })
    }
}

/// Entry point for image generation, image editing and image-to-video.
///
/// Every operation takes the credential explicitly, so a key change takes
/// effect on the next call. Images come back as `data:` URIs; videos as a
/// playable URL with the key attached.
#[derive(Clone)]
pub struct Lab {
    image: Arc<dyn ImageProvider>,
    video: Arc<dyn VideoProvider>,
    poll_interval: Duration,
    max_wait: Option<Duration>,
}

impl Lab {
    /// Creates a new `LabBuilder`.
    pub fn builder() -> LabBuilder {
        LabBuilder::new()
    }

    /// Generates a square image from a text prompt.
    pub async fn generate_image(
        &self,
        credential: &Credential,
        prompt: &str,
        size: ImageSize,
    ) -> Result<String> {
        let request = ImageRequest::new(prompt).with_size(size);
        self.run_image_request(credential, &request, "image").await
    }

    /// Edits an image (given as a data URI) following a text instruction.
    pub async fn edit_image(
        &self,
        credential: &Credential,
        image: &str,
        prompt: &str,
    ) -> Result<String> {
        let request =
            ImageRequest::new(prompt).with_input_image(InlineImage::from_data_uri(image));
        self.run_image_request(credential, &request, "edited image")
            .await
    }

    /// Animates an image (given as a data URI) and returns a playable URL.
    ///
    /// Waits for the job without limit unless a maximum wait was configured.
    /// The maximum wait and `cancel` cover the submission too.
    pub async fn generate_video(
        &self,
        credential: &Credential,
        image: &str,
        prompt: &str,
        aspect_ratio: VideoAspectRatio,
        cancel: Option<CancellationToken>,
    ) -> Result<String> {
        let start = Instant::now();
        let request = VideoRequest::new(InlineImage::from_data_uri(image), prompt, aspect_ratio);

        let mut options = PollOptions::default().with_interval(self.poll_interval);
        options.max_wait = self.max_wait;
        options.cancel = cancel;
        let job = submit_and_wait(self.video.as_ref(), credential, &request, &options).await?;

        let location = job.into_location()?;
        tracing::info!(
            provider = self.video.name(),
            duration_ms = start.elapsed().as_millis() as u64,
            "video ready"
        );
        Ok(playable_uri(&location, credential))
    }

    /// Checks that the image service accepts the credential.
    pub async fn health_check(&self, credential: &Credential) -> Result<()> {
        self.image.health_check(credential).await
    }

    async fn run_image_request(
        &self,
        credential: &Credential,
        request: &ImageRequest,
        what: &'static str,
    ) -> Result<String> {
        let start = Instant::now();
        let response = self.image.generate_content(credential, request).await?;

        if let Some(uri) = response.first_inline_data_uri() {
            tracing::info!(
                provider = self.image.name(),
                edit = request.is_edit(),
                duration_ms = start.elapsed().as_millis() as u64,
                "image ready"
            );
            return Ok(uri);
        }
        match response.block_message() {
            Some(message) => Err(GenLabError::ContentBlocked(message)),
            None => Err(GenLabError::NoMedia(what)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{Candidate, CandidateContent, ContentPart, GenerationResponse};
    use crate::video::VideoJob;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeImages {
        response: GenerationResponse,
        seen: Mutex<Vec<ImageRequest>>,
    }

    #[async_trait]
    impl ImageProvider for FakeImages {
        async fn generate_content(
            &self,
            _: &Credential,
            request: &ImageRequest,
        ) -> Result<GenerationResponse> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.response.clone())
        }

        fn name(&self) -> &str {
            "fake"
        }

        async fn health_check(&self, _: &Credential) -> Result<()> {
            Ok(())
        }
    }

    /// Pending on submit and for `pending_polls` refreshes, then done.
    struct FakeVideo {
        pending_polls: u32,
        location: Option<&'static str>,
        refreshes: Mutex<u32>,
        submitted: Mutex<Option<VideoRequest>>,
    }

    impl FakeVideo {
        fn new(pending_polls: u32, location: Option<&'static str>) -> Self {
            Self {
                pending_polls,
                location,
                refreshes: Mutex::new(0),
                submitted: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl VideoProvider for FakeVideo {
        async fn submit(&self, _: &Credential, request: &VideoRequest) -> Result<VideoJob> {
            *self.submitted.lock().unwrap() = Some(request.clone());
            Ok(VideoJob::pending("operations/fake"))
        }

        async fn refresh(&self, _: &Credential, job: &VideoJob) -> Result<VideoJob> {
            let mut refreshes = self.refreshes.lock().unwrap();
            *refreshes += 1;
            if *refreshes <= self.pending_polls {
                return Ok(VideoJob::pending(job.name.clone()));
            }
            Ok(VideoJob {
                done: true,
                location: self.location.map(String::from),
                ..VideoJob::pending(job.name.clone())
            })
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn inline_response(mime: &str, data: &str) -> GenerationResponse {
        GenerationResponse {
            candidates: vec![Candidate {
                content: Some(CandidateContent {
                    parts: vec![ContentPart {
                        text: None,
                        inline_data: Some(InlineImage::new(mime, data)),
                    }],
                }),
                finish_reason: Some("STOP".into()),
            }],
            prompt_feedback: None,
        }
    }

    fn lab(images: Arc<FakeImages>, video: Arc<FakeVideo>) -> Lab {
        Lab::builder()
            .image_provider(images)
            .video_provider(video)
            .build()
            .unwrap()
    }

    fn key() -> Credential {
        Credential::new("secret").unwrap()
    }

    #[tokio::test]
    async fn test_generate_image_returns_data_uri() {
        let images = Arc::new(FakeImages {
            response: inline_response("image/png", "QQ=="),
            ..Default::default()
        });
        let lab = lab(images.clone(), Arc::new(FakeVideo::new(0, None)));

        let uri = lab
            .generate_image(&key(), "a red cube", ImageSize::OneK)
            .await
            .unwrap();
        assert_eq!(uri, "data:image/png;base64,QQ==");

        let seen = images.seen.lock().unwrap();
        assert_eq!(seen[0].prompt, "a red cube");
        assert_eq!(seen[0].size, Some(ImageSize::OneK));
        assert!(!seen[0].is_edit());
    }

    #[tokio::test]
    async fn test_zero_candidates_is_an_error() {
        let lab = lab(
            Arc::new(FakeImages::default()),
            Arc::new(FakeVideo::new(0, None)),
        );

        let err = lab
            .generate_image(&key(), "a red cube", ImageSize::OneK)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "no image generated");

        let err = lab
            .edit_image(&key(), "data:image/png;base64,QQ==", "make it blue")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "no edited image generated");
    }

    #[tokio::test]
    async fn test_edit_image_strips_prefix() {
        let images = Arc::new(FakeImages {
            response: inline_response("image/jpeg", "/9j/"),
            ..Default::default()
        });
        let lab = lab(images.clone(), Arc::new(FakeVideo::new(0, None)));

        let uri = lab
            .edit_image(&key(), "data:image/webp;base64,UklG", "add a hat")
            .await
            .unwrap();
        assert_eq!(uri, "data:image/jpeg;base64,/9j/");

        let seen = images.seen.lock().unwrap();
        assert_eq!(
            seen[0].input_image,
            Some(InlineImage::new("image/webp", "UklG"))
        );
        assert_eq!(seen[0].size, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_video_polls_and_attaches_key() {
        let video = Arc::new(FakeVideo::new(1, Some("https://files/abc:download?alt=media")));
        let lab = lab(Arc::new(FakeImages::default()), video.clone());

        let uri = lab
            .generate_video(
                &key(),
                "data:image/jpeg;base64,/9j/",
                "",
                VideoAspectRatio::Portrait,
                None,
            )
            .await
            .unwrap();

        assert_eq!(uri, "https://files/abc:download?alt=media&key=secret");
        assert_eq!(*video.refreshes.lock().unwrap(), 2);

        let submitted = video.submitted.lock().unwrap().clone().unwrap();
        assert_eq!(submitted.prompt, "Animate this image");
        assert_eq!(submitted.image, InlineImage::new("image/jpeg", "/9j/"));
        assert_eq!(submitted.aspect_ratio, VideoAspectRatio::Portrait);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_video_without_location_fails() {
        let lab = lab(
            Arc::new(FakeImages::default()),
            Arc::new(FakeVideo::new(0, None)),
        );

        let err = lab
            .generate_video(&key(), "QQ==", "go", VideoAspectRatio::Landscape, None)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("video generation failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_video_respects_max_wait() {
        let lab = Lab::builder()
            .image_provider(Arc::new(FakeImages::default()))
            .video_provider(Arc::new(FakeVideo::new(u32::MAX, None)))
            .max_wait(Duration::from_secs(30))
            .build()
            .unwrap();

        let err = lab
            .generate_video(&key(), "QQ==", "go", VideoAspectRatio::Landscape, None)
            .await
            .unwrap_err();
        assert!(matches!(err, GenLabError::Timeout(_)));
    }
}
