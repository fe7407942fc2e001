//! Image-to-video generation as a long-running job.

mod poll;
mod provider;
pub mod providers;
mod types;

pub use poll::{submit_and_wait, wait_for_job, JobPhase, PollOptions, DEFAULT_POLL_INTERVAL};
pub use provider::VideoProvider;
pub use types::{
    playable_uri, VideoAspectRatio, VideoJob, VideoRequest, DEFAULT_VIDEO_PROMPT, VIDEO_COUNT,
    VIDEO_RESOLUTION,
};
