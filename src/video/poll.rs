//! Polling a submitted video job until it resolves.

use crate::credential::Credential;
use crate::error::{GenLabError, Result};
use crate::video::provider::VideoProvider;
use crate::video::types::{VideoJob, VideoRequest};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Delay between status queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Lifecycle of a video job as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    /// Accepted by the service, not yet re-queried.
    Submitted,
    /// Waiting for the service to report completion.
    Polling,
    /// Completed; a result location may be extracted.
    Done,
    /// Terminal failure.
    Failed,
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Submitted => "submitted",
            Self::Polling => "polling",
            Self::Done => "done",
            Self::Failed => "failed",
        })
    }
}

/// How to wait for a job.
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Fixed delay between status queries.
    pub interval: Duration,
    /// Give up with [`GenLabError::Timeout`] after this long. `None` waits forever.
    pub max_wait: Option<Duration>,
    /// Abort with [`GenLabError::Cancelled`] when triggered.
    pub cancel: Option<CancellationToken>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_wait: None,
            cancel: None,
        }
    }
}

impl PollOptions {
    /// Sets the delay between status queries.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the maximum total wait.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Sets the cancellation token.
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Submits `request` and waits for the job under a single deadline.
///
/// `options.max_wait` covers the submission as well as the polling, and the
/// cancellation token can abort either.
pub async fn submit_and_wait(
    provider: &dyn VideoProvider,
    credential: &Credential,
    request: &VideoRequest,
    options: &PollOptions,
) -> Result<VideoJob> {
    let start = Instant::now();
    let job = guarded(options, start, provider.submit(credential, request)).await??;
    tracing::debug!(operation = %job.name, "video job submitted");
    poll_from(provider, credential, job, options, start).await
}

/// Re-queries `job` every `options.interval` until the service reports it done.
///
/// Returns the finished snapshot; use [`VideoJob::into_location`] to extract
/// the result. A job that reports an error while still running fails
/// immediately. A status query still outstanding when `options.max_wait`
/// runs out is abandoned.
pub async fn wait_for_job(
    provider: &dyn VideoProvider,
    credential: &Credential,
    job: VideoJob,
    options: &PollOptions,
) -> Result<VideoJob> {
    poll_from(provider, credential, job, options, Instant::now()).await
}

async fn poll_from(
    provider: &dyn VideoProvider,
    credential: &Credential,
    mut job: VideoJob,
    options: &PollOptions,
    start: Instant,
) -> Result<VideoJob> {
    let mut phase = JobPhase::Submitted;
    let mut polls = 0u32;

    while !job.done {
        if let Some(message) = job.error.take() {
            log_transition(&job.name, phase, JobPhase::Failed);
            return Err(GenLabError::VideoGeneration(message));
        }
        if phase == JobPhase::Submitted {
            log_transition(&job.name, phase, JobPhase::Polling);
            phase = JobPhase::Polling;
        }

        let delay = match options.max_wait {
            Some(max_wait) => {
                let elapsed = start.elapsed();
                if elapsed >= max_wait {
                    log_transition(&job.name, phase, JobPhase::Failed);
                    return Err(GenLabError::Timeout(max_wait));
                }
                options.interval.min(max_wait - elapsed)
            }
            None => options.interval,
        };

        cancellable(options.cancel.as_ref(), tokio::time::sleep(delay)).await?;

        if let Some(max_wait) = options.max_wait {
            if start.elapsed() >= max_wait {
                log_transition(&job.name, phase, JobPhase::Failed);
                return Err(GenLabError::Timeout(max_wait));
            }
        }

        polls += 1;
        job = match guarded(options, start, provider.refresh(credential, &job)).await {
            Ok(refreshed) => refreshed?,
            Err(e) => {
                log_transition(&job.name, phase, JobPhase::Failed);
                return Err(e);
            }
        };
        tracing::debug!(
            operation = %job.name,
            polls,
            elapsed_secs = start.elapsed().as_secs(),
            done = job.done,
            "polled video job"
        );
    }

    log_transition(&job.name, phase, JobPhase::Done);
    tracing::info!(
        operation = %job.name,
        polls,
        elapsed_secs = start.elapsed().as_secs(),
        "video job finished"
    );
    Ok(job)
}

/// Runs `fut` until it finishes, the token fires, or `max_wait` past `start` elapses.
async fn guarded<F: Future>(options: &PollOptions, start: Instant, fut: F) -> Result<F::Output> {
    let fut = cancellable(options.cancel.as_ref(), fut);
    match options.max_wait {
        Some(max_wait) => tokio::time::timeout_at(start + max_wait, fut)
            .await
            .map_err(|_| GenLabError::Timeout(max_wait))?,
        None => fut.await,
    }
}

async fn cancellable<F: Future>(token: Option<&CancellationToken>, fut: F) -> Result<F::Output> {
    match token {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(GenLabError::Cancelled),
            out = fut => Ok(out),
        },
        None => Ok(fut.await),
    }
}

fn log_transition(operation: &str, from: JobPhase, to: JobPhase) {
    tracing::debug!(operation, %from, %to, "video job phase change");
}
