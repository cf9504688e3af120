//! Submit-and-wait for crew runs.
//!
//! A run is started once, then its status is fetched at a fixed
//! interval until it reaches a terminal state or the wait budget runs
//! out. There is no backoff and no jitter.

use std::future::Future;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::time::Instant;

use super::api_client::StudioClient;
use super::errors::{ApiResult, OrchestrationApiError};
use crate::types::{JobResult, ResourceId, RunStatus};

/// Configuration for the status polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    /// Time slept before each status check.
    pub interval: Duration,
    /// Consecutive failed status checks tolerated before giving up.
    pub max_consecutive_failures: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_consecutive_failures: 3,
        }
    }
}

impl StudioClient {
    pub fn polling_config(&self) -> PollingConfig {
        PollingConfig {
            interval: self.config().poll_interval,
            max_consecutive_failures: self.config().max_poll_failures,
        }
    }

    /// Run a crew and wait for it to finish.
    ///
    /// Returns as soon as a status check reports `completed` or `failed`
    /// (a failed run is a result, not an error). Fails with
    /// [`OrchestrationApiError::Timeout`] once `max_wait` has elapsed.
    pub async fn submit_and_await(&self, crew_id: &ResourceId, max_wait: Duration) -> ApiResult<JobResult> {
        self.submit_and_await_with_inputs(crew_id, &Map::new(), max_wait)
            .await
    }

    /// Like [`submit_and_await`](Self::submit_and_await), forwarding
    /// `inputs` to the run.
    pub async fn submit_and_await_with_inputs(
        &self,
        crew_id: &ResourceId,
        inputs: &Map<String, Value>,
        max_wait: Duration,
    ) -> ApiResult<JobResult> {
        let job_id = self.submit_run(crew_id, inputs).await?;
        tracing::info!(crew = %crew_id, job = %job_id, "crew run submitted, polling for results");
        self.await_job(&job_id, max_wait).await
    }

    /// Poll an already submitted job until it is terminal or `max_wait`
    /// has elapsed.
    pub async fn await_job(&self, job_id: &ResourceId, max_wait: Duration) -> ApiResult<JobResult> {
        poll_job(job_id, self.polling_config(), max_wait, || self.run_status(job_id)).await
    }
}

/// The polling loop, over any source of status payloads.
///
/// Sleeps `polling.interval` before every check. More than
/// `max_consecutive_failures` failed checks in a row end the wait with
/// [`OrchestrationApiError::PollingFailed`].
pub(crate) async fn poll_job<F, Fut>(
    job_id: &ResourceId,
    polling: PollingConfig,
    max_wait: Duration,
    mut check: F,
) -> ApiResult<JobResult>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ApiResult<Value>>,
{
    let started = Instant::now();
    let mut polls: u32 = 0;
    let mut failures: u32 = 0;

    while started.elapsed() < max_wait {
        tokio::time::sleep(polling.interval).await;
        polls += 1;

        let payload = match check().await {
            Ok(payload) => {
                failures = 0;
                payload
            }
            Err(err) => {
                failures += 1;
                tracing::warn!(job = %job_id, attempt = polls, failures, error = %err, "status check failed");
                if failures > polling.max_consecutive_failures {
                    return Err(OrchestrationApiError::PollingFailed {
                        job_id: job_id.to_string(),
                        failures,
                        last: Box::new(err),
                    });
                }
                continue;
            }
        };

        let status = RunStatus::from_payload(&payload);
        tracing::debug!(job = %job_id, attempt = polls, status = %status, "run status");
        if status.is_terminal() {
            let result = JobResult::from_payload(job_id.clone(), payload, polls, started.elapsed());
            match status {
                RunStatus::Completed => tracing::info!(job = %job_id, polls, "crew run completed"),
                _ => tracing::warn!(
                    job = %job_id,
                    error = result.error.as_deref().unwrap_or("unknown error"),
                    "crew run failed"
                ),
            }
            return Ok(result);
        }
    }

    Err(OrchestrationApiError::Timeout {
        job_id: job_id.to_string(),
        waited: max_wait,
        polls,
    })
}
