//! Adaptive polling of a save job until it reaches a terminal state.
//!
//! One [`PollingEngine::run`] call owns its start time, interval and last
//! progress text. Nothing is shared between runs, so concurrent jobs can each
//! drive their own engine.

use std::time::Duration;

use crate::clock::{Clock, TokioClock};
use crate::progress::{ProgressSink, progress_text};
use crate::retry::{NextWait, RetryPolicy};
use crate::{JobStatus, SaveClient, SaveError};

pub struct PollingEngine<K = TokioClock> {
    policy: RetryPolicy,
    clock: K,
}

impl Default for PollingEngine<TokioClock> {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), TokioClock)
    }
}

impl<K: Clock> PollingEngine<K> {
    pub fn new(policy: RetryPolicy, clock: K) -> Self {
        Self { policy, clock }
    }

    /// Poll `job_id` until success or error, or until `deadline` elapses.
    ///
    /// Never returns a pending status: running out of time while the job is
    /// still pending (or still failing with retryable errors) is reported as
    /// [`SaveError::Timeout`]. A status check still in flight when the deadline
    /// passes is abandoned.
    pub async fn run<C>(
        &self,
        client: &C,
        job_id: &str,
        deadline: Duration,
        sink: &dyn ProgressSink,
    ) -> Result<JobStatus, SaveError>
    where
        C: SaveClient + ?Sized,
    {
        let start = self.clock.now();
        let mut last_text: Option<String> = None;
        let mut last_message: Option<String> = None;

        loop {
            let elapsed = self.clock.now().saturating_duration_since(start);
            if elapsed >= deadline {
                break;
            }

            let polled = tokio::select! {
                biased;
                res = client.poll_status(job_id) => res,
                _ = self.clock.sleep(deadline - elapsed) => {
                    tracing::warn!(job_id, "status check still running at deadline");
                    break;
                }
            };

            let hint = match polled {
                Ok(status) if !status.status.is_terminal() => {
                    let text = progress_text(&status);
                    if last_text.as_deref() != Some(text.as_str()) {
                        sink.emit(&text);
                        last_text = Some(text);
                    }
                    last_message = status.message.clone();
                    status.retry_after
                }
                Ok(status) => {
                    tracing::info!(job_id, status = ?status.status, "job finished");
                    return Ok(status);
                }
                Err(err) if err.is_retryable_for(job_id) => {
                    tracing::warn!(job_id, error = %err, "status check failed, will retry");
                    if let SaveError::Service(status) = &err {
                        last_message = status.message.clone();
                    }
                    err.retry_after()
                }
                Err(err) => return Err(err),
            };

            let elapsed = self.clock.now().saturating_duration_since(start);
            match self.policy.next_wait(hint, elapsed, deadline) {
                NextWait::Sleep(wait) => {
                    let wait_ms = wait.as_millis() as u64;
                    tracing::debug!(job_id, wait_ms, "next status check");
                    self.clock.sleep(wait).await;
                }
                NextWait::Expired => break,
            }
        }

        let elapsed = self.clock.now().saturating_duration_since(start);
        Err(SaveError::Timeout {
            job_id: job_id.to_string(),
            elapsed,
            last_message,
        })
    }
}
