//! Normalize, submit, poll, and turn the result into an archive URL.

use std::time::Duration;

use crate::clock::{Clock, TokioClock};
use crate::normalize::{RandomTokens, TokenSource, normalize};
use crate::poller::PollingEngine;
use crate::progress::ProgressSink;
use crate::{CacheBuster, Config, ErrorKind, JobStatus, SaveClient, Status};

/// Options accepted from the caller for one save.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArchiveOptions {
    pub keep_protocol: bool,
    pub cache_buster: CacheBuster,
    pub poll_timeout: Duration,
}

impl From<&Config> for ArchiveOptions {
    fn from(config: &Config) -> Self {
        Self {
            keep_protocol: config.keep_protocol,
            cache_buster: config.cache_buster,
            poll_timeout: config.poll_timeout,
        }
    }
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        (&Config::default()).into()
    }
}

/// Where a save failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureStage {
    Submission,
    Polling,
    Capture,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArchiveOutcome {
    Success {
        job_id: String,
        archived_url: String,
        warnings: Vec<String>,
    },
    Failure {
        stage: FailureStage,
        job_id: Option<String>,
        kind: Option<ErrorKind>,
        message: String,
    },
}

impl ArchiveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ArchiveOutcome::Success { .. })
    }
}

pub struct Archiver<C, K = TokioClock> {
    client: C,
    engine: PollingEngine<K>,
    public_base_url: String,
}

impl<C: SaveClient> Archiver<C, TokioClock> {
    pub fn new(client: C, public_base_url: &str) -> Self {
        Self::with_engine(client, PollingEngine::default(), public_base_url)
    }
}

impl<C: SaveClient, K: Clock> Archiver<C, K> {
    pub fn with_engine(client: C, engine: PollingEngine<K>, public_base_url: &str) -> Self {
        Self {
            client,
            engine,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// `<base>/web/<timestamp>/<original_url>` for a successful capture.
    pub fn archived_url(&self, timestamp: &str, original_url: &str) -> String {
        format!("{}/web/{}/{}", self.public_base_url, timestamp, original_url)
    }

    pub async fn archive(
        &self,
        url: &str,
        options: &ArchiveOptions,
        sink: &dyn ProgressSink,
    ) -> ArchiveOutcome {
        self.archive_with_tokens(url, options, sink, &mut RandomTokens)
            .await
    }

    pub async fn archive_with_tokens(
        &self,
        url: &str,
        options: &ArchiveOptions,
        sink: &dyn ProgressSink,
        tokens: &mut (dyn TokenSource + Send),
    ) -> ArchiveOutcome {
        let normalized = normalize(url, options.keep_protocol, options.cache_buster, tokens);

        let submission = match self.client.submit(&normalized).await {
            Ok(s) => s,
            Err(err) => {
                tracing::error!(error = %err, "submission failed");
                return ArchiveOutcome::Failure {
                    stage: FailureStage::Submission,
                    job_id: err.job_id().map(str::to_string),
                    kind: Some(err.kind()),
                    message: format!("submission failed: {err}"),
                };
            }
        };

        let job_id = submission.job_id;
        match self
            .engine
            .run(&self.client, &job_id, options.poll_timeout, sink)
            .await
        {
            Ok(status) => self.finish(job_id, &normalized, status, submission.warnings),
            Err(err) => {
                tracing::error!(job_id = %job_id, error = %err, "polling failed");
                ArchiveOutcome::Failure {
                    stage: FailureStage::Polling,
                    job_id: Some(job_id),
                    kind: Some(err.kind()),
                    message: err.to_string(),
                }
            }
        }
    }

    fn finish(
        &self,
        job_id: String,
        normalized: &str,
        status: JobStatus,
        warnings: Vec<String>,
    ) -> ArchiveOutcome {
        match status.status {
            Status::Success => match status.timestamp.as_deref() {
                Some(timestamp) => {
                    let original = status.original_url.as_deref().unwrap_or(normalized);
                    ArchiveOutcome::Success {
                        archived_url: self.archived_url(timestamp, original),
                        job_id,
                        warnings,
                    }
                }
                None => ArchiveOutcome::Failure {
                    stage: FailureStage::Capture,
                    message: format!("job {job_id} succeeded but reported no capture timestamp"),
                    job_id: Some(job_id),
                    kind: Some(ErrorKind::Parse),
                },
            },
            Status::Error | Status::Pending => ArchiveOutcome::Failure {
                stage: FailureStage::Capture,
                message: format!(
                    "job {}: {}",
                    job_id,
                    status.message.as_deref().unwrap_or("capture failed")
                ),
                job_id: Some(job_id),
                kind: None,
            },
        }
    }
}
