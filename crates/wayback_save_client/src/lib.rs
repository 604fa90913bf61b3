//! Submission-and-polling engine for the Wayback Machine "Save Page Now" service.
//!
//! A save runs in one direction: raw URL -> normalized URL -> job id ->
//! status snapshots -> terminal status or error. [`SaveClient`] is the seam
//! between the engine and the wire; [`http_client::ReqwestSaveClient`] is the
//! production implementation.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use thiserror::Error;

pub mod archive;
pub mod clock;
pub mod config;
pub mod http_client;
pub mod normalize;
pub mod poller;
pub mod progress;
pub mod retry;
pub mod scrape;

pub use archive::{ArchiveOptions, ArchiveOutcome, Archiver, FailureStage};
pub use config::{CacheBuster, Config};
pub use poller::PollingEngine;
pub use progress::ProgressSink;

/// Lifecycle state reported by the status endpoint.
///
/// Closed set: any other value fails deserialization.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Success,
    Error,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Status::Pending)
    }
}

/// One snapshot of a save job, produced once per poll.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct JobStatus {
    #[serde(default)]
    pub job_id: String,
    pub status: Status,
    #[serde(default)]
    pub resources: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_opt_size")]
    pub download_size: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_opt_size")]
    pub total_size: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub original_url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Taken from the `Retry-After` response header, never from the body.
    #[serde(skip)]
    pub retry_after: Option<Duration>,
}

impl JobStatus {
    /// Synthesized error snapshot used when the status endpoint fails.
    pub fn error(job_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: Status::Error,
            resources: None,
            download_size: None,
            total_size: None,
            timestamp: None,
            original_url: None,
            message: Some(message.into()),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
        self.retry_after = retry_after;
        self
    }
}

// Sizes occasionally arrive as floats or negative placeholders; anything that
// is not a non-negative integer is treated as unknown.
fn deserialize_opt_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        _ => None,
    })
}

/// Result of a successful submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub job_id: String,
    /// Non-fatal oddities noticed while scraping the response page.
    pub warnings: Vec<String>,
    /// Full response body, kept only when debug mode is on.
    pub raw_body: Option<String>,
}

/// Coarse classification used by callers and the polling loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Parse,
    Rejected,
    ServiceReported,
    Timeout,
    Config,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{}", describe_status(*status, job_id.as_deref(), body))]
    HttpStatus {
        status: u16,
        job_id: Option<String>,
        body: String,
    },
    #[error("{}", describe_parse(job_id.as_deref(), message))]
    Parse {
        job_id: Option<String>,
        message: String,
    },
    #[error("save rejected by service: {message}")]
    Rejected { message: String },
    #[error(
        "job {}: {}",
        .0.job_id,
        .0.message.as_deref().unwrap_or("service reported an error")
    )]
    Service(JobStatus),
    #[error("{}", describe_timeout(job_id, *elapsed, last_message.as_deref()))]
    Timeout {
        job_id: String,
        elapsed: Duration,
        last_message: Option<String>,
    },
    #[error("configuration error: {0}")]
    Config(String),
}

fn describe_status(status: u16, job_id: Option<&str>, body: &str) -> String {
    match job_id {
        Some(id) => format!("job {id}: unexpected HTTP status {status}: {body}"),
        None => format!("unexpected HTTP status {status}: {body}"),
    }
}

fn describe_parse(job_id: Option<&str>, message: &str) -> String {
    match job_id {
        Some(id) => format!("job {id}: unrecognized response: {message}"),
        None => format!("unrecognized response: {message}"),
    }
}

fn describe_timeout(job_id: &str, elapsed: Duration, last_message: Option<&str>) -> String {
    let base = format!(
        "job {job_id} did not finish within {}s",
        elapsed.as_secs()
    );
    match last_message {
        Some(msg) => format!("{base} (last message: {msg})"),
        None => base,
    }
}

impl SaveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SaveError::Http(_) | SaveError::HttpStatus { .. } => ErrorKind::Transport,
            SaveError::Parse { .. } => ErrorKind::Parse,
            SaveError::Rejected { .. } => ErrorKind::Rejected,
            SaveError::Service(_) => ErrorKind::ServiceReported,
            SaveError::Timeout { .. } => ErrorKind::Timeout,
            SaveError::Config(_) => ErrorKind::Config,
        }
    }

    pub fn job_id(&self) -> Option<&str> {
        match self {
            SaveError::HttpStatus { job_id, .. } | SaveError::Parse { job_id, .. } => {
                job_id.as_deref()
            }
            SaveError::Service(status) => Some(status.job_id.as_str()),
            SaveError::Timeout { job_id, .. } => Some(job_id.as_str()),
            SaveError::Http(_) | SaveError::Rejected { .. } | SaveError::Config(_) => None,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            SaveError::Service(status) => status.retry_after,
            _ => None,
        }
    }

    /// True only for a service-reported error snapshot belonging to `job_id`.
    pub fn is_retryable_for(&self, job_id: &str) -> bool {
        matches!(
            self,
            SaveError::Service(status) if status.job_id == job_id && status.status == Status::Error
        )
    }
}

#[async_trait]
pub trait SaveClient: Send + Sync {
    /// POST the normalized URL to the save endpoint and scrape the job id.
    async fn submit(&self, normalized_url: &str) -> Result<Submission, SaveError>;

    /// GET one status snapshot for `job_id`.
    async fn poll_status(&self, job_id: &str) -> Result<JobStatus, SaveError>;
}
