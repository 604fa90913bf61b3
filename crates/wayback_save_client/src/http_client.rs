//! HTTP client implementation for the Save Page Now endpoints.
//!
//! This module provides a reqwest-based implementation of the
//! [`SaveClient`](crate::SaveClient) trait.

use crate::scrape::{self, ErrorBlock};
use crate::{Config, JobStatus, SaveClient, SaveError, Submission};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{CONTENT_TYPE, REFERER, RETRY_AFTER, USER_AGENT};
use std::time::Duration;

pub const CLIENT_USER_AGENT: &str = concat!("wayback-save/", env!("CARGO_PKG_VERSION"));

/// Client for the Save Page Now service using reqwest.
#[derive(Clone, Debug)]
pub struct ReqwestSaveClient {
    base_url: String,
    debug: bool,
    client: reqwest::Client,
}

impl ReqwestSaveClient {
    /// Create a new client instance.
    ///
    /// # Arguments
    /// * `base_url` - Service root, e.g. "https://web.archive.org"
    /// * `request_timeout` - Per-request network timeout
    /// * `debug` - Keep and log raw response bodies
    pub fn new(
        base_url: &str,
        request_timeout: Duration,
        debug: bool,
    ) -> Result<Self, SaveError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            debug,
            client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, SaveError> {
        Self::new(&config.base_url, config.request_timeout, config.debug)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn save_url(&self) -> String {
        format!("{}/save/", self.base_url)
    }

    fn status_url(&self, job_id: &str) -> String {
        format!("{}/save/status/{}", self.base_url, job_id)
    }

    /// Log the raw body when debug mode is on; returns it for the caller to keep.
    fn inspect_body(&self, what: &str, status: u16, body: &str) -> Option<String> {
        if !self.debug {
            return None;
        }
        tracing::debug!(status, "{} response body:\n{}", what, body);
        Some(body.to_string())
    }

    /// Turn a save page into a job id, a rejection, or a parse failure.
    fn interpret_submission(
        &self,
        status: reqwest::StatusCode,
        body: &str,
        raw_body: Option<String>,
    ) -> Result<Submission, SaveError> {
        let mut warnings = Vec::new();
        match scrape::classify_error_block(body) {
            Some(ErrorBlock::Rejected(message)) => return Err(SaveError::Rejected { message }),
            Some(ErrorBlock::Unrecognized(text)) => {
                tracing::warn!("unrecognized error block in save response: {}", text);
                warnings.push(format!("unrecognized error block: {text}"));
            }
            None => {}
        }

        match scrape::extract_job_id(body) {
            Some(job_id) => {
                if !status.is_success() {
                    tracing::warn!(
                        %job_id,
                        status = status.as_u16(),
                        "job id found in non-success response"
                    );
                    warnings.push(format!("save endpoint answered HTTP {}", status.as_u16()));
                }
                tracing::info!(%job_id, "save job accepted");
                Ok(Submission {
                    job_id,
                    warnings,
                    raw_body,
                })
            }
            None if !status.is_success() => Err(SaveError::HttpStatus {
                status: status.as_u16(),
                job_id: None,
                body: scrape::snippet(body),
            }),
            None => Err(SaveError::Parse {
                job_id: None,
                message: "no spn.watchJob call in save page".to_string(),
            }),
        }
    }
}

/// `Retry-After` in whole seconds; HTTP-date forms are ignored.
pub fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_millis(secs.saturating_mul(1000)))
}

/// Error snapshot for a non-2xx status response, whether or not its body parses.
pub fn status_error(job_id: &str, http_status: u16, body: &str) -> JobStatus {
    #[derive(serde::Deserialize)]
    struct ErrorPayload {
        message: Option<String>,
    }

    let parsed = serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .and_then(|p| p.message)
        .filter(|m| !m.trim().is_empty());
    let message = match parsed {
        Some(m) => format!("HTTP {http_status}: {m}"),
        None => format!("HTTP {http_status}"),
    };
    JobStatus::error(job_id, message)
}

#[async_trait]
impl SaveClient for ReqwestSaveClient {
    async fn submit(&self, normalized_url: &str) -> Result<Submission, SaveError> {
        let save_url = self.save_url();
        tracing::debug!(url = normalized_url, "submitting save request");
        let resp = self
            .client
            .post(&save_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(REFERER, &save_url)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .form(&[("url", normalized_url), ("capture_all", "on")])
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        let raw_body = self.inspect_body("save", status.as_u16(), &body);
        self.interpret_submission(status, &body, raw_body)
    }

    async fn poll_status(&self, job_id: &str) -> Result<JobStatus, SaveError> {
        let url = self.status_url(job_id);
        let cache_buster = Utc::now().timestamp_millis().to_string();
        tracing::debug!(job_id, "checking job status");
        let resp = self
            .client
            .get(&url)
            .query(&[("_t", cache_buster.as_str())])
            .header("X-Requested-With", "XMLHttpRequest")
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await?;
        let http_status = resp.status();
        let retry_after = parse_retry_after(resp.headers());
        let body = resp.text().await?;
        self.inspect_body("status", http_status.as_u16(), &body);

        if !http_status.is_success() {
            let status = status_error(job_id, http_status.as_u16(), &body);
            return Err(SaveError::Service(status.with_retry_after(retry_after)));
        }

        let mut status: JobStatus = serde_json::from_str(&body).map_err(|e| SaveError::Parse {
            job_id: Some(job_id.to_string()),
            message: format!("{e}: {}", scrape::snippet(&body)),
        })?;
        if status.job_id.is_empty() {
            status.job_id = job_id.to_string();
        } else if status.job_id != job_id {
            return Err(SaveError::Parse {
                job_id: Some(job_id.to_string()),
                message: format!("status response belongs to job {}", status.job_id),
            });
        }
        Ok(status.with_retry_after(retry_after))
    }
}
