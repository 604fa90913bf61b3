//! Start-up helpers for the `wayback-save` binary.

pub mod error;

pub use error::{CliError, CliResult};

use wayback_save_client::http_client::ReqwestSaveClient;
use wayback_save_client::progress::TracingProgress;
use wayback_save_client::{ArchiveOptions, ArchiveOutcome, Archiver, Config};

pub const LOG_LEVEL_ENV: &str = "WAYBACK_SAVE_LOG_LEVEL";
pub const DEFAULT_FILTER: &str = "info,reqwest=warn,hyper=warn,hyper_util=warn";

/// Log filter from `WAYBACK_SAVE_LOG_LEVEL`, else `RUST_LOG`, else `info`,
/// with HTTP stack internals capped at `warn`.
pub fn log_filter_with<F>(mut get: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let level = get(LOG_LEVEL_ENV)
        .or_else(|| get("RUST_LOG"))
        .unwrap_or_else(|| "info".to_string());
    format!("{level},reqwest=warn,hyper=warn,hyper_util=warn")
}

pub fn env_filter(directive: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_new(directive)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_FILTER))
}

pub fn init_tracing(directive: &str) {
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter(directive))
        .init();
}

/// Map an archive outcome onto the archived URL or a failure.
pub fn into_result(outcome: ArchiveOutcome) -> CliResult<String> {
    match outcome {
        ArchiveOutcome::Success {
            archived_url,
            warnings,
            ..
        } => {
            for w in &warnings {
                tracing::warn!("{}", w);
            }
            Ok(archived_url)
        }
        ArchiveOutcome::Failure {
            stage,
            job_id,
            message,
            ..
        } => Err(CliError::Failed {
            stage,
            job_id,
            message,
        }),
    }
}

/// Save `url` with the given configuration and return the archived URL.
pub async fn run(url: &str, config: &Config) -> CliResult<String> {
    let client = ReqwestSaveClient::from_config(config)?;
    let archiver = Archiver::new(client, &config.base_url);
    tracing::info!(
        url,
        cache_buster = %config.cache_buster,
        timeout_ms = config.poll_timeout.as_millis() as u64,
        "saving page"
    );
    let outcome = archiver
        .archive(url, &ArchiveOptions::from(config), &TracingProgress)
        .await;
    into_result(outcome)
}
