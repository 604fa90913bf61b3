//! Errors surfaced by the command-line front end.

use thiserror::Error;
use wayback_save_client::FailureStage;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("usage: wayback-save <url>")]
    Usage,

    #[error(transparent)]
    Client(#[from] wayback_save_client::SaveError),

    #[error("{message}")]
    Failed {
        stage: FailureStage,
        job_id: Option<String>,
        message: String,
    },
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Usage => 2,
            CliError::Client(_) | CliError::Failed { .. } => 1,
        }
    }
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
