use std::process::ExitCode;

use wayback_save_cli::{CliError, init_tracing, log_filter_with, run};
use wayback_save_client::Config;

#[tokio::main]
async fn main() -> ExitCode {
    // Logging from `WAYBACK_SAVE_LOG_LEVEL`, falling back to `RUST_LOG`, default `info`.
    let filter = log_filter_with(|k| std::env::var(k).ok());
    init_tracing(&filter);
    tracing::debug!("wayback-save: log filter: {}", filter);

    let result = match (std::env::args().nth(1), Config::from_env()) {
        (None, _) => Err(CliError::Usage),
        (Some(_), Err(e)) => Err(e.into()),
        (Some(url), Ok(config)) => run(&url, &config).await,
    };

    match result {
        Ok(archived_url) => {
            println!("{archived_url}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            if let CliError::Failed {
                job_id: Some(job_id),
                stage,
                ..
            } = &err
            {
                tracing::debug!(%job_id, ?stage, "save failed");
            }
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
