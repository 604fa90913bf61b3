use wayback_save_client::progress::TracingProgress;
use wayback_save_client::http_client::ReqwestSaveClient;
use wayback_save_client::{ArchiveOptions, ArchiveOutcome, Archiver, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example: expects the URL as the first argument, WAYBACK_SAVE_* in env
    let Some(url) = std::env::args().nth(1) else {
        eprintln!("usage: save_page <url>");
        return Ok(());
    };
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {}", e);
            return Ok(());
        }
    };
    let client = ReqwestSaveClient::from_config(&cfg)?;
    let archiver = Archiver::new(client, &cfg.base_url);
    match archiver
        .archive(&url, &ArchiveOptions::from(&cfg), &TracingProgress)
        .await
    {
        ArchiveOutcome::Success { archived_url, .. } => println!("Archived: {archived_url}"),
        ArchiveOutcome::Failure { message, .. } => eprintln!("Failed: {message}"),
    }
    Ok(())
}
