//! Progress notifications emitted while a job is pending.

use crate::JobStatus;

pub const GENERIC_PROGRESS: &str = "Downloading resources...";

/// Receives human-readable progress text. The engine calls `emit` at most
/// once per distinct message.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, message: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn emit(&self, message: &str) {
        self(message)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn emit(&self, _message: &str) {}
}

/// Forwards progress to the `tracing` subscriber at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn emit(&self, message: &str) {
        tracing::info!("{}", message);
    }
}

/// Byte counts first, then resource count, then a generic message.
pub fn progress_text(status: &JobStatus) -> String {
    if let (Some(done), Some(total)) = (status.download_size, status.total_size) {
        let pct = if total == 0 {
            0
        } else {
            (done.saturating_mul(100) / total).min(100)
        };
        return format!(
            "Downloaded {} of {} ({}%)",
            format_bytes(done),
            format_bytes(total),
            pct
        );
    }
    if let Some(resources) = &status.resources {
        let noun = if resources.len() == 1 { "resource" } else { "resources" };
        return format!("Captured {} {}", resources.len(), noun);
    }
    GENERIC_PROGRESS.to_string()
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
