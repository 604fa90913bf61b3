use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(6_000);
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(2_000);

/// What the polling loop should do after a non-terminal snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NextWait {
    Sleep(Duration),
    Expired,
}

/// Poll interval policy: server hint first, floored, capped by the deadline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub default_interval: Duration,
    pub min_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            default_interval: DEFAULT_POLL_INTERVAL,
            min_interval: MIN_POLL_INTERVAL,
        }
    }
}

impl RetryPolicy {
    /// Interval before the next poll, ignoring the deadline.
    pub fn interval(&self, hint: Option<Duration>) -> Duration {
        hint.unwrap_or(self.default_interval).max(self.min_interval)
    }

    pub fn next_wait(
        &self,
        hint: Option<Duration>,
        elapsed: Duration,
        deadline: Duration,
    ) -> NextWait {
        let remaining = deadline.saturating_sub(elapsed);
        if remaining.is_zero() {
            return NextWait::Expired;
        }
        NextWait::Sleep(self.interval(hint).min(remaining))
    }
}
