//! Bounded retry policy shared by both transports

use station_shared::retry;
use std::time::Duration;
use tokio::time::sleep;

/// How many times a connect call tries, and how long it waits in between
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per connect call
    pub max_attempts: u32,
    /// Delay after every failed attempt, and once more after giving up
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: retry::MAX_ATTEMPTS,
            delay: Duration::from_millis(retry::ATTEMPT_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Total time a connect call blocks when every attempt fails
    pub fn worst_case(&self) -> Duration {
        self.delay * (self.max_attempts + 1)
    }

    /// Block the station for one retry delay
    pub async fn pause(&self) {
        sleep(self.delay).await;
    }
}
