//! Fixed-delay retry around an [`ElementSource`].

use std::time::Duration;

use infrascan_core::RawElement;
use log::{info, warn};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::query::OverpassQuery;
use super::source::{ElementSource, SourceError};

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// How often and how patiently to retry a failed fetch.
///
/// The delay is constant between attempts; there is no backoff or jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`.
    pub max_retries: u32,
    /// Wait before each retry.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Set the retry count.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay between attempts.
    #[must_use]
    pub const fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Total number of attempts the policy allows.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Terminal outcome of [`fetch_with_retry`] when no elements were returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The caller cancelled while a request or retry wait was pending.
    #[error("fetch cancelled")]
    Cancelled,
    /// Every attempt failed.
    #[error("failed to query Overpass API after {attempts} attempts: {source}")]
    Exhausted {
        /// Attempts made.
        attempts: u32,
        /// Error from the final attempt.
        #[source]
        source: SourceError,
    },
}

/// Run `query` against `source`, retrying failures under `policy`.
///
/// Both the in-flight request and the wait between attempts race `cancel`;
/// cancellation wins ties and is never retried.
///
/// # Errors
///
/// Returns [`FetchError::Cancelled`] once `cancel` fires and
/// [`FetchError::Exhausted`] carrying the last [`SourceError`] when the
/// attempt budget runs out.
pub async fn fetch_with_retry<S>(
    source: &S,
    query: &OverpassQuery,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<Vec<RawElement>, FetchError>
where
    S: ElementSource + ?Sized,
{
    let attempts = policy.attempts();
    let mut attempt: u32 = 1;
    loop {
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(FetchError::Cancelled),
            outcome = source.fetch(query) => outcome,
        };
        match outcome {
            Ok(elements) => {
                if attempt > 1 {
                    info!("Overpass query succeeded on attempt {attempt}/{attempts}");
                }
                return Ok(elements);
            }
            Err(err) => {
                warn!(
                    "Overpass attempt {attempt}/{attempts} against {} failed: {err}",
                    source.endpoint()
                );
                if attempt >= attempts {
                    return Err(FetchError::Exhausted {
                        attempts: attempt,
                        source: err,
                    });
                }
            }
        }

        attempt = attempt.saturating_add(1);
        warn!(
            "Retrying Overpass query in {:?} (attempt {attempt}/{attempts})",
            policy.retry_delay
        );
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(FetchError::Cancelled),
            () = tokio::time::sleep(policy.retry_delay) => {}
        }
    }
}
