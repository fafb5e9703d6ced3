//! Retry configuration and an opt-in retrying wrapper.
//!
//! The base [`FetchClient`] never loops. [`RetryingClient`] repeats a fetch
//! only when it failed with a retryable HTTP status.

use std::collections::BTreeSet;
use std::time::Duration;

use cryptocoins_core::logging::targets;
use serde::de::DeserializeOwned;

use crate::decode::{Decoder, JsonDecoder};
use crate::error::{NetworkError, Result, TransportError};
use crate::http::{FetchClient, Request};

/// When and how often to retry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first.
    pub max_retry_count: u32,
    /// Statuses that trigger a retry.
    pub retryable_status_codes: BTreeSet<u16>,
    /// Pause before each retry.
    pub delay_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retry_count: 3,
            retryable_status_codes: BTreeSet::from([500, 502, 503, 504]),
            delay_interval: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retry_count: 0,
            ..Self::default()
        }
    }

    /// Set the retry count.
    pub fn with_max_retry_count(mut self, count: u32) -> Self {
        self.max_retry_count = count;
        self
    }

    /// Set the retryable statuses.
    pub fn with_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.retryable_status_codes = codes.into_iter().collect();
        self
    }

    /// Set the delay between attempts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_interval = delay;
        self
    }

    /// Check if `status` should be retried.
    pub fn is_retryable(&self, status: u16) -> bool {
        self.retryable_status_codes.contains(&status)
    }

    fn should_retry(&self, err: &NetworkError) -> bool {
        matches!(err, NetworkError::Transport(TransportError::BadStatus(code)) if self.is_retryable(*code))
    }
}

/// A [`FetchClient`] that retries retryable status failures.
#[derive(Clone, Debug)]
pub struct RetryingClient<D = JsonDecoder> {
    client: FetchClient<D>,
    policy: RetryPolicy,
}

impl<D: Decoder> RetryingClient<D> {
    /// Wrap a client.
    pub fn new(client: FetchClient<D>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// The retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The wrapped client.
    pub fn inner(&self) -> &FetchClient<D> {
        &self.client
    }

    /// Fetch with retries.
    ///
    /// Each attempt runs the full pipeline, including the cache fallback, so a
    /// retry only happens when no cached body was available.
    pub async fn fetch<T: DeserializeOwned>(&self, request: &Request) -> Result<T> {
        let mut attempt = 0;
        loop {
            match self.client.fetch(request).await {
                Err(err) if attempt < self.policy.max_retry_count && self.policy.should_retry(&err) => {
                    attempt += 1;
                    tracing::debug!(
                        target: targets::RETRY,
                        endpoint = request.endpoint(),
                        attempt,
                        "Retrying after {}",
                        err
                    );
                    tokio::time::sleep(self.policy.delay_interval).await;
                }
                outcome => return outcome,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retry_count, 3);
        assert_eq!(policy.delay_interval, Duration::from_secs(2));
        for code in [500, 502, 503, 504] {
            assert!(policy.is_retryable(code));
        }
        assert!(!policy.is_retryable(501));
        assert!(!policy.is_retryable(404));
    }

    #[test]
    fn test_should_retry_only_retryable_status() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(&TransportError::BadStatus(503).into()));
        assert!(!policy.should_retry(&TransportError::BadStatus(404).into()));
        assert!(!policy.should_retry(&TransportError::Timeout.into()));
        assert!(!policy.should_retry(&NetworkError::None));
    }

    #[test]
    fn test_builder_overrides() {
        let policy = RetryPolicy::none()
            .with_status_codes([429])
            .with_delay(Duration::from_millis(10));
        assert_eq!(policy.max_retry_count, 0);
        assert!(policy.is_retryable(429));
        assert!(!policy.is_retryable(500));
    }
}
