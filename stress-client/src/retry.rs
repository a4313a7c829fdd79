//! Retry policy for facade commands
//!
//! Submission and polling re-issue the identical request immediately when the
//! transport fails; there is no backoff. Unbounded retrying can pile up
//! requests against a struggling server, so the attempt count is a parameter
//! of the policy rather than a hard-coded loop.

use std::future::Future;

use tracing::debug;

use crate::error::{ClientError, Result};

/// How often a failed command is re-issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    /// Total attempts allowed, `None` for no limit
    max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Re-issue until the command goes through
    pub fn forever() -> Self {
        Self { max_attempts: None }
    }

    /// Give up after `max_attempts` attempts (at least one is always made)
    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
        }
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Runs `op`, re-issuing it on transport errors only
    ///
    /// Any other error is returned at once: the server answered.
    pub async fn run<T, F, Fut>(&self, label: &str, op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.retry_while(label, op, ClientError::is_transport).await
    }

    /// Runs `op`, re-issuing it on any error until it succeeds
    pub async fn run_until_ok<T, F, Fut>(&self, label: &str, op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.retry_while(label, op, |_| true).await
    }

    async fn retry_while<T, F, Fut, P>(&self, label: &str, mut op: F, retryable: P) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        P: Fn(&ClientError) -> bool,
    {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let exhausted = self.max_attempts.is_some_and(|max| attempt >= max);
                    if !retryable(&e) || exhausted {
                        return Err(e);
                    }
                    debug!("Error sending {} (attempt {}), retrying: {}", label, attempt, e);
                    tokio::task::yield_now().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transport_error() -> ClientError {
        // A request to an invalid URL fails before any network I/O
        let err = reqwest::Client::new()
            .get("not a url")
            .build()
            .expect_err("invalid url must not build");
        ClientError::RequestFailed(err)
    }

    #[tokio::test]
    async fn test_bounded_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = RetryPolicy::bounded(3)
            .run("play", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(transport_error())
            })
            .await;

        assert!(result.unwrap_err().is_transport());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_transport_errors_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = RetryPolicy::forever()
            .run("pull", move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 4 {
                    Err(transport_error())
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_rejections_are_not_retried_by_run() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = RetryPolicy::forever()
            .run("pull", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ClientError::rejected(Some(1), "{}"))
            })
            .await;

        assert!(matches!(result, Err(ClientError::Rejected { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_until_ok_retries_rejections() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = RetryPolicy::forever()
            .run_until_ok("stop-all", move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ClientError::rejected(Some(1), "{}"))
                } else {
                    Ok(())
                }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_bounded_is_at_least_one() {
        assert_eq!(RetryPolicy::bounded(0).max_attempts(), Some(1));
        assert_eq!(RetryPolicy::forever().max_attempts(), None);
        assert_eq!(RetryPolicy::default(), RetryPolicy::forever());
    }
}
