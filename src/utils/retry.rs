//! Rate-limit retry: back off once on HTTP 429, then give up.

use std::time::Duration;
use tokio::time::sleep;

use crate::sources::SourceError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// How long to wait after a 429 before the single retry
    pub rate_limit_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            rate_limit_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    pub fn with_backoff(rate_limit_backoff: Duration) -> Self {
        Self { rate_limit_backoff }
    }
}

/// Execute an async operation, retrying it exactly once if it fails with
/// [`SourceError::RateLimit`].
///
/// Any other error is returned immediately. Whatever the retry returns is
/// final, so a second 429 surfaces as `RateLimit`.
pub async fn with_rate_limit_retry<T, F, Fut>(config: RetryConfig, operation: F) -> Result<T, SourceError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, SourceError>>,
{
    match operation().await {
        Err(SourceError::RateLimit) => {
            tracing::warn!(
                "Rate limited, retrying once in {:?}",
                config.rate_limit_backoff
            );
            sleep(config.rate_limit_backoff).await;
            let result = operation().await;
            if matches!(result, Err(SourceError::RateLimit)) {
                tracing::warn!("Still rate limited after retry");
            }
            result
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn fast() -> RetryConfig {
        RetryConfig::with_backoff(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let call_count = Rc::new(RefCell::new(0));

        let result = with_rate_limit_retry(fast(), || {
            let call_count = call_count.clone();
            async move {
                *call_count.borrow_mut() += 1;
                Ok("success")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(*call_count.borrow(), 1);
    }

    #[tokio::test]
    async fn test_success_after_one_rate_limit() {
        let call_count = Rc::new(RefCell::new(0));

        let result = with_rate_limit_retry(fast(), || {
            let call_count = call_count.clone();
            async move {
                *call_count.borrow_mut() += 1;
                if *call_count.borrow() == 1 {
                    Err(SourceError::RateLimit)
                } else {
                    Ok("success")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(*call_count.borrow(), 2);
    }

    #[tokio::test]
    async fn test_second_rate_limit_is_final() {
        let call_count = Rc::new(RefCell::new(0));

        let result: Result<(), SourceError> = with_rate_limit_retry(fast(), || {
            let call_count = call_count.clone();
            async move {
                *call_count.borrow_mut() += 1;
                Err(SourceError::RateLimit)
            }
        })
        .await;

        assert!(matches!(result, Err(SourceError::RateLimit)));
        assert_eq!(*call_count.borrow(), 2);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let call_count = Rc::new(RefCell::new(0));

        let result: Result<(), SourceError> = with_rate_limit_retry(fast(), || {
            let call_count = call_count.clone();
            async move {
                *call_count.borrow_mut() += 1;
                Err(SourceError::Http {
                    status: 500,
                    body: "boom".to_string(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(SourceError::Http { status: 500, .. })));
        assert_eq!(*call_count.borrow(), 1);
    }
}
