//! Bounded retry with exponential backoff and jitter.
//!
//! Used by every mutation of shared records. An attempt either fails (maybe
//! retryably), or succeeds but reports that its effect could not be observed
//! yet, which is how a write lost to a concurrent overwrite shows up.

use std::{future::Future, time::Duration};

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::ServiceError;

/// Tuning of [`retry_with_backoff`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound of the random delay added to every backoff.
    pub jitter: Duration,
    /// Pause between a write and its read-back.
    pub settle_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_millis(4_000),
            jitter: Duration::from_millis(250),
            settle_delay: Duration::from_millis(400),
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1`: `base * 2^(attempt-1)` capped at
    /// `max_delay`, plus `jitter_sample` clamped to the jitter range.
    pub fn backoff_delay(&self, attempt: u32, jitter_sample: Duration) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let exponential = self
            .base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay);
        exponential + jitter_sample.min(self.jitter)
    }

    fn sample_jitter(&self) -> Duration {
        let bound = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if bound == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=bound))
    }
}

/// Result of one attempt that did not error.
#[derive(Debug)]
pub enum Attempt<T> {
    /// The effect is observable.
    Verified(T),
    /// The attempt went through but its effect is not visible; try again.
    Unverified,
}

/// Final result of a retried operation that never hit a terminal error.
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    Succeeded { value: T, attempts: u32 },
    Exhausted { attempts: u32, last_error: Option<E> },
}

/// Run `attempt` until it verifies, a non-retryable error occurs, or the
/// policy's attempt budget is spent. Attempts are numbered from 1.
pub async fn retry_with_backoff<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut attempt: F,
    is_retryable: R,
) -> Result<RetryOutcome<T, E>, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Attempt<T>, E>>,
    R: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for number in 1..=max_attempts {
        match attempt(number).await {
            Ok(Attempt::Verified(value)) => {
                return Ok(RetryOutcome::Succeeded {
                    value,
                    attempts: number,
                });
            }
            Ok(Attempt::Unverified) => {
                debug!(operation, attempt = number, "attempt not verified");
                last_error = None;
            }
            Err(err) if is_retryable(&err) => {
                warn!(operation, attempt = number, error = %err, "attempt failed");
                last_error = Some(err);
            }
            Err(err) => return Err(err),
        }

        if number < max_attempts {
            sleep(policy.backoff_delay(number, policy.sample_jitter())).await;
        }
    }

    Ok(RetryOutcome::Exhausted {
        attempts: max_attempts,
        last_error,
    })
}

/// Retry a plain write whose success needs no read-back. The last transient
/// error is surfaced once the budget is spent.
pub async fn retry_write<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut write: F,
) -> Result<T, ServiceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    let outcome = retry_with_backoff(
        policy,
        operation,
        |_| {
            let fut = write();
            async move { fut.await.map(Attempt::Verified) }
        },
        ServiceError::is_retryable,
    )
    .await?;

    match outcome {
        RetryOutcome::Succeeded { value, .. } => Ok(value),
        RetryOutcome::Exhausted {
            last_error: Some(err),
            ..
        } => Err(err),
        RetryOutcome::Exhausted { attempts, .. } => Err(ServiceError::RetriesExhausted {
            operation,
            attempts,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::storage::StorageError;
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };
    use tokio::time::Instant;

    fn transient() -> ServiceError {
        ServiceError::Storage(StorageError::Status {
            key: "game:x".into(),
            status: 503,
            body: String::new(),
        })
    }

    fn no_jitter() -> RetryPolicy {
        RetryPolicy {
            jitter: Duration::ZERO,
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = no_jitter();
        let delays: Vec<_> = (1..=6)
            .map(|n| policy.backoff_delay(n, Duration::ZERO).as_millis())
            .collect();
        assert_eq!(delays, vec![250, 500, 1_000, 2_000, 4_000, 4_000]);
    }

    #[test]
    fn jitter_sample_is_clamped() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.backoff_delay(1, Duration::from_secs(10)),
            Duration::from_millis(500)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unverified_attempts_are_retried_until_budget_spent() {
        let calls = Arc::new(AtomicU32::new(0));
        let started = Instant::now();

        let outcome = retry_with_backoff(
            &no_jitter(),
            "probe",
            |_| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<Attempt<()>, ServiceError>(Attempt::Unverified)
                }
            },
            ServiceError::is_retryable,
        )
        .await
        .unwrap();

        assert!(matches!(
            outcome,
            RetryOutcome::Exhausted {
                attempts: 5,
                last_error: None
            }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        // 250 + 500 + 1000 + 2000 between the five attempts.
        assert_eq!(started.elapsed(), Duration::from_millis(3_750));
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_error_stops_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = retry_write(&no_jitter(), "write", || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ServiceError::Storage(StorageError::MissingCredential))
            }
        })
        .await;

        assert!(matches!(
            result,
            Err(ServiceError::Storage(StorageError::MissingCredential))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn write_recovers_from_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let value = retry_write(&no_jitter(), "write", || {
            let calls = calls.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(transient())
                } else {
                    Ok(7)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn write_surfaces_last_transient_error() {
        let result = retry_write(&no_jitter(), "write", || async {
            Err::<(), _>(transient())
        })
        .await;

        assert!(matches!(
            result,
            Err(ServiceError::Storage(StorageError::Status { status: 503, .. }))
        ));
    }
}
