use std::future::Future;
use std::time::Duration;

use tracing::warn;

use tiptally_common::TipTallyError;

/// How often to re-attempt a fallible operation and how long to wait between
/// attempts. The delay grows geometrically: `base_delay * multiplier^n` after
/// the n-th failed attempt.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Delay applied after the 0-based `attempt` fails.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * self.multiplier.saturating_pow(attempt)
    }
}

/// Run `op`, retrying transient failures per `policy`. Non-transient errors
/// propagate on first occurrence; exhausted retries surface as
/// `RetriesExhausted` carrying the last transient error.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, TipTallyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TipTallyError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt + 1 < max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient extraction failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) if err.is_transient() => {
                return Err(TipTallyError::RetriesExhausted {
                    attempts: max_attempts,
                    last_error: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(20),
            multiplier: 2,
        }
    }

    #[test]
    fn delay_schedule_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn always_transient_exhausts_exactly_max_attempts() {
        let calls = AtomicUsize::new(0);
        let started = Instant::now();

        let result: Result<(), _> = retry(&fast_policy(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TipTallyError::TransientService("503".to_string())) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result.unwrap_err() {
            TipTallyError::RetriesExhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("503"));
            }
            other => panic!("expected RetriesExhausted, got {other}"),
        }
        // Backoff schedule: 20ms after attempt 1, 40ms after attempt 2.
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn non_transient_error_fails_on_first_attempt() {
        let calls = AtomicUsize::new(0);

        let result: Result<(), _> = retry(&fast_policy(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TipTallyError::MalformedResponse("no JSON".to_string())) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result.unwrap_err(),
            TipTallyError::MalformedResponse(_)
        ));
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicUsize::new(0);

        let result = retry(&fast_policy(), || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call < 2 {
                    Err(TipTallyError::TransientService("429".to_string()))
                } else {
                    Ok(call)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_max_attempts_still_runs_once() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy {
            max_attempts: 0,
            base_delay: Duration::from_millis(1),
            multiplier: 2,
        };

        let result = retry(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, TipTallyError>(42) }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
