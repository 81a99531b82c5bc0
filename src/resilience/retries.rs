//! Retry logic.
//!
//! # Responsibilities
//! - Run an operation up to `max_attempts` times
//! - Sleep according to a `Backoff` schedule between attempts
//! - Run a recovery hook (e.g. session refresh) after each backoff
//!
//! # Design Decisions
//! - The policy knows nothing about transports; the operation is a closure
//! - Recovery runs exactly once per gap, and never after the final attempt
//! - Exhaustion reports the attempt count and the last error

use std::fmt::Display;
use std::future::Future;

use crate::resilience::backoff::Backoff;

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn exponential(max_attempts: u32, base_ms: u64, max_ms: u64) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Exponential { base_ms, max_ms },
        }
    }

    pub fn linear(max_attempts: u32, step_ms: u64) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Linear { step_ms },
        }
    }
}

/// Every attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last: E,
}

/// Run `op` until it succeeds or the policy is exhausted.
///
/// `op` receives the zero-based attempt number. After a failed attempt that
/// still has a successor, the backoff delay elapses and then `recover` is
/// awaited with the failed attempt number and its error.
pub async fn retry_with_recovery<T, E, Op, OpFut, Rec, RecFut>(
    policy: &RetryPolicy,
    mut op: Op,
    mut recover: Rec,
) -> Result<T, RetryExhausted<E>>
where
    E: Display,
    Op: FnMut(u32) -> OpFut,
    OpFut: Future<Output = Result<T, E>>,
    Rec: FnMut(u32, &E) -> RecFut,
    RecFut: Future<Output = ()>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let error = match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if attempt + 1 >= max_attempts {
            tracing::warn!(
                attempts = max_attempts,
                error = %error,
                "All attempts failed"
            );
            return Err(RetryExhausted {
                attempts: max_attempts,
                last: error,
            });
        }

        let delay = policy.backoff.delay(attempt);
        tracing::info!(
            attempt = attempt + 1,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Attempt failed, backing off"
        );
        tokio::time::sleep(delay).await;
        recover(attempt, &error).await;

        attempt += 1;
    }
}

/// Recovery hook that does nothing.
pub fn no_recovery<E>(_attempt: u32, _error: &E) -> std::future::Ready<()> {
    std::future::ready(())
}
