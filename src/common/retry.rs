// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry an async operation with exponential backoff while `should_retry`
/// accepts the error. The first rejected error is returned immediately.
pub async fn retry_async<F, Fut, T, E, P>(
    mut op: F,
    attempts: usize,
    initial_delay: Duration,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let attempts = attempts.max(1);
    let mut delay = initial_delay;
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) if attempt < attempts && should_retry(&e) => {
                sleep(delay).await;
                delay = delay.saturating_mul(2);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::LedgerError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn retries_until_success() {
        let counter = AtomicUsize::new(0);
        let res: Result<u32, ()> = retry_async(
            |_| {
                let current = counter.fetch_add(1, Ordering::Relaxed);
                async move { if current < 2 { Err(()) } else { Ok(7) } }
            },
            4,
            Duration::from_millis(1),
            |_| true,
        )
        .await;

        assert_eq!(res.unwrap(), 7);
        assert_eq!(counter.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn declines_are_not_retried() {
        let counter = AtomicUsize::new(0);
        let res: Result<(), LedgerError> = retry_async(
            |_| {
                counter.fetch_add(1, Ordering::Relaxed);
                async { Err(LedgerError::Locked(1)) }
            },
            5,
            Duration::from_millis(1),
            LedgerError::is_retryable,
        )
        .await;

        assert_eq!(res, Err(LedgerError::Locked(1)));
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }
}
