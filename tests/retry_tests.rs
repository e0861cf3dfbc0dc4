//! Backoff behavior: transient failures retry, permanent failures do not.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use finrag::RetryPolicy;
use finrag::retry::with_backoff;

#[derive(Debug, PartialEq)]
struct FakeServiceError {
    transient: bool,
}

impl fmt::Display for FakeServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fake service error (transient: {})", self.transient)
    }
}

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(4),
    }
}

#[tokio::test(start_paused = true)]
async fn transient_failures_are_retried_until_success() {
    let calls = AtomicU32::new(0);
    let calls = &calls;

    let result = with_backoff(
        &fast_policy(3),
        "fake call",
        |e: &FakeServiceError| e.transient,
        || async move {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            if attempt < 2 {
                Err(FakeServiceError { transient: true })
            } else {
                Ok("recovered")
            }
        },
    )
    .await;

    assert_eq!(result, Ok("recovered"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn permanent_failures_surface_immediately() {
    let calls = AtomicU32::new(0);
    let calls = &calls;

    let result: Result<(), FakeServiceError> = with_backoff(
        &fast_policy(5),
        "fake call",
        |e: &FakeServiceError| e.transient,
        || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(FakeServiceError { transient: false })
        },
    )
    .await;

    assert_eq!(result, Err(FakeServiceError { transient: false }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn exhausted_attempts_return_the_last_transient_error() {
    let calls = AtomicU32::new(0);
    let calls = &calls;

    let result: Result<(), FakeServiceError> = with_backoff(
        &fast_policy(3),
        "fake call",
        |e: &FakeServiceError| e.transient,
        || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(FakeServiceError { transient: true })
        },
    )
    .await;

    assert_eq!(result, Err(FakeServiceError { transient: true }));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}
