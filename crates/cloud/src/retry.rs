//! Exponential backoff retry engine with fatal-error short-circuit and
//! ambient cancellation.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Backoff policy. Delay sequence is `min(max_delay, initial_delay *
/// multiplier^n)`; total attempts made is `max_retries + 1`.
#[derive(Debug, Clone, Copy)]
pub struct RetryOptions {
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    pub max_retries: u32,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            max_retries: 5,
        }
    }
}

/// Marks an error as non-retryable. Transitive: a `Fatal` buried anywhere in
/// an `anyhow::Error`'s chain stops the retry loop.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct Fatal(#[source] anyhow::Error);

/// Wrap `err` so `is_fatal` recognizes it.
pub fn fatal(err: impl Into<anyhow::Error>) -> anyhow::Error {
    anyhow::Error::new(Fatal(err.into()))
}

/// Whether `err` is, or wraps, a `Fatal`.
#[must_use]
pub fn is_fatal(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.downcast_ref::<Fatal>().is_some())
}

/// Drive `op` with exponential backoff until it succeeds, a fatal error is
/// returned, retries are exhausted, or `cancel` fires.
pub async fn with_exponential_backoff<T, F, Fut>(
    cancel: &CancellationToken,
    opts: &RetryOptions,
    mut op: F,
) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut delay = opts.initial_delay;
    let mut attempt = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(anyhow::anyhow!("operation cancelled before attempt {attempt}"));
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if is_fatal(&err) {
                    return Err(err);
                }
                if attempt >= opts.max_retries {
                    return Err(err);
                }
                attempt += 1;
                warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying after backoff");

                tokio::select! {
                    () = cancel.cancelled() => {
                        return Err(err.context("operation cancelled during backoff"));
                    }
                    () = tokio::time::sleep(delay) => {}
                }

                let next_secs = (delay.as_secs_f64() * opts.multiplier).min(opts.max_delay.as_secs_f64());
                delay = Duration::from_secs_f64(next_secs);
            }
        }
    }
}
