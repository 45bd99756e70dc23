//! Generic `Ensure`/`Delete` skeletons. Resource-kind-specific logic lives
//! only in the closures passed in; retry policy, concurrency safety, and
//! timeout policy live only here. No adapter re-implements retry.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::classify::{classify, is_retryable, ErrorKind};
use crate::providers::hetzner::client::ProviderError;
use crate::retry::{fatal, with_exponential_backoff, RetryOptions};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("{resource} {op} failed: {source}")]
    Step {
        resource: String,
        op: &'static str,
        source: anyhow::Error,
    },
    #[error("{resource} delete timed out after {seconds}s")]
    Timeout { resource: String, seconds: u64 },
}

impl ReconcileError {
    fn step(resource: &str, op: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Step {
            resource: resource.to_string(),
            op,
            source: source.into(),
        }
    }
}

/// Closure bundle for `ensure`. `get`/`create`/`update` are boxed async
/// closures because resource kinds don't share a concrete type; `needs_update`
/// is a plain predicate since it never suspends.
pub struct EnsureOps<'a, T> {
    pub get: Box<dyn Fn() -> BoxFuture<'a, Result<Option<T>, ProviderError>> + Send + Sync + 'a>,
    pub create: Box<dyn Fn() -> BoxFuture<'a, Result<T, ProviderError>> + Send + Sync + 'a>,
    pub needs_update: Option<Box<dyn Fn(&T) -> bool + Send + Sync + 'a>>,
    pub update:
        Option<Box<dyn Fn(&T) -> BoxFuture<'a, Result<Option<T>, ProviderError>> + Send + Sync + 'a>>,
}

/// Run a single provider call through the retry engine, turning a
/// non-retryable classification into a `Fatal` so the engine stops at once.
async fn call_retried<T, F>(cancel: &CancellationToken, f: F) -> anyhow::Result<T>
where
    F: Fn() -> BoxFuture<'_, Result<T, ProviderError>>,
{
    with_exponential_backoff(cancel, &RetryOptions::default(), || async {
        match f().await {
            Ok(value) => Ok(value),
            Err(err) if is_retryable(classify(&err)) => Err(anyhow::Error::new(err)),
            Err(err) => Err(fatal(err)),
        }
    })
    .await
}

/// `Get -> (Update | Create)`, strictly in that order, never re-implemented
/// by a resource kind. Each step runs through the retry engine so no
/// adapter has to drive its own backoff.
pub async fn ensure<T>(
    resource: &str,
    ops: EnsureOps<'_, T>,
    cancel: &CancellationToken,
) -> Result<T, ReconcileError> {
    let existing = call_retried(cancel, &*ops.get)
        .await
        .map_err(|source| ReconcileError::step(resource, "get", source))?;

    let Some(current) = existing else {
        return call_retried(cancel, &*ops.create)
            .await
            .map_err(|source| ReconcileError::step(resource, "create", source));
    };

    let Some(update) = ops.update.as_ref() else {
        return Ok(current);
    };

    let needs = match &ops.needs_update {
        Some(predicate) => predicate(&current),
        None => true,
    };
    if !needs {
        return Ok(current);
    }

    let updated = call_retried(cancel, || update(&current))
        .await
        .map_err(|source| ReconcileError::step(resource, "update", source))?;
    Ok(updated.unwrap_or(current))
}

/// Closure bundle for `delete`.
pub struct DeleteOps<'a, T> {
    pub get: Box<dyn Fn() -> BoxFuture<'a, Result<Option<T>, ProviderError>> + Send + Sync + 'a>,
    pub delete: Box<dyn Fn(&T) -> BoxFuture<'a, Result<(), ProviderError>> + Send + Sync + 'a>,
}

/// `Get -> Delete`, idempotent on absence, bounded by `timeout` independent
/// of any longer ambient deadline; a `Locked` delete error is retried, any
/// other error is fatal.
pub async fn delete<T>(
    resource: &str,
    ops: DeleteOps<'_, T>,
    cancel: &CancellationToken,
    timeout: Duration,
) -> Result<(), ReconcileError> {
    let attempt = with_exponential_backoff(cancel, &RetryOptions::default(), || async {
        let existing = (ops.get)().await.map_err(anyhow::Error::new)?;
        let Some(current) = existing else {
            return Ok(());
        };
        match (ops.delete)(&current).await {
            Ok(()) => Ok(()),
            Err(err) if classify(&err) == ErrorKind::Locked => Err(anyhow::Error::new(err)),
            Err(err) => Err(fatal(err)),
        }
    });

    match tokio::time::timeout(timeout, attempt).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(ReconcileError::step(resource, "delete", source)),
        Err(_) => Err(ReconcileError::Timeout {
            resource: resource.to_string(),
            seconds: timeout.as_secs(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Dummy {
        version: u32,
    }

    fn box_fut<'a, T: Send + 'a>(
        value: T,
    ) -> BoxFuture<'a, T> {
        Box::pin(async move { value })
    }

    #[tokio::test]
    async fn ensure_creates_when_absent() {
        let ops = EnsureOps {
            get: Box::new(|| box_fut(Ok(None))),
            create: Box::new(|| box_fut(Ok(Dummy { version: 1 }))),
            needs_update: None,
            update: None,
        };
        let cancel = CancellationToken::new();
        let result = ensure("thing", ops, &cancel).await.unwrap();
        assert_eq!(result, Dummy { version: 1 });
    }

    #[tokio::test]
    async fn ensure_returns_existing_when_update_is_none() {
        let ops: EnsureOps<Dummy> = EnsureOps {
            get: Box::new(|| box_fut(Ok(Some(Dummy { version: 1 })))),
            create: Box::new(|| box_fut(Ok(Dummy { version: 99 }))),
            needs_update: None,
            update: None,
        };
        let cancel = CancellationToken::new();
        let result = ensure("thing", ops, &cancel).await.unwrap();
        assert_eq!(result, Dummy { version: 1 });
    }

    #[tokio::test]
    async fn ensure_skips_update_when_not_needed() {
        let ops = EnsureOps {
            get: Box::new(|| box_fut(Ok(Some(Dummy { version: 1 })))),
            create: Box::new(|| box_fut(Ok(Dummy { version: 99 }))),
            needs_update: Some(Box::new(|_: &Dummy| false)),
            update: Some(Box::new(|_: &Dummy| box_fut(Ok(Some(Dummy { version: 2 }))))),
        };
        let cancel = CancellationToken::new();
        let result = ensure("thing", ops, &cancel).await.unwrap();
        assert_eq!(result, Dummy { version: 1 });
    }

    #[tokio::test]
    async fn ensure_applies_update_when_needed() {
        let ops = EnsureOps {
            get: Box::new(|| box_fut(Ok(Some(Dummy { version: 1 })))),
            create: Box::new(|| box_fut(Ok(Dummy { version: 99 }))),
            needs_update: Some(Box::new(|_: &Dummy| true)),
            update: Some(Box::new(|_: &Dummy| box_fut(Ok(Some(Dummy { version: 2 }))))),
        };
        let cancel = CancellationToken::new();
        let result = ensure("thing", ops, &cancel).await.unwrap();
        assert_eq!(result, Dummy { version: 2 });
    }

    #[tokio::test]
    async fn ensure_wraps_invalid_parameter_as_fatal_without_retry() {
        use std::sync::atomic::{AtomicU32, Ordering};
        let attempts = std::sync::Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();
        let ops: EnsureOps<Dummy> = EnsureOps {
            get: Box::new(|| box_fut(Ok(None))),
            create: Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                box_fut(Err(ProviderError::Api {
                    status: 400,
                    code: None,
                    message: "invalid server type".to_string(),
                }))
            }),
            needs_update: None,
            update: None,
        };
        let cancel = CancellationToken::new();
        let result = ensure("thing", ops, &cancel).await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn delete_is_idempotent_on_absence() {
        let ops: DeleteOps<Dummy> = DeleteOps {
            get: Box::new(|| box_fut(Ok(None))),
            delete: Box::new(|_: &Dummy| box_fut(Ok(()))),
        };
        let cancel = CancellationToken::new();
        delete("thing", ops, &cancel, Duration::from_secs(5))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_runs_delete_when_present() {
        let ops = DeleteOps {
            get: Box::new(|| box_fut(Ok(Some(Dummy { version: 1 })))),
            delete: Box::new(|_: &Dummy| box_fut(Ok(()))),
        };
        let cancel = CancellationToken::new();
        delete("thing", ops, &cancel, Duration::from_secs(5))
            .await
            .unwrap();
    }
}
