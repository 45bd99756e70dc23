//! Idempotent reconciliation of Hetzner Cloud resources.
//!
//! The generic `Ensure`/`Delete` skeletons in [`reconciler`] carry all retry,
//! concurrency, and timeout policy; [`providers::hetzner`] supplies one
//! adapter per resource kind that only knows how to `get`/`create`/`update`/
//! `delete` that single kind. [`classify`] turns a raw [`providers::hetzner::client::ProviderError`]
//! into a retry/fatal decision, and [`retry`] is the backoff engine both the
//! reconciler and any adapter-level polling loop run on.

pub mod classify;
pub mod providers;
pub mod reconciler;
pub mod retry;
pub mod timeouts;

pub use classify::{classify, is_retryable, ErrorKind};
pub use providers::hetzner;
pub use reconciler::{delete, ensure, BoxFuture, DeleteOps, EnsureOps, ReconcileError};
pub use retry::{fatal, is_fatal, with_exponential_backoff, Fatal, RetryOptions};
pub use timeouts::Timeouts;
