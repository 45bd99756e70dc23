//! Hetzner Cloud HTTP client: request/response plumbing and error mapping.
//!
//! Shape carried over from the Hetzner Robot client this crate used to
//! speak to (Bearer-token auth and JSON bodies instead of Basic auth and
//! form-encoded bodies, `Action` polling instead of transaction polling),
//! but the same `get`/`post`/`put`/`delete` plus `handle_response` split.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::models::{Action, ActionEnvelope, ActionsEnvelope};

const DEFAULT_BASE_URL: &str = "https://api.hetzner.cloud/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const ACTION_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Errors surfaced by the Hetzner Cloud client. `classify::classify`
/// inspects `Api` to bucket it into a retry/fatal kind.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Hetzner API error ({status}{}): {message}", code.as_deref().map(|c| format!(" {c}")).unwrap_or_default())]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("action {action_id} failed: {message}")]
    ActionFailed { action_id: u64, message: String },

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("response deserialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A thin wrapper over `reqwest::Client` bound to a token and base URL.
/// Every call is fire-and-forget at the HTTP level: the client holds no
/// per-resource state between calls.
#[derive(Clone)]
pub struct HetznerCloudClient {
    http: Client,
    base_url: String,
    token: String,
}

impl HetznerCloudClient {
    /// Build a client from `HCLOUD_TOKEN` (or the token supplied directly).
    /// The token is passed explicitly rather than read from a process-wide
    /// global, so callers decide its lifetime.
    ///
    /// # Errors
    /// Returns an error if the underlying `reqwest::Client` cannot be built.
    pub fn new(token: impl Into<String>) -> Result<Self, ProviderError> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// As `new`, but against an explicit base URL — used by tests to point
    /// at a `wiremock` server.
    pub fn with_base_url(
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> Result<T, ProviderError> {
        debug!(method = %method, path, "hetzner cloud request");
        let mut request = self
            .http
            .request(method, self.url(path))
            .bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            if text.trim().is_empty() {
                return serde_json::from_str("null").map_err(ProviderError::Serialization);
            }
            return serde_json::from_str(&text).map_err(ProviderError::Serialization);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(text));
        }

        #[derive(serde::Deserialize)]
        struct ErrorEnvelope {
            error: ErrorBody,
        }
        #[derive(serde::Deserialize)]
        struct ErrorBody {
            code: String,
            message: String,
        }

        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&text) {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                code: Some(envelope.error.code),
                message: envelope.error.message,
            });
        }

        Err(ProviderError::Api {
            status: status.as_u16(),
            code: None,
            message: text,
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
        self.execute(Method::GET, path, None::<&()>).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ProviderError> {
        self.execute(Method::POST, path, Some(body)).await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ProviderError> {
        self.execute(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ProviderError> {
        self.execute::<serde_json::Value>(Method::DELETE, path, None::<&()>)
            .await?;
        Ok(())
    }

    /// Poll `/actions/{id}` until it leaves the `running` state.
    pub async fn wait_for_action(&self, action: &Action) -> Result<(), ProviderError> {
        let mut current = action.clone();
        loop {
            match current.status.as_str() {
                "success" => return Ok(()),
                "error" => {
                    return Err(ProviderError::ActionFailed {
                        action_id: current.id,
                        message: current
                            .error
                            .map(|e| e.message)
                            .unwrap_or_else(|| "action failed".to_string()),
                    })
                }
                _ => {
                    tokio::time::sleep(ACTION_POLL_INTERVAL).await;
                    let envelope: ActionEnvelope =
                        self.get(&format!("/actions/{}", current.id)).await?;
                    current = envelope.action;
                }
            }
        }
    }

    /// Wait on every action in a batch response (e.g. firewall `set_rules`).
    pub async fn wait_for_actions(&self, envelope: ActionsEnvelope) -> Result<(), ProviderError> {
        for action in envelope.actions {
            self.wait_for_action(&action).await?;
        }
        Ok(())
    }
}
