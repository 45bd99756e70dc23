//! SSH key adapter. Keys are immutable once uploaded: there is no update
//! path, only create-if-absent.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::client::{HetznerCloudClient, ProviderError};
use super::models::{CreateSshKeyRequest, Labels, SshKey, SshKeyEnvelope, SshKeysEnvelope};
use crate::reconciler::{delete, ensure, BoxFuture, DeleteOps, EnsureOps, ReconcileError};

pub struct SshKeySpec {
    pub name: String,
    pub public_key: String,
    pub labels: Labels,
}

async fn find_by_name(
    client: &HetznerCloudClient,
    name: &str,
) -> Result<Option<SshKey>, ProviderError> {
    let envelope: SshKeysEnvelope = client.get(&format!("/ssh_keys?name={name}")).await?;
    Ok(envelope.ssh_keys.into_iter().next())
}

pub async fn ensure_ssh_key(
    client: &HetznerCloudClient,
    spec: SshKeySpec,
    cancel: &CancellationToken,
) -> Result<SshKey, ReconcileError> {
    info!(name = %spec.name, "ensuring ssh key");
    let name = spec.name.clone();
    let public_key = spec.public_key.clone();
    let labels = spec.labels.clone();

    let ops = EnsureOps {
        get: Box::new({
            let name = name.clone();
            move || -> BoxFuture<'_, Result<Option<SshKey>, ProviderError>> {
                let name = name.clone();
                Box::pin(async move { find_by_name(client, &name).await })
            }
        }),
        create: Box::new({
            let name = name.clone();
            let public_key = public_key.clone();
            let labels = labels.clone();
            move || -> BoxFuture<'_, Result<SshKey, ProviderError>> {
                let body = CreateSshKeyRequest {
                    name: name.clone(),
                    public_key: public_key.clone(),
                    labels: labels.clone(),
                };
                Box::pin(async move {
                    let envelope: SshKeyEnvelope = client.post("/ssh_keys", &body).await?;
                    Ok(envelope.ssh_key)
                })
            }
        }),
        needs_update: None,
        update: None,
    };

    ensure(&format!("ssh_key/{name}"), ops, cancel).await
}

pub async fn delete_ssh_key(
    client: &HetznerCloudClient,
    name: &str,
    cancel: &CancellationToken,
    timeout: Duration,
) -> Result<(), ReconcileError> {
    info!(name, "deleting ssh key");
    let ops = DeleteOps {
        get: Box::new({
            let name = name.to_string();
            move || -> BoxFuture<'_, Result<Option<SshKey>, ProviderError>> {
                let name = name.clone();
                Box::pin(async move { find_by_name(client, &name).await })
            }
        }),
        delete: Box::new(move |existing: &SshKey| -> BoxFuture<'_, Result<(), ProviderError>> {
            let id = existing.id;
            Box::pin(async move { client.delete(&format!("/ssh_keys/{id}")).await })
        }),
    };
    delete(&format!("ssh_key/{name}"), ops, cancel, timeout).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_when_absent() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/ssh_keys"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"ssh_keys": []})),
            )
            .mount(&server)
            .await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/ssh_keys"))
            .respond_with(wiremock::ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "ssh_key": {"id": 1, "name": "k8zner", "fingerprint": "aa:bb", "public_key": "ssh-ed25519 AAAA"}
            })))
            .mount(&server)
            .await;

        let client = HetznerCloudClient::with_base_url("token", server.uri()).unwrap();
        let cancel = CancellationToken::new();
        let key = ensure_ssh_key(
            &client,
            SshKeySpec {
                name: "k8zner".to_string(),
                public_key: "ssh-ed25519 AAAA".to_string(),
                labels: Labels::new(),
            },
            &cancel,
        )
        .await
        .unwrap();
        assert_eq!(key.id, 1);
    }

    #[tokio::test]
    async fn no_op_when_present() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/ssh_keys"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ssh_keys": [{"id": 7, "name": "k8zner", "fingerprint": "aa:bb", "public_key": "ssh-ed25519 AAAA"}]
            })))
            .mount(&server)
            .await;

        let client = HetznerCloudClient::with_base_url("token", server.uri()).unwrap();
        let cancel = CancellationToken::new();
        let key = ensure_ssh_key(
            &client,
            SshKeySpec {
                name: "k8zner".to_string(),
                public_key: "ssh-ed25519 AAAA".to_string(),
                labels: Labels::new(),
            },
            &cancel,
        )
        .await
        .unwrap();
        assert_eq!(key.id, 7);
    }
}
