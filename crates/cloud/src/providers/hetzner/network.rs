//! Network adapter. `Update` is defined but always fails: an IP range change
//! is not permitted in place, the caller must destroy and recreate.

use std::collections::HashMap;
use std::time::Duration;

use tracing::info;

use tokio_util::sync::CancellationToken;

use super::client::{HetznerCloudClient, ProviderError};
use super::models::{CreateNetworkRequest, Network, NetworkEnvelope, NetworksEnvelope};
use crate::reconciler::{delete, ensure, BoxFuture, DeleteOps, EnsureOps, ReconcileError};

pub struct NetworkSpec {
    pub name: String,
    pub ip_range: String,
    pub labels: HashMap<String, String>,
}

async fn find_by_name(
    client: &HetznerCloudClient,
    name: &str,
) -> Result<Option<Network>, ProviderError> {
    let envelope: NetworksEnvelope = client.get(&format!("/networks?name={name}")).await?;
    Ok(envelope.networks.into_iter().next())
}

pub async fn ensure_network(
    client: &HetznerCloudClient,
    spec: NetworkSpec,
    cancel: &CancellationToken,
) -> Result<Network, ReconcileError> {
    info!(name = %spec.name, "ensuring network");
    let name = spec.name.clone();
    let ip_range = spec.ip_range.clone();
    let labels = spec.labels.clone();

    let ops = EnsureOps {
        get: Box::new({
            let name = name.clone();
            move || -> BoxFuture<'_, Result<Option<Network>, ProviderError>> {
                let name = name.clone();
                Box::pin(async move { find_by_name(client, &name).await })
            }
        }),
        create: Box::new({
            let name = name.clone();
            let ip_range = ip_range.clone();
            let labels = labels.clone();
            move || -> BoxFuture<'_, Result<Network, ProviderError>> {
                let body = CreateNetworkRequest {
                    name: name.clone(),
                    ip_range: ip_range.clone(),
                    labels: labels.clone(),
                };
                Box::pin(async move {
                    let envelope: NetworkEnvelope = client.post("/networks", &body).await?;
                    Ok(envelope.network)
                })
            }
        }),
        needs_update: Some(Box::new({
            let ip_range = spec.ip_range.clone();
            move |existing: &Network| existing.ip_range != ip_range
        })),
        update: Some(Box::new(|_existing: &Network| -> BoxFuture<'_, Result<Option<Network>, ProviderError>> {
            Box::pin(async move {
                Err(ProviderError::Api {
                    status: 409,
                    code: Some("ip_range_immutable".to_string()),
                    message: "network IP range cannot be changed in place; destroy and recreate"
                        .to_string(),
                })
            })
        })),
    };

    ensure(&format!("network/{name}"), ops, cancel).await
}

pub async fn delete_network(
    client: &HetznerCloudClient,
    name: &str,
    cancel: &CancellationToken,
    timeout: Duration,
) -> Result<(), ReconcileError> {
    info!(name, "deleting network");
    let ops = DeleteOps {
        get: Box::new({
            let name = name.to_string();
            move || -> BoxFuture<'_, Result<Option<Network>, ProviderError>> {
                let name = name.clone();
                Box::pin(async move { find_by_name(client, &name).await })
            }
        }),
        delete: Box::new(move |existing: &Network| -> BoxFuture<'_, Result<(), ProviderError>> {
            let id = existing.id;
            Box::pin(async move { client.delete(&format!("/networks/{id}")).await })
        }),
    };
    delete(&format!("network/{name}"), ops, cancel, timeout).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_network_when_absent() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/networks"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"networks": []})),
            )
            .mount(&server)
            .await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/networks"))
            .respond_with(wiremock::ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "network": {
                    "id": 1, "name": "k8zner", "ip_range": "10.0.0.0/16",
                    "subnets": [], "labels": {}
                }
            })))
            .mount(&server)
            .await;

        let client = HetznerCloudClient::with_base_url("token", server.uri()).unwrap();
        let cancel = CancellationToken::new();
        let network = ensure_network(
            &client,
            NetworkSpec {
                name: "k8zner".to_string(),
                ip_range: "10.0.0.0/16".to_string(),
                labels: HashMap::new(),
            },
            &cancel,
        )
        .await
        .unwrap();
        assert_eq!(network.id, 1);
    }

    #[tokio::test]
    async fn no_op_when_ip_range_matches() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/networks"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "networks": [{
                        "id": 7, "name": "k8zner", "ip_range": "10.0.0.0/16",
                        "subnets": [], "labels": {}
                    }]
                })),
            )
            .mount(&server)
            .await;

        let client = HetznerCloudClient::with_base_url("token", server.uri()).unwrap();
        let cancel = CancellationToken::new();
        let network = ensure_network(
            &client,
            NetworkSpec {
                name: "k8zner".to_string(),
                ip_range: "10.0.0.0/16".to_string(),
                labels: HashMap::new(),
            },
            &cancel,
        )
        .await
        .unwrap();
        assert_eq!(network.id, 7);
    }

    #[tokio::test]
    async fn delete_is_idempotent_when_already_absent() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/networks"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"networks": []})),
            )
            .mount(&server)
            .await;

        let client = HetznerCloudClient::with_base_url("token", server.uri()).unwrap();
        let cancel = CancellationToken::new();
        delete_network(&client, "k8zner", &cancel, Duration::from_secs(5))
            .await
            .unwrap();
    }
}
