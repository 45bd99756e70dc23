//! Floating IP adapter: simple existence-gated create, no update path.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::client::{HetznerCloudClient, ProviderError};
use super::models::{CreateFloatingIpRequest, FloatingIp, FloatingIpEnvelope, FloatingIpsEnvelope, Labels};
use crate::reconciler::{delete, ensure, BoxFuture, DeleteOps, EnsureOps, ReconcileError};

pub struct FloatingIpSpec {
    pub name: String,
    pub kind: String,
    pub home_location: String,
    pub labels: Labels,
}

async fn find_by_name(
    client: &HetznerCloudClient,
    name: &str,
) -> Result<Option<FloatingIp>, ProviderError> {
    let envelope: FloatingIpsEnvelope = client.get(&format!("/floating_ips?name={name}")).await?;
    Ok(envelope.floating_ips.into_iter().next())
}

pub async fn ensure_floating_ip(
    client: &HetznerCloudClient,
    spec: FloatingIpSpec,
    cancel: &CancellationToken,
) -> Result<FloatingIp, ReconcileError> {
    info!(name = %spec.name, "ensuring floating ip");
    let name = spec.name.clone();
    let kind = spec.kind.clone();
    let home_location = spec.home_location.clone();
    let labels = spec.labels.clone();

    let ops = EnsureOps {
        get: Box::new({
            let name = name.clone();
            move || -> BoxFuture<'_, Result<Option<FloatingIp>, ProviderError>> {
                let name = name.clone();
                Box::pin(async move { find_by_name(client, &name).await })
            }
        }),
        create: Box::new({
            let name = name.clone();
            let kind = kind.clone();
            let home_location = home_location.clone();
            let labels = labels.clone();
            move || -> BoxFuture<'_, Result<FloatingIp, ProviderError>> {
                let body = CreateFloatingIpRequest {
                    kind: kind.clone(),
                    name: name.clone(),
                    home_location: home_location.clone(),
                    labels: labels.clone(),
                };
                Box::pin(async move {
                    let envelope: FloatingIpEnvelope = client.post("/floating_ips", &body).await?;
                    Ok(envelope.floating_ip)
                })
            }
        }),
        needs_update: None,
        update: None,
    };

    ensure(&format!("floating_ip/{name}"), ops, cancel).await
}

pub async fn delete_floating_ip(
    client: &HetznerCloudClient,
    name: &str,
    cancel: &CancellationToken,
    timeout: Duration,
) -> Result<(), ReconcileError> {
    info!(name, "deleting floating ip");
    let ops = DeleteOps {
        get: Box::new({
            let name = name.to_string();
            move || -> BoxFuture<'_, Result<Option<FloatingIp>, ProviderError>> {
                let name = name.clone();
                Box::pin(async move { find_by_name(client, &name).await })
            }
        }),
        delete: Box::new(move |existing: &FloatingIp| -> BoxFuture<'_, Result<(), ProviderError>> {
            let id = existing.id;
            Box::pin(async move { client.delete(&format!("/floating_ips/{id}")).await })
        }),
    };
    delete(&format!("floating_ip/{name}"), ops, cancel, timeout).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_when_absent() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/floating_ips"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"floating_ips": []})),
            )
            .mount(&server)
            .await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/floating_ips"))
            .respond_with(wiremock::ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "floating_ip": {"id": 1, "name": "k8zner-ingress", "type": "ipv4", "ip": "1.2.3.4", "labels": {}}
            })))
            .mount(&server)
            .await;

        let client = HetznerCloudClient::with_base_url("token", server.uri()).unwrap();
        let cancel = CancellationToken::new();
        let ip = ensure_floating_ip(
            &client,
            FloatingIpSpec {
                name: "k8zner-ingress".to_string(),
                kind: "ipv4".to_string(),
                home_location: "nbg1".to_string(),
                labels: Labels::new(),
            },
            &cancel,
        )
        .await
        .unwrap();
        assert_eq!(ip.id, 1);
    }
}
