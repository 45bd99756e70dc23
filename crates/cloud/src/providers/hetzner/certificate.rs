//! Certificate adapter: simple existence-gated create, no update path.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::client::{HetznerCloudClient, ProviderError};
use super::models::{Certificate, CertificateEnvelope, CertificatesEnvelope, CreateCertificateRequest, Labels};
use crate::reconciler::{delete, ensure, BoxFuture, DeleteOps, EnsureOps, ReconcileError};

pub struct CertificateSpec {
    pub name: String,
    pub kind: String,
    pub domain_names: Vec<String>,
    pub labels: Labels,
}

async fn find_by_name(
    client: &HetznerCloudClient,
    name: &str,
) -> Result<Option<Certificate>, ProviderError> {
    let envelope: CertificatesEnvelope = client.get(&format!("/certificates?name={name}")).await?;
    Ok(envelope.certificates.into_iter().next())
}

pub async fn ensure_certificate(
    client: &HetznerCloudClient,
    spec: CertificateSpec,
    cancel: &CancellationToken,
) -> Result<Certificate, ReconcileError> {
    info!(name = %spec.name, "ensuring certificate");
    let name = spec.name.clone();
    let kind = spec.kind.clone();
    let domain_names = spec.domain_names.clone();
    let labels = spec.labels.clone();

    let ops = EnsureOps {
        get: Box::new({
            let name = name.clone();
            move || -> BoxFuture<'_, Result<Option<Certificate>, ProviderError>> {
                let name = name.clone();
                Box::pin(async move { find_by_name(client, &name).await })
            }
        }),
        create: Box::new({
            let name = name.clone();
            let kind = kind.clone();
            let domain_names = domain_names.clone();
            let labels = labels.clone();
            move || -> BoxFuture<'_, Result<Certificate, ProviderError>> {
                let body = CreateCertificateRequest {
                    name: name.clone(),
                    kind: kind.clone(),
                    domain_names: domain_names.clone(),
                    labels: labels.clone(),
                };
                Box::pin(async move {
                    let envelope: CertificateEnvelope = client.post("/certificates", &body).await?;
                    Ok(envelope.certificate)
                })
            }
        }),
        needs_update: None,
        update: None,
    };

    ensure(&format!("certificate/{name}"), ops, cancel).await
}

pub async fn delete_certificate(
    client: &HetznerCloudClient,
    name: &str,
    cancel: &CancellationToken,
    timeout: Duration,
) -> Result<(), ReconcileError> {
    info!(name, "deleting certificate");
    let ops = DeleteOps {
        get: Box::new({
            let name = name.to_string();
            move || -> BoxFuture<'_, Result<Option<Certificate>, ProviderError>> {
                let name = name.clone();
                Box::pin(async move { find_by_name(client, &name).await })
            }
        }),
        delete: Box::new(move |existing: &Certificate| -> BoxFuture<'_, Result<(), ProviderError>> {
            let id = existing.id;
            Box::pin(async move { client.delete(&format!("/certificates/{id}")).await })
        }),
    };
    delete(&format!("certificate/{name}"), ops, cancel, timeout).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_when_absent() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/certificates"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"certificates": []})),
            )
            .mount(&server)
            .await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/certificates"))
            .respond_with(wiremock::ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "certificate": {"id": 1, "name": "k8zner", "type": "managed", "labels": {}}
            })))
            .mount(&server)
            .await;

        let client = HetznerCloudClient::with_base_url("token", server.uri()).unwrap();
        let cancel = CancellationToken::new();
        let cert = ensure_certificate(
            &client,
            CertificateSpec {
                name: "k8zner".to_string(),
                kind: "managed".to_string(),
                domain_names: vec!["example.com".to_string()],
                labels: Labels::new(),
            },
            &cancel,
        )
        .await
        .unwrap();
        assert_eq!(cert.id, 1);
    }
}
