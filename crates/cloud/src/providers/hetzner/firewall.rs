//! Firewall adapter. Rules are treated as a single reconciled unit: every
//! `Ensure` re-applies the full rule set via `SetRules` rather than diffing.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::client::{HetznerCloudClient, ProviderError};
use super::models::{
    CreateFirewallRequest, Firewall, FirewallEnvelope, FirewallRule, FirewallsEnvelope,
    Labels, SetRulesRequest,
};
use crate::reconciler::{delete, ensure, BoxFuture, DeleteOps, EnsureOps, ReconcileError};

pub struct FirewallSpec {
    pub name: String,
    pub rules: Vec<FirewallRule>,
    pub labels: Labels,
}

async fn find_by_name(
    client: &HetznerCloudClient,
    name: &str,
) -> Result<Option<Firewall>, ProviderError> {
    let envelope: FirewallsEnvelope = client.get(&format!("/firewalls?name={name}")).await?;
    Ok(envelope.firewalls.into_iter().next())
}

pub async fn ensure_firewall(
    client: &HetznerCloudClient,
    spec: FirewallSpec,
    cancel: &CancellationToken,
) -> Result<Firewall, ReconcileError> {
    info!(name = %spec.name, "ensuring firewall");
    let name = spec.name.clone();
    let rules = spec.rules.clone();
    let labels = spec.labels.clone();

    let ops = EnsureOps {
        get: Box::new({
            let name = name.clone();
            move || -> BoxFuture<'_, Result<Option<Firewall>, ProviderError>> {
                let name = name.clone();
                Box::pin(async move { find_by_name(client, &name).await })
            }
        }),
        create: Box::new({
            let name = name.clone();
            let rules = rules.clone();
            let labels = labels.clone();
            move || -> BoxFuture<'_, Result<Firewall, ProviderError>> {
                let body = CreateFirewallRequest {
                    name: name.clone(),
                    rules: rules.clone(),
                    labels: labels.clone(),
                };
                Box::pin(async move {
                    let envelope: FirewallEnvelope = client.post("/firewalls", &body).await?;
                    Ok(envelope.firewall)
                })
            }
        }),
        // Rules are always reconciled: drift detection on a rule list is
        // more complex than just reapplying it every time.
        needs_update: Some(Box::new(|_: &Firewall| true)),
        update: Some(Box::new({
            let rules = rules.clone();
            move |existing: &Firewall| -> BoxFuture<'_, Result<Option<Firewall>, ProviderError>> {
                let id = existing.id;
                let rules = rules.clone();
                Box::pin(async move {
                    let body = SetRulesRequest { rules: rules.clone() };
                    let envelope: crate::providers::hetzner::models::ActionsEnvelope =
                        client.post(&format!("/firewalls/{id}/actions/set_rules"), &body).await?;
                    client.wait_for_actions(envelope).await?;
                    Ok(None)
                })
            }
        })),
    };

    ensure(&format!("firewall/{name}"), ops, cancel).await
}

pub async fn delete_firewall(
    client: &HetznerCloudClient,
    name: &str,
    cancel: &CancellationToken,
    timeout: Duration,
) -> Result<(), ReconcileError> {
    info!(name, "deleting firewall");
    let ops = DeleteOps {
        get: Box::new({
            let name = name.to_string();
            move || -> BoxFuture<'_, Result<Option<Firewall>, ProviderError>> {
                let name = name.clone();
                Box::pin(async move { find_by_name(client, &name).await })
            }
        }),
        delete: Box::new(move |existing: &Firewall| -> BoxFuture<'_, Result<(), ProviderError>> {
            let id = existing.id;
            Box::pin(async move { client.delete(&format!("/firewalls/{id}")).await })
        }),
    };
    delete(&format!("firewall/{name}"), ops, cancel, timeout).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> FirewallRule {
        FirewallRule {
            direction: "in".to_string(),
            protocol: "tcp".to_string(),
            port: Some("6443".to_string()),
            source_ips: vec!["0.0.0.0/0".to_string()],
            destination_ips: vec![],
        }
    }

    #[tokio::test]
    async fn creates_firewall_when_absent() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/firewalls"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"firewalls": []})),
            )
            .mount(&server)
            .await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/firewalls"))
            .respond_with(wiremock::ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "firewall": {"id": 1, "name": "k8zner", "rules": [], "labels": {}}
            })))
            .mount(&server)
            .await;

        let client = HetznerCloudClient::with_base_url("token", server.uri()).unwrap();
        let cancel = CancellationToken::new();
        let firewall = ensure_firewall(
            &client,
            FirewallSpec { name: "k8zner".to_string(), rules: vec![rule()], labels: Labels::new() },
            &cancel,
        )
        .await
        .unwrap();
        assert_eq!(firewall.id, 1);
    }

    #[tokio::test]
    async fn reapplies_rules_when_present() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/firewalls"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "firewalls": [{"id": 9, "name": "k8zner", "rules": [], "labels": {}}]
            })))
            .mount(&server)
            .await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/firewalls/9/actions/set_rules"))
            .respond_with(wiremock::ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "actions": [{"id": 5, "status": "success", "progress": 100, "error": null}]
            })))
            .mount(&server)
            .await;

        let client = HetznerCloudClient::with_base_url("token", server.uri()).unwrap();
        let cancel = CancellationToken::new();
        let firewall = ensure_firewall(
            &client,
            FirewallSpec { name: "k8zner".to_string(), rules: vec![rule()], labels: Labels::new() },
            &cancel,
        )
        .await
        .unwrap();
        assert_eq!(firewall.id, 9);
    }
}
