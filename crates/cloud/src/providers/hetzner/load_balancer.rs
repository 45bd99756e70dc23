//! Load balancer adapter. Services are reconciled idempotently by listening
//! port; network attachment is reconciled idempotently by checking the
//! load balancer's own `private_net` list for the target network ID.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::client::{HetznerCloudClient, ProviderError};
use super::models::{
    AddServiceRequest, ActionEnvelope, AttachToNetworkRequest, CreateLoadBalancerRequest, Labels,
    LoadBalancer, LoadBalancerEnvelope, LoadBalancerService, LoadBalancersEnvelope,
};
use crate::reconciler::{delete, ensure, BoxFuture, DeleteOps, EnsureOps, ReconcileError};

pub struct LoadBalancerSpec {
    pub name: String,
    pub load_balancer_type: String,
    pub location: String,
    pub services: Vec<LoadBalancerService>,
    pub network_id: Option<u64>,
    pub labels: Labels,
}

async fn find_by_name(
    client: &HetznerCloudClient,
    name: &str,
) -> Result<Option<LoadBalancer>, ProviderError> {
    let envelope: LoadBalancersEnvelope =
        client.get(&format!("/load_balancers?name={name}")).await?;
    Ok(envelope.load_balancers.into_iter().next())
}

fn missing_services<'a>(
    existing: &LoadBalancer,
    wanted: &'a [LoadBalancerService],
) -> Vec<&'a LoadBalancerService> {
    wanted
        .iter()
        .filter(|w| !existing.services.iter().any(|s| s.listen_port == w.listen_port))
        .collect()
}

pub async fn ensure_load_balancer(
    client: &HetznerCloudClient,
    spec: LoadBalancerSpec,
    cancel: &CancellationToken,
) -> Result<LoadBalancer, ReconcileError> {
    info!(name = %spec.name, "ensuring load balancer");
    let name = spec.name.clone();
    let load_balancer_type = spec.load_balancer_type.clone();
    let location = spec.location.clone();
    let services = spec.services.clone();
    let network_id = spec.network_id;
    let labels = spec.labels.clone();

    let ops = EnsureOps {
        get: Box::new({
            let name = name.clone();
            move || -> BoxFuture<'_, Result<Option<LoadBalancer>, ProviderError>> {
                let name = name.clone();
                Box::pin(async move { find_by_name(client, &name).await })
            }
        }),
        create: Box::new({
            let name = name.clone();
            let load_balancer_type = load_balancer_type.clone();
            let location = location.clone();
            let services = services.clone();
            let labels = labels.clone();
            move || -> BoxFuture<'_, Result<LoadBalancer, ProviderError>> {
                let body = CreateLoadBalancerRequest {
                    name: name.clone(),
                    load_balancer_type: load_balancer_type.clone(),
                    location: location.clone(),
                    public_interface: true,
                    services: services.clone(),
                    labels: labels.clone(),
                };
                Box::pin(async move {
                    let envelope: LoadBalancerEnvelope =
                        client.post("/load_balancers", &body).await?;
                    let lb_id = envelope.load_balancer.id;
                    if let Some(network_id) = network_id {
                        let attach_body = AttachToNetworkRequest { network: network_id };
                        let action: ActionEnvelope = client
                            .post(&format!("/load_balancers/{lb_id}/actions/attach_to_network"), &attach_body)
                            .await?;
                        client.wait_for_action(&action.action).await?;
                    }
                    Ok(envelope.load_balancer)
                })
            }
        }),
        needs_update: Some(Box::new({
            let services = services.clone();
            move |existing: &LoadBalancer| {
                !missing_services(existing, &services).is_empty()
                    || network_id.is_some_and(|id| !network_attached(existing, id))
            }
        })),
        update: Some(Box::new(move |existing: &LoadBalancer| -> BoxFuture<'_, Result<Option<LoadBalancer>, ProviderError>> {
            let lb_id = existing.id;
            let missing: Vec<LoadBalancerService> =
                missing_services(existing, &services).into_iter().cloned().collect();
            let needs_attach = network_id.is_some_and(|id| !network_attached(existing, id));
            Box::pin(async move {
                for service in missing {
                    let body = AddServiceRequest {
                        protocol: service.protocol,
                        listen_port: service.listen_port,
                        destination_port: service.destination_port,
                    };
                    let action: ActionEnvelope = client
                        .post(&format!("/load_balancers/{lb_id}/actions/add_service"), &body)
                        .await?;
                    client.wait_for_action(&action.action).await?;
                }
                if needs_attach {
                    if let Some(network_id) = network_id {
                        let attach_body = AttachToNetworkRequest { network: network_id };
                        let action: ActionEnvelope = client
                            .post(&format!("/load_balancers/{lb_id}/actions/attach_to_network"), &attach_body)
                            .await?;
                        client.wait_for_action(&action.action).await?;
                    }
                }
                Ok(None)
            })
        })),
    };

    ensure(&format!("load_balancer/{name}"), ops, cancel).await
}

pub async fn delete_load_balancer(
    client: &HetznerCloudClient,
    name: &str,
    cancel: &CancellationToken,
    timeout: Duration,
) -> Result<(), ReconcileError> {
    info!(name, "deleting load balancer");
    let ops = DeleteOps {
        get: Box::new({
            let name = name.to_string();
            move || -> BoxFuture<'_, Result<Option<LoadBalancer>, ProviderError>> {
                let name = name.clone();
                Box::pin(async move { find_by_name(client, &name).await })
            }
        }),
        delete: Box::new(move |existing: &LoadBalancer| -> BoxFuture<'_, Result<(), ProviderError>> {
            let id = existing.id;
            Box::pin(async move { client.delete(&format!("/load_balancers/{id}")).await })
        }),
    };
    delete(&format!("load_balancer/{name}"), ops, cancel, timeout).await
}

fn network_attached(existing: &LoadBalancer, network_id: u64) -> bool {
    existing.private_net.iter().any(|n| n.network == network_id)
}
