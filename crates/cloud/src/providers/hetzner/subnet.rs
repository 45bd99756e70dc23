//! Subnet adapter. A subnet is a child resource of a network: there is no
//! standalone `/subnets` endpoint, only `POST /networks/{id}/actions/add_subnet`.
//! Deleting the parent network removes its subnets, so this adapter has no
//! standalone delete path.

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::client::{HetznerCloudClient, ProviderError};
use super::models::{AddSubnetRequest, Network, NetworkActionEnvelope};
use crate::reconciler::{ensure, BoxFuture, EnsureOps, ReconcileError};

pub struct SubnetSpec {
    pub network_id: u64,
    pub ip_range: String,
    pub network_zone: String,
    pub kind: String,
}

/// A subnet has no identity of its own once created; existence is
/// represented as `()` and matched by exact `ip_range` equality.
fn find_matching(network: &Network, ip_range: &str) -> Option<()> {
    network.subnets.iter().any(|s| s.ip_range == ip_range).then_some(())
}

pub async fn ensure_subnet(
    client: &HetznerCloudClient,
    spec: SubnetSpec,
    cancel: &CancellationToken,
) -> Result<(), ReconcileError> {
    info!(network_id = spec.network_id, ip_range = %spec.ip_range, "ensuring subnet");
    let network_id = spec.network_id;
    let ip_range = spec.ip_range.clone();
    let network_zone = spec.network_zone.clone();
    let kind = spec.kind.clone();

    let ops = EnsureOps {
        get: Box::new({
            let ip_range = ip_range.clone();
            move || -> BoxFuture<'_, Result<Option<()>, ProviderError>> {
                let ip_range = ip_range.clone();
                Box::pin(async move {
                    let network: Network = client.get(&format!("/networks/{network_id}")).await?;
                    Ok(find_matching(&network, &ip_range))
                })
            }
        }),
        create: Box::new({
            let ip_range = ip_range.clone();
            let network_zone = network_zone.clone();
            let kind = kind.clone();
            move || -> BoxFuture<'_, Result<(), ProviderError>> {
                let body = AddSubnetRequest {
                    kind: kind.clone(),
                    ip_range: ip_range.clone(),
                    network_zone: network_zone.clone(),
                };
                Box::pin(async move {
                    let envelope: NetworkActionEnvelope = client
                        .post(&format!("/networks/{network_id}/actions/add_subnet"), &body)
                        .await?;
                    client.wait_for_action(&envelope.action).await
                })
            }
        }),
        needs_update: None,
        update: None,
    };

    ensure(&format!("subnet/{ip_range}"), ops, cancel).await
}
