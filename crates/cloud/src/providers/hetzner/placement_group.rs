//! Placement group adapter: simple existence-gated create, no update path.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::client::{HetznerCloudClient, ProviderError};
use super::models::{
    CreatePlacementGroupRequest, Labels, PlacementGroup, PlacementGroupEnvelope,
    PlacementGroupsEnvelope,
};
use crate::reconciler::{delete, ensure, BoxFuture, DeleteOps, EnsureOps, ReconcileError};

pub struct PlacementGroupSpec {
    pub name: String,
    pub kind: String,
    pub labels: Labels,
}

async fn find_by_name(
    client: &HetznerCloudClient,
    name: &str,
) -> Result<Option<PlacementGroup>, ProviderError> {
    let envelope: PlacementGroupsEnvelope =
        client.get(&format!("/placement_groups?name={name}")).await?;
    Ok(envelope.placement_groups.into_iter().next())
}

pub async fn ensure_placement_group(
    client: &HetznerCloudClient,
    spec: PlacementGroupSpec,
    cancel: &CancellationToken,
) -> Result<PlacementGroup, ReconcileError> {
    info!(name = %spec.name, "ensuring placement group");
    let name = spec.name.clone();
    let kind = spec.kind.clone();
    let labels = spec.labels.clone();

    let ops = EnsureOps {
        get: Box::new({
            let name = name.clone();
            move || -> BoxFuture<'_, Result<Option<PlacementGroup>, ProviderError>> {
                let name = name.clone();
                Box::pin(async move { find_by_name(client, &name).await })
            }
        }),
        create: Box::new({
            let name = name.clone();
            let kind = kind.clone();
            let labels = labels.clone();
            move || -> BoxFuture<'_, Result<PlacementGroup, ProviderError>> {
                let body = CreatePlacementGroupRequest {
                    name: name.clone(),
                    kind: kind.clone(),
                    labels: labels.clone(),
                };
                Box::pin(async move {
                    let envelope: PlacementGroupEnvelope =
                        client.post("/placement_groups", &body).await?;
                    Ok(envelope.placement_group)
                })
            }
        }),
        needs_update: None,
        update: None,
    };

    ensure(&format!("placement_group/{name}"), ops, cancel).await
}

pub async fn delete_placement_group(
    client: &HetznerCloudClient,
    name: &str,
    cancel: &CancellationToken,
    timeout: Duration,
) -> Result<(), ReconcileError> {
    info!(name, "deleting placement group");
    let ops = DeleteOps {
        get: Box::new({
            let name = name.to_string();
            move || -> BoxFuture<'_, Result<Option<PlacementGroup>, ProviderError>> {
                let name = name.clone();
                Box::pin(async move { find_by_name(client, &name).await })
            }
        }),
        delete: Box::new(move |existing: &PlacementGroup| -> BoxFuture<'_, Result<(), ProviderError>> {
            let id = existing.id;
            Box::pin(async move { client.delete(&format!("/placement_groups/{id}")).await })
        }),
    };
    delete(&format!("placement_group/{name}"), ops, cancel, timeout).await
}
