//! Server adapter. `Create` is the most involved adapter in this crate: it
//! resolves four auxiliary objects before issuing the creation call, then
//! drives image-availability polling and (for privately networked servers)
//! a deferred network attach + poweron.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::client::{HetznerCloudClient, ProviderError};
use super::models::{
    ActionEnvelope, AttachToNetworkRequest, CreateServerRequest, Image, ImagesEnvelope, Labels,
    Location, LocationsEnvelope, Server, ServerCreatedEnvelope, ServerEnvelope, ServerType,
    ServerTypesEnvelope, ServersEnvelope, SshKey, SshKeysEnvelope,
};
use crate::reconciler::{delete, ensure, BoxFuture, DeleteOps, EnsureOps, ReconcileError};
use crate::timeouts::Timeouts;

const IMAGE_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Either a named snapshot/system image, or the `os=talos` snapshot family
/// (resolved by architecture and recency instead of by name).
pub enum ImageSelector {
    Named(String),
    LatestTalos,
}

pub struct ServerSpec {
    pub name: String,
    pub server_type: String,
    pub image: ImageSelector,
    pub location: String,
    pub ssh_key_names: Vec<String>,
    pub network_id: Option<u64>,
    pub placement_group_id: Option<u64>,
    pub labels: Labels,
}

async fn find_server_by_name(
    client: &HetznerCloudClient,
    name: &str,
) -> Result<Option<Server>, ProviderError> {
    let envelope: ServersEnvelope = client.get(&format!("/servers?name={name}")).await?;
    Ok(envelope.servers.into_iter().next())
}

async fn resolve_server_type(
    client: &HetznerCloudClient,
    name: &str,
) -> Result<ServerType, ProviderError> {
    let envelope: ServerTypesEnvelope =
        client.get(&format!("/server_types?name={name}")).await?;
    envelope
        .server_types
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::NotFound(format!("server type {name}")))
}

async fn resolve_location(
    client: &HetznerCloudClient,
    name: &str,
) -> Result<Location, ProviderError> {
    let envelope: LocationsEnvelope = client.get(&format!("/locations?name={name}")).await?;
    envelope
        .locations
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::NotFound(format!("location {name}")))
}

async fn resolve_ssh_keys(
    client: &HetznerCloudClient,
    names: &[String],
) -> Result<Vec<SshKey>, ProviderError> {
    let mut keys = Vec::with_capacity(names.len());
    for name in names {
        let envelope: SshKeysEnvelope = client.get(&format!("/ssh_keys?name={name}")).await?;
        let key = envelope
            .ssh_keys
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NotFound(format!("ssh key {name}")))?;
        keys.push(key);
    }
    Ok(keys)
}

/// Two resolution paths depending on the selector: the `os=talos` family is
/// matched by label and architecture then sorted newest-first; a named image
/// is fetched directly. Either way, if the result's architecture doesn't
/// match the server type, re-list by name+architecture and take the first
/// hit — the API can otherwise hand back a stale cross-architecture image.
async fn resolve_image(
    client: &HetznerCloudClient,
    selector: &ImageSelector,
    server_type: &ServerType,
) -> Result<Image, ProviderError> {
    let mut image = match selector {
        ImageSelector::LatestTalos => {
            let path = format!(
                "/images?label_selector=os%3Dtalos&architecture={}&sort=created:desc",
                server_type.architecture
            );
            let envelope: ImagesEnvelope = client.get(&path).await?;
            envelope
                .images
                .into_iter()
                .next()
                .ok_or_else(|| ProviderError::NotFound("talos snapshot".to_string()))?
        }
        ImageSelector::Named(name) => {
            let envelope: ImagesEnvelope = client.get(&format!("/images?name={name}")).await?;
            envelope
                .images
                .into_iter()
                .next()
                .ok_or_else(|| ProviderError::NotFound(format!("image {name}")))?
        }
    };

    if image.architecture != server_type.architecture {
        let name = image.name.clone().unwrap_or_default();
        let path = format!(
            "/images?name={name}&architecture={}",
            server_type.architecture
        );
        let envelope: ImagesEnvelope = client.get(&path).await?;
        image = envelope
            .images
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NotFound(format!("image {name} for architecture {}", server_type.architecture)))?;
    }

    Ok(image)
}

async fn wait_for_image_available(
    client: &HetznerCloudClient,
    image_id: u64,
    timeout: Duration,
) -> Result<(), ProviderError> {
    tokio::time::timeout(timeout, async move {
        loop {
            let envelope: super::models::ImageEnvelope =
                client.get(&format!("/images/{image_id}")).await?;
            if envelope.image.status == "available" {
                return Ok(());
            }
            tokio::time::sleep(IMAGE_POLL_INTERVAL).await;
        }
    })
    .await
    .unwrap_or_else(|_| Err(ProviderError::Timeout(format!("image {image_id} available"))))
}

pub async fn ensure_server(
    client: &HetznerCloudClient,
    spec: ServerSpec,
    timeouts: &Timeouts,
    cancel: &CancellationToken,
) -> Result<Server, ReconcileError> {
    info!(name = %spec.name, "ensuring server");
    let name = spec.name.clone();

    let ops = EnsureOps {
        get: Box::new({
            let name = name.clone();
            move || -> BoxFuture<'_, Result<Option<Server>, ProviderError>> {
                let name = name.clone();
                Box::pin(async move { find_server_by_name(client, &name).await })
            }
        }),
        create: Box::new(move || -> BoxFuture<'_, Result<Server, ProviderError>> {
            let name = spec.name.clone();
            let server_type_name = spec.server_type.clone();
            let location_name = spec.location.clone();
            let ssh_key_names = spec.ssh_key_names.clone();
            let labels = spec.labels.clone();
            let network_id = spec.network_id;
            let placement_group_id = spec.placement_group_id;
            let image_wait = timeouts.image_available;
            let selector = match &spec.image {
                ImageSelector::Named(n) => ImageSelector::Named(n.clone()),
                ImageSelector::LatestTalos => ImageSelector::LatestTalos,
            };

            Box::pin(async move {
                let server_type = resolve_server_type(client, &server_type_name).await?;
                let location = resolve_location(client, &location_name).await?;
                let ssh_keys = resolve_ssh_keys(client, &ssh_key_names).await?;
                let image = resolve_image(client, &selector, &server_type).await?;

                if image.status != "available" {
                    wait_for_image_available(client, image.id, image_wait).await?;
                }

                let start_after_create = network_id.is_none();
                let body = CreateServerRequest {
                    name: name.clone(),
                    server_type: server_type.name,
                    image: image.id.to_string(),
                    location: location.name,
                    ssh_keys: ssh_keys.iter().map(|k| k.id).collect(),
                    networks: network_id.map(|id| vec![id]),
                    start_after_create,
                    labels,
                    placement_group: placement_group_id,
                };
                let created: ServerCreatedEnvelope = client.post("/servers", &body).await?;
                client.wait_for_action(&created.action).await?;

                if let Some(network_id) = network_id {
                    let attach_body = AttachToNetworkRequest { network: network_id };
                    let envelope: ActionEnvelope = client
                        .post(&format!("/servers/{}/actions/attach_to_network", created.server.id), &attach_body)
                        .await?;
                    client.wait_for_action(&envelope.action).await?;

                    let poweron: ActionEnvelope = client
                        .post(
                            &format!("/servers/{}/actions/poweron", created.server.id),
                            &serde_json::json!({}),
                        )
                        .await?;
                    client.wait_for_action(&poweron.action).await?;
                }

                let refreshed: ServerEnvelope =
                    client.get(&format!("/servers/{}", created.server.id)).await?;
                Ok(refreshed.server)
            })
        }),
        needs_update: None,
        update: None,
    };

    let attempt = ensure(&format!("server/{name}"), ops, cancel);
    match tokio::time::timeout(timeouts.server_create, attempt).await {
        Ok(result) => result,
        Err(_) => Err(ReconcileError::Timeout {
            resource: format!("server/{name}"),
            seconds: timeouts.server_create.as_secs(),
        }),
    }
}

pub async fn delete_server(
    client: &HetznerCloudClient,
    name: &str,
    cancel: &CancellationToken,
    timeouts: &Timeouts,
) -> Result<(), ReconcileError> {
    info!(name, "deleting server");
    let ops = DeleteOps {
        get: Box::new({
            let name = name.to_string();
            move || -> BoxFuture<'_, Result<Option<Server>, ProviderError>> {
                let name = name.clone();
                Box::pin(async move { find_server_by_name(client, &name).await })
            }
        }),
        delete: Box::new(move |existing: &Server| -> BoxFuture<'_, Result<(), ProviderError>> {
            let id = existing.id;
            Box::pin(async move { client.delete(&format!("/servers/{id}")).await })
        }),
    };
    delete(&format!("server/{name}"), ops, cancel, timeouts.delete).await
}
