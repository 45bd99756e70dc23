//! Snapshot creation via `Server.CreateImage`. Not an `Ensure` adapter: the
//! image builder calls this once per build against a throwaway server, so
//! there is no existing-resource check to make first.

use tracing::{info, warn};

use super::client::{HetznerCloudClient, ProviderError};
use super::models::{CreateImageEnvelope, CreateImageRequest, Labels};

pub struct SnapshotSpec {
    pub server_id: u64,
    pub description: String,
    pub labels: Labels,
}

/// Creates a snapshot image of `spec.server_id`. If the action fails after
/// the image object was already created, the partial image is deleted
/// best-effort so it doesn't linger and accrue storage billing.
pub async fn create_snapshot(
    client: &HetznerCloudClient,
    spec: SnapshotSpec,
) -> Result<u64, ProviderError> {
    info!(server_id = spec.server_id, "creating snapshot");
    let body = CreateImageRequest {
        kind: "snapshot".to_string(),
        description: spec.description,
        labels: spec.labels,
    };
    let envelope: CreateImageEnvelope = client
        .post(&format!("/servers/{}/actions/create_image", spec.server_id), &body)
        .await?;

    if let Err(err) = client.wait_for_action(&envelope.action).await {
        warn!(image_id = envelope.image.id, error = %err, "snapshot action failed, deleting partial image");
        if let Err(cleanup_err) = client.delete(&format!("/images/{}", envelope.image.id)).await {
            warn!(image_id = envelope.image.id, error = %cleanup_err, "failed to delete partial image");
        }
        return Err(err);
    }

    Ok(envelope.image.id)
}
