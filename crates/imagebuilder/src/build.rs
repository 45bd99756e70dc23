//! Drives the six-step image build: key provisioning, server provisioning,
//! rescue boot, SSH install, power-off + snapshot, and cleanup. Every
//! ephemeral resource created along the way — the uploaded SSH key and the
//! throwaway server — is torn down on every exit path, success or failure.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use k8zner_cloud::hetzner::client::{HetznerCloudClient, ProviderError};
use k8zner_cloud::hetzner::models::{ActionEnvelope, EnableRescueEnvelope, EnableRescueRequest, Labels};
use k8zner_cloud::hetzner::server::{delete_server, ensure_server, ImageSelector, ServerSpec};
use k8zner_cloud::hetzner::snapshot::{create_snapshot, SnapshotSpec};
use k8zner_cloud::hetzner::ssh_key::{delete_ssh_key, ensure_ssh_key, SshKeySpec};
use k8zner_cloud::{ReconcileError, Timeouts};

use crate::keypair::{self, KeypairError};
use crate::ssh::{Ssh2Executor, SshError, SshExecutor};

const INITIAL_BOOT_DELAY: Duration = Duration::from_secs(10);
const RESCUE_SSH_USER: &str = "root";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    Amd64,
    Arm64,
}

impl Architecture {
    fn server_type(self) -> &'static str {
        match self {
            Self::Amd64 => "cx23",
            Self::Arm64 => "cax11",
        }
    }

    fn talos_suffix(self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
        }
    }
}

pub struct BuildRequest {
    pub image_name: String,
    pub talos_version: String,
    pub architecture: Architecture,
    pub location: String,
    pub labels: Labels,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("keypair generation failed: {0}")]
    Keypair(#[from] KeypairError),
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),
    #[error("ssh error: {0}")]
    Ssh(#[from] SshError),
    #[error("ssh install task panicked: {0}")]
    SshTaskPanicked(String),
    #[error("server {0} has no public IPv4 address")]
    NoPublicAddress(String),
}

fn talos_raw_url(version: &str, architecture: Architecture) -> String {
    format!(
        "https://github.com/siderolabs/talos/releases/download/{version}/metal-{}.raw.zst",
        architecture.talos_suffix()
    )
}

fn install_command(talos_raw_url: &str) -> String {
    format!(
        "set -eu; DISK=$(lsblk -dno NAME | grep -E '^(sda|vda)' | head -n1); \
         if [ -z \"$DISK\" ]; then echo 'no sda/vda disk found' >&2; exit 1; fi; \
         apt-get install -y zstd wget; \
         wget -qO- '{talos_raw_url}' | zstd -d | dd of=/dev/$DISK bs=4M; \
         sync"
    )
}

/// Builds a Talos snapshot image and returns its image ID. `request.labels`
/// is attached to both the ephemeral server and the final snapshot; the
/// snapshot additionally gets `os=talos` and `arch=<architecture>`.
pub async fn build_image(
    client: &HetznerCloudClient,
    request: BuildRequest,
    cancel: &CancellationToken,
) -> Result<u64, BuildError> {
    build_image_with_executor(client, request, cancel, Arc::new(Ssh2Executor)).await
}

/// As [`build_image`], but runs the rescue-mode install command through
/// `executor` instead of a real `ssh2` session — lets the build protocol run
/// against a fake in tests, with no SSH-reachable host required.
pub async fn build_image_with_executor(
    client: &HetznerCloudClient,
    request: BuildRequest,
    cancel: &CancellationToken,
    executor: Arc<dyn SshExecutor>,
) -> Result<u64, BuildError> {
    let build_id = Uuid::new_v4();
    let key_name = format!("k8zner-imagebuilder-{build_id}");
    let server_name = format!("k8zner-imagebuilder-{build_id}");
    let timeouts = Timeouts::default();

    let result = run_build(
        client,
        &request,
        &key_name,
        &server_name,
        &timeouts,
        cancel,
        executor,
    )
    .await;

    if let Err(err) = delete_server(client, &server_name, cancel, &timeouts).await {
        warn!(server = %server_name, error = %err, "failed to clean up ephemeral build server");
    }
    if let Err(err) = delete_ssh_key(client, &key_name, cancel, timeouts.delete).await {
        warn!(key = %key_name, error = %err, "failed to clean up ephemeral build ssh key");
    }

    result
}

async fn run_build(
    client: &HetznerCloudClient,
    request: &BuildRequest,
    key_name: &str,
    server_name: &str,
    timeouts: &Timeouts,
    cancel: &CancellationToken,
    executor: Arc<dyn SshExecutor>,
) -> Result<u64, BuildError> {
    info!(image = %request.image_name, architecture = ?request.architecture, "starting image build");

    let keypair = keypair::generate()?;

    let ssh_key = ensure_ssh_key(
        client,
        SshKeySpec {
            name: key_name.to_string(),
            public_key: keypair.openssh_public.clone(),
            labels: request.labels.clone(),
        },
        cancel,
    )
    .await?;

    let server = ensure_server(
        client,
        ServerSpec {
            name: server_name.to_string(),
            server_type: request.architecture.server_type().to_string(),
            image: ImageSelector::Named("debian-12".to_string()),
            location: request.location.clone(),
            ssh_key_names: vec![key_name.to_string()],
            network_id: None,
            placement_group_id: None,
            labels: request.labels.clone(),
        },
        timeouts,
        cancel,
    )
    .await?;

    let rescue: EnableRescueEnvelope = client
        .post(
            &format!("/servers/{}/actions/enable_rescue", server.id),
            &EnableRescueRequest {
                kind: "linux64".to_string(),
                ssh_keys: vec![ssh_key.id],
            },
        )
        .await?;
    client.wait_for_action(&rescue.action).await?;

    let reset: ActionEnvelope = client
        .post(
            &format!("/servers/{}/actions/reset", server.id),
            &serde_json::json!({}),
        )
        .await?;
    client.wait_for_action(&reset.action).await?;

    let host = server
        .public_net
        .ipv4
        .as_ref()
        .and_then(|ipv4| ipv4.ip.clone())
        .ok_or_else(|| BuildError::NoPublicAddress(server_name.to_string()))?;

    tokio::time::sleep(INITIAL_BOOT_DELAY).await;

    let command = install_command(&talos_raw_url(&request.talos_version, request.architecture));
    let private_key_pem = keypair.private_key_pem.clone();
    tokio::task::spawn_blocking(move || -> Result<String, SshError> {
        executor.run(&host, RESCUE_SSH_USER, &private_key_pem, &command)
    })
    .await
    .map_err(|err| BuildError::SshTaskPanicked(err.to_string()))??;

    let poweroff: ActionEnvelope = client
        .post(
            &format!("/servers/{}/actions/poweroff", server.id),
            &serde_json::json!({}),
        )
        .await?;
    client.wait_for_action(&poweroff.action).await?;

    let mut snapshot_labels = request.labels.clone();
    snapshot_labels.insert("os".to_string(), "talos".to_string());
    snapshot_labels.insert(
        "arch".to_string(),
        request.architecture.label().to_string(),
    );

    let image_id = create_snapshot(
        client,
        SnapshotSpec {
            server_id: server.id,
            description: request.image_name.clone(),
            labels: snapshot_labels,
        },
    )
    .await?;

    info!(image = %request.image_name, image_id, "image build complete");
    Ok(image_id)
}
