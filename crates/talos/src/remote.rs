//! Thin subprocess wrappers around `talosctl`. Each operation opens a fresh
//! client by spawning a new subprocess, runs exactly one RPC, and exits —
//! there is no persistent session held across calls.

use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const INITIAL_REBOOT_DELAY: Duration = Duration::from_secs(30);
const READY_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum TalosRpcError {
    #[error("failed to launch talosctl: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("talosctl exited with an error: {0}")]
    CommandFailed(String),
    #[error("cancelled while waiting for node {0} to become ready")]
    Cancelled(String),
}

/// Staging/force toggles for `talosctl upgrade`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpgradeOptions {
    pub stage: bool,
    pub force: bool,
}

async fn run_talosctl(
    talosconfig: &str,
    node: &str,
    args: &[&str],
) -> Result<String, TalosRpcError> {
    let output = Command::new("talosctl")
        .args(["--talosconfig", talosconfig, "-e", node, "-n", node])
        .args(args)
        .output()
        .await?;
    if !output.status.success() {
        return Err(TalosRpcError::CommandFailed(
            String::from_utf8_lossy(&output.stderr).to_string(),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

pub async fn get_node_version(talosconfig: &str, node: &str) -> Result<String, TalosRpcError> {
    run_talosctl(talosconfig, node, &["version"]).await
}

pub async fn health_check(talosconfig: &str, node: &str) -> Result<(), TalosRpcError> {
    run_talosctl(talosconfig, node, &["health", "--wait-timeout", "30s"])
        .await
        .map(|_| ())
}

pub async fn upgrade_node(
    talosconfig: &str,
    node: &str,
    image: &str,
    options: UpgradeOptions,
) -> Result<(), TalosRpcError> {
    info!(node, image, "upgrading node");
    let mut args = vec!["upgrade", "--image", image];
    if options.stage {
        args.push("--stage");
    }
    if options.force {
        args.push("--force");
    }
    run_talosctl(talosconfig, node, &args).await.map(|_| ())
}

/// Deliberate no-op. In this immutable-OS model, a Kubernetes version change
/// is effected by re-installing Talos at a version that bundles the new
/// Kubernetes release — there is no in-place Kubernetes upgrade RPC.
pub async fn upgrade_kubernetes(
    _talosconfig: &str,
    _node: &str,
    _version: &str,
) -> Result<(), TalosRpcError> {
    Ok(())
}

/// Initial 30s sleep (the node needs time to start rebooting after a config
/// apply), then polls `Version` every 10s until it succeeds, `deadline`
/// elapses, or `cancel` fires.
pub async fn wait_for_node_ready(
    talosconfig: &str,
    node: &str,
    deadline: Duration,
    cancel: &CancellationToken,
) -> Result<(), TalosRpcError> {
    info!(node, "waiting for node to reboot");
    tokio::select! {
        () = sleep(INITIAL_REBOOT_DELAY) => {}
        () = cancel.cancelled() => return Err(TalosRpcError::Cancelled(node.to_string())),
    }

    let deadline_at = tokio::time::Instant::now() + deadline;
    loop {
        tokio::select! {
            result = get_node_version(talosconfig, node) => {
                if result.is_ok() {
                    info!(node, "node is ready");
                    return Ok(());
                }
                debug!(node, "node not ready yet");
            }
            () = cancel.cancelled() => return Err(TalosRpcError::Cancelled(node.to_string())),
        }
        if tokio::time::Instant::now() >= deadline_at {
            return Err(TalosRpcError::CommandFailed(format!(
                "timed out waiting for node {node} to become ready"
            )));
        }
        tokio::select! {
            () = sleep(READY_POLL_INTERVAL) => {}
            () = cancel.cancelled() => return Err(TalosRpcError::Cancelled(node.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upgrade_kubernetes_is_a_no_op() {
        let result = upgrade_kubernetes("talosconfig", "10.0.0.1", "1.31.0").await;
        assert!(result.is_ok());
    }

    #[test]
    fn upgrade_options_default_to_no_staging_or_force() {
        let options = UpgradeOptions::default();
        assert!(!options.stage);
        assert!(!options.force);
    }
}
