//! Talos secrets management and machine-config generation for k8zner.
//!
//! [`secrets`] owns the cluster's root cryptographic material; [`machineconfig`]
//! turns a secrets bundle plus per-node inputs into a byte-exact Talos
//! machine config; [`remote`] wraps the handful of `talosctl` RPCs the
//! reconciler needs against an already-running node.

pub mod machineconfig;
pub mod remote;
pub mod secrets;

pub use machineconfig::{
    deep_merge, generate_machine_config, installer_image_url, normalize_kubernetes_version,
    normalize_talos_version, strip_comments_and_blank_lines, MachineConfigError, MachineOpts,
    MachineRole, PatchInput,
};
pub use remote::{
    get_node_version, health_check, upgrade_kubernetes, upgrade_node, wait_for_node_ready,
    TalosRpcError, UpgradeOptions,
};
pub use secrets::{
    get_or_generate_secrets, load_secrets, new_secrets, save_secrets, Bundle, FixedClock,
    SecretsError,
};
