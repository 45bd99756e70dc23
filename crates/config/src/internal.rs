//! The internal configuration (`Config`) that the Expander produces and the
//! reconciler/machine-config generator consume.

use serde::{Deserialize, Serialize};

use crate::schema::{Mode, Region};

/// Private network plan. CIDRs are hard-coded defaults disjoint from the
/// standard pod/service ranges of any enabled CNI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPlan {
    pub private_network_cidr: String,
    pub node_subnet_cidr: String,
    pub pod_subnet_cidr: String,
    pub service_subnet_cidr: String,
    pub zone: String,
}

/// Firewall posture. `UseCurrentIPv4`/`UseCurrentIPv6` mean the operator's
/// public IP is resolved at reconcile time, not baked into the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallConfig {
    pub use_current_ipv4: bool,
    pub use_current_ipv6: bool,
}

/// A homogeneous set of servers with identical role/size/location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePool {
    pub name: String,
    pub count: u8,
    pub server_type: String,
    pub location: String,
    pub placement_group: bool,
}

/// Control-plane configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlPlaneConfig {
    pub node_pools: Vec<NodePool>,
    pub public_vip_ipv4_enabled: bool,
}

impl ControlPlaneConfig {
    #[must_use]
    pub fn count(&self) -> u32 {
        self.node_pools.iter().map(|p| u32::from(p.count)).sum()
    }
}

/// Workers configuration: always a single pool named "workers" per the
/// Expander's decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkersConfig {
    pub node_pools: Vec<NodePool>,
}

/// Ingress load balancer. Enabled only in `ha` mode; `dev` uses hostNetwork
/// on workers instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressConfig {
    pub enabled: bool,
}

/// Talos machine-level options shared by the config generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalosMachineOpts {
    pub ipv6_enabled: bool,
    pub public_ipv4_enabled: bool,
    pub disk_encryption_state: bool,
    pub disk_encryption_ephemeral: bool,
    pub coredns_enabled: bool,
    pub discovery_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalosConfig {
    pub version: String,
    pub machine: TalosMachineOpts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubernetesConfig {
    pub version: String,
    pub domain: String,
    pub api_load_balancer_enabled: bool,
    pub scheduling_on_control_planes: bool,
}

/// CNI routing mode for Cilium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    Native,
    Tunnel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcmAddon {
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsiAddon {
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiliumAddon {
    pub enabled: bool,
    pub kube_proxy_replacement: bool,
    pub routing_mode: RoutingMode,
    pub hubble_enabled: bool,
    pub hubble_relay_enabled: bool,
    pub hubble_ui_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum TraefikKind {
    DaemonSet,
    Deployment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraefikAddon {
    pub enabled: bool,
    pub kind: TraefikKind,
    pub host_network: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsServerAddon {
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertManagerCloudflareAddon {
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertManagerAddon {
    pub enabled: bool,
    pub cloudflare: CertManagerCloudflareAddon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgoCdAddon {
    pub enabled: bool,
    pub ha: bool,
    pub ingress_enabled: bool,
    pub ingress_host: Option<String>,
    pub ingress_tls: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayApiCrdsAddon {
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrometheusOperatorCrdsAddon {
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalosCcmAddon {
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudflareAddon {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalDnsAddon {
    pub enabled: bool,
    pub policy: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalosBackupAddon {
    pub enabled: bool,
    pub s3_endpoint: String,
    pub s3_bucket: String,
    pub schedule: String,
    pub enable_compression: bool,
    pub encryption_disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addons {
    pub ccm: CcmAddon,
    pub csi: CsiAddon,
    pub cilium: CiliumAddon,
    pub traefik: TraefikAddon,
    pub metrics_server: MetricsServerAddon,
    pub cert_manager: CertManagerAddon,
    pub argocd: ArgoCdAddon,
    pub gateway_api_crds: GatewayApiCrdsAddon,
    pub prometheus_operator_crds: PrometheusOperatorCrdsAddon,
    pub talos_ccm: TalosCcmAddon,
    pub cloudflare: CloudflareAddon,
    pub external_dns: ExternalDnsAddon,
    pub talos_backup: TalosBackupAddon,
}

/// The complete internal cluster configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub name: String,
    pub region: Region,
    pub mode: Mode,
    pub network: NetworkPlan,
    pub firewall: FirewallConfig,
    pub control_plane: ControlPlaneConfig,
    pub workers: WorkersConfig,
    pub ingress: IngressConfig,
    pub talos: TalosConfig,
    pub kubernetes: KubernetesConfig,
    pub addons: Addons,
}

impl Config {
    /// Invariant check used by tests and by the Expander itself at the end
    /// of `expand()`; panics on violation since a violation means the
    /// Expander itself has a bug (`ConfigExpansionError` is reserved for
    /// env-lookup failures, not invariant breaks here).
    #[must_use]
    pub fn check_invariants(&self) -> bool {
        let cp_count_ok = match self.mode {
            Mode::Dev => self.control_plane.count() == 1,
            Mode::Ha => self.control_plane.count() == 3,
        };
        let domain_ok = if self.kubernetes.domain.is_empty() {
            true
        } else {
            !self.addons.cloudflare.enabled || self.addons.external_dns.enabled
        };
        cp_count_ok && domain_ok
    }
}
