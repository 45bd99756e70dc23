//! Byte-exact Talos machine-config generation.
//!
//! A base configuration is generated from the secrets bundle, stripped of
//! comments and blank lines, then a role-specific patch map is deep-merged
//! over it. The merge primitive is the only one in this module: for two
//! maps, recurse into shared map-valued keys and overwrite everything else;
//! sequences always replace, never concatenate.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_yaml::Value;
use thiserror::Error;

use crate::secrets::Bundle;

#[derive(Debug, Error)]
pub enum MachineConfigError {
    #[error("failed to render base machine config: {0}")]
    BaseRender(#[from] serde_yaml::Error),
    #[error("rendered base config is not a mapping at its root")]
    BaseNotAMapping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineRole {
    ControlPlane,
    Worker,
}

impl MachineRole {
    fn as_str(self) -> &'static str {
        match self {
            MachineRole::ControlPlane => "controlplane",
            MachineRole::Worker => "worker",
        }
    }
}

/// Machine-level toggles the patch builder needs. Field names mirror the
/// machine-config sections they feed.
#[derive(Debug, Clone)]
pub struct MachineOpts {
    pub ipv6_enabled: bool,
    pub public_ipv4_enabled: bool,
    pub disk_encryption_state: bool,
    pub disk_encryption_ephemeral: bool,
    pub coredns_enabled: bool,
    pub discovery_kubernetes_enabled: bool,
    pub discovery_service_enabled: bool,
    pub node_ipv4_cidr: Option<String>,
    pub pod_subnets: Vec<String>,
    pub service_subnets: Vec<String>,
    pub cluster_domain: String,
    pub allow_scheduling_on_control_planes: bool,
    pub kube_proxy_replacement: bool,
    pub etcd_subnet: Option<String>,
}

/// Per-node inputs to the patch builder.
#[derive(Debug, Clone)]
pub struct PatchInput {
    pub hostname: String,
    /// Numeric IaaS server identifier; `0` means "not yet known" and
    /// suppresses `nodeLabels.nodeid` / `kubelet.extraArgs.provider-id`.
    pub server_id: u64,
    pub installer_image: String,
    pub cert_sans: Vec<String>,
    pub opts: MachineOpts,
}

/// Strip the Talos version's normalization for the Kubernetes version
/// (leading `v` removed; the templating layer re-adds it) and preserve it
/// for the Talos version (never stripped).
#[must_use]
pub fn normalize_kubernetes_version(version: &str) -> String {
    version.strip_prefix('v').unwrap_or(version).to_string()
}

#[must_use]
pub fn normalize_talos_version(version: &str) -> String {
    if version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{version}")
    }
}

/// `factory.talos.dev/installer/{schematicID}:{talosVer}` when a schematic
/// ID is set, else the stock `ghcr.io` installer image.
#[must_use]
pub fn installer_image_url(schematic_id: Option<&str>, talos_version: &str) -> String {
    match schematic_id {
        Some(id) if !id.is_empty() => format!("factory.talos.dev/installer/{id}:{talos_version}"),
        _ => format!("ghcr.io/siderolabs/installer:{talos_version}"),
    }
}

/// Generate a base machine configuration of the given role from the secrets
/// bundle, with the install disk fixed at `/dev/sda`.
fn base_config_yaml(bundle: &Bundle, role: MachineRole) -> String {
    format!(
        r"#!talos
# Generated by k8zner. Do not edit nodeid/cluster identity fields by hand.
version: v1alpha1
debug: false
persist: true

machine:
  type: {role}
  token: {bootstrap_token}
  ca:
    crt: {ca_crt}
    key: {ca_key}

  # Install target; the config generator overrides install.image via patch.
  install:
    disk: /dev/sda
    wipe: false

cluster:
  id: {cluster_id}
  secret: {cluster_secret}

  # etcd root CA; shared by every control-plane node in this cluster.
  etcd:
    ca:
      crt: {etcd_ca_crt}
      key: {etcd_ca_key}

  secretboxEncryptionSecret: {secretbox_encryption_secret}
",
        role = role.as_str(),
        bootstrap_token = bundle.bootstrap_token,
        ca_crt = bundle.ca_crt,
        ca_key = bundle.ca_key,
        cluster_id = bundle.cluster_id,
        cluster_secret = bundle.cluster_secret,
        etcd_ca_crt = bundle.etcd_ca_crt,
        etcd_ca_key = bundle.etcd_ca_key,
        secretbox_encryption_secret = bundle.secretbox_encryption_secret,
    )
}

/// Strip `#`-prefixed comment lines and blank lines, producing output whose
/// diffs track only semantic changes.
#[must_use]
pub fn strip_comments_and_blank_lines(raw: &str) -> String {
    raw.lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}

#[derive(Serialize)]
struct DhcpOptions {
    ipv4: bool,
    ipv6: bool,
}

#[derive(Serialize)]
struct InterfacePatch {
    interface: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    dhcp: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "dhcpOptions")]
    dhcp_options: Option<DhcpOptions>,
}

#[derive(Serialize)]
struct NetworkPatch {
    hostname: String,
    interfaces: Vec<InterfacePatch>,
}

#[derive(Serialize)]
struct InstallPatch {
    image: String,
}

#[derive(Serialize)]
struct NodeLabels {
    nodeid: String,
}

#[derive(Serialize)]
struct KubeletExtraConfigReserved {
    #[serde(skip_serializing_if = "Option::is_none")]
    cpu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    memory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "ephemeral-storage")]
    ephemeral_storage: Option<String>,
}

#[derive(Serialize)]
struct KubeletExtraConfig {
    #[serde(rename = "shutdownGracePeriod")]
    shutdown_grace_period: String,
    #[serde(rename = "shutdownGracePeriodCriticalPods")]
    shutdown_grace_period_critical_pods: String,
    #[serde(rename = "systemReserved")]
    system_reserved: KubeletExtraConfigReserved,
    #[serde(rename = "kubeReserved")]
    kube_reserved: KubeletExtraConfigReserved,
}

#[derive(Serialize)]
struct KubeletNodeIp {
    #[serde(rename = "validSubnets")]
    valid_subnets: Vec<String>,
}

#[derive(Serialize)]
struct KubeletPatch {
    #[serde(rename = "extraArgs")]
    extra_args: BTreeMap<String, String>,
    #[serde(rename = "extraConfig")]
    extra_config: KubeletExtraConfig,
    #[serde(skip_serializing_if = "Option::is_none", rename = "nodeIP")]
    node_ip: Option<KubeletNodeIp>,
}

#[derive(Serialize)]
struct DiskEncryptionKey {
    slot: u32,
    #[serde(rename = "nodeID")]
    node_id: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct DiskEncryptionEntry {
    provider: String,
    keys: Vec<DiskEncryptionKey>,
    options: Vec<String>,
}

#[derive(Serialize)]
struct SystemDiskEncryption {
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<DiskEncryptionEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ephemeral: Option<DiskEncryptionEntry>,
}

#[derive(Serialize)]
struct HostDns {
    enabled: bool,
    #[serde(rename = "forwardKubeDNSToHost")]
    forward_kube_dns_to_host: bool,
    #[serde(rename = "resolveMemberNames")]
    resolve_member_names: bool,
}

#[derive(Serialize)]
struct TalosApiAccess {
    enabled: bool,
    #[serde(rename = "allowedRoles")]
    allowed_roles: Vec<String>,
    #[serde(rename = "allowedKubernetesNamespaces")]
    allowed_kubernetes_namespaces: Vec<String>,
}

#[derive(Serialize)]
struct FeaturesPatch {
    #[serde(rename = "hostDNS")]
    host_dns: HostDns,
    #[serde(
        skip_serializing_if = "Option::is_none",
        rename = "kubernetesTalosAPIAccess"
    )]
    kubernetes_talos_api_access: Option<TalosApiAccess>,
}

#[derive(Serialize)]
struct MachinePatch {
    install: InstallPatch,
    #[serde(skip_serializing_if = "Vec::is_empty", rename = "certSANs")]
    cert_sans: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "nodeLabels")]
    node_labels: Option<NodeLabels>,
    network: NetworkPatch,
    kubelet: KubeletPatch,
    sysctls: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "systemDiskEncryption")]
    system_disk_encryption: Option<SystemDiskEncryption>,
    features: FeaturesPatch,
}

#[derive(Serialize)]
struct CniPatch {
    name: String,
}

#[derive(Serialize)]
struct ClusterNetworkPatch {
    #[serde(rename = "dnsDomain")]
    dns_domain: String,
    cni: CniPatch,
    #[serde(skip_serializing_if = "Vec::is_empty", rename = "podSubnets")]
    pod_subnets: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", rename = "serviceSubnets")]
    service_subnets: Vec<String>,
}

#[derive(Serialize)]
struct ProxyPatch {
    disabled: bool,
}

#[derive(Serialize)]
struct CoreDnsPatch {
    disabled: bool,
}

#[derive(Serialize)]
struct RegistryDisabled {
    disabled: bool,
}

#[derive(Serialize)]
struct DiscoveryRegistries {
    kubernetes: RegistryDisabled,
    service: RegistryDisabled,
}

#[derive(Serialize)]
struct DiscoveryPatch {
    enabled: bool,
    registries: DiscoveryRegistries,
}

#[derive(Serialize)]
struct ApiServerPatch {
    #[serde(rename = "extraArgs")]
    extra_args: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct ControllerManagerPatch {
    #[serde(rename = "extraArgs")]
    extra_args: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct SchedulerPatch {
    #[serde(rename = "extraArgs")]
    extra_args: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct AdminKubeconfigPatch {
    #[serde(rename = "certLifetime")]
    cert_lifetime: String,
}

#[derive(Serialize)]
struct EtcdPatch {
    #[serde(rename = "advertisedSubnets")]
    advertised_subnets: Vec<String>,
    #[serde(rename = "extraArgs")]
    extra_args: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct ExternalCloudProviderPatch {
    enabled: bool,
}

#[derive(Serialize)]
struct ClusterPatch {
    network: ClusterNetworkPatch,
    proxy: ProxyPatch,
    #[serde(rename = "coreDNS")]
    core_dns: CoreDnsPatch,
    discovery: DiscoveryPatch,
    #[serde(skip_serializing_if = "Option::is_none", rename = "allowSchedulingOnControlPlanes")]
    allow_scheduling_on_control_planes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "apiServer")]
    api_server: Option<ApiServerPatch>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "controllerManager")]
    controller_manager: Option<ControllerManagerPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scheduler: Option<SchedulerPatch>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "adminKubeconfig")]
    admin_kubeconfig: Option<AdminKubeconfigPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    etcd: Option<EtcdPatch>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "externalCloudProvider")]
    external_cloud_provider: Option<ExternalCloudProviderPatch>,
}

#[derive(Serialize)]
struct RootPatch {
    machine: MachinePatch,
    cluster: ClusterPatch,
}

fn build_machine_patch(role: MachineRole, input: &PatchInput) -> MachinePatch {
    let opts = &input.opts;

    let interfaces = if opts.public_ipv4_enabled {
        vec![
            InterfacePatch {
                interface: "eth0".to_string(),
                dhcp: Some(true),
                dhcp_options: Some(DhcpOptions { ipv4: opts.public_ipv4_enabled, ipv6: false }),
            },
            InterfacePatch { interface: "eth1".to_string(), dhcp: Some(true), dhcp_options: None },
        ]
    } else {
        vec![InterfacePatch { interface: "eth0".to_string(), dhcp: Some(true), dhcp_options: None }]
    };

    let mut extra_args = BTreeMap::new();
    extra_args.insert("cloud-provider".to_string(), "external".to_string());
    if input.server_id > 0 {
        extra_args.insert("provider-id".to_string(), format!("hcloud://{}", input.server_id));
    }

    let (system_cpu, kube_ephemeral) = match role {
        MachineRole::ControlPlane => ("250m", "1Gi"),
        MachineRole::Worker => ("100m", "1Gi"),
    };

    let kubelet = KubeletPatch {
        extra_args,
        extra_config: KubeletExtraConfig {
            shutdown_grace_period: "90s".to_string(),
            shutdown_grace_period_critical_pods: "15s".to_string(),
            system_reserved: KubeletExtraConfigReserved {
                cpu: Some(system_cpu.to_string()),
                memory: Some("300Mi".to_string()),
                ephemeral_storage: None,
            },
            kube_reserved: KubeletExtraConfigReserved {
                cpu: None,
                memory: Some("350Mi".to_string()),
                ephemeral_storage: Some(kube_ephemeral.to_string()),
            },
        },
        node_ip: opts
            .node_ipv4_cidr
            .clone()
            .filter(|cidr| !cidr.is_empty())
            .map(|cidr| KubeletNodeIp { valid_subnets: vec![cidr] }),
    };

    let mut sysctls = BTreeMap::new();
    sysctls.insert("net.core.somaxconn".to_string(), "65535".to_string());
    sysctls.insert("net.core.netdev_max_backlog".to_string(), "4096".to_string());
    let ipv6_flag = if opts.ipv6_enabled { "0" } else { "1" };
    sysctls.insert("net.ipv6.conf.default.disable_ipv6".to_string(), ipv6_flag.to_string());
    sysctls.insert("net.ipv6.conf.all.disable_ipv6".to_string(), ipv6_flag.to_string());

    let disk_key = || DiskEncryptionKey { slot: 0, node_id: BTreeMap::new() };
    let encryption_entry = || DiskEncryptionEntry {
        provider: "luks2".to_string(),
        keys: vec![disk_key()],
        options: vec!["no_read_workqueue".to_string(), "no_write_workqueue".to_string()],
    };
    let system_disk_encryption =
        if opts.disk_encryption_state || opts.disk_encryption_ephemeral {
            Some(SystemDiskEncryption {
                state: opts.disk_encryption_state.then(encryption_entry),
                ephemeral: opts.disk_encryption_ephemeral.then(encryption_entry),
            })
        } else {
            None
        };

    let kubernetes_talos_api_access = match role {
        MachineRole::ControlPlane => Some(TalosApiAccess {
            enabled: true,
            allowed_roles: vec!["os:reader".to_string(), "os:etcd:backup".to_string()],
            allowed_kubernetes_namespaces: vec!["kube-system".to_string()],
        }),
        MachineRole::Worker => None,
    };

    MachinePatch {
        install: InstallPatch { image: input.installer_image.clone() },
        cert_sans: input.cert_sans.clone(),
        node_labels: (input.server_id > 0)
            .then(|| NodeLabels { nodeid: input.server_id.to_string() }),
        network: NetworkPatch { hostname: input.hostname.clone(), interfaces },
        kubelet,
        sysctls,
        system_disk_encryption,
        features: FeaturesPatch {
            host_dns: HostDns {
                enabled: true,
                forward_kube_dns_to_host: false,
                resolve_member_names: true,
            },
            kubernetes_talos_api_access,
        },
    }
}

fn build_cluster_patch(role: MachineRole, input: &PatchInput) -> ClusterPatch {
    let opts = &input.opts;
    let discovery_enabled = opts.discovery_kubernetes_enabled || opts.discovery_service_enabled;

    let (
        allow_scheduling_on_control_planes,
        api_server,
        controller_manager,
        scheduler,
        admin_kubeconfig,
        etcd,
        external_cloud_provider,
    ) = match role {
        MachineRole::ControlPlane => {
            let mut api_extra_args = BTreeMap::new();
            api_extra_args.insert("enable-aggregator-routing".to_string(), "true".to_string());

            let mut cm_extra_args = BTreeMap::new();
            cm_extra_args.insert("cloud-provider".to_string(), "external".to_string());
            cm_extra_args.insert("bind-address".to_string(), "0.0.0.0".to_string());

            let mut sched_extra_args = BTreeMap::new();
            sched_extra_args.insert("bind-address".to_string(), "0.0.0.0".to_string());

            let etcd = opts.etcd_subnet.clone().filter(|s| !s.is_empty()).map(|subnet| {
                let mut extra_args = BTreeMap::new();
                extra_args.insert(
                    "listen-metrics-urls".to_string(),
                    "http://0.0.0.0:2381".to_string(),
                );
                EtcdPatch { advertised_subnets: vec![subnet], extra_args }
            });

            (
                Some(opts.allow_scheduling_on_control_planes),
                Some(ApiServerPatch { extra_args: api_extra_args }),
                Some(ControllerManagerPatch { extra_args: cm_extra_args }),
                Some(SchedulerPatch { extra_args: sched_extra_args }),
                Some(AdminKubeconfigPatch { cert_lifetime: "87600h".to_string() }),
                etcd,
                Some(ExternalCloudProviderPatch { enabled: true }),
            )
        }
        MachineRole::Worker => (None, None, None, None, None, None, None),
    };

    ClusterPatch {
        network: ClusterNetworkPatch {
            dns_domain: opts.cluster_domain.clone(),
            cni: CniPatch { name: "none".to_string() },
            pod_subnets: opts.pod_subnets.clone(),
            service_subnets: opts.service_subnets.clone(),
        },
        proxy: ProxyPatch { disabled: opts.kube_proxy_replacement },
        core_dns: CoreDnsPatch { disabled: !opts.coredns_enabled },
        discovery: DiscoveryPatch {
            enabled: discovery_enabled,
            registries: DiscoveryRegistries {
                kubernetes: RegistryDisabled { disabled: !opts.discovery_kubernetes_enabled },
                service: RegistryDisabled { disabled: !opts.discovery_service_enabled },
            },
        },
        allow_scheduling_on_control_planes,
        api_server,
        controller_manager,
        scheduler,
        admin_kubeconfig,
        etcd,
        external_cloud_provider,
    }
}

/// For each key in `src`: if both `dst` and `src` hold a mapping at that
/// key, recurse; otherwise `dst[k] = src[k]`. Sequences are replaced, never
/// concatenated. This is the only merge primitive in this module.
pub fn deep_merge(dst: &mut Value, src: &Value) {
    let Value::Mapping(src_map) = src else {
        *dst = src.clone();
        return;
    };
    let Value::Mapping(dst_map) = dst else {
        *dst = src.clone();
        return;
    };
    for (key, src_value) in src_map {
        match dst_map.get(key) {
            Some(existing) if existing.is_mapping() && src_value.is_mapping() => {
                let mut nested = existing.clone();
                deep_merge(&mut nested, src_value);
                dst_map.insert(key.clone(), nested);
            }
            _ => {
                dst_map.insert(key.clone(), src_value.clone());
            }
        }
    }
}

/// Generate the byte-exact machine configuration for one node.
///
/// 1. Render the base config from the secrets bundle, strip comments/blanks.
/// 2. Build the role-specific patch map.
/// 3. Deep-merge the patch over the base and serialize.
pub fn generate_machine_config(
    bundle: &Bundle,
    role: MachineRole,
    input: &PatchInput,
) -> Result<String, MachineConfigError> {
    let base_raw = base_config_yaml(bundle, role);
    let base_clean = strip_comments_and_blank_lines(&base_raw);
    let mut base_value: Value = serde_yaml::from_str(&base_clean)?;
    if !base_value.is_mapping() {
        return Err(MachineConfigError::BaseNotAMapping);
    }

    let patch = RootPatch {
        machine: build_machine_patch(role, input),
        cluster: build_cluster_patch(role, input),
    };
    let patch_value = serde_yaml::to_value(&patch)?;

    deep_merge(&mut base_value, &patch_value);
    let rendered = serde_yaml::to_string(&base_value)?;
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::new_secrets;

    fn opts() -> MachineOpts {
        MachineOpts {
            ipv6_enabled: false,
            public_ipv4_enabled: false,
            disk_encryption_state: false,
            disk_encryption_ephemeral: false,
            coredns_enabled: true,
            discovery_kubernetes_enabled: true,
            discovery_service_enabled: false,
            node_ipv4_cidr: None,
            pod_subnets: vec![],
            service_subnets: vec![],
            cluster_domain: "cluster.local".to_string(),
            allow_scheduling_on_control_planes: false,
            kube_proxy_replacement: true,
            etcd_subnet: None,
        }
    }

    #[test]
    fn normalizes_versions_per_contract() {
        assert_eq!(normalize_kubernetes_version("v1.31.0"), "1.31.0");
        assert_eq!(normalize_kubernetes_version("1.31.0"), "1.31.0");
        assert_eq!(normalize_talos_version("v1.9.0"), "v1.9.0");
        assert_eq!(normalize_talos_version("1.9.0"), "v1.9.0");
    }

    #[test]
    fn installer_image_prefers_schematic() {
        assert_eq!(
            installer_image_url(Some("abc123"), "v1.9.0"),
            "factory.talos.dev/installer/abc123:v1.9.0"
        );
        assert_eq!(
            installer_image_url(None, "v1.9.0"),
            "ghcr.io/siderolabs/installer:v1.9.0"
        );
    }

    #[test]
    fn strip_comments_removes_hash_and_blank_lines() {
        let raw = "# a comment\nfoo: bar\n\n  # indented comment\nbaz: qux\n";
        let clean = strip_comments_and_blank_lines(raw);
        assert_eq!(clean, "foo: bar\nbaz: qux\n");
    }

    #[test]
    fn deep_merge_overwrites_scalars_and_recurses_into_maps() {
        let mut dst: Value = serde_yaml::from_str("a: 1\nb:\n  c: 2\n  d: 3\n").unwrap();
        let src: Value = serde_yaml::from_str("b:\n  c: 99\ne: 5\n").unwrap();
        deep_merge(&mut dst, &src);
        let rendered = serde_yaml::to_string(&dst).unwrap();
        let parsed: serde_yaml::Mapping = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(parsed["a"], Value::from(1));
        assert_eq!(parsed["b"]["c"], Value::from(99));
        assert_eq!(parsed["b"]["d"], Value::from(3));
        assert_eq!(parsed["e"], Value::from(5));
    }

    #[test]
    fn deep_merge_replaces_sequences_instead_of_concatenating() {
        let mut dst: Value = serde_yaml::from_str("items:\n  - a\n  - b\n").unwrap();
        let src: Value = serde_yaml::from_str("items:\n  - z\n").unwrap();
        deep_merge(&mut dst, &src);
        let parsed: serde_yaml::Mapping = serde_yaml::from_str(&serde_yaml::to_string(&dst).unwrap()).unwrap();
        let items = parsed["items"].as_sequence().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0], Value::from("z"));
    }

    #[test]
    fn control_plane_config_contains_etcd_and_api_server_sections() {
        let bundle = new_secrets("v1.9.0");
        let input = PatchInput {
            hostname: "cp-0".to_string(),
            server_id: 42,
            installer_image: installer_image_url(None, "v1.9.0"),
            cert_sans: vec!["1.2.3.4".to_string()],
            opts: MachineOpts { etcd_subnet: Some("10.0.0.0/24".to_string()), ..opts() },
        };
        let rendered =
            generate_machine_config(&bundle, MachineRole::ControlPlane, &input).unwrap();
        assert!(rendered.contains("nodeid:") && rendered.contains("42"));
        assert!(rendered.contains("provider-id:") && rendered.contains("hcloud://42"));
        assert!(rendered.contains("advertisedSubnets"));
        assert!(rendered.contains("enable-aggregator-routing"));
        assert!(rendered.contains("certLifetime:") && rendered.contains("87600h"));
    }

    #[test]
    fn worker_config_omits_control_plane_only_sections() {
        let bundle = new_secrets("v1.9.0");
        let input = PatchInput {
            hostname: "worker-0".to_string(),
            server_id: 7,
            installer_image: installer_image_url(None, "v1.9.0"),
            cert_sans: vec![],
            opts: opts(),
        };
        let rendered = generate_machine_config(&bundle, MachineRole::Worker, &input).unwrap();
        assert!(!rendered.contains("apiServer"));
        assert!(!rendered.contains("advertisedSubnets"));
        assert!(!rendered.contains("kubernetesTalosAPIAccess"));
    }

    #[test]
    fn node_id_and_provider_id_are_absent_when_server_id_is_zero() {
        let bundle = new_secrets("v1.9.0");
        let input = PatchInput {
            hostname: "cp-0".to_string(),
            server_id: 0,
            installer_image: installer_image_url(None, "v1.9.0"),
            cert_sans: vec![],
            opts: opts(),
        };
        let rendered =
            generate_machine_config(&bundle, MachineRole::ControlPlane, &input).unwrap();
        assert!(!rendered.contains("nodeLabels"));
        assert!(!rendered.contains("provider-id"));
    }

    #[test]
    fn public_ipv4_enables_dual_interface_layout() {
        let bundle = new_secrets("v1.9.0");
        let mut machine_opts = opts();
        machine_opts.public_ipv4_enabled = true;
        let input = PatchInput {
            hostname: "cp-0".to_string(),
            server_id: 1,
            installer_image: installer_image_url(None, "v1.9.0"),
            cert_sans: vec![],
            opts: machine_opts,
        };
        let rendered =
            generate_machine_config(&bundle, MachineRole::ControlPlane, &input).unwrap();
        assert!(rendered.contains("eth0"));
        assert!(rendered.contains("eth1"));
        assert!(rendered.contains("dhcpOptions"));
    }
}
