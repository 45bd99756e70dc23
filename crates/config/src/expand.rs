//! `Expand`: turns the five required user-facing fields into the complete
//! internal `Config`.
//!
//! Every decision this function makes is deliberately undocumented at the
//! `UserConfig` level — the user never requests a CIDR block or a Traefik
//! deployment kind. Mirrors the teacher's `metal::talos::config::expand`-ish
//! materialization from a slim request into a fully-populated machine description:
//! few inputs, many defaults, one function that is the single source of
//! truth for all of them.

use thiserror::Error;

use crate::internal::{
    Addons, ArgoCdAddon, CcmAddon, CertManagerAddon, CertManagerCloudflareAddon, CiliumAddon,
    CloudflareAddon, Config, ControlPlaneConfig, CsiAddon, ExternalDnsAddon, FirewallConfig,
    GatewayApiCrdsAddon, IngressConfig, KubernetesConfig, MetricsServerAddon, NetworkPlan,
    NodePool, PrometheusOperatorCrdsAddon, RoutingMode, TalosBackupAddon, TalosCcmAddon,
    TalosConfig, TalosMachineOpts, TraefikAddon, TraefikKind, WorkersConfig,
};
use crate::schema::{Mode, Region, UserConfig};
use crate::validate::{validate, ValidationError};
use crate::versions::default_version_matrix;

/// Failure modes of `expand()`.
#[derive(Debug, Error)]
pub enum ConfigExpansionError {
    #[error("config failed validation: {0:?}")]
    Validation(Vec<ValidationError>),
    #[error("environment variable {0} required by backup/domain config disappeared between validate and expand")]
    EnvVarDisappeared(&'static str),
}

/// Hetzner Cloud network zone for a region. `nbg1`/`fsn1` are both in
/// `eu-central`; `hel1` is `eu-north`.
fn network_zone(region: Region) -> &'static str {
    match region {
        Region::Nbg1 | Region::Fsn1 => "eu-central",
        Region::Hel1 => "eu-north",
    }
}

/// Hetzner Object Storage endpoint for a region, used as the default
/// Talos-backup S3 target.
fn object_storage_endpoint(region: Region) -> String {
    format!("https://{}.your-objectstorage.com", region.as_str())
}

/// Expand a validated `UserConfig` into the internal `Config`.
///
/// Runs `validate()` itself and returns `ConfigExpansionError::Validation`
/// rather than expanding an invalid config — there is no code path that
/// calls `expand()` without having validation succeed first.
pub fn expand(cfg: &UserConfig) -> Result<Config, ConfigExpansionError> {
    let errors = validate(cfg);
    if !errors.is_empty() {
        return Err(ConfigExpansionError::Validation(errors));
    }

    let versions = default_version_matrix();
    let region = cfg.region;
    let mode = cfg.mode;
    let domain = cfg.domain.clone();
    let has_domain = domain.is_some();

    let network = NetworkPlan {
        private_network_cidr: "10.0.0.0/16".to_string(),
        node_subnet_cidr: "10.0.0.0/20".to_string(),
        pod_subnet_cidr: "10.244.0.0/16".to_string(),
        service_subnet_cidr: "10.96.0.0/12".to_string(),
        zone: network_zone(region).to_string(),
    };

    let firewall = FirewallConfig {
        use_current_ipv4: true,
        use_current_ipv6: true,
    };

    let api_load_balancer_enabled = matches!(mode, Mode::Ha);

    let control_plane = ControlPlaneConfig {
        node_pools: vec![NodePool {
            name: "control-plane".to_string(),
            count: mode.control_plane_count(),
            server_type: "cx23".to_string(),
            location: region.as_str().to_string(),
            placement_group: true,
        }],
        public_vip_ipv4_enabled: api_load_balancer_enabled,
    };

    let workers = WorkersConfig {
        node_pools: vec![NodePool {
            name: "workers".to_string(),
            count: cfg.workers.count,
            server_type: cfg.workers.size.normalize().as_str().to_string(),
            location: region.as_str().to_string(),
            placement_group: true,
        }],
    };

    let ingress = IngressConfig {
        enabled: matches!(mode, Mode::Ha),
    };

    let talos = TalosConfig {
        version: versions.talos.clone(),
        machine: TalosMachineOpts {
            ipv6_enabled: true,
            public_ipv4_enabled: false,
            disk_encryption_state: true,
            disk_encryption_ephemeral: true,
            coredns_enabled: true,
            discovery_enabled: true,
        },
    };

    let kubernetes = KubernetesConfig {
        version: versions.kubernetes.clone(),
        domain: domain.clone().unwrap_or_else(|| "cluster.local".to_string()),
        api_load_balancer_enabled,
        scheduling_on_control_planes: matches!(mode, Mode::Dev),
    };

    let traefik_daemonset = matches!(mode, Mode::Dev);

    let argocd_ingress_host = domain.as_ref().map(|d| format!("argocd.{d}"));

    let backup_access_key = if cfg.backup {
        Some(
            std::env::var("HETZNER_S3_ACCESS_KEY")
                .map_err(|_| ConfigExpansionError::EnvVarDisappeared("HETZNER_S3_ACCESS_KEY"))?,
        )
    } else {
        None
    };
    let backup_secret_key = if cfg.backup {
        Some(
            std::env::var("HETZNER_S3_SECRET_KEY")
                .map_err(|_| ConfigExpansionError::EnvVarDisappeared("HETZNER_S3_SECRET_KEY"))?,
        )
    } else {
        None
    };

    let addons = Addons {
        ccm: CcmAddon { enabled: true },
        csi: CsiAddon { enabled: true },
        cilium: CiliumAddon {
            enabled: true,
            kube_proxy_replacement: true,
            routing_mode: RoutingMode::Native,
            hubble_enabled: true,
            hubble_relay_enabled: true,
            hubble_ui_enabled: matches!(mode, Mode::Dev),
        },
        traefik: TraefikAddon {
            enabled: true,
            kind: if traefik_daemonset {
                TraefikKind::DaemonSet
            } else {
                TraefikKind::Deployment
            },
            host_network: traefik_daemonset,
        },
        metrics_server: MetricsServerAddon { enabled: true },
        cert_manager: CertManagerAddon {
            enabled: has_domain,
            cloudflare: CertManagerCloudflareAddon {
                enabled: has_domain,
            },
        },
        argocd: ArgoCdAddon {
            enabled: true,
            ha: matches!(mode, Mode::Ha),
            ingress_enabled: has_domain,
            ingress_host: argocd_ingress_host,
            ingress_tls: has_domain,
        },
        gateway_api_crds: GatewayApiCrdsAddon { enabled: true },
        prometheus_operator_crds: PrometheusOperatorCrdsAddon { enabled: true },
        talos_ccm: TalosCcmAddon { enabled: true },
        cloudflare: CloudflareAddon {
            enabled: has_domain,
        },
        external_dns: ExternalDnsAddon {
            enabled: has_domain,
            policy: "sync".to_string(),
            sources: vec!["ingress".to_string()],
        },
        talos_backup: TalosBackupAddon {
            enabled: cfg.backup,
            s3_endpoint: object_storage_endpoint(region),
            s3_bucket: format!("{}-etcd-backups", cfg.name),
            schedule: "0 * * * *".to_string(),
            enable_compression: true,
            // Bucket itself is private, so transport/server-side encryption isn't layered on top.
            encryption_disabled: true,
            access_key: backup_access_key,
            secret_key: backup_secret_key,
        },
    };

    let config = Config {
        name: cfg.name.clone(),
        region,
        mode,
        network,
        firewall,
        control_plane,
        workers,
        ingress,
        talos,
        kubernetes,
        addons,
    };

    debug_assert!(config.check_invariants());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ServerSize, Workers};

    fn minimal_dev() -> UserConfig {
        UserConfig {
            name: "dev".to_string(),
            region: Region::Fsn1,
            mode: Mode::Dev,
            workers: Workers {
                count: 1,
                size: ServerSize::Cx23,
            },
            domain: None,
            backup: false,
        }
    }

    #[test]
    fn minimal_dev_config_expands() {
        let cfg = expand(&minimal_dev()).unwrap();
        assert_eq!(cfg.control_plane.count(), 1);
        assert!(!cfg.ingress.enabled);
        assert!(!cfg.kubernetes.api_load_balancer_enabled);
        assert!(cfg.kubernetes.scheduling_on_control_planes);
        assert_eq!(cfg.kubernetes.domain, "cluster.local");
        assert!(matches!(cfg.addons.traefik.kind, TraefikKind::DaemonSet));
        assert!(!cfg.addons.cloudflare.enabled);
        assert!(!cfg.addons.talos_backup.enabled);
    }

    #[test]
    #[serial_test::serial(env)]
    fn ha_with_domain_expands() {
        std::env::set_var("CF_API_TOKEN", "token");
        let mut cfg = minimal_dev();
        cfg.mode = Mode::Ha;
        cfg.domain = Some("example.com".to_string());
        let expanded = expand(&cfg).unwrap();
        assert_eq!(expanded.control_plane.count(), 3);
        assert!(expanded.ingress.enabled);
        assert!(expanded.kubernetes.api_load_balancer_enabled);
        assert!(!expanded.kubernetes.scheduling_on_control_planes);
        assert_eq!(expanded.kubernetes.domain, "example.com");
        assert!(matches!(
            expanded.addons.traefik.kind,
            TraefikKind::Deployment
        ));
        assert!(expanded.addons.cloudflare.enabled);
        assert!(expanded.addons.cert_manager.enabled);
        assert_eq!(
            expanded.addons.argocd.ingress_host,
            Some("argocd.example.com".to_string())
        );
        assert_eq!(expanded.addons.external_dns.sources, vec!["ingress".to_string()]);
        std::env::remove_var("CF_API_TOKEN");
    }

    #[test]
    fn legacy_size_alias_normalizes_in_worker_pool() {
        let mut cfg = minimal_dev();
        cfg.workers.size = ServerSize::Cx22;
        let expanded = expand(&cfg).unwrap();
        assert_eq!(expanded.workers.node_pools[0].server_type, "cx23");
    }

    #[test]
    #[serial_test::serial(env)]
    fn backup_in_helsinki_uses_regional_endpoint() {
        std::env::set_var("HETZNER_S3_ACCESS_KEY", "ak");
        std::env::set_var("HETZNER_S3_SECRET_KEY", "sk");
        let mut cfg = minimal_dev();
        cfg.region = Region::Hel1;
        cfg.backup = true;
        let expanded = expand(&cfg).unwrap();
        assert!(expanded.addons.talos_backup.enabled);
        assert_eq!(
            expanded.addons.talos_backup.s3_endpoint,
            "https://hel1.your-objectstorage.com"
        );
        assert_eq!(expanded.addons.talos_backup.s3_bucket, "dev-etcd-backups");
        assert_eq!(
            expanded.addons.talos_backup.access_key.as_deref(),
            Some("ak")
        );
        std::env::remove_var("HETZNER_S3_ACCESS_KEY");
        std::env::remove_var("HETZNER_S3_SECRET_KEY");
    }

    #[test]
    fn invalid_config_is_rejected_before_expansion() {
        let mut cfg = minimal_dev();
        cfg.name = String::new();
        assert!(matches!(
            expand(&cfg),
            Err(ConfigExpansionError::Validation(_))
        ));
    }
}
