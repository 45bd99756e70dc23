//! The pinned version matrix.
//!
//! `default_version_matrix()` is the single source of truth for every
//! pinned component version. Treat a change to its return value as a
//! deliberate release action, not a routine edit — mirrors the teacher's
//! treatment of `DEFAULT_TALOS_VERSION`/`DEFAULT_SCHEMATIC_ID` as release
//! constants in `metal::talos::config`.

/// Pinned component versions for a generated cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMatrix {
    pub talos: String,
    pub kubernetes: String,
    pub cilium: String,
    pub traefik: String,
    pub cert_manager: String,
    pub metrics_server: String,
    pub argocd: String,
    pub hcloud_ccm: String,
    pub hcloud_csi: String,
    pub talos_ccm: String,
    pub external_dns: String,
    pub gateway_api_crds: String,
    pub prometheus_operator_crds: String,
    pub talos_backup: String,
}

/// Returns the compile-time-pinned version matrix.
///
/// # Panics
/// Never — every field is a non-empty literal; this is enforced by
/// `version_matrix_contract` below.
#[must_use]
pub fn default_version_matrix() -> VersionMatrix {
    VersionMatrix {
        talos: "v1.9.1".to_string(),
        kubernetes: "1.32.1".to_string(),
        cilium: "1.16.5".to_string(),
        traefik: "33.2.1".to_string(),
        cert_manager: "v1.16.3".to_string(),
        metrics_server: "3.12.2".to_string(),
        argocd: "7.8.2".to_string(),
        hcloud_ccm: "1.23.0".to_string(),
        hcloud_csi: "2.11.0".to_string(),
        talos_ccm: "0.2.0".to_string(),
        external_dns: "1.15.0".to_string(),
        gateway_api_crds: "1.2.0".to_string(),
        prometheus_operator_crds: "17.0.0".to_string(),
        talos_backup: "0.1.0".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_field_is_non_empty() {
        let v = default_version_matrix();
        assert!(!v.talos.is_empty());
        assert!(!v.kubernetes.is_empty());
        assert!(!v.cilium.is_empty());
        assert!(!v.traefik.is_empty());
        assert!(!v.cert_manager.is_empty());
        assert!(!v.metrics_server.is_empty());
        assert!(!v.argocd.is_empty());
        assert!(!v.hcloud_ccm.is_empty());
        assert!(!v.hcloud_csi.is_empty());
        assert!(!v.talos_ccm.is_empty());
        assert!(!v.external_dns.is_empty());
        assert!(!v.gateway_api_crds.is_empty());
        assert!(!v.prometheus_operator_crds.is_empty());
        assert!(!v.talos_backup.is_empty());
    }

    #[test]
    fn talos_version_starts_with_v() {
        assert!(default_version_matrix().talos.starts_with('v'));
    }

    #[test]
    fn kubernetes_version_does_not_start_with_v() {
        assert!(!default_version_matrix().kubernetes.starts_with('v'));
    }
}
