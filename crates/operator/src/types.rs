//! The `K8znerCluster` custom resource: a spec roughly isomorphic to
//! `UserConfig` plus explicit control-plane/worker pool observability and a
//! reference to the secret holding provider credentials.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::status::K8znerClusterStatus;

/// Wire form of [`k8zner_config::Region`]. Kept separate rather than
/// deriving `JsonSchema` on the config crate's own enum, so the config
/// crate stays free of a CRD-tooling dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RegionSpec {
    Nbg1,
    Fsn1,
    Hel1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ModeSpec {
    Dev,
    Ha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ServerSizeSpec {
    Cx22,
    Cx23,
    Cx32,
    Cx33,
    Cx42,
    Cx43,
    Cx52,
    Cx53,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkersSpec {
    pub count: u8,
    pub size: ServerSizeSpec,
}

/// Observed-desired pool sizing, carried alongside the `UserConfig`-isomorphic
/// fields for status/reconcile bookkeeping. `translate` does not consume
/// these: the `Config` the reconciler acts on is always the one `expand`
/// derives from `mode`/`workers`, never a pool override from here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PoolSpec {
    pub replicas: u32,
}

/// Names the opaque secret carrying `HCLOUD_TOKEN` and the feature-gated
/// credentials (`CF_API_TOKEN`, `HETZNER_S3_ACCESS_KEY`/`SECRET_KEY`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsRef {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "k8zner.io",
    version = "v1alpha1",
    kind = "K8znerCluster",
    namespaced,
    status = "K8znerClusterStatus"
)]
#[kube(printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#)]
#[kube(printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#)]
#[serde(rename_all = "camelCase")]
pub struct K8znerClusterSpec {
    pub name: String,
    pub region: RegionSpec,
    pub mode: ModeSpec,
    pub workers: WorkersSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default)]
    pub backup: bool,
    pub control_plane_pool: PoolSpec,
    pub worker_pool: PoolSpec,
    pub credentials_ref: CredentialsRef,
}
