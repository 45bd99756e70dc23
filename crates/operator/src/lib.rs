//! `K8znerCluster` CRD types and the CR-to-`Config` translation contract.
//!
//! The CRD watch loop and status-patching controller themselves are out of
//! scope here; this crate carries only what the contract requires: the
//! resource shape ([`types`]), the pure status-phase derivation
//! ([`status`]), and the translation from a CR plus resolved credentials
//! into the same `Config` the CLI path produces ([`translate`]).

pub mod status;
pub mod translate;
pub mod types;

pub use status::{
    derive_conditions, derive_phase, quorum_threshold, ClusterPhase, Condition, ConditionStatus,
    ConditionType, K8znerClusterStatus, PoolStatus,
};
pub use translate::{translate, Credentials, TranslationError};
pub use types::{
    CredentialsRef, K8znerCluster, K8znerClusterSpec, ModeSpec, PoolSpec, RegionSpec,
    ServerSizeSpec, WorkersSpec,
};
