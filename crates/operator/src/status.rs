//! Status subresource and the pure phase-derivation function. Every
//! transition except the first (`Pending` → `Provisioning`) is observational:
//! re-derived each reconcile from the current ready/unhealthy counts, never
//! carried forward as hidden state.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ClusterPhase {
    Pending,
    Provisioning,
    Running,
    Degraded,
    Healing,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PoolStatus {
    pub total: u32,
    pub ready: u32,
    pub unhealthy: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ConditionType {
    ControlPlaneReady,
    WorkersReady,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    pub status: ConditionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct K8znerClusterStatus {
    pub phase: Option<ClusterPhase>,
    pub control_planes: PoolStatus,
    pub workers: PoolStatus,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Default for ClusterPhase {
    fn default() -> Self {
        Self::Pending
    }
}

/// Quorum threshold `⌈total/2⌉+1` as given verbatim by the state-machine
/// contract. Note this is stricter than the usual `⌊n/2⌋+1` etcd quorum —
/// for `total=1` it demands 2 ready members, which a single-control-plane
/// `dev`-mode cluster can never reach. Implemented literally rather than
/// "corrected", since the contract names this exact formula.
#[must_use]
pub fn quorum_threshold(total: u32) -> u32 {
    total.div_ceil(2) + 1
}

/// Re-derives the cluster phase from the previous phase and the current
/// pool counts. `unrecoverable` is supplied by the caller (e.g. a reconcile
/// error classified as fatal); counts alone never produce `Failed`.
#[must_use]
pub fn derive_phase(
    previous: ClusterPhase,
    control_planes: PoolStatus,
    workers: PoolStatus,
    unrecoverable: bool,
) -> ClusterPhase {
    if unrecoverable {
        return ClusterPhase::Failed;
    }

    if previous == ClusterPhase::Pending {
        return if control_planes.total == 0 {
            ClusterPhase::Pending
        } else {
            ClusterPhase::Provisioning
        };
    }

    let has_quorum =
        control_planes.total > 0 && control_planes.ready >= quorum_threshold(control_planes.total);
    if !has_quorum {
        return ClusterPhase::Degraded;
    }

    let control_planes_healthy =
        control_planes.ready == control_planes.total && control_planes.unhealthy == 0;
    let workers_healthy =
        workers.total == 0 || (workers.ready == workers.total && workers.unhealthy == 0);

    if control_planes_healthy && workers_healthy {
        return ClusterPhase::Running;
    }

    match previous {
        ClusterPhase::Provisioning => ClusterPhase::Provisioning,
        ClusterPhase::Running => ClusterPhase::Degraded,
        ClusterPhase::Degraded | ClusterPhase::Healing => ClusterPhase::Healing,
        ClusterPhase::Pending | ClusterPhase::Failed => ClusterPhase::Provisioning,
    }
}

/// Builds the `conditions[]` the status subresource carries, tagging
/// `ControlPlaneReady`/`Ready` with `QuorumLost` when quorum is not met.
#[must_use]
pub fn derive_conditions(control_planes: PoolStatus, workers: PoolStatus) -> Vec<Condition> {
    let has_quorum =
        control_planes.total > 0 && control_planes.ready >= quorum_threshold(control_planes.total);
    let control_planes_healthy =
        control_planes.ready == control_planes.total && control_planes.unhealthy == 0;
    let workers_healthy =
        workers.total == 0 || (workers.ready == workers.total && workers.unhealthy == 0);

    let control_plane_condition = Condition {
        condition_type: ConditionType::ControlPlaneReady,
        status: if control_planes_healthy {
            ConditionStatus::True
        } else {
            ConditionStatus::False
        },
        reason: (!has_quorum).then(|| "QuorumLost".to_string()),
    };

    let workers_condition = Condition {
        condition_type: ConditionType::WorkersReady,
        status: if workers_healthy {
            ConditionStatus::True
        } else {
            ConditionStatus::False
        },
        reason: None,
    };

    let ready_condition = Condition {
        condition_type: ConditionType::Ready,
        status: if control_planes_healthy && workers_healthy {
            ConditionStatus::True
        } else {
            ConditionStatus::False
        },
        reason: (!has_quorum).then(|| "QuorumLost".to_string()),
    };

    vec![control_plane_condition, workers_condition, ready_condition]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_stays_pending_until_control_planes_are_observed() {
        let phase = derive_phase(ClusterPhase::Pending, PoolStatus::default(), PoolStatus::default(), false);
        assert_eq!(phase, ClusterPhase::Pending);
    }

    #[test]
    fn pending_advances_to_provisioning_once_control_planes_exist() {
        let cp = PoolStatus { total: 3, ready: 0, unhealthy: 0 };
        let phase = derive_phase(ClusterPhase::Pending, cp, PoolStatus::default(), false);
        assert_eq!(phase, ClusterPhase::Provisioning);
    }

    #[test]
    fn fully_ready_pools_reach_running() {
        let cp = PoolStatus { total: 3, ready: 3, unhealthy: 0 };
        let workers = PoolStatus { total: 2, ready: 2, unhealthy: 0 };
        let phase = derive_phase(ClusterPhase::Provisioning, cp, workers, false);
        assert_eq!(phase, ClusterPhase::Running);
    }

    #[test]
    fn running_drops_to_degraded_when_a_worker_goes_unhealthy() {
        let cp = PoolStatus { total: 3, ready: 3, unhealthy: 0 };
        let workers = PoolStatus { total: 2, ready: 1, unhealthy: 1 };
        let phase = derive_phase(ClusterPhase::Running, cp, workers, false);
        assert_eq!(phase, ClusterPhase::Degraded);
    }

    #[test]
    fn degraded_recovers_through_healing_back_to_running() {
        let cp = PoolStatus { total: 3, ready: 3, unhealthy: 0 };
        let workers = PoolStatus { total: 2, ready: 1, unhealthy: 1 };
        let healing = derive_phase(ClusterPhase::Degraded, cp, workers, false);
        assert_eq!(healing, ClusterPhase::Healing);

        let workers_recovered = PoolStatus { total: 2, ready: 2, unhealthy: 0 };
        let running = derive_phase(healing, cp, workers_recovered, false);
        assert_eq!(running, ClusterPhase::Running);
    }

    #[test]
    fn unrecoverable_error_forces_failed_from_any_state() {
        let phase = derive_phase(ClusterPhase::Running, PoolStatus::default(), PoolStatus::default(), true);
        assert_eq!(phase, ClusterPhase::Failed);
    }

    #[test]
    fn single_control_plane_never_satisfies_quorum_threshold() {
        assert_eq!(quorum_threshold(1), 2);
        let cp = PoolStatus { total: 1, ready: 1, unhealthy: 0 };
        let phase = derive_phase(ClusterPhase::Provisioning, cp, PoolStatus::default(), false);
        assert_eq!(phase, ClusterPhase::Degraded);
    }

    #[test]
    fn quorum_lost_reason_is_attached_to_control_plane_and_ready_conditions() {
        let cp = PoolStatus { total: 3, ready: 1, unhealthy: 2 };
        let conditions = derive_conditions(cp, PoolStatus::default());
        let cp_condition = conditions
            .iter()
            .find(|c| c.condition_type == ConditionType::ControlPlaneReady)
            .unwrap();
        assert_eq!(cp_condition.reason.as_deref(), Some("QuorumLost"));
    }
}
