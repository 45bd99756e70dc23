//! The five-field user-facing schema (`UserConfig`) and its supporting types.
//!
//! Mirrors the teacher's convention of building up config structs with
//! `#[derive(Serialize, Deserialize)]` plus hand-written constructors rather
//! than a builder macro (see `metal::talos::TalosConfig`).

use serde::{Deserialize, Serialize};

/// Hetzner Cloud region the cluster is provisioned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Nbg1,
    Fsn1,
    Hel1,
}

impl Region {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Region::Nbg1 => "nbg1",
            Region::Fsn1 => "fsn1",
            Region::Hel1 => "hel1",
        }
    }
}

/// Cluster topology mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Dev,
    Ha,
}

impl Mode {
    /// Number of control-plane nodes for this mode.
    #[must_use]
    pub fn control_plane_count(self) -> u8 {
        match self {
            Mode::Dev => 1,
            Mode::Ha => 3,
        }
    }

    /// Number of load balancers for this mode.
    #[must_use]
    pub fn load_balancer_count(self) -> u8 {
        match self {
            Mode::Dev => 1,
            Mode::Ha => 2,
        }
    }
}

/// A Hetzner Cloud server type, accepting both legacy and current names.
///
/// `Normalize()` is idempotent: `s.normalize().normalize() == s.normalize()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerSize {
    /// Legacy `cx22`, successor of `Cx23`.
    Cx22,
    Cx23,
    /// Legacy `cx32`, successor of `Cx33`.
    Cx32,
    Cx33,
    /// Legacy `cx42`, successor of `Cx43`.
    Cx42,
    Cx43,
    /// Legacy `cx52`, successor of `Cx53`.
    Cx52,
    Cx53,
}

/// Specs for a normalized server size: vCPU, RAM (GB), disk (GB).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerSpecs {
    pub vcpu: u32,
    pub ram_gb: u32,
    pub disk_gb: u32,
}

impl ServerSize {
    /// Parse the wire name (current or legacy) of a server size.
    #[must_use]
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s {
            "cx22" => Some(Self::Cx22),
            "cx23" => Some(Self::Cx23),
            "cx32" => Some(Self::Cx32),
            "cx33" => Some(Self::Cx33),
            "cx42" => Some(Self::Cx42),
            "cx43" => Some(Self::Cx43),
            "cx52" => Some(Self::Cx52),
            "cx53" => Some(Self::Cx53),
            _ => None,
        }
    }

    /// The wire name of this size, as stored (pre-normalization).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cx22 => "cx22",
            Self::Cx23 => "cx23",
            Self::Cx32 => "cx32",
            Self::Cx33 => "cx33",
            Self::Cx42 => "cx42",
            Self::Cx43 => "cx43",
            Self::Cx52 => "cx52",
            Self::Cx53 => "cx53",
        }
    }

    /// Map a legacy name to its current successor; current names map to
    /// themselves. Idempotent by construction (no legacy name maps to
    /// another legacy name).
    #[must_use]
    pub fn normalize(self) -> Self {
        match self {
            Self::Cx22 => Self::Cx23,
            Self::Cx32 => Self::Cx33,
            Self::Cx42 => Self::Cx43,
            Self::Cx52 => Self::Cx53,
            current => current,
        }
    }

    /// Whether this is a recognized, provisionable server size.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.specs().vcpu > 0 && self.specs().ram_gb > 0 && self.specs().disk_gb > 0
    }

    /// Hardware specs for the *normalized* form of this size.
    #[must_use]
    pub fn specs(self) -> ServerSpecs {
        match self.normalize() {
            Self::Cx23 => ServerSpecs {
                vcpu: 2,
                ram_gb: 4,
                disk_gb: 40,
            },
            Self::Cx33 => ServerSpecs {
                vcpu: 4,
                ram_gb: 8,
                disk_gb: 80,
            },
            Self::Cx43 => ServerSpecs {
                vcpu: 8,
                ram_gb: 16,
                disk_gb: 160,
            },
            Self::Cx53 => ServerSpecs {
                vcpu: 16,
                ram_gb: 32,
                disk_gb: 240,
            },
            // normalize() never returns a legacy variant.
            Self::Cx22 | Self::Cx32 | Self::Cx42 | Self::Cx52 => unreachable!(),
        }
    }
}

/// Worker node pool request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Workers {
    pub count: u8,
    pub size: ServerSize,
}

/// The complete five-required-field user schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub name: String,
    pub region: Region,
    pub mode: Mode,
    pub workers: Workers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub backup: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_maps_legacy_to_current() {
        assert_eq!(ServerSize::Cx22.normalize(), ServerSize::Cx23);
        assert_eq!(ServerSize::Cx32.normalize(), ServerSize::Cx33);
        assert_eq!(ServerSize::Cx42.normalize(), ServerSize::Cx43);
        assert_eq!(ServerSize::Cx52.normalize(), ServerSize::Cx53);
    }

    #[test]
    fn normalize_is_idempotent() {
        for size in [
            ServerSize::Cx22,
            ServerSize::Cx23,
            ServerSize::Cx32,
            ServerSize::Cx33,
            ServerSize::Cx42,
            ServerSize::Cx43,
            ServerSize::Cx52,
            ServerSize::Cx53,
        ] {
            assert_eq!(size.normalize().normalize(), size.normalize());
        }
    }

    #[test]
    fn cx22_specs_match_cx23() {
        assert_eq!(ServerSize::Cx22.specs(), ServerSize::Cx23.specs());
        assert_eq!(
            ServerSize::Cx22.specs(),
            ServerSpecs {
                vcpu: 2,
                ram_gb: 4,
                disk_gb: 40
            }
        );
    }

    #[test]
    fn all_sizes_are_valid() {
        for size in [
            ServerSize::Cx23,
            ServerSize::Cx33,
            ServerSize::Cx43,
            ServerSize::Cx53,
        ] {
            assert!(size.is_valid());
        }
    }

    #[test]
    fn mode_counts_satisfy_minimum() {
        for mode in [Mode::Dev, Mode::Ha] {
            assert!(mode.load_balancer_count() + mode.control_plane_count() >= 2);
        }
    }
}
