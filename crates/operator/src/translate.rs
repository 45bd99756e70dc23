//! Translation contract: given a `K8znerCluster` spec and a resolved
//! `Credentials` record, produce the identical `Config` the CLI would
//! produce for an equivalent `UserConfig`.
//!
//! This is deliberately a thin mapping into `UserConfig` followed by a
//! direct call to [`k8zner_config::expand`] — the same function the CLI
//! path calls — rather than a parallel re-implementation of `Expand`'s
//! decisions. Cross-path equivalence holds by construction: there is only
//! one expansion function, and both front-ends call it.

use k8zner_config::{expand, Config, ConfigExpansionError, Mode, Region, ServerSize, UserConfig, Workers};
use thiserror::Error;

use crate::types::{K8znerClusterSpec, ModeSpec, RegionSpec, ServerSizeSpec};

/// Credentials resolved from the secret named by `spec.credentialsRef`.
/// Mirrors the environment variables enumerated for the CLI path: the
/// operator sets them into the process environment before calling
/// `expand`, since `expand` itself reads them from the environment for
/// backup/domain-dependent decisions.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub hcloud_token: String,
    pub cf_api_token: Option<String>,
    pub hetzner_s3_access_key: Option<String>,
    pub hetzner_s3_secret_key: Option<String>,
}

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("cluster config failed validation/expansion: {0}")]
    Expansion(#[from] ConfigExpansionError),
}

fn region_from_spec(region: RegionSpec) -> Region {
    match region {
        RegionSpec::Nbg1 => Region::Nbg1,
        RegionSpec::Fsn1 => Region::Fsn1,
        RegionSpec::Hel1 => Region::Hel1,
    }
}

fn mode_from_spec(mode: ModeSpec) -> Mode {
    match mode {
        ModeSpec::Dev => Mode::Dev,
        ModeSpec::Ha => Mode::Ha,
    }
}

fn server_size_from_spec(size: ServerSizeSpec) -> ServerSize {
    let name = match size {
        ServerSizeSpec::Cx22 => "cx22",
        ServerSizeSpec::Cx23 => "cx23",
        ServerSizeSpec::Cx32 => "cx32",
        ServerSizeSpec::Cx33 => "cx33",
        ServerSizeSpec::Cx42 => "cx42",
        ServerSizeSpec::Cx43 => "cx43",
        ServerSizeSpec::Cx52 => "cx52",
        ServerSizeSpec::Cx53 => "cx53",
    };
    ServerSize::from_str_name(name).expect("ServerSizeSpec variants all have a matching ServerSize name")
}

/// `spec` + `credentials_ref`'s resolved pool overrides are not inputs here:
/// only the `UserConfig`-isomorphic fields feed `expand`. Pool sizing in the
/// CR is carried for status/reconcile bookkeeping, never as a second source
/// of truth for `Config`.
fn user_config_from_spec(spec: &K8znerClusterSpec) -> UserConfig {
    UserConfig {
        name: spec.name.clone(),
        region: region_from_spec(spec.region),
        mode: mode_from_spec(spec.mode),
        workers: Workers {
            count: spec.workers.count,
            size: server_size_from_spec(spec.workers.size),
        },
        domain: spec.domain.clone(),
        backup: spec.backup,
    }
}

/// Sets the environment variables `expand` consumes, mirroring the CLI's
/// own startup contract (`HCLOUD_TOKEN` always; `CF_API_TOKEN` when a
/// domain is set; the S3 pair when `backup` is enabled). Safe to call
/// repeatedly: each reconcile re-sets the same values from the same secret.
fn apply_credentials(credentials: &Credentials) {
    std::env::set_var("HCLOUD_TOKEN", &credentials.hcloud_token);
    if let Some(token) = &credentials.cf_api_token {
        std::env::set_var("CF_API_TOKEN", token);
    }
    if let Some(key) = &credentials.hetzner_s3_access_key {
        std::env::set_var("HETZNER_S3_ACCESS_KEY", key);
    }
    if let Some(key) = &credentials.hetzner_s3_secret_key {
        std::env::set_var("HETZNER_S3_SECRET_KEY", key);
    }
}

/// Produces the `Config` for this cluster spec, byte-for-byte identical to
/// what the CLI would produce for the equivalent `UserConfig`.
pub fn translate(spec: &K8znerClusterSpec, credentials: &Credentials) -> Result<Config, TranslationError> {
    apply_credentials(credentials);
    let user_config = user_config_from_spec(spec);
    expand(&user_config).map_err(TranslationError::from)
}
