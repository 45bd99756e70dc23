//! Cluster secrets bundle: the root cryptographic material that determines
//! cluster identity. Every control-plane and worker machine config is a
//! function of one of these bundles plus a role.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

#[derive(Debug, Error)]
pub enum SecretsError {
    #[error("parent directory of {0} does not exist")]
    ParentMissing(String),
    #[error("secrets bundle at {0} is missing required fields")]
    Invalid(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// The instant a bundle's certificates are considered issued at. Never
/// persisted: `LoadSecrets` re-seeds it to the load time, since a stale
/// clock baked into a years-old file would be meaningless.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    fn now() -> Self {
        Self(Utc::now())
    }
}

/// Root cryptographic material for one cluster. A single bundle determines
/// cluster identity; every node's machine config derives from the same one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bundle {
    pub talos_version: String,
    pub cluster_id: String,
    pub cluster_secret: String,
    pub ca_crt: String,
    pub ca_key: String,
    pub etcd_ca_crt: String,
    pub etcd_ca_key: String,
    pub bootstrap_token: String,
    pub secretbox_encryption_secret: String,
    #[serde(skip)]
    pub clock: Option<FixedClock>,
}

fn random_hex(num_bytes: usize) -> String {
    let mut bytes = vec![0u8; num_bytes];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

impl Bundle {
    #[must_use]
    pub fn new(talos_version: impl Into<String>) -> Self {
        Self {
            talos_version: talos_version.into(),
            cluster_id: random_hex(16),
            cluster_secret: random_hex(32),
            ca_crt: random_hex(64),
            ca_key: random_hex(64),
            etcd_ca_crt: random_hex(64),
            etcd_ca_key: random_hex(64),
            bootstrap_token: format!("{}.{}", random_hex(3), random_hex(8)),
            secretbox_encryption_secret: random_hex(32),
            clock: Some(FixedClock::now()),
        }
    }
}

/// Derive a version contract and generate a fresh bundle with a fixed clock
/// seeded at wall time.
#[must_use]
pub fn new_secrets(talos_version: impl Into<String>) -> Bundle {
    Bundle::new(talos_version)
}

/// Serialize the bundle, write it with `0600` permissions. Fails if the
/// parent directory does not exist; this function never creates it.
pub fn save_secrets(path: &Path, bundle: &Bundle) -> Result<(), SecretsError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            return Err(SecretsError::ParentMissing(path.display().to_string()));
        }
    }
    let yaml = serde_yaml::to_string(bundle)?;
    fs::write(path, yaml)?;
    restrict_permissions(path)?;
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Deserialize, reject an empty/nil bundle, and re-inject a fresh clock.
pub fn load_secrets(path: &Path) -> Result<Bundle, SecretsError> {
    let contents = fs::read_to_string(path)?;
    let mut bundle: Bundle = serde_yaml::from_str(&contents)?;
    if bundle.cluster_id.is_empty() || bundle.cluster_secret.is_empty() {
        return Err(SecretsError::Invalid(path.display().to_string()));
    }
    bundle.clock = Some(FixedClock::now());
    Ok(bundle)
}

/// Load the bundle at `path` if it exists, otherwise generate and persist a
/// fresh one.
pub fn get_or_generate_secrets(
    path: &Path,
    talos_version: impl Into<String>,
) -> Result<Bundle, SecretsError> {
    if path.exists() {
        load_secrets(path)
    } else {
        let bundle = new_secrets(talos_version);
        save_secrets(path, &bundle)?;
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_secrets_populates_all_material() {
        let bundle = new_secrets("v1.9.0");
        assert_eq!(bundle.talos_version, "v1.9.0");
        assert!(!bundle.cluster_id.is_empty());
        assert!(!bundle.ca_crt.is_empty());
        assert!(bundle.clock.is_some());
    }

    #[test]
    fn save_fails_when_parent_missing() {
        let bundle = new_secrets("v1.9.0");
        let path = Path::new("/nonexistent-dir-xyz/secrets.yaml");
        let err = save_secrets(path, &bundle).unwrap_err();
        assert!(matches!(err, SecretsError::ParentMissing(_)));
    }

    #[test]
    fn save_then_load_round_trips_material_with_fresh_clock() {
        let dir = std::env::temp_dir().join(format!("k8zner-secrets-test-{}", random_hex(4)));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("secrets.yaml");
        let bundle = new_secrets("v1.9.0");
        save_secrets(&path, &bundle).unwrap();

        let loaded = load_secrets(&path).unwrap();
        assert_eq!(loaded.cluster_id, bundle.cluster_id);
        assert_eq!(loaded.ca_crt, bundle.ca_crt);
        assert!(loaded.clock.is_some());

        #[cfg(unix)]
        {
            let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600);
        }

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_rejects_empty_bundle() {
        let dir = std::env::temp_dir().join(format!("k8zner-secrets-test-{}", random_hex(4)));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("empty.yaml");
        fs::write(&path, "talos_version: \"\"\ncluster_id: \"\"\ncluster_secret: \"\"\nca_crt: \"\"\nca_key: \"\"\netcd_ca_crt: \"\"\netcd_ca_key: \"\"\nbootstrap_token: \"\"\nsecretbox_encryption_secret: \"\"\n").unwrap();

        let err = load_secrets(&path).unwrap_err();
        assert!(matches!(err, SecretsError::Invalid(_)));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn get_or_generate_is_idempotent_across_calls() {
        let dir = std::env::temp_dir().join(format!("k8zner-secrets-test-{}", random_hex(4)));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("secrets.yaml");

        let first = get_or_generate_secrets(&path, "v1.9.0").unwrap();
        let second = get_or_generate_secrets(&path, "v1.9.0").unwrap();
        assert_eq!(first.cluster_id, second.cluster_id);
        assert_eq!(first.cluster_secret, second.cluster_secret);

        fs::remove_dir_all(&dir).ok();
    }
}
