//! Loading and saving `UserConfig` as YAML on disk.
//!
//! Grounded in the teacher's `metal::state::ClusterState::load`/`save`
//! pattern: read-to-string then `serde_yaml::from_str`, `create_dir_all`
//! before writing, serialize with `serde_yaml::to_string`.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::schema::UserConfig;
use crate::validate::{validate, ValidationError};

/// Default config file name looked up by `find_config_path`.
pub const DEFAULT_CONFIG_FILE: &str = "k8zner.yaml";

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("creating directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {path} as YAML: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("serializing config: {0}")]
    Serialize(#[source] serde_yaml::Error),
    #[error("{path} failed validation: {errors:?}")]
    Invalid {
        path: PathBuf,
        errors: Vec<ValidationError>,
    },
    #[error("no {DEFAULT_CONFIG_FILE} found in {0} or any parent directory")]
    NotFound(PathBuf),
}

/// Parse YAML text into a `UserConfig` without touching the filesystem or
/// running validation. Never panics on malformed input;
/// always returns a `Result`.
pub fn parse(contents: &str) -> Result<UserConfig, serde_yaml::Error> {
    serde_yaml::from_str(contents)
}

/// Load and validate a config file. Returns `ConfigFileError::Invalid` if
/// the parsed config fails validation.
pub fn load(path: impl AsRef<Path>) -> Result<UserConfig, ConfigFileError> {
    let cfg = load_without_validation(path.as_ref())?;
    let errors = validate(&cfg);
    if !errors.is_empty() {
        return Err(ConfigFileError::Invalid {
            path: path.as_ref().to_path_buf(),
            errors,
        });
    }
    Ok(cfg)
}

/// Load a config file without running validation. Used by callers that want
/// to inspect or repair an invalid config rather than reject it outright.
pub fn load_without_validation(path: impl AsRef<Path>) -> Result<UserConfig, ConfigFileError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents).map_err(|source| ConfigFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize and write a `UserConfig` to `path`, creating parent directories
/// as needed. Does not validate — callers that want to guarantee a
/// reloadable config should validate before calling `save`.
pub fn save(cfg: &UserConfig, path: impl AsRef<Path>) -> Result<(), ConfigFileError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigFileError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    let yaml = serde_yaml::to_string(cfg).map_err(ConfigFileError::Serialize)?;
    std::fs::write(path, yaml).map_err(|source| ConfigFileError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Walk upward from `start` looking for `k8zner.yaml`, the way the teacher's
/// CLI front-end locates its own workspace root file (out of scope here, but
/// the lookup itself belongs to config loading regardless of front-end).
pub fn find_config_path(start: impl AsRef<Path>) -> Result<PathBuf, ConfigFileError> {
    let mut dir = start.as_ref().to_path_buf();
    loop {
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !dir.pop() {
            return Err(ConfigFileError::NotFound(start.as_ref().to_path_buf()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Mode, Region, ServerSize, Workers};

    fn sample() -> UserConfig {
        UserConfig {
            name: "dev".to_string(),
            region: Region::Fsn1,
            mode: Mode::Dev,
            workers: Workers {
                count: 2,
                size: ServerSize::Cx33,
            },
            domain: Some("example.com".to_string()),
            backup: false,
        }
    }

    #[test]
    fn round_trip_through_save_and_load() {
        let dir = tempdir();
        let path = dir.join("k8zner.yaml");
        let cfg = sample();
        save(&cfg, &path).unwrap();
        let loaded = load_without_validation(&path).unwrap();
        assert_eq!(loaded.name, cfg.name);
        assert_eq!(loaded.region, cfg.region);
        assert_eq!(loaded.mode, cfg.mode);
        assert_eq!(loaded.workers.count, cfg.workers.count);
        assert_eq!(loaded.workers.size, cfg.workers.size);
        assert_eq!(loaded.domain, cfg.domain);
        assert_eq!(loaded.backup, cfg.backup);
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn parse_never_panics_on_garbage() {
        for garbage in ["", "{{{", "not: [valid, yaml: :", "- just\n- a\n- list"] {
            let _ = parse(garbage);
        }
    }

    #[test]
    fn find_config_path_walks_up_parents() {
        let root = tempdir();
        let nested = root.join("a").join("b").join("c");
        std::fs::create_dir_all(&nested).unwrap();
        save(&sample(), root.join(DEFAULT_CONFIG_FILE)).unwrap();
        let found = find_config_path(&nested).unwrap();
        assert_eq!(found, root.join(DEFAULT_CONFIG_FILE));
        std::fs::remove_dir_all(root).ok();
    }

    #[test]
    fn find_config_path_errors_when_absent() {
        let dir = tempdir();
        assert!(find_config_path(&dir).is_err());
        std::fs::remove_dir_all(dir).ok();
    }

    fn tempdir() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("k8zner-config-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&p).unwrap();
        p
    }
}
