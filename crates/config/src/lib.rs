//! User-facing schema, validation, version pinning, and expansion into the
//! internal cluster configuration for k8zner.
//!
//! This crate is pure except for the environment-variable lookups the
//! Expander performs for backup credentials.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod expand;
pub mod file;
pub mod internal;
pub mod schema;
pub mod validate;
pub mod versions;

pub use expand::{expand, ConfigExpansionError};
pub use file::ConfigFileError;
pub use internal::Config;
pub use schema::{Mode, Region, ServerSize, UserConfig, Workers};
pub use validate::{validate, ValidationError};
pub use versions::{default_version_matrix, VersionMatrix};
