//! Builds a Talos Linux Hetzner Cloud snapshot by installing the official
//! raw metal image onto an ephemeral rescue-mode server over SSH.
//!
//! [`keypair`] generates the throwaway RSA keypair used to authenticate to
//! rescue mode; [`ssh`] wraps the blocking `ssh2` session used to run the
//! single install command; [`build`] drives the full protocol end to end
//! and owns cleanup of every ephemeral resource it creates.

pub mod build;
pub mod keypair;
pub mod ssh;

pub use build::{build_image, build_image_with_executor, Architecture, BuildError, BuildRequest};
pub use keypair::{generate as generate_keypair, Keypair, KeypairError};
pub use ssh::{connect_with_retry, run_command, Ssh2Executor, SshError, SshExecutor};
