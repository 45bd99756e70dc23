//! Cloud provider adapters.
//!
//! k8zner targets Hetzner Cloud only; this module exists so the crate can
//! grow a second provider later without reshaping the reconciler.

pub mod hetzner;
