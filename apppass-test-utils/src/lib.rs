//! Test utilities shared across the apppass workspace
//!
//! This crate provides common testing infrastructure including:
//! - XDG directory mocking ([`EnvTestGuard`]) and single-variable overrides
//!   ([`EnvVarGuard`]), serialized through [`env_lock`]
//! - Isolated configuration directories for CLI runs ([`ConfigDirsTestGuard`])
//! - Site and credential fixtures, and a call-counting credential store
//!
//! The clippy dead_code lint is disabled for this crate because test utilities
//! may not be used by all tests, and the compiler cannot detect usage across
//! crate boundaries in development dependencies.

#![allow(dead_code)]

pub mod config;
pub mod env;
pub mod fixtures;

// Re-export commonly used items
pub use config::ConfigDirsTestGuard;
pub use env::{EnvTestGuard, EnvVarGuard, env_lock};
pub use fixtures::{CountingCredentialStore, jetpack_site, self_hosted_site, test_credentials};
