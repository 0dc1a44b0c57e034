//! Environment variable management for testing
//!
//! This module provides utilities for managing XDG and apppass environment
//! variables during testing to ensure tests don't interfere with each other.
//! Environment variables are process-global, so every test that mutates them
//! should hold [`env_lock`] for its whole duration.

use std::env;
use std::path::PathBuf;
use std::sync::LazyLock;

use parking_lot::{Mutex, MutexGuard};
use tempfile::TempDir;

static ENV_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Serialize tests that touch process environment variables.
pub fn env_lock() -> MutexGuard<'static, ()> {
  ENV_LOCK.lock()
}

/// A test environment that overrides XDG directories to use a per-test
/// temporary directory
pub struct EnvTestGuard {
  /// The temporary directory that will be used for XDG directories
  pub temp_dir: TempDir,
  /// The original XDG_CONFIG_HOME value, if any
  original_config_home: Option<String>,
  /// The original XDG_DATA_HOME value, if any
  original_data_home: Option<String>,
}

impl Default for EnvTestGuard {
  fn default() -> Self {
    Self::new()
  }
}

impl EnvTestGuard {
  /// XDG environment variable names
  pub const XDG_CONFIG_HOME: &'static str = "XDG_CONFIG_HOME";
  pub const XDG_DATA_HOME: &'static str = "XDG_DATA_HOME";

  /// Create a new test environment with overridden XDG directories
  pub fn new() -> Self {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");

    // Save original XDG environment variables
    let original_config_home = env::var(Self::XDG_CONFIG_HOME).ok();
    let original_data_home = env::var(Self::XDG_DATA_HOME).ok();

    // Override XDG environment variables to use the temporary directory
    let temp_path = temp_dir.path().to_path_buf();
    unsafe {
      env::set_var(Self::XDG_CONFIG_HOME, temp_path.join("config"));
      env::set_var(Self::XDG_DATA_HOME, temp_path.join("data"));
    }

    std::fs::create_dir_all(temp_path.join("config")).expect("Failed to create config directory");
    std::fs::create_dir_all(temp_path.join("data")).expect("Failed to create data directory");

    Self {
      temp_dir,
      original_config_home,
      original_data_home,
    }
  }

  /// Get the path to the XDG config directory
  pub fn config_dir(&self) -> PathBuf {
    self.temp_dir.path().join("config")
  }

  /// Get the path to the XDG data directory
  pub fn data_dir(&self) -> PathBuf {
    self.temp_dir.path().join("data")
  }
}

impl Drop for EnvTestGuard {
  fn drop(&mut self) {
    restore_var(EnvTestGuard::XDG_CONFIG_HOME, self.original_config_home.as_deref());
    restore_var(EnvTestGuard::XDG_DATA_HOME, self.original_data_home.as_deref());
  }
}

/// Clears a single environment variable for the lifetime of the guard and
/// restores its original value on drop.
pub struct EnvVarGuard {
  name: &'static str,
  original: Option<String>,
}

impl EnvVarGuard {
  /// Save and clear `name`
  pub fn new(name: &'static str) -> Self {
    let original = env::var(name).ok();
    unsafe {
      env::remove_var(name);
    }
    Self { name, original }
  }

  /// Set the variable for the rest of the test
  pub fn set(&self, value: &str) {
    unsafe {
      env::set_var(self.name, value);
    }
  }
}

impl Drop for EnvVarGuard {
  fn drop(&mut self) {
    restore_var(self.name, self.original.as_deref());
  }
}

fn restore_var(name: &str, original: Option<&str>) {
  match original {
    Some(val) => unsafe {
      env::set_var(name, val);
    },
    None => unsafe {
      env::remove_var(name);
    },
  }
}
