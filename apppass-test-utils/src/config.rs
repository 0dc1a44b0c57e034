//! Configuration directory management for testing
//!
//! Spawned CLI processes must never see the developer's real config. This
//! guard owns a temporary XDG tree, exposes the [`ConfigDirs`] the CLI will
//! resolve inside it, and hands out the environment to pass to the child.

use std::fs;
use std::path::PathBuf;

use apppass_core::{ConfigDirs, Settings, Site, SiteRegistry};
use tempfile::TempDir;

use crate::env::EnvTestGuard;

/// A temporary XDG tree for one CLI test
pub struct ConfigDirsTestGuard {
  temp_dir: TempDir,
  /// The directories apppass resolves under the temporary XDG tree
  pub config_dirs: ConfigDirs,
}

impl ConfigDirsTestGuard {
  /// The application directory name `directories` derives on Linux
  pub const APPLICATION: &'static str = "apppass";

  /// Create an empty temporary tree
  pub fn new() -> anyhow::Result<Self> {
    let temp_dir = TempDir::new()?;
    let config_dirs = ConfigDirs {
      config_dir: temp_dir.path().join("config").join(Self::APPLICATION),
      data_dir: temp_dir.path().join("data").join(Self::APPLICATION),
    };
    config_dirs.init()?;

    Ok(Self { temp_dir, config_dirs })
  }

  /// Environment to apply to a spawned command so it resolves into this tree
  pub fn envs(&self) -> Vec<(&'static str, PathBuf)> {
    vec![
      (EnvTestGuard::XDG_CONFIG_HOME, self.temp_dir.path().join("config")),
      (EnvTestGuard::XDG_DATA_HOME, self.temp_dir.path().join("data")),
    ]
  }

  /// Write `config.toml`
  pub fn write_settings(&self, settings: &Settings) -> anyhow::Result<()> {
    self.config_dirs.save_settings(settings)
  }

  /// Register sites in `sites.json`
  pub fn register_sites(&self, sites: &[Site]) -> anyhow::Result<()> {
    let mut registry = SiteRegistry::load(&self.config_dirs)?;
    for site in sites {
      registry.add(site.clone());
    }
    registry.save(&self.config_dirs)
  }

  /// Raw contents of the credential store, or `None` before the first write
  pub fn credentials_json(&self) -> anyhow::Result<Option<String>> {
    let path = self.config_dirs.credentials_path();
    if !path.exists() {
      return Ok(None);
    }
    Ok(Some(fs::read_to_string(path)?))
  }
}
