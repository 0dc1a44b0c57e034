//! # Configuration Management
//!
//! Handles application configuration, directory management, and settings
//! for apppass, including XDG base directory support.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding the WordPress.com bearer token.
pub const ENV_WPCOM_TOKEN: &str = "APPPASS_WPCOM_TOKEN";

/// Environment variable overriding the application name.
pub const ENV_APPLICATION_NAME: &str = "APPPASS_APPLICATION_NAME";

/// Default WordPress.com REST API host.
pub const DEFAULT_WPCOM_API_BASE: &str = "https://public-api.wordpress.com";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Represents the configuration directories for the apppass application
#[derive(Debug, Clone)]
pub struct ConfigDirs {
  pub config_dir: PathBuf,
  pub data_dir: PathBuf,
}

impl ConfigDirs {
  /// Create a new ConfigDirs instance
  pub fn new() -> Result<Self> {
    let proj_dirs =
      ProjectDirs::from("eddieland", "", "apppass").context("Failed to determine project directories")?;

    Ok(Self {
      config_dir: proj_dirs.config_dir().to_path_buf(),
      data_dir: proj_dirs.data_dir().to_path_buf(),
    })
  }

  /// Place both directories under an explicit root. Used by tests and by
  /// callers that embed apppass in another tool's state directory.
  pub fn rooted_at<P: AsRef<Path>>(root: P) -> Self {
    let root = root.as_ref();
    Self {
      config_dir: root.join("config"),
      data_dir: root.join("data"),
    }
  }

  /// Get the config directory
  pub fn config_dir(&self) -> &PathBuf {
    &self.config_dir
  }

  /// Get the data directory
  pub fn data_dir(&self) -> &PathBuf {
    &self.data_dir
  }

  /// Initialize the configuration directories
  pub fn init(&self) -> Result<()> {
    fs::create_dir_all(&self.config_dir).context("Failed to create config directory")?;
    fs::create_dir_all(&self.data_dir).context("Failed to create data directory")?;
    Ok(())
  }

  /// Get the path to the settings file
  pub fn settings_path(&self) -> PathBuf {
    self.config_dir.join("config.toml")
  }

  /// Get the path to the site registry
  pub fn sites_path(&self) -> PathBuf {
    self.data_dir.join("sites.json")
  }

  /// Get the path to the credential store
  pub fn credentials_path(&self) -> PathBuf {
    self.data_dir.join("credentials.json")
  }

  /// Load settings from file or return defaults, then apply environment
  /// overrides.
  pub fn load_settings(&self) -> Result<Settings> {
    let settings_path = self.settings_path();

    let mut settings = if settings_path.exists() {
      let content = fs::read_to_string(&settings_path)
        .with_context(|| format!("Failed to read settings from {}", settings_path.display()))?;

      toml::from_str::<Settings>(&content)
        .with_context(|| format!("Failed to parse settings from {}", settings_path.display()))?
    } else {
      Settings::default()
    };

    settings.apply_env_overrides();
    Ok(settings)
  }

  /// Save settings to file
  pub fn save_settings(&self, settings: &Settings) -> Result<()> {
    let settings_path = self.settings_path();

    if let Some(parent) = settings_path.parent() {
      fs::create_dir_all(parent).with_context(|| format!("Failed to create config directory {}", parent.display()))?;
    }

    let content = toml::to_string_pretty(settings).context("Failed to serialize settings to TOML")?;

    fs::write(&settings_path, content)
      .with_context(|| format!("Failed to write settings to {}", settings_path.display()))?;

    Ok(())
  }
}

/// Get the configuration directories
pub fn get_config_dirs() -> Result<ConfigDirs> {
  ConfigDirs::new()
}

/// User settings, stored as `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Label under which application passwords are created on each site.
  pub application_name: Option<String>,
  /// WordPress.com REST API host used for Jetpack-connected sites.
  pub wpcom_api_base: String,
  /// WordPress.com OAuth bearer token used for Jetpack-connected sites.
  pub wpcom_token: Option<String>,
  /// Per-request timeout, in seconds.
  pub request_timeout_secs: u64,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      application_name: None,
      wpcom_api_base: DEFAULT_WPCOM_API_BASE.to_string(),
      wpcom_token: None,
      request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
    }
  }
}

impl Settings {
  fn apply_env_overrides(&mut self) {
    if let Some(token) = non_empty_env(ENV_WPCOM_TOKEN) {
      self.wpcom_token = Some(token);
    }
    if let Some(name) = non_empty_env(ENV_APPLICATION_NAME) {
      self.application_name = Some(name);
    }
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs)
  }

  /// The slice of settings the credential manager needs.
  pub fn passwords_configuration(&self) -> ApplicationPasswordsConfiguration {
    ApplicationPasswordsConfiguration::new(self.application_name.clone())
  }
}

fn non_empty_env(name: &str) -> Option<String> {
  std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Errors raised while wiring the credential manager.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
  #[error("no application name configured; set `application_name` in config.toml or {ENV_APPLICATION_NAME}")]
  MissingApplicationName,
}

/// Read-only configuration for application-password creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationPasswordsConfiguration {
  application_name: Option<String>,
}

impl ApplicationPasswordsConfiguration {
  pub fn new(application_name: Option<String>) -> Self {
    Self {
      application_name: application_name.filter(|name| !name.trim().is_empty()),
    }
  }

  /// The label passwords are created under.
  pub fn application_name(&self) -> Result<&str, ConfigurationError> {
    self
      .application_name
      .as_deref()
      .ok_or(ConfigurationError::MissingApplicationName)
  }
}
