//! # Sites
//!
//! A [`Site`] is one WordPress installation the workspace authenticates
//! against. Its [`SiteOrigin`] decides how application passwords are minted:
//! Jetpack-connected sites go through the WordPress.com proxy, self-hosted
//! sites are addressed directly with the user's primary login.

use std::fmt;
use std::fs;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::ConfigDirs;
use crate::url::normalize_site_url;

/// How a site is connected, with the fields each connection kind needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SiteOrigin {
  /// Connected to WordPress.com through Jetpack; `site_id` is the
  /// WordPress.com blog id used to address the proxy.
  JetpackConnected { site_id: u64 },
  /// Reached directly with the account's primary credentials.
  SelfHosted { username: String, password: String },
}

impl SiteOrigin {
  /// Short label used in logs and CLI output
  pub fn label(&self) -> &'static str {
    match self {
      SiteOrigin::JetpackConnected { .. } => "jetpack",
      SiteOrigin::SelfHosted { .. } => "self-hosted",
    }
  }
}

/// Canonical identity of a site: its normalized URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteKey(String);

impl SiteKey {
  /// Build a key from any user-supplied address
  pub fn parse(url: &str) -> Result<Self> {
    Ok(Self(normalize_site_url(url)?))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for SiteKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// A WordPress installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
  key: SiteKey,
  pub origin: SiteOrigin,
}

impl Site {
  /// Create a site, normalizing its URL.
  pub fn new(url: &str, origin: SiteOrigin) -> Result<Self> {
    Ok(Self {
      key: SiteKey::parse(url)?,
      origin,
    })
  }

  /// Shorthand for a self-hosted site
  pub fn self_hosted(url: &str, username: &str, password: &str) -> Result<Self> {
    Self::new(
      url,
      SiteOrigin::SelfHosted {
        username: username.to_string(),
        password: password.to_string(),
      },
    )
  }

  /// Shorthand for a Jetpack-connected site
  pub fn jetpack(url: &str, site_id: u64) -> Result<Self> {
    Self::new(url, SiteOrigin::JetpackConnected { site_id })
  }

  pub fn key(&self) -> &SiteKey {
    &self.key
  }

  /// The normalized site URL, without trailing slash.
  pub fn url(&self) -> &str {
    self.key.as_str()
  }

  pub fn is_jetpack(&self) -> bool {
    matches!(self.origin, SiteOrigin::JetpackConnected { .. })
  }
}

/// The list of sites known to the CLI, persisted as `sites.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SiteRegistry {
  sites: Vec<Site>,
}

impl SiteRegistry {
  /// Load the registry from disk
  pub fn load(config_dirs: &ConfigDirs) -> Result<Self> {
    let registry_path = config_dirs.sites_path();

    if !registry_path.exists() {
      return Ok(Self::default());
    }

    let content = fs::read_to_string(&registry_path)
      .with_context(|| format!("Failed to read site registry {}", registry_path.display()))?;

    let sites = serde_json::from_str(&content).context("Failed to parse site registry")?;

    Ok(Self { sites })
  }

  /// Save the registry to disk
  pub fn save(&self, config_dirs: &ConfigDirs) -> Result<()> {
    let registry_path = config_dirs.sites_path();
    if let Some(parent) = registry_path.parent() {
      fs::create_dir_all(parent).with_context(|| format!("Failed to create data directory {}", parent.display()))?;
    }

    let content = serde_json::to_string_pretty(&self.sites).context("Failed to serialize site registry")?;
    crate::creds::file::write_private(&registry_path, &content)
      .with_context(|| format!("Failed to write site registry {}", registry_path.display()))?;

    Ok(())
  }

  /// Add a site, replacing any existing entry with the same key.
  pub fn add(&mut self, site: Site) {
    if let Some(existing) = self.sites.iter_mut().find(|s| s.key == site.key) {
      *existing = site;
    } else {
      self.sites.push(site);
    }
  }

  /// Remove a site. Returns `false` when it was not registered.
  pub fn remove(&mut self, url: &str) -> Result<bool> {
    let key = SiteKey::parse(url)?;
    let before = self.sites.len();
    self.sites.retain(|s| s.key != key);
    Ok(self.sites.len() != before)
  }

  /// Look up a site by any form of its URL.
  pub fn find(&self, url: &str) -> Result<Option<&Site>> {
    let key = SiteKey::parse(url)?;
    Ok(self.sites.iter().find(|s| s.key == key))
  }

  pub fn sites(&self) -> &[Site] {
    &self.sites
  }
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  #[test]
  fn test_site_key_is_normalized() {
    let site = Site::jetpack("Example.com/", 42).unwrap();
    assert_eq!(site.url(), "https://example.com");
    assert_eq!(site.key(), &SiteKey::parse("https://example.com").unwrap());
    assert!(site.is_jetpack());
  }

  #[test]
  fn test_site_origin_serialization() {
    let site = Site::self_hosted("http://blog.test", "admin", "secret").unwrap();
    let json = serde_json::to_value(&site).unwrap();

    assert_eq!(json["key"], "http://blog.test");
    assert_eq!(json["origin"]["kind"], "self_hosted");
    assert_eq!(json["origin"]["username"], "admin");

    let parsed: Site = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, site);
  }

  #[test]
  fn test_registry_add_replaces_same_site() {
    let mut registry = SiteRegistry::default();
    registry.add(Site::jetpack("example.com", 1).unwrap());
    registry.add(Site::jetpack("https://example.com/", 2).unwrap());

    assert_eq!(registry.sites().len(), 1);
    assert_eq!(
      registry.sites()[0].origin,
      SiteOrigin::JetpackConnected { site_id: 2 }
    );
  }

  #[test]
  fn test_registry_round_trip_and_remove() {
    let temp = TempDir::new().unwrap();
    let config_dirs = ConfigDirs::rooted_at(temp.path());

    let mut registry = SiteRegistry::load(&config_dirs).unwrap();
    assert!(registry.sites().is_empty());

    registry.add(Site::self_hosted("blog.test", "admin", "secret").unwrap());
    registry.save(&config_dirs).unwrap();

    let mut reloaded = SiteRegistry::load(&config_dirs).unwrap();
    assert!(reloaded.find("https://blog.test/").unwrap().is_some());

    assert!(reloaded.remove("blog.test").unwrap());
    assert!(!reloaded.remove("blog.test").unwrap());
    assert!(reloaded.find("blog.test").unwrap().is_none());
  }
}
