//! File-backed credential store.
//!
//! Records live in a single JSON object keyed by normalized site URL. The
//! file holds secrets, so it is created with owner-only permissions on Unix
//! and rewritten in place on every change.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tracing::debug;

use super::{ApplicationPasswordCredentials, CredentialStore};
use crate::config::ConfigDirs;
use crate::site::{Site, SiteKey};

type Records = BTreeMap<SiteKey, ApplicationPasswordCredentials>;

/// Write `content` to `path`, restricting permissions to the owner on Unix.
pub(crate) fn write_private(path: &Path, content: &str) -> Result<()> {
  let mut options = fs::OpenOptions::new();
  options.write(true).create(true).truncate(true);

  #[cfg(unix)]
  {
    use std::os::unix::fs::OpenOptionsExt;
    options.mode(0o600);
  }

  let mut file = options.open(path)?;
  file.write_all(content.as_bytes())?;

  #[cfg(unix)]
  {
    // `mode` only applies on creation; tighten files that predate us.
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
  }

  Ok(())
}

/// Credential store persisted as `credentials.json` in the data directory.
#[derive(Debug)]
pub struct FileCredentialStore {
  path: PathBuf,
  lock: Mutex<()>,
}

impl FileCredentialStore {
  /// Open the store at an explicit path. The file is created lazily.
  pub fn new<P: Into<PathBuf>>(path: P) -> Self {
    Self {
      path: path.into(),
      lock: Mutex::new(()),
    }
  }

  /// Open the store in the standard data directory
  pub fn from_config_dirs(config_dirs: &ConfigDirs) -> Self {
    Self::new(config_dirs.credentials_path())
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// List every stored record.
  pub fn list(&self) -> Result<Vec<(SiteKey, ApplicationPasswordCredentials)>> {
    let _guard = self.lock.lock();
    Ok(self.read_records()?.into_iter().collect())
  }

  /// Remove every record, returning how many were removed.
  pub fn clear(&self) -> Result<usize> {
    let _guard = self.lock.lock();
    let records = self.read_records()?;
    let removed = records.len();
    if removed > 0 {
      self.write_records(&Records::new())?;
    }
    debug!(removed, path = %self.path.display(), "Cleared credential store");
    Ok(removed)
  }

  fn read_records(&self) -> Result<Records> {
    if !self.path.exists() {
      return Ok(Records::new());
    }

    let content = fs::read_to_string(&self.path)
      .with_context(|| format!("Failed to read credential store {}", self.path.display()))?;
    if content.trim().is_empty() {
      return Ok(Records::new());
    }

    serde_json::from_str(&content)
      .with_context(|| format!("Failed to parse credential store {}", self.path.display()))
  }

  fn write_records(&self, records: &Records) -> Result<()> {
    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent).with_context(|| format!("Failed to create data directory {}", parent.display()))?;
    }

    let content = serde_json::to_string_pretty(records).context("Failed to serialize credential store")?;
    write_private(&self.path, &content)
      .with_context(|| format!("Failed to write credential store {}", self.path.display()))
  }
}

impl CredentialStore for FileCredentialStore {
  fn get(&self, site: &Site) -> Result<Option<ApplicationPasswordCredentials>> {
    let _guard = self.lock.lock();
    Ok(self.read_records()?.remove(site.key()))
  }

  fn save(&self, site: &Site, credentials: &ApplicationPasswordCredentials) -> Result<()> {
    let _guard = self.lock.lock();
    let mut records = self.read_records()?;
    records.insert(site.key().clone(), credentials.clone());
    self.write_records(&records)
  }

  fn delete(&self, site: &Site) -> Result<()> {
    let _guard = self.lock.lock();
    let mut records = self.read_records()?;
    if records.remove(site.key()).is_some() {
      self.write_records(&records)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  fn credentials(password: &str) -> ApplicationPasswordCredentials {
    ApplicationPasswordCredentials::new("admin", password, Some(format!("uuid-{password}")))
  }

  #[test]
  fn test_missing_file_is_empty_store() {
    let temp = TempDir::new().unwrap();
    let store = FileCredentialStore::new(temp.path().join("credentials.json"));
    let site = Site::jetpack("example.com", 1).unwrap();

    assert!(store.get(&site).unwrap().is_none());
    assert!(store.list().unwrap().is_empty());
    store.delete(&site).unwrap();
    assert!(!store.path().exists());
  }

  #[test]
  fn test_records_survive_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested/credentials.json");
    let site = Site::self_hosted("blog.test", "admin", "secret").unwrap();

    FileCredentialStore::new(&path).save(&site, &credentials("one")).unwrap();

    let reopened = FileCredentialStore::new(&path);
    assert_eq!(reopened.get(&site).unwrap(), Some(credentials("one")));
  }

  #[test]
  fn test_one_record_per_site() {
    let temp = TempDir::new().unwrap();
    let store = FileCredentialStore::new(temp.path().join("credentials.json"));
    let site = Site::jetpack("example.com", 1).unwrap();
    let other = Site::jetpack("other.example.com", 2).unwrap();

    store.save(&site, &credentials("one")).unwrap();
    store.save(&site, &credentials("two")).unwrap();
    store.save(&other, &credentials("three")).unwrap();

    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(store.get(&site).unwrap().unwrap().password, "two");

    store.delete(&site).unwrap();
    assert!(store.get(&site).unwrap().is_none());
    assert!(store.get(&other).unwrap().is_some());
  }

  #[test]
  fn test_clear_reports_removed_count() {
    let temp = TempDir::new().unwrap();
    let store = FileCredentialStore::new(temp.path().join("credentials.json"));

    store
      .save(&Site::jetpack("a.example.com", 1).unwrap(), &credentials("a"))
      .unwrap();
    store
      .save(&Site::jetpack("b.example.com", 2).unwrap(), &credentials("b"))
      .unwrap();

    assert_eq!(store.clear().unwrap(), 2);
    assert_eq!(store.clear().unwrap(), 0);
    assert!(store.list().unwrap().is_empty());
  }

  #[test]
  fn test_corrupt_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("credentials.json");
    fs::write(&path, "{not json").unwrap();

    let store = FileCredentialStore::new(&path);
    let error = store.get(&Site::jetpack("example.com", 1).unwrap()).unwrap_err();
    assert!(error.to_string().contains("Failed to parse credential store"));
  }

  #[cfg(unix)]
  #[test]
  fn test_file_permissions_are_private() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let path = temp.path().join("credentials.json");
    fs::write(&path, "{}").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

    let store = FileCredentialStore::new(&path);
    store
      .save(&Site::jetpack("example.com", 1).unwrap(), &credentials("one"))
      .unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
  }
}
