//! Site and credential fixtures shared by the client crates' tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use apppass_core::{ApplicationPasswordCredentials, CredentialStore, InMemoryCredentialStore, Site};

/// A self-hosted site at `url` with login `username` / `password`
pub fn self_hosted_site(url: &str) -> Site {
  Site::self_hosted(url, "username", "password").expect("valid test site URL")
}

/// A Jetpack-connected site at `url`
pub fn jetpack_site(url: &str, site_id: u64) -> Site {
  Site::jetpack(url, site_id).expect("valid test site URL")
}

/// The credentials most tests expect to be minted
pub fn test_credentials() -> ApplicationPasswordCredentials {
  ApplicationPasswordCredentials::new("username", "password", Some("uuid".to_string()))
}

/// In-memory store that counts every call, so tests can assert how often
/// the credential manager touched storage.
#[derive(Debug, Default)]
pub struct CountingCredentialStore {
  inner: InMemoryCredentialStore,
  gets: AtomicUsize,
  saves: AtomicUsize,
  deletes: AtomicUsize,
}

impl CountingCredentialStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// A store that already holds `credentials` for `site`
  pub fn with_record(site: &Site, credentials: &ApplicationPasswordCredentials) -> Self {
    let store = Self::default();
    store
      .inner
      .save(site, credentials)
      .expect("in-memory save cannot fail");
    store
  }

  pub fn gets(&self) -> usize {
    self.gets.load(Ordering::SeqCst)
  }

  pub fn saves(&self) -> usize {
    self.saves.load(Ordering::SeqCst)
  }

  pub fn deletes(&self) -> usize {
    self.deletes.load(Ordering::SeqCst)
  }

  /// Peek at the stored record without counting the read
  pub fn current(&self, site: &Site) -> Option<ApplicationPasswordCredentials> {
    self.inner.get(site).ok().flatten()
  }
}

impl CredentialStore for CountingCredentialStore {
  fn get(&self, site: &Site) -> Result<Option<ApplicationPasswordCredentials>> {
    self.gets.fetch_add(1, Ordering::SeqCst);
    self.inner.get(site)
  }

  fn save(&self, site: &Site, credentials: &ApplicationPasswordCredentials) -> Result<()> {
    self.saves.fetch_add(1, Ordering::SeqCst);
    self.inner.save(site, credentials)
  }

  fn delete(&self, site: &Site) -> Result<()> {
    self.deletes.fetch_add(1, Ordering::SeqCst);
    self.inner.delete(site)
  }
}
