//! In-process credential store.

use std::collections::HashMap;

use anyhow::Result;
use parking_lot::RwLock;

use super::{ApplicationPasswordCredentials, CredentialStore};
use crate::site::{Site, SiteKey};

/// Credential store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
  records: RwLock<HashMap<SiteKey, ApplicationPasswordCredentials>>,
}

impl InMemoryCredentialStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.records.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.read().is_empty()
  }
}

impl CredentialStore for InMemoryCredentialStore {
  fn get(&self, site: &Site) -> Result<Option<ApplicationPasswordCredentials>> {
    Ok(self.records.read().get(site.key()).cloned())
  }

  fn save(&self, site: &Site, credentials: &ApplicationPasswordCredentials) -> Result<()> {
    self.records.write().insert(site.key().clone(), credentials.clone());
    Ok(())
  }

  fn delete(&self, site: &Site) -> Result<()> {
    self.records.write().remove(site.key());
    Ok(())
  }
}
