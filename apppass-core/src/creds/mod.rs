//! # Credential Management
//!
//! Storage of application-password credentials, one record per site.
//!
//! The record for a site is the credential most recently believed valid by
//! this process. It may lag the server (a password can be revoked remotely at
//! any time); callers correct that by deleting the local record and minting a
//! new one.

pub mod file;
pub mod memory;

use anyhow::Result;
pub use file::FileCredentialStore;
pub use memory::InMemoryCredentialStore;
use serde::{Deserialize, Serialize};

use crate::site::Site;

/// An application password issued for one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationPasswordCredentials {
  /// The WordPress login the password belongs to.
  pub user_name: String,
  pub password: String,
  /// Server-side identifier of this password, needed to delete it. Absent for
  /// passwords obtained through the browser authorization flow.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub uuid: Option<String>,
}

impl ApplicationPasswordCredentials {
  pub fn new(user_name: impl Into<String>, password: impl Into<String>, uuid: Option<String>) -> Self {
    Self {
      user_name: user_name.into(),
      password: password.into(),
      uuid,
    }
  }
}

/// Persists at most one credential record per site.
///
/// Implementations must be safe to share between concurrent requests; the
/// credential manager sequences the read/delete/save steps for a given site.
pub trait CredentialStore: Send + Sync {
  /// Retrieve the stored credentials for a site, if any
  fn get(&self, site: &Site) -> Result<Option<ApplicationPasswordCredentials>>;

  /// Store credentials for a site, replacing any existing record
  fn save(&self, site: &Site, credentials: &ApplicationPasswordCredentials) -> Result<()>;

  /// Remove the record for a site. Removing a missing record is not an error.
  fn delete(&self, site: &Site) -> Result<()>;
}
