//! # Site Origin Adapters
//!
//! One adapter per [`SiteOrigin`]. Each knows how to reach the
//! application-password endpoints of a site of its kind: self-hosted sites
//! are called directly with the account's primary login, Jetpack sites are
//! called through the WordPress.com proxy with a bearer token.

mod jetpack;
mod self_hosted;

use std::sync::Arc;

use apppass_core::{ApplicationPasswordCredentials, Site, SiteOrigin};
use async_trait::async_trait;

use crate::error::WpApiError;
use crate::models::ApplicationPasswordItem;

pub use jetpack::JetpackAdapter;
pub use self_hosted::SelfHostedAdapter;

/// What to delete on the remote site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
  /// A password identified by its UUID, deleted with the site's own access.
  Uuid(String),
  /// The password described by a local record.
  Credentials(ApplicationPasswordCredentials),
}

/// Remote operations on a site's application passwords.
#[async_trait]
pub trait SiteOriginAdapter: Send + Sync {
  /// Mint a new password named `application_name`.
  async fn create(&self, site: &Site, application_name: &str)
  -> Result<ApplicationPasswordCredentials, WpApiError>;

  /// Revoke a password on the site.
  async fn delete(&self, site: &Site, target: &DeleteTarget) -> Result<(), WpApiError>;

  /// Look up the UUID of the password named `application_name`.
  async fn fetch_application_password_uuid(&self, site: &Site, application_name: &str) -> Result<String, WpApiError>;
}

/// The pair of adapters, selected by site origin.
#[derive(Clone)]
pub struct SiteAdapters {
  jetpack: Arc<dyn SiteOriginAdapter>,
  self_hosted: Arc<dyn SiteOriginAdapter>,
}

impl SiteAdapters {
  pub fn new(jetpack: Arc<dyn SiteOriginAdapter>, self_hosted: Arc<dyn SiteOriginAdapter>) -> Self {
    Self { jetpack, self_hosted }
  }

  /// The adapter that serves `site`.
  pub fn for_site(&self, site: &Site) -> &Arc<dyn SiteOriginAdapter> {
    match site.origin {
      SiteOrigin::JetpackConnected { .. } => &self.jetpack,
      SiteOrigin::SelfHosted { .. } => &self.self_hosted,
    }
  }
}

/// Pick the password named `application_name` out of a listing.
fn find_uuid(items: Vec<ApplicationPasswordItem>, site: &Site, application_name: &str) -> Result<String, WpApiError> {
  items
    .into_iter()
    .find(|item| item.name == application_name)
    .map(|item| item.uuid)
    .ok_or_else(|| {
      WpApiError::NotFound(format!(
        "no application password named '{application_name}' on {}",
        site.url()
      ))
    })
}

fn confirm_deleted(deleted: bool, site: &Site) -> Result<(), WpApiError> {
  if deleted {
    Ok(())
  } else {
    Err(WpApiError::UnexpectedResponse(format!(
      "{} did not confirm the deletion",
      site.url()
    )))
  }
}

fn wrong_origin(adapter: &'static str, site: &Site) -> WpApiError {
  WpApiError::WrongOrigin {
    adapter,
    origin: site.origin.label(),
    site: site.url().to_string(),
  }
}
