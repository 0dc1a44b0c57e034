//! # Application Password Manager
//!
//! Owns the lifecycle of one application password per site: hands out the
//! stored record when there is one, mints a new one through the site's
//! adapter when there is not, recovers from name collisions left behind by
//! a lost record, and forgets a record the server has revoked.
//!
//! At most one creation is in flight per site. Callers that miss the store
//! while it runs join it and receive its outcome, whatever that outcome is.
//! Every read-modify-write of a site's record happens under that site's
//! lock, so a stale invalidation can never delete a freshly minted password.

use std::collections::HashMap;
use std::sync::Arc;

use apppass_core::{
  ApplicationPasswordCredentials, ApplicationPasswordsConfiguration, ConfigurationError, CredentialStore, Site, SiteKey,
};
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, watch};
use tracing::{debug, info, warn};

use crate::adapter::{DeleteTarget, SiteAdapters, SiteOriginAdapter};
use crate::error::WpApiError;

/// Outcome of [`ApplicationPasswordsManager::get_application_credentials`].
#[derive(Debug, Clone)]
pub enum CreationResult {
  /// A stored record was returned without minting.
  Existing(ApplicationPasswordCredentials),
  /// A new password was minted and persisted by this call.
  Created(ApplicationPasswordCredentials),
  /// The site does not offer application passwords. Do not retry.
  NotSupported(WpApiError),
  /// Creation failed for a reason presumed transient.
  Failure(WpApiError),
}

/// Outcome of [`ApplicationPasswordsManager::delete_application_credentials`].
#[derive(Debug)]
pub enum DeletionResult {
  Success,
  Failure(WpApiError),
}

type Flight = watch::Receiver<Option<CreationResult>>;

/// Shared handle to the credential lifecycle. Clones share state.
#[derive(Clone)]
pub struct ApplicationPasswordsManager {
  inner: Arc<ManagerInner>,
}

struct ManagerInner {
  store: Arc<dyn CredentialStore>,
  adapters: SiteAdapters,
  application_name: String,
  site_locks: Mutex<HashMap<SiteKey, Arc<AsyncMutex<()>>>>,
  in_flight: Mutex<HashMap<SiteKey, Flight>>,
}

impl ApplicationPasswordsManager {
  /// Create a manager. Fails when no application name is configured.
  pub fn new(
    store: Arc<dyn CredentialStore>,
    adapters: SiteAdapters,
    configuration: &ApplicationPasswordsConfiguration,
  ) -> Result<Self, ConfigurationError> {
    let application_name = configuration.application_name()?.to_string();

    Ok(Self {
      inner: Arc::new(ManagerInner {
        store,
        adapters,
        application_name,
        site_locks: Mutex::new(HashMap::new()),
        in_flight: Mutex::new(HashMap::new()),
      }),
    })
  }

  /// The label passwords are created under
  pub fn application_name(&self) -> &str {
    &self.inner.application_name
  }

  /// Return usable credentials for `site`, minting them if needed.
  ///
  /// Only the caller that started a creation sees `Created`; callers that
  /// joined it see the same password as `Existing`, or the same failure.
  pub async fn get_application_credentials(&self, site: &Site) -> CreationResult {
    match self.inner.load(site) {
      Ok(Some(credentials)) => return CreationResult::Existing(credentials),
      Ok(None) => {}
      Err(error) => return CreationResult::Failure(error),
    }

    let (mut flight, started) = self.inner.join_or_start_creation(site);
    let outcome = match flight.wait_for(Option::is_some).await {
      Ok(outcome) => outcome.clone(),
      Err(_) => None,
    };

    match outcome {
      Some(CreationResult::Created(credentials)) if !started => CreationResult::Existing(credentials),
      Some(result) => result,
      None => CreationResult::Failure(WpApiError::Interrupted(
        "creation task ended without a result".to_string(),
      )),
    }
  }

  /// Revoke the site's password on the server and forget it locally.
  pub async fn delete_application_credentials(&self, site: &Site) -> DeletionResult {
    let _guard = self.inner.lock_site(site.key()).await;

    let stored = match self.inner.load(site) {
      Ok(stored) => stored,
      Err(error) => return DeletionResult::Failure(error),
    };

    let adapter = self.inner.adapters.for_site(site);
    let outcome = match stored {
      Some(credentials) => adapter.delete(site, &DeleteTarget::Credentials(credentials)).await,
      None => {
        debug!(site = %site.key(), "No local record, looking up the remote password");
        match adapter
          .fetch_application_password_uuid(site, &self.inner.application_name)
          .await
        {
          Ok(uuid) => adapter.delete(site, &DeleteTarget::Uuid(uuid)).await,
          Err(error) => Err(error),
        }
      }
    };

    match outcome.and_then(|()| self.inner.store.delete(site).map_err(WpApiError::storage)) {
      Ok(()) => {
        info!(site = %site.key(), "Deleted application password");
        DeletionResult::Success
      }
      Err(error) => {
        warn!(site = %site.key(), %error, "Failed to delete application password");
        DeletionResult::Failure(error)
      }
    }
  }

  /// Forget the stored record without contacting the server.
  pub async fn delete_local_application_password(&self, site: &Site) -> Result<(), WpApiError> {
    let _guard = self.inner.lock_site(site.key()).await;

    self.inner.store.delete(site).map_err(WpApiError::storage)?;
    debug!(site = %site.key(), "Forgot local application password");
    Ok(())
  }

  /// Forget `rejected` after the server refused it.
  ///
  /// Only deletes the stored record if it is still `rejected`; another
  /// request may already have replaced it. Returns whether a record was
  /// deleted.
  pub async fn invalidate_credentials(
    &self,
    site: &Site,
    rejected: &ApplicationPasswordCredentials,
  ) -> Result<bool, WpApiError> {
    let _guard = self.inner.lock_site(site.key()).await;

    if self.inner.load(site)?.as_ref() != Some(rejected) {
      debug!(site = %site.key(), "Rejected password was already replaced");
      return Ok(false);
    }

    self.inner.store.delete(site).map_err(WpApiError::storage)?;
    info!(site = %site.key(), "Forgot application password rejected by the server");
    Ok(true)
  }
}

/// Exclusive access to one site's record. The lock entry is dropped from the
/// map once nobody else holds or waits on it.
struct SiteGuard<'a> {
  inner: &'a ManagerInner,
  key: SiteKey,
  guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SiteGuard<'_> {
  fn drop(&mut self) {
    drop(self.guard.take());
    let mut locks = self.inner.site_locks.lock();
    if locks.get(&self.key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
      locks.remove(&self.key);
    }
  }
}

/// Removes a finished creation from the in-flight map, panics included.
struct FlightEntry {
  inner: Arc<ManagerInner>,
  key: SiteKey,
}

impl Drop for FlightEntry {
  fn drop(&mut self) {
    self.inner.in_flight.lock().remove(&self.key);
  }
}

impl ManagerInner {
  fn load(&self, site: &Site) -> Result<Option<ApplicationPasswordCredentials>, WpApiError> {
    self.store.get(site).map_err(WpApiError::storage)
  }

  async fn lock_site(&self, key: &SiteKey) -> SiteGuard<'_> {
    let lock = Arc::clone(self.site_locks.lock().entry(key.clone()).or_default());
    let guard = lock.lock_owned().await;
    SiteGuard {
      inner: self,
      key: key.clone(),
      guard: Some(guard),
    }
  }

  /// Join the site's pending creation, or start one. Returns whether this
  /// call started it.
  ///
  /// The creation runs detached so that callers giving up mid-flight still
  /// let it finish, persist its result and release the site lock.
  fn join_or_start_creation(self: &Arc<Self>, site: &Site) -> (Flight, bool) {
    let mut in_flight = self.in_flight.lock();
    if let Some(pending) = in_flight.get(site.key()) {
      debug!(site = %site.key(), "Joining pending application password creation");
      return (pending.clone(), false);
    }

    let (sender, receiver) = watch::channel(None);
    in_flight.insert(site.key().clone(), receiver.clone());
    drop(in_flight);

    let entry = FlightEntry {
      inner: Arc::clone(self),
      key: site.key().clone(),
    };
    let site = site.clone();
    tokio::spawn(async move {
      let result = entry.inner.create_once(&site).await;
      // Publish before leaving the map: anyone who joined sees this result.
      sender.send_replace(Some(result));
      drop(entry);
    });

    (receiver, true)
  }

  async fn create_once(&self, site: &Site) -> CreationResult {
    let _guard = self.lock_site(site.key()).await;

    // A previous creation may have finished between our miss and now.
    match self.load(site) {
      Ok(Some(credentials)) => return CreationResult::Existing(credentials),
      Ok(None) => {}
      Err(error) => return CreationResult::Failure(error),
    }

    let adapter = self.adapters.for_site(site);
    debug!(site = %site.key(), origin = site.origin.label(), "Creating application password");

    let credentials = match adapter.create(site, &self.application_name).await {
      Ok(credentials) => credentials,
      Err(error) if error.is_feature_unavailable() => {
        warn!(site = %site.key(), %error, "Application passwords are not supported");
        return CreationResult::NotSupported(error);
      }
      Err(error) if error.is_conflict() => {
        info!(site = %site.key(), "Application password name already taken, replacing it");
        match self.replace_conflicting(adapter.as_ref(), site).await {
          Ok(credentials) => credentials,
          Err(error) => {
            warn!(site = %site.key(), %error, "Failed to replace conflicting application password");
            return CreationResult::Failure(error);
          }
        }
      }
      Err(error) => {
        warn!(site = %site.key(), %error, "Failed to create application password");
        return CreationResult::Failure(error);
      }
    };

    if let Err(error) = self.store.save(site, &credentials) {
      return CreationResult::Failure(WpApiError::storage(error));
    }

    info!(site = %site.key(), "Created application password");
    CreationResult::Created(credentials)
  }

  /// Delete the same-named password on the server and create once more.
  async fn replace_conflicting(
    &self,
    adapter: &dyn SiteOriginAdapter,
    site: &Site,
  ) -> Result<ApplicationPasswordCredentials, WpApiError> {
    let uuid = adapter
      .fetch_application_password_uuid(site, &self.application_name)
      .await?;
    adapter.delete(site, &DeleteTarget::Uuid(uuid)).await?;
    adapter.create(site, &self.application_name).await
  }
}
