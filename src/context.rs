//! # Command Context
//!
//! Wires configuration, the site registry, the credential store and the
//! HTTP stack together for the command handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use apppass_core::{ConfigDirs, CredentialStore, FileCredentialStore, Settings, Site, SiteRegistry, get_config_dirs};
use apppass_wp::{
  ApplicationPasswordsListener, ApplicationPasswordsManager, AuthenticatedTransport, JetpackAdapter, SelfHostedAdapter,
  SiteAdapters, WpApiError, build_http_client,
};
use reqwest::Client;
use tracing::{info, warn};

use crate::utils::output::format_command;

/// Reports credential lifecycle events through tracing.
struct LoggingListener;

impl ApplicationPasswordsListener for LoggingListener {
  fn on_feature_unavailable(&self, site: &Site, error: &WpApiError) {
    warn!(site = %site.key(), %error, "Application passwords are not available on this site");
  }

  fn on_new_password_created(&self, is_password_regenerated: bool) {
    if is_password_regenerated {
      info!("Replaced an application password the server had revoked");
    } else {
      info!("Created a new application password");
    }
  }
}

/// Everything a command needs, loaded from the user's config directories.
pub struct AppContext {
  pub config_dirs: ConfigDirs,
  pub settings: Settings,
  pub store: Arc<FileCredentialStore>,
  pub client: Client,
}

impl AppContext {
  pub fn load() -> Result<Self> {
    let config_dirs = get_config_dirs()?;
    let settings = config_dirs.load_settings()?;
    let store = Arc::new(FileCredentialStore::from_config_dirs(&config_dirs));
    let client = build_http_client(settings.request_timeout()).context("Failed to build HTTP client")?;

    Ok(Self {
      config_dirs,
      settings,
      store,
      client,
    })
  }

  pub fn registry(&self) -> Result<SiteRegistry> {
    SiteRegistry::load(&self.config_dirs)
  }

  /// Look up a registered site by any spelling of its URL.
  pub fn find_site(&self, url: &str) -> Result<Site> {
    let registry = self.registry()?;
    match registry.find(url)? {
      Some(site) => Ok(site.clone()),
      None => Err(anyhow::anyhow!(
        "Site {url} is not registered. Add it with {}",
        format_command("apppass site add")
      )),
    }
  }

  pub fn manager(&self) -> Result<ApplicationPasswordsManager> {
    let adapters = SiteAdapters::new(
      Arc::new(JetpackAdapter::new(
        self.client.clone(),
        self.settings.wpcom_api_base.clone(),
        self.settings.wpcom_token.clone(),
      )),
      Arc::new(SelfHostedAdapter::new(self.client.clone())),
    );
    let store: Arc<dyn CredentialStore> = self.store.clone();

    Ok(ApplicationPasswordsManager::new(
      store,
      adapters,
      &self.settings.passwords_configuration(),
    )?)
  }

  pub fn transport(&self) -> Result<AuthenticatedTransport> {
    Ok(AuthenticatedTransport::new(self.client.clone(), self.manager()?).with_listener(Arc::new(LoggingListener)))
  }
}
