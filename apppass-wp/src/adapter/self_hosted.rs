//! Adapter for self-hosted sites, called directly with HTTP Basic auth.

use apppass_core::url::rest_url;
use apppass_core::{ApplicationPasswordCredentials, Site, SiteOrigin};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{DeleteTarget, SiteOriginAdapter, confirm_deleted, find_uuid, wrong_origin};
use crate::client::read_json;
use crate::consts::{APPLICATION_PASSWORDS_ROUTE, INTROSPECT_ROUTE};
use crate::error::WpApiError;
use crate::models::{
  ApplicationPasswordItem, CreateApplicationPassword, CreatedApplicationPassword, DeletedApplicationPassword,
};

/// Talks to `<site>/wp-json/wp/v2/users/me/application-passwords`.
#[derive(Debug, Clone)]
pub struct SelfHostedAdapter {
  client: Client,
}

impl SelfHostedAdapter {
  pub fn new(client: Client) -> Self {
    Self { client }
  }

  /// The account's primary login, which may manage every password.
  fn primary_login(site: &Site) -> Result<(&str, &str), WpApiError> {
    match &site.origin {
      SiteOrigin::SelfHosted { username, password } => Ok((username, password)),
      SiteOrigin::JetpackConnected { .. } => Err(wrong_origin("self-hosted", site)),
    }
  }

  /// Ask the site which password `credentials` is, authenticating with it.
  async fn introspect(&self, site: &Site, credentials: &ApplicationPasswordCredentials) -> Result<String, WpApiError> {
    let response = self
      .client
      .get(rest_url(site.url(), INTROSPECT_ROUTE))
      .basic_auth(&credentials.user_name, Some(&credentials.password))
      .send()
      .await?;

    let item: ApplicationPasswordItem = read_json(response).await?;
    Ok(item.uuid)
  }

  async fn delete_with_login(&self, site: &Site, uuid: &str, user: &str, password: &str) -> Result<(), WpApiError> {
    let url = format!("{}/{uuid}", rest_url(site.url(), APPLICATION_PASSWORDS_ROUTE));
    let response = self
      .client
      .delete(url)
      .basic_auth(user, Some(password))
      .send()
      .await?;

    let deleted: DeletedApplicationPassword = read_json(response).await?;
    confirm_deleted(deleted.deleted, site)
  }
}

#[async_trait]
impl SiteOriginAdapter for SelfHostedAdapter {
  async fn create(
    &self,
    site: &Site,
    application_name: &str,
  ) -> Result<ApplicationPasswordCredentials, WpApiError> {
    let (username, password) = Self::primary_login(site)?;
    debug!(site = %site.key(), application_name, "Creating application password");

    let response = self
      .client
      .post(rest_url(site.url(), APPLICATION_PASSWORDS_ROUTE))
      .basic_auth(username, Some(password))
      .json(&CreateApplicationPassword { name: application_name })
      .send()
      .await?;

    let created: CreatedApplicationPassword = read_json(response).await?;
    Ok(ApplicationPasswordCredentials::new(
      username,
      created.password,
      Some(created.uuid),
    ))
  }

  async fn delete(&self, site: &Site, target: &DeleteTarget) -> Result<(), WpApiError> {
    match target {
      DeleteTarget::Uuid(uuid) => {
        let (username, password) = Self::primary_login(site)?;
        debug!(site = %site.key(), %uuid, "Deleting application password");
        self.delete_with_login(site, uuid, username, password).await
      }
      DeleteTarget::Credentials(credentials) => {
        // A password may always revoke itself.
        let uuid = match &credentials.uuid {
          Some(uuid) => uuid.clone(),
          None => self.introspect(site, credentials).await?,
        };
        debug!(site = %site.key(), %uuid, "Deleting application password with its own credentials");
        self
          .delete_with_login(site, &uuid, &credentials.user_name, &credentials.password)
          .await
      }
    }
  }

  async fn fetch_application_password_uuid(&self, site: &Site, application_name: &str) -> Result<String, WpApiError> {
    let (username, password) = Self::primary_login(site)?;

    let response = self
      .client
      .get(rest_url(site.url(), APPLICATION_PASSWORDS_ROUTE))
      .basic_auth(username, Some(password))
      .send()
      .await?;

    let items: Vec<ApplicationPasswordItem> = read_json(response).await?;
    find_uuid(items, site, application_name)
  }
}
