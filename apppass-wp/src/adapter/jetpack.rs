//! Adapter for Jetpack-connected sites.
//!
//! Jetpack sites may sit behind firewalls or have no usable primary login,
//! so every call is tunnelled through the WordPress.com `rest-api` proxy
//! using the account's bearer token. The proxy takes the WP REST path and
//! the real HTTP method as parameters and wraps the site's answer in a
//! `data` envelope.

use apppass_core::{ApplicationPasswordCredentials, Site, SiteOrigin};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{DeleteTarget, SiteOriginAdapter, confirm_deleted, find_uuid, wrong_origin};
use crate::client::read_json;
use crate::consts::{APPLICATION_PASSWORDS_ROUTE, CURRENT_USER_ROUTE};
use crate::error::WpApiError;
use crate::models::{
  ApplicationPasswordItem, CreateApplicationPassword, CreatedApplicationPassword, CurrentUser,
  DeletedApplicationPassword, ProxyEnvelope,
};

#[derive(Serialize)]
struct ProxyRequest {
  path: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  body: Option<String>,
  json: bool,
}

/// Talks to a Jetpack site through `<wpcom>/rest/v1.1/jetpack-blogs/<id>/rest-api/`.
#[derive(Debug, Clone)]
pub struct JetpackAdapter {
  client: Client,
  api_base: String,
  token: Option<String>,
}

impl JetpackAdapter {
  pub fn new(client: Client, api_base: impl Into<String>, token: Option<String>) -> Self {
    Self {
      client,
      api_base: api_base.into().trim_end_matches('/').to_string(),
      token: token.filter(|token| !token.trim().is_empty()),
    }
  }

  /// The WordPress login of the account that owns the connection.
  ///
  /// Application passwords authenticate as a WordPress user, not as the
  /// WordPress.com account, so this is the user name new credentials carry.
  pub async fn fetch_wp_admin_username(&self, site: &Site) -> Result<String, WpApiError> {
    let user: CurrentUser = self.proxy(site, Method::GET, CURRENT_USER_ROUTE, None).await?;
    Ok(user.username)
  }

  fn site_id(site: &Site) -> Result<u64, WpApiError> {
    match site.origin {
      SiteOrigin::JetpackConnected { site_id } => Ok(site_id),
      SiteOrigin::SelfHosted { .. } => Err(wrong_origin("jetpack", site)),
    }
  }

  async fn proxy<T: DeserializeOwned>(
    &self,
    site: &Site,
    method: Method,
    route: &str,
    body: Option<String>,
  ) -> Result<T, WpApiError> {
    let site_id = Self::site_id(site)?;
    let token = self
      .token
      .as_deref()
      .ok_or_else(|| WpApiError::MissingWpcomToken(site.url().to_string()))?;

    let url = format!("{}/rest/v1.1/jetpack-blogs/{site_id}/rest-api/", self.api_base);
    let path = format!("/{route}&_method={}", method.as_str().to_ascii_lowercase());
    debug!(site = %site.key(), site_id, %method, route, "Proxying request through WordPress.com");

    let request = if method == Method::GET {
      self
        .client
        .get(&url)
        .query(&[("path", path.as_str()), ("json", "true")])
    } else {
      self.client.post(&url).json(&ProxyRequest { path, body, json: true })
    };

    let response = request.bearer_auth(token).send().await?;
    let envelope: ProxyEnvelope<T> = read_json(response).await?;
    Ok(envelope.data)
  }
}

#[async_trait]
impl SiteOriginAdapter for JetpackAdapter {
  async fn create(
    &self,
    site: &Site,
    application_name: &str,
  ) -> Result<ApplicationPasswordCredentials, WpApiError> {
    let username = self.fetch_wp_admin_username(site).await?;
    debug!(site = %site.key(), application_name, %username, "Creating application password");

    let body = serde_json::to_string(&CreateApplicationPassword { name: application_name })
      .map_err(|e| WpApiError::UnexpectedResponse(e.to_string()))?;
    let created: CreatedApplicationPassword = self
      .proxy(site, Method::POST, APPLICATION_PASSWORDS_ROUTE, Some(body))
      .await?;

    Ok(ApplicationPasswordCredentials::new(
      username,
      created.password,
      Some(created.uuid),
    ))
  }

  async fn delete(&self, site: &Site, target: &DeleteTarget) -> Result<(), WpApiError> {
    let uuid = match target {
      DeleteTarget::Uuid(uuid) => uuid,
      DeleteTarget::Credentials(credentials) => credentials.uuid.as_ref().ok_or_else(|| {
        WpApiError::NotFound(format!(
          "stored credentials for {} carry no application password UUID",
          site.url()
        ))
      })?,
    };
    debug!(site = %site.key(), %uuid, "Deleting application password");

    let route = format!("{APPLICATION_PASSWORDS_ROUTE}/{uuid}");
    let deleted: DeletedApplicationPassword = self.proxy(site, Method::DELETE, &route, None).await?;
    confirm_deleted(deleted.deleted, site)
  }

  async fn fetch_application_password_uuid(&self, site: &Site, application_name: &str) -> Result<String, WpApiError> {
    let items: Vec<ApplicationPasswordItem> = self
      .proxy(site, Method::GET, APPLICATION_PASSWORDS_ROUTE, None)
      .await?;
    find_uuid(items, site, application_name)
  }
}

#[cfg(test)]
mod tests {
  use anyhow::Result;
  use apppass_test_utils::{jetpack_site, self_hosted_site};
  use serde_json::json;
  use wiremock::matchers::{bearer_token, body_json, method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  use super::*;

  const PROXY: &str = "/rest/v1.1/jetpack-blogs/42/rest-api/";

  fn adapter(mock_server: &MockServer) -> JetpackAdapter {
    JetpackAdapter::new(Client::new(), mock_server.uri(), Some("wpcom-token".to_string()))
  }

  async fn mount_username(mock_server: &MockServer) {
    Mock::given(method("GET"))
      .and(path(PROXY))
      .and(query_param("path", "/wp/v2/users/me?context=edit&_method=get"))
      .and(bearer_token("wpcom-token"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "data": { "id": 1, "username": "site-admin", "name": "Site Admin" }
      })))
      .mount(mock_server)
      .await;
  }

  #[tokio::test]
  async fn test_fetch_wp_admin_username() -> Result<()> {
    let mock_server = MockServer::start().await;
    mount_username(&mock_server).await;

    let site = jetpack_site("https://jetpack.example.com", 42);
    assert_eq!(adapter(&mock_server).fetch_wp_admin_username(&site).await?, "site-admin");
    Ok(())
  }

  #[tokio::test]
  async fn test_create_through_proxy() -> Result<()> {
    let mock_server = MockServer::start().await;
    mount_username(&mock_server).await;

    Mock::given(method("POST"))
      .and(path(PROXY))
      .and(bearer_token("wpcom-token"))
      .and(body_json(json!({
        "path": "/wp/v2/users/me/application-passwords&_method=post",
        "body": "{\"name\":\"apppass\"}",
        "json": true
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "data": { "uuid": "jp-uuid", "name": "apppass", "password": "jp secret" }
      })))
      .expect(1)
      .mount(&mock_server)
      .await;

    let site = jetpack_site("https://jetpack.example.com", 42);
    let credentials = adapter(&mock_server).create(&site, "apppass").await?;

    assert_eq!(
      credentials,
      ApplicationPasswordCredentials::new("site-admin", "jp secret", Some("jp-uuid".to_string()))
    );
    Ok(())
  }

  #[tokio::test]
  async fn test_proxy_error_shape_is_parsed() {
    let mock_server = MockServer::start().await;
    mount_username(&mock_server).await;

    Mock::given(method("POST"))
      .and(path(PROXY))
      .respond_with(ResponseTemplate::new(409).set_body_json(json!({
        "error": "application_passwords_duplicate_name",
        "message": "Each application name should be unique."
      })))
      .mount(&mock_server)
      .await;

    let site = jetpack_site("https://jetpack.example.com", 42);
    let error = adapter(&mock_server).create(&site, "apppass").await.unwrap_err();

    assert!(error.is_conflict());
    assert_eq!(error.api_code(), Some("application_passwords_duplicate_name"));
  }

  #[tokio::test]
  async fn test_fetch_uuid_and_delete() -> Result<()> {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path(PROXY))
      .and(query_param("path", "/wp/v2/users/me/application-passwords&_method=get"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "data": [{ "uuid": "jp-uuid", "name": "apppass" }]
      })))
      .mount(&mock_server)
      .await;
    Mock::given(method("POST"))
      .and(path(PROXY))
      .and(body_json(json!({
        "path": "/wp/v2/users/me/application-passwords/jp-uuid&_method=delete",
        "json": true
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "deleted": true } })))
      .expect(1)
      .mount(&mock_server)
      .await;

    let site = jetpack_site("https://jetpack.example.com", 42);
    let adapter = adapter(&mock_server);
    let uuid = adapter.fetch_application_password_uuid(&site, "apppass").await?;
    adapter.delete(&site, &DeleteTarget::Uuid(uuid)).await?;
    Ok(())
  }

  #[tokio::test]
  async fn test_delete_credentials_without_uuid() {
    let mock_server = MockServer::start().await;
    let site = jetpack_site("https://jetpack.example.com", 42);
    let credentials = ApplicationPasswordCredentials::new("site-admin", "secret", None);

    let error = adapter(&mock_server)
      .delete(&site, &DeleteTarget::Credentials(credentials))
      .await
      .unwrap_err();
    assert!(matches!(error, WpApiError::NotFound(_)));
  }

  #[tokio::test]
  async fn test_missing_token() {
    let site = jetpack_site("https://jetpack.example.com", 42);
    let adapter = JetpackAdapter::new(Client::new(), "https://public-api.wordpress.com", Some("  ".to_string()));

    let error = adapter.fetch_wp_admin_username(&site).await.unwrap_err();
    assert!(matches!(error, WpApiError::MissingWpcomToken(_)));
  }

  #[tokio::test]
  async fn test_rejects_self_hosted_sites() {
    let mock_server = MockServer::start().await;
    let site = self_hosted_site("https://hosted.example.com");

    let error = adapter(&mock_server)
      .fetch_application_password_uuid(&site, "apppass")
      .await
      .unwrap_err();
    assert!(matches!(error, WpApiError::WrongOrigin { .. }));
  }
}
