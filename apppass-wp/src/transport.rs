//! # Authenticated Transport
//!
//! Executes WP REST requests against a site with its application password
//! attached. A 401 is read as the server having revoked the password: the
//! stored record is forgotten, a fresh one is minted, and the request is
//! sent once more. A second 401 is final.

use std::sync::Arc;

use apppass_core::url::rest_url;
use apppass_core::{ApplicationPasswordCredentials, Site};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::client::read_json;
use crate::error::WpApiError;
use crate::listener::ApplicationPasswordsListener;
use crate::manager::{ApplicationPasswordsManager, CreationResult};

/// Attempts per call: the original one plus one after regeneration.
pub const MAX_ATTEMPTS: usize = 2;

/// A request against a site's WP REST API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
  pub method: Method,
  /// Route below `/wp-json`, for example `/wp/v2/posts`
  pub path: String,
  pub query: Vec<(String, String)>,
  pub body: Option<Value>,
}

impl ApiRequest {
  pub fn new(method: Method, path: impl Into<String>) -> Self {
    Self {
      method,
      path: path.into(),
      query: Vec::new(),
      body: None,
    }
  }

  pub fn get(path: impl Into<String>) -> Self {
    Self::new(Method::GET, path)
  }

  pub fn post(path: impl Into<String>, body: Value) -> Self {
    Self::new(Method::POST, path).with_body(body)
  }

  pub fn delete(path: impl Into<String>) -> Self {
    Self::new(Method::DELETE, path)
  }

  pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.query.push((key.into(), value.into()));
    self
  }

  pub fn with_body(mut self, body: Value) -> Self {
    self.body = Some(body);
    self
  }
}

/// Why a request produced no usable response.
#[derive(Debug, Error)]
pub enum TransportError {
  /// The site does not offer application passwords; nothing was sent.
  #[error("application passwords are not available: {0}")]
  FeatureUnavailable(#[source] WpApiError),
  /// No credentials could be obtained; nothing was sent.
  #[error("could not obtain an application password: {0}")]
  CredentialsUnavailable(#[source] WpApiError),
  /// The request was sent and failed, including a 401 after regeneration.
  #[error(transparent)]
  Request(WpApiError),
}

impl TransportError {
  /// The underlying API error.
  pub fn api_error(&self) -> &WpApiError {
    match self {
      TransportError::FeatureUnavailable(error)
      | TransportError::CredentialsUnavailable(error)
      | TransportError::Request(error) => error,
    }
  }
}

/// Result of [`AuthenticatedTransport::execute`].
#[derive(Debug)]
pub enum WpApiResponse<T> {
  Success(T),
  Error(TransportError),
}

impl<T> WpApiResponse<T> {
  pub fn into_result(self) -> Result<T, TransportError> {
    match self {
      WpApiResponse::Success(value) => Ok(value),
      WpApiResponse::Error(error) => Err(error),
    }
  }
}

/// Sends requests with the site's application password attached.
#[derive(Clone)]
pub struct AuthenticatedTransport {
  client: Client,
  manager: ApplicationPasswordsManager,
  listener: Option<Arc<dyn ApplicationPasswordsListener>>,
}

impl AuthenticatedTransport {
  pub fn new(client: Client, manager: ApplicationPasswordsManager) -> Self {
    Self {
      client,
      manager,
      listener: None,
    }
  }

  pub fn with_listener(mut self, listener: Arc<dyn ApplicationPasswordsListener>) -> Self {
    self.listener = Some(listener);
    self
  }

  pub fn manager(&self) -> &ApplicationPasswordsManager {
    &self.manager
  }

  /// Execute `request` against `site`, decoding the JSON response as `T`.
  pub async fn execute<T: DeserializeOwned>(&self, site: &Site, request: &ApiRequest) -> WpApiResponse<T> {
    let mut attempt = 1;
    let mut regenerating = false;

    loop {
      let credentials = match self.manager.get_application_credentials(site).await {
        CreationResult::Existing(credentials) => credentials,
        CreationResult::Created(credentials) => {
          if let Some(listener) = &self.listener {
            listener.on_new_password_created(regenerating);
          }
          credentials
        }
        CreationResult::NotSupported(error) => {
          if let Some(listener) = &self.listener {
            listener.on_feature_unavailable(site, &error);
          }
          return WpApiResponse::Error(TransportError::FeatureUnavailable(error));
        }
        CreationResult::Failure(error) => {
          return WpApiResponse::Error(TransportError::CredentialsUnavailable(error));
        }
      };

      let response = match self.send(site, request, &credentials).await {
        Ok(response) => response,
        Err(error) => return WpApiResponse::Error(TransportError::Request(error)),
      };

      if response.status() == StatusCode::UNAUTHORIZED && attempt < MAX_ATTEMPTS {
        warn!(site = %site.key(), path = %request.path, "Application password rejected, regenerating");
        if let Err(error) = self.manager.invalidate_credentials(site, &credentials).await {
          return WpApiResponse::Error(TransportError::CredentialsUnavailable(error));
        }
        attempt += 1;
        regenerating = true;
        continue;
      }

      return match read_json(response).await {
        Ok(value) => WpApiResponse::Success(value),
        Err(error) => WpApiResponse::Error(TransportError::Request(error)),
      };
    }
  }

  async fn send(
    &self,
    site: &Site,
    request: &ApiRequest,
    credentials: &ApplicationPasswordCredentials,
  ) -> Result<reqwest::Response, WpApiError> {
    let url = rest_url(site.url(), &request.path);
    debug!(site = %site.key(), method = %request.method, %url, "Sending authenticated request");

    let mut builder = self
      .client
      .request(request.method.clone(), &url)
      .basic_auth(&credentials.user_name, Some(&credentials.password));
    if !request.query.is_empty() {
      builder = builder.query(&request.query);
    }
    if let Some(body) = &request.body {
      builder = builder.json(body);
    }

    Ok(builder.send().await?)
  }
}

#[cfg(test)]
mod tests {
  use apppass_core::{ApplicationPasswordsConfiguration, CredentialStore};
  use apppass_test_utils::{CountingCredentialStore, self_hosted_site, test_credentials};
  use serde_json::json;
  use wiremock::matchers::{basic_auth, body_json, method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  use super::*;
  use crate::test_support::{ListenerEvent, RecordingListener, ScriptedAdapter, adapters, credentials, http_error};

  struct Fixture {
    store: Arc<CountingCredentialStore>,
    adapter: Arc<ScriptedAdapter>,
    listener: Arc<RecordingListener>,
    transport: AuthenticatedTransport,
  }

  fn fixture(store: CountingCredentialStore, adapter: ScriptedAdapter) -> Fixture {
    let store = Arc::new(store);
    let adapter = Arc::new(adapter);
    let listener = Arc::new(RecordingListener::default());

    let shared_store: Arc<dyn CredentialStore> = store.clone();
    let manager = ApplicationPasswordsManager::new(
      shared_store,
      adapters(&adapter),
      &ApplicationPasswordsConfiguration::new(Some("apppass".to_string())),
    )
    .unwrap();
    let transport = AuthenticatedTransport::new(Client::new(), manager).with_listener(listener.clone());

    Fixture {
      store,
      adapter,
      listener,
      transport,
    }
  }

  #[tokio::test]
  async fn test_existing_credentials_are_attached() {
    let mock_server = MockServer::start().await;
    let site = self_hosted_site(&mock_server.uri());
    let fixture = fixture(
      CountingCredentialStore::with_record(&site, &test_credentials()),
      ScriptedAdapter::new(),
    );

    Mock::given(method("GET"))
      .and(path("/wp-json/wp/v2/posts"))
      .and(query_param("per_page", "1"))
      .and(basic_auth("username", "password"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 7 }])))
      .expect(1)
      .mount(&mock_server)
      .await;

    let request = ApiRequest::get("/wp/v2/posts").with_query("per_page", "1");
    let posts: Value = fixture.transport.execute(&site, &request).await.into_result().unwrap();

    assert_eq!(posts, json!([{ "id": 7 }]));
    assert_eq!(fixture.adapter.creates(), 0);
    assert!(fixture.listener.events().is_empty());
  }

  #[tokio::test]
  async fn test_cold_start_notifies_new_password() {
    let mock_server = MockServer::start().await;
    let site = self_hosted_site(&mock_server.uri());
    let fixture = fixture(
      CountingCredentialStore::new(),
      ScriptedAdapter::new().then_create(Ok(credentials("minted"))),
    );

    Mock::given(method("POST"))
      .and(path("/wp-json/wp/v2/posts"))
      .and(basic_auth("username", "minted"))
      .and(body_json(json!({ "title": "Hello" })))
      .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 1 })))
      .expect(1)
      .mount(&mock_server)
      .await;

    let request = ApiRequest::post("/wp/v2/posts", json!({ "title": "Hello" }));
    let created: Value = fixture.transport.execute(&site, &request).await.into_result().unwrap();

    assert_eq!(created["id"], 1);
    assert_eq!(
      fixture.listener.events(),
      vec![ListenerEvent::PasswordCreated { regenerated: false }]
    );
  }

  #[tokio::test]
  async fn test_unauthorized_regenerates_and_retries_once() {
    let mock_server = MockServer::start().await;
    let site = self_hosted_site(&mock_server.uri());
    let fixture = fixture(
      CountingCredentialStore::with_record(&site, &credentials("revoked")),
      ScriptedAdapter::new().then_create(Ok(credentials("fresh"))),
    );

    Mock::given(method("GET"))
      .and(path("/wp-json/wp/v2/settings"))
      .and(basic_auth("username", "revoked"))
      .respond_with(ResponseTemplate::new(401).set_body_json(json!({
        "code": "incorrect_password",
        "message": "The provided password is an invalid application password.",
        "data": { "status": 401 }
      })))
      .expect(1)
      .mount(&mock_server)
      .await;
    Mock::given(method("GET"))
      .and(path("/wp-json/wp/v2/settings"))
      .and(basic_auth("username", "fresh"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "title": "Blog" })))
      .expect(1)
      .mount(&mock_server)
      .await;

    let settings: Value = fixture
      .transport
      .execute(&site, &ApiRequest::get("/wp/v2/settings"))
      .await
      .into_result()
      .unwrap();

    assert_eq!(settings["title"], "Blog");
    assert_eq!(fixture.store.deletes(), 1);
    assert_eq!(fixture.adapter.creates(), 1);
    assert_eq!(fixture.store.current(&site), Some(credentials("fresh")));
    assert_eq!(
      fixture.listener.events(),
      vec![ListenerEvent::PasswordCreated { regenerated: true }]
    );
  }

  #[tokio::test]
  async fn test_second_unauthorized_is_final() {
    let mock_server = MockServer::start().await;
    let site = self_hosted_site(&mock_server.uri());
    let fixture = fixture(
      CountingCredentialStore::with_record(&site, &credentials("revoked")),
      ScriptedAdapter::new()
        .then_create(Ok(credentials("fresh")))
        .then_create(Ok(credentials("unused"))),
    );

    Mock::given(method("GET"))
      .and(path("/wp-json/wp/v2/settings"))
      .respond_with(ResponseTemplate::new(401))
      .expect(MAX_ATTEMPTS as u64)
      .mount(&mock_server)
      .await;

    let response: WpApiResponse<Value> = fixture.transport.execute(&site, &ApiRequest::get("/wp/v2/settings")).await;

    let error = response.into_result().unwrap_err();
    assert!(matches!(error, TransportError::Request(_)));
    assert!(error.api_error().is_unauthorized());
    assert_eq!(fixture.store.deletes(), 1);
    assert_eq!(fixture.adapter.creates(), 1);
    assert_eq!(
      fixture.listener.events(),
      vec![ListenerEvent::PasswordCreated { regenerated: true }]
    );
  }

  #[tokio::test]
  async fn test_not_supported_sends_nothing() {
    let mock_server = MockServer::start().await;
    let site = self_hosted_site(&mock_server.uri());
    let fixture = fixture(
      CountingCredentialStore::new(),
      ScriptedAdapter::new().then_create(Err(http_error(StatusCode::NOT_FOUND))),
    );

    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200))
      .expect(0)
      .mount(&mock_server)
      .await;

    let response: WpApiResponse<Value> = fixture.transport.execute(&site, &ApiRequest::get("/wp/v2/posts")).await;

    assert!(matches!(response, WpApiResponse::Error(TransportError::FeatureUnavailable(_))));
    assert_eq!(
      fixture.listener.events(),
      vec![ListenerEvent::FeatureUnavailable(site.url().to_string())]
    );
  }

  #[tokio::test]
  async fn test_creation_failure_sends_nothing() {
    let mock_server = MockServer::start().await;
    let site = self_hosted_site(&mock_server.uri());
    let fixture = fixture(
      CountingCredentialStore::new(),
      ScriptedAdapter::new().then_create(Err(http_error(StatusCode::SERVICE_UNAVAILABLE))),
    );

    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200))
      .expect(0)
      .mount(&mock_server)
      .await;

    let response: WpApiResponse<Value> = fixture.transport.execute(&site, &ApiRequest::get("/wp/v2/posts")).await;

    assert!(matches!(
      response,
      WpApiResponse::Error(TransportError::CredentialsUnavailable(_))
    ));
    assert!(fixture.listener.events().is_empty());
  }

  #[tokio::test]
  async fn test_other_errors_are_not_retried() {
    let mock_server = MockServer::start().await;
    let site = self_hosted_site(&mock_server.uri());
    let fixture = fixture(
      CountingCredentialStore::with_record(&site, &test_credentials()),
      ScriptedAdapter::new(),
    );

    Mock::given(method("DELETE"))
      .and(path("/wp-json/wp/v2/posts/9"))
      .respond_with(ResponseTemplate::new(403).set_body_json(json!({
        "code": "rest_cannot_delete",
        "message": "Sorry, you are not allowed to delete this post."
      })))
      .expect(1)
      .mount(&mock_server)
      .await;

    let response: WpApiResponse<Value> = fixture.transport.execute(&site, &ApiRequest::delete("/wp/v2/posts/9")).await;

    let error = response.into_result().unwrap_err();
    assert_eq!(error.api_error().status(), Some(StatusCode::FORBIDDEN));
    assert_eq!(error.api_error().api_code(), Some("rest_cannot_delete"));
    assert_eq!(fixture.store.deletes(), 0);
  }
}
