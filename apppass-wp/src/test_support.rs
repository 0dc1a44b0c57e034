//! Scripted collaborators for the manager and transport tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use apppass_core::{ApplicationPasswordCredentials, Site};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;

use crate::adapter::{DeleteTarget, SiteAdapters, SiteOriginAdapter};
use crate::error::WpApiError;
use crate::listener::ApplicationPasswordsListener;

pub fn http_error(status: StatusCode) -> WpApiError {
  WpApiError::from_status_and_body(status, "")
}

pub fn credentials(password: &str) -> ApplicationPasswordCredentials {
  ApplicationPasswordCredentials::new("username", password, Some(format!("uuid-{password}")))
}

/// Adapter whose answers are queued up front and whose calls are counted.
#[derive(Default)]
pub struct ScriptedAdapter {
  creates: Mutex<VecDeque<Result<ApplicationPasswordCredentials, WpApiError>>>,
  create_delay: Option<Duration>,
  remote_uuid: Option<String>,
  delete_status: Option<StatusCode>,
  pub create_calls: AtomicUsize,
  pub fetch_calls: AtomicUsize,
  pub deleted: Mutex<Vec<DeleteTarget>>,
}

impl ScriptedAdapter {
  pub fn new() -> Self {
    Self::default()
  }

  /// Queue the outcome of the next `create`.
  pub fn then_create(self, outcome: Result<ApplicationPasswordCredentials, WpApiError>) -> Self {
    self.creates.lock().push_back(outcome);
    self
  }

  /// Make every `create` take `delay` before answering.
  pub fn with_create_delay(mut self, delay: Duration) -> Self {
    self.create_delay = Some(delay);
    self
  }

  /// The UUID `fetch_application_password_uuid` finds on the server.
  pub fn with_remote_uuid(mut self, uuid: &str) -> Self {
    self.remote_uuid = Some(uuid.to_string());
    self
  }

  /// Make every `delete` fail with `status`.
  pub fn failing_delete(mut self, status: StatusCode) -> Self {
    self.delete_status = Some(status);
    self
  }

  pub fn creates(&self) -> usize {
    self.create_calls.load(Ordering::SeqCst)
  }

  pub fn fetches(&self) -> usize {
    self.fetch_calls.load(Ordering::SeqCst)
  }

  pub fn deletes(&self) -> Vec<DeleteTarget> {
    self.deleted.lock().clone()
  }
}

#[async_trait]
impl SiteOriginAdapter for ScriptedAdapter {
  async fn create(
    &self,
    _site: &Site,
    _application_name: &str,
  ) -> Result<ApplicationPasswordCredentials, WpApiError> {
    self.create_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(delay) = self.create_delay {
      tokio::time::sleep(delay).await;
    }
    self
      .creates
      .lock()
      .pop_front()
      .unwrap_or_else(|| Err(WpApiError::UnexpectedResponse("no scripted create left".to_string())))
  }

  async fn delete(&self, _site: &Site, target: &DeleteTarget) -> Result<(), WpApiError> {
    self.deleted.lock().push(target.clone());
    match self.delete_status {
      Some(status) => Err(http_error(status)),
      None => Ok(()),
    }
  }

  async fn fetch_application_password_uuid(&self, site: &Site, application_name: &str) -> Result<String, WpApiError> {
    self.fetch_calls.fetch_add(1, Ordering::SeqCst);
    self
      .remote_uuid
      .clone()
      .ok_or_else(|| WpApiError::NotFound(format!("no '{application_name}' password on {}", site.url())))
  }
}

/// Route both origins to the same scripted adapter.
pub fn adapters(adapter: &Arc<ScriptedAdapter>) -> SiteAdapters {
  let shared: Arc<dyn SiteOriginAdapter> = adapter.clone();
  SiteAdapters::new(Arc::clone(&shared), shared)
}

/// Give each origin its own scripted adapter.
pub fn split_adapters(jetpack: &Arc<ScriptedAdapter>, self_hosted: &Arc<ScriptedAdapter>) -> SiteAdapters {
  SiteAdapters::new(jetpack.clone(), self_hosted.clone())
}

/// Listener event, as recorded by [`RecordingListener`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerEvent {
  FeatureUnavailable(String),
  PasswordCreated { regenerated: bool },
}

#[derive(Default)]
pub struct RecordingListener {
  events: Mutex<Vec<ListenerEvent>>,
}

impl RecordingListener {
  pub fn events(&self) -> Vec<ListenerEvent> {
    self.events.lock().clone()
  }
}

impl ApplicationPasswordsListener for RecordingListener {
  fn on_feature_unavailable(&self, site: &Site, _error: &WpApiError) {
    self
      .events
      .lock()
      .push(ListenerEvent::FeatureUnavailable(site.url().to_string()));
  }

  fn on_new_password_created(&self, is_password_regenerated: bool) {
    self.events.lock().push(ListenerEvent::PasswordCreated {
      regenerated: is_password_regenerated,
    });
  }
}
