//! # Error Taxonomy
//!
//! Every failure the credential lifecycle can observe, with the
//! classification helpers the manager and transport branch on. The split
//! between "feature unavailable" and everything else matters: the former is
//! terminal for a site, the latter is presumed transient.

use std::sync::Arc;

use reqwest::{Response, StatusCode};
use serde_json::Value;
use thiserror::Error;

use crate::consts::APPLICATION_PASSWORDS_DISABLED;

/// Errors produced while talking to a WordPress site or the WordPress.com
/// proxy, or while reading and writing the local credential record.
///
/// Cloneable so one creation outcome can be handed to every caller waiting
/// on it.
#[derive(Debug, Clone, Error)]
pub enum WpApiError {
  /// The server answered with a non-success status.
  #[error("HTTP {status}: {message}")]
  Http {
    status: StatusCode,
    /// Machine-readable error code from the body (`code` on WP REST,
    /// `error` on WordPress.com), when present.
    code: Option<String>,
    message: String,
  },
  /// The request never produced a response (DNS, TLS, timeout, ...).
  #[error("request failed: {0}")]
  Network(#[source] Arc<reqwest::Error>),
  /// The server answered successfully but not with what we expected.
  #[error("unexpected response: {0}")]
  UnexpectedResponse(String),
  /// A remote lookup came back empty.
  #[error("{0}")]
  NotFound(String),
  /// Jetpack sites are only reachable through WordPress.com with a token.
  #[error("no WordPress.com token configured for Jetpack site {0}")]
  MissingWpcomToken(String),
  /// An adapter was handed a site of the other origin.
  #[error("{adapter} adapter cannot serve {origin} site {site}")]
  WrongOrigin {
    adapter: &'static str,
    origin: &'static str,
    site: String,
  },
  /// The local credential store failed.
  #[error("credential store error: {0:#}")]
  Storage(Arc<anyhow::Error>),
  /// The background creation task ended without producing a result.
  #[error("credential creation was interrupted: {0}")]
  Interrupted(String),
}

impl From<reqwest::Error> for WpApiError {
  fn from(error: reqwest::Error) -> Self {
    WpApiError::Network(Arc::new(error))
  }
}

impl WpApiError {
  pub fn storage(error: anyhow::Error) -> Self {
    WpApiError::Storage(Arc::new(error))
  }

  /// Build an error from a non-success response, reading its body.
  pub async fn from_response(response: Response) -> Self {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Self::from_status_and_body(status, &body)
  }

  /// Parse the WP REST (`{code, message}`) or WordPress.com
  /// (`{error, message}`) error shape, falling back to the raw body.
  pub fn from_status_and_body(status: StatusCode, body: &str) -> Self {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let field = |name: &str| {
      parsed
        .as_ref()
        .and_then(|json| json.get(name))
        .and_then(Value::as_str)
        .map(str::to_string)
    };

    let code = field("code").or_else(|| field("error"));
    let message = field("message")
      .or_else(|| {
        let trimmed = body.trim();
        (!trimmed.is_empty() && parsed.is_none()).then(|| trimmed.to_string())
      })
      .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

    WpApiError::Http { status, code, message }
  }

  /// HTTP status of the failure, when the server produced one.
  pub fn status(&self) -> Option<StatusCode> {
    match self {
      WpApiError::Http { status, .. } => Some(*status),
      WpApiError::Network(error) => error.status(),
      _ => None,
    }
  }

  /// The API error code from the response body, when present.
  pub fn api_code(&self) -> Option<&str> {
    match self {
      WpApiError::Http { code, .. } => code.as_deref(),
      _ => None,
    }
  }

  /// Whether the site does not offer application passwords at all.
  pub fn is_feature_unavailable(&self) -> bool {
    matches!(self.status(), Some(StatusCode::NOT_FOUND | StatusCode::NOT_IMPLEMENTED))
      || self.api_code() == Some(APPLICATION_PASSWORDS_DISABLED)
  }

  /// Whether creation failed because a password with the same name exists.
  pub fn is_conflict(&self) -> bool {
    self.status() == Some(StatusCode::CONFLICT)
  }

  /// Whether the server rejected the credentials we sent.
  pub fn is_unauthorized(&self) -> bool {
    self.status() == Some(StatusCode::UNAUTHORIZED)
  }
}
