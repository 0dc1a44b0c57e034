//! # Browser Authorization
//!
//! The interactive way to obtain an application password: send the user to
//! the site's authorization screen and read the credentials back from the
//! redirect it issues once they approve.

use apppass_core::url::rest_url;
use apppass_core::{ApplicationPasswordCredentials, Site, SiteOrigin};
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::client::read_json;
use crate::consts::AUTHORIZE_APPLICATION_PATH;
use crate::error::WpApiError;

/// Errors reading an authorization callback.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallbackError {
  #[error("invalid callback URL: {0}")]
  InvalidUrl(#[from] url::ParseError),
  #[error("callback URL is missing the '{0}' parameter")]
  MissingParameter(&'static str),
}

/// What the authorization screen redirected back with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationCallback {
  Approved {
    site_url: String,
    user_login: String,
    password: String,
  },
  /// The user declined the request.
  Rejected,
}

/// Find the site's authorization screen through the REST API index.
///
/// Sites that advertise nothing fall back to the standard wp-admin path.
pub async fn discover_authorization_url(client: &Client, site_url: &str) -> Result<Url, WpApiError> {
  let response = client.get(rest_url(site_url, "")).send().await?;
  let index: Value = read_json(response).await?;

  let advertised = index
    .pointer("/authentication/application-passwords/endpoints/authorization")
    .and_then(Value::as_str);

  let endpoint = match advertised {
    Some(endpoint) => endpoint.to_string(),
    None => {
      debug!(site_url, "Site does not advertise an authorization endpoint");
      format!("{}/{AUTHORIZE_APPLICATION_PATH}", site_url.trim_end_matches('/'))
    }
  };

  Url::parse(&endpoint).map_err(|e| WpApiError::UnexpectedResponse(format!("bad authorization URL '{endpoint}': {e}")))
}

/// The URL to open in a browser to request a password named `app_name`.
pub fn authorization_url(endpoint: &Url, app_name: &str, success_url: &str) -> Url {
  let mut url = endpoint.clone();
  url
    .query_pairs_mut()
    .append_pair("app_name", app_name)
    .append_pair("success_url", success_url);
  url
}

/// Read the redirect the authorization screen sent to `success_url`.
pub fn parse_authorization_callback(callback: &str) -> Result<AuthorizationCallback, CallbackError> {
  let url = Url::parse(callback.trim())?;
  let param = |name: &str| {
    url
      .query_pairs()
      .find(|(key, _)| key == name)
      .map(|(_, value)| value.into_owned())
  };

  if param("success").as_deref() == Some("false") {
    return Ok(AuthorizationCallback::Rejected);
  }

  let required = |name: &'static str| {
    param(name)
      .filter(|value| !value.is_empty())
      .ok_or(CallbackError::MissingParameter(name))
  };

  Ok(AuthorizationCallback::Approved {
    site_url: required("site_url")?,
    user_login: required("user_login")?,
    password: required("password")?,
  })
}

impl AuthorizationCallback {
  /// Turn an approval into the site and the credentials to store for it.
  ///
  /// The password acts as the site's login as well, so the site is recorded
  /// as self-hosted with these credentials.
  pub fn into_site_credentials(self) -> anyhow::Result<Option<(Site, ApplicationPasswordCredentials)>> {
    match self {
      AuthorizationCallback::Rejected => Ok(None),
      AuthorizationCallback::Approved {
        site_url,
        user_login,
        password,
      } => {
        let site = Site::new(
          &site_url,
          SiteOrigin::SelfHosted {
            username: user_login.clone(),
            password: password.clone(),
          },
        )?;
        Ok(Some((site, ApplicationPasswordCredentials::new(user_login, password, None))))
      }
    }
  }
}
