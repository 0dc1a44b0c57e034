//! Wire models for the application-password endpoints.

use serde::{Deserialize, Serialize};

/// Body of a create request.
#[derive(Debug, Clone, Serialize)]
pub struct CreateApplicationPassword<'a> {
  pub name: &'a str,
}

/// Response to a successful create. `password` is only ever returned here.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedApplicationPassword {
  pub uuid: String,
  pub name: String,
  pub password: String,
}

/// One entry of the application-password collection.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationPasswordItem {
  pub uuid: String,
  pub name: String,
  #[serde(default)]
  pub app_id: Option<String>,
  #[serde(default)]
  pub created: Option<String>,
  #[serde(default)]
  pub last_used: Option<String>,
}

/// Response to a delete.
#[derive(Debug, Clone, Deserialize)]
pub struct DeletedApplicationPassword {
  pub deleted: bool,
}

/// The subset of `/wp/v2/users/me?context=edit` we read.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUser {
  pub username: String,
}

/// WordPress.com wraps proxied responses in a `data` envelope when asked
/// for JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyEnvelope<T> {
  pub data: T,
}
