//! Shared HTTP plumbing.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::consts::USER_AGENT;
use crate::error::WpApiError;

/// Build the HTTP client every adapter and the transport share.
pub fn build_http_client(timeout: Duration) -> Result<Client, WpApiError> {
  Ok(Client::builder().user_agent(USER_AGENT).timeout(timeout).build()?)
}

/// Decode a JSON response body, turning non-success statuses into
/// [`WpApiError::Http`]. An empty body decodes as JSON `null`.
pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, WpApiError> {
  if !response.status().is_success() {
    return Err(WpApiError::from_response(response).await);
  }

  let url = response.url().clone();
  let body = response.text().await?;
  let body = if body.trim().is_empty() { "null" } else { body.as_str() };

  serde_json::from_str(body).map_err(|e| WpApiError::UnexpectedResponse(format!("{url}: {e}")))
}
