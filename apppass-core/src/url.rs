//! URL helpers shared across crates.
//!
//! Site URLs arrive from users, config files and authorization callbacks in
//! many shapes (`example.com`, `HTTPS://Example.com/`, `http:/example.com`).
//! Everything that keys on a site goes through [`normalize_site_url`] so the
//! same installation always maps to the same credential record.

use anyhow::Result;
use url::{Position, Url};

/// Render a URL without the trailing "/" that `url` adds to bare hosts, and
/// without any trailing slash on sub-directory installs.
fn render_without_trailing_slash(url: &Url) -> String {
  let mut result = String::new();
  result.push_str(&url[..Position::BeforePath]);

  let path = url.path().trim_end_matches('/');
  result.push_str(path);
  result
}

/// Parse a URL by prefixing it with https:// scheme.
fn parse_with_https_prefix(input: &str) -> Result<Url> {
  let mut candidate = input;

  if let Some(colon_index) = input.find(':') {
    let potential_scheme = &input[..colon_index];
    if ["http", "https"]
      .iter()
      .any(|scheme| potential_scheme.eq_ignore_ascii_case(scheme))
    {
      let remainder = input[colon_index + 1..].trim_start_matches('/');
      if !remainder.is_empty() {
        candidate = remainder;
      }
    }
  }

  let with_scheme = format!("https://{candidate}");
  Url::parse(&with_scheme).map_err(|_| anyhow::anyhow!("Failed to parse URL: '{input}'. Ensure it has a valid scheme."))
}

/// Parse a user-supplied site address into a [`Url`].
///
/// If the input doesn't include a scheme, assumes https://. Also handles
/// malformed schemes like "http:/example.com" (missing slash), keeping the
/// scheme the user asked for.
pub fn parse_site_url(input: &str) -> Result<Url> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    return Err(anyhow::anyhow!("Site URL cannot be empty"));
  }

  let lowered = trimmed.to_ascii_lowercase();
  for scheme in ["http", "https"] {
    let bare = format!("{scheme}:");
    let full = format!("{scheme}://");
    if lowered.starts_with(&bare) && !lowered.starts_with(&full) {
      let remainder = trimmed.split_once(':').map(|(_, rest)| rest).unwrap_or("");
      let mut url = parse_with_https_prefix(remainder.trim_start_matches('/'))?;
      url
        .set_scheme(scheme)
        .map_err(|()| anyhow::anyhow!("Failed to apply scheme '{scheme}' to '{input}'"))?;
      return Ok(url);
    }
  }

  if let Ok(url) = Url::parse(trimmed) {
    // "localhost:8080" parses as scheme "localhost"; only trust real hosts.
    if url.scheme().len() > 1 && url.host().is_some() {
      return Ok(url);
    }
  }

  parse_with_https_prefix(trimmed)
}

/// Normalize a site URL into the canonical form used as a storage key.
///
/// The scheme defaults to https, the host is lower-cased, and trailing
/// slashes are dropped. Queries and fragments never identify a site and are
/// removed.
pub fn normalize_site_url(input: &str) -> Result<String> {
  let mut url = parse_site_url(input)?;
  url.set_query(None);
  url.set_fragment(None);
  Ok(render_without_trailing_slash(&url))
}

/// Join a site URL with a REST route under `/wp-json`.
///
/// The route may be given with or without its leading slash.
pub fn rest_url(site_url: &str, route: &str) -> String {
  let base = site_url.trim_end_matches('/');
  let route = route.trim_start_matches('/');
  format!("{base}/wp-json/{route}")
}
