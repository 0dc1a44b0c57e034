//! # Request Command
//!
//! Send one authenticated request to a site's WP REST API and print the
//! JSON response.

use anyhow::{Context, Result};
use apppass_wp::{ApiRequest, TransportError, WpApiResponse};
use clap::Args;
use reqwest::Method;
use serde_json::Value;
use tokio::runtime::Runtime;

use crate::context::AppContext;
use crate::utils::output::{format_command, format_site_url, print_error};

/// Command for authenticated requests
#[derive(Args)]
pub struct RequestArgs {
  /// Site URL
  pub site: String,

  /// Route below /wp-json, for example /wp/v2/posts
  pub path: String,

  /// HTTP method
  #[arg(long, short = 'X', default_value = "GET")]
  pub method: String,

  /// JSON request body
  #[arg(long, short = 'd')]
  pub body: Option<String>,

  /// Query parameter as key=value (can be used multiple times)
  #[arg(long = "query", short = 'q', value_name = "KEY=VALUE")]
  pub query: Vec<String>,
}

pub(crate) fn handle_request_command(args: RequestArgs) -> Result<()> {
  let request = build_request(&args)?;
  let context = AppContext::load()?;
  let site = context.find_site(&args.site)?;
  let transport = context.transport()?;
  let rt = Runtime::new().context("Failed to create tokio runtime")?;

  match rt.block_on(transport.execute::<Value>(&site, &request)) {
    WpApiResponse::Success(value) => {
      println!("{}", serde_json::to_string_pretty(&value)?);
      Ok(())
    }
    WpApiResponse::Error(error) => {
      if let TransportError::FeatureUnavailable(_) = &error {
        print_error(&format!(
          "{} does not support application passwords",
          format_site_url(site.url())
        ));
      } else if error.api_error().is_unauthorized() {
        print_error(&format!(
          "The site rejected a freshly created password. Check the account with {}",
          format_command("apppass creds delete")
        ));
      }
      Err(error.into())
    }
  }
}

fn build_request(args: &RequestArgs) -> Result<ApiRequest> {
  let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
    .with_context(|| format!("Invalid HTTP method '{}'", args.method))?;

  let mut request = ApiRequest::new(method, args.path.clone());
  for pair in &args.query {
    let (key, value) = pair
      .split_once('=')
      .with_context(|| format!("Query parameter '{pair}' must look like key=value"))?;
    request = request.with_query(key, value);
  }
  if let Some(body) = &args.body {
    let body: Value = serde_json::from_str(body).context("Request body is not valid JSON")?;
    request = request.with_body(body);
  }

  Ok(request)
}
