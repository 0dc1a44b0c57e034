//! # Login Command
//!
//! The browser authorization flow: print the URL that asks the user to
//! approve a new application password, then store what the site redirects
//! back with.

use anyhow::{Context, Result};
use apppass_core::{CredentialStore, SiteRegistry, url::normalize_site_url};
use apppass_wp::consts::DEFAULT_SUCCESS_URL;
use apppass_wp::login::{authorization_url, discover_authorization_url, parse_authorization_callback};
use clap::{Args, Subcommand};
use tokio::runtime::Runtime;

use crate::context::AppContext;
use crate::utils::output::{format_command, format_site_url, print_info, print_success, print_warning};

/// Command for the browser authorization flow
#[derive(Args)]
pub struct LoginArgs {
  /// The subcommand to execute
  #[command(subcommand)]
  pub subcommand: LoginSubcommands,
}

/// Subcommands for the login command
#[derive(Subcommand)]
pub enum LoginSubcommands {
  /// Print the authorization URL for a site
  Url {
    /// Site URL
    site: String,

    /// Where the site redirects after the user decides
    #[arg(long, default_value = DEFAULT_SUCCESS_URL)]
    success_url: String,
  },

  /// Store the password from an authorization redirect
  Callback {
    /// The full redirect URL
    url: String,
  },
}

pub(crate) fn handle_login_command(login: LoginArgs) -> Result<()> {
  let context = AppContext::load()?;

  match login.subcommand {
    LoginSubcommands::Url { site, success_url } => handle_url_command(&context, &site, &success_url),
    LoginSubcommands::Callback { url } => handle_callback_command(&context, &url),
  }
}

fn handle_url_command(context: &AppContext, site: &str, success_url: &str) -> Result<()> {
  let site_url = normalize_site_url(site)?;
  let app_name = context.settings.passwords_configuration().application_name()?.to_string();
  let rt = Runtime::new().context("Failed to create tokio runtime")?;

  let endpoint = rt
    .block_on(discover_authorization_url(&context.client, &site_url))
    .with_context(|| format!("Failed to discover the authorization screen of {site_url}"))?;

  print_info(&format!(
    "Open this URL to approve '{app_name}' on {}, then pass the redirect to {}:",
    format_site_url(&site_url),
    format_command("apppass login callback")
  ));
  println!("{}", authorization_url(&endpoint, &app_name, success_url));
  Ok(())
}

fn handle_callback_command(context: &AppContext, url: &str) -> Result<()> {
  let callback = parse_authorization_callback(url)?;

  let Some((site, credentials)) = callback.into_site_credentials()? else {
    print_warning("The authorization request was rejected; nothing was stored.");
    return Ok(());
  };

  context.config_dirs.init()?;
  let mut registry = SiteRegistry::load(&context.config_dirs)?;
  if registry.find(site.url())?.is_none() {
    registry.add(site.clone());
    registry.save(&context.config_dirs)?;
  }
  context.store.save(&site, &credentials)?;

  print_success(&format!(
    "Stored application password for {} as {}",
    format_site_url(site.url()),
    credentials.user_name
  ));
  Ok(())
}
