//! # Credentials Command
//!
//! Obtain, revoke and inspect the application passwords held for each site.

use anyhow::{Context, Result};
use apppass_core::CredentialStore;
use apppass_wp::{CreationResult, DeletionResult};
use clap::{Args, Subcommand};
use tokio::runtime::Runtime;

use crate::context::AppContext;
use crate::utils::output::{format_site_url, mask_secret, print_error, print_info, print_success, print_warning};

/// Command for application password management
#[derive(Args)]
pub struct CredsArgs {
  /// The subcommand to execute
  #[command(subcommand)]
  pub subcommand: CredsSubcommands,
}

/// Subcommands for the creds command
#[derive(Subcommand)]
pub enum CredsSubcommands {
  /// Return the site's password, creating it if needed
  #[command(long_about = "Returns the stored application password for a site.\n\n\
            If none is stored yet, one is created on the site and saved.")]
  Get {
    /// Site URL
    site: String,

    /// Print the password instead of masking it
    #[arg(long)]
    show: bool,
  },

  /// Revoke the site's password on the server and forget it
  #[command(long_about = "Revokes the site's application password on the server.\n\n\
            When no password is stored locally, the password created under the\n\
            configured application name is looked up on the site and revoked.")]
  Delete {
    /// Site URL
    site: String,
  },

  /// Forget the stored password without contacting the server
  Forget {
    /// Site URL
    site: String,
  },

  /// List stored passwords
  #[command(alias = "ls")]
  List,

  /// Forget every stored password without contacting any server
  Clear,
}

pub(crate) fn handle_creds_command(creds: CredsArgs) -> Result<()> {
  let context = AppContext::load()?;

  match creds.subcommand {
    CredsSubcommands::Get { site, show } => handle_get_command(&context, &site, show),
    CredsSubcommands::Delete { site } => handle_delete_command(&context, &site),
    CredsSubcommands::Forget { site } => handle_forget_command(&context, &site),
    CredsSubcommands::List => handle_list_command(&context),
    CredsSubcommands::Clear => handle_clear_command(&context),
  }
}

fn handle_get_command(context: &AppContext, url: &str, show: bool) -> Result<()> {
  let site = context.find_site(url)?;
  let manager = context.manager()?;
  let rt = Runtime::new().context("Failed to create tokio runtime")?;

  let (credentials, created) = match rt.block_on(manager.get_application_credentials(&site)) {
    CreationResult::Existing(credentials) => (credentials, false),
    CreationResult::Created(credentials) => (credentials, true),
    CreationResult::NotSupported(error) => {
      return Err(anyhow::anyhow!(
        "{} does not support application passwords: {error}",
        site.url()
      ));
    }
    CreationResult::Failure(error) => {
      return Err(anyhow::anyhow!(
        "Failed to create an application password for {}: {error}",
        site.url()
      ));
    }
  };

  if created {
    print_success(&format!(
      "Created application password '{}' for {}",
      manager.application_name(),
      format_site_url(site.url())
    ));
  } else {
    print_info(&format!("Using stored application password for {}", format_site_url(site.url())));
  }

  let password = if show {
    credentials.password.clone()
  } else {
    mask_secret(&credentials.password)
  };
  println!("  User: {}", credentials.user_name);
  println!("  Password: {password}");
  if let Some(uuid) = &credentials.uuid {
    println!("  UUID: {uuid}");
  }
  Ok(())
}

fn handle_delete_command(context: &AppContext, url: &str) -> Result<()> {
  let site = context.find_site(url)?;
  let manager = context.manager()?;
  let rt = Runtime::new().context("Failed to create tokio runtime")?;

  match rt.block_on(manager.delete_application_credentials(&site)) {
    DeletionResult::Success => {
      print_success(&format!("Revoked application password for {}", format_site_url(site.url())));
      Ok(())
    }
    DeletionResult::Failure(error) => {
      print_error(&format!("Failed to revoke application password: {error}"));
      Err(anyhow::anyhow!("Deletion failed for {}", site.url()))
    }
  }
}

fn handle_forget_command(context: &AppContext, url: &str) -> Result<()> {
  let site = context.find_site(url)?;

  if context.store.get(&site)?.is_none() {
    print_warning(&format!("No stored password for {}", format_site_url(site.url())));
    return Ok(());
  }

  let manager = context.manager()?;
  let rt = Runtime::new().context("Failed to create tokio runtime")?;
  rt.block_on(manager.delete_local_application_password(&site))?;

  print_success(&format!("Forgot stored password for {}", format_site_url(site.url())));
  Ok(())
}

fn handle_list_command(context: &AppContext) -> Result<()> {
  let records = context.store.list()?;

  if records.is_empty() {
    print_info("No stored application passwords.");
    return Ok(());
  }

  for (key, credentials) in records {
    println!(
      "{} {} {}",
      format_site_url(key.as_str()),
      credentials.user_name,
      credentials.uuid.as_deref().unwrap_or("-")
    );
  }
  Ok(())
}

fn handle_clear_command(context: &AppContext) -> Result<()> {
  let removed = context.store.clear()?;
  print_success(&format!("Forgot {removed} stored application password(s)"));
  Ok(())
}
