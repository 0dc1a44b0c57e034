//! # Site Command
//!
//! Manage the registry of sites apppass knows how to reach.

use anyhow::Result;
use apppass_core::{Site, SiteOrigin, SiteRegistry, get_config_dirs};
use clap::{Args, Subcommand};

use crate::utils::output::{format_origin, format_site_url, print_info, print_success, print_warning};

/// Command for site registry management
#[derive(Args)]
pub struct SiteArgs {
  /// The subcommand to execute
  #[command(subcommand)]
  pub subcommand: SiteSubcommands,
}

/// Subcommands for the site command
#[derive(Subcommand)]
pub enum SiteSubcommands {
  /// Register a site, replacing any previous entry for the same URL
  #[command(alias = "register")]
  Add(AddArgs),

  /// List registered sites
  #[command(alias = "ls")]
  List,

  /// Remove a site from the registry
  #[command(alias = "rm")]
  Remove {
    /// Site URL
    url: String,
  },
}

#[derive(Args)]
pub struct AddArgs {
  /// Site URL
  pub url: String,

  /// WordPress.com site id of a Jetpack-connected site
  #[arg(long, value_name = "ID", conflicts_with_all = ["username", "password"])]
  pub jetpack: Option<u64>,

  /// Primary username of a self-hosted site
  #[arg(long, short = 'u', requires = "password")]
  pub username: Option<String>,

  /// Primary password of a self-hosted site
  #[arg(long, short = 'p', requires = "username")]
  pub password: Option<String>,
}

pub(crate) fn handle_site_command(site: SiteArgs) -> Result<()> {
  match site.subcommand {
    SiteSubcommands::Add(args) => handle_add_command(args),
    SiteSubcommands::List => handle_list_command(),
    SiteSubcommands::Remove { url } => handle_remove_command(&url),
  }
}

fn handle_add_command(args: AddArgs) -> Result<()> {
  let origin = match (args.jetpack, args.username, args.password) {
    (Some(site_id), _, _) => SiteOrigin::JetpackConnected { site_id },
    (None, Some(username), Some(password)) => SiteOrigin::SelfHosted { username, password },
    _ => {
      return Err(anyhow::anyhow!(
        "Specify either --jetpack <ID> or --username and --password"
      ));
    }
  };

  let site = Site::new(&args.url, origin)?;
  let config_dirs = get_config_dirs()?;
  config_dirs.init()?;

  let mut registry = SiteRegistry::load(&config_dirs)?;
  registry.add(site.clone());
  registry.save(&config_dirs)?;

  print_success(&format!(
    "Registered {} site {}",
    format_origin(site.origin.label()),
    format_site_url(site.url())
  ));
  Ok(())
}

fn handle_list_command() -> Result<()> {
  let registry = SiteRegistry::load(&get_config_dirs()?)?;

  if registry.sites().is_empty() {
    print_info("No sites registered.");
    return Ok(());
  }

  for site in registry.sites() {
    let detail = match &site.origin {
      SiteOrigin::JetpackConnected { site_id } => format!("site id {site_id}"),
      SiteOrigin::SelfHosted { username, .. } => format!("user {username}"),
    };
    println!(
      "{} ({}, {detail})",
      format_site_url(site.url()),
      format_origin(site.origin.label())
    );
  }
  Ok(())
}

fn handle_remove_command(url: &str) -> Result<()> {
  let config_dirs = get_config_dirs()?;
  let mut registry = SiteRegistry::load(&config_dirs)?;

  if registry.remove(url)? {
    registry.save(&config_dirs)?;
    print_success(&format!("Removed {}", format_site_url(url)));
  } else {
    print_warning(&format!("Site {} is not registered", format_site_url(url)));
  }
  Ok(())
}
