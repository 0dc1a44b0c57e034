//! # Command Line Interface
//!
//! Defines the CLI structure and command handlers for apppass.

mod creds;
mod init;
mod login;
mod request;
mod site;

use anyhow::Result;
use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{ArgAction, Parser, Subcommand};

use crate::utils::output::ColorMode;

/// Top-level CLI command for apppass
#[derive(Parser)]
#[command(name = "apppass")]
#[command(display_name = "🔑 Apppass")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(about = "WordPress application-password manager")]
#[command(
  long_about = "Apppass mints, stores and revokes WordPress application passwords.\n\n\
        It keeps one password per registered site, creates it on first use, and\n\
        replaces it transparently when the site revokes it. Jetpack-connected sites\n\
        are reached through WordPress.com; self-hosted sites are called directly."
)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
#[command(subcommand_required(true))]
#[command(disable_help_subcommand = true)]
#[command(max_term_width = 120)]
#[command(styles = Styles::styled()
    .header(AnsiColor::BrightGreen.on_default().bold().underline())
    .usage(AnsiColor::Green.on_default().bold())
    .literal(AnsiColor::BrightGreen.on_default().bold())
    .placeholder(AnsiColor::BrightWhite.on_default().italic())
    .valid(AnsiColor::Green.on_default())
    .invalid(AnsiColor::BrightRed.on_default().bold())
)]
pub struct Cli {
  /// Sets the level of verbosity (can be used multiple times)
  #[arg(
    short = 'v',
    long = "verbose",
    action = ArgAction::Count,
    global = true,
    long_help = "Sets the level of verbosity for tracing and logging output.\n\n\
             -v: Show info level messages\n\
             -vv: Show debug level messages\n\
             -vvv: Show trace level messages"
  )]
  pub verbose: u8,

  /// Controls when colored output is used
  #[arg(
    long,
    value_enum,
    ignore_case = true,
    global = true,
    default_value_t = ColorMode::Auto,
  )]
  pub colors: ColorMode,

  /// Subcommands
  #[command(subcommand)]
  pub command: Commands,
}

/// Subcommands for apppass
#[derive(Subcommand)]
pub enum Commands {
  /// Application password management
  #[command(long_about = "Obtain, revoke and inspect application passwords.\n\n\
            Passwords are stored one per site in credentials.json in the data\n\
            directory, readable only by you.")]
  #[command(arg_required_else_help = true)]
  Creds(creds::CredsArgs),

  /// Initialize apppass configuration
  #[command(long_about = "Creates the configuration and data directories and a default\n\
            config.toml if none exists yet.")]
  Init,

  /// Browser authorization flow
  #[command(long_about = "Obtain an application password by approving it in the browser.\n\n\
            Print the authorization URL for a site, then hand the redirect you\n\
            were sent to back to apppass to store the approved password.")]
  #[command(arg_required_else_help = true)]
  Login(login::LoginArgs),

  /// Send an authenticated REST request
  #[command(long_about = "Sends a request to a site's WP REST API with its application password.\n\n\
            The password is created on first use. If the site rejects it, a new one\n\
            is minted and the request is sent once more. The JSON response is\n\
            printed to stdout.")]
  #[command(alias = "req")]
  Request(request::RequestArgs),

  /// Site registry management
  #[command(long_about = "Register the WordPress sites apppass may create passwords for.\n\n\
            Jetpack-connected sites are identified by their WordPress.com site id;\n\
            self-hosted sites need the account's primary username and password.")]
  #[command(arg_required_else_help = true)]
  Site(site::SiteArgs),
}

/// Handle the parsed command line
pub fn handle_cli(cli: Cli) -> Result<()> {
  match cli.colors {
    ColorMode::Always | ColorMode::Yes => owo_colors::set_override(true),
    ColorMode::Never | ColorMode::No => owo_colors::set_override(false),
    ColorMode::Auto => {}
  }

  match cli.command {
    Commands::Creds(creds) => creds::handle_creds_command(creds),
    Commands::Init => init::handle_init_command(),
    Commands::Login(login) => login::handle_login_command(login),
    Commands::Request(request) => request::handle_request_command(request),
    Commands::Site(site) => site::handle_site_command(site),
  }
}
