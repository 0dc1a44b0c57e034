//! # Init Command
//!
//! Creates the configuration directories and a default `config.toml`.

use anyhow::Result;
use apppass_core::{Settings, get_config_dirs};

use crate::utils::output::{format_path, print_info, print_success};

pub(crate) fn handle_init_command() -> Result<()> {
  let config_dirs = get_config_dirs()?;
  config_dirs.init()?;

  let settings_path = config_dirs.settings_path();
  if settings_path.exists() {
    print_info(&format!(
      "Keeping existing settings at {}",
      format_path(&settings_path.display().to_string())
    ));
  } else {
    config_dirs.save_settings(&Settings::default())?;
  }

  print_success("Initialized apppass configuration directories:");
  println!(
    "  Config: {}",
    format_path(&config_dirs.config_dir.display().to_string())
  );
  println!("  Data: {}", format_path(&config_dirs.data_dir.display().to_string()));

  Ok(())
}
