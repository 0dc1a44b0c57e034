//! # Apppass Core Library
//!
//! Shared data model and persistence for the apppass workspace: the site
//! description, application-password credentials, the credential stores that
//! hold one record per site, and the configuration that tells the rest of
//! the workspace which application name to mint passwords under.

pub mod config;
pub mod creds;
pub mod site;
pub mod url;

// Re-export main types
pub use config::{ApplicationPasswordsConfiguration, ConfigDirs, ConfigurationError, Settings, get_config_dirs};
pub use creds::{ApplicationPasswordCredentials, CredentialStore, FileCredentialStore, InMemoryCredentialStore};
pub use site::{Site, SiteKey, SiteOrigin, SiteRegistry};
