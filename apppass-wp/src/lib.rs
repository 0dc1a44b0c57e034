//! # Apppass WordPress Client
//!
//! The credential lifecycle for WordPress application passwords and the
//! HTTP path that depends on it:
//!
//! - [`adapter`] mints and revokes passwords on Jetpack-connected and
//!   self-hosted sites
//! - [`manager`] keeps one password per site, creating it at most once at a
//!   time and recovering from name conflicts
//! - [`transport`] attaches the password to REST requests and regenerates it
//!   once when the server rejects it
//! - [`login`] covers the browser authorization flow

pub mod adapter;
pub mod client;
pub mod consts;
pub mod error;
pub mod listener;
pub mod login;
pub mod manager;
pub mod models;
pub mod transport;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use adapter::{DeleteTarget, JetpackAdapter, SelfHostedAdapter, SiteAdapters, SiteOriginAdapter};
pub use client::build_http_client;
pub use error::WpApiError;
pub use listener::ApplicationPasswordsListener;
pub use login::{AuthorizationCallback, CallbackError};
pub use manager::{ApplicationPasswordsManager, CreationResult, DeletionResult};
pub use transport::{ApiRequest, AuthenticatedTransport, TransportError, WpApiResponse};
