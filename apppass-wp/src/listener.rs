//! Lifecycle notifications for the embedding application.

use apppass_core::Site;

use crate::error::WpApiError;

/// Observer of credential lifecycle events.
///
/// Callbacks run inline on the request path and must return quickly.
pub trait ApplicationPasswordsListener: Send + Sync {
  /// `site` does not offer application passwords.
  fn on_feature_unavailable(&self, site: &Site, error: &WpApiError);

  /// A password was minted. `is_password_regenerated` is true when it
  /// replaces one the server just rejected.
  fn on_new_password_created(&self, is_password_regenerated: bool);
}
