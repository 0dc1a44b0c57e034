//! Constants for the apppass-wp client.

/// User-Agent header value for every request the client sends
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// WP REST route of the current user's application passwords
pub const APPLICATION_PASSWORDS_ROUTE: &str = "wp/v2/users/me/application-passwords";

/// WP REST route describing the application password used to authenticate
pub const INTROSPECT_ROUTE: &str = "wp/v2/users/me/application-passwords/introspect";

/// WP REST route of the current user, with the fields only the owner sees
pub const CURRENT_USER_ROUTE: &str = "wp/v2/users/me?context=edit";

/// API error code WordPress returns when application passwords are turned off
pub const APPLICATION_PASSWORDS_DISABLED: &str = "application_passwords_disabled";

/// Default redirect the authorization screen sends approved credentials to
pub const DEFAULT_SUCCESS_URL: &str = "apppass://app-pass-authorize";

/// Path of the browser authorization screen, relative to the site root
pub const AUTHORIZE_APPLICATION_PATH: &str = "wp-admin/authorize-application.php";
