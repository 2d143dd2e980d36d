//! Application configuration.
//!
//! A deployment of this client is defined by a handful of constants: the
//! one address allowed to sign in, the app registration, and the inbox
//! paging limits. Everything else is derived.

use crate::error::{Error, Result};
use url::Url;

/// Default number of messages per inbox page.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Default hard bound on cached inbox messages (8 pages).
pub const DEFAULT_MAX_CACHED_MESSAGES: usize = 200;

/// Scopes requested at sign-in.
///
/// The OIDC scopes (`openid`, `profile`, `email`) are listed explicitly so
/// the token endpoint returns an ID token to verify the identity against
/// the allowed address; the Graph scopes mirror what the mail operations
/// need; `offline_access` yields the refresh token silent acquisition
/// depends on.
pub const DEFAULT_SCOPES: &[&str] = &[
    "openid",
    "profile",
    "email",
    "User.Read",
    "Mail.Read",
    "Mail.Send",
    "offline_access",
];

/// Configuration for one deployment of the client.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// The only email address allowed to sign in, verified after every
    /// successful authentication.
    pub allowed_email: String,
    /// OAuth client (application) ID.
    pub client_id: String,
    /// Identity platform tenant authority.
    pub authority: String,
    /// Graph API base URL.
    pub graph_base_url: String,
    /// Delegated scopes requested at sign-in.
    pub scopes: Vec<String>,
    /// Redirect URI registered for the app.
    pub redirect_uri: String,
    /// Messages per inbox page.
    pub page_size: usize,
    /// Hard bound on cached inbox messages.
    pub max_cached_messages: usize,
}

impl AppConfig {
    /// Creates a configuration with defaults for everything but the two
    /// deployment-specific values.
    #[must_use]
    pub fn new(allowed_email: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            allowed_email: allowed_email.into(),
            client_id: client_id.into(),
            authority: solomail_oauth::provider::CONSUMERS_AUTHORITY.to_string(),
            graph_base_url: solomail_graph::DEFAULT_BASE_URL.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(ToString::to_string).collect(),
            redirect_uri: "http://localhost:8845".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            max_cached_messages: DEFAULT_MAX_CACHED_MESSAGES,
        }
    }

    /// Sets the tenant authority.
    #[must_use]
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into();
        self
    }

    /// Sets the Graph base URL.
    #[must_use]
    pub fn with_graph_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.graph_base_url = base_url.into();
        self
    }

    /// Sets the redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }

    /// Sets the inbox page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the cache capacity bound.
    #[must_use]
    pub const fn with_max_cached_messages(mut self, max: usize) -> Self {
        self.max_cached_messages = max;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if !self.allowed_email.contains('@') {
            return Err(Error::Config(format!(
                "allowed_email is not an address: {:?}",
                self.allowed_email
            )));
        }
        if self.client_id.is_empty() {
            return Err(Error::Config("client_id is empty".into()));
        }
        Url::parse(&self.authority).map_err(|e| Error::Config(format!("authority: {e}")))?;
        Url::parse(&self.graph_base_url)
            .map_err(|e| Error::Config(format!("graph_base_url: {e}")))?;
        if self.page_size == 0 {
            return Err(Error::Config("page_size must be positive".into()));
        }
        if self.max_cached_messages == 0 {
            return Err(Error::Config("max_cached_messages must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AppConfig::new("user@example.com", "client-id");
        assert_eq!(config.page_size, 25);
        assert_eq!(config.max_cached_messages, 200);
        assert!(config.authority.contains("login.microsoftonline.com"));
        assert!(config.scopes.iter().any(|s| s == "openid"));
        assert!(config.scopes.iter().any(|s| s == "offline_access"));
        config.validate().unwrap();
    }

    #[test]
    fn rejects_bad_values() {
        assert!(
            AppConfig::new("not-an-address", "id")
                .validate()
                .is_err()
        );
        assert!(AppConfig::new("a@b.com", "").validate().is_err());
        assert!(
            AppConfig::new("a@b.com", "id")
                .with_authority("not a url")
                .validate()
                .is_err()
        );
        assert!(
            AppConfig::new("a@b.com", "id")
                .with_page_size(0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn builder_overrides() {
        let config = AppConfig::new("a@b.com", "id")
            .with_page_size(10)
            .with_max_cached_messages(50)
            .with_redirect_uri("http://localhost:9000");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.max_cached_messages, 50);
        assert_eq!(config.redirect_uri, "http://localhost:9000");
        config.validate().unwrap();
    }
}
