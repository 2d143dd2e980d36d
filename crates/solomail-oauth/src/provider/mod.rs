//! `OAuth2` provider configuration.

use crate::error::{Error, Result};
use url::Url;

/// Microsoft identity platform authority for personal accounts.
pub const CONSUMERS_AUTHORITY: &str = "https://login.microsoftonline.com/consumers";

/// `OAuth2` provider configuration.
///
/// Endpoints are derived from a tenant *authority* URL, e.g.
/// `https://login.microsoftonline.com/consumers` →
/// `{authority}/oauth2/v2.0/authorize` and `{authority}/oauth2/v2.0/token`.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Provider name (e.g., "Microsoft").
    pub name: String,
    /// Tenant authority URL.
    pub authority: Url,
    /// Authorization endpoint URL.
    pub auth_url: Url,
    /// Token endpoint URL.
    pub token_url: Url,
    /// Default scopes.
    pub default_scopes: Vec<String>,
}

impl Provider {
    /// Creates a provider from a tenant authority URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the authority URL is invalid.
    pub fn from_authority(name: impl Into<String>, authority: impl AsRef<str>) -> Result<Self> {
        let base = authority.as_ref().trim_end_matches('/');
        Ok(Self {
            name: name.into(),
            authority: Url::parse(base)?,
            auth_url: Url::parse(&format!("{base}/oauth2/v2.0/authorize"))?,
            token_url: Url::parse(&format!("{base}/oauth2/v2.0/token"))?,
            default_scopes: Vec::new(),
        })
    }

    /// Microsoft identity platform configuration for personal accounts.
    ///
    /// Scopes:
    /// - `User.Read` - Read user profile
    /// - `Mail.Read` - Read the user's mail
    /// - `Mail.Send` - Send mail on behalf of the user
    /// - `offline_access` - Refresh tokens for persistent access
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn microsoft_consumers() -> Result<Self> {
        Ok(Self::from_authority("Microsoft", CONSUMERS_AUTHORITY)?.with_default_scopes(vec![
            "User.Read".to_string(),
            "Mail.Read".to_string(),
            "Mail.Send".to_string(),
            "offline_access".to_string(),
        ]))
    }

    /// Sets the default scopes.
    #[must_use]
    pub fn with_default_scopes(mut self, scopes: Vec<String>) -> Self {
        self.default_scopes = scopes;
        self
    }

    /// Validates that required URLs are set.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.auth_url.as_str().is_empty() {
            return Err(Error::InvalidConfig("auth_url is empty".into()));
        }
        if self.token_url.as_str().is_empty() {
            return Err(Error::InvalidConfig("token_url is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn microsoft_consumers_provider() {
        let provider = Provider::microsoft_consumers().unwrap();
        assert_eq!(provider.name, "Microsoft");
        assert_eq!(
            provider.auth_url.as_str(),
            "https://login.microsoftonline.com/consumers/oauth2/v2.0/authorize"
        );
        assert_eq!(
            provider.token_url.as_str(),
            "https://login.microsoftonline.com/consumers/oauth2/v2.0/token"
        );
        assert_eq!(provider.default_scopes.len(), 4);
        provider.validate().unwrap();
    }

    #[test]
    fn from_authority_tolerates_trailing_slash() {
        let a = Provider::from_authority("A", "https://login.example.com/tenant/").unwrap();
        let b = Provider::from_authority("B", "https://login.example.com/tenant").unwrap();
        assert_eq!(a.token_url, b.token_url);
    }

    #[test]
    fn custom_authority() {
        let provider =
            Provider::from_authority("Contoso", "https://login.microsoftonline.com/contoso.com")
                .unwrap()
                .with_default_scopes(vec!["Mail.Read".to_string()]);
        assert_eq!(provider.default_scopes.len(), 1);
        assert!(
            provider
                .token_url
                .as_str()
                .ends_with("contoso.com/oauth2/v2.0/token")
        );
        provider.validate().unwrap();
    }
}
