//! The identity gate.

use solomail_oauth::{AuthorizationCodeFlow, OAuthClient, Provider, Token};
use tracing::{debug, info, warn};
use url::Url;

use super::session::{AccountIdentity, Session, SessionStore};
use crate::config::AppConfig;
use crate::error::Result;

/// Outcome of a token acquisition attempt.
///
/// Success, recoverable failure, user cancellation and the terminal
/// wrong-account case are distinct variants because the caller reacts
/// differently to each; provider and transport errors are folded into
/// [`AuthOutcome::Failed`] at the gate boundary and never propagate.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    /// A token was acquired and the identity is the allowed one.
    Authorized(Token),
    /// The user aborted the interactive flow. Not an error.
    Cancelled,
    /// The authenticated identity is not the allowed account. The gate has
    /// already signed it out; the session is over.
    UnauthorizedAccount {
        /// Fixed explanation naming the allowed address.
        message: String,
    },
    /// The operation failed; the caller may retry or fall back to
    /// interactive sign-in.
    Failed {
        /// Human-readable description.
        message: String,
    },
}

/// Result of presenting an authorization URL to the user.
#[derive(Debug, Clone)]
pub enum PromptResult {
    /// The redirect came back with an authorization code.
    Code(String),
    /// The user backed out of the flow.
    Cancelled,
    /// The flow could not be run (browser failed to open, listener died).
    Failed(String),
}

/// The UI-side collaborator that runs the interactive part of sign-in:
/// present the authorization URL, capture the redirect, hand back the code.
#[allow(async_fn_in_trait)]
pub trait SignInPrompt {
    /// Presents `auth_url` to the user and waits for the redirect code.
    async fn obtain_code(&self, auth_url: &Url) -> PromptResult;
}

/// Gate in front of the OAuth client that admits exactly one identity.
///
/// Holds the process's only signed-in session. Every operation that could
/// establish an identity re-checks it against the allowed address and
/// purges anything else.
#[derive(Debug)]
pub struct IdentityGate<S> {
    client: OAuthClient,
    allowed_email: String,
    store: S,
    session: Option<Session>,
}

impl<S: SessionStore> IdentityGate<S> {
    /// Constructs the OAuth client and restores any persisted session.
    ///
    /// A persisted session for a different address is signed out silently:
    /// the gate comes up successfully with no active identity rather than
    /// surfacing a stale foreign session as an error.
    ///
    /// Re-initializing over the same store preserves the current identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the session
    /// store cannot be read.
    pub fn initialize(config: &AppConfig, store: S) -> Result<Self> {
        config.validate()?;

        let provider = Provider::from_authority("Microsoft", &config.authority)
            .map(|p| p.with_default_scopes(config.scopes.clone()))?;
        let client = OAuthClient::new(config.client_id.clone(), provider)
            .with_redirect_uri(config.redirect_uri.clone());

        let mut gate = Self {
            client,
            allowed_email: config.allowed_email.clone(),
            store,
            session: None,
        };
        gate.restore_session()?;
        Ok(gate)
    }

    fn restore_session(&mut self) -> Result<()> {
        match self.store.load()? {
            Some(session) if self.is_allowed(&session.identity.username) => {
                debug!(username = %session.identity.username, "Restored persisted session");
                self.session = Some(session);
            }
            Some(session) => {
                warn!(
                    username = %session.identity.username,
                    "Persisted session is not the allowed account; signing it out"
                );
                if let Err(e) = self.store.clear() {
                    warn!("Failed to purge foreign session: {e}");
                }
            }
            None => debug!("No persisted session"),
        }
        Ok(())
    }

    /// Whether an identity is currently active.
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// The active identity, if any.
    #[must_use]
    pub fn current_identity(&self) -> Option<&AccountIdentity> {
        self.session.as_ref().map(|s| &s.identity)
    }

    fn is_allowed(&self, username: &str) -> bool {
        username.eq_ignore_ascii_case(&self.allowed_email)
    }

    /// Runs the interactive sign-in flow through the given prompt.
    ///
    /// On success the returned identity is validated against the allowed
    /// address; any other account is signed out immediately and reported as
    /// [`AuthOutcome::UnauthorizedAccount`].
    pub async fn sign_in_interactive(&mut self, prompt: &impl SignInPrompt) -> AuthOutcome {
        let flow = AuthorizationCodeFlow::new(self.client.clone()).with_pkce();
        let auth_url = match flow.authorization_url(None, None) {
            Ok(url) => url,
            Err(e) => {
                return AuthOutcome::Failed {
                    message: format!("Sign-in error: {e}"),
                };
            }
        };

        let code = match prompt.obtain_code(&auth_url).await {
            PromptResult::Code(code) => code,
            PromptResult::Cancelled => {
                debug!("Sign-in cancelled");
                return AuthOutcome::Cancelled;
            }
            PromptResult::Failed(message) => {
                return AuthOutcome::Failed {
                    message: format!("Sign-in error: {message}"),
                };
            }
        };

        match flow.exchange_code(&code, None).await {
            Ok(token) => self.complete_sign_in(token),
            Err(solomail_oauth::Error::AccessDenied) => {
                debug!("Sign-in cancelled at the consent screen");
                AuthOutcome::Cancelled
            }
            Err(e) => AuthOutcome::Failed {
                message: format!("Sign-in error: {e}"),
            },
        }
    }

    /// Validates a freshly acquired token's identity and activates the
    /// session.
    fn complete_sign_in(&mut self, token: Token) -> AuthOutcome {
        let claims = match token.id_claims() {
            Ok(claims) => claims,
            Err(e) => {
                return AuthOutcome::Failed {
                    message: format!("Sign-in error: {e}"),
                };
            }
        };
        let Some(username) = claims.username().map(ToString::to_string) else {
            return AuthOutcome::Failed {
                message: "Identity provider returned no username".to_string(),
            };
        };

        if !self.is_allowed(&username) {
            warn!(%username, "Sign-in by a non-allowed account; signing out");
            self.session = None;
            if let Err(e) = self.store.clear() {
                warn!("Failed to clear session store: {e}");
            }
            return AuthOutcome::UnauthorizedAccount {
                message: format!("Only {} is allowed to sign in", self.allowed_email),
            };
        }

        info!(%username, "Sign-in successful");
        let session = Session {
            identity: AccountIdentity {
                username,
                authority: self.client.provider.authority.to_string(),
            },
            token: token.clone(),
        };
        if let Err(e) = self.store.save(&session) {
            warn!("Failed to persist session: {e}");
        }
        self.session = Some(session);
        AuthOutcome::Authorized(token)
    }

    /// Acquires an access token without user interaction.
    ///
    /// Fails fast when no identity is active. Returns the cached token
    /// while it is still inside its expiry buffer; otherwise attempts one
    /// refresh grant against the identity's authority. Never falls back to
    /// interactive sign-in: that decision belongs to the caller.
    pub async fn acquire_token_silent(&mut self) -> AuthOutcome {
        let Some(session) = self.session.as_ref() else {
            return AuthOutcome::Failed {
                message: "No account signed in".to_string(),
            };
        };

        if session.token.expires_at.is_some() && session.token.is_valid() {
            debug!("Cached access token still valid");
            return AuthOutcome::Authorized(session.token.clone());
        }

        let identity = session.identity.clone();
        let stale = session.token.clone();
        let client = match self.refresh_client(&identity) {
            Ok(client) => client,
            Err(e) => {
                return AuthOutcome::Failed {
                    message: format!("Token error: {e}"),
                };
            }
        };

        match client.refresh_token(&stale).await {
            Ok(token) => {
                info!("Silent token refresh succeeded");
                if let Some(session) = self.session.as_mut() {
                    session.token = token.clone();
                    if let Err(e) = self.store.save(session) {
                        warn!("Failed to persist refreshed session: {e}");
                    }
                }
                AuthOutcome::Authorized(token)
            }
            Err(e) => {
                warn!("Silent token refresh failed: {e}");
                AuthOutcome::Failed {
                    message: format!("Token error: {e}"),
                }
            }
        }
    }

    /// A client aimed at the identity's own authority, which can differ
    /// from the configured one when the session predates a config change.
    fn refresh_client(&self, identity: &AccountIdentity) -> solomail_oauth::Result<OAuthClient> {
        if identity.authority == self.client.provider.authority.as_str() {
            return Ok(self.client.clone());
        }
        let provider = Provider::from_authority(self.client.provider.name.clone(), &identity.authority)
            .map(|p| p.with_default_scopes(self.client.provider.default_scopes.clone()))?;
        Ok(OAuthClient::new(self.client.client_id.clone(), provider))
    }

    /// Clears the active identity and the persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted session cannot be removed; the
    /// in-memory identity is dropped regardless.
    pub fn sign_out(&mut self) -> Result<()> {
        self.session = None;
        self.store.clear()?;
        info!("Signed out");
        Ok(())
    }
}
