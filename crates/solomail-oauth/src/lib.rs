//! # solomail-oauth
//!
//! `OAuth2` client library for the Microsoft identity platform.
//!
//! ## Features
//!
//! - **Authorization Code Flow** with PKCE for public clients
//! - **Token management**: refresh grant, expiration checking
//! - **Identity extraction**: OIDC ID-token claims (`preferred_username`)
//! - **Authority-based configuration**: endpoints derived from a tenant
//!   authority URL
//!
//! ## Quick Start
//!
//! ```ignore
//! use solomail_oauth::{AuthorizationCodeFlow, OAuthClient, Provider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = Provider::microsoft_consumers()?;
//!     let client = OAuthClient::new("your_client_id", provider)
//!         .with_redirect_uri("http://localhost:8080");
//!
//!     let flow = AuthorizationCodeFlow::new(client).with_pkce();
//!     let auth_url = flow.authorization_url(None, Some("random_state"))?;
//!     println!("Visit: {auth_url}");
//!
//!     // After the user authorizes, exchange the redirect code for a token.
//!     let token = flow.exchange_code("code_from_redirect", None).await?;
//!     println!("Signed in as {:?}", token.id_claims()?.username());
//!     Ok(())
//! }
//! ```
//!
//! ## Token Refresh
//!
//! ```ignore
//! if token.is_expired() {
//!     let token = client.refresh_token(&token).await?;
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod flow;
pub mod provider;
pub mod token;

pub use error::{Error, Result};
pub use flow::{AuthorizationCodeFlow, OAuthClient, PkceChallenge};
pub use provider::Provider;
pub use token::{IdClaims, Token};
