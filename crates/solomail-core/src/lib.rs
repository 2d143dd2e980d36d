//! # solomail-core
//!
//! Core logic for a single-account mail client over the Graph mail API.
//!
//! This crate provides:
//! - **Identity gate** - OAuth sign-in restricted to one allowed address,
//!   with silent token refresh and keyring-persisted sessions
//! - **Inbox controller** - cursor-paginated fetch into a bounded in-memory
//!   message cache
//! - **Configuration** - the handful of constants a deployment needs
//!
//! The identity gate never falls back to interactive sign-in on its own:
//! when silent acquisition fails the caller decides whether to re-prompt.
//! Likewise an `Unauthorized` gateway error means "refresh the token and
//! retry", which is also the caller's loop to drive.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod config;
mod error;
pub mod inbox;

pub use auth::{
    AccountIdentity, AuthOutcome, IdentityGate, KeyringStore, MemoryStore, PromptResult, Session,
    SessionStore, SignInPrompt, StoreError, StoreResult,
};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use inbox::{InboxCache, InboxController, Load, MailApi, SkipReason};
