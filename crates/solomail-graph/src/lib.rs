//! # solomail-graph
//!
//! Typed async client for the Microsoft Graph mail REST API.
//!
//! Covers the three mail operations the client needs:
//!
//! - [`MailGateway::list_inbox`] - inbox page, newest first, with an opaque
//!   continuation URL for the next page
//! - [`MailGateway::get_message`] - one message with its full body
//! - [`MailGateway::send_mail`] - single-recipient plain-text send
//!
//! All calls take a bearer access token; acquiring one is the job of
//! `solomail-core`'s identity gate.
//!
//! ```ignore
//! use solomail_graph::MailGateway;
//!
//! let gateway = MailGateway::new(25)?;
//! let page = gateway.list_inbox(&token, None).await?;
//! println!("{} messages, more: {}", page.messages.len(), page.has_more);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
mod error;
pub mod model;

pub use client::{DEFAULT_BASE_URL, MailGateway};
pub use error::{Error, Result};
pub use model::{EmailAddress, ItemBody, Message, MessagePage, Recipient};
