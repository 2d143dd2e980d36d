//! Wire models for the Graph mail API.
//!
//! Field names follow Graph's camelCase JSON; the structs carry the subset
//! of fields the client selects with `$select`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An email message.
///
/// `body` is only populated when the message was fetched individually with
/// the full field set; list pages carry `body_preview` instead.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Server-assigned message identifier.
    pub id: String,
    /// Subject line.
    #[serde(default)]
    pub subject: Option<String>,
    /// Sender.
    #[serde(default)]
    pub from: Option<Recipient>,
    /// Delivery timestamp.
    #[serde(default)]
    pub received_date_time: Option<DateTime<Utc>>,
    /// First few hundred characters of the body, plain text.
    #[serde(default)]
    pub body_preview: Option<String>,
    /// Full body.
    #[serde(default)]
    pub body: Option<ItemBody>,
}

impl Message {
    /// Sender display string: the sender's name, falling back to the
    /// address, falling back to empty.
    #[must_use]
    pub fn sender(&self) -> &str {
        let Some(email) = self.from.as_ref().and_then(|r| r.email_address.as_ref()) else {
            return "";
        };
        match &email.name {
            Some(name) if !name.is_empty() => name,
            _ => email.address.as_deref().unwrap_or(""),
        }
    }
}

/// A recipient or sender wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    /// The wrapped address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<EmailAddress>,
}

impl Recipient {
    /// Builds a recipient for an outgoing message.
    #[must_use]
    pub fn address(address: impl Into<String>) -> Self {
        Self {
            email_address: Some(EmailAddress {
                name: None,
                address: Some(address.into()),
            }),
        }
    }
}

/// An email address with optional display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAddress {
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// A message body with its content type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBody {
    /// `"text"` or `"html"`.
    #[serde(default)]
    pub content_type: Option<String>,
    /// Body content.
    #[serde(default)]
    pub content: Option<String>,
}

/// One page of an inbox listing.
#[derive(Debug, Clone)]
pub struct MessagePage {
    /// Messages in server order (newest first).
    pub messages: Vec<Message>,
    /// Opaque continuation URL for the next page, if the server has more.
    pub next_link: Option<String>,
    /// Whether the server reported another page.
    pub has_more: bool,
}

/// Raw list response: `value` plus the OData continuation link.
#[derive(Debug, Deserialize)]
pub(crate) struct MessageListResponse {
    pub value: Vec<Message>,
    #[serde(default, rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

impl From<MessageListResponse> for MessagePage {
    fn from(wire: MessageListResponse) -> Self {
        let has_more = wire.next_link.is_some();
        Self {
            messages: wire.value,
            next_link: wire.next_link,
            has_more,
        }
    }
}

/// Envelope POSTed to `sendMail`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendMailRequest {
    pub message: OutgoingMessage,
    pub save_to_sent_items: bool,
}

/// The message part of a [`SendMailRequest`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OutgoingMessage {
    pub subject: String,
    pub body: ItemBody,
    pub to_recipients: Vec<Recipient>,
}

impl SendMailRequest {
    /// Single-recipient plain-text envelope, saved to sent items.
    pub(crate) fn plain_text(to: &str, subject: &str, body: &str) -> Self {
        Self {
            message: OutgoingMessage {
                subject: subject.to_string(),
                body: ItemBody {
                    content_type: Some("Text".to_string()),
                    content: Some(body.to_string()),
                },
                to_recipients: vec![Recipient::address(to)],
            },
            save_to_sent_items: true,
        }
    }
}
