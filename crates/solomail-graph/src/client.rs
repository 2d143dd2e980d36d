//! The Graph mail gateway.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::model::{Message, MessageListResponse, MessagePage, SendMailRequest};

/// Public Graph endpoint.
pub const DEFAULT_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Transport timeout for connect and for the whole request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fields selected for inbox list pages.
const LIST_FIELDS: &str = "id,subject,from,receivedDateTime,bodyPreview";

/// Fields selected when fetching one message in full.
const MESSAGE_FIELDS: &str = "id,subject,from,receivedDateTime,bodyPreview,body";

/// Typed client for the Graph mail REST API.
///
/// Clones share one connection pool. Every operation takes a bearer access
/// token supplied by the caller and never triggers token acquisition
/// itself.
#[derive(Debug, Clone)]
pub struct MailGateway {
    http: Client,
    base_url: String,
    page_size: usize,
}

impl MailGateway {
    /// Creates a gateway against the public Graph endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(page_size: usize) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, page_size)
    }

    /// Creates a gateway against a custom base URL (tests, sovereign
    /// clouds).
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client
    /// cannot be constructed.
    pub fn with_base_url(base_url: impl AsRef<str>, page_size: usize) -> Result<Self> {
        let base_url = base_url.as_ref().trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| Error::InvalidConfig(format!("base URL: {e}")))?;

        let http = Client::builder()
            .connect_timeout(REQUEST_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            page_size,
        })
    }

    /// Fetches one page of the inbox, newest first.
    ///
    /// With `page_url` absent, requests the first page with the configured
    /// page size and list field set; otherwise issues the server-provided
    /// continuation URL verbatim.
    ///
    /// # Errors
    ///
    /// [`Error::Unauthorized`] on HTTP 401, [`Error::Api`] on any other
    /// rejection, [`Error::Network`] when no response arrived.
    pub async fn list_inbox(&self, token: &str, page_url: Option<&str>) -> Result<MessagePage> {
        let url = match page_url {
            Some(next) => Url::parse(next)
                .map_err(|e| Error::InvalidResponse(format!("continuation URL: {e}")))?,
            None => self.first_page_url()?,
        };

        let response = self.http.get(url).bearer_auth(token).send().await?;
        let wire: MessageListResponse = Self::read_json(response).await?;
        let page = MessagePage::from(wire);
        debug!(
            count = page.messages.len(),
            has_more = page.has_more,
            "Fetched inbox page"
        );
        Ok(page)
    }

    /// Fetches a single message by id, including its full body.
    ///
    /// # Errors
    ///
    /// Same mapping as [`MailGateway::list_inbox`].
    pub async fn get_message(&self, token: &str, id: &str) -> Result<Message> {
        let url = format!("{}/me/messages/{id}", self.base_url);
        let response = self
            .http
            .get(url)
            .query(&[("$select", MESSAGE_FIELDS)])
            .bearer_auth(token)
            .send()
            .await?;
        let message: Message = Self::read_json(response).await?;
        debug!(id = %message.id, "Fetched message");
        Ok(message)
    }

    /// Sends a plain-text message to a single recipient, saving a copy to
    /// sent items.
    ///
    /// HTTP 202 (accepted for delivery) counts as success alongside any
    /// other 2xx.
    ///
    /// # Errors
    ///
    /// Same mapping as [`MailGateway::list_inbox`].
    pub async fn send_mail(&self, token: &str, to: &str, subject: &str, body: &str) -> Result<()> {
        let url = format!("{}/me/sendMail", self.base_url);
        let envelope = SendMailRequest::plain_text(to, subject, body);

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&envelope)
            .send()
            .await?;

        let status = response.status();
        if is_send_success(status) {
            debug!(%status, "Mail sent");
            return Ok(());
        }
        let message = response.text().await.unwrap_or_default();
        Err(classify_status(status, message))
    }

    /// First-page inbox request URL with `$top`, `$select` and `$orderby`.
    fn first_page_url(&self) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/me/mailFolders/inbox/messages", self.base_url))
            .map_err(|e| Error::InvalidConfig(format!("base URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("$top", &self.page_size.to_string())
            .append_pair("$select", LIST_FIELDS)
            .append_pair("$orderby", "receivedDateTime desc");
        Ok(url)
    }

    /// Checks the status and decodes the JSON body of a response.
    async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(classify_status(status, message));
        }
        Ok(response.json().await?)
    }
}

/// Maps a non-success HTTP status to the error taxonomy: 401 means the
/// token was rejected, everything else is a server-side rejection.
fn classify_status(status: StatusCode, message: String) -> Error {
    if status == StatusCode::UNAUTHORIZED {
        warn!("Unauthorized - token may be expired");
        return Error::Unauthorized;
    }
    Error::Api {
        status: status.as_u16(),
        message,
    }
}

/// Whether a `sendMail` response status counts as success.
fn is_send_success(status: StatusCode) -> bool {
    status.is_success() || status.as_u16() == 202
}
